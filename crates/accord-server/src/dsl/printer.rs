use super::dual::DualKind;
use super::matchers::quote;
use super::node::ValueNode;
use serde_json::Value;

const INDENT: &str = "  ";

/// Print a node as DSL source with two-space indentation.
pub fn to_script_pretty(node: &ValueNode) -> String {
    let mut out = String::new();
    write_node(node, &mut out, true, 0);
    out
}

fn newline(out: &mut String, pretty: bool, depth: usize) {
    if pretty {
        out.push('\n');
        for _ in 0..depth {
            out.push_str(INDENT);
        }
    }
}

fn write_entries<T>(
    out: &mut String,
    entries: &[T],
    (open, close): (char, char),
    pretty: bool,
    depth: usize,
    mut write_entry: impl FnMut(&T, &mut String),
) {
    out.push(open);
    if entries.is_empty() {
        out.push(close);
        return;
    }
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        newline(out, pretty, depth + 1);
        write_entry(entry, out);
    }
    newline(out, pretty, depth);
    out.push(close);
}

fn write_key(key: &str, out: &mut String, pretty: bool) {
    out.push_str(&quote(key));
    out.push(':');
    if pretty {
        out.push(' ');
    }
}

pub(crate) fn write_json(value: &Value, out: &mut String, pretty: bool, depth: usize) {
    match value {
        Value::Object(map) => {
            let entries: Vec<_> = map.iter().collect();
            write_entries(out, &entries, ('{', '}'), pretty, depth, |(key, child), out| {
                write_key(key, out, pretty);
                write_json(child, out, pretty, depth + 1);
            });
        }
        Value::Array(items) => {
            write_entries(out, items, ('[', ']'), pretty, depth, |child, out| {
                write_json(child, out, pretty, depth + 1);
            });
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

pub(crate) fn write_node(node: &ValueNode, out: &mut String, pretty: bool, depth: usize) {
    match node {
        ValueNode::Constant(value) => write_json(value, out, pretty, depth),
        ValueNode::Object(fields) => {
            write_entries(out, fields, ('{', '}'), pretty, depth, |(key, child), out| {
                write_key(key, out, pretty);
                write_node(child, out, pretty, depth + 1);
            });
        }
        ValueNode::Array(items) => {
            write_entries(out, items, ('[', ']'), pretty, depth, |child, out| {
                write_node(child, out, pretty, depth + 1);
            });
        }
        ValueNode::Matcher(m) => out.push_str(&m.to_string()),
        ValueNode::Extraction(path) => {
            out.push_str("jsonpath(");
            out.push_str(&quote(path.expression()));
            out.push(')');
        }
        ValueNode::Dual(dual) => match dual.kind() {
            DualKind::Value => {
                out.push_str("value({");
                let mut first = true;
                for (label, branch) in [("stub", dual.stub()), ("test", dual.test())] {
                    let Some(branch) = branch else { continue };
                    if !first {
                        out.push_str(", ");
                    }
                    first = false;
                    out.push_str(label);
                    out.push_str(": ");
                    write_node(branch, out, pretty, depth);
                }
                out.push_str("})");
            }
            // One-sided values print as the branch they always select.
            DualKind::StubOnly | DualKind::TestOnly => match dual.default_branch() {
                Some(branch) => write_node(branch, out, pretty, depth),
                None => out.push_str("null"),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::matchers::{ChoiceMatcher, RegexMatcher};
    use crate::dsl::{DualValue, JsonPathNode, Matcher};
    use serde_json::json;

    #[test]
    fn test_compact_print() {
        let node = ValueNode::Object(vec![
            ("a".into(), ValueNode::constant(json!([1, "x"]))),
            (
                "b".into(),
                ValueNode::Matcher(Matcher::Regex(RegexMatcher::new("[0-9]+").unwrap())),
            ),
            (
                "c".into(),
                ValueNode::Extraction(JsonPathNode::parse("$.req.body").unwrap()),
            ),
        ]);
        assert_eq!(
            node.to_string(),
            r#"{"a":[1,"x"],"b":regex("[0-9]+"),"c":jsonpath("$.req.body")}"#
        );
    }

    #[test]
    fn test_pretty_print_indents_two_spaces() {
        let node = ValueNode::Object(vec![(
            "list".into(),
            ValueNode::Array(vec![ValueNode::constant(1), ValueNode::constant(json!({}))]),
        )]);
        assert_eq!(to_script_pretty(&node), "{\n  \"list\": [\n    1,\n    {}\n  ]\n}");
    }

    #[test]
    fn test_dual_printing() {
        let dual = DualValue::new(
            Some(ValueNode::constant(56789)),
            Some(ValueNode::Matcher(Matcher::AnyOf(
                ChoiceMatcher::new(vec![json!(1), json!(2)]).unwrap(),
            ))),
        );
        assert_eq!(
            ValueNode::Dual(dual.clone()).to_string(),
            "value({stub: 56789, test: anyOf(1, 2)})"
        );
        let stub_only = DualValue::stub_only(dual.stub().cloned(), dual.test().cloned());
        assert_eq!(ValueNode::Dual(stub_only).to_string(), "56789");
        let test_only = DualValue::test_only(dual.stub().cloned(), None);
        assert_eq!(ValueNode::Dual(test_only).to_string(), "null");
    }
}
