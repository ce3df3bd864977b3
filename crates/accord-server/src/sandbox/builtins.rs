use super::error::ScriptError;
use crate::dsl::matchers::{
    Bounds, ChoiceMatcher, DateKind, DateMatcher, FakeKind, FakeMatcher, NumberKind,
    NumberMatcher, RegexMatcher, TextKind, TextMatcher, Uuid4Matcher,
};
use crate::dsl::{DualKind, DualValue, JsonPathNode, Matcher, ValueNode};
use serde_json::Value;
use std::collections::HashMap;

/// Constructor functions callable from contract scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Regex,
    Integer,
    Float,
    Date,
    Text,
    Name,
    Email,
    Phone,
    Address,
    Uuid4,
    AnyOf,
    NotAnyOf,
    JsonPath,
    Value,
    StubValue,
    TestValue,
}

impl Builtin {
    pub const ALL: [Builtin; 16] = [
        Builtin::Regex,
        Builtin::Integer,
        Builtin::Float,
        Builtin::Date,
        Builtin::Text,
        Builtin::Name,
        Builtin::Email,
        Builtin::Phone,
        Builtin::Address,
        Builtin::Uuid4,
        Builtin::AnyOf,
        Builtin::NotAnyOf,
        Builtin::JsonPath,
        Builtin::Value,
        Builtin::StubValue,
        Builtin::TestValue,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Regex => "regex",
            Builtin::Integer => "integer",
            Builtin::Float => "float",
            Builtin::Date => "date",
            Builtin::Text => "text",
            Builtin::Name => "name",
            Builtin::Email => "email",
            Builtin::Phone => "phone",
            Builtin::Address => "address",
            Builtin::Uuid4 => "uuid4",
            Builtin::AnyOf => "anyOf",
            Builtin::NotAnyOf => "notAnyOf",
            Builtin::JsonPath => "jsonpath",
            Builtin::Value => "value",
            Builtin::StubValue => "stubValue",
            Builtin::TestValue => "testValue",
        }
    }

    /// Build the node for a call. `None` arguments are `undefined`.
    pub fn apply(&self, args: Vec<Option<ValueNode>>) -> Result<ValueNode, ScriptError> {
        let f = self.name();
        let first = args.first().cloned().flatten();
        let matcher = match self {
            Builtin::Regex => {
                let pattern = string_arg(f, first.as_ref())?
                    .ok_or_else(|| ScriptError::invalid(f, "a pattern string is required"))?;
                Matcher::Regex(
                    RegexMatcher::new(pattern).map_err(|e| ScriptError::invalid(f, e.to_string()))?,
                )
            }
            Builtin::Integer => Matcher::Number(NumberMatcher::new(
                NumberKind::Integer,
                bounds(f, &options(f, first.as_ref())?)?,
            )),
            Builtin::Float => Matcher::Number(NumberMatcher::new(
                NumberKind::Float,
                bounds(f, &options(f, first.as_ref())?)?,
            )),
            Builtin::Date => {
                let opts = options(f, first.as_ref())?;
                let kind = match option_str(f, &opts, "type")? {
                    None => None,
                    Some(s) => Some(
                        DateKind::parse(&s)
                            .ok_or_else(|| ScriptError::invalid(f, format!("unknown type {s:?}")))?,
                    ),
                };
                Matcher::Date(
                    DateMatcher::new(
                        option_str(f, &opts, "format")?,
                        kind,
                        option_str(f, &opts, "from")?,
                        option_str(f, &opts, "to")?,
                    )
                    .map_err(|e| ScriptError::invalid(f, e))?,
                )
            }
            Builtin::Text => {
                let opts = options(f, first.as_ref())?;
                let kind = match option_str(f, &opts, "type")? {
                    None => None,
                    Some(s) => Some(
                        TextKind::parse(&s)
                            .ok_or_else(|| ScriptError::invalid(f, format!("unknown type {s:?}")))?,
                    ),
                };
                Matcher::Text(TextMatcher::new(kind))
            }
            Builtin::Name => Matcher::Fake(FakeMatcher::new(FakeKind::Name)),
            Builtin::Email => Matcher::Fake(FakeMatcher::new(FakeKind::Email)),
            Builtin::Phone => Matcher::Fake(FakeMatcher::new(FakeKind::Phone)),
            Builtin::Address => Matcher::Fake(FakeMatcher::new(FakeKind::Address)),
            Builtin::Uuid4 => Matcher::Uuid4(Uuid4Matcher),
            Builtin::AnyOf => Matcher::AnyOf(choices(f, args)?),
            Builtin::NotAnyOf => Matcher::NotAnyOf(choices(f, args)?),
            Builtin::JsonPath => {
                let expr = string_arg(f, first.as_ref())?
                    .ok_or_else(|| ScriptError::invalid(f, "a path expression is required"))?;
                let path = JsonPathNode::parse(&expr)
                    .map_err(|e| ScriptError::invalid(f, e.to_string()))?;
                return Ok(ValueNode::Extraction(path));
            }
            Builtin::Value => return dual(f, first, DualKind::Value),
            Builtin::StubValue => return dual(f, first, DualKind::StubOnly),
            Builtin::TestValue => return dual(f, first, DualKind::TestOnly),
        };
        Ok(ValueNode::Matcher(matcher))
    }
}

fn literal(f: &'static str, node: &ValueNode) -> Result<Value, ScriptError> {
    node.as_literal()
        .ok_or_else(|| ScriptError::invalid(f, format!("expected a literal, found {}", node.kind())))
}

fn string_arg(f: &'static str, arg: Option<&ValueNode>) -> Result<Option<String>, ScriptError> {
    match arg {
        None => Ok(None),
        Some(node) => match literal(f, node)? {
            Value::String(s) => Ok(Some(s)),
            Value::Null => Ok(None),
            other => Err(ScriptError::invalid(f, format!("expected a string, found {other}"))),
        },
    }
}

/// Optional literal options object; absent means `{}`.
fn options(f: &'static str, arg: Option<&ValueNode>) -> Result<serde_json::Map<String, Value>, ScriptError> {
    match arg.map(|node| literal(f, node)).transpose()? {
        None | Some(Value::Null) => Ok(serde_json::Map::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(other) => Err(ScriptError::invalid(f, format!("expected an options object, found {other}"))),
    }
}

fn option_str(
    f: &'static str,
    opts: &serde_json::Map<String, Value>,
    key: &str,
) -> Result<Option<String>, ScriptError> {
    match opts.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ScriptError::invalid(f, format!("`{key}` must be a string, found {other}"))),
    }
}

fn bounds(f: &'static str, opts: &serde_json::Map<String, Value>) -> Result<Bounds, ScriptError> {
    let bound = |key: &str| match opts.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(Some(n.clone())),
        Some(other) => Err(ScriptError::invalid(f, format!("`{key}` must be a number, found {other}"))),
    };
    Ok(Bounds {
        gt: bound("gt")?,
        gte: bound("gte")?,
        lt: bound("lt")?,
        lte: bound("lte")?,
    })
}

fn choices(f: &'static str, args: Vec<Option<ValueNode>>) -> Result<ChoiceMatcher, ScriptError> {
    let values = args
        .iter()
        .map(|arg| match arg {
            Some(node) => literal(f, node),
            None => Ok(Value::Null),
        })
        .collect::<Result<Vec<_>, _>>()?;
    ChoiceMatcher::new(values).map_err(|e| ScriptError::invalid(f, e))
}

const STUB_KEYS: [&str; 3] = ["stub", "client", "consumer"];
const TEST_KEYS: [&str; 3] = ["test", "server", "producer"];

fn dual(f: &'static str, props: Option<ValueNode>, kind: DualKind) -> Result<ValueNode, ScriptError> {
    let Some(props @ ValueNode::Object(_)) = props else {
        return Err(ScriptError::invalid(f, "expected an object with stub/test branches"));
    };
    let branch = |keys: &[&str]| keys.iter().find_map(|key| props.field(key)).cloned();
    let value = DualValue::new(branch(&STUB_KEYS), branch(&TEST_KEYS)).with_kind(kind);
    Ok(ValueNode::Dual(value))
}

/// Name-to-constructor table for one script execution.
#[derive(Debug, Clone)]
pub struct Bindings {
    table: HashMap<&'static str, Builtin>,
}

impl Bindings {
    /// Every builtin bound under its own name.
    pub fn standard() -> Self {
        Self {
            table: Builtin::ALL.iter().map(|b| (b.name(), *b)).collect(),
        }
    }

    /// Rebind `name` to another constructor.
    pub fn bind(&mut self, name: &'static str, builtin: Builtin) {
        self.table.insert(name, builtin);
    }

    pub fn lookup(&self, name: &str) -> Option<Builtin> {
        self.table.get(name).copied()
    }
}
