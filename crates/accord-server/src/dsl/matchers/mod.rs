//! Built-in matcher catalogue.
//!
//! Each matcher kind is its own type implementing `Comparable` and, except for
//! `notAnyOf`, `Mockable`. `Matcher` is the closed set dispatched by
//! `ValueNode`.

mod choice;
mod date;
mod faker;
mod number;
mod pattern;

pub use choice::ChoiceMatcher;
pub use date::{DateKind, DateMatcher};
pub use faker::{FakeKind, FakeMatcher, TextKind, TextMatcher, Uuid4Matcher};
pub use number::{Bounds, NumberKind, NumberMatcher};
pub use pattern::RegexMatcher;

use super::error::NodeError;
use super::node::{Capabilities, Capability, Comparable, Mockable};
use rand::Rng;
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;

/// Upper bound on rejection-sampling attempts for generated values.
pub(crate) const MAX_ATTEMPTS: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub enum Matcher {
    Regex(RegexMatcher),
    Number(NumberMatcher),
    Date(DateMatcher),
    Text(TextMatcher),
    Fake(FakeMatcher),
    Uuid4(Uuid4Matcher),
    AnyOf(ChoiceMatcher),
    NotAnyOf(ChoiceMatcher),
}

impl Matcher {
    pub fn kind(&self) -> &'static str {
        match self {
            Matcher::Regex(_) => "regex",
            Matcher::Number(m) => m.kind().name(),
            Matcher::Date(_) => "date",
            Matcher::Text(_) => "text",
            Matcher::Fake(m) => m.kind().name(),
            Matcher::Uuid4(_) => "uuid4",
            Matcher::AnyOf(_) => "anyOf",
            Matcher::NotAnyOf(_) => "notAnyOf",
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        match self {
            Matcher::NotAnyOf(_) => Capabilities::COMPARE_ONLY,
            _ => Capabilities::COMPARE_MOCK,
        }
    }

    pub fn compare(&self, target: &Value) -> Result<bool, NodeError> {
        Ok(match self {
            Matcher::Regex(m) => m.compare(target),
            Matcher::Number(m) => m.compare(target),
            Matcher::Date(m) => m.compare(target),
            Matcher::Text(m) => m.compare(target),
            Matcher::Fake(m) => m.compare(target),
            Matcher::Uuid4(m) => m.compare(target),
            Matcher::AnyOf(m) => m.contains(target),
            Matcher::NotAnyOf(m) => !m.contains(target),
        })
    }

    pub fn mock_with<R: Rng>(&self, rng: &mut R) -> Result<Value, NodeError> {
        match self {
            Matcher::Regex(m) => m.mock_with(rng),
            Matcher::Number(m) => m.mock_with(rng),
            Matcher::Date(m) => m.mock_with(rng),
            Matcher::Text(m) => m.mock_with(rng),
            Matcher::Fake(m) => m.mock_with(rng),
            Matcher::Uuid4(m) => m.mock_with(rng),
            Matcher::AnyOf(m) => m.mock_with(rng),
            Matcher::NotAnyOf(_) => Err(NodeError::unsupported("notAnyOf", Capability::Mock)),
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Regex(m) => write!(f, "regex({})", quote(m.pattern())),
            Matcher::Number(m) => write!(f, "{}({})", m.kind().name(), m.bounds()),
            Matcher::Date(m) => write!(f, "date({})", m.options_json()),
            Matcher::Text(m) => match m.declared_kind() {
                Some(kind) => write!(f, "text({{\"type\":{}}})", quote(kind.name())),
                None => write!(f, "text()"),
            },
            Matcher::Fake(m) => write!(f, "{}()", m.kind().name()),
            Matcher::Uuid4(_) => write!(f, "uuid4()"),
            Matcher::AnyOf(m) => write!(f, "anyOf({m})"),
            Matcher::NotAnyOf(m) => write!(f, "notAnyOf({m})"),
        }
    }
}

/// JSON string literal for `s`.
pub(crate) fn quote(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

/// String form of a JSON value for pattern matching; `None` for `null`.
pub(crate) fn stringify(target: &Value) -> Option<Cow<'_, str>> {
    match target {
        Value::Null => None,
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        other => Some(Cow::Owned(other.to_string())),
    }
}

/// Canonical JSON equality: object key order is ignored and numbers compare
/// by value (`1 == 1.0`).
pub fn json_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => match (x.as_u64(), y.as_u64()) {
                (Some(x), Some(y)) => x == y,
                _ => x.as_f64() == y.as_f64(),
            },
        },
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| json_equals(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(key, v)| y.get(key).is_some_and(|w| json_equals(v, w)))
        }
        _ => a == b,
    }
}

/// Draw candidates until one passes `accept`.
pub(crate) fn sample_until<R, G, A>(
    kind: &'static str,
    rng: &mut R,
    mut generate: G,
    accept: A,
) -> Result<Value, NodeError>
where
    R: Rng,
    G: FnMut(&mut R) -> String,
    A: Fn(&str) -> bool,
{
    for _ in 0..MAX_ATTEMPTS {
        let candidate = generate(rng);
        if accept(&candidate) {
            return Ok(Value::String(candidate));
        }
    }
    Err(NodeError::Generation {
        kind,
        reason: format!("no candidate matched after {MAX_ATTEMPTS} attempts"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_equals_ignores_key_order_and_number_repr() {
        assert!(json_equals(&json!({"a": 1, "b": 2.0}), &json!({"b": 2, "a": 1.0})));
        assert!(!json_equals(&json!([1, 2]), &json!([2, 1])));
        assert!(!json_equals(&json!("1"), &json!(1)));
        assert!(!json_equals(&json!({"a": 1}), &json!({"a": 1, "b": null})));
    }

    #[test]
    fn test_stringify() {
        assert_eq!(stringify(&json!("x")).as_deref(), Some("x"));
        assert_eq!(stringify(&json!(12)).as_deref(), Some("12"));
        assert_eq!(stringify(&json!(null)), None);
    }

    #[test]
    fn test_not_any_of_is_compare_only() {
        let m = Matcher::NotAnyOf(ChoiceMatcher::new(vec![json!(1)]).unwrap());
        assert_eq!(m.capabilities(), Capabilities::COMPARE_ONLY);
        assert!(m.mock_with(&mut rand::thread_rng()).is_err());
        assert!(m.compare(&json!(2)).unwrap());
    }

    #[test]
    fn test_display_prints_constructor_calls() {
        let regex = Matcher::Regex(RegexMatcher::new("/a\"b").unwrap());
        assert_eq!(regex.to_string(), r#"regex("/a\"b")"#);
        assert_eq!(Matcher::Uuid4(Uuid4Matcher).to_string(), "uuid4()");
        let any = Matcher::AnyOf(ChoiceMatcher::new(vec![json!("a"), json!(2)]).unwrap());
        assert_eq!(any.to_string(), r#"anyOf("a", 2)"#);
    }
}
