use super::context::EvaluationContext;
use super::dual::DualValue;
use super::error::NodeError;
use super::jsonpath::JsonPathNode;
use super::matchers::{json_equals, Matcher};
use rand::Rng;
use serde_json::{Map, Value};
use std::fmt;

/// One of the three operations a node may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Evaluate,
    Compare,
    Mock,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Evaluate => write!(f, "evaluate"),
            Capability::Compare => write!(f, "compare"),
            Capability::Mock => write!(f, "mock"),
        }
    }
}

/// The capability set a node kind declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub evaluate: bool,
    pub compare: bool,
    pub mock: bool,
}

impl Capabilities {
    pub const ALL: Capabilities = Capabilities::new(true, true, true);
    pub const COMPARE_MOCK: Capabilities = Capabilities::new(false, true, true);
    pub const COMPARE_ONLY: Capabilities = Capabilities::new(false, true, false);
    pub const EVALUATE_ONLY: Capabilities = Capabilities::new(true, false, false);

    pub const fn new(evaluate: bool, compare: bool, mock: bool) -> Self {
        Self {
            evaluate,
            compare,
            mock,
        }
    }

    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Evaluate => self.evaluate,
            Capability::Compare => self.compare,
            Capability::Mock => self.mock,
        }
    }
}

/// Resolve context-dependent parts of a node. Infallible: unresolvable
/// branches become `null`.
pub trait Evaluable {
    fn evaluate(&self, ctx: &EvaluationContext) -> ValueNode;
}

/// Validate a concrete JSON value against a constraint.
pub trait Comparable {
    fn compare(&self, target: &Value) -> bool;
}

/// Generate a concrete JSON value satisfying a constraint.
pub trait Mockable {
    fn mock_with<R: Rng>(&self, rng: &mut R) -> Result<Value, NodeError>;
}

/// A node of the constraint tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueNode {
    Constant(Value),
    Object(Vec<(String, ValueNode)>),
    Array(Vec<ValueNode>),
    Matcher(Matcher),
    Extraction(JsonPathNode),
    Dual(DualValue),
}

impl ValueNode {
    pub fn constant(value: impl Into<Value>) -> Self {
        ValueNode::Constant(value.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ValueNode::Constant(_) => "constant",
            ValueNode::Object(_) => "object",
            ValueNode::Array(_) => "array",
            ValueNode::Matcher(m) => m.kind(),
            ValueNode::Extraction(_) => "jsonpath",
            ValueNode::Dual(d) => d.kind().name(),
        }
    }

    /// Capabilities declared by this node's kind. Composite nodes declare all
    /// three and surface child failures at call time.
    pub fn capabilities(&self) -> Capabilities {
        match self {
            ValueNode::Constant(_) | ValueNode::Object(_) | ValueNode::Array(_) => {
                Capabilities::ALL
            }
            ValueNode::Matcher(m) => m.capabilities(),
            ValueNode::Extraction(_) => Capabilities::EVALUATE_ONLY,
            ValueNode::Dual(_) => Capabilities::ALL,
        }
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities().supports(capability)
    }

    /// Recursively resolve extraction and dual nodes against `ctx`.
    pub fn evaluate(&self, ctx: &EvaluationContext) -> ValueNode {
        match self {
            ValueNode::Constant(_) | ValueNode::Matcher(_) => self.clone(),
            ValueNode::Object(fields) => ValueNode::Object(
                fields
                    .iter()
                    .map(|(key, child)| (key.clone(), child.evaluate(ctx)))
                    .collect(),
            ),
            ValueNode::Array(items) => {
                ValueNode::Array(items.iter().map(|item| item.evaluate(ctx)).collect())
            }
            ValueNode::Extraction(path) => path.evaluate(ctx),
            ValueNode::Dual(dual) => dual.evaluate(ctx),
        }
    }

    /// Check `target` against this node.
    ///
    /// Objects and arrays match openly: extra keys or trailing elements in the
    /// target are ignored, declared keys absent from the target compare
    /// against `null`.
    pub fn compare(&self, target: &Value) -> Result<bool, NodeError> {
        match self {
            ValueNode::Constant(expected) => Ok(json_equals(expected, target)),
            ValueNode::Object(fields) => {
                let Some(actual) = target.as_object() else {
                    return Ok(false);
                };
                for (key, child) in fields {
                    let value = actual.get(key).unwrap_or(&Value::Null);
                    if !child.compare(value)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            ValueNode::Array(items) => {
                let Some(actual) = target.as_array() else {
                    return Ok(false);
                };
                for (index, child) in items.iter().enumerate() {
                    let value = actual.get(index).unwrap_or(&Value::Null);
                    if !child.compare(value)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            ValueNode::Matcher(m) => m.compare(target),
            ValueNode::Extraction(_) => Err(NodeError::unsupported("jsonpath", Capability::Compare)),
            ValueNode::Dual(dual) => match dual.default_branch() {
                Some(branch) => branch.compare(target),
                None => Ok(target.is_null()),
            },
        }
    }

    /// Generate a concrete value using the thread-local RNG.
    pub fn mock(&self) -> Result<Value, NodeError> {
        self.mock_with(&mut rand::thread_rng())
    }

    pub fn mock_with<R: Rng>(&self, rng: &mut R) -> Result<Value, NodeError> {
        match self {
            ValueNode::Constant(value) => Ok(value.clone()),
            ValueNode::Object(fields) => {
                let mut out = Map::with_capacity(fields.len());
                for (key, child) in fields {
                    out.insert(key.clone(), child.mock_with(rng)?);
                }
                Ok(Value::Object(out))
            }
            ValueNode::Array(items) => items
                .iter()
                .map(|item| item.mock_with(rng))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            ValueNode::Matcher(m) => m.mock_with(rng),
            ValueNode::Extraction(_) => Err(NodeError::unsupported("jsonpath", Capability::Mock)),
            ValueNode::Dual(dual) => match dual.default_branch() {
                Some(branch) => branch.mock_with(rng),
                None => Ok(Value::Null),
            },
        }
    }

    /// Evaluate against `ctx`, then mock the result.
    pub fn resolve(&self, ctx: &EvaluationContext) -> Result<Value, NodeError> {
        self.evaluate(ctx).mock()
    }

    /// The plain JSON value of a node built only from constants.
    pub fn as_literal(&self) -> Option<Value> {
        match self {
            ValueNode::Constant(value) => Some(value.clone()),
            ValueNode::Object(fields) => {
                let mut out = Map::with_capacity(fields.len());
                for (key, child) in fields {
                    out.insert(key.clone(), child.as_literal()?);
                }
                Some(Value::Object(out))
            }
            ValueNode::Array(items) => items
                .iter()
                .map(ValueNode::as_literal)
                .collect::<Option<Vec<_>>>()
                .map(Value::Array),
            _ => None,
        }
    }

    /// Returns true if the tree contains a node of the given kind predicate.
    pub fn any(&self, predicate: &dyn Fn(&ValueNode) -> bool) -> bool {
        if predicate(self) {
            return true;
        }
        match self {
            ValueNode::Object(fields) => fields.iter().any(|(_, child)| child.any(predicate)),
            ValueNode::Array(items) => items.iter().any(|item| item.any(predicate)),
            ValueNode::Dual(dual) => dual.branches().any(|branch| branch.any(predicate)),
            _ => false,
        }
    }

    /// Object field lookup by key.
    pub fn field(&self, key: &str) -> Option<&ValueNode> {
        match self {
            ValueNode::Object(fields) => fields.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

impl From<Value> for ValueNode {
    fn from(value: Value) -> Self {
        ValueNode::Constant(value)
    }
}

impl From<Matcher> for ValueNode {
    fn from(matcher: Matcher) -> Self {
        ValueNode::Matcher(matcher)
    }
}

impl fmt::Display for ValueNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        super::printer::write_node(self, &mut out, false, 0);
        f.write_str(&out)
    }
}
