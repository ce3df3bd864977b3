use super::context::EvaluationContext;
use super::node::{Evaluable, ValueNode};
use serde_json::Value;
use serde_json_path::JsonPath;

/// Extracts values from the evaluation document.
///
/// Evaluation yields a constant array holding every match, in document order.
/// An expression with no match yields an empty array.
#[derive(Debug, Clone)]
pub struct JsonPathNode {
    expression: String,
    path: JsonPath,
}

impl JsonPathNode {
    pub fn parse(expression: &str) -> Result<Self, serde_json_path::ParseError> {
        let path = JsonPath::parse(expression)?;
        Ok(Self {
            expression: expression.to_string(),
            path,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn query(&self, document: &Value) -> Vec<Value> {
        self.path.query(document).all().into_iter().cloned().collect()
    }
}

impl PartialEq for JsonPathNode {
    fn eq(&self, other: &Self) -> bool {
        self.expression == other.expression
    }
}

impl Evaluable for JsonPathNode {
    fn evaluate(&self, ctx: &EvaluationContext) -> ValueNode {
        ValueNode::Constant(Value::Array(self.query(ctx.document())))
    }
}
