//! Contract, request and response specifications.

use crate::dsl::{to_script_pretty, ValueNode};
use serde_json::Value;

/// Declared HTTP method(s). Names are stored uppercase.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodSpec {
    One(String),
    Any(Vec<String>),
}

impl MethodSpec {
    pub fn matches(&self, method: &str) -> bool {
        match self {
            MethodSpec::One(m) => m.eq_ignore_ascii_case(method),
            MethodSpec::Any(list) => list.iter().any(|m| m.eq_ignore_ascii_case(method)),
        }
    }

    pub fn methods(&self) -> Vec<&str> {
        match self {
            MethodSpec::One(m) => vec![m.as_str()],
            MethodSpec::Any(list) => list.iter().map(String::as_str).collect(),
        }
    }

    fn to_node(&self) -> ValueNode {
        match self {
            MethodSpec::One(m) => ValueNode::constant(m.as_str()),
            MethodSpec::Any(list) => ValueNode::Array(
                list.iter().map(|m| ValueNode::constant(m.as_str())).collect(),
            ),
        }
    }
}

impl Default for MethodSpec {
    fn default() -> Self {
        MethodSpec::One("GET".to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryParameter {
    pub name: ValueNode,
    pub value: ValueNode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: MethodSpec,
    pub url_path: ValueNode,
    pub query_parameters: Vec<QueryParameter>,
    pub headers: Vec<(String, ValueNode)>,
    pub body: Option<ValueNode>,
}

impl Default for RequestSpec {
    fn default() -> Self {
        Self {
            method: MethodSpec::default(),
            url_path: ValueNode::constant("/"),
            query_parameters: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSpec {
    pub status: ValueNode,
    pub headers: Vec<(String, ValueNode)>,
    pub body: Option<ValueNode>,
}

impl Default for ResponseSpec {
    fn default() -> Self {
        Self {
            status: ValueNode::constant(200),
            headers: Vec::new(),
            body: None,
        }
    }
}

/// A compiled contract. Never mutated in place; updates replace the record.
#[derive(Debug, Clone, PartialEq)]
pub struct Contract {
    pub id: String,
    pub name: String,
    pub request: RequestSpec,
    pub response: ResponseSpec,
    /// Script text as submitted.
    pub raw_script: String,
}

fn headers_node(headers: &[(String, ValueNode)]) -> ValueNode {
    ValueNode::Object(headers.to_vec())
}

impl RequestSpec {
    pub fn to_node(&self) -> ValueNode {
        let mut fields = vec![
            ("method".to_string(), self.method.to_node()),
            ("urlPath".to_string(), self.url_path.clone()),
        ];
        if !self.query_parameters.is_empty() {
            let params = self
                .query_parameters
                .iter()
                .map(|p| {
                    ValueNode::Object(vec![
                        ("name".to_string(), p.name.clone()),
                        ("value".to_string(), p.value.clone()),
                    ])
                })
                .collect();
            fields.push(("queryParameters".to_string(), ValueNode::Array(params)));
        }
        if !self.headers.is_empty() {
            fields.push(("headers".to_string(), headers_node(&self.headers)));
        }
        if let Some(body) = &self.body {
            fields.push(("body".to_string(), body.clone()));
        }
        ValueNode::Object(fields)
    }
}

impl ResponseSpec {
    pub fn to_node(&self) -> ValueNode {
        let mut fields = vec![("status".to_string(), self.status.clone())];
        if !self.headers.is_empty() {
            fields.push(("headers".to_string(), headers_node(&self.headers)));
        }
        if let Some(body) = &self.body {
            fields.push(("body".to_string(), body.clone()));
        }
        ValueNode::Object(fields)
    }

    /// Printed DSL source of the response spec.
    pub fn to_script(&self) -> String {
        to_script_pretty(&self.to_node())
    }
}

impl Contract {
    /// The contract as a DSL tree: `{id, name, request, response}`.
    pub fn to_node(&self) -> ValueNode {
        ValueNode::Object(vec![
            ("id".to_string(), ValueNode::Constant(Value::String(self.id.clone()))),
            ("name".to_string(), ValueNode::Constant(Value::String(self.name.clone()))),
            ("request".to_string(), self.request.to_node()),
            ("response".to_string(), self.response.to_node()),
        ])
    }

    /// Canonical pretty-printed script for this contract.
    pub fn to_script(&self) -> String {
        format!("module.exports = {};\n", to_script_pretty(&self.to_node()))
    }
}
