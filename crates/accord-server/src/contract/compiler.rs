use super::types::{Contract, MethodSpec, QueryParameter, RequestSpec, ResponseSpec};
use crate::dsl::{Mode, ValueNode};
use crate::metrics;
use crate::sandbox::{Builtin, Sandbox, ScriptError};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error("contract script must export an object, found {0}")]
    NotAnObject(&'static str),

    #[error("invalid `{field}`: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },
}

fn invalid(field: &'static str, message: impl Into<String>) -> CompileError {
    CompileError::InvalidField {
        field,
        message: message.into(),
    }
}

/// Turns contract scripts into `Contract`s through the sandbox.
#[derive(Debug, Clone, Default)]
pub struct ContractCompiler {
    sandbox: Sandbox,
}

impl ContractCompiler {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }

    pub fn compile(&self, script: &str) -> Result<Contract, CompileError> {
        self.compile_with(script, &[])
    }

    pub fn compile_with(
        &self,
        script: &str,
        overrides: &[(&'static str, Builtin)],
    ) -> Result<Contract, CompileError> {
        let result = self
            .sandbox
            .execute_with(script, overrides)
            .map_err(CompileError::from)
            .and_then(|exported| build_contract(exported, script));
        match &result {
            Ok(_) => metrics::record_compilation("ok"),
            Err(e) => {
                metrics::record_compilation("error");
                warn!("Contract script rejected: {}", e);
            }
        }
        result
    }

    /// Recompile the canonical script with `value` rebound to one side.
    pub fn derive(&self, contract: &Contract, mode: Mode) -> Result<Contract, CompileError> {
        let side = match mode {
            Mode::Stub => Builtin::StubValue,
            Mode::Test => Builtin::TestValue,
        };
        let mut derived = self.compile_with(&contract.to_script(), &[("value", side)])?;
        derived.id = contract.id.clone();
        derived.raw_script = derived.to_script();
        Ok(derived)
    }
}

impl Contract {
    /// Stub-only variant: every `value(...)` collapses to its stub branch.
    pub fn to_stub_contract(&self, compiler: &ContractCompiler) -> Result<Contract, CompileError> {
        compiler.derive(self, Mode::Stub)
    }

    /// Test-only variant: every `value(...)` collapses to its test branch.
    pub fn to_test_contract(&self, compiler: &ContractCompiler) -> Result<Contract, CompileError> {
        compiler.derive(self, Mode::Test)
    }

    pub fn to_stub_script(&self, compiler: &ContractCompiler) -> Result<String, CompileError> {
        Ok(self.to_stub_contract(compiler)?.to_script())
    }

    pub fn to_test_script(&self, compiler: &ContractCompiler) -> Result<String, CompileError> {
        Ok(self.to_test_contract(compiler)?.to_script())
    }
}

fn take_fields(node: ValueNode, field: &'static str) -> Result<Vec<(String, ValueNode)>, CompileError> {
    match node {
        ValueNode::Object(fields) => Ok(fields),
        ValueNode::Constant(Value::Null) => Ok(Vec::new()),
        other => Err(invalid(field, format!("expected an object, found {}", other.kind()))),
    }
}

fn literal_string(node: &ValueNode, field: &'static str) -> Result<String, CompileError> {
    match node.as_literal() {
        Some(Value::String(s)) => Ok(s),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(invalid(field, "expected a string literal")),
    }
}

/// `null` and `""` bodies declare nothing.
fn declared_body(node: ValueNode) -> Option<ValueNode> {
    match &node {
        ValueNode::Constant(Value::Null) => None,
        ValueNode::Constant(Value::String(s)) if s.is_empty() => None,
        _ => Some(node),
    }
}

pub(crate) fn build_contract(exported: ValueNode, raw_script: &str) -> Result<Contract, CompileError> {
    let ValueNode::Object(fields) = exported else {
        return Err(CompileError::NotAnObject(exported.kind()));
    };

    let mut id = None;
    let mut name = None;
    let mut request = RequestSpec::default();
    let mut response = ResponseSpec::default();

    for (key, value) in fields {
        match key.as_str() {
            "id" => id = Some(literal_string(&value, "id")?),
            "name" => name = Some(literal_string(&value, "name")?),
            "request" => request = build_request(value)?,
            "response" => response = build_response(value)?,
            _ => {}
        }
    }

    let id = id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let name = name.unwrap_or_else(|| id.clone());

    Ok(Contract {
        id,
        name,
        request,
        response,
        raw_script: raw_script.to_string(),
    })
}

fn build_method(node: &ValueNode) -> Result<MethodSpec, CompileError> {
    match node.as_literal() {
        Some(Value::String(m)) => Ok(MethodSpec::One(m.to_ascii_uppercase())),
        Some(Value::Array(items)) if !items.is_empty() => items
            .iter()
            .map(|item| match item {
                Value::String(m) => Ok(m.to_ascii_uppercase()),
                other => Err(invalid("request.method", format!("expected a method name, found {other}"))),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(MethodSpec::Any),
        _ => Err(invalid(
            "request.method",
            "expected a method name or a non-empty list of names",
        )),
    }
}

fn build_query_parameters(node: ValueNode) -> Result<Vec<QueryParameter>, CompileError> {
    const FIELD: &str = "request.queryParameters";
    match node {
        ValueNode::Array(items) => items
            .into_iter()
            .map(|item| {
                let name = item
                    .field("name")
                    .cloned()
                    .ok_or_else(|| invalid(FIELD, "each parameter needs a `name`"))?;
                let value = item
                    .field("value")
                    .cloned()
                    .unwrap_or(ValueNode::Constant(Value::Null));
                Ok(QueryParameter { name, value })
            })
            .collect(),
        // Shorthand: `{page: integer(), q: 'x'}`.
        ValueNode::Object(fields) => Ok(fields
            .into_iter()
            .map(|(name, value)| QueryParameter {
                name: ValueNode::constant(name),
                value,
            })
            .collect()),
        other => Err(invalid(FIELD, format!("expected a list, found {}", other.kind()))),
    }
}

fn build_request(node: ValueNode) -> Result<RequestSpec, CompileError> {
    let mut request = RequestSpec::default();
    for (key, value) in take_fields(node, "request")? {
        match key.as_str() {
            "method" => request.method = build_method(&value)?,
            "urlPath" => request.url_path = value,
            "queryParameters" => request.query_parameters = build_query_parameters(value)?,
            "headers" => request.headers = take_fields(value, "request.headers")?,
            "body" => request.body = declared_body(value),
            _ => {}
        }
    }
    Ok(request)
}

fn build_response(node: ValueNode) -> Result<ResponseSpec, CompileError> {
    let mut response = ResponseSpec::default();
    for (key, value) in take_fields(node, "response")? {
        match key.as_str() {
            "status" => response.status = value,
            "headers" => response.headers = take_fields(value, "response.headers")?,
            "body" => response.body = declared_body(value),
            _ => {}
        }
    }
    Ok(response)
}
