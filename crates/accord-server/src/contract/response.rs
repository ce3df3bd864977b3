//! Response synthesis for stub mode.

use super::matching::IncomingRequest;
use super::types::Contract;
use crate::dsl::NodeError;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SynthesisError {
    #[error("cannot produce response {part}: {source}")]
    Node {
        part: String,
        #[source]
        source: NodeError,
    },

    #[error("status must be an integer between 100 and 999, got {0}")]
    InvalidStatus(Value),
}

/// A concrete response produced from a contract.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl SynthesizedResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Encode the body for the wire and fill in a content type when none was declared.
    ///
    /// Strings are sent verbatim; any other value is serialized as JSON.
    pub fn encode(&self) -> (Vec<(String, String)>, String) {
        let mut headers = self.headers.clone();
        let (payload, content_type) = match &self.body {
            None | Some(Value::Null) => (String::new(), None),
            Some(Value::String(s)) => (s.clone(), Some("text/plain; charset=utf-8")),
            Some(other) => (other.to_string(), Some("application/json")),
        };
        if let Some(ct) = content_type {
            if self.header("content-type").is_none() {
                headers.push(("Content-Type".to_string(), ct.to_string()));
            }
        }
        (headers, payload)
    }
}

fn header_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

impl Contract {
    /// Produce the stub response for `req`: each part is evaluated against the
    /// request document, then mocked.
    pub fn handle(
        &self,
        base_path: &str,
        req: &IncomingRequest,
    ) -> Result<SynthesizedResponse, SynthesisError> {
        let ctx = req.context(base_path);
        let spec = &self.response;

        let mut headers = Vec::with_capacity(spec.headers.len());
        for (name, node) in &spec.headers {
            let value = node.resolve(&ctx).map_err(|source| SynthesisError::Node {
                part: format!("header `{name}`"),
                source,
            })?;
            if !value.is_null() {
                headers.push((name.clone(), header_text(value)));
            }
        }

        let status_value = spec.status.resolve(&ctx).map_err(|source| SynthesisError::Node {
            part: "status".to_string(),
            source,
        })?;
        let status = status_value
            .as_u64()
            .filter(|s| (100..=999).contains(s))
            .ok_or_else(|| SynthesisError::InvalidStatus(status_value.clone()))?
            as u16;

        let body = spec
            .body
            .as_ref()
            .map(|node| node.resolve(&ctx))
            .transpose()
            .map_err(|source| SynthesisError::Node {
                part: "body".to_string(),
                source,
            })?;

        Ok(SynthesizedResponse {
            status,
            headers,
            body,
        })
    }
}
