//! Request/response types and response helpers for the Admin API.

use crate::store::StoreError;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Content type of contract scripts
pub const CONTRACT_SCRIPT_TYPE: &str = "application/vnd.js.contract";

/// Error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errors: Vec<ErrorDetail>,
}

/// Individual error detail
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// Contract summary returned on create and for JSON reads
#[derive(Debug, Serialize)]
pub struct ContractSummary {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
}

/// JSON form of a contract upload
#[derive(Debug, Deserialize)]
pub struct ContractUpload {
    pub script: String,
}

/// Body of the wiretest endpoints
#[derive(Debug, Default, Deserialize)]
pub struct WiretestRequest {
    #[serde(default)]
    pub server: Option<String>,
}

/// Which rendering of a contract script to return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScriptView {
    /// Script text as submitted
    #[default]
    Raw,
    /// Canonical printed form
    Canonical,
    Stub,
    Test,
}

impl ScriptView {
    /// Parse `view=` from a query string
    pub fn parse(query: Option<&str>) -> Option<Self> {
        let Some(q) = query else {
            return Some(ScriptView::Raw);
        };
        for param in q.split('&') {
            if let Some(("view", value)) = param.split_once('=') {
                return match value {
                    "raw" | "" => Some(ScriptView::Raw),
                    "canonical" => Some(ScriptView::Canonical),
                    "stub" => Some(ScriptView::Stub),
                    "test" => Some(ScriptView::Test),
                    _ => None,
                };
            }
        }
        Some(ScriptView::Raw)
    }
}

// =============================================================================
// Response helper functions
// =============================================================================

/// Create a JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = serde_json::to_string_pretty(body).unwrap_or_else(|_| "{}".to_string());
    build_response_with_headers(status, [("Content-Type", "application/json")], json)
}

/// Build an HTTP response with the given status and body.
///
/// Falls back to a bare response if the builder rejects its input.
pub fn build_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .body(Full::new(body.into()))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Internal Server Error"))))
}

/// Build an HTTP response with headers.
pub fn build_response_with_headers(
    status: StatusCode,
    headers: impl IntoIterator<Item = (impl AsRef<str>, impl AsRef<str>)>,
    body: impl Into<Bytes>,
) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(status);
    for (key, value) in headers {
        builder = builder.header(key.as_ref(), value.as_ref());
    }
    builder
        .body(Full::new(body.into()))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Internal Server Error"))))
}

/// 201 with a `Location` header and a JSON body
pub fn created<T: Serialize>(location: &str, body: &T) -> Response<Full<Bytes>> {
    let json = serde_json::to_string_pretty(body).unwrap_or_else(|_| "{}".to_string());
    build_response_with_headers(
        StatusCode::CREATED,
        [("Content-Type", "application/json"), ("Location", location)],
        json,
    )
}

pub fn no_content() -> Response<Full<Bytes>> {
    build_response(StatusCode::NO_CONTENT, Bytes::new())
}

/// Create an error response
pub fn error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    let error = ErrorResponse {
        errors: vec![ErrorDetail {
            code: status.as_str().to_string(),
            message: message.to_string(),
        }],
    };
    json_response(status, &error)
}

/// Error response for a numeric status code
pub fn error_with_code(code: u16, message: &str) -> Response<Full<Bytes>> {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    error_response(status, message)
}

pub fn store_error(e: &StoreError) -> Response<Full<Bytes>> {
    error_with_code(e.status_code(), &e.to_string())
}

/// Create a not found response
pub fn not_found() -> Response<Full<Bytes>> {
    error_response(StatusCode::NOT_FOUND, "Not Found")
}

/// Collect request body into bytes
pub async fn collect_body(req: Request<Incoming>) -> Result<Bytes, String> {
    req.collect()
        .await
        .map(|c| c.to_bytes())
        .map_err(|e| format!("Failed to read request body: {e}"))
}

/// Read and deserialize a JSON body; an empty body yields `T::default()`.
pub async fn read_json<T: DeserializeOwned + Default>(
    req: Request<Incoming>,
    what: &str,
) -> Result<T, Response<Full<Bytes>>> {
    let body = collect_body(req)
        .await
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, &e))?;
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(&body).map_err(|e| {
        error_response(StatusCode::BAD_REQUEST, &format!("Invalid {what} JSON: {e}"))
    })
}

/// Extract base URL from request headers for `Location` headers
pub fn get_base_url(req: &Request<Incoming>) -> String {
    if let Some(host) = req.headers().get("host") {
        if let Ok(host_str) = host.to_str() {
            return format!("http://{}", host_str);
        }
    }
    "http://localhost:8000".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_view_parse() {
        assert_eq!(ScriptView::parse(None), Some(ScriptView::Raw));
        assert_eq!(ScriptView::parse(Some("view=stub")), Some(ScriptView::Stub));
        assert_eq!(ScriptView::parse(Some("x=1&view=test")), Some(ScriptView::Test));
        assert_eq!(
            ScriptView::parse(Some("view=canonical")),
            Some(ScriptView::Canonical)
        );
        assert_eq!(ScriptView::parse(Some("other=1")), Some(ScriptView::Raw));
        assert_eq!(ScriptView::parse(Some("view=both")), None);
    }

    #[test]
    fn test_error_response_format() {
        let resp = error_response(StatusCode::BAD_REQUEST, "Test error");
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_store_error_status() {
        let resp = store_error(&StoreError::Conflict("version 1".into()));
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let resp = store_error(&StoreError::NotFound("app x".into()));
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_created_sets_location() {
        let resp = created("/api/v1/apps/shop", &serde_json::json!({"id": "shop"}));
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(resp.headers().get("Location").unwrap(), "/api/v1/apps/shop");
        assert_eq!(
            resp.headers().get("Content-Type").unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_no_content() {
        assert_eq!(no_content().status(), StatusCode::NO_CONTENT);
    }
}
