//! Request matching: decides whether a contract handles an incoming request.

use super::types::Contract;
use crate::dsl::{EvaluationContext, Mode, ValueNode};
use serde_json::{json, Map, Value};
use tracing::debug;

/// Transport-independent view of an HTTP request received by a stub listener.
#[derive(Debug, Clone, Default)]
pub struct IncomingRequest {
    pub method: String,
    pub path: String,
    /// Decoded query pairs in arrival order.
    pub query: Vec<(String, String)>,
    /// Header pairs; names are compared case-insensitively.
    pub headers: Vec<(String, String)>,
    pub raw_body: String,
}

/// Decode `a=1&b=x+y` style pairs.
pub fn parse_form(input: &str) -> Vec<(String, String)> {
    input
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(name), decode_component(value))
        })
        .collect()
}

fn decode_component(s: &str) -> String {
    let spaced = s.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|c| c.into_owned())
        .unwrap_or(spaced)
}

/// Group repeated names into arrays, as query-string parsers do.
fn pairs_to_map(pairs: &[(String, String)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (name, value) in pairs {
        let value = Value::String(value.clone());
        match map.get_mut(name) {
            None => {
                map.insert(name.clone(), value);
            }
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
        }
    }
    map
}

/// Remove `base_path` from the front of `path` and ensure a leading slash.
pub fn strip_base_path(path: &str, base_path: &str) -> String {
    let stripped = if base_path.is_empty() {
        path
    } else {
        path.strip_prefix(base_path).unwrap_or(path)
    };
    if stripped.starts_with('/') {
        stripped.to_string()
    } else {
        format!("/{stripped}")
    }
}

impl IncomingRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into().to_ascii_uppercase(),
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_query(mut self, raw_query: &str) -> Self {
        self.query.extend(parse_form(raw_query));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.raw_body = body.into();
        self
    }

    /// First header value for `name`, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn query_map(&self) -> Map<String, Value> {
        pairs_to_map(&self.query)
    }

    /// Headers keyed by lowercase name; repeated headers are joined with `, `.
    pub fn headers_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        for (name, value) in &self.headers {
            let key = name.to_ascii_lowercase();
            match map.get_mut(&key) {
                Some(Value::String(existing)) => {
                    existing.push_str(", ");
                    existing.push_str(value);
                }
                _ => {
                    map.insert(key, Value::String(value.clone()));
                }
            }
        }
        map
    }

    fn is_form(&self) -> bool {
        self.header("content-type").is_some_and(|ct| {
            ct.to_ascii_lowercase()
                .starts_with("application/x-www-form-urlencoded")
        })
    }

    pub fn json_body(&self) -> Option<Value> {
        serde_json::from_str(&self.raw_body).ok()
    }

    /// Body as seen by contracts: form fields, JSON, raw text, or `null` when empty.
    pub fn parsed_body(&self) -> Value {
        if self.raw_body.is_empty() {
            return Value::Null;
        }
        if self.is_form() {
            return Value::Object(pairs_to_map(&parse_form(&self.raw_body)));
        }
        self.json_body()
            .unwrap_or_else(|| Value::String(self.raw_body.clone()))
    }

    /// The evaluation document `{req: {...}}` for this request.
    pub fn to_document(&self, base_path: &str) -> Value {
        json!({
            "req": {
                "method": self.method,
                "basePath": base_path,
                "path": strip_base_path(&self.path, base_path),
                "query": self.query_map(),
                "body": self.parsed_body(),
                "rawBody": self.raw_body,
                "jsonBody": self.json_body().unwrap_or(Value::Null),
                "headers": self.headers_map(),
            }
        })
    }

    pub fn context(&self, base_path: &str) -> EvaluationContext {
        EvaluationContext::new(self.to_document(base_path), Mode::Stub)
    }
}

/// Evaluate `pattern` against `ctx` and compare with `actual`. Capability
/// failures count as a mismatch.
fn check(label: &str, pattern: &ValueNode, ctx: &EvaluationContext, actual: &Value) -> bool {
    match pattern.evaluate(ctx).compare(actual) {
        Ok(matched) => matched,
        Err(e) => {
            debug!("Cannot compare {}: {}", label, e);
            false
        }
    }
}

/// Resolve a name node to a concrete string.
fn resolve_name(node: &ValueNode, ctx: &EvaluationContext) -> Option<String> {
    match node.resolve(ctx).ok()? {
        Value::String(s) => Some(s),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

impl Contract {
    /// True if every declared request predicate holds for `req`.
    pub fn is_handle(&self, base_path: &str, req: &IncomingRequest) -> bool {
        let spec = &self.request;
        if !spec.method.matches(&req.method) {
            return false;
        }

        let ctx = req.context(base_path);
        let path = Value::String(strip_base_path(&req.path, base_path));
        if !check("urlPath", &spec.url_path, &ctx, &path) {
            return false;
        }

        if !spec.query_parameters.is_empty() {
            let query = req.query_map();
            for param in &spec.query_parameters {
                let Some(name) = resolve_name(&param.name, &ctx) else {
                    return false;
                };
                let actual = query.get(&name).unwrap_or(&Value::Null);
                if !check(&name, &param.value, &ctx, actual) {
                    return false;
                }
            }
        }

        for (name, pattern) in &spec.headers {
            let actual = req
                .header(name)
                .map(|v| Value::String(v.to_string()))
                .unwrap_or(Value::Null);
            if !check(name, pattern, &ctx, &actual) {
                return false;
            }
        }

        if let Some(body) = &spec.body {
            if !check("body", body, &ctx, &req.parsed_body()) {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::ContractCompiler;

    fn contract(script: &str) -> Contract {
        ContractCompiler::default().compile(script).unwrap()
    }

    #[test]
    fn test_url_path_regex() {
        let c = contract("{request: {urlPath: regex('/hello/[a-z]*')}}");
        assert!(c.is_handle("", &IncomingRequest::new("GET", "/hello/apple")));
        assert!(!c.is_handle("", &IncomingRequest::new("GET", "/hello/APPLE")));
    }

    #[test]
    fn test_base_path_is_stripped() {
        let c = contract("{request: {urlPath: '/users'}}");
        assert!(c.is_handle("/api/v1", &IncomingRequest::new("GET", "/api/v1/users")));
        assert!(!c.is_handle("/api/v1", &IncomingRequest::new("GET", "/api/v2/users")));
        assert_eq!(strip_base_path("/api", "/api"), "/");
        assert_eq!(strip_base_path("/apix", "/api"), "/x");
    }

    #[test]
    fn test_method_single_and_list() {
        let one = contract("{request: {method: 'post'}}");
        assert!(one.is_handle("", &IncomingRequest::new("POST", "/")));
        assert!(!one.is_handle("", &IncomingRequest::new("GET", "/")));

        let any = contract("{request: {method: ['PUT', 'PATCH']}}");
        assert!(any.is_handle("", &IncomingRequest::new("PATCH", "/")));
        assert!(!any.is_handle("", &IncomingRequest::new("DELETE", "/")));
    }

    #[test]
    fn test_query_and_headers() {
        let c = contract(
            "{request: {queryParameters: [{name: 'page', value: regex('[0-9]+')}], \
             headers: {'X-Api-Key': 'secret'}}}",
        );
        let ok = IncomingRequest::new("GET", "/")
            .with_query("page=12&extra=1")
            .with_header("x-api-key", "secret");
        assert!(c.is_handle("", &ok));

        let bad_query = IncomingRequest::new("GET", "/")
            .with_query("page=x")
            .with_header("X-API-KEY", "secret");
        assert!(!c.is_handle("", &bad_query));

        let missing_header = IncomingRequest::new("GET", "/").with_query("page=1");
        assert!(!c.is_handle("", &missing_header));
    }

    #[test]
    fn test_body_open_matching() {
        let c = contract("{request: {method: 'POST', body: {name: text({type: 'word'}), age: integer()}}}");
        let req = IncomingRequest::new("POST", "/")
            .with_header("Content-Type", "application/json")
            .with_body(r#"{"name": "ann", "age": 30, "extra": [1]}"#);
        assert!(c.is_handle("", &req));
        let wrong = req.clone().with_body(r#"{"name": "ann", "age": "30"}"#);
        assert!(!c.is_handle("", &wrong));
        assert!(!c.is_handle("", &IncomingRequest::new("POST", "/")));
    }

    #[test]
    fn test_form_body() {
        let c = contract("{request: {method: 'POST', body: {q: 'a b'}}}");
        let req = IncomingRequest::new("POST", "/")
            .with_header("Content-Type", "application/x-www-form-urlencoded")
            .with_body("q=a+b&page=2");
        assert!(c.is_handle("", &req));
    }

    #[test]
    fn test_jsonpath_in_predicates() {
        let c = contract(
            "{request: {method: 'POST', urlPath: '/echo', \
             body: {tokens: jsonpath('$.req.query.t')}}}",
        );
        let req = IncomingRequest::new("POST", "/echo")
            .with_query("t=abc")
            .with_body(r#"{"tokens": ["abc"]}"#);
        assert!(c.is_handle("", &req));
        let other = req.clone().with_body(r#"{"tokens": ["xyz"]}"#);
        assert!(!c.is_handle("", &other));
    }

    #[test]
    fn test_document_shape() {
        let req = IncomingRequest::new("get", "/base/x")
            .with_query("a=1&a=2")
            .with_header("Accept", "text/plain")
            .with_body("plain");
        let doc = req.to_document("/base");
        assert_eq!(doc["req"]["method"], "GET");
        assert_eq!(doc["req"]["path"], "/x");
        assert_eq!(doc["req"]["query"]["a"], json!(["1", "2"]));
        assert_eq!(doc["req"]["headers"]["accept"], "text/plain");
        assert_eq!(doc["req"]["body"], "plain");
        assert_eq!(doc["req"]["jsonBody"], Value::Null);
    }
}
