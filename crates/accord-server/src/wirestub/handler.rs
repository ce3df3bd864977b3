//! Request handling for wirestub listeners.
//!
//! Routing walks the app's versions in order, keeps those whose base path
//! prefixes the request path, and tries their contracts in declaration order.

use crate::admin_api::types::{build_response, build_response_with_headers};
use crate::contract::{Contract, IncomingRequest, SynthesizedResponse};
use crate::metrics;
use crate::store::ResourceStore;
use bytes::Bytes;
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Incoming;
use hyper::header::{HeaderName, HeaderValue};
use hyper::{Request, Response, StatusCode};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, warn};

/// Shared state of one listener.
pub(crate) struct StubContext {
    pub app_id: String,
    pub store: Arc<dyn ResourceStore>,
    pub max_body_bytes: usize,
}

/// What routing decided for a request.
#[derive(Debug)]
pub enum RouteOutcome {
    Matched {
        contract: Arc<Contract>,
        base_path: String,
    },
    Unmatched,
}

/// Find the first contract that handles `req` for `app_id`.
pub fn route(store: &dyn ResourceStore, app_id: &str, req: &IncomingRequest) -> RouteOutcome {
    let app = match store.get_app(app_id) {
        Ok(app) => app,
        Err(e) => {
            warn!("Wirestub for {} has no app record: {}", app_id, e);
            return RouteOutcome::Unmatched;
        }
    };

    for version in &app.versions {
        let base_path = version.base_path(&app.base_path);
        if !req.path.starts_with(&base_path) {
            continue;
        }
        for contract_id in &version.contracts {
            let contract = match store.get_contract(contract_id) {
                Ok(contract) => contract,
                Err(_) => {
                    debug!("Version {} lists unknown contract {}", version.v, contract_id);
                    continue;
                }
            };
            if contract.is_handle(&base_path, req) {
                return RouteOutcome::Matched {
                    contract,
                    base_path,
                };
            }
        }
    }
    RouteOutcome::Unmatched
}

fn to_incoming(parts: &hyper::http::request::Parts, body: &[u8]) -> IncomingRequest {
    let mut incoming = IncomingRequest::new(parts.method.as_str(), parts.uri.path())
        .with_query(parts.uri.query().unwrap_or(""))
        .with_body(String::from_utf8_lossy(body));
    for (name, value) in &parts.headers {
        match value.to_str() {
            Ok(v) => incoming = incoming.with_header(name.as_str(), v),
            Err(_) => debug!("Skipping non-UTF-8 header {}", name),
        }
    }
    incoming
}

/// Turn a synthesized response into a hyper response, skipping headers that
/// are not valid on the wire.
pub(crate) fn into_http(resp: &SynthesizedResponse) -> Response<Full<Bytes>> {
    let (headers, payload) = resp.encode();
    let status = StatusCode::from_u16(resp.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = build_response(status, payload);
    for (name, value) in headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            (Ok(name), Ok(value)) => {
                response.headers_mut().append(name, value);
            }
            _ => debug!("Dropping invalid response header {:?}", name),
        }
    }
    response
}

/// Handle a request to a wirestub
pub(crate) async fn handle_stub_request(
    req: Request<Incoming>,
    ctx: Arc<StubContext>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();

    let bytes = match Limited::new(body, ctx.max_body_bytes).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            metrics::record_stub_request("error");
            debug!("Rejecting request body for {}: {}", ctx.app_id, e);
            return Ok(build_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                "Request body too large",
            ));
        }
    };

    let incoming = to_incoming(&parts, &bytes);
    debug!("Wirestub {}: {} {}", ctx.app_id, incoming.method, incoming.path);

    let response = match route(ctx.store.as_ref(), &ctx.app_id, &incoming) {
        RouteOutcome::Matched {
            contract,
            base_path,
        } => match contract.handle(&base_path, &incoming) {
            Ok(resp) => {
                metrics::record_stub_request("matched");
                debug!("Contract {} answered with {}", contract.id, resp.status);
                into_http(&resp)
            }
            Err(e) => {
                metrics::record_stub_request("error");
                warn!("Contract {} failed to produce a response: {}", contract.id, e);
                build_response_with_headers(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    [("Content-Type", "text/plain; charset=utf-8")],
                    e.to_string(),
                )
            }
        },
        RouteOutcome::Unmatched => {
            metrics::record_stub_request("unmatched");
            debug!("No contract matched {} {}", incoming.method, incoming.path);
            build_response(StatusCode::NOT_FOUND, "Not found")
        }
    };
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::ContractCompiler;
    use crate::store::{App, InMemoryStore, Version};

    fn store_with(contracts: &[&str], versions: Vec<Version>) -> InMemoryStore {
        let store = InMemoryStore::new();
        let compiler = ContractCompiler::default();
        for script in contracts {
            store.create_contract(compiler.compile(script).unwrap()).unwrap();
        }
        let mut app = App::new("shop", "/shop");
        for version in versions {
            app = app.with_version(version);
        }
        store.create_app(app).unwrap();
        store
    }

    fn matched_id(outcome: RouteOutcome) -> Option<String> {
        match outcome {
            RouteOutcome::Matched { contract, .. } => Some(contract.id.clone()),
            RouteOutcome::Unmatched => None,
        }
    }

    #[test]
    fn test_first_declared_contract_wins() {
        let store = store_with(
            &[
                "{id: 'any', request: {urlPath: regex('/.*')}}",
                "{id: 'exact', request: {urlPath: '/items'}}",
            ],
            vec![Version::new("1").with_contracts(["any", "exact"])],
        );
        let req = IncomingRequest::new("GET", "/shop/items");
        assert_eq!(matched_id(route(&store, "shop", &req)).as_deref(), Some("any"));
    }

    #[test]
    fn test_version_path_template_selects_version() {
        let store = store_with(
            &[
                "{id: 'v1-items', request: {urlPath: '/items'}}",
                "{id: 'v2-items', request: {urlPath: '/items'}}",
            ],
            vec![
                Version::new("1")
                    .with_path("{{app.basePath}}/v{{version.v}}")
                    .with_contracts(["v1-items"]),
                Version::new("2")
                    .with_path("{{app.basePath}}/v{{version.v}}")
                    .with_contracts(["v2-items"]),
            ],
        );
        let req = IncomingRequest::new("GET", "/shop/v2/items");
        assert_eq!(matched_id(route(&store, "shop", &req)).as_deref(), Some("v2-items"));
        let req = IncomingRequest::new("GET", "/other/v2/items");
        assert!(matched_id(route(&store, "shop", &req)).is_none());
    }

    #[test]
    fn test_unknown_contracts_and_apps_are_skipped() {
        let store = store_with(
            &["{id: 'real', request: {urlPath: '/'}}"],
            vec![Version::new("1").with_contracts(["ghost", "real"])],
        );
        let req = IncomingRequest::new("GET", "/shop");
        assert_eq!(matched_id(route(&store, "shop", &req)).as_deref(), Some("real"));
        assert!(matched_id(route(&store, "nope", &req)).is_none());
    }

    #[test]
    fn test_into_http_drops_invalid_headers() {
        let resp = SynthesizedResponse {
            status: 201,
            headers: vec![
                ("X-Ok".into(), "yes".into()),
                ("bad header".into(), "x".into()),
            ],
            body: Some(serde_json::json!({"a": 1})),
        };
        let http = into_http(&resp);
        assert_eq!(http.status(), StatusCode::CREATED);
        assert_eq!(http.headers().get("x-ok").unwrap(), "yes");
        assert_eq!(http.headers().get("content-type").unwrap(), "application/json");
        assert_eq!(http.headers().len(), 2);
    }
}
