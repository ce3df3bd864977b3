//! Route dispatch logic for the Admin API.

use crate::admin_api::handlers::{apps, contracts, system, versions, wirestubs, wiretests};
use crate::admin_api::server::AdminState;
use crate::admin_api::types::{error_response, get_base_url, not_found};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use std::sync::Arc;
use tracing::debug;

const API_PREFIX: &str = "/api/v1";

/// Parsed route for app-specific endpoints
#[derive(Debug, PartialEq)]
enum AppRoute {
    /// GET/PUT/DELETE /apps/:appId
    Root,
    /// GET/POST /apps/:appId/versions
    Versions,
    /// GET/PUT/DELETE /apps/:appId/versions/:v
    Version(String),
    /// GET/POST/DELETE /apps/:appId/wirestub
    Wirestub,
    /// POST /apps/:appId/wiretest
    Wiretest,
    /// POST /apps/:appId/versions/:v/wiretest
    VersionWiretest(String),
    /// POST /apps/:appId/versions/:v/contracts/:contractId/wiretest
    ContractWiretest(String, String),
}

fn is_wiretest(segment: &str) -> bool {
    matches!(segment, "wiretest" | "wiretests")
}

impl AppRoute {
    /// Parse route from path segments after `/apps/:appId`
    fn parse(segments: &[&str]) -> Option<Self> {
        match segments {
            [] => Some(AppRoute::Root),
            ["versions"] => Some(AppRoute::Versions),
            ["versions", v] => Some(AppRoute::Version(v.to_string())),
            ["versions", v, last] if is_wiretest(last) => {
                Some(AppRoute::VersionWiretest(v.to_string()))
            }
            ["versions", v, "contracts", contract_id, last] if is_wiretest(last) => Some(
                AppRoute::ContractWiretest(v.to_string(), contract_id.to_string()),
            ),
            ["wirestub" | "wirestubs"] => Some(AppRoute::Wirestub),
            [last] if is_wiretest(last) => Some(AppRoute::Wiretest),
            _ => None,
        }
    }
}

/// Split a path into percent-decoded segments, ignoring a trailing slash
fn decode_segments(path: &str) -> Option<Vec<String>> {
    path.trim_end_matches('/')
        .split('/')
        .map(|segment| urlencoding::decode(segment).ok().map(|s| s.into_owned()))
        .collect()
}

/// Main request router
pub async fn route_request(
    req: Request<Incoming>,
    state: Arc<AdminState>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(|s| s.to_string());
    let base_url = get_base_url(&req);

    debug!("Admin API: {} {}", method, path);

    let response = route_by_path(&method, &path, query.as_deref(), req, &base_url, state).await;
    Ok(response)
}

/// Route based on path
async fn route_by_path(
    method: &Method,
    path: &str,
    query: Option<&str>,
    req: Request<Incoming>,
    base_url: &str,
    state: Arc<AdminState>,
) -> Response<Full<Bytes>> {
    // Fast path for common routes
    match (method, path) {
        (&Method::GET, "/api") | (&Method::GET, "/api/") => return system::handle_api_root(),
        (&Method::GET, "/health") => return system::handle_health(state),
        (&Method::GET, "/metrics") => return system::handle_metrics(),
        _ => {}
    }

    let Some(rest) = path.strip_prefix(API_PREFIX) else {
        return not_found();
    };
    let rest = rest.trim_end_matches('/');

    if rest == "/apps" {
        return match *method {
            Method::GET => apps::handle_list(state),
            Method::POST => apps::handle_create(req, state).await,
            _ => not_found(),
        };
    }

    if rest == "/contracts" {
        return match *method {
            Method::GET => contracts::handle_list(state),
            Method::POST => contracts::handle_create(req, state).await,
            _ => not_found(),
        };
    }

    if let Some(tail) = rest.strip_prefix("/contracts/") {
        let Some(segments) = decode_segments(tail) else {
            return error_response(StatusCode::BAD_REQUEST, "Invalid contract id");
        };
        let [contract_id] = segments.as_slice() else {
            return not_found();
        };
        return match *method {
            Method::GET => contracts::handle_get(contract_id, query, &req, state),
            Method::PUT => contracts::handle_update(contract_id, req, state).await,
            Method::DELETE => contracts::handle_delete(contract_id, state),
            _ => not_found(),
        };
    }

    if let Some(tail) = rest.strip_prefix("/apps/") {
        return route_app(method, tail, req, base_url, state).await;
    }

    not_found()
}

/// Route app-specific requests
async fn route_app(
    method: &Method,
    path: &str,
    req: Request<Incoming>,
    base_url: &str,
    state: Arc<AdminState>,
) -> Response<Full<Bytes>> {
    let Some(segments) = decode_segments(path) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid path encoding");
    };
    let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

    let Some((app_id, rest)) = segments.split_first() else {
        return not_found();
    };
    if app_id.is_empty() {
        return not_found();
    }

    let route = match AppRoute::parse(rest) {
        Some(r) => r,
        None => return not_found(),
    };

    match (method, route) {
        // /apps/:appId
        (&Method::GET, AppRoute::Root) => apps::handle_get(app_id, state),
        (&Method::PUT, AppRoute::Root) => apps::handle_update(app_id, req, state).await,
        (&Method::DELETE, AppRoute::Root) => apps::handle_delete(app_id, state).await,

        // /apps/:appId/versions
        (&Method::GET, AppRoute::Versions) => versions::handle_list(app_id, state),
        (&Method::POST, AppRoute::Versions) => versions::handle_create(app_id, req, state).await,

        // /apps/:appId/versions/:v
        (&Method::GET, AppRoute::Version(v)) => versions::handle_get(app_id, &v, state),
        (&Method::PUT, AppRoute::Version(v)) => {
            versions::handle_update(app_id, &v, req, state).await
        }
        (&Method::DELETE, AppRoute::Version(v)) => versions::handle_delete(app_id, &v, state),

        // /apps/:appId/wirestub
        (&Method::GET, AppRoute::Wirestub) => wirestubs::handle_get(app_id, state),
        (&Method::POST, AppRoute::Wirestub) => {
            wirestubs::handle_create(app_id, req, base_url, state).await
        }
        (&Method::DELETE, AppRoute::Wirestub) => wirestubs::handle_delete(app_id, state).await,

        // wiretests
        (&Method::POST, AppRoute::Wiretest) => wiretests::handle_app(app_id, req, state).await,
        (&Method::POST, AppRoute::VersionWiretest(v)) => {
            wiretests::handle_version(app_id, &v, req, state).await
        }
        (&Method::POST, AppRoute::ContractWiretest(v, contract_id)) => {
            wiretests::handle_contract(app_id, &v, &contract_id, req, state).await
        }

        _ => not_found(),
    }
}
