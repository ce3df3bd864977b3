//! System handlers: liveness, health, metrics.

use crate::admin_api::server::AdminState;
use crate::admin_api::types::*;
use crate::metrics::collect_metrics;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use std::sync::Arc;

/// GET /api - Liveness probe
pub fn handle_api_root() -> Response<Full<Bytes>> {
    build_response_with_headers(
        StatusCode::OK,
        [("Content-Type", "text/plain; charset=utf-8")],
        "OK",
    )
}

/// GET /health - Health check with resource counts
pub fn handle_health(state: Arc<AdminState>) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "apps": state.store.list_apps().len(),
        "contracts": state.store.list_contracts().len(),
        "wirestubs": state.wirestubs.count(),
    });
    json_response(StatusCode::OK, &body)
}

/// GET /metrics - Prometheus metrics
pub fn handle_metrics() -> Response<Full<Bytes>> {
    build_response_with_headers(
        StatusCode::OK,
        [("Content-Type", "text/plain; version=0.0.4")],
        collect_metrics(),
    )
}
