//! Wire-test handlers. Each takes an optional `{server}` body overriding the
//! app's first declared server.

use crate::admin_api::server::AdminState;
use crate::admin_api::types::*;
use crate::wiretest::WiretestError;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;

fn respond<T: Serialize>(result: Result<T, WiretestError>) -> Response<Full<Bytes>> {
    match result {
        Ok(record) => json_response(StatusCode::OK, &record),
        Err(e) => error_with_code(e.status_code(), &e.to_string()),
    }
}

/// POST /api/v1/apps/:appId/wiretest
pub async fn handle_app(
    app_id: &str,
    req: Request<Incoming>,
    state: Arc<AdminState>,
) -> Response<Full<Bytes>> {
    let body: WiretestRequest = match read_json(req, "wiretest").await {
        Ok(body) => body,
        Err(resp) => return resp,
    };
    respond(state.wiretests.run_app(app_id, body.server.as_deref()).await)
}

/// POST /api/v1/apps/:appId/versions/:v/wiretest
pub async fn handle_version(
    app_id: &str,
    v: &str,
    req: Request<Incoming>,
    state: Arc<AdminState>,
) -> Response<Full<Bytes>> {
    let body: WiretestRequest = match read_json(req, "wiretest").await {
        Ok(body) => body,
        Err(resp) => return resp,
    };
    respond(
        state
            .wiretests
            .run_version(app_id, v, body.server.as_deref())
            .await,
    )
}

/// POST /api/v1/apps/:appId/versions/:v/contracts/:contractId/wiretest
pub async fn handle_contract(
    app_id: &str,
    v: &str,
    contract_id: &str,
    req: Request<Incoming>,
    state: Arc<AdminState>,
) -> Response<Full<Bytes>> {
    let body: WiretestRequest = match read_json(req, "wiretest").await {
        Ok(body) => body,
        Err(resp) => return resp,
    };
    respond(
        state
            .wiretests
            .run_contract(app_id, v, contract_id, body.server.as_deref())
            .await,
    )
}
