//! Wirestub lifecycle handlers.

use crate::admin_api::server::AdminState;
use crate::admin_api::types::*;
use crate::store::WirestubRecord;
use crate::wirestub::{CreateOutcome, WirestubError};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use std::sync::Arc;
use tracing::info;

fn wirestub_error(e: &WirestubError) -> Response<Full<Bytes>> {
    error_with_code(e.status_code(), &e.to_string())
}

/// URL clients should use to reach a listener
fn listener_url(base_url: &str, record: &WirestubRecord) -> String {
    let host = match record.host.as_deref() {
        None | Some("0.0.0.0") | Some("::") => base_url
            .trim_start_matches("http://")
            .split(':')
            .next()
            .unwrap_or("localhost")
            .to_string(),
        Some(host) => host.to_string(),
    };
    format!("http://{}:{}", host, record.port)
}

/// GET /api/v1/apps/:appId/wirestub
pub fn handle_get(app_id: &str, state: Arc<AdminState>) -> Response<Full<Bytes>> {
    match state.wirestubs.get(app_id) {
        Ok(record) => json_response(StatusCode::OK, &record),
        Err(e) => wirestub_error(&e),
    }
}

/// POST /api/v1/apps/:appId/wirestub - Start a listener (`{port, host?}`)
///
/// 201 with the bound record when a listener was started, 204 when one was
/// already running for the app.
pub async fn handle_create(
    app_id: &str,
    req: Request<Incoming>,
    base_url: &str,
    state: Arc<AdminState>,
) -> Response<Full<Bytes>> {
    let request: WirestubRecord = match read_json(req, "wirestub").await {
        Ok(request) => request,
        Err(resp) => return resp,
    };

    match state.wirestubs.create(app_id, request).await {
        Ok(CreateOutcome::Created(record)) => {
            info!("Wirestub for {} created on port {}", app_id, record.port);
            created(&listener_url(base_url, &record), &record)
        }
        Ok(CreateOutcome::AlreadyRunning(_)) => no_content(),
        Err(e) => wirestub_error(&e),
    }
}

/// DELETE /api/v1/apps/:appId/wirestub
pub async fn handle_delete(app_id: &str, state: Arc<AdminState>) -> Response<Full<Bytes>> {
    match state.wirestubs.delete(app_id).await {
        Ok(_) => no_content(),
        Err(e) => wirestub_error(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listener_url_uses_admin_host_for_wildcard_binds() {
        let record = WirestubRecord {
            port: 9001,
            host: Some("0.0.0.0".into()),
        };
        assert_eq!(
            listener_url("http://example.test:8000", &record),
            "http://example.test:9001"
        );

        let record = WirestubRecord {
            port: 9001,
            host: Some("127.0.0.1".into()),
        };
        assert_eq!(
            listener_url("http://example.test:8000", &record),
            "http://127.0.0.1:9001"
        );
    }
}
