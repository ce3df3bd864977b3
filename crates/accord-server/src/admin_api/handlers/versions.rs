//! Version handlers, nested under an app.

use crate::admin_api::server::AdminState;
use crate::admin_api::types::*;
use crate::store::Version;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use std::sync::Arc;
use tracing::info;

/// GET /api/v1/apps/:appId/versions - List version numbers in declaration order
pub fn handle_list(app_id: &str, state: Arc<AdminState>) -> Response<Full<Bytes>> {
    match state.store.get_app(app_id) {
        Ok(app) => json_response(StatusCode::OK, &app.version_numbers()),
        Err(e) => store_error(&e),
    }
}

/// POST /api/v1/apps/:appId/versions
pub async fn handle_create(
    app_id: &str,
    req: Request<Incoming>,
    state: Arc<AdminState>,
) -> Response<Full<Bytes>> {
    let version: Version = match read_json(req, "version").await {
        Ok(version) => version,
        Err(resp) => return resp,
    };

    match state.store.create_version(app_id, version) {
        Ok(version) => {
            info!("Created version {} of app {}", version.v, app_id);
            created(
                &format!("/api/v1/apps/{}/versions/{}", app_id, version.v),
                &version,
            )
        }
        Err(e) => store_error(&e),
    }
}

/// GET /api/v1/apps/:appId/versions/:v
pub fn handle_get(app_id: &str, v: &str, state: Arc<AdminState>) -> Response<Full<Bytes>> {
    match state.store.get_version(app_id, v) {
        Ok(version) => json_response(StatusCode::OK, &version),
        Err(e) => store_error(&e),
    }
}

/// PUT /api/v1/apps/:appId/versions/:v - Replace a version; the path `v` wins
pub async fn handle_update(
    app_id: &str,
    v: &str,
    req: Request<Incoming>,
    state: Arc<AdminState>,
) -> Response<Full<Bytes>> {
    let mut version: Version = match read_json(req, "version").await {
        Ok(version) => version,
        Err(resp) => return resp,
    };
    version.v = v.to_string();

    match state.store.update_version(app_id, version) {
        Ok(_) => no_content(),
        Err(e) => store_error(&e),
    }
}

/// DELETE /api/v1/apps/:appId/versions/:v
pub fn handle_delete(app_id: &str, v: &str, state: Arc<AdminState>) -> Response<Full<Bytes>> {
    match state.store.delete_version(app_id, v) {
        Ok(()) => no_content(),
        Err(e) => store_error(&e),
    }
}
