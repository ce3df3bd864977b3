//! App CRUD handlers.

use crate::admin_api::server::AdminState;
use crate::admin_api::types::*;
use crate::store::App;
use crate::wirestub::WirestubError;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use std::sync::Arc;
use tracing::{info, warn};

/// GET /api/v1/apps - List app ids
pub fn handle_list(state: Arc<AdminState>) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &state.store.list_apps())
}

/// POST /api/v1/apps - Create an app
pub async fn handle_create(req: Request<Incoming>, state: Arc<AdminState>) -> Response<Full<Bytes>> {
    let app: App = match read_json(req, "app").await {
        Ok(app) => app,
        Err(resp) => return resp,
    };

    match state.store.create_app(app) {
        Ok(app) => {
            info!("Created app {}", app.id);
            created(&format!("/api/v1/apps/{}", app.id), &app)
        }
        Err(e) => store_error(&e),
    }
}

/// GET /api/v1/apps/:appId
pub fn handle_get(app_id: &str, state: Arc<AdminState>) -> Response<Full<Bytes>> {
    match state.store.get_app(app_id) {
        Ok(app) => json_response(StatusCode::OK, &app),
        Err(e) => store_error(&e),
    }
}

/// PUT /api/v1/apps/:appId - Replace an app; the path id wins
pub async fn handle_update(
    app_id: &str,
    req: Request<Incoming>,
    state: Arc<AdminState>,
) -> Response<Full<Bytes>> {
    let mut app: App = match read_json(req, "app").await {
        Ok(app) => app,
        Err(resp) => return resp,
    };
    app.id = app_id.to_string();
    if app.name.is_empty() {
        app.name = app.id.clone();
    }
    for version in &mut app.versions {
        version.parent = Some(app.id.clone());
    }

    match state.store.update_app(app) {
        Ok(_) => no_content(),
        Err(e) => store_error(&e),
    }
}

/// DELETE /api/v1/apps/:appId - Delete an app and stop its wirestub
pub async fn handle_delete(app_id: &str, state: Arc<AdminState>) -> Response<Full<Bytes>> {
    if let Err(e) = state.store.delete_app(app_id) {
        return store_error(&e);
    }
    match state.wirestubs.delete(app_id).await {
        Ok(record) => info!("Stopped wirestub on port {} with app {}", record.port, app_id),
        Err(WirestubError::NotFound(_)) => {}
        Err(e) => warn!("Failed to stop wirestub of deleted app {}: {}", app_id, e),
    }
    no_content()
}
