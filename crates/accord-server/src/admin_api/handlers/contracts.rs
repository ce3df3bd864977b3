//! Contract handlers. Contracts are uploaded as script text.

use crate::admin_api::server::AdminState;
use crate::admin_api::types::*;
use crate::contract::{CompileError, Contract};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use std::sync::Arc;
use tracing::info;

fn is_json(req: &Request<Incoming>, header: &str) -> bool {
    req.headers()
        .get(header)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/json"))
        .unwrap_or(false)
}

/// Extract the script from a request: raw text, or `{"script": "..."}` when
/// sent as JSON.
async fn read_script(req: Request<Incoming>) -> Result<String, Response<Full<Bytes>>> {
    let json = is_json(&req, "content-type");
    let body = collect_body(req)
        .await
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, &e))?;

    if json {
        return serde_json::from_slice::<ContractUpload>(&body)
            .map(|upload| upload.script)
            .map_err(|e| {
                error_response(
                    StatusCode::BAD_REQUEST,
                    &format!("Invalid contract JSON: {e}"),
                )
            });
    }
    String::from_utf8(body.to_vec())
        .map_err(|_| error_response(StatusCode::BAD_REQUEST, "Contract script must be UTF-8"))
}

fn compile(state: &AdminState, script: &str) -> Result<Contract, Response<Full<Bytes>>> {
    state.compiler.compile(script).map_err(|e| compile_error(&e))
}

fn compile_error(e: &CompileError) -> Response<Full<Bytes>> {
    error_response(
        StatusCode::BAD_REQUEST,
        &format!("Invalid contract script: {e}"),
    )
}

fn summary(contract: &Contract, script: Option<String>) -> ContractSummary {
    ContractSummary {
        id: contract.id.clone(),
        name: contract.name.clone(),
        script,
    }
}

/// GET /api/v1/contracts - List contract ids
pub fn handle_list(state: Arc<AdminState>) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &state.store.list_contracts())
}

/// POST /api/v1/contracts - Compile and store a contract script
pub async fn handle_create(req: Request<Incoming>, state: Arc<AdminState>) -> Response<Full<Bytes>> {
    let script = match read_script(req).await {
        Ok(script) => script,
        Err(resp) => return resp,
    };
    let contract = match compile(&state, &script) {
        Ok(contract) => contract,
        Err(resp) => return resp,
    };

    match state.store.create_contract(contract) {
        Ok(contract) => {
            info!("Created contract {}", contract.id);
            created(
                &format!("/api/v1/contracts/{}", contract.id),
                &summary(&contract, None),
            )
        }
        Err(e) => store_error(&e),
    }
}

/// GET /api/v1/contracts/:id[?view=raw|canonical|stub|test]
///
/// Returns the script text, or a JSON summary when the client accepts JSON.
pub fn handle_get(
    contract_id: &str,
    query: Option<&str>,
    req: &Request<Incoming>,
    state: Arc<AdminState>,
) -> Response<Full<Bytes>> {
    let contract = match state.store.get_contract(contract_id) {
        Ok(contract) => contract,
        Err(e) => return store_error(&e),
    };
    let Some(view) = ScriptView::parse(query) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "view must be one of raw, canonical, stub, test",
        );
    };

    let script = match view {
        ScriptView::Raw => Ok(contract.raw_script.clone()),
        ScriptView::Canonical => Ok(contract.to_script()),
        ScriptView::Stub => contract.to_stub_script(&state.compiler),
        ScriptView::Test => contract.to_test_script(&state.compiler),
    };
    let script = match script {
        Ok(script) => script,
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("Cannot derive {view:?} script: {e}"),
            )
        }
    };

    if is_json(req, "accept") {
        return json_response(StatusCode::OK, &summary(&contract, Some(script)));
    }
    build_response_with_headers(
        StatusCode::OK,
        [("Content-Type", CONTRACT_SCRIPT_TYPE)],
        script,
    )
}

/// PUT /api/v1/contracts/:id - Replace a contract; the path id wins
pub async fn handle_update(
    contract_id: &str,
    req: Request<Incoming>,
    state: Arc<AdminState>,
) -> Response<Full<Bytes>> {
    let script = match read_script(req).await {
        Ok(script) => script,
        Err(resp) => return resp,
    };
    let mut contract = match compile(&state, &script) {
        Ok(contract) => contract,
        Err(resp) => return resp,
    };
    if contract.name == contract.id {
        contract.name = contract_id.to_string();
    }
    contract.id = contract_id.to_string();

    match state.store.update_contract(contract) {
        Ok(_) => no_content(),
        Err(e) => store_error(&e),
    }
}

/// DELETE /api/v1/contracts/:id
pub fn handle_delete(contract_id: &str, state: Arc<AdminState>) -> Response<Full<Bytes>> {
    match state.store.delete_contract(contract_id) {
        Ok(_) => no_content(),
        Err(e) => store_error(&e),
    }
}
