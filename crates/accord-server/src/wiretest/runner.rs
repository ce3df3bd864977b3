//! Replays contracts against real servers and checks the answers.
//!
//! Requests are materialized from the test side of each contract
//! (evaluate in test mode, then mock). Expected responses are evaluated
//! against the request that was actually sent and compared with what the
//! server returned. Mismatches are recorded, never raised.

use super::client::{WireClient, WireRequest, WireResponse};
use super::types::{
    AppTestRecord, ContractTestInfo, ContractTestRecord, NamedRef, ReceivedResponse,
    RequestTestInfo, RequestTestRecord, SentRequest, TestInfo, VersionTestRecord, WiretestError,
};
use crate::config::WiretestConfig;
use crate::contract::{Contract, ContractCompiler};
use crate::dsl::{EvaluationContext, Mode, NodeError, ValueNode};
use crate::metrics;
use crate::store::{App, ResourceStore, Version};
use futures::future::join_all;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

pub struct WiretestRunner {
    store: Arc<dyn ResourceStore>,
    client: Arc<dyn WireClient>,
    compiler: ContractCompiler,
    parallel_contracts: bool,
}

/// Concrete request parts, mocked afresh for each method.
struct RequestTemplate {
    url: String,
    query: Map<String, Value>,
    headers: Vec<(String, String)>,
    body: Option<Value>,
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Flatten a query map into wire pairs; arrays repeat the key.
fn query_pairs(query: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (name, value) in query {
        match value {
            Value::Array(items) => pairs.extend(items.iter().map(|item| (name.clone(), text(item)))),
            Value::Null => {}
            other => pairs.push((name.clone(), text(other))),
        }
    }
    pairs
}

fn header_value<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

fn form_encode(body: &Value) -> String {
    let Value::Object(fields) = body else {
        return text(body);
    };
    query_pairs(fields)
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Encode a request body according to the declared content type.
///
/// Form content types get form encoding. Strings are sent verbatim; any other
/// value is JSON, with `Content-Type: application/json` added when no content
/// type was declared.
pub(crate) fn encode_body(headers: &mut Vec<(String, String)>, body: &Value) -> Option<String> {
    if body.is_null() {
        return None;
    }
    let content_type = header_value(headers, "content-type").map(str::to_ascii_lowercase);
    match (content_type.as_deref(), body) {
        (Some(ct), _) if ct.starts_with("application/x-www-form-urlencoded") => {
            Some(form_encode(body))
        }
        (_, Value::String(s)) => Some(s.clone()),
        (None, other) => {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
            Some(other.to_string())
        }
        (Some(_), other) => Some(other.to_string()),
    }
}

fn headers_to_map(headers: &[(String, String)]) -> Map<String, Value> {
    headers
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect()
}

fn check(errors: &mut Vec<String>, what: &str, expected: &ValueNode, actual: &Value) -> bool {
    match expected.compare(actual) {
        Ok(true) => true,
        Ok(false) => {
            errors.push(format!("Expected {what} to match {expected}, got {actual}"));
            false
        }
        Err(e) => {
            errors.push(format!("Cannot check {what}: {e}"));
            false
        }
    }
}

impl WiretestRunner {
    pub fn new(
        store: Arc<dyn ResourceStore>,
        client: Arc<dyn WireClient>,
        compiler: ContractCompiler,
        config: &WiretestConfig,
    ) -> Self {
        Self {
            store,
            client,
            compiler,
            parallel_contracts: config.parallel_contracts,
        }
    }

    fn server_for(app: &App, server: Option<&str>) -> Result<String, WiretestError> {
        server
            .map(str::to_string)
            .or_else(|| app.servers.first().cloned())
            .map(|s| s.trim_end_matches('/').to_string())
            .ok_or_else(|| WiretestError::NoServer(app.id.clone()))
    }

    /// Test every version of `app_id`.
    pub async fn run_app(
        &self,
        app_id: &str,
        server: Option<&str>,
    ) -> Result<AppTestRecord, WiretestError> {
        let start = Instant::now();
        let app = self.store.get_app(app_id)?;
        let server = Self::server_for(&app, server)?;
        info!("Wire-testing app {} against {}", app.id, server);

        let mut results = Vec::with_capacity(app.versions.len());
        for version in &app.versions {
            results.push(self.test_version(&app, version, &server).await);
        }
        let success = results.iter().all(VersionTestRecord::success);
        Ok(AppTestRecord {
            app: NamedRef {
                id: app.id.clone(),
                name: app.name.clone(),
            },
            test_info: TestInfo {
                time_ms: elapsed_ms(start),
                success,
            },
            results,
        })
    }

    pub async fn run_version(
        &self,
        app_id: &str,
        v: &str,
        server: Option<&str>,
    ) -> Result<VersionTestRecord, WiretestError> {
        let app = self.store.get_app(app_id)?;
        let version = self.store.get_version(app_id, v)?;
        let server = Self::server_for(&app, server)?;
        Ok(self.test_version(&app, &version, &server).await)
    }

    pub async fn run_contract(
        &self,
        app_id: &str,
        v: &str,
        contract_id: &str,
        server: Option<&str>,
    ) -> Result<ContractTestRecord, WiretestError> {
        let app = self.store.get_app(app_id)?;
        let version = self.store.get_version(app_id, v)?;
        let contract = self.store.get_contract(contract_id)?;
        let server = Self::server_for(&app, server)?;
        Ok(self.test_contract(&app, &version, &contract, &server).await)
    }

    async fn test_version(&self, app: &App, version: &Version, server: &str) -> VersionTestRecord {
        let start = Instant::now();
        let contracts: Vec<Arc<Contract>> = version
            .contracts
            .iter()
            .filter_map(|id| match self.store.get_contract(id) {
                Ok(contract) => Some(contract),
                Err(_) => {
                    debug!("Skipping unknown contract {} in version {}", id, version.v);
                    None
                }
            })
            .collect();

        let results = if self.parallel_contracts {
            join_all(
                contracts
                    .iter()
                    .map(|contract| self.test_contract(app, version, contract, server)),
            )
            .await
        } else {
            let mut results = Vec::with_capacity(contracts.len());
            for contract in &contracts {
                results.push(self.test_contract(app, version, contract, server).await);
            }
            results
        };

        let success = results.iter().all(ContractTestRecord::success);
        VersionTestRecord {
            version_no: version.v.clone(),
            test_info: TestInfo {
                time_ms: elapsed_ms(start),
                success,
            },
            results,
        }
    }

    async fn test_contract(
        &self,
        app: &App,
        version: &Version,
        contract: &Contract,
        server: &str,
    ) -> ContractTestRecord {
        let start = Instant::now();
        let mut info = ContractTestInfo {
            time_ms: 0,
            success: false,
            errors: Vec::new(),
            app_id: app.id.clone(),
            version: version.v.clone(),
            contract: NamedRef {
                id: contract.id.clone(),
                name: contract.name.clone(),
            },
            expected_response_script: String::new(),
        };

        let test_contract = match contract.to_test_contract(&self.compiler) {
            Ok(derived) => derived,
            Err(e) => {
                info.errors.push(format!("Cannot derive test contract: {e}"));
                info.time_ms = elapsed_ms(start);
                return ContractTestRecord {
                    test_info: info,
                    request_results: Vec::new(),
                };
            }
        };
        info.expected_response_script = test_contract.response.to_script();

        let base_url = format!("{}{}", server, version.base_path(&app.base_path));
        let mut request_results = Vec::new();
        for method in test_contract.request.method.methods() {
            let template = match build_template(&test_contract, &base_url) {
                Ok(template) => template,
                Err(e) => {
                    info.errors.push(format!("Cannot build {method} request: {e}"));
                    break;
                }
            };
            request_results.push(self.test_request(&test_contract, &template, method).await);
        }

        info.success = info.errors.is_empty() && request_results.iter().all(|r| r.test_info.success);
        info.time_ms = elapsed_ms(start);
        ContractTestRecord {
            test_info: info,
            request_results,
        }
    }

    async fn test_request(
        &self,
        contract: &Contract,
        template: &RequestTemplate,
        method: &str,
    ) -> RequestTestRecord {
        let start = Instant::now();
        let mut headers = template.headers.clone();
        let raw_body = template
            .body
            .as_ref()
            .and_then(|body| encode_body(&mut headers, body));

        let sent = SentRequest {
            method: method.to_string(),
            url_path: template.url.clone(),
            query_params: template.query.clone(),
            headers: headers_to_map(&headers),
            body: template.body.clone(),
        };

        let request = WireRequest {
            method: method.to_string(),
            url: template.url.clone(),
            query: query_pairs(&template.query),
            headers,
            body: raw_body.clone(),
        };

        let ctx = EvaluationContext::new(
            json!({
                "req": {
                    "method": method,
                    "path": template.url,
                    "query": template.query,
                    "body": template.body.clone().unwrap_or(Value::Null),
                    "rawBody": raw_body.clone().unwrap_or_default(),
                    "jsonBody": raw_body
                        .as_deref()
                        .and_then(|raw| serde_json::from_str::<Value>(raw).ok())
                        .unwrap_or(Value::Null),
                    "headers": sent.headers,
                }
            }),
            Mode::Test,
        );

        let mut errors = Vec::new();
        let response = match self.client.send(request).await {
            Ok(response) => {
                verify_response(contract, &ctx, &response, &mut errors);
                Some(ReceivedResponse {
                    status: response.status,
                    headers: headers_to_map(&response.headers),
                    body: response.body,
                })
            }
            Err(e) => {
                errors.push(e.to_string());
                None
            }
        };

        let success = errors.is_empty();
        let time_ms = elapsed_ms(start);
        let outcome = if success { "passed" } else { "failed" };
        metrics::record_wiretest_request(outcome, start.elapsed().as_secs_f64() * 1000.0);
        if !success {
            debug!(
                "Contract {} {} {} failed: {:?}",
                contract.id, method, template.url, errors
            );
        }

        RequestTestRecord {
            test_info: RequestTestInfo {
                time_ms,
                success,
                errors,
                request_method: method.to_string(),
            },
            request: sent,
            response,
        }
    }
}

/// Materialize the test side of the request spec.
fn build_template(contract: &Contract, base_url: &str) -> Result<RequestTemplate, NodeError> {
    let ctx = EvaluationContext::empty(Mode::Test);
    let spec = &contract.request;

    let url = format!("{}{}", base_url, text(&spec.url_path.resolve(&ctx)?));

    let mut query = Map::new();
    for param in &spec.query_parameters {
        let name = text(&param.name.resolve(&ctx)?);
        query.insert(name, param.value.resolve(&ctx)?);
    }

    let mut headers = Vec::with_capacity(spec.headers.len());
    for (name, node) in &spec.headers {
        let value = node.resolve(&ctx)?;
        if !value.is_null() {
            headers.push((name.clone(), text(&value)));
        }
    }

    let body = spec.body.as_ref().map(|node| node.resolve(&ctx)).transpose()?;

    Ok(RequestTemplate {
        url,
        query,
        headers,
        body,
    })
}

/// Compare status, declared headers and body; push a message per mismatch.
fn verify_response(
    contract: &Contract,
    ctx: &EvaluationContext,
    response: &WireResponse,
    errors: &mut Vec<String>,
) {
    let spec = &contract.response;

    let status = spec.status.evaluate(ctx);
    check(errors, "status", &status, &Value::from(response.status));

    for (name, node) in &spec.headers {
        let expected = node.evaluate(ctx);
        let actual = response
            .header(name)
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null);
        check(errors, &format!("header `{name}`"), &expected, &actual);
    }

    if let Some(body) = &spec.body {
        let expected = body.evaluate(ctx);
        let raw = Value::String(response.body.clone());
        let raw_ok = expected.compare(&raw).unwrap_or(false);
        let json_ok = serde_json::from_str::<Value>(&response.body)
            .ok()
            .map(|parsed| expected.compare(&parsed).unwrap_or(false))
            .unwrap_or(false);
        if !raw_ok && !json_ok {
            let mut body_errors = Vec::new();
            let actual = serde_json::from_str::<Value>(&response.body).unwrap_or(raw);
            check(&mut body_errors, "body", &expected, &actual);
            if body_errors.is_empty() {
                body_errors.push(format!("Expected body to match {expected}"));
            }
            errors.extend(body_errors);
        }
    }
}
