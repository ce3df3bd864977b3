//! Wire-test result records, serialized as returned by the admin API.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::contract::CompileError;
use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WiretestError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("app {0} has no server to test against")]
    NoServer(String),
    #[error("cannot derive test contract: {0}")]
    Compile(#[from] CompileError),
}

impl WiretestError {
    pub fn status_code(&self) -> u16 {
        match self {
            WiretestError::Store(e) => e.status_code(),
            WiretestError::NoServer(_) => 400,
            WiretestError::Compile(_) => 422,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TestInfo {
    #[serde(rename = "timeMS")]
    pub time_ms: u64,
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NamedRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppTestRecord {
    pub app: NamedRef,
    pub test_info: TestInfo,
    pub results: Vec<VersionTestRecord>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VersionTestRecord {
    pub version_no: String,
    pub test_info: TestInfo,
    pub results: Vec<ContractTestRecord>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContractTestInfo {
    #[serde(rename = "timeMS")]
    pub time_ms: u64,
    pub success: bool,
    /// Failures that prevented any request from being sent.
    pub errors: Vec<String>,
    pub app_id: String,
    pub version: String,
    pub contract: NamedRef,
    pub expected_response_script: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContractTestRecord {
    pub test_info: ContractTestInfo,
    pub request_results: Vec<RequestTestRecord>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestTestInfo {
    #[serde(rename = "timeMS")]
    pub time_ms: u64,
    pub success: bool,
    pub errors: Vec<String>,
    pub request_method: String,
}

/// The concrete request that was sent.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SentRequest {
    pub method: String,
    pub url_path: String,
    pub query_params: Map<String, Value>,
    pub headers: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

/// The raw response received; absent when the transport failed.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReceivedResponse {
    pub status: u16,
    pub headers: Map<String, Value>,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestTestRecord {
    pub test_info: RequestTestInfo,
    pub request: SentRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<ReceivedResponse>,
}

impl AppTestRecord {
    pub fn success(&self) -> bool {
        self.test_info.success
    }
}

impl VersionTestRecord {
    pub fn success(&self) -> bool {
        self.test_info.success
    }
}

impl ContractTestRecord {
    pub fn success(&self) -> bool {
        self.test_info.success
    }

    /// All mismatch and transport messages of this contract, in request order.
    pub fn errors(&self) -> Vec<&str> {
        self.test_info
            .errors
            .iter()
            .chain(self.request_results.iter().flat_map(|r| r.test_info.errors.iter()))
            .map(String::as_str)
            .collect()
    }
}
