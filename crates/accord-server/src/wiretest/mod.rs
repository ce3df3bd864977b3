//! Wire tests: replay contracts against a real server and record the results.

mod client;
mod runner;
mod types;

pub use client::{HttpWireClient, TransportError, WireClient, WireRequest, WireResponse};
pub use runner::WiretestRunner;
pub use types::{
    AppTestRecord, ContractTestInfo, ContractTestRecord, NamedRef, ReceivedResponse,
    RequestTestInfo, RequestTestRecord, SentRequest, TestInfo, VersionTestRecord, WiretestError,
};
