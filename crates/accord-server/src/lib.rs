//! Accord: contract-based HTTP API mocking and contract testing.
//!
//! Contracts are written in a small JavaScript-like DSL whose values carry
//! both a stub side (what a mock server answers) and a test side (what a real
//! server must satisfy). The same contract drives wirestubs, which serve
//! synthesized responses, and wire tests, which replay requests against a
//! real deployment.

pub mod admin_api;
pub mod config;
pub mod contract;
pub mod dsl;
pub mod metrics;
pub mod sandbox;
pub mod store;
pub mod wirestub;
pub mod wiretest;

pub use config::Config;
pub use contract::{Contract, ContractCompiler};
pub use store::{InMemoryStore, ResourceStore};
