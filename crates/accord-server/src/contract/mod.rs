//! Contracts: compiled request/response pairs.
//!
//! A contract is produced from a script by [`ContractCompiler`], matched against
//! live requests with [`Contract::is_handle`] and answered with
//! [`Contract::handle`].

mod compiler;
mod matching;
mod response;
mod types;

pub use compiler::{CompileError, ContractCompiler};
pub use matching::{parse_form, strip_base_path, IncomingRequest};
pub use response::{SynthesisError, SynthesizedResponse};
pub use types::{Contract, MethodSpec, QueryParameter, RequestSpec, ResponseSpec};
