//! Constraint DSL value model for Accord contracts.
//!
//! This module provides:
//! - `ValueNode`: the closed tree of constants, composites, matchers, JSONPath
//!   extractions and dual (stub/test) values produced by contract scripts
//! - `Matcher`: the built-in matcher catalogue (regex, integer, float, date, ...)
//! - `EvaluationContext`: the runtime document and execution mode used to
//!   resolve context-dependent nodes
//!
//! Every node kind declares which of the three capabilities it supports:
//! Evaluate (resolve against a context), Compare (validate a concrete value)
//! and Mock (generate a concrete value).
//!
//! ## Module Structure
//!
//! - `node`: `ValueNode`, capability traits and the recursive dispatch
//! - `matchers`: matcher kinds and their Compare/Mock semantics
//! - `dual`: stub/test dual values
//! - `jsonpath`: JSONPath extraction nodes
//! - `context`: evaluation context and execution mode
//! - `printer`: DSL source printing for round-tripping
//! - `error`: capability errors

mod context;
mod dual;
mod error;
mod jsonpath;
pub mod matchers;
mod node;
mod printer;

pub use context::{EvaluationContext, Mode};
pub use dual::{DualKind, DualValue};
pub use error::NodeError;
pub use jsonpath::JsonPathNode;
pub use matchers::{json_equals, Matcher};
pub use node::{Capabilities, Capability, Comparable, Evaluable, Mockable, ValueNode};
pub use printer::to_script_pretty;
