//! Wirestubs: one HTTP listener per app serving contract-synthesized responses.

mod handler;
mod manager;
mod shutdown;
mod types;

pub use handler::{route, RouteOutcome};
pub use manager::WirestubManager;
pub use types::{CreateOutcome, WirestubError};
