//! Admin REST API for Accord apps, versions, contracts, wirestubs and wire tests.
//!
//! Routes live under `/api/v1`; `GET /api`, `/health` and `/metrics` sit at
//! the root. Errors are returned as `{"errors":[{"code","message"}]}`.

mod handlers;
mod router;
mod server;
pub(crate) mod types;

pub use server::{serve, AdminApiServer, AdminState};
