//! One thin wrapper per backend endpoint.
//!
//! Every function goes through [`Gateway`](crate::gateway::Gateway) and
//! resolves to the unwrapped payload. Paths are written in canonical
//! `/api/...` form.

pub mod auth;
pub mod form;
pub mod identity;
pub mod leave;
pub mod process;
pub mod task;
pub mod types;

pub use types::*;
