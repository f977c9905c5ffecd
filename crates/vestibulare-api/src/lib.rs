//! # vestibulare-api
//!
//! Operator HTTP surface for VestibulaRe built on Axum.
//!
//! Exposes the alert sweep and the manual broadcast behind an operator
//! bearer token, plus an unauthenticated health check. Domain errors are
//! mapped to JSON responses in [`error`].

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
