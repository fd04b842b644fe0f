//! # deskwatch-api
//!
//! HTTP surface of a controller built on Axum: the worker callbacks
//! (`/register`, `/return_result`) plus `/health` and `/status`.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
