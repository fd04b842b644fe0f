//! # deskwatch-core
//!
//! Core crate for Deskwatch. Contains the configuration schemas, typed
//! identifiers, the persisted timestamp codec, the store/queue/notifier
//! traits implemented by other crates, and the unified error system.
//!
//! This crate has **no** internal dependencies on other Deskwatch crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
