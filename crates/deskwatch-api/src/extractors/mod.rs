//! Custom Axum extractors.

pub mod remote_addr;

pub use remote_addr::RemoteAddr;
