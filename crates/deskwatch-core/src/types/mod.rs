//! Shared value types.

pub mod id;
pub mod timestamp;

pub use id::{JobId, WorkerId};
pub use timestamp::Timestamp;
