//! Route handlers.

pub mod health;
pub mod status;
pub mod worker;
