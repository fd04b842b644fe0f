//! Redis backends.

pub mod client;
pub mod queue;
pub mod table;

pub use client::RedisClient;
pub use queue::RedisQueue;
pub use table::RedisTableStore;
