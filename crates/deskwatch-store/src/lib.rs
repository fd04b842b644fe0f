//! # deskwatch-store
//!
//! Table store and message queue backends for Deskwatch, plus the typed
//! repositories the controller works with.
//!
//! Backends:
//! - **memory**: `dashmap` partitions and a mutex-guarded queue, for a
//!   single controller and for tests.
//! - **postgres**: one `table_entities` table with JSONB properties and a
//!   `queue_messages` table read with `FOR UPDATE SKIP LOCKED`.
//! - **redis**: one hash per partition and a list/sorted-set queue.

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod provider;
#[cfg(feature = "redis-backend")]
pub mod redis;
pub mod repositories;
mod url;

pub use provider::{Backends, QueueManager, StoreManager};
pub use repositories::Repositories;
