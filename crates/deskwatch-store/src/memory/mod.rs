//! In-memory backends.

pub mod queue;
pub mod table;

pub use queue::MemoryQueue;
pub use table::MemoryTableStore;
