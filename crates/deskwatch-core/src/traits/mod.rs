//! Core traits defined in `deskwatch-core` and implemented by other crates.

pub mod notifier;
pub mod queue;
pub mod table;

pub use notifier::{Notification, Notifier};
pub use queue::{MessageQueue, QueueMessage};
pub use table::{TableEntity, TableStore};
