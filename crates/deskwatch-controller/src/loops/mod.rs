//! Control loop ticks.
//!
//! Each loop is one `*_tick` method on [`Controller`](crate::Controller)
//! returning a small report. [`ControllerRunner`](crate::ControllerRunner)
//! drives them on fixed intervals; tests call them directly.

pub mod distribution;
pub mod health;
pub mod heartbeat;
pub mod retention;
pub mod sync;

pub use distribution::Distribution;
pub use health::HealthReport;
pub use heartbeat::HeartbeatReport;
pub use sync::{OrphanOutcome, SyncReport};
