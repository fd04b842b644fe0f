//! # deskwatch-controller
//!
//! The orchestration engine: the registry of workers owned by this
//! controller, the synced view of workers owned by peers, job dispatch and
//! completion, and the four control loops (heartbeat, worker sync, job
//! distribution, job health) plus the result retention sweep.
//!
//! Every loop shares one [`Controller`] context. Mutable state sits behind
//! `tokio::sync::Mutex` and no lock is held across a worker call or a
//! store round-trip.

pub mod client;
pub mod completion;
pub mod controller;
pub mod dispatch;
pub mod intake;
pub mod loops;
pub mod notification;
pub mod registry;
pub mod restart;
pub mod runner;
pub mod status;
pub mod synced;

pub use client::{HttpWorkerClient, WorkerCallError, WorkerCapability};
pub use completion::Completion;
pub use controller::{Controller, ControllerParts};
pub use intake::{DesksLookup, IntakeService};
pub use notification::{LogNotifier, WebhookNotifier, build_notifier};
pub use runner::ControllerRunner;
pub use status::ControllerStatus;
