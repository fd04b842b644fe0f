//! # deskwatch-entity
//!
//! Domain rows and value objects for Deskwatch. Every record struct in
//! this crate is stored as the properties of one table-store row; the
//! partition it lives in is named in [`partition`].

pub mod continuous;
pub mod desks;
pub mod job;
pub mod months;
pub mod partition;
pub mod request;
pub mod result;
pub mod worker;

pub use continuous::ContinuousRunRequest;
pub use desks::DesksCache;
pub use job::{JobArgs, JobRecord, JobType, StartJobPayload};
pub use request::{QueueRequest, RunRequest};
pub use result::ResultRecord;
pub use worker::WorkerRecord;
