//! Typed repositories over the table store.

pub mod continuous;
pub mod desks;
pub mod job;
pub mod result;
pub mod worker;

mod table;

pub use continuous::ContinuousRunRepository;
pub use desks::DesksRepository;
pub use job::JobRepository;
pub use result::ResultRepository;
pub use worker::WorkerRepository;

use crate::provider::StoreManager;

/// All repositories over one store.
#[derive(Debug, Clone)]
pub struct Repositories {
    pub workers: WorkerRepository,
    pub jobs: JobRepository,
    pub continuous: ContinuousRunRepository,
    pub desks: DesksRepository,
    pub results: ResultRepository,
}

impl Repositories {
    /// Build every repository on `store`.
    pub fn new(store: StoreManager) -> Self {
        Self {
            workers: WorkerRepository::new(store.clone()),
            jobs: JobRepository::new(store.clone()),
            continuous: ContinuousRunRepository::new(store.clone()),
            desks: DesksRepository::new(store.clone()),
            results: ResultRepository::new(store),
        }
    }
}
