//! Registered job repository.

use deskwatch_core::result::AppResult;
use deskwatch_core::types::JobId;
use deskwatch_entity::job::JobRecord;
use deskwatch_entity::partition::REGISTERED_JOBS;

use super::table::PartitionTable;
use crate::provider::StoreManager;

/// Rows of the `RegisteredJobs` partition.
#[derive(Debug, Clone)]
pub struct JobRepository {
    table: PartitionTable<JobRecord>,
}

impl JobRepository {
    pub fn new(store: StoreManager) -> Self {
        Self {
            table: PartitionTable::new(store, REGISTERED_JOBS),
        }
    }

    /// Create a job row. Fails with `Conflict` on a reused job id.
    pub async fn create(&self, job: &JobRecord) -> AppResult<()> {
        self.table.insert(&job.job_id.to_string(), job).await
    }

    /// Overwrite a job row.
    pub async fn save(&self, job: &JobRecord) -> AppResult<()> {
        self.table.upsert(&job.job_id.to_string(), job).await
    }

    pub async fn find(&self, id: JobId) -> AppResult<Option<JobRecord>> {
        self.table.get(&id.to_string()).await
    }

    pub async fn delete(&self, id: JobId) -> AppResult<bool> {
        self.table.delete(&id.to_string()).await
    }

    pub async fn list(&self) -> AppResult<Vec<JobRecord>> {
        self.table.list().await
    }
}
