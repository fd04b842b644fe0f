#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use deskwatch_controller::controller::ControllerParts;
use deskwatch_controller::{Controller, WorkerCallError, WorkerCapability};
use deskwatch_core::AppResult;
use deskwatch_core::config::{ControllerConfig, NotificationConfig};
use deskwatch_core::error::AppError;
use deskwatch_core::traits::notifier::{Notification, Notifier};
use deskwatch_core::traits::table::{TableEntity, TableStore};
use deskwatch_core::types::timestamp::{self, Timestamp};
use deskwatch_core::types::{JobId, WorkerId};
use deskwatch_entity::job::{JobArgs, JobRecord, JobType, StartJobPayload};
use deskwatch_store::memory::MemoryTableStore;
use deskwatch_store::{Backends, StoreManager};

pub const CONTROLLER: &str = "10.0.0.1:5002";

/// Scripted workers. Every address answers `OK` unless marked down or
/// rejecting.
#[derive(Debug, Default)]
pub struct FakeWorkers {
    state: Mutex<FakeState>,
}

#[derive(Debug, Default)]
struct FakeState {
    down: HashSet<String>,
    rejecting: HashSet<String>,
    refusing_adoption: HashSet<String>,
    started: Vec<(String, StartJobPayload)>,
    heartbeats: Vec<String>,
    adopted: Vec<(String, String)>,
    shutdowns: Vec<String>,
}

impl FakeWorkers {
    pub fn set_down(&self, address: &str) {
        self.state.lock().unwrap().down.insert(address.to_string());
    }

    pub fn reject_jobs(&self, address: &str) {
        self.state.lock().unwrap().rejecting.insert(address.to_string());
    }

    /// Answer heartbeats but refuse `adopt`.
    pub fn reject_adopt(&self, address: &str) {
        self.state
            .lock()
            .unwrap()
            .refusing_adoption
            .insert(address.to_string());
    }

    pub fn started(&self) -> Vec<(String, StartJobPayload)> {
        self.state.lock().unwrap().started.clone()
    }

    pub fn heartbeats(&self) -> Vec<String> {
        self.state.lock().unwrap().heartbeats.clone()
    }

    pub fn adopted(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().adopted.clone()
    }

    pub fn shutdowns(&self) -> Vec<String> {
        self.state.lock().unwrap().shutdowns.clone()
    }

    fn answer(&self, address: &str) -> Result<(), WorkerCallError> {
        if self.state.lock().unwrap().down.contains(address) {
            Err(WorkerCallError::Rejected {
                address: address.to_string(),
                status: 503,
                body: "unreachable".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl WorkerCapability for FakeWorkers {
    async fn start_job(
        &self,
        address: &str,
        payload: &StartJobPayload,
    ) -> Result<(), WorkerCallError> {
        self.answer(address)?;
        let mut state = self.state.lock().unwrap();
        if state.rejecting.contains(address) {
            return Err(WorkerCallError::Rejected {
                address: address.to_string(),
                status: 200,
                body: "BUSY".to_string(),
            });
        }
        state.started.push((address.to_string(), payload.clone()));
        Ok(())
    }

    async fn heartbeat(&self, address: &str) -> Result<(), WorkerCallError> {
        self.state.lock().unwrap().heartbeats.push(address.to_string());
        self.answer(address)
    }

    async fn adopt(&self, address: &str, controller: &str) -> Result<(), WorkerCallError> {
        self.answer(address)?;
        let mut state = self.state.lock().unwrap();
        if state.refusing_adoption.contains(address) {
            return Err(WorkerCallError::Rejected {
                address: address.to_string(),
                status: 409,
                body: "owned".to_string(),
            });
        }
        state
            .adopted
            .push((address.to_string(), controller.to_string()));
        Ok(())
    }

    async fn shutdown(&self, address: &str) -> Result<(), WorkerCallError> {
        self.state.lock().unwrap().shutdowns.push(address.to_string());
        self.answer(address)
    }
}

/// In-memory table store whose writes to chosen partitions can be made
/// to fail.
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: MemoryTableStore,
    failing_inserts: Mutex<HashSet<String>>,
    failing_deletes: Mutex<HashSet<String>>,
}

impl FlakyStore {
    pub fn fail_inserts(&self, partition: &str, fail: bool) {
        toggle(&self.failing_inserts, partition, fail);
    }

    pub fn fail_deletes(&self, partition: &str, fail: bool) {
        toggle(&self.failing_deletes, partition, fail);
    }
}

fn toggle(set: &Mutex<HashSet<String>>, partition: &str, on: bool) {
    let mut set = set.lock().unwrap();
    if on {
        set.insert(partition.to_string());
    } else {
        set.remove(partition);
    }
}

#[async_trait]
impl TableStore for FlakyStore {
    fn provider_type(&self) -> &str {
        "flaky"
    }

    async fn insert(&self, entity: &TableEntity) -> AppResult<()> {
        if self.failing_inserts.lock().unwrap().contains(&entity.partition_key) {
            return Err(AppError::store("insert failed"));
        }
        self.inner.insert(entity).await
    }

    async fn upsert(&self, entity: &TableEntity) -> AppResult<()> {
        self.inner.upsert(entity).await
    }

    async fn get(&self, partition_key: &str, row_key: &str) -> AppResult<Option<TableEntity>> {
        self.inner.get(partition_key, row_key).await
    }

    async fn delete(&self, partition_key: &str, row_key: &str) -> AppResult<bool> {
        if self.failing_deletes.lock().unwrap().contains(partition_key) {
            return Err(AppError::store("delete failed"));
        }
        self.inner.delete(partition_key, row_key).await
    }

    async fn query(&self, partition_key: &str) -> AppResult<Vec<TableEntity>> {
        self.inner.query(partition_key).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

/// Records every notification; optionally fails them all.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Notification>>,
    pub fail: Mutex<bool>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn provider_type(&self) -> &str {
        "recording"
    }

    async fn send(&self, notification: &Notification) -> AppResult<()> {
        if *self.fail.lock().unwrap() {
            return Err(AppError::external("relay down"));
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

pub struct Harness {
    pub controller: Arc<Controller>,
    pub workers: Arc<FakeWorkers>,
    pub notifier: Arc<RecordingNotifier>,
    pub backends: Backends,
}

pub fn harness() -> Harness {
    harness_with(ControllerConfig::default())
}

pub fn harness_with(config: ControllerConfig) -> Harness {
    build(config, Backends::in_memory(Duration::from_secs(30)))
}

/// A harness whose table store can be told to fail.
pub fn flaky_harness() -> (Harness, Arc<FlakyStore>) {
    let store = Arc::new(FlakyStore::default());
    let mut backends = Backends::in_memory(Duration::from_secs(30));
    backends.store = StoreManager::from_provider(store.clone());
    (build(ControllerConfig::default(), backends), store)
}

fn build(config: ControllerConfig, backends: Backends) -> Harness {
    let workers = Arc::new(FakeWorkers::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let controller = Controller::new(ControllerParts {
        config,
        notification: NotificationConfig::default(),
        advertise_address: CONTROLLER.to_string(),
        store: backends.store.clone(),
        queue: backends.queue.clone(),
        client: workers.clone(),
        notifier: notifier.clone(),
    });
    Harness {
        controller,
        workers,
        notifier,
        backends,
    }
}

pub fn ago(seconds: i64) -> Timestamp {
    timestamp::now() - chrono::Duration::seconds(seconds)
}

impl Harness {
    /// Register a worker and return its id.
    pub async fn add_worker(&self, address: &str) -> WorkerId {
        let id = WorkerId::new();
        self.controller.register_worker(id, address).await.unwrap();
        id
    }

    /// Move a worker's last assignment out of the cooldown window.
    pub async fn cool(&self, id: WorkerId) {
        if let Some(worker) = self.controller.registry().lock().await.get_mut(id) {
            worker.last_job_started_at = worker.last_job_started_at.map(|_| ago(3600));
        }
    }

    pub async fn cool_all(&self) {
        let ids = self.controller.registry().lock().await.ids();
        for id in ids {
            self.cool(id).await;
        }
    }

    pub async fn job_count(&self, id: WorkerId) -> usize {
        self.controller
            .registry()
            .lock()
            .await
            .get(id)
            .map(|w| w.job_count())
            .unwrap_or(0)
    }

    /// Start a job directly and return it.
    pub async fn start(&self, worker: WorkerId, job_type: JobType, args: JobArgs) -> JobRecord {
        let job = self
            .controller
            .start_job(worker, job_type, args, None)
            .await
            .unwrap();
        self.cool(worker).await;
        job
    }

    /// Backdate a live job's start stamp in memory and in the store.
    pub async fn age_job(&self, job_id: JobId, seconds: i64) {
        let started = ago(seconds);
        let mut registry = self.controller.registry().lock().await;
        for worker in registry.iter_mut() {
            for job in worker.jobs.iter_mut().filter(|j| j.job_id == job_id) {
                job.started = started;
            }
        }
        drop(registry);
        if let Some(mut row) = self.controller.repos().jobs.find(job_id).await.unwrap() {
            row.started = started;
            self.controller.repos().jobs.save(&row).await.unwrap();
        }
    }
}

pub fn search(run_id: &str) -> JobArgs {
    JobArgs::Search {
        run_id: Some(run_id.to_string()),
        desired_months: vec!["juni".to_string()],
        desks: vec!["ind amsterdam".to_string()],
    }
}
