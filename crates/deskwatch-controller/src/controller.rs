//! Shared controller context.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tokio::sync::Mutex;
use tracing::{info, warn};

use deskwatch_core::config::{ControllerConfig, NotificationConfig};
use deskwatch_core::result::AppResult;
use deskwatch_core::traits::notifier::Notifier;
use deskwatch_core::types::WorkerId;
use deskwatch_core::types::timestamp::{self, Timestamp};
use deskwatch_store::{QueueManager, Repositories, StoreManager};

use crate::client::WorkerCapability;
use crate::registry::{Worker, WorkerRegistry};
use crate::restart::RestartQueue;
use crate::synced::SyncedWorkers;

/// Everything a [`Controller`] is built from.
#[derive(Debug)]
pub struct ControllerParts {
    pub config: ControllerConfig,
    pub notification: NotificationConfig,
    /// `host:port` handed to workers on adoption.
    pub advertise_address: String,
    pub store: StoreManager,
    pub queue: QueueManager,
    pub client: Arc<dyn WorkerCapability>,
    pub notifier: Arc<dyn Notifier>,
}

/// The orchestration context shared by the HTTP handlers and every loop.
#[derive(Debug)]
pub struct Controller {
    config: ControllerConfig,
    notification: NotificationConfig,
    advertise_address: String,
    registry: Mutex<WorkerRegistry>,
    synced: Mutex<SyncedWorkers>,
    restarts: Mutex<RestartQueue>,
    repos: Repositories,
    queue: QueueManager,
    client: Arc<dyn WorkerCapability>,
    notifier: Arc<dyn Notifier>,
    /// Which source the next distribution tick pulls from.
    pub(crate) favor_queue: AtomicBool,
}

impl Controller {
    pub fn new(parts: ControllerParts) -> Arc<Self> {
        Arc::new(Self {
            config: parts.config,
            notification: parts.notification,
            advertise_address: parts.advertise_address,
            registry: Mutex::new(WorkerRegistry::new()),
            synced: Mutex::new(SyncedWorkers::new()),
            restarts: Mutex::new(RestartQueue::new()),
            repos: Repositories::new(parts.store),
            queue: parts.queue,
            client: parts.client,
            notifier: parts.notifier,
            favor_queue: AtomicBool::new(true),
        })
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn notification(&self) -> &NotificationConfig {
        &self.notification
    }

    pub fn advertise_address(&self) -> &str {
        &self.advertise_address
    }

    pub fn registry(&self) -> &Mutex<WorkerRegistry> {
        &self.registry
    }

    pub fn synced(&self) -> &Mutex<SyncedWorkers> {
        &self.synced
    }

    pub fn restarts(&self) -> &Mutex<RestartQueue> {
        &self.restarts
    }

    pub fn repos(&self) -> &Repositories {
        &self.repos
    }

    pub fn queue(&self) -> &QueueManager {
        &self.queue
    }

    pub fn client(&self) -> &dyn WorkerCapability {
        self.client.as_ref()
    }

    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    /// Register a worker with this controller.
    ///
    /// A known id keeps its jobs and gets the new address and a fresh
    /// heartbeat. A worker previously seen under a peer moves to the local
    /// registry.
    pub async fn register_worker(&self, id: WorkerId, address: &str) -> AppResult<()> {
        let now = timestamp::now();
        let record = {
            let mut registry = self.registry.lock().await;
            let is_new = registry.register(id, address, now);
            info!(worker_id = %id, address, is_new, "Registered worker");
            registry.get(id).map(Worker::record)
        };
        self.synced.lock().await.remove(id);
        if let Some(record) = record {
            self.repos.workers.save(&record).await?;
        }
        Ok(())
    }

    /// Drop a worker from the registry and the store, queueing any jobs it
    /// still held for restart.
    pub async fn drop_worker(&self, id: WorkerId) -> AppResult<Option<Worker>> {
        let removed = self.registry.lock().await.remove(id);
        if let Some(worker) = &removed {
            let mut restarts = self.restarts.lock().await;
            for job in &worker.jobs {
                restarts.push(job.clone());
            }
            info!(
                worker_id = %id,
                requeued_jobs = worker.jobs.len(),
                "Unregistered worker"
            );
        }
        self.repos.workers.delete(id).await?;
        Ok(removed)
    }

    /// Ask a worker to exit (best effort) and unregister it.
    pub async fn shutdown_worker(&self, id: WorkerId) -> AppResult<Option<Worker>> {
        let address = self
            .registry
            .lock()
            .await
            .get(id)
            .map(|w| w.address.clone());
        if let Some(address) = address {
            if let Err(e) = self.client.shutdown(&address).await {
                warn!(
                    worker_id = %id,
                    address = %address,
                    error = %e,
                    "Could not shut down worker, perhaps it is already down"
                );
            }
        }
        self.drop_worker(id).await
    }

    /// Count a failure against a worker and shut it down once its error
    /// budget is spent. Returns `true` if the worker was shut down.
    pub async fn record_worker_failure(&self, id: WorkerId) -> AppResult<bool> {
        let exhausted = {
            let mut registry = self.registry.lock().await;
            match registry.get_mut(id) {
                Some(worker) => {
                    worker.errors += 1;
                    worker.errors >= self.config.max_worker_errors
                }
                None => false,
            }
        };
        if exhausted {
            warn!(worker_id = %id, "Worker exceeded its error budget, shutting it down");
            self.shutdown_worker(id).await?;
        }
        Ok(exhausted)
    }

    /// Stamp a successful heartbeat in memory and in the store.
    pub async fn refresh_heartbeat(&self, id: WorkerId, at: Timestamp) -> AppResult<()> {
        let record = {
            let mut registry = self.registry.lock().await;
            registry.get_mut(id).map(|worker| {
                worker.last_heartbeat = at;
                worker.record()
            })
        };
        if let Some(record) = record {
            self.repos.workers.save(&record).await?;
        }
        Ok(())
    }

    /// Shut down every local worker. Used when the controller exits.
    pub async fn shutdown_all_workers(&self) {
        let ids = self.registry.lock().await.ids();
        for id in ids {
            if let Err(e) = self.shutdown_worker(id).await {
                warn!(worker_id = %id, error = %e, "Failed to unregister worker on exit");
            }
        }
    }
}
