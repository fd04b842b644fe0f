//! Controller runner: drives the control loops until shutdown.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;

use deskwatch_core::result::AppResult;

use crate::controller::Controller;

/// Spawns one task per control loop.
#[derive(Debug, Clone)]
pub struct ControllerRunner {
    controller: Arc<Controller>,
}

impl ControllerRunner {
    pub fn new(controller: Arc<Controller>) -> Self {
        Self { controller }
    }

    /// Start every loop. Each runs until `cancel` flips to `true`.
    pub fn spawn(&self, cancel: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        let config = self.controller.config().clone();
        tracing::info!(
            controller = %self.controller.advertise_address(),
            heartbeat_every = ?config.heartbeat_check_interval(),
            sync_every = ?config.sync_interval(),
            distribute_every = ?config.distribution_interval(),
            check_jobs_every = ?config.job_check_interval(),
            "Starting controller loops"
        );

        let mut handles = Vec::with_capacity(5);

        let c = Arc::clone(&self.controller);
        handles.push(tokio::spawn(run_loop(
            "heartbeat",
            config.heartbeat_check_interval(),
            cancel.clone(),
            move || {
                let c = Arc::clone(&c);
                async move { c.heartbeat_tick().await }
            },
        )));

        let c = Arc::clone(&self.controller);
        handles.push(tokio::spawn(run_loop(
            "worker-sync",
            config.sync_interval(),
            cancel.clone(),
            move || {
                let c = Arc::clone(&c);
                async move { c.sync_tick().await }
            },
        )));

        let c = Arc::clone(&self.controller);
        handles.push(tokio::spawn(run_loop(
            "distribution",
            config.distribution_interval(),
            cancel.clone(),
            move || {
                let c = Arc::clone(&c);
                async move { c.distribution_tick().await }
            },
        )));

        let c = Arc::clone(&self.controller);
        handles.push(tokio::spawn(run_loop(
            "job-health",
            config.job_check_interval(),
            cancel.clone(),
            move || {
                let c = Arc::clone(&c);
                async move { c.health_tick().await }
            },
        )));

        if config.result_retention().is_some() && config.result_sweep_interval_seconds > 0 {
            let c = Arc::clone(&self.controller);
            handles.push(tokio::spawn(run_loop(
                "result-retention",
                config.result_sweep_interval(),
                cancel,
                move || {
                    let c = Arc::clone(&c);
                    async move { c.retention_tick().await }
                },
            )));
        }

        handles
    }

    /// Wait for the loops to finish, then release owned workers if
    /// configured to.
    pub async fn shutdown(&self, handles: Vec<JoinHandle<()>>) {
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Controller loop panicked");
            }
        }
        if self.controller.config().shutdown_workers_on_exit {
            tracing::info!("Shutting down owned workers");
            self.controller.shutdown_all_workers().await;
        }
        tracing::info!("Controller stopped");
    }
}

/// Run `tick` every `interval` until `cancel` flips or its sender is gone.
async fn run_loop<F, Fut, T>(
    name: &'static str,
    interval: Duration,
    mut cancel: watch::Receiver<bool>,
    mut tick: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
    T: std::fmt::Debug,
{
    tracing::debug!(task = name, "Loop started");
    while !*cancel.borrow() {
        match tick().await {
            Ok(report) => tracing::trace!(task = name, ?report, "Tick done"),
            Err(e) => tracing::error!(task = name, error = %e, "Tick failed"),
        }

        tokio::select! {
            changed = cancel.changed() => {
                if changed.is_err() || *cancel.borrow() {
                    break;
                }
            }
            _ = time::sleep(interval) => {}
        }
    }
    tracing::info!(task = name, "Loop stopped");
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_run_loop_stops_on_cancel() {
        let (tx, rx) = watch::channel(false);
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);

        let handle = tokio::spawn(run_loop("test", Duration::from_secs(1), rx, move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                AppResult::Ok(())
            }
        }));

        time::sleep(Duration::from_millis(3500)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(ticks.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_loop_survives_failed_ticks() {
        let (tx, rx) = watch::channel(false);
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);

        let handle = tokio::spawn(run_loop("failing", Duration::from_secs(1), rx, move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(deskwatch_core::AppError::store("unavailable"))
            }
        }));

        time::sleep(Duration::from_millis(2500)).await;
        drop(tx);
        handle.await.unwrap();

        assert_eq!(ticks.load(Ordering::SeqCst), 3);
    }
}
