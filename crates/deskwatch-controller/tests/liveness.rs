mod common;

use deskwatch_controller::loops::OrphanOutcome;
use deskwatch_core::types::WorkerId;
use deskwatch_core::types::timestamp;
use deskwatch_entity::job::{JobRecord, JobType};
use deskwatch_entity::result::ResultRecord;
use deskwatch_entity::worker::WorkerRecord;

use common::{CONTROLLER, ago, harness, search};

async fn backdate_heartbeat(h: &common::Harness, id: WorkerId, seconds: i64) {
    h.controller
        .registry()
        .lock()
        .await
        .get_mut(id)
        .unwrap()
        .last_heartbeat = ago(seconds);
}

async fn peer_row(h: &common::Harness, address: &str, age: i64) -> WorkerRecord {
    let record = WorkerRecord {
        worker_id: WorkerId::new(),
        address: address.to_string(),
        last_heartbeat: ago(age),
    };
    h.controller.repos().workers.save(&record).await.unwrap();
    record
}

#[tokio::test]
async fn test_register_persists_and_reregister_keeps_jobs() {
    let h = harness();
    let worker = h.add_worker("10.0.0.2:5003").await;
    h.start(worker, JobType::RunOnce, search("r1")).await;

    h.controller
        .register_worker(worker, "10.0.0.9:5003")
        .await
        .unwrap();

    let registry = h.controller.registry().lock().await;
    assert_eq!(registry.len(), 1);
    let entry = registry.get(worker).unwrap();
    assert_eq!(entry.address, "10.0.0.9:5003");
    assert_eq!(entry.job_count(), 1);
    drop(registry);

    let row = h.controller.repos().workers.find(worker).await.unwrap().unwrap();
    assert_eq!(row.address, "10.0.0.9:5003");
}

#[tokio::test]
async fn test_fresh_workers_are_not_pinged() {
    let h = harness();
    h.add_worker("10.0.0.2:5003").await;
    let report = h.controller.heartbeat_tick().await.unwrap();
    assert_eq!(report.checked, 0);
    assert!(h.workers.heartbeats().is_empty());
}

#[tokio::test]
async fn test_heartbeat_refreshes_stale_worker() {
    let h = harness();
    let worker = h.add_worker("10.0.0.2:5003").await;
    backdate_heartbeat(&h, worker, 45).await;

    let report = h.controller.heartbeat_tick().await.unwrap();
    assert_eq!(report.refreshed, 1);

    let last = h.controller.registry().lock().await.get(worker).unwrap().last_heartbeat;
    assert!(timestamp::now() - last < chrono::Duration::seconds(5));
    let row = h.controller.repos().workers.find(worker).await.unwrap().unwrap();
    assert_eq!(row.last_heartbeat, last);
}

#[tokio::test]
async fn test_silent_worker_kept_until_timeout() {
    let h = harness();
    let worker = h.add_worker("10.0.0.2:5003").await;
    h.workers.set_down("10.0.0.2:5003");
    backdate_heartbeat(&h, worker, 60).await;

    let report = h.controller.heartbeat_tick().await.unwrap();
    assert!(report.dropped.is_empty());
    assert!(h.controller.registry().lock().await.contains(worker));
}

#[tokio::test]
async fn test_timed_out_worker_is_dropped_and_jobs_requeued() {
    let h = harness();
    let worker = h.add_worker("10.0.0.2:5003").await;
    let job = h.start(worker, JobType::RunOnce, search("r1")).await;
    h.workers.set_down("10.0.0.2:5003");
    backdate_heartbeat(&h, worker, 120).await;

    let report = h.controller.heartbeat_tick().await.unwrap();
    assert_eq!(report.dropped, vec![worker]);
    assert!(!h.controller.registry().lock().await.contains(worker));
    assert!(h.controller.repos().workers.find(worker).await.unwrap().is_none());
    assert!(h.controller.restarts().lock().await.contains(job.job_id));
}

#[tokio::test]
async fn test_sync_tracks_and_drops_peer_workers() {
    let h = harness();
    let local = h.add_worker("10.0.0.2:5003").await;
    let peer = peer_row(&h, "10.0.1.2:5003", 5).await;

    let report = h.controller.sync_tick().await.unwrap();
    assert_eq!(report.added, 1);
    assert_eq!(report.tracked, 1);
    assert!(h.controller.synced().lock().await.contains(peer.worker_id));
    assert!(!h.controller.synced().lock().await.contains(local));

    h.controller.repos().workers.delete(peer.worker_id).await.unwrap();
    let report = h.controller.sync_tick().await.unwrap();
    assert_eq!(report.dropped, 1);
    assert!(h.controller.synced().lock().await.is_empty());
}

#[tokio::test]
async fn test_sync_adopts_answering_orphan() {
    let h = harness();
    let orphan = peer_row(&h, "10.0.1.2:5003", 200).await;

    let report = h.controller.sync_tick().await.unwrap();
    assert_eq!(report.orphans, vec![OrphanOutcome::Adopted]);
    assert_eq!(
        h.workers.adopted(),
        vec![("10.0.1.2:5003".to_string(), CONTROLLER.to_string())]
    );
    assert!(h.controller.registry().lock().await.contains(orphan.worker_id));
    assert!(!h.controller.synced().lock().await.contains(orphan.worker_id));

    let row = h
        .controller
        .repos()
        .workers
        .find(orphan.worker_id)
        .await
        .unwrap()
        .unwrap();
    assert!(timestamp::now() - row.last_heartbeat < chrono::Duration::seconds(5));
}

#[tokio::test]
async fn test_sync_removes_silent_orphan() {
    let h = harness();
    let orphan = peer_row(&h, "10.0.1.2:5003", 200).await;
    h.workers.set_down("10.0.1.2:5003");

    let report = h.controller.sync_tick().await.unwrap();
    assert_eq!(report.orphans, vec![OrphanOutcome::Removed]);
    assert!(h.controller.repos().workers.find(orphan.worker_id).await.unwrap().is_none());
    assert!(h.controller.synced().lock().await.is_empty());
    assert!(h.workers.adopted().is_empty());
}

#[tokio::test]
async fn test_sync_removes_orphan_that_refuses_adoption() {
    let h = harness();
    let orphan = peer_row(&h, "10.0.1.2:5003", 200).await;
    h.workers.reject_adopt("10.0.1.2:5003");

    let report = h.controller.sync_tick().await.unwrap();
    assert_eq!(report.orphans, vec![OrphanOutcome::Removed]);
    assert_eq!(h.workers.heartbeats(), vec!["10.0.1.2:5003".to_string()]);
    assert!(h.workers.adopted().is_empty());
    assert!(h.controller.repos().workers.find(orphan.worker_id).await.unwrap().is_none());
    assert!(!h.controller.synced().lock().await.contains(orphan.worker_id));
    assert!(!h.controller.registry().lock().await.contains(orphan.worker_id));
}

#[tokio::test]
async fn test_heartbeat_sweeps_synced_orphans() {
    let h = harness();
    let peer = peer_row(&h, "10.0.1.2:5003", 5).await;
    h.controller.sync_tick().await.unwrap();

    let mut stale = peer.clone();
    stale.last_heartbeat = ago(200);
    h.controller.synced().lock().await.upsert(stale);

    let report = h.controller.heartbeat_tick().await.unwrap();
    assert_eq!(report.orphans, 1);
    assert!(h.controller.registry().lock().await.contains(peer.worker_id));
}

#[tokio::test]
async fn test_timed_out_job_restarts_exactly_once() {
    let h = harness();
    let worker = h.add_worker("10.0.0.2:5003").await;
    let job = h.start(worker, JobType::RunOnce, search("r1")).await;
    h.age_job(job.job_id, 301).await;

    let report = h.controller.health_tick().await.unwrap();
    assert_eq!(report.timed_out, vec![job.job_id]);
    assert_eq!(h.job_count(worker).await, 0);
    assert_eq!(h.controller.registry().lock().await.get(worker).unwrap().errors, 1);

    let report = h.controller.health_tick().await.unwrap();
    assert!(report.timed_out.is_empty());
    assert!(report.claimed.is_empty());
    assert_eq!(h.controller.restarts().lock().await.len(), 1);
}

#[tokio::test]
async fn test_worker_shut_down_after_error_budget() {
    let h = harness();
    let worker = h.add_worker("10.0.0.2:5003").await;
    let stuck = h.start(worker, JobType::RunOnce, search("stuck")).await;
    let fresh = h.start(worker, JobType::RunOnce, search("fresh")).await;
    h.controller.registry().lock().await.get_mut(worker).unwrap().errors = 2;
    h.age_job(stuck.job_id, 301).await;

    let report = h.controller.health_tick().await.unwrap();
    assert_eq!(report.shut_down, vec![worker]);
    assert_eq!(h.workers.shutdowns(), vec!["10.0.0.2:5003".to_string()]);
    assert!(!h.controller.registry().lock().await.contains(worker));
    assert!(h.controller.repos().workers.find(worker).await.unwrap().is_none());

    let restarts = h.controller.restarts().lock().await;
    assert!(restarts.contains(stuck.job_id));
    assert!(restarts.contains(fresh.job_id));
}

#[tokio::test]
async fn test_abandoned_foreign_job_is_claimed_once() {
    let h = harness();
    let abandoned = JobRecord {
        job_id: deskwatch_core::types::JobId::new(),
        job_type: JobType::Continuous,
        assigned_worker: WorkerId::new(),
        controller: Some("10.0.9.9:5002".into()),
        email: None,
        args: search("standing"),
        started: ago(601),
    };
    h.controller.repos().jobs.create(&abandoned).await.unwrap();

    let report = h.controller.health_tick().await.unwrap();
    assert_eq!(report.claimed, vec![abandoned.job_id]);
    let row = h
        .controller
        .repos()
        .jobs
        .find(abandoned.job_id)
        .await
        .unwrap()
        .unwrap();
    assert!(timestamp::now() - row.started < chrono::Duration::seconds(5));

    let report = h.controller.health_tick().await.unwrap();
    assert!(report.claimed.is_empty());
    assert_eq!(h.controller.restarts().lock().await.len(), 1);
}

#[tokio::test]
async fn test_young_foreign_job_is_left_alone() {
    let h = harness();
    let job = JobRecord {
        job_id: deskwatch_core::types::JobId::new(),
        job_type: JobType::RunOnce,
        assigned_worker: WorkerId::new(),
        controller: None,
        email: None,
        args: search("r1"),
        started: ago(400),
    };
    h.controller.repos().jobs.create(&job).await.unwrap();

    let report = h.controller.health_tick().await.unwrap();
    assert!(report.claimed.is_empty());
}

#[tokio::test]
async fn test_retention_sweeps_old_results() {
    let h = harness();
    for (run_id, hours) in [("old", 200), ("new", 1)] {
        h.controller
            .repos()
            .results
            .save(&ResultRecord {
                run_id: run_id.into(),
                result: "found".into(),
                stored_at: ago(hours * 3600),
            })
            .await
            .unwrap();
    }

    assert_eq!(h.controller.retention_tick().await.unwrap(), 1);
    assert!(h.controller.repos().results.find("old").await.unwrap().is_none());
    assert!(h.controller.repos().results.find("new").await.unwrap().is_some());
}

#[tokio::test]
async fn test_shutdown_all_workers_on_exit() {
    let h = harness();
    h.add_worker("10.0.0.2:5003").await;
    h.add_worker("10.0.0.3:5003").await;

    h.controller.shutdown_all_workers().await;

    assert_eq!(h.workers.shutdowns().len(), 2);
    assert!(h.controller.registry().lock().await.is_empty());
    assert!(h.controller.repos().workers.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_status_snapshot() {
    let h = harness();
    let worker = h.add_worker("10.0.0.2:5003").await;
    h.start(worker, JobType::RunOnce, search("r1")).await;
    peer_row(&h, "10.0.1.2:5003", 5).await;
    h.controller.sync_tick().await.unwrap();

    let status = h.controller.status().await;
    assert_eq!(status.controller, CONTROLLER);
    assert_eq!(status.workers.len(), 1);
    assert_eq!(status.workers[0].jobs.len(), 1);
    assert_eq!(status.synced_workers.len(), 1);
    assert!(status.pending_restarts.is_empty());
}
