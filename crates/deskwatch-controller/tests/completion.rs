mod common;

use chrono::NaiveDate;

use deskwatch_controller::Completion;
use deskwatch_core::types::JobId;
use deskwatch_entity::continuous::ContinuousRunRequest;
use deskwatch_entity::job::{JobArgs, JobType};

use common::{harness, search};

async fn continuous(h: &common::Harness, email: Option<&str>) {
    let request = ContinuousRunRequest::new(
        "standing",
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 7, 31).unwrap(),
        &["ind amsterdam".to_string()],
        email.map(str::to_string),
    );
    h.controller.repos().continuous.create(&request).await.unwrap();
}

#[tokio::test]
async fn test_run_once_result_is_stored() {
    let h = harness();
    let worker = h.add_worker("10.0.0.2:5003").await;
    let job = h.start(worker, JobType::RunOnce, search("abc-123")).await;

    let outcome = h.controller.complete(job.job_id, "01/07 09:00").await.unwrap();
    assert_eq!(
        outcome,
        Completion::Completed {
            job_type: JobType::RunOnce
        }
    );

    let result = h
        .controller
        .repos()
        .results
        .find("abc-123")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(result.result, "01/07 09:00");
    assert_eq!(h.job_count(worker).await, 0);
    assert!(h.controller.repos().jobs.find(job.job_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_get_desks_result_replaces_cache() {
    let h = harness();
    let worker = h.add_worker("10.0.0.2:5003").await;
    let job = h.start(worker, JobType::GetDesks, JobArgs::check_desks()).await;

    h.controller
        .complete(job.job_id, "IND Amsterdam,IND Utrecht")
        .await
        .unwrap();

    let cache = h.controller.repos().desks.get().await.unwrap().unwrap();
    assert_eq!(cache.desk_names(), vec!["IND Amsterdam", "IND Utrecht"]);
}

#[tokio::test]
async fn test_continuous_hit_notifies_and_deletes_request() {
    let h = harness();
    continuous(&h, Some("someone@example.com")).await;
    let worker = h.add_worker("10.0.0.2:5003").await;
    let job = h.start(worker, JobType::Continuous, search("standing")).await;

    h.controller
        .complete(job.job_id, "01/07 09:00,02/07 10:30")
        .await
        .unwrap();

    assert!(h.controller.repos().continuous.find("standing").await.unwrap().is_none());
    assert!(h.controller.repos().results.find("standing").await.unwrap().is_some());

    let sent = h.notifier.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "someone@example.com");
    assert_eq!(sent[0].subject, "IND Datum gevonden!");
    assert_eq!(sent[0].body, "01/07 09:00\n02/07 10:30");
}

#[tokio::test]
async fn test_continuous_miss_resets_error_count() {
    let h = harness();
    continuous(&h, None).await;
    let mut request = h
        .controller
        .repos()
        .continuous
        .find("standing")
        .await
        .unwrap()
        .unwrap();
    request.error_count = 2;
    h.controller.repos().continuous.save(&request).await.unwrap();

    let worker = h.add_worker("10.0.0.2:5003").await;
    let job = h.start(worker, JobType::Continuous, search("standing")).await;
    h.controller.complete(job.job_id, "  ").await.unwrap();

    let stored = h
        .controller
        .repos()
        .continuous
        .find("standing")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.error_count, 0);
    assert!(h.controller.repos().results.find("standing").await.unwrap().is_none());
    assert!(h.notifier.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_notification_failure_is_swallowed() {
    let h = harness();
    *h.notifier.fail.lock().unwrap() = true;
    continuous(&h, Some("someone@example.com")).await;
    let worker = h.add_worker("10.0.0.2:5003").await;
    let job = h.start(worker, JobType::Continuous, search("standing")).await;

    h.controller.complete(job.job_id, "01/07 09:00").await.unwrap();
    assert!(h.controller.repos().continuous.find("standing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_unknown_job_is_acknowledged() {
    let h = harness();
    assert_eq!(
        h.controller.complete(JobId::new(), "whatever").await.unwrap(),
        Completion::Unknown
    );
}

#[tokio::test]
async fn test_late_result_cancels_pending_restart() {
    let h = harness();
    let worker = h.add_worker("10.0.0.2:5003").await;
    let job = h.start(worker, JobType::RunOnce, search("late")).await;
    h.controller.drop_worker(worker).await.unwrap();
    assert_eq!(h.controller.restarts().lock().await.len(), 1);

    h.controller.complete(job.job_id, "found").await.unwrap();

    assert!(h.controller.restarts().lock().await.is_empty());
    assert!(h.controller.repos().results.find("late").await.unwrap().is_some());
}

#[tokio::test]
async fn test_result_for_job_of_dead_controller_uses_store_row() {
    let h = harness();
    let worker = h.add_worker("10.0.0.2:5003").await;
    let job = h.start(worker, JobType::RunOnce, search("inherited")).await;
    // Forget the job locally, as if another controller had dispatched it.
    h.controller.registry().lock().await.take_job(job.job_id);

    h.controller.complete(job.job_id, "found").await.unwrap();
    assert!(h.controller.repos().results.find("inherited").await.unwrap().is_some());
    assert!(h.controller.repos().jobs.find(job.job_id).await.unwrap().is_none());
}
