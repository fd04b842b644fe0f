use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::connect_info::MockConnectInfo;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use deskwatch_api::{AppState, build_router};
use deskwatch_controller::{Controller, ControllerParts, HttpWorkerClient, LogNotifier};
use deskwatch_core::config::AppConfig;
use deskwatch_core::types::WorkerId;
use deskwatch_entity::job::{JobArgs, JobRecord, JobType};
use deskwatch_core::types::{JobId, timestamp};
use deskwatch_store::Backends;

const PEER: &str = "192.168.1.20:40000";

fn app() -> (Router, Arc<Controller>) {
    let config = AppConfig::default();
    let backends = Backends::in_memory(Duration::from_secs(30));
    let controller = Controller::new(ControllerParts {
        config: config.controller.clone(),
        notification: config.notification.clone(),
        advertise_address: "10.0.0.1:5002".to_string(),
        store: backends.store.clone(),
        queue: backends.queue.clone(),
        client: Arc::new(HttpWorkerClient::new(
            Duration::from_millis(100),
            Duration::from_millis(100),
        )
        .unwrap()),
        notifier: Arc::new(LogNotifier),
    });
    let state = AppState::new(
        Arc::new(config),
        controller.clone(),
        backends.store.clone(),
        backends.queue.clone(),
    );
    let peer: SocketAddr = PEER.parse().unwrap();
    (build_router(state).layer(MockConnectInfo(peer)), controller)
}

async fn call(app: &Router, method: &str, uri: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("host", "controller.local:5002")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_register_defaults_to_peer_ip() {
    let (app, controller) = app();
    let worker = WorkerId::new();

    let (status, body) = call(&app, "POST", &format!("/register?worker_id={worker}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK,controller.local:5002");

    let registry = controller.registry().lock().await;
    assert_eq!(registry.get(worker).unwrap().address, "192.168.1.20:5003");
}

#[tokio::test]
async fn test_register_with_explicit_address() {
    let (app, controller) = app();
    let worker = WorkerId::new();

    let (status, _) = call(
        &app,
        "POST",
        &format!("/register?worker_id={worker}&address=worker-7:6000"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let row = controller.repos().workers.find(worker).await.unwrap().unwrap();
    assert_eq!(row.address, "worker-7:6000");
}

#[tokio::test]
async fn test_register_rejects_bad_worker_id() {
    let (app, _) = app();
    let (status, body) = call(&app, "POST", "/register?worker_id=not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("VALIDATION"));
}

#[tokio::test]
async fn test_return_result_stores_run_once_result() {
    let (app, controller) = app();
    let worker = WorkerId::new();
    controller
        .register_worker(worker, "10.0.0.2:5003")
        .await
        .unwrap();

    let job = JobRecord {
        job_id: JobId::new(),
        job_type: JobType::RunOnce,
        assigned_worker: worker,
        controller: None,
        email: None,
        args: JobArgs::Search {
            run_id: Some("abc-123".into()),
            desired_months: vec!["juni".into()],
            desks: vec!["ind amsterdam".into()],
        },
        started: timestamp::now(),
    };
    controller
        .registry()
        .lock()
        .await
        .get_mut(worker)
        .unwrap()
        .jobs
        .push(job.clone());
    controller.repos().jobs.create(&job).await.unwrap();

    let (status, body) = call(
        &app,
        "POST",
        &format!("/return_result?job_id={}&result=01%2F07%2009%3A00", job.job_id),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");

    let result = controller
        .repos()
        .results
        .find("abc-123")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(result.result, "01/07 09:00");
}

#[tokio::test]
async fn test_return_result_for_unknown_job_is_ok() {
    let (app, _) = app();
    let (status, body) = call(
        &app,
        "POST",
        &format!("/return_result?job_id={}&result=x", JobId::new()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn test_health_reports_backends() {
    let (app, _) = app();
    let (status, body) = call(&app, "GET", "/health").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["store"]["provider"], "memory");
    assert_eq!(json["queue"]["healthy"], true);
}

#[tokio::test]
async fn test_status_lists_registered_workers() {
    let (app, _) = app();
    let worker = WorkerId::new();
    call(&app, "POST", &format!("/register?worker_id={worker}")).await;

    let (status, body) = call(&app, "GET", "/status").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["controller"], "10.0.0.1:5002");
    assert_eq!(json["workers"][0]["id"], worker.to_string());
    assert_eq!(json["workers"][0]["address"], "192.168.1.20:5003");
}
