//! Deskwatch controller: main entry point that wires all crates together
//! and starts the server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use deskwatch_api::{AppState, build_router};
use deskwatch_controller::{
    Controller, ControllerParts, ControllerRunner, HttpWorkerClient, build_notifier,
};
use deskwatch_core::config::AppConfig;
use deskwatch_core::error::AppError;
use deskwatch_store::Backends;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Controller error");
        std::process::exit(1);
    }
}

/// Load configuration from file, environment overlay and variables
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_path =
        std::env::var("DESKWATCH_CONFIG").unwrap_or_else(|_| "config/default".to_string());
    let env = std::env::var("DESKWATCH_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&config_path, &env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        store = %config.store.provider,
        queue = %config.queue.provider,
        "Starting Deskwatch controller"
    );

    let backends = Backends::connect(&config.store, &config.queue).await?;
    let notifier = build_notifier(&config.notification)?;
    let client = HttpWorkerClient::new(
        config.controller.worker_request_timeout(),
        config.controller.heartbeat_request_timeout(),
    )?;

    let advertise_address = config.server.advertised();
    let controller = Controller::new(ControllerParts {
        config: config.controller.clone(),
        notification: config.notification.clone(),
        advertise_address: advertise_address.clone(),
        store: backends.store.clone(),
        queue: backends.queue.clone(),
        client: Arc::new(client),
        notifier,
    });

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let runner = ControllerRunner::new(Arc::clone(&controller));
    let handles = runner.spawn(cancel_rx);

    let state = AppState::new(
        Arc::new(config.clone()),
        controller,
        backends.store.clone(),
        backends.queue.clone(),
    );
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
    tracing::info!(listen = %addr, advertise = %advertise_address, "Controller listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
    })
    .await
    .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    let _ = cancel_tx.send(true);
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    if tokio::time::timeout(grace, runner.shutdown(handles))
        .await
        .is_err()
    {
        tracing::warn!(grace_seconds = grace.as_secs(), "Loops did not stop within the grace period");
    }

    backends.close().await;
    tracing::info!("Deskwatch controller shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
