//! Calls into workers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;

use deskwatch_core::error::{AppError, ErrorKind};
use deskwatch_core::result::AppResult;
use deskwatch_entity::job::StartJobPayload;

/// Failure of one worker call. Always transient from the controller's
/// point of view; the loops decide whether to retry.
#[derive(Debug, thiserror::Error)]
pub enum WorkerCallError {
    /// The worker could not be reached or timed out.
    #[error("request to {address} failed: {source}")]
    Transport {
        address: String,
        #[source]
        source: reqwest::Error,
    },

    /// The worker answered with something other than `OK`.
    #[error("worker at {address} answered {status}: {body}")]
    Rejected {
        address: String,
        status: u16,
        body: String,
    },

    /// The worker address does not form a valid URL.
    #[error("invalid worker address '{0}'")]
    InvalidAddress(String),
}

/// The HTTP surface every worker exposes.
#[async_trait]
pub trait WorkerCapability: Send + Sync + std::fmt::Debug + 'static {
    /// Start a job. Workers acknowledge immediately and report back through
    /// `/return_result`.
    async fn start_job(&self, address: &str, payload: &StartJobPayload)
    -> Result<(), WorkerCallError>;

    /// Liveness probe with a short timeout.
    async fn heartbeat(&self, address: &str) -> Result<(), WorkerCallError>;

    /// Hand the worker over to the controller at `controller`.
    async fn adopt(&self, address: &str, controller: &str) -> Result<(), WorkerCallError>;

    /// Ask the worker process to exit.
    async fn shutdown(&self, address: &str) -> Result<(), WorkerCallError>;
}

/// [`WorkerCapability`] over HTTP with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpWorkerClient {
    client: reqwest::Client,
    heartbeat_timeout: Duration,
}

impl HttpWorkerClient {
    /// Build a client. `request_timeout` bounds every call except the
    /// heartbeat, which uses `heartbeat_timeout`.
    pub fn new(request_timeout: Duration, heartbeat_timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    "Failed to build worker HTTP client",
                    e,
                )
            })?;
        Ok(Self {
            client,
            heartbeat_timeout,
        })
    }

    fn url(address: &str, path: &str) -> Result<Url, WorkerCallError> {
        let base = if address.contains("://") {
            address.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", address.trim_end_matches('/'))
        };
        Url::parse(&format!("{base}/{path}"))
            .map_err(|_| WorkerCallError::InvalidAddress(address.to_string()))
    }

    /// Send a request and require an `OK` body.
    async fn expect_ok(
        address: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<(), WorkerCallError> {
        let response = request
            .send()
            .await
            .map_err(|source| WorkerCallError::Transport {
                address: address.to_string(),
                source,
            })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| WorkerCallError::Transport {
                address: address.to_string(),
                source,
            })?;

        if status.is_success() && body.trim().eq_ignore_ascii_case("ok") {
            Ok(())
        } else {
            Err(WorkerCallError::Rejected {
                address: address.to_string(),
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait]
impl WorkerCapability for HttpWorkerClient {
    async fn start_job(
        &self,
        address: &str,
        payload: &StartJobPayload,
    ) -> Result<(), WorkerCallError> {
        let url = Self::url(address, "start_job")?;
        Self::expect_ok(address, self.client.post(url).json(payload)).await
    }

    async fn heartbeat(&self, address: &str) -> Result<(), WorkerCallError> {
        let url = Self::url(address, "heartbeat")?;
        Self::expect_ok(address, self.client.get(url).timeout(self.heartbeat_timeout)).await
    }

    async fn adopt(&self, address: &str, controller: &str) -> Result<(), WorkerCallError> {
        let mut url = Self::url(address, "adopt")?;
        url.query_pairs_mut().append_pair("controller", controller);
        Self::expect_ok(address, self.client.post(url)).await
    }

    async fn shutdown(&self, address: &str) -> Result<(), WorkerCallError> {
        let url = Self::url(address, "shutdown")?;
        let response = self
            .client
            .post(url)
            .send()
            .await
            .map_err(|source| WorkerCallError::Transport {
                address: address.to_string(),
                source,
            })?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(WorkerCallError::Rejected {
                address: address.to_string(),
                status: response.status().as_u16(),
                body: String::new(),
            })
        }
    }
}
