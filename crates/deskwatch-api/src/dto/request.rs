//! Query parameters of the worker callbacks.

use serde::Deserialize;

/// `POST /register?worker_id=...[&address=host:port]`
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterParams {
    pub worker_id: String,
    /// Where the worker listens. Defaults to the peer IP and the
    /// configured worker port.
    #[serde(default)]
    pub address: Option<String>,
}

/// `POST /return_result?job_id=...&result=...`
#[derive(Debug, Clone, Deserialize)]
pub struct ReturnResultParams {
    pub job_id: String,
    #[serde(default)]
    pub result: String,
}
