//! Stage worker boundary
//!
//! The generative stage bodies (trend research, scriptwriting, media
//! synthesis, editing) live in an external worker service. The engine only
//! sees this trait: a worker reads a read-only snapshot and asynchronously
//! returns new state or a failure. Invocations may take from sub-second to
//! several minutes; the executor does not time them out.

use async_trait::async_trait;
use shortcast_core::domain::run::RunInputs;
use shortcast_core::domain::stage::Stage;
use shortcast_core::domain::state::{StageOutput, StageState};

/// Worker error type
#[derive(Debug)]
pub enum WorkerError {
    /// The worker reported an unrecoverable stage failure.
    Failed(String),
    /// The worker broke the invocation contract (transport error, wrong
    /// output shape, output tagged for a different stage).
    Protocol(String),
}

impl std::fmt::Display for WorkerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerError::Failed(msg) => write!(f, "stage failed: {}", msg),
            WorkerError::Protocol(msg) => write!(f, "worker protocol error: {}", msg),
        }
    }
}

impl std::error::Error for WorkerError {}

/// Service trait for executing pipeline stages
#[async_trait]
pub trait StageWorker: Send + Sync {
    /// Execute one stage against a read-only snapshot of the run.
    ///
    /// Must complete (or fail) regardless of whether any client is polling.
    async fn execute(
        &self,
        stage: Stage,
        inputs: &RunInputs,
        state: &StageState,
    ) -> Result<StageOutput, WorkerError>;
}

/// Stage worker backed by an external HTTP worker service.
///
/// POSTs the snapshot to `{base}/stage/{name}` and expects a `StageOutput`
/// JSON body on success.
pub struct HttpStageWorker {
    base_url: String,
    client: reqwest::Client,
}

impl HttpStageWorker {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(serde::Serialize)]
struct StageInvocation<'a> {
    inputs: &'a RunInputs,
    state: &'a StageState,
}

#[async_trait]
impl StageWorker for HttpStageWorker {
    async fn execute(
        &self,
        stage: Stage,
        inputs: &RunInputs,
        state: &StageState,
    ) -> Result<StageOutput, WorkerError> {
        let url = format!("{}/stage/{}", self.base_url, stage);

        tracing::debug!(stage = %stage, url = %url, "Invoking stage worker");

        let response = self
            .client
            .post(&url)
            .json(&StageInvocation { inputs, state })
            .send()
            .await
            .map_err(|e| WorkerError::Protocol(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(WorkerError::Failed(format!(
                "worker returned {}: {}",
                status, body
            )));
        }

        response
            .json::<StageOutput>()
            .await
            .map_err(|e| WorkerError::Protocol(format!("failed to parse worker output: {}", e)))
    }
}
