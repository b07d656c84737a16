//! Status poller
//!
//! Drives the status-polling side of the gate protocol. A run advances in the
//! background between gates, so the client watches `/status` until it reports
//! something actionable: a waiting state, completion, or failure.
//!
//! Immediately after a gate submission the orchestrator may briefly still
//! report the gate's own waiting status (the resume is accepted before the
//! executor task picks the run back up). [`StatusPoller::mark_handled`]
//! records that status so the next wait skips it instead of treating the
//! stale reading as a new prompt.

use async_trait::async_trait;
use shortcast_core::domain::run::RunStatus;
use shortcast_core::dto::StatusResponse;
use tokio::time::{self, Duration, Instant};
use tracing::debug;
use uuid::Uuid;

use crate::PipelineClient;
use crate::error::Result;

/// Default gap between consecutive status requests.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default wait window for a single transition before giving up.
pub const DEFAULT_WAIT_WINDOW: Duration = Duration::from_secs(600);

/// Source of run status readings.
///
/// Abstracts the HTTP client so the polling logic can be exercised against
/// scripted sources.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn status(&self, run_id: Uuid) -> Result<StatusResponse>;
}

#[async_trait]
impl StatusSource for PipelineClient {
    async fn status(&self, run_id: Uuid) -> Result<StatusResponse> {
        self.get_status(run_id).await
    }
}

/// Outcome of a single wait for the run to reach an actionable state.
#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// The run reached a waiting, completed, or failed state.
    Transition(StatusResponse),
    /// The wait window elapsed with the run still in flight. The run itself
    /// keeps executing; the caller may wait again or abandon the run.
    TimedOut,
}

/// Polls a run's status until it transitions to an actionable state.
pub struct StatusPoller<S> {
    source: S,
    poll_interval: Duration,
    wait_window: Duration,
    skip_status: Option<RunStatus>,
}

impl<S: StatusSource> StatusPoller<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            poll_interval: DEFAULT_POLL_INTERVAL,
            wait_window: DEFAULT_WAIT_WINDOW,
            skip_status: None,
        }
    }

    pub fn with_timing(source: S, poll_interval: Duration, wait_window: Duration) -> Self {
        Self {
            source,
            poll_interval,
            wait_window,
            skip_status: None,
        }
    }

    /// Record that `status` has already been acted on. The next wait ignores
    /// readings still reporting it.
    pub fn mark_handled(&mut self, status: RunStatus) {
        self.skip_status = Some(status);
    }

    /// Clear the handled-status marker, e.g. when switching to a new run.
    pub fn reset(&mut self) {
        self.skip_status = None;
    }

    /// Poll until the run reports an actionable status or the wait window
    /// elapses. Each call gets a fresh window, so calling again after
    /// [`PollOutcome::TimedOut`] extends the wait.
    ///
    /// `running` readings and readings matching the handled marker are
    /// skipped. Transport and API errors propagate immediately.
    pub async fn wait_for_transition(&mut self, run_id: Uuid) -> Result<PollOutcome> {
        let deadline = Instant::now() + self.wait_window;
        let mut interval = time::interval(self.poll_interval);

        loop {
            if time::timeout_at(deadline, interval.tick()).await.is_err() {
                debug!(%run_id, "Wait window elapsed without a status transition");
                return Ok(PollOutcome::TimedOut);
            }

            let response = self.source.status(run_id).await?;

            if response.status == RunStatus::Running {
                continue;
            }
            if self.skip_status == Some(response.status) {
                debug!(%run_id, status = %response.status, "Skipping already-handled status");
                continue;
            }

            self.skip_status = None;
            debug!(%run_id, status = %response.status, "Run transitioned");
            return Ok(PollOutcome::Transition(response));
        }
    }
}
