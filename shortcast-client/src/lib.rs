//! Shortcast HTTP Client
//!
//! A type-safe HTTP client for the Shortcast orchestrator API, plus the
//! polling machinery a wizard front-end needs to drive a run through its
//! decision gates.
//!
//! # Example
//!
//! ```no_run
//! use shortcast_client::PipelineClient;
//! use shortcast_core::dto::StartRunRequest;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = PipelineClient::new("http://localhost:8080");
//!
//!     let run = client.start_run(StartRunRequest::default()).await?;
//!     println!("Started run: {}", run.run_id);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod poller;
mod runs;
pub mod session;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use poller::{PollOutcome, StatusPoller, StatusSource};
pub use session::{RunSession, SessionEvent};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the Shortcast orchestrator API
///
/// Provides methods for every orchestrator endpoint:
/// - Run lifecycle (start, status, result)
/// - Gate prompt fetches (topics, speakers, script, audio-choice, hook-prompt)
/// - Gate decision submissions
#[derive(Debug, Clone)]
pub struct PipelineClient {
    /// Base URL of the orchestrator (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl PipelineClient {
    /// Create a new pipeline client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the orchestrator API (e.g., "http://localhost:8080")
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// Create a new pipeline client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the orchestrator
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Handle an API response and deserialize JSON
    ///
    /// Checks the status code and returns an appropriate error if the request
    /// failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}
