//! Application configuration options

use std::time::Duration;

use url::Url;

use crate::errors::TrackerError;
use crate::http::client::DEFAULT_REQUEST_TIMEOUT;
use crate::workers::poller;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Orchestrator API base URL
    pub backend_base_url: String,

    /// Per-request HTTP timeout
    pub request_timeout: Duration,

    /// Poll worker options
    pub poller: poller::Options,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            backend_base_url: "http://localhost:8001".to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            poller: poller::Options::default(),
        }
    }
}

impl AppOptions {
    /// Validate option values
    pub fn validate(&self) -> Result<(), TrackerError> {
        Url::parse(&self.backend_base_url)
            .map_err(|e| TrackerError::ConfigError(format!("invalid backend URL: {}", e)))?;

        if self.poller.interval.is_zero() {
            return Err(TrackerError::ConfigError(
                "poll interval must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
