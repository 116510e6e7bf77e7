//! Deployment API client

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::errors::TrackerError;
use crate::http::client::HttpClient;
use crate::models::job::JobStatus;
use crate::models::request::DeploymentRequest;

/// Response to a job-start request
#[derive(Debug, Clone, Deserialize)]
pub struct StartResponse {
    pub message: String,
}

/// Source of job status snapshots for the poll loop
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Fetch the current job status and log history
    async fn fetch_status(&self) -> Result<JobStatus, TrackerError>;
}

impl HttpClient {
    /// Ask the orchestrator to start a deployment job
    ///
    /// The credential bag is forwarded verbatim. The orchestrator answers
    /// synchronously; the job itself runs asynchronously server-side.
    pub async fn start_deployment(
        &self,
        request: &DeploymentRequest,
        token: &str,
    ) -> Result<StartResponse, TrackerError> {
        self.post("/deploy", token, request).await
    }

    /// Fetch the current job status and cumulative log history
    pub async fn fetch_job_status(&self, token: &str) -> Result<JobStatus, TrackerError> {
        self.get("/logs", token).await
    }
}

/// Status endpoint bound to a client and an auth credential
pub struct JobStatusEndpoint {
    client: Arc<HttpClient>,
    token: SecretString,
}

impl JobStatusEndpoint {
    pub fn new(client: Arc<HttpClient>, token: SecretString) -> Self {
        Self { client, token }
    }
}

#[async_trait]
impl StatusSource for JobStatusEndpoint {
    async fn fetch_status(&self) -> Result<JobStatus, TrackerError> {
        self.client.fetch_job_status(self.token.expose_secret()).await
    }
}
