//! Job tracker

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

use crate::errors::TrackerError;
use crate::http::client::HttpClient;
use crate::job::logbuf::LogBuffer;
use crate::job::state::{ProgressState, TrackState};
use crate::models::job::{JobStatus, LogEntry};
use crate::models::request::DeploymentRequest;

/// Tracks a single server-executed deployment job
///
/// One job in flight per tracker: `start` is guarded by the state machine
/// plus an atomic in-progress flag, and a fresh start requires an explicit
/// `reset` from a terminal state. All reads are snapshots; observers can
/// subscribe to `watch` for change notifications.
pub struct JobTracker {
    job_id: RwLock<Option<Uuid>>,
    state: RwLock<ProgressState>,
    logs: LogBuffer,
    starting: AtomicBool,
    cancelled: AtomicBool,
    revision: watch::Sender<u64>,
}

impl JobTracker {
    /// Create an idle tracker
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            job_id: RwLock::new(None),
            state: RwLock::new(ProgressState::new()),
            logs: LogBuffer::new(),
            starting: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            revision,
        }
    }

    /// Start a deployment job through the given client
    ///
    /// One-shot and user-initiated: a rejected or failed request leaves the
    /// tracker `Idle` and is never retried. Returns the local handle id
    /// assigned to the accepted job.
    pub async fn start(
        &self,
        client: &HttpClient,
        request: &DeploymentRequest,
        token: &SecretString,
    ) -> Result<Uuid, TrackerError> {
        if self.starting.swap(true, Ordering::SeqCst) {
            return Err(TrackerError::StateError(
                "a start request is already in flight".to_string(),
            ));
        }

        let result = self.start_inner(client, request, token).await;
        self.starting.store(false, Ordering::SeqCst);
        result
    }

    async fn start_inner(
        &self,
        client: &HttpClient,
        request: &DeploymentRequest,
        token: &SecretString,
    ) -> Result<Uuid, TrackerError> {
        {
            let state = self.state.read().unwrap_or_else(|e| e.into_inner());
            if state.state() != TrackState::Idle {
                return Err(TrackerError::StateError(format!(
                    "a job is already tracked (state {:?})",
                    state.state()
                )));
            }
        }

        let response = client
            .start_deployment(request, token.expose_secret())
            .await
            .map_err(|e| TrackerError::StartError(e.to_string()))?;

        let job_id = self.attach()?;
        info!(job = %job_id, "Deployment job accepted: {}", response.message);
        Ok(job_id)
    }

    /// Begin tracking a job the orchestrator has already accepted
    ///
    /// Clears any stale log history and assigns a fresh local handle id.
    pub fn attach(&self) -> Result<Uuid, TrackerError> {
        {
            let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
            state.begin().map_err(TrackerError::StateError)?;
        }
        self.logs.clear();
        self.cancelled.store(false, Ordering::SeqCst);

        let job_id = Uuid::new_v4();
        {
            let mut guard = self.job_id.write().unwrap_or_else(|e| e.into_inner());
            *guard = Some(job_id);
        }
        self.bump();
        Ok(job_id)
    }

    /// Apply one fetched status snapshot; returns the state after application
    ///
    /// State and log mutation happen synchronously once the snapshot is
    /// accepted. A snapshot arriving after cancellation was requested is
    /// discarded unapplied.
    pub fn apply_status(&self, status: &JobStatus) -> Result<TrackState, TrackerError> {
        let new_state = {
            let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
            if self.cancelled.load(Ordering::SeqCst) {
                return Ok(state.state());
            }
            state
                .observe(status.progress, status.is_running)
                .map_err(TrackerError::StateError)?
        };

        self.logs.replace(status.logs.clone());
        self.bump();
        Ok(new_state)
    }

    /// Request cooperative cancellation of tracking
    ///
    /// The poll loop observes the flag after every suspension point; the
    /// remote job itself keeps executing server-side.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.bump();
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Return the tracker to `Idle` after a terminal state
    pub fn reset(&self) -> Result<(), TrackerError> {
        {
            let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
            state.reset().map_err(TrackerError::StateError)?;
        }
        self.logs.clear();
        {
            let mut guard = self.job_id.write().unwrap_or_else(|e| e.into_inner());
            *guard = None;
        }
        self.cancelled.store(false, Ordering::SeqCst);
        self.bump();
        Ok(())
    }

    /// Current job state
    pub fn state(&self) -> TrackState {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.state()
    }

    /// Raw reported progress, including the -1 sentinel
    pub fn progress(&self) -> i32 {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.progress()
    }

    /// Display progress clamped to [0, 100]
    pub fn percent(&self) -> u8 {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.percent()
    }

    /// Local handle id of the tracked job, if any
    pub fn job_id(&self) -> Option<Uuid> {
        let guard = self.job_id.read().unwrap_or_else(|e| e.into_inner());
        *guard
    }

    /// Snapshot of the log history
    pub fn logs(&self) -> Vec<LogEntry> {
        self.logs.snapshot()
    }

    /// Log entries from `index` onward, for incremental rendering
    pub fn logs_since(&self, index: usize) -> Vec<LogEntry> {
        self.logs.since(index)
    }

    /// Subscribe to tracker updates
    ///
    /// The observed value is a revision counter bumped on every applied
    /// change; observers re-read the tracker on each change.
    pub fn watch(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}

impl Default for JobTracker {
    fn default() -> Self {
        Self::new()
    }
}
