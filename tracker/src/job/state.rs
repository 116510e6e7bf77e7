//! Finite state machine for job progress tracking

use serde::{Deserialize, Serialize};

/// Tracked job state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackState {
    /// No job started
    Idle,

    /// Job accepted by the orchestrator, polling in progress
    Running,

    /// Terminal: job finished with progress at 100
    Succeeded,

    /// Terminal: job finished with progress short of 100
    Failed,
}

impl TrackState {
    /// Whether this state admits no further transitions without a reset
    pub fn is_terminal(&self) -> bool {
        matches!(self, TrackState::Succeeded | TrackState::Failed)
    }
}

/// Progress state machine
///
/// Derives `Idle -> Running -> {Succeeded, Failed}` from the orchestrator's
/// numeric progress signal and running flag. Progress is advisory while the
/// job runs and is not assumed monotonic.
#[derive(Debug, Clone)]
pub struct ProgressState {
    state: TrackState,
    progress: i32,
}

impl ProgressState {
    /// Create a new state machine in idle state
    pub fn new() -> Self {
        Self {
            state: TrackState::Idle,
            progress: 0,
        }
    }

    /// Get current state
    pub fn state(&self) -> TrackState {
        self.state
    }

    /// Raw progress as last reported, including the -1 sentinel
    pub fn progress(&self) -> i32 {
        self.progress
    }

    /// Progress clamped to [0, 100] for rendering
    pub fn percent(&self) -> u8 {
        self.progress.clamp(0, 100) as u8
    }

    /// Enter `Running` on a successful job start
    pub fn begin(&mut self) -> Result<(), String> {
        match self.state {
            TrackState::Idle => {
                self.progress = 0;
                self.state = TrackState::Running;
                Ok(())
            }
            state => Err(format!("cannot begin tracking from {:?}", state)),
        }
    }

    /// Apply one status report; returns the state after application
    ///
    /// The terminal outcome is decided only by a report with
    /// `is_running == false`: progress 100 means success, anything else
    /// means failure (the -1 sentinel included).
    pub fn observe(&mut self, progress: i32, is_running: bool) -> Result<TrackState, String> {
        if self.state != TrackState::Running {
            return Err(format!("cannot observe status from {:?}", self.state));
        }

        self.progress = progress;
        if !is_running {
            self.state = if progress == 100 {
                TrackState::Succeeded
            } else {
                TrackState::Failed
            };
        }
        Ok(self.state)
    }

    /// Return to `Idle` from a terminal state
    pub fn reset(&mut self) -> Result<(), String> {
        match self.state {
            TrackState::Succeeded | TrackState::Failed => {
                self.state = TrackState::Idle;
                self.progress = 0;
                Ok(())
            }
            state => Err(format!("cannot reset from {:?}", state)),
        }
    }
}

impl Default for ProgressState {
    fn default() -> Self {
        Self::new()
    }
}
