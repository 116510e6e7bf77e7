//! Polling worker for job status tracking

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::http::deploy::StatusSource;
use crate::job::tracker::JobTracker;

/// Poller worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Polling interval
    pub interval: Duration,

    /// Initial delay before the first tick
    pub initial_delay: Duration,

    /// Upper bound on total tracking time; `None` polls until terminal.
    /// Accounted in nominal tick time (the sum of configured sleeps), so
    /// the bound stays deterministic under an injected sleep function.
    pub max_duration: Option<Duration>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            initial_delay: Duration::ZERO,
            max_duration: Some(Duration::from_secs(3600)),
        }
    }
}

/// Why the poll loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The orchestrator reported a terminal status
    Terminal,

    /// Tracking was cancelled by the caller
    Cancelled,

    /// The tracking deadline elapsed before a terminal status
    DeadlineExceeded,
}

/// Run the poll loop
///
/// Fetches job status at a fixed cadence (no backoff, no jitter) and feeds
/// each snapshot into the tracker until a terminal state, cancellation, or
/// the deadline. A failed fetch is a dropped tick: logged and retried at the
/// next interval, never mistaken for job failure. At most one fetch is in
/// flight at a time; the next tick is not scheduled until the previous fetch
/// has resolved, so snapshots are applied in order.
pub async fn run<S, F>(
    options: &Options,
    source: &dyn StatusSource,
    tracker: &JobTracker,
    sleep_fn: S,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) -> PollOutcome
where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Poll loop starting...");

    sleep_fn(options.initial_delay).await;
    let mut elapsed = options.initial_delay;

    loop {
        if let Some(max) = options.max_duration {
            if elapsed >= max {
                warn!(
                    "Tracking deadline of {:?} reached before a terminal status",
                    max
                );
                return PollOutcome::DeadlineExceeded;
            }
        }

        // Check for shutdown; shutdown wins when both are ready so that
        // cancellation takes effect before the next tick fires
        tokio::select! {
            biased;
            _ = &mut shutdown_signal => {
                info!("Poll loop shutting down...");
                tracker.cancel();
                return PollOutcome::Cancelled;
            }
            _ = sleep_fn(options.interval) => {
                // Continue with the tick
            }
        }
        elapsed += options.interval;

        if tracker.is_cancelled() {
            info!("Poll loop cancelled");
            return PollOutcome::Cancelled;
        }

        debug!("Fetching job status...");
        let fetched = tokio::select! {
            biased;
            _ = &mut shutdown_signal => {
                info!("Poll loop shutting down mid-fetch...");
                tracker.cancel();
                return PollOutcome::Cancelled;
            }
            result = source.fetch_status() => result,
        };

        // Cancellation wins over a fetch that was in flight when it was
        // requested: the snapshot is discarded unapplied.
        if tracker.is_cancelled() {
            info!("Poll loop cancelled, discarding in-flight result");
            return PollOutcome::Cancelled;
        }

        match fetched {
            Ok(status) => match tracker.apply_status(&status) {
                Ok(state) if state.is_terminal() => {
                    info!("Job reached terminal state: {:?}", state);
                    return PollOutcome::Terminal;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Tracker rejected status snapshot, stopping: {}", e);
                    return PollOutcome::Cancelled;
                }
            },
            Err(e) => {
                // Transient: one dropped tick, retried at the next interval
                warn!("Status fetch failed: {}", e);
            }
        }
    }
}
