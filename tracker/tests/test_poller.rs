//! Poll loop integration tests

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use skylift::errors::TrackerError;
use skylift::http::deploy::StatusSource;
use skylift::job::state::TrackState;
use skylift::job::tracker::JobTracker;
use skylift::models::job::{JobStatus, LogEntry, LogLevel};
use skylift::workers::poller::{self, Options, PollOutcome};

fn status(progress: i32, is_running: bool, messages: &[&str]) -> JobStatus {
    JobStatus {
        progress,
        is_running,
        logs: messages
            .iter()
            .enumerate()
            .map(|(i, m)| LogEntry {
                timestamp: 1700000000.0 + i as f64,
                level: LogLevel::Info,
                message: m.to_string(),
            })
            .collect(),
    }
}

fn options(max_ticks: u64) -> Options {
    Options {
        interval: Duration::from_secs(1),
        initial_delay: Duration::ZERO,
        // Nominal-time deadline doubles as a backstop against runaway loops
        max_duration: Some(Duration::from_secs(max_ticks)),
    }
}

fn never() -> Pin<Box<dyn Future<Output = ()> + Send>> {
    Box::pin(std::future::pending())
}

/// Scripted status source; observes tracker state at each fetch
struct ScriptedSource {
    responses: Mutex<VecDeque<Result<JobStatus, TrackerError>>>,
    fetches: AtomicUsize,
    observer: Option<Arc<JobTracker>>,
    observed: Mutex<Vec<(TrackState, usize)>>,
}

impl ScriptedSource {
    fn new(responses: Vec<Result<JobStatus, TrackerError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            fetches: AtomicUsize::new(0),
            observer: None,
            observed: Mutex::new(Vec::new()),
        }
    }

    fn observing(mut self, tracker: Arc<JobTracker>) -> Self {
        self.observer = Some(tracker);
        self
    }

    fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn observations(&self) -> Vec<(TrackState, usize)> {
        self.observed.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatusSource for ScriptedSource {
    async fn fetch_status(&self) -> Result<JobStatus, TrackerError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(tracker) = &self.observer {
            self.observed
                .lock()
                .unwrap()
                .push((tracker.state(), tracker.logs().len()));
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TrackerError::ApiError("script exhausted".to_string())))
    }
}

/// Requests cancellation while its own fetch is in flight
struct CancellingSource {
    tracker: Arc<JobTracker>,
    fetches: AtomicUsize,
}

#[async_trait]
impl StatusSource for CancellingSource {
    async fn fetch_status(&self) -> Result<JobStatus, TrackerError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.tracker.cancel();
        Ok(status(100, false, &["never rendered"]))
    }
}

#[tokio::test]
async fn test_poll_to_success() {
    let tracker = JobTracker::new();
    tracker.attach().unwrap();

    let source = ScriptedSource::new(vec![
        Ok(status(10, true, &["provisioning db"])),
        Ok(status(100, false, &["provisioning db", "db ready", "done"])),
    ]);

    let outcome = poller::run(&options(10), &source, &tracker, |_| async {}, never()).await;

    assert_eq!(outcome, PollOutcome::Terminal);
    assert_eq!(tracker.state(), TrackState::Succeeded);
    assert_eq!(tracker.percent(), 100);
    assert_eq!(tracker.logs().len(), 3);
    // The loop stopped at the terminal tick
    assert_eq!(source.fetch_count(), 2);
}

#[tokio::test]
async fn test_poll_to_failure_sentinel() {
    let tracker = JobTracker::new();
    tracker.attach().unwrap();

    let source = ScriptedSource::new(vec![
        Ok(status(20, true, &["step one"])),
        Ok(status(-1, false, &["step one", "boom"])),
    ]);

    let outcome = poller::run(&options(10), &source, &tracker, |_| async {}, never()).await;

    assert_eq!(outcome, PollOutcome::Terminal);
    assert_eq!(tracker.state(), TrackState::Failed);
    assert_eq!(tracker.logs().len(), 2);
}

#[tokio::test]
async fn test_transient_fetch_failure_is_a_dropped_tick() {
    let tracker = Arc::new(JobTracker::new());
    tracker.attach().unwrap();

    let source = ScriptedSource::new(vec![
        Ok(status(10, true, &["one"])),
        Err(TrackerError::ApiError("connection reset".to_string())),
        Ok(status(100, false, &["one", "two", "three"])),
    ])
    .observing(tracker.clone());

    let outcome =
        poller::run(&options(10), &source, tracker.as_ref(), |_| async {}, never()).await;

    assert_eq!(outcome, PollOutcome::Terminal);
    assert_eq!(tracker.state(), TrackState::Succeeded);
    assert_eq!(source.fetch_count(), 3);

    // The failed tick changed neither state nor buffer: the fetch after it
    // observed exactly what the fetch before it left behind.
    let observed = source.observations();
    assert_eq!(observed[1], (TrackState::Running, 1));
    assert_eq!(observed[2], (TrackState::Running, 1));
}

#[tokio::test]
async fn test_cancellation_discards_in_flight_result() {
    let tracker = Arc::new(JobTracker::new());
    tracker.attach().unwrap();
    tracker
        .apply_status(&status(10, true, &["one"]))
        .unwrap();

    let source = CancellingSource {
        tracker: tracker.clone(),
        fetches: AtomicUsize::new(0),
    };

    let outcome =
        poller::run(&options(10), &source, tracker.as_ref(), |_| async {}, never()).await;

    assert_eq!(outcome, PollOutcome::Cancelled);
    // The terminal snapshot the fetch returned was discarded unapplied
    assert_eq!(tracker.state(), TrackState::Running);
    assert_eq!(tracker.percent(), 10);
    assert_eq!(tracker.logs().len(), 1);
    // No further fetches after the cancellation
    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_cancellation_before_first_tick() {
    let tracker = JobTracker::new();
    tracker.attach().unwrap();
    tracker.cancel();

    let source = ScriptedSource::new(vec![Ok(status(10, true, &[]))]);

    let outcome = poller::run(&options(10), &source, &tracker, |_| async {}, never()).await;

    assert_eq!(outcome, PollOutcome::Cancelled);
    assert_eq!(source.fetch_count(), 0);
}

#[tokio::test]
async fn test_shutdown_signal_stops_the_loop() {
    let tracker = JobTracker::new();
    tracker.attach().unwrap();

    let source = ScriptedSource::new(vec![Ok(status(10, true, &[]))]);
    let ready: Pin<Box<dyn Future<Output = ()> + Send>> = Box::pin(async {});

    let outcome = poller::run(&options(10), &source, &tracker, |_| async {}, ready).await;

    assert_eq!(outcome, PollOutcome::Cancelled);
    assert!(tracker.is_cancelled());
    assert_eq!(source.fetch_count(), 0);
}

#[tokio::test]
async fn test_deadline_bounds_a_job_that_never_finishes() {
    let tracker = JobTracker::new();
    tracker.attach().unwrap();

    let source = ScriptedSource::new(vec![
        Ok(status(10, true, &["one"])),
        Ok(status(20, true, &["one", "two"])),
        Ok(status(30, true, &["one", "two", "three"])),
        Ok(status(40, true, &["one", "two", "three", "four"])),
    ]);

    let outcome = poller::run(&options(3), &source, &tracker, |_| async {}, never()).await;

    assert_eq!(outcome, PollOutcome::DeadlineExceeded);
    // No server-reported terminal state is forged
    assert_eq!(tracker.state(), TrackState::Running);
    assert_eq!(source.fetch_count(), 3);
}
