//! Main application run loop

use std::future::Future;
use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::app::options::AppOptions;
use crate::errors::TrackerError;
use crate::http::client::HttpClient;
use crate::http::deploy::JobStatusEndpoint;
use crate::job::state::TrackState;
use crate::job::tracker::JobTracker;
use crate::models::request::DeploymentRequest;
use crate::render;
use crate::workers::poller;
use crate::workers::poller::PollOutcome;

/// Track one deployment job to completion, rendering logs to stdout
///
/// Starts the job, spawns the poll worker, and streams log lines as the
/// tracker applies updates. The shutdown future cancels tracking only; the
/// remote job keeps executing server-side. Returns the final tracked state.
pub async fn run(
    options: AppOptions,
    request: DeploymentRequest,
    token: SecretString,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<TrackState, TrackerError> {
    options.validate()?;

    let client = Arc::new(HttpClient::with_timeout(
        &options.backend_base_url,
        options.request_timeout,
    )?);
    let tracker = Arc::new(JobTracker::new());

    let job_id = tracker.start(client.as_ref(), &request, &token).await?;
    info!(job = %job_id, "Tracking deployment job");

    // Relay the caller's shutdown future onto a broadcast channel
    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);
    let relay_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        shutdown_signal.await;
        let _ = relay_tx.send(());
    });

    // Poll worker
    let source = JobStatusEndpoint::new(client.clone(), token);
    let poll_tracker = tracker.clone();
    let poll_options = options.poller.clone();
    let mut poll_shutdown_rx = shutdown_tx.subscribe();
    let mut poll_handle = tokio::spawn(async move {
        poller::run(
            &poll_options,
            &source,
            poll_tracker.as_ref(),
            tokio::time::sleep,
            Box::pin(async move {
                let _ = poll_shutdown_rx.recv().await;
            }),
        )
        .await
    });

    // Stream log lines as the tracker applies updates
    let mut watch_rx = tracker.watch();
    let mut rendered = 0usize;
    let joined = loop {
        let fresh = tracker.logs_since(rendered);
        for entry in &fresh {
            println!("{}", render::format_entry(entry));
        }
        rendered += fresh.len();

        tokio::select! {
            joined = &mut poll_handle => break joined,
            changed = watch_rx.changed() => {
                if changed.is_err() {
                    break (&mut poll_handle).await;
                }
            }
        }
    };
    let outcome =
        joined.map_err(|e| TrackerError::StateError(format!("poll worker panicked: {}", e)))?;

    // Drain whatever arrived with the final tick
    for entry in &tracker.logs_since(rendered) {
        println!("{}", render::format_entry(entry));
    }

    println!("{}", render::format_progress(tracker.percent()));
    println!("{}", render::format_outcome(outcome, tracker.state()));

    match outcome {
        PollOutcome::Cancelled => {
            info!("Tracking cancelled; the remote job may still be running")
        }
        PollOutcome::DeadlineExceeded => {
            warn!("Gave up waiting for a terminal status")
        }
        PollOutcome::Terminal => {}
    }

    Ok(tracker.state())
}
