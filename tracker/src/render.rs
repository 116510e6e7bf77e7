//! Terminal rendering of the job log panel

use chrono::{DateTime, Local};
use colored::Colorize;

use crate::job::state::TrackState;
use crate::models::job::{LogEntry, LogLevel};
use crate::workers::poller::PollOutcome;

/// Format one log line the way the deployer panel shows it
pub fn format_entry(entry: &LogEntry) -> String {
    let stamp = format!("[{}]", format_timestamp(entry.timestamp));
    let message = match entry.level {
        LogLevel::Error => entry.message.as_str().red().to_string(),
        LogLevel::Success => entry.message.as_str().green().to_string(),
        LogLevel::Info => entry.message.clone(),
    };
    format!("{} {}", stamp.dimmed(), message)
}

/// Progress bar shown beneath the panel
pub fn format_progress(percent: u8) -> String {
    const WIDTH: usize = 30;
    let filled = (percent as usize * WIDTH) / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(WIDTH - filled),
        percent
    )
}

/// Final banner for the tracked job
pub fn format_outcome(outcome: PollOutcome, state: TrackState) -> String {
    match outcome {
        PollOutcome::Terminal if state == TrackState::Succeeded => {
            "Deployment completed successfully.".green().bold().to_string()
        }
        PollOutcome::Terminal => {
            "Deployment failed. Check the logs above for details."
                .red()
                .bold()
                .to_string()
        }
        PollOutcome::Cancelled => {
            "Tracking cancelled. The remote job may still be running."
                .yellow()
                .to_string()
        }
        PollOutcome::DeadlineExceeded => {
            "Tracking deadline reached before the job finished."
                .yellow()
                .to_string()
        }
    }
}

/// Render epoch seconds as local wall-clock time
fn format_timestamp(epoch_secs: f64) -> String {
    DateTime::from_timestamp(epoch_secs as i64, 0)
        .map(|utc| utc.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| format!("{:.0}", epoch_secs))
}
