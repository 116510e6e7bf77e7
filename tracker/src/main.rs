//! Skylift Tracker - Entry Point
//!
//! Command line client that starts a cloud provisioning job and tracks it
//! to completion, streaming the orchestrator's logs to the terminal.

use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use secrecy::SecretString;
use tracing::{error, info};

use skylift::app::options::AppOptions;
use skylift::app::run::run;
use skylift::errors::TrackerError;
use skylift::job::state::TrackState;
use skylift::logs::{init_logging, LogOptions};
use skylift::models::request::DeploymentRequest;
use skylift::utils::version_info;

#[tokio::main]
async fn main() -> ExitCode {
    ExitCode::from(run_cli().await)
}

async fn run_cli() -> u8 {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    let version = version_info();
    if cli_args.contains_key("version") {
        println!("{}", serde_json::to_string_pretty(&version).unwrap());
        return 0;
    }

    if cli_args.contains_key("help") {
        print_usage();
        return 0;
    }

    // Initialize logging
    let verbosity = cli_args
        .get("log-level")
        .and_then(|s| s.parse().ok())
        .unwrap_or_default();
    let log_options = LogOptions {
        verbosity,
        log_dir: cli_args.get("log-dir").map(Into::into),
        ..Default::default()
    };
    let _log_guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            None
        }
    };

    // Load the credential bag
    let Some(credentials_path) = cli_args.get("credentials") else {
        error!("Missing --credentials=<file>");
        print_usage();
        return 2;
    };
    let request = match load_credentials(Path::new(credentials_path)) {
        Ok(request) => request,
        Err(e) => {
            error!("Unable to read credentials file: {}", e);
            return 2;
        }
    };

    let token = SecretString::from(cli_args.get("token").cloned().unwrap_or_default());

    // Assemble options
    let mut options = AppOptions::default();
    if let Some(url) = cli_args.get("backend") {
        options.backend_base_url = url.clone();
    }
    if let Some(raw) = cli_args.get("interval-ms") {
        match raw.parse::<u64>() {
            Ok(ms) if ms > 0 => options.poller.interval = Duration::from_millis(ms),
            _ => {
                error!("Invalid --interval-ms value: {}", raw);
                return 2;
            }
        }
    }
    if let Some(raw) = cli_args.get("max-secs") {
        match raw.parse::<u64>() {
            // 0 disables the tracking deadline
            Ok(0) => options.poller.max_duration = None,
            Ok(secs) => options.poller.max_duration = Some(Duration::from_secs(secs)),
            Err(_) => {
                error!("Invalid --max-secs value: {}", raw);
                return 2;
            }
        }
    }

    info!("Running Skylift tracker against {}", options.backend_base_url);
    match run(options, request, token, await_shutdown_signal()).await {
        Ok(TrackState::Succeeded) => 0,
        Ok(state) => {
            info!("Final state: {:?}", state);
            1
        }
        Err(e) => {
            error!("Failed to track deployment: {e}");
            1
        }
    }
}

fn load_credentials(path: &Path) -> Result<DeploymentRequest, TrackerError> {
    let raw = std::fs::read_to_string(path)?;
    let request: DeploymentRequest = serde_json::from_str(&raw)?;
    if request.is_empty() {
        return Err(TrackerError::ConfigError(
            "credentials file has no entries".to_string(),
        ));
    }
    Ok(request)
}

fn print_usage() {
    println!("Usage: skylift --credentials=<file> [options]");
    println!();
    println!("Starts a cloud provisioning job and tracks it to completion,");
    println!("streaming the orchestrator's logs to the terminal.");
    println!();
    println!("Options:");
    println!("  --credentials=<file>   JSON file with the provider credential bag");
    println!("  --backend=<url>        Orchestrator base URL (default http://localhost:8001)");
    println!("  --token=<token>        Bearer token forwarded to the orchestrator");
    println!("  --interval-ms=<n>      Poll interval in milliseconds (default 1000)");
    println!("  --max-secs=<n>         Tracking deadline in seconds, 0 to disable (default 3600)");
    println!("  --log-dir=<dir>        Also write diagnostics to a rolling file");
    println!("  --log-level=<level>    trace|debug|info|warn|error (default info)");
    println!("  --version              Print version information");
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).unwrap();
        let mut sigint = signal(SignalKind::interrupt()).unwrap();

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
        info!("Ctrl+C received, shutting down...");
    }
}
