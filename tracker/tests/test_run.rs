//! End-to-end run loop tests against a mock orchestrator

use std::time::Duration;

use mockito::Server;
use secrecy::SecretString;
use tokio_test::assert_ok;

use skylift::app::options::AppOptions;
use skylift::app::run::run;
use skylift::job::state::TrackState;
use skylift::models::request::DeploymentRequest;

fn sample_request() -> DeploymentRequest {
    let mut request = DeploymentRequest::new();
    request.insert("vercel_token", "v-1");
    request
}

fn fast_options(base_url: String) -> AppOptions {
    let mut options = AppOptions::default();
    options.backend_base_url = base_url;
    options.poller.interval = Duration::from_millis(5);
    options
}

#[tokio::test]
async fn test_run_tracks_job_to_success() {
    let mut server = Server::new_async().await;
    let _start = server
        .mock("POST", "/deploy")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message": "Deployment started"}"#)
        .create_async()
        .await;
    let _status = server
        .mock("GET", "/logs")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "progress": 100,
                "is_running": false,
                "logs": [
                    {"timestamp": 1700000000.0, "level": "INFO", "message": "provisioning db"},
                    {"timestamp": 1700000001.0, "level": "INFO", "message": "configuring hosting"},
                    {"timestamp": 1700000002.0, "level": "SUCCESS", "message": "deployment complete"}
                ]
            }"#,
        )
        .create_async()
        .await;

    let state = assert_ok!(
        run(
            fast_options(server.url()),
            sample_request(),
            SecretString::from("tok".to_string()),
            std::future::pending(),
        )
        .await
    );

    assert_eq!(state, TrackState::Succeeded);
}

#[tokio::test]
async fn test_run_surfaces_failed_job_as_state() {
    let mut server = Server::new_async().await;
    let _start = server
        .mock("POST", "/deploy")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message": "Deployment started"}"#)
        .create_async()
        .await;
    let _status = server
        .mock("GET", "/logs")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "progress": -1,
                "is_running": false,
                "logs": [
                    {"timestamp": 1700000000.0, "level": "ERROR", "message": "database setup failed"}
                ]
            }"#,
        )
        .create_async()
        .await;

    // A failed job is a normal outcome, not an error
    let state = assert_ok!(
        run(
            fast_options(server.url()),
            sample_request(),
            SecretString::from("tok".to_string()),
            std::future::pending(),
        )
        .await
    );

    assert_eq!(state, TrackState::Failed);
}

#[tokio::test]
async fn test_run_fails_fast_when_start_rejected() {
    let mut server = Server::new_async().await;
    let _start = server
        .mock("POST", "/deploy")
        .with_status(400)
        .with_body("Deployment already in progress")
        .create_async()
        .await;

    let result = run(
        fast_options(server.url()),
        sample_request(),
        SecretString::from("tok".to_string()),
        std::future::pending(),
    )
    .await;

    assert!(result.is_err());
}
