//! Progress state machine unit tests

use skylift::job::state::{ProgressState, TrackState};

#[test]
fn test_initial_state() {
    let state = ProgressState::new();
    assert_eq!(state.state(), TrackState::Idle);
    assert_eq!(state.progress(), 0);
    assert_eq!(state.percent(), 0);
}

#[test]
fn test_success_flow() {
    let mut state = ProgressState::new();

    // Idle -> Running
    state.begin().unwrap();
    assert_eq!(state.state(), TrackState::Running);

    // Running stays Running while the job executes
    assert_eq!(state.observe(25, true).unwrap(), TrackState::Running);
    assert_eq!(state.observe(75, true).unwrap(), TrackState::Running);

    // Running -> Succeeded
    assert_eq!(state.observe(100, false).unwrap(), TrackState::Succeeded);
    assert!(state.state().is_terminal());
}

#[test]
fn test_failure_flow() {
    let mut state = ProgressState::new();

    state.begin().unwrap();
    assert_eq!(state.observe(-1, false).unwrap(), TrackState::Failed);
    assert!(state.state().is_terminal());

    // The sentinel is a signal, not a display value
    assert_eq!(state.progress(), -1);
    assert_eq!(state.percent(), 0);
}

#[test]
fn test_terminal_requires_running_flag_down() {
    let mut state = ProgressState::new();
    state.begin().unwrap();

    // Reaching 100 while still running is not terminal
    assert_eq!(state.observe(100, true).unwrap(), TrackState::Running);
    assert_eq!(state.observe(100, false).unwrap(), TrackState::Succeeded);
}

#[test]
fn test_restart_after_reset() {
    let mut state = ProgressState::new();

    state.begin().unwrap();
    state.observe(-1, false).unwrap();
    assert_eq!(state.state(), TrackState::Failed);

    // No path back to Running without an explicit reset
    assert!(state.begin().is_err());

    state.reset().unwrap();
    state.begin().unwrap();
    assert_eq!(state.state(), TrackState::Running);
    assert_eq!(state.percent(), 0);
}

#[test]
fn test_invalid_transitions() {
    let mut state = ProgressState::new();

    // Cannot observe or reset before a job starts
    assert!(state.observe(10, true).is_err());
    assert!(state.reset().is_err());

    state.begin().unwrap();
    assert!(state.begin().is_err());

    state.observe(100, false).unwrap();
    assert!(state.observe(10, true).is_err());
}
