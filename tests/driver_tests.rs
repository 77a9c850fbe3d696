use autoplay_2048::config::TickFailurePolicy;
use autoplay_2048::error::AutoplayError;
use autoplay_2048::host::recording::RecordingHost;
use autoplay_2048::input::event::{KeyCode, Move};
use autoplay_2048::kernel::driver::{Autoplay, DriverConfig, TickOutcome};
use autoplay_2048::kernel::lifecycle::{DriverState, StopReason};
use autoplay_2048::planner::oracle::FnOracle;
use autoplay_2048::planner::stub::CycleOracle;
use autoplay_2048::state::snapshot::Grid;
use autoplay_2048::state::source::{MemoryStateSource, MemoryStorage, ScriptedStateSource};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

const EMPTY_BOARD: &str =
    r#"{"grid":{"size":4,"cells":[[null,null,null,null],[null,null,null,null],[null,null,null,null],[null,null,null,null]]},"score":0}"#;

fn counting_oracle(calls: Arc<AtomicUsize>) -> FnOracle<impl FnMut(&Grid) -> KeyCode + Send> {
    FnOracle::new(move |_grid: &Grid| {
        calls.fetch_add(1, Ordering::SeqCst);
        Move::Left.key_code()
    })
}

#[test]
fn test_state_machine_transitions() {
    use DriverState::*;
    assert!(Idle.can_transition_to(Running));
    assert!(Running.can_transition_to(Stopped));
    assert!(Stopped.can_transition_to(Running));
    assert!(!Idle.can_transition_to(Stopped));
    assert!(!Stopped.can_transition_to(Idle));
    assert!(!Running.can_transition_to(Idle));
}

#[tokio::test]
async fn test_single_tick_without_state_does_nothing() {
    let calls = Arc::new(AtomicUsize::new(0));
    let host = RecordingHost::default();
    let log = host.log_handle();
    let mut autoplay = Autoplay::new(
        MemoryStateSource::new(MemoryStorage::new(), "gameState"),
        counting_oracle(calls.clone()),
        host,
    );

    assert_eq!(autoplay.tick().await.unwrap(), TickOutcome::NoState);
    assert_eq!(calls.load(Ordering::SeqCst), 0, "oracle must not be consulted");
    assert!(log.lock().unwrap().delivered.is_empty(), "nothing dispatched");
}

#[tokio::test]
async fn test_single_tick_dispatches_oracle_choice() {
    let mut autoplay = Autoplay::new(
        ScriptedStateSource::new([Some(EMPTY_BOARD)]),
        CycleOracle::new(vec![Move::Down]),
        RecordingHost::default(),
    );

    let outcome = autoplay.tick().await.unwrap();
    assert_eq!(outcome, TickOutcome::Moved { key: KeyCode(40), mismatch: false });
    assert_eq!(autoplay.host().log().delivered[0].key_code(), KeyCode(40));
    assert_eq!(autoplay.stats().moves, 1);
}

#[tokio::test(start_paused = true)]
async fn test_ticks_at_interval_until_state_absent() {
    let stamps = Arc::new(Mutex::new(Vec::new()));
    let recorder = stamps.clone();
    let oracle = FnOracle::new(move |_grid: &Grid| {
        recorder.lock().unwrap().push(Instant::now());
        Move::Up.key_code()
    });

    let started = Instant::now();
    let autoplay = Autoplay::new(
        ScriptedStateSource::new([Some(EMPTY_BOARD), Some(EMPTY_BOARD), Some(EMPTY_BOARD), None]),
        oracle,
        RecordingHost::default(),
    );

    let handle = autoplay.start().unwrap();
    assert_eq!(handle.state(), DriverState::Running);

    let (autoplay, reason) = handle.join().await.unwrap();
    assert_eq!(reason, StopReason::GameStateGone);

    let stamps = stamps.lock().unwrap();
    assert_eq!(stamps.len(), 3, "one oracle call per present state");
    for (i, at) in stamps.iter().enumerate() {
        assert_eq!(*at - started, Duration::from_millis(100 * (i as u64 + 1)));
    }

    assert_eq!(autoplay.stats().ticks, 4);
    assert_eq!(autoplay.stats().moves, 3);
    assert_eq!(autoplay.source().served(), 4, "no reads after the absent one");
}

#[tokio::test(start_paused = true)]
async fn test_custom_interval() {
    let calls = Arc::new(AtomicUsize::new(0));
    let autoplay = Autoplay::new(
        ScriptedStateSource::new([Some(EMPTY_BOARD), Some(EMPTY_BOARD)]),
        counting_oracle(calls.clone()),
        RecordingHost::default(),
    )
    .with_config(DriverConfig {
        interval: Duration::from_millis(250),
        on_failure: TickFailurePolicy::Continue,
    });

    let started = Instant::now();
    let (_, reason) = autoplay.start().unwrap().join().await.unwrap();
    assert_eq!(reason, StopReason::GameStateGone);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(Instant::now() - started, Duration::from_millis(750));
}

#[tokio::test(start_paused = true)]
async fn test_stop_then_restart() {
    let storage = MemoryStorage::new();
    storage.set("gameState", EMPTY_BOARD);
    let calls = Arc::new(AtomicUsize::new(0));

    let autoplay = Autoplay::new(
        MemoryStateSource::new(storage.clone(), "gameState"),
        counting_oracle(calls.clone()),
        RecordingHost::default(),
    );

    assert_eq!(autoplay.state(), DriverState::Idle);

    let mut handle = autoplay.start().unwrap();
    assert_eq!(handle.state(), DriverState::Running);
    tokio::time::sleep(Duration::from_millis(350)).await;
    handle.stop();
    handle.stopped().await;
    assert_eq!(handle.state(), DriverState::Stopped);

    let (autoplay, reason) = handle.join().await.unwrap();
    assert_eq!(reason, StopReason::Cancelled);
    assert_eq!(autoplay.state(), DriverState::Stopped);
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    // A fresh start re-enters Running; the game has since cleared its state.
    storage.remove("gameState");
    let handle = autoplay.start().unwrap();
    assert_eq!(handle.state(), DriverState::Running);
    let (autoplay, reason) = handle.join().await.unwrap();
    assert_eq!(reason, StopReason::GameStateGone);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(autoplay.stats().ticks, 4);
    assert_eq!(autoplay.state(), DriverState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_state_fails_tick_but_loop_continues() {
    let calls = Arc::new(AtomicUsize::new(0));
    let autoplay = Autoplay::new(
        ScriptedStateSource::new([Some("{\"grid\": 12"), Some(EMPTY_BOARD), None]),
        counting_oracle(calls.clone()),
        RecordingHost::default(),
    );

    let (autoplay, reason) = autoplay.start().unwrap().join().await.unwrap();
    assert_eq!(reason, StopReason::GameStateGone);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(autoplay.stats().failed_ticks, 1);
    assert_eq!(autoplay.stats().ticks, 3);
}

#[tokio::test(start_paused = true)]
async fn test_stop_policy_ends_on_failure() {
    let calls = Arc::new(AtomicUsize::new(0));
    let autoplay = Autoplay::new(
        ScriptedStateSource::new([Some("[]"), Some(EMPTY_BOARD)]),
        counting_oracle(calls.clone()),
        RecordingHost::default(),
    )
    .with_config(DriverConfig {
        interval: Duration::from_millis(100),
        on_failure: TickFailurePolicy::Stop,
    });

    let (autoplay, reason) = autoplay.start().unwrap().join().await.unwrap();
    assert!(matches!(reason, StopReason::TickFailed(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(autoplay.stats().failed_ticks, 1);
    assert_eq!(autoplay.source().served(), 1);
}

#[tokio::test]
async fn test_mismatch_is_counted() {
    let mut autoplay = Autoplay::new(
        ScriptedStateSource::new([Some(EMPTY_BOARD)]),
        CycleOracle::default(),
        RecordingHost::default().ignoring_overrides(),
    );

    let outcome = autoplay.tick().await.unwrap();
    assert_eq!(outcome, TickOutcome::Moved { key: Move::Up.key_code(), mismatch: true });
    assert_eq!(autoplay.stats().mismatches, 1);
    assert_eq!(autoplay.host().log().warnings.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_empty_entry_stops_cleanly() {
    let calls = Arc::new(AtomicUsize::new(0));
    let autoplay = Autoplay::new(
        ScriptedStateSource::new([Some(EMPTY_BOARD), Some(""), Some(EMPTY_BOARD)]),
        counting_oracle(calls.clone()),
        RecordingHost::default(),
    );

    let (autoplay, reason) = autoplay.start().unwrap().join().await.unwrap();
    assert_eq!(reason, StopReason::GameStateGone);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(autoplay.stats().failed_ticks, 0);
    assert_eq!(autoplay.source().served(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_panicking_oracle_still_reports_stopped() {
    let autoplay = Autoplay::new(
        ScriptedStateSource::new([Some(EMPTY_BOARD)]),
        FnOracle::new(|_grid: &Grid| -> KeyCode { panic!("oracle blew up") }),
        RecordingHost::default(),
    );

    let mut handle = autoplay.start().unwrap();
    handle.stopped().await;
    assert_eq!(handle.state(), DriverState::Stopped);
    assert!(matches!(handle.join().await, Err(AutoplayError::Join(_))));
}
