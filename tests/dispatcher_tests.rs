use autoplay_2048::error::{AutoplayError, Result};
use autoplay_2048::host::recording::RecordingHost;
use autoplay_2048::input::dispatcher::{Dispatcher, EventHost};
use autoplay_2048::input::event::{InitPrimitive, KeyCode, Move, PreparedKeyEvent, SyntheticKeyEvent};
use std::future::Future;

// Normalising host whose alert cannot be shown.
struct AlertlessHost(RecordingHost);

impl EventHost for AlertlessHost {
    fn detect_primitive(&mut self) -> impl Future<Output = Result<InitPrimitive>> + Send {
        self.0.detect_primitive()
    }

    fn prepare(
        &mut self,
        event: &SyntheticKeyEvent,
        primitive: InitPrimitive,
    ) -> impl Future<Output = Result<PreparedKeyEvent>> + Send {
        self.0.prepare(event, primitive)
    }

    fn deliver(&mut self, prepared: PreparedKeyEvent) -> impl Future<Output = Result<()>> + Send {
        self.0.deliver(prepared)
    }

    fn warn(&mut self, _message: &str) -> impl Future<Output = Result<()>> + Send {
        async { Err(AutoplayError::Host("alert failed".into())) }
    }
}

#[tokio::test]
async fn test_event_reports_requested_code() {
    let host = RecordingHost::default();
    let log = host.log_handle();
    let mut dispatcher = Dispatcher::new(host);

    for code in [37, 38, 39, 40, 13, 0, 65535] {
        let report = dispatcher.press(KeyCode(code)).await.unwrap();
        assert!(report.mismatch.is_none(), "code {} should read back unchanged", code);
        assert_eq!(report.event.key_code(), KeyCode(code));
        assert_eq!(report.event.which(), KeyCode(code));
    }

    let log = log.lock().unwrap();
    assert_eq!(log.delivered.len(), 7);
    assert!(log.warnings.is_empty());
    for (event, observed) in log.delivered.iter().zip(&log.observed) {
        assert_eq!(observed.key_code, event.key_code());
        assert_eq!(observed.which, event.key_code());
    }
}

#[tokio::test]
async fn test_modifiers_and_target_are_stubbed() {
    let host = RecordingHost::default();
    let log = host.log_handle();
    let mut dispatcher = Dispatcher::new(host);

    let report = dispatcher.press(Move::Up.key_code()).await.unwrap();
    let event = &report.event;
    assert!(!event.meta_key());
    assert!(!event.shift_key());
    assert!(!event.ctrl_key());
    assert!(!event.alt_key());
    assert!(event.bubbles());
    assert!(event.cancelable());
    assert_eq!(event.event_type().as_str(), "keydown");
    assert_eq!(event.target().tag_name, "stub");

    let log = log.lock().unwrap();
    let observed = &log.observed[0];
    assert!(!observed.meta_key);
    assert!(!observed.shift_key);
    assert_eq!(observed.target_tag.as_deref(), Some("stub"));
}

#[tokio::test]
async fn test_custom_target_tag() {
    let mut dispatcher = Dispatcher::with_target_tag(RecordingHost::default(), "body-stand-in");
    let report = dispatcher.press(KeyCode(40)).await.unwrap();
    assert_eq!(report.event.target().tag_name, "body-stand-in");
}

#[tokio::test]
async fn test_mismatch_raises_warning_and_still_delivers() {
    let host = RecordingHost::new(InitPrimitive::InitKeyboardEvent).ignoring_overrides();
    let log = host.log_handle();
    let mut dispatcher = Dispatcher::new(host);

    let report = dispatcher.press(KeyCode(38)).await.unwrap();
    let mismatch = report.mismatch.expect("normalising host must be flagged");
    assert_eq!(mismatch.requested, KeyCode(38));
    assert_eq!(mismatch.key_code, KeyCode(0));

    let log = log.lock().unwrap();
    assert_eq!(log.warnings.len(), 1);
    assert!(log.warnings[0].contains("requested 38"));
    assert!(log.warnings[0].contains("got 0"));
    assert_eq!(log.delivered.len(), 1, "warning is diagnostic, delivery continues");
}

#[tokio::test]
async fn test_legacy_primitive_keeps_key_code() {
    let host = RecordingHost::new(InitPrimitive::InitKeyEvent).ignoring_overrides();
    let log = host.log_handle();
    let mut dispatcher = Dispatcher::new(host);

    let report = dispatcher.press(KeyCode(39)).await.unwrap();
    assert!(report.mismatch.is_none());
    assert_eq!(report.primitive, InitPrimitive::InitKeyEvent);
    assert!(log.lock().unwrap().warnings.is_empty());
}

#[tokio::test]
async fn test_primitive_detected_once() {
    let host = RecordingHost::new(InitPrimitive::InitKeyEvent);
    let log = host.log_handle();
    let mut dispatcher = Dispatcher::new(host);
    assert_eq!(dispatcher.primitive(), None);

    for mv in Move::ALL {
        dispatcher.press(mv.key_code()).await.unwrap();
    }

    assert_eq!(dispatcher.primitive(), Some(InitPrimitive::InitKeyEvent));
    let log = log.lock().unwrap();
    assert_eq!(log.primitive_detections, 1);
    assert_eq!(log.primitives_used, vec![InitPrimitive::InitKeyEvent; 4]);
}

#[tokio::test]
async fn test_failed_warning_does_not_block_delivery() {
    let host = RecordingHost::default().ignoring_overrides();
    let log = host.log_handle();
    let mut dispatcher = Dispatcher::new(AlertlessHost(host));

    let report = dispatcher.press(KeyCode(38)).await.unwrap();
    assert!(report.mismatch.is_some());

    let log = log.lock().unwrap();
    assert_eq!(log.delivered.len(), 1);
    assert_eq!(log.delivered[0].key_code(), KeyCode(38));
}
