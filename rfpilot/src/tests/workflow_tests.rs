//! Workflow- and primitive-level behavior against the fake terminal.

use std::sync::Arc;
use std::time::Duration;

use super::{init_tracing, FakeTerminal};
use crate::config::RfOptions;
use crate::errors::AutomationError;
use crate::guard::ConnectionGuard;
use crate::primitives::RfPrimitives;
use crate::screenshot::NullScreenshotSink;
use crate::wait::WaitConfig;
use crate::workflow::{RfWorkflows, ScanMode, ASN_FIELD, INVALID_TEST_BARCODE};

fn workflows_over(fake: &Arc<FakeTerminal>, auto_accept_info: bool) -> RfWorkflows {
    let driver = fake.clone() as Arc<dyn crate::drivers::TerminalDriver>;
    let screenshots = Arc::new(NullScreenshotSink);
    let guard = Arc::new(ConnectionGuard::new(screenshots.clone()));
    let options = RfOptions {
        wait: WaitConfig {
            timeout: Duration::from_millis(200),
            interval: Duration::from_millis(5),
        },
        auto_accept_info,
        ..RfOptions::default()
    };
    RfWorkflows::new(RfPrimitives::new(driver, guard, screenshots, options))
}

#[tokio::test]
async fn submit_with_no_screen_change_is_a_timeout_error() {
    init_tracing();
    let fake = Arc::new(FakeTerminal::new("ASN: _"));
    // Nothing queued: the screen never acknowledges the input.
    let rf = workflows_over(&fake, false);
    let result = rf.scan_barcode(ASN_FIELD, "23907432", ScanMode::AutoEnter).await;
    match result {
        Err(AutomationError::ScreenTimeout(msg)) => {
            assert!(msg.contains("did not change"), "msg: {msg}")
        }
        other => panic!("expected ScreenTimeout, got {other:?}"),
    }
}

#[tokio::test]
async fn error_screens_classify_as_failures_with_the_matched_text() {
    init_tracing();
    let fake = Arc::new(FakeTerminal::new("ASN: _"));
    fake.queue_screen("Error: ASN not found");
    let rf = workflows_over(&fake, false);
    let outcome = rf
        .scan_barcode(ASN_FIELD, "99999999", ScanMode::AutoEnter)
        .await
        .unwrap();
    assert!(outcome.has_error);
    assert_eq!(outcome.message.as_deref(), Some("Error: ASN not found"));
}

#[tokio::test]
async fn info_banner_is_auto_accepted_when_enabled() {
    init_tracing();
    let fake = Arc::new(FakeTerminal::new("ASN: _"));
    fake.queue_screen("Info: ASN already partially received");
    fake.queue_screen("Item: _"); // banner accepted with Enter
    let rf = workflows_over(&fake, true);
    let outcome = rf
        .scan_barcode(ASN_FIELD, "23907432", ScanMode::AutoEnter)
        .await
        .unwrap();
    assert!(!outcome.has_error);
    assert_eq!(fake.keys(), vec!["Enter".to_string()]);
}

#[tokio::test]
async fn info_banner_is_left_alone_when_auto_accept_is_off() {
    init_tracing();
    let fake = Arc::new(FakeTerminal::new("ASN: _"));
    fake.queue_screen("Info: ASN already partially received");
    let rf = workflows_over(&fake, false);
    let outcome = rf
        .scan_barcode(ASN_FIELD, "23907432", ScanMode::AutoEnter)
        .await
        .unwrap();
    assert!(!outcome.has_error);
    assert!(outcome.message.is_some());
    assert!(fake.keys().is_empty());
}

#[tokio::test]
async fn the_invalid_test_barcode_is_never_auto_accepted() {
    init_tracing();
    let fake = Arc::new(FakeTerminal::new("ASN: _"));
    fake.queue_screen("Info: barcode queued for review");
    // Auto-accept is on, but the sentinel is excluded regardless.
    let rf = workflows_over(&fake, true);
    let outcome = rf
        .scan_barcode(ASN_FIELD, INVALID_TEST_BARCODE, ScanMode::AutoEnter)
        .await
        .unwrap();
    assert!(!outcome.has_error);
    assert!(outcome.message.is_some());
    assert!(fake.keys().is_empty());
}

#[tokio::test]
async fn scan_only_tracks_the_field_for_a_later_submit() {
    init_tracing();
    let fake = Arc::new(FakeTerminal::new("ASN: _"));
    fake.queue_screen("Item: _");
    let rf = workflows_over(&fake, false);

    rf.scan_barcode(ASN_FIELD, "23907432", ScanMode::Only)
        .await
        .unwrap();
    assert!(fake.submits().is_empty());

    rf.submit_pending_scan().await.unwrap();
    assert_eq!(fake.submits(), vec![ASN_FIELD.to_string()]);

    // The pending slot is consumed.
    assert!(matches!(
        rf.submit_pending_scan().await,
        Err(AutomationError::InvalidArgument(_))
    ));
}

#[tokio::test]
async fn read_field_reflects_the_last_filled_value() {
    init_tracing();
    let fake = Arc::new(FakeTerminal::new("ASN: _"));
    fake.queue_screen("Item: _");
    let rf = workflows_over(&fake, false);

    rf.scan_barcode(ASN_FIELD, "23907432", ScanMode::AutoEnter)
        .await
        .unwrap();
    assert_eq!(
        rf.primitives().read_field(ASN_FIELD).await.unwrap(),
        "23907432"
    );
    // A field nothing ever filled reads back empty.
    assert_eq!(rf.primitives().read_field("lot").await.unwrap(), "");
}

#[tokio::test]
async fn navigation_fails_when_the_expected_marker_is_missing() {
    init_tracing();
    let fake = Arc::new(FakeTerminal::new("RF Main Menu\nmenu-search: _"));
    fake.queue_screen("Search results\nReceive ASN");
    // Wrong screen: valid-looking, no error keyword, no RCV marker.
    fake.queue_screen("LDG020 Load Trailer\nTrailer: _");
    let rf = workflows_over(&fake, false);

    let result = rf
        .navigate_to_menu_by_search("Receive ASN", Some("RCV"))
        .await;
    match result {
        Err(AutomationError::UiError(msg)) => assert!(msg.contains("RCV"), "msg: {msg}"),
        other => panic!("expected UiError, got {other:?}"),
    }
}

#[tokio::test]
async fn guarded_primitives_fail_fast_once_the_guard_trips() {
    init_tracing();
    let fake = Arc::new(FakeTerminal::new("ASN: _"));
    fake.queue_screen("Item: _");
    let rf = workflows_over(&fake, false);

    rf.primitives().guard().trip("connection was reset").await;
    let result = rf.scan_barcode(ASN_FIELD, "23907432", ScanMode::AutoEnter).await;
    assert!(matches!(result, Err(AutomationError::ConnectionLost(_))));
    // The action never reached the terminal.
    assert!(fake.fills().is_empty());
}

#[tokio::test]
async fn frame_teardown_during_the_wait_counts_as_acknowledgement() {
    init_tracing();
    let fake = Arc::new(FakeTerminal::new("ASN: _"));
    let rf = workflows_over(&fake, false);
    // The submit triggers a navigation that briefly detaches the frame;
    // no queued screen, so only the teardown signals the change. One
    // successful read happens first: the pre-action snapshot.
    fake.fail_frame_read_after(1, "Execution context was destroyed during navigation");

    let outcome = rf
        .scan_barcode(ASN_FIELD, "23907432", ScanMode::AutoEnter)
        .await
        .unwrap();
    assert!(!outcome.has_error);
}
