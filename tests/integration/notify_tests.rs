//! Integration tests for the notification throttler and message catalog.

use crate::mock_hw::{MockCourier, MockLink};

use sumpguard::app::ports::DeliveryError;
use sumpguard::events::{EventKind, SumpEvent};
use sumpguard::notify::{EventMessage, Notifier, NotifyOutcome, SeverityTier, BODY_CAPACITY};
use sumpguard::sensors::FloatStates;

const PERIOD: u32 = 3_600_000;

#[test]
fn repeat_inside_window_is_suppressed() {
    let mut notifier = Notifier::new();
    let mut link = MockLink::up();
    let mut courier = MockCourier::new();

    let first = notifier.notify(&SumpEvent::Backup, 1_000, PERIOD, &mut link, &mut courier);
    let second = notifier.notify(&SumpEvent::Backup, 1_000 + PERIOD - 1, PERIOD, &mut link, &mut courier);

    assert_eq!(first, NotifyOutcome::Delivered);
    assert_eq!(second, NotifyOutcome::Suppressed);
    assert!(second.is_success(), "suppression is not a failure");
    assert_eq!(courier.attempts.len(), 1);
}

#[test]
fn repeat_after_window_is_delivered() {
    let mut notifier = Notifier::new();
    let mut link = MockLink::up();
    let mut courier = MockCourier::new();

    notifier.notify(&SumpEvent::Backup, 1_000, PERIOD, &mut link, &mut courier);
    notifier.notify(&SumpEvent::Backup, 1_000 + PERIOD, PERIOD, &mut link, &mut courier);
    assert_eq!(courier.attempts.len(), 2);
}

#[test]
fn different_kind_is_never_throttled() {
    let mut notifier = Notifier::new();
    let mut link = MockLink::up();
    let mut courier = MockCourier::new();

    notifier.notify(&SumpEvent::Backup, 0, PERIOD, &mut link, &mut courier);
    notifier.notify(&SumpEvent::Flood, 1, PERIOD, &mut link, &mut courier);
    notifier.notify(&SumpEvent::Backup, 2, PERIOD, &mut link, &mut courier);
    assert_eq!(
        courier.kinds(),
        [EventKind::Backup, EventKind::Flood, EventKind::Backup]
    );
}

#[test]
fn failed_send_still_starts_the_window() {
    let mut notifier = Notifier::new();
    let mut link = MockLink::up();
    let mut courier = MockCourier {
        fail_with: Some(DeliveryError::HttpStatus(500)),
        ..MockCourier::default()
    };

    let first = notifier.notify(&SumpEvent::Flood, 0, PERIOD, &mut link, &mut courier);
    assert_eq!(first, NotifyOutcome::Failed(DeliveryError::HttpStatus(500)));
    assert!(!first.is_success());

    courier.fail_with = None;
    let retry = notifier.notify(&SumpEvent::Flood, 1_000, PERIOD, &mut link, &mut courier);
    assert_eq!(retry, NotifyOutcome::Suppressed);
    assert_eq!(courier.attempts.len(), 1);
}

#[test]
fn no_link_records_attempt_without_delivery() {
    let mut notifier = Notifier::new();
    let mut link = MockLink::down();
    let mut courier = MockCourier::new();

    let outcome = notifier.notify(&SumpEvent::Dry, 0, PERIOD, &mut link, &mut courier);
    assert_eq!(outcome, NotifyOutcome::Failed(DeliveryError::NoConnectivity));
    assert_eq!(link.ensure_calls, 1);
    assert!(courier.attempts.is_empty());
    assert_eq!(notifier.throttle().last(), Some((EventKind::Dry, 0)));
}

#[test]
fn throttle_window_survives_clock_wrap() {
    let mut notifier = Notifier::new();
    let mut link = MockLink::up();
    let mut courier = MockCourier::new();

    let before_wrap = u32::MAX - 1_000;
    notifier.notify(&SumpEvent::Sump, before_wrap, PERIOD, &mut link, &mut courier);
    let outcome = notifier.notify(&SumpEvent::Sump, 5_000, PERIOD, &mut link, &mut courier);
    assert_eq!(outcome, NotifyOutcome::Suppressed);
}

#[test]
fn catalog_tiers_follow_severity() {
    let tiers: Vec<SeverityTier> = EventKind::ALL
        .iter()
        .map(|k| EventMessage::compose(&SumpEvent::from_kind(*k)).tier)
        .collect();
    assert_eq!(
        tiers,
        [
            SeverityTier::Info,
            SeverityTier::Info,
            SeverityTier::Info,
            SeverityTier::Warning,
            SeverityTier::Warning,
            SeverityTier::Critical,
        ]
    );
}

#[test]
fn bad_state_body_carries_snapshot() {
    let msg = EventMessage::compose(&SumpEvent::BadState(FloatStates::new(false, false, true)));
    assert_eq!(msg.subject.as_str(), "Floats report bad state");
    assert!(msg.body.ends_with("sump=OFF backup=OFF flood=ON"));
    assert!(msg.body.len() <= BODY_CAPACITY);
}
