//! Integration tests for the AppService → floats → drive FSM → outputs
//! pipeline, with notifications flushed through mock collaborators.

use crate::mock_hw::{MockCourier, MockHardware, MockLink, RecordingSink, StaticConfigSource};

use sumpguard::app::commands::AppCommand;
use sumpguard::app::events::AppEvent;
use sumpguard::app::ports::ConfigError;
use sumpguard::app::service::AppService;
use sumpguard::config::{ConfigPatch, SystemConfig};
use sumpguard::drivers::button::ButtonLatch;
use sumpguard::events::EventKind;
use sumpguard::fsm::StateId;
use sumpguard::notify::{NotifyOutcome, SeverityTier};
use sumpguard::sensors::FloatStates;

const MIN: u32 = 60_000;

/// Single-sample debounce keeps the scenarios short.
fn fast_config() -> SystemConfig {
    SystemConfig {
        debounce_confirm_count: 1,
        ..SystemConfig::default()
    }
}

fn monitoring_app(config: SystemConfig) -> (AppService, MockHardware, RecordingSink) {
    let mut app = AppService::new(config).unwrap();
    let hw = MockHardware::new();
    let mut sink = RecordingSink::new();
    app.start(&mut sink);
    app.complete_setup(0, &mut sink);
    (app, hw, sink)
}

fn flush(app: &mut AppService, now: u32, courier: &mut MockCourier, sink: &mut RecordingSink) {
    let mut link = MockLink::up();
    app.flush_notifications(now, &mut link, courier, sink);
}

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn relay_held_off_until_setup_completes() {
    let mut app = AppService::new(fast_config()).unwrap();
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::new();
    app.start(&mut sink);
    assert_eq!(app.state(), StateId::Initializing);

    hw.set_floats(true, true, false);
    app.tick(0, &mut hw, &mut sink);
    assert!(!hw.relay, "no pumping before setup");

    app.complete_setup(1_000, &mut sink);
    app.tick(1_000, &mut hw, &mut sink);
    assert_eq!(app.state(), StateId::Pumping);
    assert!(hw.relay);
}

#[test]
fn reset_notification_sent_after_setup() {
    let (mut app, _hw, mut sink) = monitoring_app(fast_config());
    let mut courier = MockCourier::new();
    flush(&mut app, 0, &mut courier, &mut sink);

    assert_eq!(courier.kinds(), [EventKind::Reset]);
    assert_eq!(courier.attempts[0].subject, "Sump monitor reset");
    assert_eq!(courier.attempts[0].tier, SeverityTier::Info);
}

// ── Drive rules ───────────────────────────────────────────────

#[test]
fn backup_turns_relay_on_same_tick_and_alarms() {
    let (mut app, mut hw, mut sink) = monitoring_app(fast_config());
    hw.set_floats(true, true, false);
    app.tick(1_000, &mut hw, &mut sink);

    assert_eq!(app.state(), StateId::Pumping);
    assert!(hw.relay);
    assert!(hw.indicator);
    assert_eq!(app.active_alarm(), Some(EventKind::Backup));
    assert!(sink.events.contains(&AppEvent::AlarmRaised(EventKind::Backup)));
    assert!(sink.events.contains(&AppEvent::StateChanged {
        from: StateId::Monitoring,
        to: StateId::Pumping,
    }));

    let mut courier = MockCourier::new();
    flush(&mut app, 1_000, &mut courier, &mut sink);
    assert_eq!(courier.kinds(), [EventKind::Reset, EventKind::Backup]);
    assert_eq!(courier.attempts[1].subject, "Backup sump pump activated");
    assert_eq!(courier.attempts[1].tier, SeverityTier::Warning);
}

#[test]
fn flood_escalates_while_pumping() {
    let (mut app, mut hw, mut sink) = monitoring_app(fast_config());
    hw.set_floats(true, true, false);
    app.tick(1_000, &mut hw, &mut sink);
    hw.set_floats(true, true, true);
    app.tick(2_000, &mut hw, &mut sink);

    assert_eq!(app.active_alarm(), Some(EventKind::Flood));
    let mut courier = MockCourier::new();
    flush(&mut app, 2_000, &mut courier, &mut sink);
    assert_eq!(
        courier.kinds(),
        [EventKind::Reset, EventKind::Backup, EventKind::Flood]
    );
    assert_eq!(courier.attempts[2].tier, SeverityTier::Critical);
}

#[test]
fn lower_alarm_never_downgrades_active_one() {
    let (mut app, mut hw, mut sink) = monitoring_app(fast_config());
    hw.set_floats(true, true, true);
    app.tick(1_000, &mut hw, &mut sink);
    assert_eq!(app.active_alarm(), Some(EventKind::Flood));

    // Flood drops back, backup still wet.
    hw.set_floats(true, true, false);
    app.tick(2_000, &mut hw, &mut sink);
    assert_eq!(app.active_alarm(), Some(EventKind::Flood));
    assert!(hw.relay);
}

#[test]
fn sump_off_while_pumping_stops_relay_and_clears_alarm() {
    let (mut app, mut hw, mut sink) = monitoring_app(fast_config());
    hw.set_floats(true, true, false);
    app.tick(1_000, &mut hw, &mut sink);
    sink.clear();

    hw.set_floats(false, false, false);
    app.tick(2_000, &mut hw, &mut sink);

    assert_eq!(app.state(), StateId::Monitoring);
    assert!(!hw.relay);
    assert!(!app.is_alarm_active());
    assert!(!hw.indicator);
    assert!(sink.events.contains(&AppEvent::AlarmCleared));
}

#[test]
fn sump_only_never_energises_relay() {
    let (mut app, mut hw, mut sink) = monitoring_app(fast_config());
    hw.set_floats(true, false, false);
    for t in 1..=10 {
        app.tick(t * 1_000, &mut hw, &mut sink);
        assert!(!hw.relay);
    }
    assert_eq!(app.state(), StateId::Monitoring);
    assert!(!app.is_alarm_active());
}

#[test]
fn runtime_cutoff_forces_rest_in_pumping_band() {
    let config = fast_config();
    let max = config.max_pump_run_time_ms;
    let (mut app, mut hw, mut sink) = monitoring_app(config);

    hw.set_floats(true, true, false);
    app.tick(0, &mut hw, &mut sink);
    assert_eq!(app.state(), StateId::Pumping);

    // Backup recedes, sump stays wet: pumping band.
    hw.set_floats(true, false, false);
    let mut t = 1_000;
    while t < max {
        app.tick(t, &mut hw, &mut sink);
        assert!(hw.relay, "relay must stay on at t={t}");
        t += 1_000;
    }

    app.tick(max, &mut hw, &mut sink);
    assert!(!hw.relay);
    assert_eq!(app.state(), StateId::Monitoring);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::SafetyCutoff { .. })), 1);
    assert_eq!(app.active_alarm(), Some(EventKind::Backup), "cutoff keeps the alarm");

    app.tick(max + 1_000, &mut hw, &mut sink);
    assert!(!hw.relay, "sump-only water does not restart the pump");
}

#[test]
fn relay_only_written_on_change() {
    let (mut app, mut hw, mut sink) = monitoring_app(fast_config());
    for t in 0..5 {
        app.tick(t * 1_000, &mut hw, &mut sink);
    }
    assert_eq!(hw.relay_writes(), 1);
}

#[test]
fn failed_output_write_is_retried() {
    let (mut app, mut hw, mut sink) = monitoring_app(fast_config());
    hw.fail_writes = true;
    hw.set_floats(true, true, false);
    app.tick(0, &mut hw, &mut sink);
    assert!(!hw.relay);

    hw.fail_writes = false;
    app.poll_outputs(10, &mut hw);
    assert!(hw.relay);
}

#[test]
fn unreadable_float_does_not_stop_the_tick() {
    let (mut app, mut hw, mut sink) = monitoring_app(fast_config());
    hw.set_floats(true, true, false);
    app.tick(0, &mut hw, &mut sink);

    hw.unreadable = Some(sumpguard::sensors::Level::Backup);
    hw.set_floats(true, false, false);
    app.tick(1_000, &mut hw, &mut sink);
    assert!(app.float_states().is_on(sumpguard::sensors::Level::Backup));
    assert!(hw.relay);
}

// ── Plausibility ──────────────────────────────────────────────

#[test]
fn bad_state_reported_once_per_tick_with_snapshot() {
    let (mut app, mut hw, mut sink) = monitoring_app(fast_config());
    hw.set_floats(false, true, false);
    for t in 0..3 {
        app.tick(t * 1_000, &mut hw, &mut sink);
    }

    let snapshot = FloatStates::new(false, true, false);
    assert_eq!(sink.count(|e| *e == AppEvent::SensorFault(snapshot)), 3);
    assert!(hw.relay, "backup still drives the pump on raw data");

    let mut courier = MockCourier::new();
    flush(&mut app, 3_000, &mut courier, &mut sink);
    let bad = courier
        .attempts
        .iter()
        .find(|d| d.kind == EventKind::BadState)
        .unwrap();
    assert!(bad.body.ends_with("sump=OFF backup=ON flood=OFF"));
    assert_eq!(courier.kinds().iter().filter(|k| **k == EventKind::BadState).count(), 1);
}

// ── Dry tracker ───────────────────────────────────────────────

#[test]
fn dry_then_refill_notifies_once_each() {
    let config = SystemConfig {
        dry_age_notify_ms: MIN,
        ..fast_config()
    };
    let (mut app, mut hw, mut sink) = monitoring_app(config);
    let mut courier = MockCourier::new();

    let mut t = 0;
    while t <= 3 * MIN {
        app.tick(t, &mut hw, &mut sink);
        flush(&mut app, t, &mut courier, &mut sink);
        t += 10_000;
    }
    assert!(app.is_dry());

    hw.set_floats(true, false, false);
    app.tick(t, &mut hw, &mut sink);
    app.tick(t + 1_000, &mut hw, &mut sink);
    flush(&mut app, t + 1_000, &mut courier, &mut sink);
    assert!(!app.is_dry());

    assert_eq!(
        courier.kinds(),
        [EventKind::Reset, EventKind::Dry, EventKind::Sump]
    );
}

// ── Notifications ─────────────────────────────────────────────

#[test]
fn delivery_failure_is_absorbed() {
    let (mut app, mut hw, mut sink) = monitoring_app(fast_config());
    let mut link = MockLink::down();
    let mut courier = MockCourier::new();

    let handled = app.flush_notifications(0, &mut link, &mut courier, &mut sink);
    assert_eq!(handled, 1);
    assert!(courier.attempts.is_empty());
    assert_eq!(app.pending_notifications(), 0);
    assert!(sink.events.contains(&AppEvent::Notification {
        kind: EventKind::Reset,
        outcome: NotifyOutcome::Failed(sumpguard::app::ports::DeliveryError::NoConnectivity),
    }));

    hw.set_floats(true, true, false);
    app.tick(1_000, &mut hw, &mut sink);
    assert!(hw.relay, "control keeps running without a network");
}

// ── Manual control ────────────────────────────────────────────

#[test]
fn button_acknowledges_active_alarm() {
    let (mut app, mut hw, mut sink) = monitoring_app(fast_config());
    let latch = ButtonLatch::new();
    hw.set_floats(true, true, false);
    app.tick(0, &mut hw, &mut sink);
    assert!(hw.buzzer);

    assert!(latch.on_edge(100));
    assert!(app.poll_button(&latch, 100, &mut sink));
    app.poll_outputs(100, &mut hw);

    assert!(!app.is_alarm_active());
    assert!(!hw.buzzer);
    assert!(!hw.indicator);
    assert!(hw.relay, "acknowledging does not stop the pump");
    assert!(latch.is_armed());

    app.tick(1_000, &mut hw, &mut sink);
    assert!(!app.is_alarm_active(), "same-level water does not re-raise");
}

#[test]
fn button_without_alarm_runs_self_test() {
    let config = fast_config();
    let duration = config.pump_test_duration_ms;
    let (mut app, mut hw, mut sink) = monitoring_app(config);
    let latch = ButtonLatch::new();
    app.tick(0, &mut hw, &mut sink);

    latch.on_edge(500);
    assert!(app.poll_button(&latch, 500, &mut sink));
    assert!(sink.events.contains(&AppEvent::SelfTest));

    app.poll_outputs(500, &mut hw);
    assert!(hw.buzzer);
    assert!(hw.indicator);

    app.tick(1_000, &mut hw, &mut sink);
    assert!(hw.relay, "pump test run");
    app.tick(1_000 + duration - 1, &mut hw, &mut sink);
    assert!(hw.relay);
    app.tick(1_000 + duration, &mut hw, &mut sink);
    assert!(!hw.relay);
    assert_eq!(app.state(), StateId::Monitoring);
}

#[test]
fn self_test_while_pumping_cannot_override_cutoff_rest() {
    let config = fast_config();
    let max = config.max_pump_run_time_ms;
    let (mut app, mut hw, mut sink) = monitoring_app(config);
    let latch = ButtonLatch::new();

    hw.set_floats(true, true, false);
    app.tick(0, &mut hw, &mut sink);
    assert_eq!(app.state(), StateId::Pumping);

    // First press acknowledges, second runs the self-test.
    latch.on_edge(100);
    assert!(app.poll_button(&latch, 100, &mut sink));
    latch.on_edge(200);
    assert!(app.poll_button(&latch, 200, &mut sink));
    assert!(sink.events.contains(&AppEvent::SelfTest));

    hw.set_floats(true, false, false);
    let mut t = 1_000;
    while t < max {
        app.tick(t, &mut hw, &mut sink);
        t += 1_000;
    }
    app.tick(max, &mut hw, &mut sink);
    assert!(!hw.relay);
    assert_eq!(app.state(), StateId::Monitoring);

    for n in 1..=10 {
        app.tick(max + n * 1_000, &mut hw, &mut sink);
        assert!(!hw.relay, "relay re-energised {n}s after cutoff");
    }
}

#[test]
fn self_test_during_initializing_requests_no_pump_run() {
    let mut app = AppService::new(fast_config()).unwrap();
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::new();
    app.start(&mut sink);

    app.handle_command(AppCommand::RunSelfTest, 0, &mut sink);
    assert!(sink.events.contains(&AppEvent::SelfTest));

    app.complete_setup(1_000, &mut sink);
    app.tick(1_000, &mut hw, &mut sink);
    assert!(!hw.relay, "press before setup is not replayed");
    app.tick(2_000, &mut hw, &mut sink);
    assert!(!hw.relay);
    assert_eq!(app.state(), StateId::Monitoring);
}

#[test]
fn no_press_means_no_action() {
    let (mut app, _hw, mut sink) = monitoring_app(fast_config());
    let latch = ButtonLatch::new();
    sink.clear();
    assert!(!app.poll_button(&latch, 0, &mut sink));
    assert!(sink.events.is_empty());
}

// ── Configuration ─────────────────────────────────────────────

#[test]
fn remote_patch_applied_whole() {
    let (mut app, _hw, mut sink) = monitoring_app(fast_config());
    let mut source = StaticConfigSource {
        patch: Some(ConfigPatch {
            debounce_confirm_count: Some(5),
            max_pump_run_time_ms: Some(5 * MIN),
            ..ConfigPatch::default()
        }),
        fetches: 0,
    };

    assert!(app.refresh_config(&mut source, &mut sink));
    assert_eq!(app.config().debounce_confirm_count, 5);
    assert_eq!(app.config().max_pump_run_time_ms, 5 * MIN);
    assert!(sink.events.contains(&AppEvent::ConfigApplied));
}

#[test]
fn invalid_patch_keeps_previous_config() {
    let (mut app, _hw, mut sink) = monitoring_app(fast_config());
    let before = app.config().clone();
    let mut source = StaticConfigSource {
        patch: Some(ConfigPatch {
            debounce_confirm_count: Some(0),
            max_pump_run_time_ms: Some(5 * MIN),
            ..ConfigPatch::default()
        }),
        fetches: 0,
    };

    assert!(!app.refresh_config(&mut source, &mut sink));
    assert_eq!(*app.config(), before, "no field of a rejected patch lands");
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::ConfigRejected(ConfigError::ValidationFailed(_)))),
        1
    );
}

#[test]
fn missing_patch_is_not_an_error() {
    let (mut app, _hw, mut sink) = monitoring_app(fast_config());
    let mut source = StaticConfigSource::default();
    assert!(!app.refresh_config(&mut source, &mut sink));
    assert_eq!(source.fetches, 1);
    assert_eq!(*app.config(), fast_config());
}

#[test]
fn debounce_width_change_takes_effect_next_tick() {
    let (mut app, mut hw, mut sink) = monitoring_app(fast_config());
    app.apply_patch(
        &ConfigPatch {
            debounce_confirm_count: Some(3),
            ..ConfigPatch::default()
        },
        &mut sink,
    )
    .unwrap();

    hw.set_floats(true, true, false);
    app.tick(1_000, &mut hw, &mut sink);
    app.tick(2_000, &mut hw, &mut sink);
    assert!(!hw.relay, "two samples do not confirm at width 3");
    app.tick(3_000, &mut hw, &mut sink);
    assert!(hw.relay);
}
