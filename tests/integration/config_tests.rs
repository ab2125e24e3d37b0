//! Integration tests for remote configuration patches.

use sumpguard::app::ports::ConfigError;
use sumpguard::config::{ConfigPatch, SystemConfig};

#[test]
fn wire_seconds_become_milliseconds() {
    let body = br#"{
        "MainLoopSec": 2,
        "UpdateConfigSec": 600,
        "DebounceCount": 4,
        "MinNotifyPeriodSec": 1800,
        "DryAgeNotifySec": 86400,
        "MaxPumpRunTimeSec": 300,
        "PumpTestRunSec": 10,
        "PumpTestRunMinIntervalSec": 7200,
        "DebugLog": true,
        "PostLog": false
    }"#;
    let patch = ConfigPatch::from_json(body).unwrap();

    assert_eq!(patch.main_loop_period_ms, Some(2_000));
    assert_eq!(patch.config_refresh_period_ms, Some(600_000));
    assert_eq!(patch.debounce_confirm_count, Some(4));
    assert_eq!(patch.min_notify_period_ms, Some(1_800_000));
    assert_eq!(patch.dry_age_notify_ms, Some(86_400_000));
    assert_eq!(patch.max_pump_run_time_ms, Some(300_000));
    assert_eq!(patch.pump_test_duration_ms, Some(10_000));
    assert_eq!(patch.pump_test_min_interval_ms, Some(7_200_000));
    assert_eq!(patch.debug_logging_enabled, Some(true));
    assert_eq!(patch.remote_logging_enabled, Some(false));

    let next = SystemConfig::default().patched(&patch).unwrap();
    assert_eq!(next.main_loop_period_ms, 2_000);
    assert!(next.debug_logging_enabled);
}

#[test]
fn absent_fields_leave_values_alone() {
    let patch = ConfigPatch::from_json(br#"{"DebugLog": true}"#).unwrap();
    let base = SystemConfig::default();
    let next = base.patched(&patch).unwrap();
    assert_eq!(
        next,
        SystemConfig {
            debug_logging_enabled: true,
            ..base
        }
    );
}

#[test]
fn empty_object_is_empty_patch() {
    let patch = ConfigPatch::from_json(b"{}").unwrap();
    assert!(patch.is_empty());
    assert_eq!(
        SystemConfig::default().patched(&patch).unwrap(),
        SystemConfig::default()
    );
}

#[test]
fn unknown_keys_are_ignored() {
    let patch = ConfigPatch::from_json(br#"{"Firmware": "1.2", "DebounceCount": 2}"#).unwrap();
    assert_eq!(patch.debounce_confirm_count, Some(2));
}

#[test]
fn legacy_debounce_mask_converts_to_count() {
    let patch = ConfigPatch::from_json(br#"{"DebounceMask": 7}"#).unwrap();
    assert_eq!(patch.debounce_confirm_count, Some(3));

    let both = ConfigPatch::from_json(br#"{"DebounceMask": 7, "DebounceCount": 5}"#).unwrap();
    assert_eq!(both.debounce_confirm_count, Some(5));
}

#[test]
fn malformed_bodies_rejected() {
    for body in [&b"not json"[..], b"42", br#"{"MainLoopSec": "fast"}"#, b""] {
        assert_eq!(ConfigPatch::from_json(body), Err(ConfigError::Malformed));
    }
}

#[test]
fn overflowing_seconds_rejected() {
    let r = ConfigPatch::from_json(br#"{"DryAgeNotifySec": 4294967295}"#);
    assert!(matches!(r, Err(ConfigError::ValidationFailed(_))));
}

#[test]
fn cross_field_rules_checked_on_the_result() {
    // Each value is in range on its own; together the test run outlasts
    // the pump cutoff.
    let patch = ConfigPatch {
        max_pump_run_time_ms: Some(20_000),
        pump_test_duration_ms: Some(30_000),
        ..ConfigPatch::default()
    };
    assert!(SystemConfig::default().patched(&patch).is_err());
}

#[test]
fn out_of_range_values_rejected_not_clamped() {
    let patch = ConfigPatch {
        main_loop_period_ms: Some(10),
        ..ConfigPatch::default()
    };
    assert!(matches!(
        SystemConfig::default().patched(&patch),
        Err(ConfigError::ValidationFailed(_))
    ));
}
