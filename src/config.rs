//! System configuration parameters
//!
//! All tunable parameters for the SumpGuard controller.  Values start from
//! [`SystemConfig::default`] and can be overridden by a remote
//! [`ConfigPatch`] pulled on the config-refresh cadence.
//!
//! A patch is never applied in place: [`SystemConfig::patched`] builds a
//! complete candidate, validates it, and hands it back for the caller to
//! swap in whole.  A rejected patch leaves the live config untouched.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::sensors::debounce::REGISTER_WIDTH;

const SEC: u32 = 1000;
const MIN: u32 = 60 * SEC;
const HOUR: u32 = 60 * MIN;
const DAY: u32 = 24 * HOUR;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Timing ---
    /// Controller tick period (milliseconds)
    pub main_loop_period_ms: u32,
    /// Remote configuration pull period (milliseconds)
    pub config_refresh_period_ms: u32,

    // --- Floats ---
    /// Consecutive matching samples required to change a float's state
    pub debounce_confirm_count: u8,

    // --- Notifications ---
    /// Minimum time between two notifications of the same kind
    pub min_notify_period_ms: u32,
    /// Continuous sump inactivity before a Dry notice
    pub dry_age_notify_ms: u32,

    // --- Pump ---
    /// Maximum continuous relay-on time before a forced rest
    pub max_pump_run_time_ms: u32,
    /// Relay-on time for a manual pump test run
    pub pump_test_duration_ms: u32,
    /// Minimum time between two pump test runs
    pub pump_test_min_interval_ms: u32,

    // --- Logging ---
    pub debug_logging_enabled: bool,
    pub remote_logging_enabled: bool,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Timing
            main_loop_period_ms: SEC,           // 1 Hz
            config_refresh_period_ms: 30 * MIN,

            // Floats
            debounce_confirm_count: 3, // 0b111

            // Notifications
            min_notify_period_ms: HOUR,
            dry_age_notify_ms: 7 * DAY,

            // Pump
            max_pump_run_time_ms: 10 * MIN,
            pump_test_duration_ms: 5 * SEC,
            pump_test_min_interval_ms: HOUR,

            // Logging
            debug_logging_enabled: false,
            remote_logging_enabled: false,
        }
    }
}

impl SystemConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(100..=MIN).contains(&self.main_loop_period_ms) {
            return Err(ConfigError::ValidationFailed(
                "main_loop_period_ms must be 100 ms - 1 min",
            ));
        }
        if !(MIN..=DAY).contains(&self.config_refresh_period_ms) {
            return Err(ConfigError::ValidationFailed(
                "config_refresh_period_ms must be 1 min - 1 day",
            ));
        }
        if self.debounce_confirm_count == 0 || self.debounce_confirm_count > REGISTER_WIDTH {
            return Err(ConfigError::ValidationFailed(
                "debounce_confirm_count must be 1-8",
            ));
        }
        if self.min_notify_period_ms > 7 * DAY {
            return Err(ConfigError::ValidationFailed(
                "min_notify_period_ms must be at most 7 days",
            ));
        }
        if !(MIN..=30 * DAY).contains(&self.dry_age_notify_ms) {
            return Err(ConfigError::ValidationFailed(
                "dry_age_notify_ms must be 1 min - 30 days",
            ));
        }
        if !(10 * SEC..=HOUR).contains(&self.max_pump_run_time_ms) {
            return Err(ConfigError::ValidationFailed(
                "max_pump_run_time_ms must be 10 s - 1 h",
            ));
        }
        if self.max_pump_run_time_ms <= self.main_loop_period_ms {
            return Err(ConfigError::ValidationFailed(
                "max_pump_run_time_ms must exceed main_loop_period_ms",
            ));
        }
        if !(SEC..=MIN).contains(&self.pump_test_duration_ms) {
            return Err(ConfigError::ValidationFailed(
                "pump_test_duration_ms must be 1 s - 1 min",
            ));
        }
        if self.pump_test_duration_ms >= self.max_pump_run_time_ms {
            return Err(ConfigError::ValidationFailed(
                "pump_test_duration_ms must be below max_pump_run_time_ms",
            ));
        }
        if self.pump_test_min_interval_ms < self.pump_test_duration_ms
            || self.pump_test_min_interval_ms > 30 * DAY
        {
            return Err(ConfigError::ValidationFailed(
                "pump_test_min_interval_ms must be between pump_test_duration_ms and 30 days",
            ));
        }
        Ok(())
    }

    /// Build a validated copy with every field present in `patch` replaced.
    pub fn patched(&self, patch: &ConfigPatch) -> Result<SystemConfig, ConfigError> {
        let mut next = self.clone();
        let ConfigPatch {
            main_loop_period_ms,
            config_refresh_period_ms,
            debounce_confirm_count,
            min_notify_period_ms,
            dry_age_notify_ms,
            max_pump_run_time_ms,
            pump_test_duration_ms,
            pump_test_min_interval_ms,
            debug_logging_enabled,
            remote_logging_enabled,
        } = *patch;

        if let Some(v) = main_loop_period_ms {
            next.main_loop_period_ms = v;
        }
        if let Some(v) = config_refresh_period_ms {
            next.config_refresh_period_ms = v;
        }
        if let Some(v) = debounce_confirm_count {
            next.debounce_confirm_count = v;
        }
        if let Some(v) = min_notify_period_ms {
            next.min_notify_period_ms = v;
        }
        if let Some(v) = dry_age_notify_ms {
            next.dry_age_notify_ms = v;
        }
        if let Some(v) = max_pump_run_time_ms {
            next.max_pump_run_time_ms = v;
        }
        if let Some(v) = pump_test_duration_ms {
            next.pump_test_duration_ms = v;
        }
        if let Some(v) = pump_test_min_interval_ms {
            next.pump_test_min_interval_ms = v;
        }
        if let Some(v) = debug_logging_enabled {
            next.debug_logging_enabled = v;
        }
        if let Some(v) = remote_logging_enabled {
            next.remote_logging_enabled = v;
        }

        next.validate()?;
        Ok(next)
    }
}

// ---------------------------------------------------------------------------
// Remote patch
// ---------------------------------------------------------------------------

/// A partial configuration.  Absent fields leave the current value alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigPatch {
    pub main_loop_period_ms: Option<u32>,
    pub config_refresh_period_ms: Option<u32>,
    pub debounce_confirm_count: Option<u8>,
    pub min_notify_period_ms: Option<u32>,
    pub dry_age_notify_ms: Option<u32>,
    pub max_pump_run_time_ms: Option<u32>,
    pub pump_test_duration_ms: Option<u32>,
    pub pump_test_min_interval_ms: Option<u32>,
    pub debug_logging_enabled: Option<bool>,
    pub remote_logging_enabled: Option<bool>,
}

/// Wire shape served by the config endpoint.  Durations are in seconds.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WirePatch {
    #[serde(rename = "MainLoopSec")]
    main_loop_sec: Option<u32>,
    #[serde(rename = "UpdateConfigSec")]
    update_config_sec: Option<u32>,
    #[serde(rename = "DebounceCount")]
    debounce_count: Option<u8>,
    #[serde(rename = "DebounceMask")]
    debounce_mask: Option<u8>,
    #[serde(rename = "MinNotifyPeriodSec")]
    min_notify_period_sec: Option<u32>,
    #[serde(rename = "DryAgeNotifySec")]
    dry_age_notify_sec: Option<u32>,
    #[serde(rename = "MaxPumpRunTimeSec")]
    max_pump_run_time_sec: Option<u32>,
    #[serde(rename = "PumpTestRunSec")]
    pump_test_run_sec: Option<u32>,
    #[serde(rename = "PumpTestRunMinIntervalSec")]
    pump_test_run_min_interval_sec: Option<u32>,
    #[serde(rename = "DebugLog")]
    debug_log: Option<bool>,
    #[serde(rename = "PostLog")]
    post_log: Option<bool>,
}

fn secs_to_ms(secs: Option<u32>, field: &'static str) -> Result<Option<u32>, ConfigError> {
    secs.map(|s| s.checked_mul(SEC).ok_or(ConfigError::ValidationFailed(field)))
        .transpose()
}

impl ConfigPatch {
    /// Parse the JSON document served by the remote config endpoint.
    ///
    /// Unknown keys are ignored.  `DebounceCount` wins over the legacy
    /// `DebounceMask` when both are present.
    pub fn from_json(body: &[u8]) -> Result<Self, ConfigError> {
        let wire: WirePatch = serde_json::from_slice(body).map_err(|_| ConfigError::Malformed)?;

        let debounce_confirm_count = match (wire.debounce_count, wire.debounce_mask) {
            (Some(k), _) => Some(k),
            (None, Some(mask)) => Some(
                crate::sensors::debounce::DebounceMask::count_from_legacy_mask(mask)?,
            ),
            (None, None) => None,
        };

        Ok(Self {
            main_loop_period_ms: secs_to_ms(wire.main_loop_sec, "MainLoopSec overflows")?,
            config_refresh_period_ms: secs_to_ms(
                wire.update_config_sec,
                "UpdateConfigSec overflows",
            )?,
            debounce_confirm_count,
            min_notify_period_ms: secs_to_ms(
                wire.min_notify_period_sec,
                "MinNotifyPeriodSec overflows",
            )?,
            dry_age_notify_ms: secs_to_ms(wire.dry_age_notify_sec, "DryAgeNotifySec overflows")?,
            max_pump_run_time_ms: secs_to_ms(
                wire.max_pump_run_time_sec,
                "MaxPumpRunTimeSec overflows",
            )?,
            pump_test_duration_ms: secs_to_ms(wire.pump_test_run_sec, "PumpTestRunSec overflows")?,
            pump_test_min_interval_ms: secs_to_ms(
                wire.pump_test_run_min_interval_sec,
                "PumpTestRunMinIntervalSec overflows",
            )?,
            debug_logging_enabled: wire.debug_log,
            remote_logging_enabled: wire.post_log,
        })
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
