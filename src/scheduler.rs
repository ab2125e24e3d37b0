//! Timer/scheduler engine.
//!
//! Two periodic timers drive the firmware: the controller tick and the
//! remote configuration refresh.  The scheduler notifies a
//! [`SchedulerDelegate`] when one fires; the main loop implements the
//! delegate and calls into the [`AppService`](crate::app::service::AppService).
//!
//! ```text
//!  ┌──────────────┐   ┌────────────────┐
//!  │ ControlTick  │   │ ConfigRefresh  │
//!  │ (main loop)  │   │ (remote pull)  │
//!  └──────┬───────┘   └───────┬────────┘
//!         ▼                   ▼
//!  ┌──────────────────────────────────┐
//!  │        SchedulerDelegate         │
//!  └────────────────┬─────────────────┘
//!                   ▼
//!       AppService.tick() / refresh_config()
//! ```
//!
//! All comparisons use `now.wrapping_sub(last)` so a wrapping millisecond
//! clock never stalls or double-fires a timer.

use crate::app::ports::SchedulerDelegate;
use crate::config::SystemConfig;
use log::{debug, info};

// ═══════════════════════════════════════════════════════════════
//  Schedule types
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleId {
    ControlTick,
    ConfigRefresh,
}

impl ScheduleId {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ControlTick => "control-tick",
            Self::ConfigRefresh => "config-refresh",
        }
    }
}

/// A wrap-safe periodic timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodicTimer {
    period_ms: u32,
    /// `None` until the first fire; a timer with no history is due.
    last_fired_ms: Option<u32>,
}

impl PeriodicTimer {
    pub const fn new(period_ms: u32) -> Self {
        Self {
            period_ms,
            last_fired_ms: None,
        }
    }

    /// Returns `true` and re-arms if the period has elapsed.
    pub fn poll(&mut self, now_ms: u32) -> bool {
        let due = self
            .last_fired_ms
            .is_none_or(|last| now_ms.wrapping_sub(last) >= self.period_ms);
        if due {
            self.last_fired_ms = Some(now_ms);
        }
        due
    }

    /// Milliseconds until the next fire (0 if already due).
    pub fn remaining_ms(&self, now_ms: u32) -> u32 {
        match self.last_fired_ms {
            None => 0,
            Some(last) => self.period_ms.saturating_sub(now_ms.wrapping_sub(last)),
        }
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    pub fn set_period(&mut self, period_ms: u32) {
        self.period_ms = period_ms;
    }
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Both timers start due, so the first loop iteration ticks the controller
/// and pulls the remote config immediately.
pub struct Scheduler {
    control: PeriodicTimer,
    config_refresh: PeriodicTimer,
}

impl Scheduler {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            control: PeriodicTimer::new(config.main_loop_period_ms),
            config_refresh: PeriodicTimer::new(config.config_refresh_period_ms),
        }
    }

    /// Poll both timers.  Call as often as the main loop spins.
    pub fn tick(&mut self, now_ms: u32, delegate: &mut dyn SchedulerDelegate) {
        if self.control.poll(now_ms) {
            delegate.on_schedule_fired(ScheduleId::ControlTick, now_ms);
        }
        if self.config_refresh.poll(now_ms) {
            debug!("Scheduler: '{}' fired", ScheduleId::ConfigRefresh.label());
            delegate.on_schedule_fired(ScheduleId::ConfigRefresh, now_ms);
        }
    }

    /// Pick up new periods after a configuration change.  Phase is kept.
    pub fn reconfigure(&mut self, config: &SystemConfig) {
        if self.control.period_ms() != config.main_loop_period_ms
            || self.config_refresh.period_ms() != config.config_refresh_period_ms
        {
            info!(
                "Scheduler: control every {}ms, config refresh every {}s",
                config.main_loop_period_ms,
                config.config_refresh_period_ms / 1000
            );
        }
        self.control.set_period(config.main_loop_period_ms);
        self.config_refresh.set_period(config.config_refresh_period_ms);
    }

    /// How long the main loop may sleep before something is due.
    pub fn idle_budget_ms(&self, now_ms: u32) -> u32 {
        self.control
            .remaining_ms(now_ms)
            .min(self.config_refresh.remaining_ms(now_ms))
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
