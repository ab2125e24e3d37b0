//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to: this tick's confirmed float states, the relay command, pump
//! timing, configuration, and the requests the drive makes of the rest of
//! the controller (raise/clear an alarm, send a notification).  The
//! handlers never touch the alarm engine or notifier directly; the
//! [`AppService`](crate::app::service::AppService) drains the requests
//! after each tick.

use heapless::Vec;
use log::warn;

use crate::config::SystemConfig;
use crate::events::{EventKind, SumpEvent};
use crate::sensors::{FloatStates, Level};

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Actuator commands written by state handlers and applied after the tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriveCommands {
    pub relay_on: bool,
}

/// Side effects the drive asks the controller to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveRequest {
    RaiseAlarm(EventKind),
    ClearAlarm,
    Notify(SumpEvent),
    /// The relay was forced off after running for `ran_ms`.
    SafetyCutoff { ran_ms: u32 },
}

/// Enough for the busiest tick (escalation: raise + notify, twice).
const MAX_REQUESTS: usize = 8;

// ---------------------------------------------------------------------------
// Pump test run
// ---------------------------------------------------------------------------

/// Manual pump test bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpTest {
    /// Set by the operator, consumed by the Monitoring handler.
    pub requested: bool,
    /// When the current run started, if one is in progress.
    pub running_since_ms: Option<u32>,
    /// When the last run started.
    pub last_run_ms: Option<u32>,
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

pub struct FsmContext {
    // -- Timing --
    /// Controller time for this tick (milliseconds, wrapping).
    pub now_ms: u32,

    // -- Inputs --
    /// Debounced float states for this tick.
    pub floats: FloatStates,

    // -- Outputs --
    pub commands: DriveCommands,

    // -- Configuration --
    pub config: SystemConfig,

    // -- Drive state --
    /// When the relay was switched on for the current Pumping episode.
    pub pump_started_ms: Option<u32>,
    /// Alarm kind raised by the drive during the current episode.
    pub drive_alarm: Option<EventKind>,
    pub pump_test: PumpTest,

    requests: Vec<DriveRequest, MAX_REQUESTS>,
}

impl FsmContext {
    pub fn new(config: SystemConfig) -> Self {
        Self {
            now_ms: 0,
            floats: FloatStates::default(),
            commands: DriveCommands::default(),
            config,
            pump_started_ms: None,
            drive_alarm: None,
            pump_test: PumpTest::default(),
            requests: Vec::new(),
        }
    }

    /// Backup or Flood confirmed wet.
    pub fn high_water(&self) -> bool {
        self.floats.is_on(Level::Backup) || self.floats.is_on(Level::Flood)
    }

    pub fn sump_on(&self) -> bool {
        self.floats.is_on(Level::Sump)
    }

    /// How long the relay has been on this episode.
    pub fn pump_runtime_ms(&self) -> Option<u32> {
        self.pump_started_ms.map(|start| self.now_ms.wrapping_sub(start))
    }

    pub fn request(&mut self, req: DriveRequest) {
        if self.requests.push(req).is_err() {
            warn!("FSM: request queue full, dropping {:?}", req);
        }
    }

    /// Hand the accumulated requests to the caller, leaving the queue empty.
    pub fn take_requests(&mut self) -> Vec<DriveRequest, MAX_REQUESTS> {
        core::mem::take(&mut self.requests)
    }

    pub fn pending_requests(&self) -> &[DriveRequest] {
        &self.requests
    }
}
