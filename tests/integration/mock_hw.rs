//! Mock adapters for integration tests.
//!
//! Records every actuator write, emitted event and delivery attempt so
//! tests can assert on the full history without touching real GPIO or
//! the network.

use sumpguard::app::events::AppEvent;
use sumpguard::app::ports::{
    ActuatorPort, ConfigSource, ConnectivityPort, DeliveryError, DeliveryPort, EventSink,
    SensorPort,
};
use sumpguard::config::ConfigPatch;
use sumpguard::error::{ActuatorError, SensorError};
use sumpguard::events::EventKind;
use sumpguard::notify::SeverityTier;
use sumpguard::sensors::Level;

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCall {
    Relay(bool),
    Buzzer(bool),
    Indicator(bool),
}

// ── MockHardware ──────────────────────────────────────────────

/// Three scripted float inputs and three recorded outputs.
#[derive(Debug, Default)]
pub struct MockHardware {
    /// Raw float inputs, indexed by [`Level::index`].
    pub raw: [bool; Level::COUNT],
    pub unreadable: Option<Level>,
    pub fail_writes: bool,
    pub relay: bool,
    pub buzzer: bool,
    pub indicator: bool,
    pub calls: Vec<ActuatorCall>,
}

impl MockHardware {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_floats(&mut self, sump: bool, backup: bool, flood: bool) {
        self.raw = [sump, backup, flood];
    }

    pub fn relay_writes(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, ActuatorCall::Relay(_)))
            .count()
    }
}

impl SensorPort for MockHardware {
    fn read_raw(&mut self, level: Level) -> Result<bool, SensorError> {
        if self.unreadable == Some(level) {
            return Err(SensorError::GpioReadFailed);
        }
        Ok(self.raw[level.index()])
    }
}

impl ActuatorPort for MockHardware {
    fn set_relay(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.calls.push(ActuatorCall::Relay(on));
        if self.fail_writes {
            return Err(ActuatorError::GpioWriteFailed);
        }
        self.relay = on;
        Ok(())
    }

    fn set_buzzer(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.calls.push(ActuatorCall::Buzzer(on));
        if self.fail_writes {
            return Err(ActuatorError::GpioWriteFailed);
        }
        self.buzzer = on;
        Ok(())
    }

    fn set_indicator_led(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.calls.push(ActuatorCall::Indicator(on));
        if self.fail_writes {
            return Err(ActuatorError::GpioWriteFailed);
        }
        self.indicator = on;
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── MockLink ──────────────────────────────────────────────────

#[derive(Debug)]
pub struct MockLink {
    pub up: bool,
    pub ensure_calls: usize,
}

impl MockLink {
    pub fn up() -> Self {
        Self { up: true, ensure_calls: 0 }
    }

    pub fn down() -> Self {
        Self { up: false, ensure_calls: 0 }
    }
}

impl ConnectivityPort for MockLink {
    fn is_connected(&self) -> bool {
        self.up
    }

    fn ensure_connected(&mut self) -> bool {
        self.ensure_calls += 1;
        self.up
    }
}

// ── MockCourier ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivered {
    pub kind: EventKind,
    pub tier: SeverityTier,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Default)]
pub struct MockCourier {
    pub attempts: Vec<Delivered>,
    pub fail_with: Option<DeliveryError>,
}

impl MockCourier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.attempts.iter().map(|d| d.kind).collect()
    }
}

impl DeliveryPort for MockCourier {
    fn deliver(
        &mut self,
        kind: EventKind,
        tier: SeverityTier,
        subject: &str,
        body: &str,
    ) -> Result<(), DeliveryError> {
        self.attempts.push(Delivered {
            kind,
            tier,
            subject: subject.into(),
            body: body.into(),
        });
        match self.fail_with {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

// ── StaticConfigSource ────────────────────────────────────────

#[derive(Debug, Default)]
pub struct StaticConfigSource {
    pub patch: Option<ConfigPatch>,
    pub fetches: usize,
}

impl ConfigSource for StaticConfigSource {
    fn fetch_config_patch(&mut self) -> Option<ConfigPatch> {
        self.fetches += 1;
        self.patch
    }
}
