//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the three float switch inputs and the three outputs, exposing them
//! through [`SensorPort`] and [`ActuatorPort`].  This is the only module in
//! the system that touches actual pins.  It is generic over the
//! `embedded-hal` traits, so the same code runs against `esp-idf-hal`
//! pin drivers on target and in-memory pins on the host.

use embedded_hal::digital::{InputPin, OutputPin};

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::drivers::float_switch::FloatSwitch;
use crate::drivers::output::DigitalOutput;
use crate::error::{ActuatorError, SensorError};
use crate::sensors::Level;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<I, O> {
    /// Indexed by [`Level::index`].
    floats: [FloatSwitch<I>; Level::COUNT],
    relay: DigitalOutput<O>,
    buzzer: DigitalOutput<O>,
    indicator: DigitalOutput<O>,
}

impl<I: InputPin, O: OutputPin> HardwareAdapter<I, O> {
    pub fn new(
        floats: [FloatSwitch<I>; Level::COUNT],
        relay: DigitalOutput<O>,
        buzzer: DigitalOutput<O>,
        indicator: DigitalOutput<O>,
    ) -> Self {
        Self {
            floats,
            relay,
            buzzer,
            indicator,
        }
    }

    pub fn relay_is_on(&self) -> bool {
        self.relay.is_on()
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<I: InputPin, O: OutputPin> SensorPort for HardwareAdapter<I, O> {
    fn read_raw(&mut self, level: Level) -> Result<bool, SensorError> {
        self.floats[level.index()].is_wet()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<I: InputPin, O: OutputPin> ActuatorPort for HardwareAdapter<I, O> {
    fn set_relay(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.relay.set(on)
    }

    fn set_buzzer(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.buzzer.set(on)
    }

    fn set_indicator_led(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.indicator.set(on)
    }
}
