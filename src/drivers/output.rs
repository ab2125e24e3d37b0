//! On/off output driver for the pump relay, buzzer, and indicator LED.
//!
//! Tracks the commanded state so callers can read it back without
//! touching the pin.  The state only changes when the pin write succeeds.

use embedded_hal::digital::{OutputPin, PinState};
use log::debug;

use super::Polarity;
use crate::error::ActuatorError;

pub struct DigitalOutput<P> {
    pin: P,
    polarity: Polarity,
    name: &'static str,
    on: bool,
}

impl<P: OutputPin> DigitalOutput<P> {
    /// Wrap `pin` and drive it to the off level.
    pub fn new(pin: P, polarity: Polarity, name: &'static str) -> Result<Self, ActuatorError> {
        let mut out = Self {
            pin,
            polarity,
            name,
            on: true,
        };
        out.set(false)?;
        Ok(out)
    }

    pub fn set(&mut self, on: bool) -> Result<(), ActuatorError> {
        let level = PinState::from(self.polarity.level_for(on));
        self.pin
            .set_state(level)
            .map_err(|_| ActuatorError::GpioWriteFailed)?;
        if self.on != on {
            debug!("{}: {}", self.name, if on { "ON" } else { "OFF" });
        }
        self.on = on;
        Ok(())
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}
