//! Float switch input driver.
//!
//! A dumb digital input: one raw read per call, no filtering.  Debouncing
//! lives in [`crate::sensors::debounce`]; this driver only translates pin
//! level to "wet" according to the wiring polarity.

use embedded_hal::digital::InputPin;

use super::Polarity;
use crate::error::SensorError;

pub struct FloatSwitch<P> {
    pin: P,
    polarity: Polarity,
}

impl<P: InputPin> FloatSwitch<P> {
    pub fn new(pin: P, polarity: Polarity) -> Self {
        Self { pin, polarity }
    }

    /// `true` when the float reports water.
    pub fn is_wet(&mut self) -> Result<bool, SensorError> {
        let high = self.pin.is_high().map_err(|_| SensorError::GpioReadFailed)?;
        Ok(self.polarity.is_active(high))
    }
}
