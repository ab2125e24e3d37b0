//! Shift-register debouncing for a single float switch.
//!
//! Each sample shifts the history register left by one and inserts the raw
//! bit at the low end.  The `k` least-significant bits are the `k` most
//! recent samples:
//!
//! ```text
//!   history:  b7 b6 b5 b4 b3 b2 b1 b0      (b0 = newest)
//!   on mask:   0  0  0  0  0  1  1  1      (k = 3)
//!   off mask:  1  1  1  1  1  0  0  0      (!on)
//!
//!   confirmed ON   ⇔  history & on  == on
//!   confirmed OFF  ⇔  history | off == off
//!   otherwise      ⇒  keep the previous confirmed state
//! ```
//!
//! Any `k` in `1..=8` is accepted.  Only the `k` newest bits are compared,
//! so `k` does not have to divide the register width; older bits are
//! shifted out unread.

use crate::app::ports::ConfigError;

/// Width of the sample history register in bits.
pub const REGISTER_WIDTH: u8 = u8::BITS as u8;

/// Confirm-on mask and its complement for a confirmation count `k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceMask {
    on: u8,
    off: u8,
}

impl DebounceMask {
    /// Build the masks for `k` consecutive matching samples.
    ///
    /// `k` must be in `1..=REGISTER_WIDTH`.
    pub fn from_count(k: u8) -> Result<Self, ConfigError> {
        if k == 0 || k > REGISTER_WIDTH {
            return Err(ConfigError::ValidationFailed(
                "debounce_confirm_count must be 1-8",
            ));
        }
        let on = if k == REGISTER_WIDTH { u8::MAX } else { (1u8 << k) - 1 };
        Ok(Self { on, off: !on })
    }

    /// Convert a legacy contiguous low-order bitmask (e.g. `0b0111`) into a
    /// confirmation count.  Non-contiguous or empty masks are rejected.
    pub fn count_from_legacy_mask(mask: u8) -> Result<u8, ConfigError> {
        let ones = mask.trailing_ones() as u8;
        if ones == 0 || u32::from(mask).count_ones() != u32::from(ones) {
            return Err(ConfigError::ValidationFailed(
                "DebounceMask must be a contiguous run of low-order ones",
            ));
        }
        Ok(ones)
    }

    /// Number of consecutive samples required.
    pub fn count(&self) -> u8 {
        self.on.count_ones() as u8
    }

    pub fn on_mask(&self) -> u8 {
        self.on
    }

    pub fn off_mask(&self) -> u8 {
        self.off
    }

    fn confirms_on(&self, history: u8) -> bool {
        history & self.on == self.on
    }

    fn confirms_off(&self, history: u8) -> bool {
        history | self.off == self.off
    }
}

/// Debounce state for one float switch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FloatSensor {
    history: u8,
    confirmed: bool,
    reported: bool,
}

impl FloatSensor {
    pub const fn new() -> Self {
        Self {
            history: 0,
            confirmed: false,
            reported: false,
        }
    }

    /// Shift in one raw sample and return the confirmed state.
    pub fn sample(&mut self, raw: bool, mask: DebounceMask) -> bool {
        self.history = (self.history << 1) | u8::from(raw);
        if mask.confirms_on(self.history) {
            self.confirmed = true;
        } else if mask.confirms_off(self.history) {
            self.confirmed = false;
        }
        self.confirmed
    }

    pub fn confirmed(&self) -> bool {
        self.confirmed
    }

    /// The state last handed out by [`take_report`](Self::take_report).
    pub fn reported(&self) -> bool {
        self.reported
    }

    /// Record the current confirmed state as reported and return the
    /// previously reported one.
    pub fn take_report(&mut self) -> bool {
        let previous = self.reported;
        self.reported = self.confirmed;
        previous
    }

    pub fn history(&self) -> u8 {
        self.history
    }
}
