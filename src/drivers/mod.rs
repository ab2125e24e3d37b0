//! GPIO drivers for the float switches, outputs, and test button.
//!
//! Drivers are generic over `embedded-hal` digital traits; the firmware
//! binary binds them to `esp-idf-hal` pin drivers, tests bind them to
//! in-memory pins.

pub mod button;
pub mod float_switch;
pub mod output;

/// Which electrical level means "active".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

impl Polarity {
    /// Map a raw `is_high` reading to the logical state.
    pub const fn is_active(self, high: bool) -> bool {
        match self {
            Self::ActiveHigh => high,
            Self::ActiveLow => !high,
        }
    }

    /// Electrical level (`true` = high) for a logical state.
    pub const fn level_for(self, active: bool) -> bool {
        self.is_active(active)
    }
}
