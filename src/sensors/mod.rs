//! Float switch levels and the aggregating [`FloatBank`].
//!
//! The bank owns one [`FloatSensor`] per level and produces a
//! [`FloatReading`] each tick: the debounced states now, and the states
//! that were last reported, so callers can see edges.

pub mod debounce;

use core::fmt;

use log::{debug, warn};

use crate::app::ports::{ConfigError, SensorPort};
use debounce::{DebounceMask, FloatSensor};

/// The three float switches, strictly increasing in height and severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
    Sump = 0,
    Backup = 1,
    Flood = 2,
}

impl Level {
    pub const COUNT: usize = 3;
    pub const ALL: [Level; Self::COUNT] = [Self::Sump, Self::Backup, Self::Flood];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// The next level down, or `None` for `Sump`.
    pub const fn below(self) -> Option<Level> {
        match self {
            Self::Sump => None,
            Self::Backup => Some(Self::Sump),
            Self::Flood => Some(Self::Backup),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Sump => "sump",
            Self::Backup => "backup",
            Self::Flood => "flood",
        }
    }
}

/// Confirmed on/off state of every level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FloatStates([bool; Level::COUNT]);

impl FloatStates {
    pub const fn new(sump: bool, backup: bool, flood: bool) -> Self {
        Self([sump, backup, flood])
    }

    pub const fn is_on(&self, level: Level) -> bool {
        self.0[level as usize]
    }

    pub fn set(&mut self, level: Level, on: bool) {
        self.0[level.index()] = on;
    }

    /// Highest level currently wet.
    pub fn highest_active(&self) -> Option<Level> {
        Level::ALL.iter().rev().copied().find(|l| self.is_on(*l))
    }

    pub fn as_array(&self) -> [bool; Level::COUNT] {
        self.0
    }
}

/// Renders as `sump=ON backup=OFF flood=OFF`.
impl fmt::Display for FloatStates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, level) in Level::ALL.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            let state = if self.is_on(*level) { "ON" } else { "OFF" };
            write!(f, "{}={}", level.name(), state)?;
        }
        Ok(())
    }
}

/// One tick's worth of debounced float data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FloatReading {
    /// Confirmed states after this tick's samples.
    pub current: FloatStates,
    /// Confirmed states as of the previous tick.
    pub previous: FloatStates,
}

impl FloatReading {
    pub fn changed(&self, level: Level) -> bool {
        self.current.is_on(level) != self.previous.is_on(level)
    }

    pub fn rose(&self, level: Level) -> bool {
        self.current.is_on(level) && !self.previous.is_on(level)
    }

    pub fn fell(&self, level: Level) -> bool {
        !self.current.is_on(level) && self.previous.is_on(level)
    }
}

/// Debounced sensor bank for all three levels.
pub struct FloatBank {
    sensors: [FloatSensor; Level::COUNT],
    mask: DebounceMask,
}

impl FloatBank {
    pub fn new(confirm_count: u8) -> Result<Self, ConfigError> {
        Ok(Self {
            sensors: [FloatSensor::new(); Level::COUNT],
            mask: DebounceMask::from_count(confirm_count)?,
        })
    }

    /// Swap in a new confirmation width.  Histories are kept so that a
    /// reload does not discard evidence already gathered.
    pub fn reconfigure(&mut self, confirm_count: u8) -> Result<(), ConfigError> {
        self.mask = DebounceMask::from_count(confirm_count)?;
        Ok(())
    }

    pub fn mask(&self) -> DebounceMask {
        self.mask
    }

    /// Feed one raw sample for `level` and return its confirmed state.
    pub fn sample(&mut self, level: Level, raw: bool) -> bool {
        self.sensors[level.index()].sample(raw, self.mask)
    }

    /// Confirmed states without sampling.
    pub fn confirmed(&self) -> FloatStates {
        let mut states = FloatStates::default();
        for level in Level::ALL {
            states.set(level, self.sensors[level.index()].confirmed());
        }
        states
    }

    /// Sample every level once through the sensor port.
    ///
    /// A level whose input cannot be read contributes no sample this tick;
    /// its previous confirmed state stands.
    pub fn read_all(&mut self, hw: &mut impl SensorPort) -> FloatReading {
        let mut reading = FloatReading::default();
        for level in Level::ALL {
            match hw.read_raw(level) {
                Ok(raw) => {
                    self.sample(level, raw);
                }
                Err(e) => warn!("Float {}: read failed ({}), keeping last state", level.name(), e),
            }
            let sensor = &mut self.sensors[level.index()];
            reading.previous.set(level, sensor.take_report());
            reading.current.set(level, sensor.confirmed());
        }
        if reading.current != reading.previous {
            debug!("Floats: {} (was {})", reading.current, reading.previous);
        }
        reading
    }
}
