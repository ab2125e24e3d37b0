//! Float plausibility validator.
//!
//! Water cannot lift a higher float without first lifting every float
//! below it.  Each tick the confirmed states are checked against that
//! ordering; a violation is a sensor fault (stuck float, broken wire,
//! debris) and is reported as a `BadState` alarm and notification.
//!
//! Validation never gates the pump: the drive state machine still acts on
//! the (possibly implausible) readings, because a stuck-low sump float must
//! not stop the pump from answering a wet backup float.

use log::{error, info};

use crate::sensors::{FloatStates, Level};

/// Result of a plausibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plausibility {
    Ok,
    /// The offending snapshot, for inclusion in the notification.
    Invalid(FloatStates),
}

impl Plausibility {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Check the monotonic ordering invariant across all levels.
pub fn validate(states: &FloatStates) -> Plausibility {
    let violated = Level::ALL.iter().any(|level| {
        level
            .below()
            .is_some_and(|lower| states.is_on(*level) && !states.is_on(lower))
    });
    if violated {
        Plausibility::Invalid(*states)
    } else {
        Plausibility::Ok
    }
}

/// Stateful wrapper that logs fault onset and clearance exactly once.
#[derive(Debug, Default)]
pub struct PlausibilityMonitor {
    faulted: bool,
}

impl PlausibilityMonitor {
    pub const fn new() -> Self {
        Self { faulted: false }
    }

    pub fn evaluate(&mut self, states: &FloatStates) -> Plausibility {
        let result = validate(states);
        match (self.faulted, result) {
            (false, Plausibility::Invalid(snap)) => error!("SENSOR FAULT SET: floats implausible ({snap})"),
            (true, Plausibility::Ok) => info!("SENSOR FAULT CLEARED: floats consistent"),
            _ => {}
        }
        self.faulted = !result.is_ok();
        result
    }

    pub fn is_faulted(&self) -> bool {
        self.faulted
    }
}
