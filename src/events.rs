//! Sump event vocabulary.
//!
//! Every alarm and notification in the firmware is one of a fixed set of
//! event kinds.  [`EventKind`] is the bare discriminant, ordered by
//! severity so that `a > b` means "a is more severe than b":
//!
//! ```text
//!  Dry < Reset < Sump < BadState < Backup < Flood
//! ```
//!
//! [`SumpEvent`] is the tagged form that travels through the notification
//! path.  Variants that have a diagnostic payload carry it inline, so there
//! is no free-form "event id plus optional string" anywhere in the core.

use core::fmt;

use crate::sensors::FloatStates;

/// Severity-ranked event discriminant.
///
/// The derived `Ord` follows declaration order, which is the severity order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum EventKind {
    /// Sump level has been continuously inactive for the dry-age threshold.
    Dry = 1,
    /// The controller restarted.
    Reset = 2,
    /// Water returned to the sump level after a dry period.
    Sump = 3,
    /// The float switches report a physically impossible combination.
    BadState = 4,
    /// The backup level is wet; the main pump is not keeping up.
    Backup = 5,
    /// The flood level is wet; overflow is imminent.
    Flood = 6,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        Self::Dry,
        Self::Reset,
        Self::Sump,
        Self::BadState,
        Self::Backup,
        Self::Flood,
    ];

    /// Short stable name used in logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dry => "dry",
            Self::Reset => "reset",
            Self::Sump => "sump",
            Self::BadState => "bad_state",
            Self::Backup => "backup",
            Self::Flood => "flood",
        }
    }

    /// Whether this kind produces audible alarm output.
    pub const fn is_audible(self) -> bool {
        matches!(self, Self::BadState | Self::Backup | Self::Flood)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A concrete event with its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SumpEvent {
    Dry,
    Reset,
    Sump,
    /// Snapshot of the confirmed float states that failed validation.
    BadState(FloatStates),
    Backup,
    Flood,
}

impl SumpEvent {
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Dry => EventKind::Dry,
            Self::Reset => EventKind::Reset,
            Self::Sump => EventKind::Sump,
            Self::BadState(_) => EventKind::BadState,
            Self::Backup => EventKind::Backup,
            Self::Flood => EventKind::Flood,
        }
    }

    /// Payload-free event for a kind.  `BadState` gets an all-off snapshot.
    pub fn from_kind(kind: EventKind) -> Self {
        match kind {
            EventKind::Dry => Self::Dry,
            EventKind::Reset => Self::Reset,
            EventKind::Sump => Self::Sump,
            EventKind::BadState => Self::BadState(FloatStates::default()),
            EventKind::Backup => Self::Backup,
            EventKind::Flood => Self::Flood,
        }
    }
}
