//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial or record in a test.

use crate::app::ports::ConfigError;
use crate::events::EventKind;
use crate::fsm::StateId;
use crate::notify::NotifyOutcome;
use crate::sensors::FloatStates;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The application service has started (carries initial state).
    Started(StateId),

    /// The pump drive transitioned between states.
    StateChanged { from: StateId, to: StateId },

    /// An alarm became active (new or escalated).
    AlarmRaised(EventKind),
    /// A raise was refused because an equal or more severe alarm is active.
    AlarmIgnored { kind: EventKind, active: EventKind },
    /// The active alarm was cleared (drive all-clear or acknowledge).
    AlarmCleared,

    /// The float states violate the height ordering.
    SensorFault(FloatStates),

    /// The relay was forced off after a long continuous run.
    SafetyCutoff { ran_ms: u32 },

    /// The manual self-test started.
    SelfTest,

    /// A configuration patch was accepted and is now live.
    ConfigApplied,
    /// A configuration patch was rejected; the previous config stands.
    ConfigRejected(ConfigError),

    /// A notification was handed to the throttler.
    Notification { kind: EventKind, outcome: NotifyOutcome },
}
