//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (float inputs, relay/buzzer outputs, connectivity,
//! notification delivery, remote config) implement these traits.  The
//! [`AppService`](super::service::AppService) consumes them via generics,
//! so the domain core never touches hardware or the network directly.
//!
//! Every port failure is typed and absorbed by the core: no collaborator
//! error ever stops the control tick.

use crate::config::ConfigPatch;
use crate::error::{ActuatorError, SensorError};
use crate::events::EventKind;
use crate::notify::SeverityTier;
use crate::sensors::Level;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: one raw, undebounced sample per float switch.
pub trait SensorPort {
    /// `true` when the float at `level` reports water.
    fn read_raw(&mut self, level: Level) -> Result<bool, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command outputs.
pub trait ActuatorPort {
    /// Energise (`true`) or release the pump relay.
    fn set_relay(&mut self, on: bool) -> Result<(), ActuatorError>;

    fn set_buzzer(&mut self, on: bool) -> Result<(), ActuatorError>;

    fn set_indicator_led(&mut self, on: bool) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Connectivity port
// ───────────────────────────────────────────────────────────────

/// Network association.  Best-effort: the core proceeds either way.
pub trait ConnectivityPort {
    fn is_connected(&self) -> bool;

    /// Try to (re)associate if needed.  Returns the resulting link state.
    fn ensure_connected(&mut self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Notification delivery port
// ───────────────────────────────────────────────────────────────

/// Ships one notification to the operator-facing service.
pub trait DeliveryPort {
    fn deliver(
        &mut self,
        kind: EventKind,
        tier: SeverityTier,
        subject: &str,
        body: &str,
    ) -> Result<(), DeliveryError>;
}

// ───────────────────────────────────────────────────────────────
// Remote configuration port
// ───────────────────────────────────────────────────────────────

/// Pulls a configuration patch from the remote config service.
///
/// `None` means "nothing usable this time" (no link, bad status, malformed
/// body).  Implementations log the reason; the caller keeps the current
/// configuration and retries at the next refresh period.
pub trait ConfigSource {
    fn fetch_config_patch(&mut self) -> Option<ConfigPatch>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log, remote
/// log, test recorder).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples scheduler from the service)
// ───────────────────────────────────────────────────────────────

/// Callback trait that the [`Scheduler`](crate::scheduler::Scheduler)
/// invokes when one of its timers fires.
pub trait SchedulerDelegate {
    fn on_schedule_fired(&mut self, id: crate::scheduler::ScheduleId, now_ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Configuration load / patch errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The patch body was not a JSON object of the expected shape.
    Malformed,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed config patch"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

/// Low-level HTTP transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Could not open the connection.
    Connect,
    /// The request did not complete within its timeout.
    Timeout,
    /// Read/write failed mid-exchange.
    Io,
    /// Response body exceeded the receive buffer.
    BodyTooLarge,
}

impl core::fmt::Display for TransportError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Connect => write!(f, "connect failed"),
            Self::Timeout => write!(f, "timed out"),
            Self::Io => write!(f, "I/O error"),
            Self::BodyTooLarge => write!(f, "response body too large"),
        }
    }
}

/// Why a notification was not delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    /// The server answered with something other than 200.
    HttpStatus(u16),
    Transport(TransportError),
    /// No network link at send time.
    NoConnectivity,
    /// The JSON payload could not be built.
    Encode,
}

impl core::fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::HttpStatus(code) => write!(f, "HTTP status {}", code),
            Self::Transport(e) => write!(f, "transport: {}", e),
            Self::NoConnectivity => write!(f, "no connectivity"),
            Self::Encode => write!(f, "payload encoding failed"),
        }
    }
}

impl From<TransportError> for DeliveryError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

/// Network association failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    /// No credentials provisioned.
    NotConfigured,
    /// The access point rejected or ignored the association.
    AssociationFailed,
    /// Still inside the reconnect backoff window.
    BackingOff,
}

impl core::fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "no credentials configured"),
            Self::AssociationFailed => write!(f, "association failed"),
            Self::BackingOff => write!(f, "reconnect backoff active"),
        }
    }
}
