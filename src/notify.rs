//! Notification throttling and the per-kind message catalog.
//!
//! ```text
//!   SumpEvent ──▶ throttle ──suppressed──▶ NotifyOutcome::Suppressed
//!                    │
//!                 attempt (throttle state updated here, before any I/O)
//!                    │
//!                    ▼
//!              ConnectivityPort ──down──▶ Failed(NoConnectivity)
//!                    │
//!                    ▼
//!               DeliveryPort ──▶ Delivered | Failed(err)
//! ```
//!
//! The throttle has one slot: the last kind attempted and when.  A repeat
//! of that kind inside the minimum period is suppressed; any other kind
//! always gets an attempt.  A failed delivery still counts as an attempt,
//! so a dead server does not cause a retry storm.

use core::fmt::Write as _;

use heapless::String;
use log::{debug, info, warn};

use crate::app::ports::{ConnectivityPort, DeliveryError, DeliveryPort};
use crate::events::{EventKind, SumpEvent};

/// Maximum subject length accepted by the notification service.
pub const SUBJECT_CAPACITY: usize = 80;
/// Maximum body length accepted by the notification service.
pub const BODY_CAPACITY: usize = 400;

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SeverityTier {
    Info,
    Warning,
    Critical,
}

impl SeverityTier {
    /// Wire name used in the `type` field of the delivery payload.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "Info",
            Self::Warning => "Warning",
            Self::Critical => "Critical",
        }
    }
}

impl core::fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

struct CatalogEntry {
    tier: SeverityTier,
    subject: &'static str,
    body: &'static str,
}

const fn catalog(kind: EventKind) -> CatalogEntry {
    match kind {
        EventKind::Dry => CatalogEntry {
            tier: SeverityTier::Info,
            subject: "Sump considered dry",
            body: "It has been awhile since the water was at a level which activates the pump.\n",
        },
        EventKind::Reset => CatalogEntry {
            tier: SeverityTier::Info,
            subject: "Sump monitor reset",
            body: "The sump water level monitor has reset. This could be due to power cycle, or code crash.\n",
        },
        EventKind::Sump => CatalogEntry {
            tier: SeverityTier::Info,
            subject: "Water in the sump",
            body: "The water is at a level that should activate the main sump pump.\n",
        },
        EventKind::BadState => CatalogEntry {
            tier: SeverityTier::Warning,
            subject: "Floats report bad state",
            body: "The float switches are reporting an invalid state. The state should be below.\n",
        },
        EventKind::Backup => CatalogEntry {
            tier: SeverityTier::Warning,
            subject: "Backup sump pump activated",
            body: "This needs attention. The main pump is either not running, or can't keep up with the incoming water flow. The power could be out, or the main pump is broken.\n",
        },
        EventKind::Flood => CatalogEntry {
            tier: SeverityTier::Critical,
            subject: "Flooding imminent",
            body: "The water has reached a critical level, and will overflow into the basement at any moment.\n",
        },
    }
}

/// A rendered notification, ready for a [`DeliveryPort`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMessage {
    pub kind: EventKind,
    pub tier: SeverityTier,
    pub subject: String<SUBJECT_CAPACITY>,
    pub body: String<BODY_CAPACITY>,
}

/// Append as much of `s` as fits.
fn push_truncated<const N: usize>(buf: &mut String<N>, s: &str) {
    for c in s.chars() {
        if buf.push(c).is_err() {
            break;
        }
    }
}

impl EventMessage {
    /// Render the catalog entry for `event`, appending its diagnostic
    /// payload when it has one.
    pub fn compose(event: &SumpEvent) -> Self {
        let kind = event.kind();
        let entry = catalog(kind);

        let mut subject = String::new();
        push_truncated(&mut subject, entry.subject);

        let mut body = String::new();
        push_truncated(&mut body, entry.body);

        if let SumpEvent::BadState(snapshot) = event {
            let mut detail: String<48> = String::new();
            if write!(detail, "{snapshot}").is_ok() {
                push_truncated(&mut body, &detail);
            }
        }

        Self { kind, tier: entry.tier, subject, body }
    }
}

// ---------------------------------------------------------------------------
// Throttle
// ---------------------------------------------------------------------------

/// Single-slot repeat suppressor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotificationThrottle {
    last: Option<(EventKind, u32)>,
}

impl NotificationThrottle {
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// Whether `kind` at `now_ms` is a repeat inside the window.
    pub fn is_suppressed(&self, kind: EventKind, now_ms: u32, min_period_ms: u32) -> bool {
        matches!(self.last, Some((k, at)) if k == kind && now_ms.wrapping_sub(at) < min_period_ms)
    }

    pub fn record(&mut self, kind: EventKind, now_ms: u32) {
        self.last = Some((kind, now_ms));
    }

    pub fn last(&self) -> Option<(EventKind, u32)> {
        self.last
    }
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// Repeat inside the throttle window.  Not a failure.
    Suppressed,
    Delivered,
    Failed(DeliveryError),
}

impl NotifyOutcome {
    /// `true` unless delivery was attempted and failed.
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

#[derive(Debug, Default)]
pub struct Notifier {
    throttle: NotificationThrottle,
}

impl Notifier {
    pub const fn new() -> Self {
        Self { throttle: NotificationThrottle::new() }
    }

    pub fn throttle(&self) -> &NotificationThrottle {
        &self.throttle
    }

    pub fn notify(
        &mut self,
        event: &SumpEvent,
        now_ms: u32,
        min_period_ms: u32,
        link: &mut impl ConnectivityPort,
        courier: &mut impl DeliveryPort,
    ) -> NotifyOutcome {
        let kind = event.kind();
        if self.throttle.is_suppressed(kind, now_ms, min_period_ms) {
            debug!("Notify: {} suppressed (throttle)", kind);
            return NotifyOutcome::Suppressed;
        }
        self.throttle.record(kind, now_ms);

        if !link.ensure_connected() {
            warn!("Notify: {} not sent, no connectivity", kind);
            return NotifyOutcome::Failed(DeliveryError::NoConnectivity);
        }

        let msg = EventMessage::compose(event);
        match courier.deliver(kind, msg.tier, &msg.subject, &msg.body) {
            Ok(()) => {
                info!("Notify: {} delivered [{}] {}", kind, msg.tier, msg.subject);
                NotifyOutcome::Delivered
            }
            Err(e) => {
                warn!("Notify: {} delivery failed: {}", kind, e);
                NotifyOutcome::Failed(e)
            }
        }
    }
}
