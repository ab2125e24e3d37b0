//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (the ESP-IDF logger on target, which goes to UART /
//! USB-CDC).  One line per event, `TAG | key=value` style.
//!
//! Events that repeat every tick while a condition persists (a float
//! fault, an alarm raise refused by severity, a throttled notification)
//! are logged at `Debug`; their onset is logged elsewhere at a higher level.

use log::{Level, log};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::notify::NotifyOutcome;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

/// Log level for one event.
fn level_of(event: &AppEvent) -> Level {
    match event {
        AppEvent::AlarmIgnored { .. } | AppEvent::SensorFault(_) => Level::Debug,
        AppEvent::Notification { outcome: NotifyOutcome::Suppressed, .. } => Level::Debug,
        AppEvent::AlarmRaised(_)
        | AppEvent::SafetyCutoff { .. }
        | AppEvent::ConfigRejected(_)
        | AppEvent::Notification { outcome: NotifyOutcome::Failed(_), .. } => Level::Warn,
        _ => Level::Info,
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        let level = level_of(event);
        match event {
            AppEvent::Started(state) => {
                log!(level, "START | initial_state={}", state);
            }
            AppEvent::StateChanged { from, to } => {
                log!(level, "STATE | {} -> {}", from, to);
            }
            AppEvent::AlarmRaised(kind) => {
                log!(level, "ALARM | raised kind={}", kind);
            }
            AppEvent::AlarmIgnored { kind, active } => {
                log!(level, "ALARM | ignored kind={} active={}", kind, active);
            }
            AppEvent::AlarmCleared => {
                log!(level, "ALARM | cleared");
            }
            AppEvent::SensorFault(states) => {
                log!(level, "FAULT | floats implausible {}", states);
            }
            AppEvent::SafetyCutoff { ran_ms } => {
                log!(level, "PUMP  | safety cutoff after {}s", ran_ms / 1000);
            }
            AppEvent::SelfTest => {
                log!(level, "TEST  | self-test started");
            }
            AppEvent::ConfigApplied => {
                log!(level, "CONF  | applied");
            }
            AppEvent::ConfigRejected(e) => {
                log!(level, "CONF  | rejected: {}", e);
            }
            AppEvent::Notification { kind, outcome } => match outcome {
                NotifyOutcome::Delivered => log!(level, "NOTIFY | kind={} delivered", kind),
                NotifyOutcome::Suppressed => log!(level, "NOTIFY | kind={} suppressed", kind),
                NotifyOutcome::Failed(e) => log!(level, "NOTIFY | kind={} failed: {}", kind, e),
            },
        }
    }
}
