//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (the test
//! button today) that the [`AppService`](super::service::AppService)
//! interprets and acts upon.

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Silence and clear the active alarm.
    Acknowledge,

    /// Play every alarm pattern once and request a pump test run.
    RunSelfTest,
}
