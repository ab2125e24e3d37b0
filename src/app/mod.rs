//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the controller for the SumpGuard system: the
//! per-tick pipeline that runs the floats through debounce, plausibility,
//! the dry tracker, the pump drive FSM, the alarm engine, and the
//! notification outbox.  All interaction with hardware and the network
//! happens through **port traits** defined in [`ports`], keeping this layer
//! fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
