//! SumpGuard firmware library.
//!
//! Exposes the pure-logic modules for integration testing and the firmware
//! binary. All ESP-IDF-specific code is guarded by
//! `#[cfg(feature = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod alarm;
pub mod app;
pub mod config;
pub mod dry;
pub mod error;
pub mod events;
pub mod fsm;
pub mod notify;
pub mod safety;
pub mod scheduler;
pub mod sensors;

pub mod adapters;
pub mod drivers;
