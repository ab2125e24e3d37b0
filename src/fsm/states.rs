//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers with no closures or heap.
//!
//! ```text
//!  INITIALIZING ──[setup complete]──▶ MONITORING
//!                                        │   ▲
//!                  [backup or flood wet] │   │ [sump dry]  (alarm cleared)
//!                                        ▼   │ [runtime ≥ max, sump band]
//!                                      PUMPING         (alarm kept)
//! ```
//!
//! Rules, checked every tick in priority order:
//!
//! 1. Backup or Flood wet: relay on.  Entering Pumping raises the alarm
//!    and queues the notification (Flood wins over Backup).
//! 2. Sump dry: relay off.  Leaving Pumping clears the alarm.
//! 3. Sump wet only: after `max_pump_run_time_ms` of Pumping the relay is
//!    forced off for a rest; the alarm stays.

use super::context::{DriveRequest, FsmContext};
use super::{StateDescriptor, StateId};
use crate::events::{EventKind, SumpEvent};
use crate::sensors::Level;
use log::{info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0: Initializing
        StateDescriptor {
            id: StateId::Initializing,
            name: "Initializing",
            on_enter: Some(initializing_enter),
            on_exit: None,
            on_update: initializing_update,
        },
        // Index 1: Monitoring
        StateDescriptor {
            id: StateId::Monitoring,
            name: "Monitoring",
            on_enter: Some(monitoring_enter),
            on_exit: Some(monitoring_exit),
            on_update: monitoring_update,
        },
        // Index 2: Pumping
        StateDescriptor {
            id: StateId::Pumping,
            name: "Pumping",
            on_enter: Some(pumping_enter),
            on_exit: Some(pumping_exit),
            on_update: pumping_update,
        },
    ]
}

/// The alarm kind the current floats call for, if any.
fn high_water_kind(ctx: &FsmContext) -> Option<EventKind> {
    if ctx.floats.is_on(Level::Flood) {
        Some(EventKind::Flood)
    } else if ctx.floats.is_on(Level::Backup) {
        Some(EventKind::Backup)
    } else {
        None
    }
}

fn raise_drive_alarm(ctx: &mut FsmContext, kind: EventKind) {
    ctx.drive_alarm = Some(kind);
    ctx.request(DriveRequest::RaiseAlarm(kind));
    ctx.request(DriveRequest::Notify(SumpEvent::from_kind(kind)));
}

// ═══════════════════════════════════════════════════════════════════════════
//  INITIALIZING state
// ═══════════════════════════════════════════════════════════════════════════

fn initializing_enter(ctx: &mut FsmContext) {
    ctx.commands.relay_on = false;
    info!("INITIALIZING: relay held off until setup completes");
}

fn initializing_update(ctx: &mut FsmContext) -> Option<StateId> {
    // Left only by AppService::complete_setup.
    ctx.commands.relay_on = false;
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  MONITORING state: relay off, watching the floats
// ═══════════════════════════════════════════════════════════════════════════

fn monitoring_enter(ctx: &mut FsmContext) {
    ctx.commands.relay_on = false;
    ctx.pump_started_ms = None;
    ctx.pump_test.requested = false;
    info!("MONITORING: relay off, floats {}", ctx.floats);
}

fn monitoring_exit(ctx: &mut FsmContext) {
    if ctx.pump_test.running_since_ms.take().is_some() {
        info!("MONITORING: pump test run preempted");
    }
    ctx.pump_test.requested = false;
}

fn monitoring_update(ctx: &mut FsmContext) -> Option<StateId> {
    // Rule 1, unconditional
    if high_water_kind(ctx).is_some() {
        return Some(StateId::Pumping);
    }

    // Manual pump test run overrides rule 2 for its duration
    if let Some(since) = ctx.pump_test.running_since_ms {
        if ctx.now_ms.wrapping_sub(since) >= ctx.config.pump_test_duration_ms {
            ctx.pump_test.running_since_ms = None;
            ctx.commands.relay_on = false;
            info!("MONITORING: pump test run complete");
        }
        return None;
    }

    if core::mem::take(&mut ctx.pump_test.requested) {
        let allowed = ctx
            .pump_test
            .last_run_ms
            .is_none_or(|last| ctx.now_ms.wrapping_sub(last) >= ctx.config.pump_test_min_interval_ms);
        if allowed {
            ctx.pump_test.running_since_ms = Some(ctx.now_ms);
            ctx.pump_test.last_run_ms = Some(ctx.now_ms);
            ctx.commands.relay_on = true;
            info!(
                "MONITORING: pump test run for {}ms",
                ctx.config.pump_test_duration_ms
            );
            return None;
        }
        info!("MONITORING: pump test skipped, last run too recent");
    }

    // Rules 2 and 3: relay stays off while monitoring
    ctx.commands.relay_on = false;
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  PUMPING state: relay on
// ═══════════════════════════════════════════════════════════════════════════

fn pumping_enter(ctx: &mut FsmContext) {
    ctx.commands.relay_on = true;
    ctx.pump_started_ms = Some(ctx.now_ms);
    match high_water_kind(ctx) {
        Some(kind) => {
            warn!("PUMPING: {} level wet, relay on ({})", kind, ctx.floats);
            raise_drive_alarm(ctx, kind);
        }
        None => info!("PUMPING: relay on"),
    }
}

fn pumping_exit(ctx: &mut FsmContext) {
    ctx.commands.relay_on = false;
    ctx.pump_started_ms = None;
    ctx.drive_alarm = None;
}

fn pumping_update(ctx: &mut FsmContext) -> Option<StateId> {
    // Rule 1: keep running; escalate if the water rose further
    if let Some(kind) = high_water_kind(ctx) {
        ctx.commands.relay_on = true;
        if ctx.drive_alarm.is_none_or(|raised| kind > raised) {
            warn!("PUMPING: escalating to {} ({})", kind, ctx.floats);
            raise_drive_alarm(ctx, kind);
        }
        return None;
    }

    // Rule 2: water gone
    if !ctx.sump_on() {
        info!("PUMPING: sump dry, relay off");
        ctx.request(DriveRequest::ClearAlarm);
        return Some(StateId::Monitoring);
    }

    // Rule 3: sustained duty in the pumping band
    let ran_ms = ctx.pump_runtime_ms().unwrap_or(0);
    if ran_ms >= ctx.config.max_pump_run_time_ms {
        warn!(
            "PUMPING: runtime {}s reached limit {}s, forcing rest",
            ran_ms / 1000,
            ctx.config.max_pump_run_time_ms / 1000
        );
        ctx.request(DriveRequest::SafetyCutoff { ran_ms });
        return Some(StateId::Monitoring);
    }

    ctx.commands.relay_on = true;
    None
}
