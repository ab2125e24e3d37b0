//! Application service, the hexagonal core.
//!
//! [`AppService`] owns the float bank, plausibility monitor, dry tracker,
//! pump drive FSM, alarm engine, and notification outbox.  It exposes a
//! hardware-agnostic API; all I/O flows through port traits injected at
//! call sites, making the entire service testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                 │          AppService          │
//! ActuatorPort ◀──│  Floats · Validator · Dry    │ ──▶ DeliveryPort
//!                 │  Drive FSM · Alarm · Outbox  │ ◀── ConfigSource
//!                 └──────────────────────────────┘
//! ```
//!
//! Per tick: read & debounce → validate → dry tracker → drive FSM →
//! alarm engine → outputs.  Notifications are queued during the tick and
//! delivered by [`flush_notifications`](AppService::flush_notifications)
//! afterwards, so a slow network never delays the relay.

use heapless::Deque;
use log::{debug, info, warn};

use crate::alarm::{AlarmEngine, RaiseOutcome};
use crate::config::{ConfigPatch, SystemConfig};
use crate::drivers::button::ButtonLatch;
use crate::dry::DryTracker;
use crate::error::ActuatorError;
use crate::events::{EventKind, SumpEvent};
use crate::fsm::context::{DriveRequest, FsmContext};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::notify::Notifier;
use crate::safety::{Plausibility, PlausibilityMonitor};
use crate::sensors::{FloatBank, FloatStates};

use super::commands::AppCommand;
use super::events::AppEvent;
use super::ports::{
    ActuatorPort, ConfigError, ConfigSource, ConnectivityPort, DeliveryPort, EventSink, SensorPort,
};

/// One slot per event kind is enough: pending events of the same kind
/// are coalesced.
const OUTBOX_CAPACITY: usize = 8;

/// Last value successfully written to each output.  `None` forces a write.
#[derive(Debug, Default)]
struct DrivenOutputs {
    relay: Option<bool>,
    buzzer: Option<bool>,
    indicator: Option<bool>,
}

fn write_if_changed(
    latched: &mut Option<bool>,
    want: bool,
    name: &str,
    write: impl FnOnce(bool) -> Result<(), ActuatorError>,
) {
    if *latched == Some(want) {
        return;
    }
    match write(want) {
        Ok(()) => *latched = Some(want),
        Err(e) => {
            *latched = None;
            warn!("Output {}: {}", name, e);
        }
    }
}

fn apply_log_level(config: &SystemConfig) {
    let level = if config.debug_logging_enabled {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    log::set_max_level(level);
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService {
    fsm: Fsm,
    ctx: FsmContext,
    floats: FloatBank,
    plausibility: PlausibilityMonitor,
    dry: DryTracker,
    alarm: AlarmEngine,
    notifier: Notifier,
    outbox: Deque<SumpEvent, OUTBOX_CAPACITY>,
    driven: DrivenOutputs,
    tick_count: u64,
}

impl AppService {
    /// Construct the service from a validated configuration.
    ///
    /// Does **not** start the FSM; call [`start`](Self::start) next.
    pub fn new(config: SystemConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let floats = FloatBank::new(config.debounce_confirm_count)?;
        apply_log_level(&config);

        Ok(Self {
            fsm: Fsm::new(build_state_table(), StateId::Initializing),
            ctx: FsmContext::new(config),
            floats,
            plausibility: PlausibilityMonitor::new(),
            dry: DryTracker::new(),
            alarm: AlarmEngine::new(),
            notifier: Notifier::new(),
            outbox: Deque::new(),
            driven: DrivenOutputs::default(),
            tick_count: 0,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Start the FSM in Initializing (relay held off).
    pub fn start(&mut self, sink: &mut impl EventSink) {
        self.fsm.start(&mut self.ctx);
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
        info!("AppService started in {}", self.fsm.current_state());
    }

    /// Peripherals and network are up: begin monitoring and announce the
    /// restart.
    pub fn complete_setup(&mut self, now_ms: u32, sink: &mut impl EventSink) {
        let prev = self.fsm.current_state();
        if prev != StateId::Initializing {
            return;
        }
        self.ctx.now_ms = now_ms;
        self.fsm.force_transition(StateId::Monitoring, &mut self.ctx);
        self.drain_drive_requests(sink);
        self.enqueue(SumpEvent::Reset);
        sink.emit(&AppEvent::StateChanged {
            from: prev,
            to: self.fsm.current_state(),
        });
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full control cycle.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`ActuatorPort`], which avoids a double mutable borrow.
    pub fn tick(
        &mut self,
        now_ms: u32,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;
        let prev_state = self.fsm.current_state();

        // 1. Read & debounce
        let reading = self.floats.read_all(hw);

        // 2. Plausibility: reported, never gating
        if let Plausibility::Invalid(snapshot) = self.plausibility.evaluate(&reading.current) {
            sink.emit(&AppEvent::SensorFault(snapshot));
            self.raise_alarm(EventKind::BadState, sink);
            self.enqueue(SumpEvent::BadState(snapshot));
        }

        // 3. Dry / refill
        if let Some(event) = self.dry.update(&reading, now_ms, self.ctx.config.dry_age_notify_ms) {
            self.enqueue(event);
        }

        // 4. Pump drive
        self.ctx.now_ms = now_ms;
        self.ctx.floats = reading.current;
        self.fsm.tick(&mut self.ctx);
        self.drain_drive_requests(sink);

        // 5. Alarm re-beep
        self.alarm.tick(now_ms);

        // 6. Outputs
        self.poll_outputs(now_ms, hw);

        let new_state = self.fsm.current_state();
        if new_state != prev_state {
            sink.emit(&AppEvent::StateChanged {
                from: prev_state,
                to: new_state,
            });
        }
    }

    /// Drive relay, buzzer, and indicator from current state.  Call between
    /// ticks as often as the main loop spins so beep patterns keep time.
    pub fn poll_outputs(&mut self, now_ms: u32, hw: &mut impl ActuatorPort) {
        let alarm = self.alarm.poll(now_ms);
        write_if_changed(&mut self.driven.relay, self.ctx.commands.relay_on, "relay", |on| {
            hw.set_relay(on)
        });
        write_if_changed(&mut self.driven.buzzer, alarm.buzzer, "buzzer", |on| {
            hw.set_buzzer(on)
        });
        write_if_changed(&mut self.driven.indicator, alarm.indicator, "indicator", |on| {
            hw.set_indicator_led(on)
        });
    }

    // ── Notifications ─────────────────────────────────────────

    /// Hand every queued event to the throttler.  Failures are logged and
    /// dropped; the throttle window decides when a kind is tried again.
    pub fn flush_notifications(
        &mut self,
        now_ms: u32,
        link: &mut impl ConnectivityPort,
        courier: &mut impl DeliveryPort,
        sink: &mut impl EventSink,
    ) -> usize {
        let min_period = self.ctx.config.min_notify_period_ms;
        let mut handled = 0;
        while let Some(event) = self.outbox.pop_front() {
            let outcome = self.notifier.notify(&event, now_ms, min_period, link, courier);
            sink.emit(&AppEvent::Notification {
                kind: event.kind(),
                outcome,
            });
            handled += 1;
        }
        handled
    }

    // ── Manual control ────────────────────────────────────────

    /// Consume one button press: acknowledge an active alarm, otherwise
    /// run the self-test.  The latch is disarmed while the press is handled.
    pub fn poll_button(&mut self, latch: &ButtonLatch, now_ms: u32, sink: &mut impl EventSink) -> bool {
        if !latch.take_press() {
            return false;
        }
        latch.disarm();
        let cmd = if self.alarm.is_active() {
            AppCommand::Acknowledge
        } else {
            AppCommand::RunSelfTest
        };
        info!("Button: {:?}", cmd);
        self.handle_command(cmd, now_ms, sink);
        latch.arm();
        true
    }

    /// Process an external command.
    pub fn handle_command(&mut self, cmd: AppCommand, now_ms: u32, sink: &mut impl EventSink) {
        match cmd {
            AppCommand::Acknowledge => self.acknowledge(sink),
            AppCommand::RunSelfTest => self.run_self_test(now_ms, sink),
        }
    }

    /// Stop the active alarm.
    pub fn acknowledge(&mut self, sink: &mut impl EventSink) {
        let was_active = self.alarm.is_active();
        self.alarm.stop();
        if was_active {
            sink.emit(&AppEvent::AlarmCleared);
        }
    }

    /// Play every alarm pattern once and request a pump test run.  The
    /// pump test is only requested while Monitoring; in any other state the
    /// drive owns the relay and the request is dropped.
    pub fn run_self_test(&mut self, now_ms: u32, sink: &mut impl EventSink) {
        if !self.alarm.self_test(now_ms) {
            debug!("Self-test: patterns already playing");
        }
        match self.fsm.current_state() {
            StateId::Monitoring => self.ctx.pump_test.requested = true,
            other => info!("Self-test: pump test run not requested in {}", other),
        }
        sink.emit(&AppEvent::SelfTest);
    }

    // ── Configuration ─────────────────────────────────────────

    /// Pull a patch from `source` and apply it.  Returns `true` if a new
    /// configuration went live.
    pub fn refresh_config(&mut self, source: &mut impl ConfigSource, sink: &mut impl EventSink) -> bool {
        match source.fetch_config_patch() {
            Some(patch) => self.apply_patch(&patch, sink).is_ok(),
            None => {
                warn!("Config: no patch available, keeping current configuration");
                false
            }
        }
    }

    /// Validate `patch` against the live config and swap the result in
    /// whole, recomputing debounce masks and log level in the same step.
    pub fn apply_patch(&mut self, patch: &ConfigPatch, sink: &mut impl EventSink) -> Result<(), ConfigError> {
        let next = self
            .ctx
            .config
            .patched(patch)
            .and_then(|next| self.floats.reconfigure(next.debounce_confirm_count).map(|()| next));

        match next {
            Ok(next) => {
                apply_log_level(&next);
                self.ctx.config = next;
                info!("Config: patch applied");
                sink.emit(&AppEvent::ConfigApplied);
                Ok(())
            }
            Err(e) => {
                warn!("Config: patch rejected ({}), keeping current configuration", e);
                sink.emit(&AppEvent::ConfigRejected(e));
                Err(e)
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn relay_on(&self) -> bool {
        self.ctx.commands.relay_on
    }

    pub fn is_alarm_active(&self) -> bool {
        self.alarm.is_active()
    }

    pub fn active_alarm(&self) -> Option<EventKind> {
        self.alarm.active()
    }

    pub fn float_states(&self) -> FloatStates {
        self.floats.confirmed()
    }

    pub fn is_dry(&self) -> bool {
        self.dry.is_dry()
    }

    pub fn config(&self) -> &SystemConfig {
        &self.ctx.config
    }

    pub fn pending_notifications(&self) -> usize {
        self.outbox.len()
    }

    /// Total control ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    // ── Internal ──────────────────────────────────────────────

    fn raise_alarm(&mut self, kind: EventKind, sink: &mut impl EventSink) {
        match self.alarm.raise(kind) {
            RaiseOutcome::Raised => sink.emit(&AppEvent::AlarmRaised(kind)),
            RaiseOutcome::Ignored { active } => sink.emit(&AppEvent::AlarmIgnored { kind, active }),
        }
    }

    fn drain_drive_requests(&mut self, sink: &mut impl EventSink) {
        for req in self.ctx.take_requests() {
            match req {
                DriveRequest::RaiseAlarm(kind) => self.raise_alarm(kind, sink),
                DriveRequest::ClearAlarm => self.acknowledge(sink),
                DriveRequest::Notify(event) => self.enqueue(event),
                DriveRequest::SafetyCutoff { ran_ms } => {
                    sink.emit(&AppEvent::SafetyCutoff { ran_ms });
                }
            }
        }
    }

    /// Queue an event for delivery.  A pending event of the same kind is
    /// replaced so the latest payload wins.
    fn enqueue(&mut self, event: SumpEvent) {
        if let Some(pending) = self.outbox.iter_mut().find(|e| e.kind() == event.kind()) {
            *pending = event;
            return;
        }
        if self.outbox.is_full() {
            if let Some(dropped) = self.outbox.pop_front() {
                warn!("Outbox full, dropping {} notification", dropped.kind());
            }
        }
        if self.outbox.push_back(event).is_err() {
            warn!("Outbox full, dropping {} notification", event.kind());
        }
    }
}
