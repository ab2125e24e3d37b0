//! SumpGuard Firmware: Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   WifiAdapter    HttpNotifier  │
//! │  (Sensor+Actuator) (EventSink)    (Connectivity) (Delivery)    │
//! │  RemoteConfigClient               MonotonicClock               │
//! │  (ConfigSource)                                                │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Floats · Validator · Dry · Drive FSM · Alarm · Notify │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Scheduler (delegate-driven) · Button ISR latch                │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Pin map
//!
//! | GPIO | Function           | Polarity                    |
//! |------|--------------------|-----------------------------|
//! | 4    | Sump float         | active-low, internal pull-up|
//! | 5    | Backup float       | active-low, internal pull-up|
//! | 6    | Flood float        | active-low, internal pull-up|
//! | 7    | Pump relay         | active-high                 |
//! | 15   | Buzzer             | active-high                 |
//! | 16   | Indicator LED      | active-high                 |
//! | 0    | Test button        | active-low, falling edge    |
#![deny(unused_must_use)]

use anyhow::Result;
use log::{info, warn};

use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{
    AnyInputPin, AnyOutputPin, Input, InputPin as _, InterruptType, Output, OutputPin as _,
    PinDriver, Pull,
};
use esp_idf_hal::prelude::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

use sumpguard::adapters::device_id;
use sumpguard::adapters::hardware::HardwareAdapter;
use sumpguard::adapters::http::{BaseUrl, EspHttpTransport, HttpNotifier, RemoteConfigClient};
use sumpguard::adapters::log_sink::LogEventSink;
use sumpguard::adapters::time::MonotonicClock;
use sumpguard::adapters::wifi::{EspWifiLink, WifiAdapter};
use sumpguard::app::ports::{ConnectivityPort, SchedulerDelegate};
use sumpguard::app::service::AppService;
use sumpguard::config::SystemConfig;
use sumpguard::drivers::Polarity;
use sumpguard::drivers::button::BUTTON;
use sumpguard::drivers::float_switch::FloatSwitch;
use sumpguard::drivers::output::DigitalOutput;
use sumpguard::error::{CommsError, Error};
use sumpguard::scheduler::{ScheduleId, Scheduler};

type FloatPin = PinDriver<'static, AnyInputPin, Input>;
type OutPin = PinDriver<'static, AnyOutputPin, Output>;

/// Upper bound on one loop sleep, so beep segments keep time.
const OUTPUT_POLL_MS: u32 = 20;

const WIFI_SSID: &str = match option_env!("SUMPGUARD_WIFI_SSID") {
    Some(s) => s,
    None => "",
};
const WIFI_PASSWORD: &str = match option_env!("SUMPGUARD_WIFI_PASSWORD") {
    Some(s) => s,
    None => "",
};
const SERVER_URL: &str = match option_env!("SUMPGUARD_SERVER_URL") {
    Some(s) => s,
    None => "http://sumpguard.local",
};

// ── Scheduler delegate ────────────────────────────────────────
//
// The scheduler only records what is due; the loop body below decides
// what to run, so no port borrows leak into the scheduler.

#[derive(Default)]
struct DueFlags {
    control: bool,
    config_refresh: bool,
}

impl SchedulerDelegate for DueFlags {
    fn on_schedule_fired(&mut self, id: ScheduleId, _now_ms: u32) {
        match id {
            ScheduleId::ControlTick => self.control = true,
            ScheduleId::ConfigRefresh => self.config_refresh = true,
        }
    }
}

fn float_switch(pin: AnyInputPin) -> Result<FloatSwitch<FloatPin>> {
    let mut driver = PinDriver::input(pin)?;
    driver.set_pull(Pull::Up)?;
    Ok(FloatSwitch::new(driver, Polarity::ActiveLow))
}

fn output(pin: AnyOutputPin, name: &'static str) -> Result<DigitalOutput<OutPin>> {
    let driver = PinDriver::output(pin)?;
    Ok(DigitalOutput::new(driver, Polarity::ActiveHigh, name).map_err(Error::from)?)
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  SumpGuard v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let clock = MonotonicClock::new();
    let mut sink = LogEventSink::new();

    // ── 2. Core, started in Initializing (relay held off) ─────
    let mut service = AppService::new(SystemConfig::default()).map_err(Error::from)?;
    service.start(&mut sink);

    // ── 3. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let pins = peripherals.pins;

    let mut hw = HardwareAdapter::new(
        [
            float_switch(pins.gpio4.downgrade_input())?,
            float_switch(pins.gpio5.downgrade_input())?,
            float_switch(pins.gpio6.downgrade_input())?,
        ],
        output(pins.gpio7.downgrade_output(), "relay")?,
        output(pins.gpio15.downgrade_output(), "buzzer")?,
        output(pins.gpio16.downgrade_output(), "indicator")?,
    );

    let mut button = PinDriver::input(pins.gpio0.downgrade_input())?;
    button.set_pull(Pull::Up)?;
    button.set_interrupt_type(InterruptType::NegEdge)?;
    let isr_clock = MonotonicClock::new();
    // SAFETY: the callback only touches the lock-free `BUTTON` latch and
    // the ISR-safe system timer.
    unsafe {
        button.subscribe(move || {
            BUTTON.on_edge(isr_clock.now_ms());
        })?;
    }
    button.enable_interrupt()?;

    // ── 4. Network ────────────────────────────────────────────
    let mac = device_id::read_mac();
    let dev_id = device_id::device_id(&mac);
    info!("Device ID: {}", dev_id);

    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let radio = BlockingWifi::wrap(
        EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))?,
        sysloop,
    )?;
    let mut wifi = WifiAdapter::new(EspWifiLink::new(radio), MonotonicClock::new());
    match wifi.set_credentials(WIFI_SSID, WIFI_PASSWORD) {
        Ok(()) => {
            if !wifi.ensure_connected() {
                warn!("{}, monitoring offline", Error::from(CommsError::WifiConnectFailed));
            }
        }
        Err(e) => warn!("WiFi: {}, monitoring offline", e),
    }

    let base = BaseUrl::try_from(SERVER_URL).map_err(|()| Error::Init("server URL too long"))?;
    let mut courier = HttpNotifier::new(EspHttpTransport::new(), base.clone());
    let mut config_source = RemoteConfigClient::new(EspHttpTransport::new(), base, &dev_id);

    // ── 5. Monitoring ─────────────────────────────────────────
    service.complete_setup(clock.now_ms(), &mut sink);
    let mut scheduler = Scheduler::new(service.config());

    info!("System ready. Entering control loop.");

    loop {
        let now = clock.now_ms();
        let mut due = DueFlags::default();
        scheduler.tick(now, &mut due);

        if due.control {
            service.tick(now, &mut hw, &mut sink);
            service.poll_button(&BUTTON, now, &mut sink);
            service.flush_notifications(now, &mut wifi, &mut courier, &mut sink);
        }

        if due.config_refresh
            && wifi.ensure_connected()
            && service.refresh_config(&mut config_source, &mut sink)
        {
            scheduler.reconfigure(service.config());
        }

        // The driver masks the interrupt after every edge.
        if !BUTTON.is_pending() {
            if let Err(e) = button.enable_interrupt() {
                warn!("Button: re-enable interrupt failed: {:?}", e);
            }
        }

        let now = clock.now_ms();
        service.poll_outputs(now, &mut hw);
        FreeRtos::delay_ms(scheduler.idle_budget_ms(now).clamp(1, OUTPUT_POLL_MS));
    }
}
