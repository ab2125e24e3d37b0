//! WiFi station-mode adapter.
//!
//! Implements [`ConnectivityPort`].  The radio itself sits behind [`WifiLink`]:
//!
//! - **`espidf` feature**: [`EspWifiLink`] over `esp_idf_svc::wifi::BlockingWifi`.
//! - **host**: [`SimLink`], scripted for tests.
//!
//! ## Reconnection policy
//!
//! `ensure_connected` makes at most one association attempt per backoff
//! window.  The window starts at 2 s and doubles on every failure, capped
//! at 60 s; a successful association resets it.  Inside the window the
//! call returns immediately, so a dead access point never stalls the
//! control loop.

use log::{info, warn};

use super::time::Clock;
use crate::app::ports::{ConnectivityError, ConnectivityPort};

const INITIAL_BACKOFF_MS: u32 = 2_000;
const MAX_BACKOFF_MS: u32 = 60_000;

// ───────────────────────────────────────────────────────────────
// Radio boundary
// ───────────────────────────────────────────────────────────────

/// The platform radio.
pub trait WifiLink {
    /// Associate with `ssid`.  May block for the association handshake.
    fn connect(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError>;

    fn is_up(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connected,
    Reconnecting { attempt: u32 },
}

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConnectivityError::NotConfigured);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if !password.is_empty() && !(8..=64).contains(&password.len()) {
        return Err(ConnectivityError::NotConfigured);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter<L, C> {
    link: L,
    clock: C,
    state: WifiState,
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    backoff_ms: u32,
    /// Window in force since the last failed attempt.
    wait_ms: u32,
    last_attempt_ms: Option<u32>,
}

impl<L: WifiLink, C: Clock> WifiAdapter<L, C> {
    pub fn new(link: L, clock: C) -> Self {
        Self {
            link,
            clock,
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            backoff_ms: INITIAL_BACKOFF_MS,
            wait_ms: 0,
            last_attempt_ms: None,
        }
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    pub fn backoff_ms(&self) -> u32 {
        self.backoff_ms
    }

    pub fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid
            .push_str(ssid)
            .map_err(|()| ConnectivityError::NotConfigured)?;
        self.password.clear();
        self.password
            .push_str(password)
            .map_err(|()| ConnectivityError::NotConfigured)?;
        info!("WiFi: credentials updated (SSID='{}')", self.ssid);
        Ok(())
    }

    /// One association attempt, subject to the backoff window.
    pub fn try_connect(&mut self) -> Result<(), ConnectivityError> {
        if self.ssid.is_empty() {
            return Err(ConnectivityError::NotConfigured);
        }
        let now = self.clock.now_ms();
        if let Some(last) = self.last_attempt_ms {
            if now.wrapping_sub(last) < self.wait_ms {
                return Err(ConnectivityError::BackingOff);
            }
        }
        self.last_attempt_ms = Some(now);

        let attempt = match self.state {
            WifiState::Reconnecting { attempt } => attempt + 1,
            _ => 0,
        };
        info!("WiFi: connecting to '{}' (attempt {})", self.ssid, attempt);

        match self.link.connect(&self.ssid, &self.password) {
            Ok(()) => {
                self.state = WifiState::Connected;
                self.backoff_ms = INITIAL_BACKOFF_MS;
                self.wait_ms = 0;
                self.last_attempt_ms = None;
                info!("WiFi: connected");
                Ok(())
            }
            Err(e) => {
                self.state = WifiState::Reconnecting { attempt };
                warn!("WiFi: connection failed ({}), retry in {}s", e, self.backoff_ms / 1000);
                self.wait_ms = self.backoff_ms;
                self.backoff_ms = self.backoff_ms.saturating_mul(2).min(MAX_BACKOFF_MS);
                Err(e)
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// ConnectivityPort
// ───────────────────────────────────────────────────────────────

impl<L: WifiLink, C: Clock> ConnectivityPort for WifiAdapter<L, C> {
    fn is_connected(&self) -> bool {
        self.state == WifiState::Connected && self.link.is_up()
    }

    fn ensure_connected(&mut self) -> bool {
        if self.is_connected() {
            return true;
        }
        if self.state == WifiState::Connected {
            warn!("WiFi: connection lost, entering reconnect");
            self.state = WifiState::Reconnecting { attempt: 0 };
        }
        match self.try_connect() {
            Ok(()) => true,
            Err(ConnectivityError::BackingOff) => false,
            Err(e) => {
                log::debug!("WiFi: ensure_connected: {}", e);
                false
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Host simulation link
// ───────────────────────────────────────────────────────────────

/// Scripted radio: fails the first `fail_next` attempts, then associates.
#[derive(Debug, Default)]
pub struct SimLink {
    pub fail_next: u32,
    pub up: bool,
    pub attempts: u32,
}

impl WifiLink for SimLink {
    fn connect(&mut self, ssid: &str, _password: &str) -> Result<(), ConnectivityError> {
        self.attempts += 1;
        if self.fail_next > 0 {
            self.fail_next -= 1;
            warn!("WiFi(sim): simulated association failure for '{}'", ssid);
            self.up = false;
            return Err(ConnectivityError::AssociationFailed);
        }
        self.up = true;
        Ok(())
    }

    fn is_up(&self) -> bool {
        self.up
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF link
// ───────────────────────────────────────────────────────────────

#[cfg(feature = "espidf")]
pub use esp::EspWifiLink;

#[cfg(feature = "espidf")]
mod esp {
    use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};
    use log::warn;

    use super::WifiLink;
    use crate::app::ports::ConnectivityError;

    pub struct EspWifiLink {
        wifi: BlockingWifi<EspWifi<'static>>,
    }

    impl EspWifiLink {
        pub fn new(wifi: BlockingWifi<EspWifi<'static>>) -> Self {
            Self { wifi }
        }
    }

    impl WifiLink for EspWifiLink {
        fn connect(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
            let config = Configuration::Client(ClientConfiguration {
                ssid: ssid.try_into().map_err(|_| ConnectivityError::NotConfigured)?,
                password: password
                    .try_into()
                    .map_err(|_| ConnectivityError::NotConfigured)?,
                auth_method: if password.is_empty() {
                    AuthMethod::None
                } else {
                    AuthMethod::WPA2Personal
                },
                ..Default::default()
            });
            self.wifi.set_configuration(&config).map_err(|e| {
                warn!("WiFi(esp): set_configuration: {:?}", e);
                ConnectivityError::AssociationFailed
            })?;
            if !self.wifi.is_started().unwrap_or(false) {
                self.wifi
                    .start()
                    .map_err(|_| ConnectivityError::AssociationFailed)?;
            }
            self.wifi
                .connect()
                .map_err(|_| ConnectivityError::AssociationFailed)?;
            self.wifi
                .wait_netif_up()
                .map_err(|_| ConnectivityError::AssociationFailed)
        }

        fn is_up(&self) -> bool {
            self.wifi.is_connected().unwrap_or(false)
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
