//! HTTP adapters for notification delivery and remote configuration.
//!
//! | Type                 | Implements     | Endpoint                       |
//! |----------------------|----------------|--------------------------------|
//! | [`HttpNotifier`]     | DeliveryPort   | `POST {base}/notify`           |
//! | [`RemoteConfigClient`] | ConfigSource | `GET {base}/config?deviceid=…` |
//!
//! Both sit on an [`HttpTransport`]; on target that is
//! [`EspHttpTransport`] over `esp_idf_svc::http::client`, on the host it
//! is whatever the test supplies.
//!
//! Notification payload:
//!
//! ```text
//! {"type":"Critical","subject":"Sump flood alert","message":"…"}
//! ```
//!
//! A 200 is success; anything else is [`DeliveryError::HttpStatus`].

use core::fmt::Write as _;

use log::{debug, info, warn};
use serde::Serialize;

use crate::app::ports::{ConfigSource, DeliveryError, DeliveryPort, TransportError};
use crate::config::ConfigPatch;
use crate::events::EventKind;
use crate::notify::SeverityTier;

pub const NOTIFY_TIMEOUT_MS: u32 = 10_000;
pub const CONFIG_TIMEOUT_MS: u32 = 4_000;

const HTTP_OK: u16 = 200;
const CONFIG_BODY_CAPACITY: usize = 1024;

pub type BaseUrl = heapless::String<96>;
type Url = heapless::String<192>;

// ───────────────────────────────────────────────────────────────
// Transport boundary
// ───────────────────────────────────────────────────────────────

/// Blocking HTTP client with a per-request timeout.
pub trait HttpTransport {
    /// GET `url`, reading the body into `body`.  Returns the status code
    /// and the number of body bytes written.
    fn get(&mut self, url: &str, timeout_ms: u32, body: &mut [u8]) -> Result<(u16, usize), TransportError>;

    /// POST `payload` as `application/json`.  Returns the status code.
    fn post_json(&mut self, url: &str, timeout_ms: u32, payload: &[u8]) -> Result<u16, TransportError>;
}

fn endpoint(base: &str, path: &str) -> Option<Url> {
    let mut url = Url::new();
    write!(url, "{}{}", base.trim_end_matches('/'), path).ok()?;
    Some(url)
}

// ───────────────────────────────────────────────────────────────
// Notification delivery
// ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct NotifyPayload<'a> {
    #[serde(rename = "type")]
    tier: &'a str,
    subject: &'a str,
    message: &'a str,
}

pub struct HttpNotifier<T> {
    transport: T,
    base: BaseUrl,
}

impl<T: HttpTransport> HttpNotifier<T> {
    pub fn new(transport: T, base: BaseUrl) -> Self {
        Self { transport, base }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: HttpTransport> DeliveryPort for HttpNotifier<T> {
    fn deliver(
        &mut self,
        kind: EventKind,
        tier: SeverityTier,
        subject: &str,
        body: &str,
    ) -> Result<(), DeliveryError> {
        let url = endpoint(&self.base, "/notify").ok_or(DeliveryError::Encode)?;
        let payload = serde_json::to_vec(&NotifyPayload {
            tier: tier.as_str(),
            subject,
            message: body,
        })
        .map_err(|_| DeliveryError::Encode)?;

        debug!("HTTP: POST {} kind={} ({} bytes)", url, kind, payload.len());
        let status = self
            .transport
            .post_json(&url, NOTIFY_TIMEOUT_MS, &payload)?;
        if status != HTTP_OK {
            return Err(DeliveryError::HttpStatus(status));
        }
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Remote configuration
// ───────────────────────────────────────────────────────────────

pub struct RemoteConfigClient<T> {
    transport: T,
    base: BaseUrl,
    device_id: heapless::String<16>,
}

impl<T: HttpTransport> RemoteConfigClient<T> {
    pub fn new(transport: T, base: BaseUrl, device_id: &str) -> Self {
        let mut id = heapless::String::new();
        // Longer IDs are cut; the server keys on the prefix.
        for c in device_id.chars() {
            if id.push(c).is_err() {
                break;
            }
        }
        Self {
            transport,
            base,
            device_id: id,
        }
    }
}

impl<T: HttpTransport> ConfigSource for RemoteConfigClient<T> {
    fn fetch_config_patch(&mut self) -> Option<ConfigPatch> {
        let mut path = heapless::String::<48>::new();
        write!(path, "/config?deviceid={}", self.device_id).ok()?;
        let url = endpoint(&self.base, &path)?;

        let mut body = [0u8; CONFIG_BODY_CAPACITY];
        let (status, len) = match self.transport.get(&url, CONFIG_TIMEOUT_MS, &mut body) {
            Ok(r) => r,
            Err(e) => {
                warn!("HTTP: config fetch failed: {}", e);
                return None;
            }
        };
        if status != HTTP_OK {
            warn!("HTTP: config fetch returned status {}", status);
            return None;
        }

        match ConfigPatch::from_json(&body[..len]) {
            Ok(patch) => {
                info!("HTTP: config patch received ({} bytes)", len);
                Some(patch)
            }
            Err(e) => {
                warn!("HTTP: config body rejected: {}", e);
                None
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF transport
// ───────────────────────────────────────────────────────────────

#[cfg(feature = "espidf")]
pub use esp::EspHttpTransport;

#[cfg(feature = "espidf")]
mod esp {
    use core::time::Duration;

    use esp_idf_svc::http::Method;
    use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
    use log::warn;

    use super::HttpTransport;
    use crate::app::ports::TransportError;

    /// Opens a fresh connection per request; requests are minutes apart.
    #[derive(Default)]
    pub struct EspHttpTransport;

    impl EspHttpTransport {
        pub fn new() -> Self {
            Self
        }

        fn connect(timeout_ms: u32) -> Result<EspHttpConnection, TransportError> {
            EspHttpConnection::new(&Configuration {
                timeout: Some(Duration::from_millis(u64::from(timeout_ms))),
                ..Default::default()
            })
            .map_err(|e| {
                warn!("HTTP(esp): connection setup failed: {:?}", e);
                TransportError::Connect
            })
        }
    }

    impl HttpTransport for EspHttpTransport {
        fn get(
            &mut self,
            url: &str,
            timeout_ms: u32,
            body: &mut [u8],
        ) -> Result<(u16, usize), TransportError> {
            let mut conn = Self::connect(timeout_ms)?;
            conn.initiate_request(Method::Get, url, &[])
                .map_err(|_| TransportError::Connect)?;
            conn.initiate_response().map_err(|_| TransportError::Timeout)?;
            let status = conn.status();

            let mut len = 0;
            loop {
                if len == body.len() {
                    let mut probe = [0u8; 1];
                    if conn.read(&mut probe).map_err(|_| TransportError::Io)? > 0 {
                        return Err(TransportError::BodyTooLarge);
                    }
                    break;
                }
                let n = conn
                    .read(&mut body[len..])
                    .map_err(|_| TransportError::Io)?;
                if n == 0 {
                    break;
                }
                len += n;
            }
            Ok((status, len))
        }

        fn post_json(
            &mut self,
            url: &str,
            timeout_ms: u32,
            payload: &[u8],
        ) -> Result<u16, TransportError> {
            let mut conn = Self::connect(timeout_ms)?;
            let mut content_len = heapless::String::<12>::new();
            core::fmt::Write::write_fmt(&mut content_len, format_args!("{}", payload.len()))
                .map_err(|_| TransportError::Io)?;
            let headers = [
                ("Content-Type", "application/json"),
                ("Content-Length", content_len.as_str()),
            ];
            conn.initiate_request(Method::Post, url, &headers)
                .map_err(|_| TransportError::Connect)?;

            let mut written = 0;
            while written < payload.len() {
                written += conn
                    .write(&payload[written..])
                    .map_err(|_| TransportError::Io)?;
            }
            conn.initiate_response().map_err(|_| TransportError::Timeout)?;
            Ok(conn.status())
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
