//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements         | Connects to                   |
//! |-------------|--------------------|-------------------------------|
//! | `hardware`  | SensorPort         | Float switch GPIO inputs      |
//! |             | ActuatorPort       | Relay, buzzer, LED GPIO       |
//! | `log_sink`  | EventSink          | Serial log output             |
//! | `wifi`      | ConnectivityPort   | ESP-IDF WiFi STA              |
//! | `http`      | DeliveryPort       | `POST /notify`                |
//! |             | ConfigSource       | `GET /config`                 |
//! | `time`      | Clock              | ESP32 system timer            |
//! | `device_id` |                    | eFuse MAC                     |

pub mod device_id;
pub mod hardware;
pub mod http;
pub mod log_sink;
pub mod time;
pub mod wifi;
