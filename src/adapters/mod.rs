//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements         | Connects to              |
//! |-----------------|--------------------|--------------------------|
//! | `http_decision` | DecisionPort       | esp-idf HTTP(S) client   |
//! | `log_sink`      | EventSink          | Serial log output        |
//! | `time`          | TimePort, DelayNs  | ESP32 system timer       |
//! | `wifi`          | ConnectivityPort   | ESP-IDF WiFi STA         |
//!
//! `SensorPort` is implemented by [`SensorHub`](crate::sensors::SensorHub).

pub mod http_decision;
pub mod log_sink;
pub mod time;
pub mod wifi;
