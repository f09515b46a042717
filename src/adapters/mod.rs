//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements         | Connects to                  |
//! |---------------|--------------------|------------------------------|
//! | `ble`         | RadioPort          | Simulated dual-role radio    |
//! | `gatt_server` | ControlPointPort   | Local characteristic table   |
//! | `hardware`    | ServoPort          | ESP32 LEDC PWM               |
//! |               | IndicatorPort      | ESP32 GPIO                   |
//! | `log_sink`    | EventSink          | Serial log output            |
//! | `time`        | Clock, DelayNs     | ESP32 system timer / sim     |

pub mod ble;
pub mod gatt_server;
pub mod hardware;
pub mod log_sink;
pub mod time;
