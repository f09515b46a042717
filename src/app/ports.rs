//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ FlowerController (domain)
//! ```
//!
//! Driven adapters (radio, servo, indicators, control points, event sinks)
//! implement these traits.  The [`FlowerController`](super::service::FlowerController)
//! consumes them via generics, so the domain core never touches hardware
//! or the radio stack directly.

use crate::error::{ActuatorError, RadioError};
use crate::radio::gatt::ControlPoint;

// ───────────────────────────────────────────────────────────────
// Radio port (driven adapter: domain ↔ BLE stack)
// ───────────────────────────────────────────────────────────────

/// Transport-level address, least significant byte first.
pub type BleAddress = [u8; 6];

/// Non-owning connection id.  Liveness must be queried through
/// [`RadioPort::is_alive`]; holding a handle keeps nothing open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnHandle(pub u16);

/// Advertisement payload for the peripheral role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisingDescriptor {
    /// Complete local name.
    pub name: heapless::String<24>,
    /// Advertise as general-discoverable.
    pub discoverable: bool,
    /// Advertise as connectable.
    pub connectable: bool,
}

/// One scan result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    pub address: BleAddress,
    pub rssi: i8,
}

/// Maximum characteristic payload read in one operation.
pub const MAX_CHAR_LEN: usize = 20;

/// Dual-role radio transport.
///
/// The peripheral side (advertising, inbound connections) and the central
/// side (scanning, outbound connections) share one controller.  Callers are
/// responsible for never scanning while advertising; the
/// [`RadioRoleScheduler`](crate::radio::RadioRoleScheduler) enforces it.
pub trait RadioPort {
    fn start_advertising(
        &mut self,
        descriptor: &AdvertisingDescriptor,
        interval_ms: u32,
    ) -> Result<(), RadioError>;

    fn stop_advertising(&mut self) -> Result<(), RadioError>;

    /// Whether any peer is connected in either role.
    fn is_connected(&self) -> bool;

    /// Live connections, oldest first.
    fn connections(&self) -> heapless::Vec<ConnHandle, 4>;

    /// One finite scan pass.  Stops early at the first advertisement the
    /// filter accepts.  Can be restarted any number of times.
    fn scan(
        &mut self,
        timeout_ms: u32,
        filter: &mut dyn FnMut(&Advertisement) -> bool,
    ) -> Result<Option<Advertisement>, RadioError>;

    fn connect(&mut self, peer: &Advertisement) -> Result<ConnHandle, RadioError>;

    /// Read a characteristic by 128-bit service and characteristic UUID.
    fn read(
        &mut self,
        conn: ConnHandle,
        service: u128,
        characteristic: u128,
    ) -> Result<heapless::Vec<u8, MAX_CHAR_LEN>, RadioError>;

    fn disconnect(&mut self, conn: ConnHandle) -> Result<(), RadioError>;

    fn is_alive(&self, conn: ConnHandle) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Actuator ports (driven adapters: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Positional servo.
pub trait ServoPort {
    /// Command the servo to `degrees`.  No range checking happens here.
    fn set_angle(&mut self, degrees: u8) -> Result<(), ActuatorError>;
}

/// The two indicator outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorOutput {
    A,
    B,
}

pub trait IndicatorPort {
    fn digital_write(&mut self, output: IndicatorOutput, high: bool);
}

// ───────────────────────────────────────────────────────────────
// Control point port (driven adapter: domain ↔ local GATT table)
// ───────────────────────────────────────────────────────────────

/// The device's own GATT characteristics, as seen by the domain.
///
/// Implementations store each value as a fixed-width little-endian
/// integer and hand it back widened to `u16`.
pub trait ControlPointPort {
    fn read(&self, point: ControlPoint) -> u16;

    fn write(&mut self, point: ControlPoint, value: u16);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Task delegate (decouples the runner from the controller)
// ───────────────────────────────────────────────────────────────

/// Callback trait that the [`PeriodicTaskRunner`](crate::scheduler::PeriodicTaskRunner)
/// invokes for every due task.
///
/// The runner only decides *when*; the implementor decides *what*.
pub trait TaskDelegate {
    fn run_task(&mut self, id: crate::scheduler::TaskId) -> crate::error::Result<()>;
}
