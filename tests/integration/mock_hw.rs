//! Mock adapters for integration tests.
//!
//! Records every servo and indicator call so tests can assert on the full
//! command history without touching real GPIO/PWM registers.  [`Rig`]
//! bundles them with the simulated radio, clock and GATT table.

use airflower::adapters::ble::SimRadio;
use airflower::adapters::gatt_server::GattServer;
use airflower::adapters::time::SimClock;
use airflower::app::events::AppEvent;
use airflower::app::ports::{BleAddress, EventSink, IndicatorOutput, IndicatorPort, ServoPort};
use airflower::app::service::Io;
use airflower::error::ActuatorError;

/// Default sensor address `C8:AE:54:01:AC:A9` in transport order.
pub const SENSOR: BleAddress = [0xA9, 0xAC, 0x01, 0x54, 0xAE, 0xC8];

// ── Hardware call record ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwCall {
    Servo(u8),
    Indicator(IndicatorOutput, bool),
}

// ── MockHardware ──────────────────────────────────────────────

#[derive(Default)]
pub struct MockHardware {
    pub calls: Vec<HwCall>,
    pub fail_servo: bool,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn servo_writes(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, HwCall::Servo(_)))
            .count()
    }

    pub fn last_angle(&self) -> Option<u8> {
        self.calls.iter().rev().find_map(|c| match c {
            HwCall::Servo(a) => Some(*a),
            _ => None,
        })
    }

    pub fn indicator(&self, output: IndicatorOutput) -> Option<bool> {
        self.calls.iter().rev().find_map(|c| match c {
            HwCall::Indicator(o, high) if *o == output => Some(*high),
            _ => None,
        })
    }
}

impl ServoPort for MockHardware {
    fn set_angle(&mut self, degrees: u8) -> Result<(), ActuatorError> {
        if self.fail_servo {
            return Err(ActuatorError::PwmWriteFailed);
        }
        self.calls.push(HwCall::Servo(degrees));
        Ok(())
    }
}

impl IndicatorPort for MockHardware {
    fn digital_write(&mut self, output: IndicatorOutput, high: bool) {
        self.calls.push(HwCall::Indicator(output, high));
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn last_telemetry(&self) -> Option<airflower::app::events::TelemetryData> {
        self.events.iter().rev().find_map(|e| match e {
            AppEvent::Telemetry(t) => Some(*t),
            _ => None,
        })
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Rig ───────────────────────────────────────────────────────

/// Every adapter the controller needs, on one shared simulated clock.
pub struct Rig {
    pub clock: SimClock,
    pub delay: SimClock,
    pub radio: SimRadio,
    pub hw: MockHardware,
    pub gatt: GattServer,
    pub sink: RecordingSink,
}

#[allow(dead_code)]
impl Rig {
    /// Empty airspace: no base station, no sensor.
    pub fn new() -> Self {
        let clock = SimClock::new();
        Self {
            delay: clock.clone(),
            radio: SimRadio::new().with_clock(clock.clone()),
            clock,
            hw: MockHardware::new(),
            gatt: GattServer::new(),
            sink: RecordingSink::default(),
        }
    }

    /// Base station in range and the sensor reporting `co2` / `tvoc`.
    pub fn populated(co2: u16, tvoc: u16) -> Self {
        let mut rig = Self::new();
        rig.radio.set_base_station_present(true);
        rig.radio.set_sensor(Some(SENSOR));
        rig.radio.set_reading(co2, tvoc);
        rig
    }

    pub fn io(&mut self) -> Io<'_, SimRadio, MockHardware, SimClock, SimClock, GattServer, RecordingSink> {
        Io {
            radio: &mut self.radio,
            hw: &mut self.hw,
            clock: &self.clock,
            delay: &mut self.delay,
            gatt: &mut self.gatt,
            sink: &mut self.sink,
        }
    }
}
