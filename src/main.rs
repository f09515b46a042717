//! AirFlower host simulation.
//!
//! Runs the full control loop on the host against the simulated dual-role
//! radio and in-memory GATT table, with a scripted base station and sensor.
//! Hexagonal architecture with a cooperative, single-threaded task loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter     SimRadio      GattServer    Esp32Time     │
//! │  (Servo+Indicator)   (RadioPort)   (ControlPt)   (Clock+Delay) │
//! │  LogEventSink                                                  │
//! │  (EventSink)                                                   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            FlowerController (pure logic)               │    │
//! │  │  RadioRoleScheduler · Intensity · Actuator · Indicator │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  PeriodicTaskRunner (delegate-driven)                          │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

#[cfg(target_os = "espidf")]
compile_error!(
    "airflower-sim runs on the host only; build the library with \
     `--no-default-features --features espidf` for ESP32 targets"
);

use anyhow::{Context, Result};
use log::info;

use airflower::adapters::ble::SimRadio;
use airflower::adapters::gatt_server::GattServer;
use airflower::adapters::hardware::HardwareAdapter;
use airflower::adapters::log_sink::LogEventSink;
use airflower::adapters::time::Esp32TimeAdapter;
use airflower::app::service::{FlowerController, Io};
use airflower::config::SystemConfig;
use airflower::radio::address::parse_address;

fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    info!("╔══════════════════════════════════════╗");
    info!("║  AirFlower sim v{}                ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Peripherals ────────────────────────────────────────
    airflower::drivers::hw_init::init_peripherals().context("peripheral init")?;

    let config = SystemConfig::default();

    // ── 3. Adapters ───────────────────────────────────────────
    let clock = Esp32TimeAdapter::new();
    let mut delay = Esp32TimeAdapter::new();
    let mut hw = HardwareAdapter::default();
    let mut gatt = GattServer::new();
    let mut sink = LogEventSink::new();

    // Scripted peers: a base station that connects once advertised to,
    // and the configured sensor reporting a fixed reading.
    let mut radio = SimRadio::new();
    radio.set_base_station_present(true);
    radio.set_sensor(Some(
        parse_address(&config.sensor_address).context("sensor address")?,
    ));
    radio.set_reading(850, 120);

    // ── 4. Controller ─────────────────────────────────────────
    let mut controller = FlowerController::new(config).context("controller init")?;
    let mut io = Io {
        radio: &mut radio,
        hw: &mut hw,
        clock: &clock,
        delay: &mut delay,
        gatt: &mut gatt,
        sink: &mut sink,
    };
    controller.start(&mut io).context("startup")?;

    info!("System ready. Entering control loop.");

    // ── 5. Control loop ───────────────────────────────────────
    let fatal = controller.run(&mut io)?;
    match fatal {}
}
