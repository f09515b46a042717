//! Flower controller — the hexagonal core.
//!
//! [`FlowerController`] owns every piece of device state: thresholds,
//! the last reading, the current level, the radio role scheduler, the
//! actuator and the task runner.  All I/O flows through port traits
//! bundled into an [`Io`] at the call site, making the entire controller
//! testable with simulated adapters.
//!
//! ```text
//!   RadioPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                 │       FlowerController       │
//!  ControlPoint ◀▶│ radio · intensity · actuator │──▶ ServoPort
//!                 │        task runner           │──▶ IndicatorPort
//!                 └──────────────────────────────┘
//! ```

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use log::{error, info, warn};

use crate::config::SystemConfig;
use crate::control::actuator::ActuatorController;
use crate::control::indicator::IndicatorController;
use crate::control::intensity::{combine_levels, CalculationMode, Thresholds};
use crate::error::{ConfigError, Error, Result};
use crate::radio::gatt::ControlPoint;
use crate::radio::{BaseStationOutcome, RadioRoleScheduler, RadioState, Reading, SensorOutcome};
use crate::scheduler::{PeriodicTaskRunner, TaskId};

use super::events::{AppEvent, TelemetryData};
use super::ports::{
    Clock, ControlPointPort, EventSink, IndicatorPort, RadioPort, ServoPort, TaskDelegate,
};

// ───────────────────────────────────────────────────────────────
// Port bundle
// ───────────────────────────────────────────────────────────────

/// Every port the controller drives, borrowed for one call.
///
/// `hw` serves as both [`ServoPort`] and [`IndicatorPort`].
pub struct Io<'a, R, H, C, D, G, S> {
    pub radio: &'a mut R,
    pub hw: &'a mut H,
    pub clock: &'a C,
    pub delay: &'a mut D,
    pub gatt: &'a mut G,
    pub sink: &'a mut S,
}

// ───────────────────────────────────────────────────────────────
// FlowerController
// ───────────────────────────────────────────────────────────────

/// The controller orchestrates all domain logic.
pub struct FlowerController {
    flower: FlowerState,
    runner: PeriodicTaskRunner,
}

/// Everything the task bodies touch.
struct FlowerState {
    config: SystemConfig,
    thresholds: Thresholds,
    reading: Option<Reading>,
    current_level: u16,
    /// Last `current_level` value written to the control point.
    published_level: Option<u16>,
    radio: RadioRoleScheduler,
    actuator: ActuatorController,
    indicator: IndicatorController,
}

impl FlowerController {
    /// Construct the controller from configuration.
    ///
    /// Validates the configuration and normalises the sensor address.
    /// Does **not** touch any port; call [`start`](Self::start) next.
    pub fn new(config: SystemConfig) -> Result<Self> {
        if let Err(e) = config.validate() {
            error!("Configuration rejected: {}", e);
            return Err(Error::Init("invalid configuration"));
        }
        let radio = RadioRoleScheduler::new(&config).map_err(|e| {
            error!("Sensor address rejected: {}", e);
            Error::Init("invalid sensor address")
        })?;
        let actuator = ActuatorController::new(
            config.min_angle,
            config.max_angle,
            config.rest_angle,
            config.servo_step_delay_ms,
        );
        let runner = PeriodicTaskRunner::from_config(&config);

        Ok(Self {
            flower: FlowerState {
                thresholds: config.thresholds(),
                reading: None,
                current_level: 0,
                published_level: None,
                radio,
                actuator,
                indicator: IndicatorController::new(),
                config,
            },
            runner,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Self-test the actuator, publish the initial control points and arm
    /// every task.
    pub fn start<R, H, C, D, G, S>(&mut self, io: &mut Io<'_, R, H, C, D, G, S>) -> Result<()>
    where
        H: ServoPort + IndicatorPort,
        D: DelayNs,
        G: ControlPointPort,
        S: EventSink,
    {
        let cycles = self.flower.config.self_test_cycles;
        info!("FlowerController: self-test ({} sweeps)", cycles);
        for _ in 0..cycles {
            self.exercise(io)?;
        }

        self.flower.publish_initial(io.gatt);
        self.runner.reset();

        let angle = self.flower.actuator.current_angle();
        io.sink.emit(&AppEvent::Started { angle });
        info!("FlowerController started at {}°", angle);
        Ok(())
    }

    /// Sweep the whole level range up and back down.  Live data is held off
    /// for the duration.
    pub fn exercise<R, H, C, D, G, S>(&mut self, io: &mut Io<'_, R, H, C, D, G, S>) -> Result<()>
    where
        H: ServoPort + IndicatorPort,
        D: DelayNs,
        S: EventSink,
    {
        let f = &mut self.flower;
        let n = f.thresholds.num_levels;
        let saved_mode = f.thresholds.mode;
        f.thresholds.mode = CalculationMode::Hold as u8;

        let mut result = Ok(());
        for level in (0..n).chain((0..=n).rev()) {
            f.current_level = level;
            if let Err(e) = f.actuator.apply_level(level, n, io.hw, io.delay) {
                result = Err(e);
                break;
            }
            f.indicator.set_level(level, n, io.hw);
        }

        f.thresholds.mode = saved_mode;
        if let Err(e) = result {
            warn!("Self-test sweep aborted: {}", e);
            f.report(io.sink, e);
        }
        result
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one pass of the task runner.  Returns how many tasks ran.
    pub fn tick<R, H, C, D, G, S>(&mut self, io: &mut Io<'_, R, H, C, D, G, S>) -> Result<usize>
    where
        R: RadioPort,
        H: ServoPort + IndicatorPort,
        C: Clock,
        D: DelayNs,
        G: ControlPointPort,
        S: EventSink,
    {
        let clock = io.clock;
        let mut tasks = TaskContext {
            flower: &mut self.flower,
            io,
        };
        self.runner.tick(clock, &mut tasks)
    }

    /// One loop iteration: a runner pass followed by the idle delay.
    pub fn step<R, H, C, D, G, S>(&mut self, io: &mut Io<'_, R, H, C, D, G, S>) -> Result<usize>
    where
        R: RadioPort,
        H: ServoPort + IndicatorPort,
        C: Clock,
        D: DelayNs,
        G: ControlPointPort,
        S: EventSink,
    {
        let ran = self.tick(io)?;
        io.delay.delay_ms(self.flower.config.idle_delay_ms);
        Ok(ran)
    }

    /// The control loop.  Only returns on a fatal error.
    pub fn run<R, H, C, D, G, S>(&mut self, io: &mut Io<'_, R, H, C, D, G, S>) -> Result<Infallible>
    where
        R: RadioPort,
        H: ServoPort + IndicatorPort,
        C: Clock,
        D: DelayNs,
        G: ControlPointPort,
        S: EventSink,
    {
        loop {
            self.step(io)?;
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn current_level(&self) -> u16 {
        self.flower.current_level
    }

    pub fn thresholds(&self) -> Thresholds {
        self.flower.thresholds
    }

    pub fn reading(&self) -> Option<Reading> {
        self.flower.reading
    }

    pub fn angle(&self) -> u8 {
        self.flower.actuator.current_angle()
    }

    pub fn radio_state(&self) -> &RadioState {
        self.flower.radio.state()
    }

    pub fn indicators(&self) -> Option<(bool, bool)> {
        self.flower.indicator.last_written()
    }

    pub fn runner(&self) -> &PeriodicTaskRunner {
        &self.runner
    }

    pub fn set_task_enabled(&mut self, id: TaskId, enabled: bool) {
        self.runner.set_enabled(id, enabled);
    }

    pub fn config(&self) -> &SystemConfig {
        &self.flower.config
    }
}

// ───────────────────────────────────────────────────────────────
// Task dispatch
// ───────────────────────────────────────────────────────────────

struct TaskContext<'c, 'a, R, H, C, D, G, S> {
    flower: &'c mut FlowerState,
    io: &'c mut Io<'a, R, H, C, D, G, S>,
}

impl<R, H, C, D, G, S> TaskDelegate for TaskContext<'_, '_, R, H, C, D, G, S>
where
    R: RadioPort,
    H: ServoPort + IndicatorPort,
    C: Clock,
    D: DelayNs,
    G: ControlPointPort,
    S: EventSink,
{
    fn run_task(&mut self, id: TaskId) -> Result<()> {
        match id {
            TaskId::RadioMaintenance => self.flower.radio_maintenance(self.io),
            TaskId::SensorRead => self.flower.sensor_read(self.io),
            TaskId::ThresholdSync => self.flower.threshold_sync(self.io),
            TaskId::LevelUpdate => self.flower.level_update(self.io),
            TaskId::TelemetryPublish => self.flower.telemetry_publish(self.io),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Task bodies
// ───────────────────────────────────────────────────────────────

impl FlowerState {
    /// Base station first, then the sensor.
    fn radio_maintenance<R, H, C, D, G, S>(&mut self, io: &mut Io<'_, R, H, C, D, G, S>) -> Result<()>
    where
        R: RadioPort,
        C: Clock,
        D: DelayNs,
        S: EventSink,
    {
        let had_sensor = self.radio.role().sensor().is_some();

        match self.radio.ensure_base_station(io.radio, io.clock, io.delay) {
            Ok(BaseStationOutcome::Connected) => io.sink.emit(&AppEvent::BaseStationConnected),
            Ok(BaseStationOutcome::NotFound) => io.sink.emit(&AppEvent::BaseStationNotFound),
            Ok(
                BaseStationOutcome::Skipped
                | BaseStationOutcome::AlreadyConnected
                | BaseStationOutcome::Blocked,
            ) => {}
            Err(e) => warn!("Base station window failed: {}", e),
        }

        self.radio.prune_sensor(io.radio);
        if had_sensor && self.radio.role().sensor().is_none() {
            io.sink.emit(&AppEvent::SensorLost);
        }

        if self.radio.ensure_sensor(io.radio, io.clock) == SensorOutcome::Connected {
            io.sink.emit(&AppEvent::SensorConnected);
        }
        Ok(())
    }

    fn sensor_read<R, H, C, D, G, S>(&mut self, io: &mut Io<'_, R, H, C, D, G, S>) -> Result<()>
    where
        R: RadioPort,
        C: Clock,
        S: EventSink,
    {
        let had_sensor = self.radio.role().sensor().is_some();
        match self.radio.read_sensor(io.radio, io.clock) {
            Some(reading) => self.reading = Some(reading),
            None if had_sensor && self.radio.role().sensor().is_none() => {
                io.sink.emit(&AppEvent::SensorLost);
            }
            None => {}
        }
        Ok(())
    }

    fn threshold_sync<R, H, C, D, G, S>(&mut self, io: &mut Io<'_, R, H, C, D, G, S>) -> Result<()>
    where
        G: ControlPointPort,
        S: EventSink,
    {
        let gatt = &*io.gatt;
        let fresh = Thresholds {
            co2_min: gatt.read(ControlPoint::MinCo2),
            co2_max: gatt.read(ControlPoint::MaxCo2),
            tvoc_min: gatt.read(ControlPoint::MinTvoc),
            tvoc_max: gatt.read(ControlPoint::MaxTvoc),
            num_levels: gatt.read(ControlPoint::NumLevels),
            mode: gatt.read(ControlPoint::Mode) as u8,
        };
        if fresh != self.thresholds {
            self.thresholds = fresh;
            io.sink.emit(&AppEvent::ThresholdsUpdated(fresh));
        }
        Ok(())
    }

    fn level_update<R, H, C, D, G, S>(&mut self, io: &mut Io<'_, R, H, C, D, G, S>) -> Result<()>
    where
        H: ServoPort + IndicatorPort,
        D: DelayNs,
        S: EventSink,
    {
        let n = self.thresholds.num_levels;
        if n == 0 {
            self.report(io.sink, ConfigError::ZeroLevels.into());
            return Ok(());
        }
        let computed = match self.reading {
            Some(reading) => Self::compute_level(&self.thresholds, &reading),
            None => self.thresholds.calculation_mode().map(|_| None),
        };
        let target = match computed {
            Ok(Some(level)) => level,
            Ok(None) => self.current_level.min(n),
            Err(e) => {
                self.report(io.sink, e.into());
                return Ok(());
            }
        };

        if target != self.current_level {
            io.sink.emit(&AppEvent::LevelChanged {
                from: self.current_level,
                to: target,
            });
            self.current_level = target;
        }
        self.apply_outputs(io);
        Ok(())
    }

    fn telemetry_publish<R, H, C, D, G, S>(&mut self, io: &mut Io<'_, R, H, C, D, G, S>) -> Result<()>
    where
        R: RadioPort,
        C: Clock,
        G: ControlPointPort,
        S: EventSink,
    {
        if let Some(r) = self.reading {
            io.gatt.write(ControlPoint::CurrentCo2, r.co2);
            io.gatt.write(ControlPoint::CurrentTvoc, r.tvoc);
        }

        // A value we did not write came from the dashboard.
        let seen = io.gatt.read(ControlPoint::CurrentLevel);
        if self.published_level.is_some_and(|p| p != seen) {
            let adopted = seen.min(self.thresholds.num_levels);
            info!("Dashboard set level {} (adopted {})", seen, adopted);
            if adopted != self.current_level {
                io.sink.emit(&AppEvent::LevelChanged {
                    from: self.current_level,
                    to: adopted,
                });
                self.current_level = adopted;
            }
        }
        if seen != self.current_level {
            io.gatt.write(ControlPoint::CurrentLevel, self.current_level);
        }
        self.published_level = Some(self.current_level);

        let now = io.clock.now_ms();
        let telemetry = TelemetryData {
            co2_ppm: self.reading.map_or(0, |r| r.co2),
            tvoc_ppb: self.reading.map_or(0, |r| r.tvoc),
            level: self.current_level,
            num_levels: self.thresholds.num_levels,
            angle: self.actuator.current_angle(),
            sensor_connected: self.radio.role().sensor().is_some(),
            base_station_connected: self
                .radio
                .state()
                .base_station
                .is_some_and(|h| io.radio.is_alive(h)),
            reading_age_ms: self.reading.map(|r| now.saturating_sub(r.taken_at_ms)),
        };
        io.sink.emit(&AppEvent::Telemetry(telemetry));
        Ok(())
    }

    // ── Helpers ───────────────────────────────────────────────

    fn compute_level(t: &Thresholds, reading: &Reading) -> core::result::Result<Option<u16>, ConfigError> {
        if t.num_levels == 0 {
            return Err(ConfigError::ZeroLevels);
        }
        let mode = t.calculation_mode()?;
        let co2 = t.co2_level(reading.co2)?;
        let tvoc = t.tvoc_level(reading.tvoc)?;
        Ok(combine_levels(co2, tvoc, mode, t.num_levels))
    }

    /// Drive servo and indicators to the current level.
    fn apply_outputs<R, H, C, D, G, S>(&mut self, io: &mut Io<'_, R, H, C, D, G, S>)
    where
        H: ServoPort + IndicatorPort,
        D: DelayNs,
        S: EventSink,
    {
        let n = self.thresholds.num_levels;
        if let Err(e) = self.actuator.apply_level(self.current_level, n, io.hw, io.delay) {
            self.report(io.sink, e);
            return;
        }
        self.indicator.set_level(self.current_level, n, io.hw);
    }

    fn publish_initial(&mut self, gatt: &mut impl ControlPointPort) {
        let t = self.thresholds;
        gatt.write(ControlPoint::MinCo2, t.co2_min);
        gatt.write(ControlPoint::MaxCo2, t.co2_max);
        gatt.write(ControlPoint::MinTvoc, t.tvoc_min);
        gatt.write(ControlPoint::MaxTvoc, t.tvoc_max);
        gatt.write(ControlPoint::NumLevels, t.num_levels);
        gatt.write(ControlPoint::Mode, u16::from(t.mode));
        gatt.write(ControlPoint::CurrentCo2, 0);
        gatt.write(ControlPoint::CurrentTvoc, 0);
        gatt.write(ControlPoint::CurrentLevel, self.current_level);
        self.published_level = Some(self.current_level);
    }

    fn report(&self, sink: &mut impl EventSink, e: Error) {
        match e {
            Error::Config(c) => sink.emit(&AppEvent::ConfigRejected(c)),
            Error::Actuator(a) => sink.emit(&AppEvent::ActuatorRejected(a)),
            other => warn!("{}", other),
        }
    }
}
