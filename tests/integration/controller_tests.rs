//! Integration tests for the FlowerController → runner → actuator pipeline.
//!
//! These run on the host (x86_64) against the simulated radio and GATT
//! table, on one manual clock, so advertising windows and servo sweeps
//! complete instantly while their durations are still accounted for.

use crate::mock_hw::{Rig, SENSOR};

use airflower::adapters::time::SimClock;
use airflower::app::events::AppEvent;
use airflower::app::ports::{Clock, ControlPointPort, IndicatorOutput};
use airflower::app::service::FlowerController;
use airflower::config::SystemConfig;
use airflower::control::actuator::ActuatorController;
use airflower::error::{ActuatorError, ConfigError, Error, Gas, RadioError};
use airflower::radio::gatt::ControlPoint;

fn started(rig: &mut Rig) -> FlowerController {
    let mut ctl = FlowerController::new(SystemConfig::default()).unwrap();
    ctl.start(&mut rig.io()).unwrap();
    rig.sink.clear();
    ctl
}

fn radio_events(rig: &Rig) -> Vec<AppEvent> {
    rig.sink
        .events
        .iter()
        .filter(|e| {
            matches!(
                e,
                AppEvent::BaseStationConnected
                    | AppEvent::BaseStationNotFound
                    | AppEvent::SensorConnected
                    | AppEvent::SensorLost
            )
        })
        .cloned()
        .collect()
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn startup_sweeps_then_rests_open() {
    let mut rig = Rig::new();
    let mut ctl = FlowerController::new(SystemConfig::default()).unwrap();
    ctl.start(&mut rig.io()).unwrap();

    // Three sweeps of 50 degrees out and back.
    assert_eq!(rig.hw.servo_writes(), 300);
    assert_eq!(ctl.angle(), 145);
    assert_eq!(ctl.current_level(), 0);
    assert_eq!(rig.gatt.read(ControlPoint::MinCo2), 400);
    assert_eq!(rig.gatt.read(ControlPoint::Mode), 0);
    assert_eq!(rig.sink.events, vec![AppEvent::Started { angle: 145 }]);
}

#[test]
fn startup_reports_servo_fault() {
    let mut rig = Rig::new();
    rig.hw.fail_servo = true;
    let mut ctl = FlowerController::new(SystemConfig::default()).unwrap();

    assert_eq!(
        ctl.start(&mut rig.io()),
        Err(Error::Actuator(ActuatorError::PwmWriteFailed))
    );
    assert_eq!(
        rig.sink.events,
        vec![AppEvent::ActuatorRejected(ActuatorError::PwmWriteFailed)]
    );
}

// ── Steady state ──────────────────────────────────────────────

#[test]
fn first_tick_connects_and_maps_reading() {
    let mut rig = Rig::populated(1200, 100);
    let mut ctl = started(&mut rig);

    assert_eq!(ctl.tick(&mut rig.io()).unwrap(), 5);

    assert_eq!(
        radio_events(&rig),
        vec![AppEvent::BaseStationConnected, AppEvent::SensorConnected]
    );
    assert_eq!(rig.sink.count(|e| *e == AppEvent::LevelChanged { from: 0, to: 5 }), 1);

    // CO2 band 5, TVOC band 0, mode Max.
    assert_eq!(ctl.current_level(), 5);
    assert_eq!(ctl.angle(), 120);
    assert_eq!(rig.hw.last_angle(), Some(120));
    assert_eq!(rig.hw.indicator(IndicatorOutput::A), Some(true));
    assert_eq!(rig.hw.indicator(IndicatorOutput::B), Some(false));

    assert_eq!(rig.gatt.read(ControlPoint::CurrentCo2), 1200);
    assert_eq!(rig.gatt.read(ControlPoint::CurrentTvoc), 100);
    assert_eq!(rig.gatt.read(ControlPoint::CurrentLevel), 5);

    let t = rig.sink.last_telemetry().unwrap();
    assert_eq!(t.level, 5);
    assert_eq!(t.angle, 120);
    assert!(t.sensor_connected);
    assert!(t.base_station_connected);
    // Read after the 200 ms settle, published after the 250 ms move.
    assert_eq!(t.reading_age_ms, Some(250));
}

#[test]
fn quick_second_tick_only_runs_radio_maintenance() {
    let mut rig = Rig::populated(1200, 100);
    let mut ctl = started(&mut rig);
    ctl.tick(&mut rig.io()).unwrap();

    rig.clock.advance(10);
    assert_eq!(ctl.tick(&mut rig.io()).unwrap(), 1);
}

#[test]
fn step_adds_idle_delay() {
    let mut rig = Rig::populated(400, 0);
    let mut ctl = started(&mut rig);
    ctl.tick(&mut rig.io()).unwrap();

    let before = rig.clock.now_ms();
    ctl.step(&mut rig.io()).unwrap();
    assert_eq!(rig.clock.now_ms(), before + 10);
}

// ── Radio scheduling ──────────────────────────────────────────

#[test]
fn advertising_window_retries_after_interval_and_drops_sensor_first() {
    let mut rig = Rig::new();
    rig.radio.set_sensor(Some(SENSOR));
    let mut ctl = started(&mut rig);

    // Window opens at 3200 after the settle and runs to its deadline.
    ctl.tick(&mut rig.io()).unwrap();
    assert_eq!(
        radio_events(&rig),
        vec![AppEvent::BaseStationNotFound, AppEvent::SensorConnected]
    );
    assert_eq!(ctl.radio_state().last_advertise_ms, Some(5_200));
    assert_eq!(rig.radio.advertise_starts(), 1);

    // 5 s later: too early for another window.
    rig.clock.set_ms(10_200);
    ctl.tick(&mut rig.io()).unwrap();
    assert_eq!(rig.radio.advertise_starts(), 1);
    assert_eq!(rig.radio.sensor_links(), 1);

    // 11 s after the last attempt: the sensor link is torn down, the
    // window runs, then the sensor comes back.
    rig.sink.clear();
    rig.clock.set_ms(16_200);
    ctl.tick(&mut rig.io()).unwrap();
    assert_eq!(rig.radio.advertise_starts(), 2);
    assert_eq!(
        radio_events(&rig),
        vec![
            AppEvent::BaseStationNotFound,
            AppEvent::SensorLost,
            AppEvent::SensorConnected
        ]
    );

    assert_eq!(rig.radio.scans_while_advertising(), 0);
    assert_eq!(rig.radio.max_sensor_links(), 1);
}

#[test]
fn connected_base_station_suppresses_windows_until_lost() {
    let mut rig = Rig::populated(400, 0);
    let mut ctl = started(&mut rig);
    ctl.tick(&mut rig.io()).unwrap();

    rig.clock.set_ms(30_000);
    ctl.tick(&mut rig.io()).unwrap();
    assert_eq!(rig.radio.advertise_starts(), 1);

    rig.radio.drop_base_station();
    rig.clock.set_ms(31_000);
    ctl.tick(&mut rig.io()).unwrap();
    assert_eq!(rig.radio.advertise_starts(), 2);
    assert_eq!(rig.sink.count(|e| *e == AppEvent::BaseStationConnected), 2);
    assert!(rig.radio.base_station_linked());
    assert_eq!(rig.radio.sensor_links(), 1);
}

#[test]
fn lost_sensor_keeps_last_reading() {
    let mut rig = Rig::populated(1200, 100);
    let mut ctl = started(&mut rig);
    ctl.tick(&mut rig.io()).unwrap();

    rig.radio.drop_sensor_links();
    rig.radio.set_sensor(None);
    rig.clock.advance(600);
    ctl.tick(&mut rig.io()).unwrap();

    assert_eq!(rig.sink.count(|e| *e == AppEvent::SensorLost), 1);
    assert_eq!(ctl.current_level(), 5);
    let t = rig.sink.last_telemetry().unwrap();
    assert!(!t.sensor_connected);
    // Reading from 3200; the missed scan took its full second.
    assert_eq!(rig.clock.now_ms(), 5_050);
    assert_eq!(t.reading_age_ms, Some(1_850));
}

#[test]
fn failed_read_demotes_then_reconnects() {
    let mut rig = Rig::populated(1200, 100);
    let mut ctl = started(&mut rig);
    ctl.tick(&mut rig.io()).unwrap();

    rig.radio.fail_next_read(RadioError::ServiceUnavailable);
    rig.clock.advance(600);
    ctl.tick(&mut rig.io()).unwrap();
    assert_eq!(rig.radio.sensor_links(), 0);
    assert_eq!(rig.sink.count(|e| *e == AppEvent::SensorLost), 1);

    rig.clock.advance(10);
    ctl.tick(&mut rig.io()).unwrap();
    assert_eq!(rig.radio.sensor_links(), 1);
    assert_eq!(rig.radio.max_sensor_links(), 1);
}

// ── Thresholds and dashboard ──────────────────────────────────

#[test]
fn dashboard_level_is_adopted_and_held() {
    let mut rig = Rig::populated(1200, 100);
    let mut ctl = started(&mut rig);
    ctl.tick(&mut rig.io()).unwrap();
    assert_eq!(ctl.current_level(), 5);

    rig.gatt.client_write(ControlPoint::Mode, &[3]).unwrap();
    rig.gatt
        .client_write(ControlPoint::CurrentLevel, &8u16.to_le_bytes())
        .unwrap();

    rig.clock.advance(1_100);
    ctl.tick(&mut rig.io()).unwrap();
    assert_eq!(ctl.thresholds().mode, 3);
    assert_eq!(ctl.current_level(), 8);
    assert_eq!(rig.sink.count(|e| *e == AppEvent::LevelChanged { from: 5, to: 8 }), 1);

    // Live data would give 5; Hold keeps the dashboard's 8.
    rig.clock.advance(1_100);
    ctl.tick(&mut rig.io()).unwrap();
    assert_eq!(ctl.current_level(), 8);
    assert_eq!(ctl.angle(), 105);
    assert_eq!(rig.hw.indicator(IndicatorOutput::A), Some(true));
    assert_eq!(rig.hw.indicator(IndicatorOutput::B), Some(true));
    assert_eq!(rig.gatt.read(ControlPoint::CurrentLevel), 8);
}

#[test]
fn dashboard_level_is_clamped_to_range() {
    let mut rig = Rig::populated(400, 0);
    let mut ctl = started(&mut rig);
    rig.gatt.client_write(ControlPoint::Mode, &[3]).unwrap();
    ctl.tick(&mut rig.io()).unwrap();

    rig.gatt
        .client_write(ControlPoint::CurrentLevel, &40u16.to_le_bytes())
        .unwrap();
    rig.clock.advance(1_100);
    ctl.tick(&mut rig.io()).unwrap();

    assert_eq!(ctl.current_level(), 10);
    assert_eq!(rig.gatt.read(ControlPoint::CurrentLevel), 10);
}

#[test]
fn empty_co2_range_keeps_level() {
    let mut rig = Rig::populated(1200, 100);
    let mut ctl = started(&mut rig);
    ctl.tick(&mut rig.io()).unwrap();

    let v = 1200u16.to_le_bytes();
    rig.gatt.client_write(ControlPoint::MinCo2, &v).unwrap();
    rig.gatt.client_write(ControlPoint::MaxCo2, &v).unwrap();
    rig.sink.clear();
    rig.clock.advance(1_100);
    ctl.tick(&mut rig.io()).unwrap();

    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::ThresholdsUpdated(_))), 1);
    assert_eq!(
        rig.sink
            .count(|e| *e == AppEvent::ConfigRejected(ConfigError::EmptyRange(Gas::Co2))),
        1
    );
    assert_eq!(ctl.current_level(), 5);
    assert_eq!(ctl.angle(), 120);
}

#[test]
fn unusable_mode_and_levels_are_reported() {
    let mut rig = Rig::populated(1200, 100);
    let mut ctl = started(&mut rig);
    ctl.tick(&mut rig.io()).unwrap();

    rig.gatt.client_write(ControlPoint::Mode, &[7]).unwrap();
    rig.clock.advance(1_100);
    ctl.tick(&mut rig.io()).unwrap();
    assert_eq!(rig.sink.count(|e| *e == AppEvent::ConfigRejected(ConfigError::UnknownMode(7))), 1);

    rig.gatt.client_write(ControlPoint::Mode, &[0]).unwrap();
    rig.gatt.client_write(ControlPoint::NumLevels, &[0]).unwrap();
    rig.clock.advance(1_100);
    ctl.tick(&mut rig.io()).unwrap();
    assert_eq!(rig.sink.count(|e| *e == AppEvent::ConfigRejected(ConfigError::ZeroLevels)), 1);
    assert_eq!(ctl.current_level(), 5);
}

#[test]
fn zero_levels_without_reading_keeps_level() {
    let mut rig = Rig::new();
    let mut ctl = started(&mut rig);
    rig.gatt
        .client_write(ControlPoint::CurrentLevel, &4u16.to_le_bytes())
        .unwrap();
    ctl.tick(&mut rig.io()).unwrap();
    assert_eq!(ctl.current_level(), 4);
    assert!(ctl.reading().is_none());

    rig.gatt.client_write(ControlPoint::NumLevels, &[0]).unwrap();
    rig.sink.clear();
    rig.clock.advance(1_100);
    ctl.tick(&mut rig.io()).unwrap();

    assert_eq!(rig.sink.count(|e| *e == AppEvent::ConfigRejected(ConfigError::ZeroLevels)), 1);
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::LevelChanged { .. })), 0);
    assert_eq!(ctl.current_level(), 4);
    assert_eq!(rig.gatt.read(ControlPoint::CurrentLevel), 4);
}

#[test]
fn stuck_sensor_link_blocks_window_but_keeps_reading() {
    let mut rig = Rig::populated(1200, 100);
    let mut ctl = started(&mut rig);
    ctl.tick(&mut rig.io()).unwrap();
    rig.radio.drop_base_station();
    rig.radio.fail_disconnects(RadioError::DisconnectFailed, 100);

    rig.sink.clear();
    rig.clock.advance(11_000);
    ctl.tick(&mut rig.io()).unwrap();

    assert_eq!(rig.radio.advertise_starts(), 1);
    assert!(radio_events(&rig).is_empty());
    assert!(ctl.radio_state().role.sensor().is_some());
    assert_eq!(rig.radio.max_sensor_links(), 1);
    assert_eq!(ctl.reading().map(|r| r.co2), Some(1200));
}

#[test]
fn servo_fault_is_reported_not_fatal() {
    let mut rig = Rig::populated(1200, 100);
    let mut ctl = started(&mut rig);
    rig.hw.fail_servo = true;

    assert_eq!(ctl.tick(&mut rig.io()).unwrap(), 5);
    assert_eq!(
        rig.sink
            .count(|e| *e == AppEvent::ActuatorRejected(ActuatorError::PwmWriteFailed)),
        1
    );
    assert_eq!(ctl.angle(), 145);
}

// ── Actuator bounds ───────────────────────────────────────────

#[test]
fn out_of_range_target_never_moves_servo() {
    let mut hw = crate::mock_hw::MockHardware::new();
    let mut delay = SimClock::new();
    let mut act = ActuatorController::new(92, 145, 145, 10);

    assert_eq!(
        act.move_to(200, &mut hw, &mut delay),
        Err(ActuatorError::OutOfRange {
            target: 200,
            min: 92,
            max: 145
        })
    );
    assert_eq!(hw.servo_writes(), 0);
    assert_eq!(delay.now_ms(), 0);
    assert_eq!(act.current_angle(), 145);
}
