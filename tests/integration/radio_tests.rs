//! Integration tests for the radio role scheduler against the simulated
//! dual-role transport.

use crate::mock_hw::SENSOR;

use airflower::adapters::ble::SimRadio;
use airflower::adapters::time::SimClock;
use airflower::app::ports::Clock;
use airflower::config::SystemConfig;
use airflower::error::RadioError;
use airflower::radio::address::parse_address;
use airflower::radio::{BaseStationOutcome, RadioRole, RadioRoleScheduler, SensorOutcome};

fn setup() -> (RadioRoleScheduler, SimRadio, SimClock) {
    let clock = SimClock::new();
    let radio = SimRadio::new().with_clock(clock.clone());
    let sched = RadioRoleScheduler::new(&SystemConfig::default()).unwrap();
    (sched, radio, clock)
}

#[test]
fn bystanders_are_skipped_by_address() {
    let (mut sched, mut radio, clock) = setup();
    radio.add_bystander([1, 2, 3, 4, 5, 6]);
    radio.add_bystander([SENSOR[0], 0, 0, 0, 0, SENSOR[5]]);
    radio.set_sensor(Some(SENSOR));
    radio.set_reading(950, 40);

    assert_eq!(sched.ensure_sensor(&mut radio, &clock), SensorOutcome::Connected);
    assert_eq!(radio.sensor_links(), 1);

    clock.advance(500);
    let reading = sched.read_sensor(&mut radio, &clock).unwrap();
    assert_eq!((reading.co2, reading.tvoc, reading.taken_at_ms), (950, 40, 500));
}

#[test]
fn configured_address_selects_the_sensor() {
    let mut config = SystemConfig::default();
    config.sensor_address.clear();
    config.sensor_address.push_str("11:22:33:44:55:66").unwrap();
    let mut sched = RadioRoleScheduler::new(&config).unwrap();
    assert_eq!(sched.sensor_address(), [0x66, 0x55, 0x44, 0x33, 0x22, 0x11]);

    let clock = SimClock::new();
    let mut radio = SimRadio::new().with_clock(clock.clone());
    radio.set_sensor(Some(SENSOR));
    assert_eq!(sched.ensure_sensor(&mut radio, &clock), SensorOutcome::NotFound);
    assert_eq!(clock.now_ms(), 1_000);

    radio.set_sensor(Some(parse_address("11:22:33:44:55:66").unwrap()));
    assert_eq!(sched.ensure_sensor(&mut radio, &clock), SensorOutcome::Connected);
}

#[test]
fn malformed_value_demotes_the_link() {
    let (mut sched, mut radio, clock) = setup();
    radio.set_sensor(Some(SENSOR));
    sched.ensure_sensor(&mut radio, &clock);

    radio.fail_next_read(RadioError::MalformedValue);
    assert_eq!(sched.read_sensor(&mut radio, &clock), None);
    assert_eq!(sched.role(), RadioRole::Idle);
    assert_eq!(radio.sensor_links(), 0);
}

#[test]
fn any_read_error_demotes_the_link() {
    let (mut sched, mut radio, clock) = setup();
    radio.set_sensor(Some(SENSOR));
    sched.ensure_sensor(&mut radio, &clock);

    radio.fail_next_read(RadioError::OutOfMemory);
    assert_eq!(sched.read_sensor(&mut radio, &clock), None);
    assert_eq!(sched.role(), RadioRole::Idle);
    assert_eq!(radio.sensor_links(), 0);

    assert_eq!(sched.ensure_sensor(&mut radio, &clock), SensorOutcome::Connected);
    assert!(sched.read_sensor(&mut radio, &clock).is_some());
    assert_eq!(radio.max_sensor_links(), 1);
}

#[test]
fn refused_teardown_never_doubles_the_sensor_link() {
    let (mut sched, mut radio, clock) = setup();
    let mut delay = clock.clone();
    radio.set_base_station_present(true);
    radio.set_sensor(Some(SENSOR));
    assert_eq!(sched.ensure_sensor(&mut radio, &clock), SensorOutcome::Connected);
    let sensor = sched.role().sensor();

    // Every disconnect is refused: no window, the sensor stays recorded.
    radio.fail_disconnects(RadioError::DisconnectFailed, 100);
    assert_eq!(
        sched.ensure_base_station(&mut radio, &clock, &mut delay),
        Ok(BaseStationOutcome::Blocked)
    );
    assert_eq!(sched.state().base_station, None);
    assert_eq!(sched.role().sensor(), sensor);
    assert!(!radio.is_advertising());
    assert_eq!(sched.ensure_sensor(&mut radio, &clock), SensorOutcome::AlreadyConnected);
    assert_eq!(radio.max_sensor_links(), 1);

    // Once the stack lets go, the next window runs normally.
    radio.fail_disconnects(RadioError::DisconnectFailed, 0);
    clock.advance(10_000);
    assert_eq!(
        sched.ensure_base_station(&mut radio, &clock, &mut delay),
        Ok(BaseStationOutcome::Connected)
    );
    assert_ne!(sched.state().base_station, sensor);
    assert_eq!(radio.sensor_links(), 0);
    assert_eq!(sched.role(), RadioRole::Idle);
}

#[test]
fn one_refused_disconnect_is_retried_next_pass() {
    let (mut sched, mut radio, clock) = setup();
    let mut delay = clock.clone();
    radio.set_base_station_present(true);
    radio.set_sensor(Some(SENSOR));
    sched.ensure_sensor(&mut radio, &clock);
    let sensor = sched.role().sensor();

    radio.fail_next_disconnect(RadioError::DisconnectFailed);
    assert_eq!(
        sched.ensure_base_station(&mut radio, &clock, &mut delay),
        Ok(BaseStationOutcome::Connected)
    );
    assert_ne!(sched.state().base_station, sensor);
    assert_eq!(radio.sensor_links(), 0);
    assert_eq!(sched.role(), RadioRole::Idle);
}

#[test]
fn roles_alternate_without_overlap() {
    let (mut sched, mut radio, clock) = setup();
    let mut delay = clock.clone();
    radio.set_sensor(Some(SENSOR));

    for round in 0..6u64 {
        // Base station only shows up on odd rounds, and leaves again.
        radio.set_base_station_present(round % 2 == 1);
        if round % 2 == 0 {
            radio.drop_base_station();
        }
        let outcome = sched
            .ensure_base_station(&mut radio, &clock, &mut delay)
            .unwrap();
        assert_ne!(outcome, BaseStationOutcome::Skipped, "round {}", round);
        assert_eq!(sched.role(), RadioRole::Idle);
        assert!(!radio.is_advertising());

        assert_ne!(sched.ensure_sensor(&mut radio, &clock), SensorOutcome::NotFound);
        clock.advance(10_000);
    }

    assert_eq!(radio.advertise_starts(), 6);
    assert_eq!(radio.scans_while_advertising(), 0);
    assert_eq!(radio.max_sensor_links(), 1);
}
