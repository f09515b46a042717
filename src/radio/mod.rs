//! Dual-role radio scheduling.
//!
//! One controller serves both the peripheral role (advertising to the base
//! station) and the central role (client of the air-quality sensor).  The
//! two roles must never overlap: scanning while advertising wedges the
//! stack.  [`RadioRoleScheduler`] owns the role and only moves it along the
//! edges below; everything else is a [`RadioError::RoleConflict`].
//!
//! ```text
//!            ┌──────────────────────┐
//!     ┌─────▶│  AdvertisingWindow   │──────┐
//!     │      └──────────────────────┘      │
//!  ┌──┴──┐                                 │
//!  │Idle │◀────────────────────────────────┘
//!  └──┬──┘◀──────────────┐◀──────────────────────┐
//!     │      ┌───────────┴──┐      ┌─────────────┴────┐
//!     └─────▶│   Scanning   │─────▶│ CentralConnected │
//!            └──────────────┘      └──────────────────┘
//! ```
//!
//! All waits are bounded by an explicit deadline; nothing here spins on a
//! flag without one.

pub mod address;
pub mod gatt;

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::app::ports::{
    Advertisement, AdvertisingDescriptor, BleAddress, Clock, ConnHandle, RadioPort,
};
use crate::config::SystemConfig;
use crate::error::{ConfigError, RadioError};

/// Upper bound on force-disconnect passes before an advertising window.
pub const MAX_DISCONNECT_PASSES: usize = 4;

/// Poll period used by [`wait_until`].
pub const WAIT_POLL_MS: u32 = 10;

// ───────────────────────────────────────────────────────────────
// Role
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioRole {
    Idle,
    /// Advertising to the base station until `deadline_ms`.
    AdvertisingWindow { deadline_ms: u64 },
    /// Scanning for the sensor until `deadline_ms`.
    Scanning { deadline_ms: u64 },
    /// Client of the sensor.  The only place a sensor handle lives.
    CentralConnected { sensor: ConnHandle },
}

impl RadioRole {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::AdvertisingWindow { .. } => "AdvertisingWindow",
            Self::Scanning { .. } => "Scanning",
            Self::CentralConnected { .. } => "CentralConnected",
        }
    }

    /// Whether `self -> next` is an allowed edge.
    pub const fn allows(&self, next: &Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::AdvertisingWindow { .. })
                | (Self::AdvertisingWindow { .. }, Self::Idle)
                | (Self::Idle, Self::Scanning { .. })
                | (Self::Scanning { .. }, Self::CentralConnected { .. })
                | (Self::Scanning { .. }, Self::Idle)
                | (Self::CentralConnected { .. }, Self::Idle)
        )
    }

    pub const fn sensor(&self) -> Option<ConnHandle> {
        match self {
            Self::CentralConnected { sensor } => Some(*sensor),
            _ => None,
        }
    }
}

/// Everything the radio scheduler knows about the link layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadioState {
    pub role: RadioRole,
    /// Base station handle recorded at the end of the last window.
    pub base_station: Option<ConnHandle>,
    pub last_advertise_ms: Option<u64>,
    pub last_scan_ms: Option<u64>,
}

impl Default for RadioState {
    fn default() -> Self {
        Self {
            role: RadioRole::Idle,
            base_station: None,
            last_advertise_ms: None,
            last_scan_ms: None,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Outcomes
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseStationOutcome {
    /// Retry interval has not elapsed yet.
    Skipped,
    AlreadyConnected,
    Connected,
    NotFound,
    /// Links survived teardown, so no window was opened.
    Blocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorOutcome {
    AlreadyConnected,
    Connected,
    NotFound,
    /// Transient failure, retried on a later tick.
    Failed(RadioError),
}

/// One successful read of the remote sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reading {
    pub co2: u16,
    pub tvoc: u16,
    pub taken_at_ms: u64,
}

/// Radio timings taken from [`SystemConfig`].
#[derive(Debug, Clone, Copy)]
pub struct RadioTimings {
    pub advertise_retry_ms: u32,
    pub advertise_window_ms: u32,
    pub advertise_settle_ms: u32,
    pub advertise_interval_ms: u32,
    pub scan_timeout_ms: u32,
}

impl From<&SystemConfig> for RadioTimings {
    fn from(c: &SystemConfig) -> Self {
        Self {
            advertise_retry_ms: c.advertise_retry_ms,
            advertise_window_ms: c.advertise_window_ms,
            advertise_settle_ms: c.advertise_settle_ms,
            advertise_interval_ms: c.advertise_interval_ms,
            scan_timeout_ms: c.scan_timeout_ms,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Bounded wait
// ───────────────────────────────────────────────────────────────

/// Poll `done` until it returns true or `deadline_ms` passes.
///
/// Returns whether `done` was satisfied.  The number of polls is capped as
/// well, so a clock that never advances cannot hang the caller.
pub fn wait_until(
    clock: &impl Clock,
    delay: &mut impl DelayNs,
    deadline_ms: u64,
    mut done: impl FnMut() -> bool,
) -> bool {
    let budget_ms = deadline_ms.saturating_sub(clock.now_ms());
    let max_polls = budget_ms / u64::from(WAIT_POLL_MS) + 1;
    for _ in 0..=max_polls {
        if done() {
            return true;
        }
        let now = clock.now_ms();
        if now >= deadline_ms {
            return false;
        }
        let step = (deadline_ms - now).min(u64::from(WAIT_POLL_MS)) as u32;
        delay.delay_ms(step);
    }
    done()
}

// ───────────────────────────────────────────────────────────────
// Scheduler
// ───────────────────────────────────────────────────────────────

pub struct RadioRoleScheduler {
    state: RadioState,
    timings: RadioTimings,
    descriptor: AdvertisingDescriptor,
    sensor_address: BleAddress,
}

impl RadioRoleScheduler {
    pub fn new(config: &SystemConfig) -> Result<Self, ConfigError> {
        let sensor_address = address::parse_address(&config.sensor_address)?;
        info!(
            "Radio: sensor {} (transport order {:02X?})",
            config.sensor_address, sensor_address
        );
        Ok(Self {
            state: RadioState::default(),
            timings: RadioTimings::from(config),
            descriptor: AdvertisingDescriptor {
                name: config.device_name.clone(),
                discoverable: true,
                connectable: true,
            },
            sensor_address,
        })
    }

    pub fn state(&self) -> &RadioState {
        &self.state
    }

    pub fn role(&self) -> RadioRole {
        self.state.role
    }

    pub fn sensor_address(&self) -> BleAddress {
        self.sensor_address
    }

    pub fn descriptor(&self) -> &AdvertisingDescriptor {
        &self.descriptor
    }

    /// Move to `next` if the edge is allowed.  A rejected edge is logged and
    /// leaves the role untouched.
    pub fn transition(&mut self, next: RadioRole) -> Result<(), RadioError> {
        let current = self.state.role;
        if !current.allows(&next) {
            warn!(
                "Radio: rejected transition {} -> {}",
                current.name(),
                next.name()
            );
            return Err(RadioError::RoleConflict);
        }
        info!("Radio transition: {} -> {}", current.name(), next.name());
        self.state.role = next;
        Ok(())
    }

    /// Open an advertising window if the base station is missing and the
    /// retry interval has elapsed.
    pub fn ensure_base_station(
        &mut self,
        radio: &mut impl RadioPort,
        clock: &impl Clock,
        delay: &mut impl DelayNs,
    ) -> Result<BaseStationOutcome, RadioError> {
        if let Some(handle) = self.state.base_station {
            if radio.is_alive(handle) {
                return Ok(BaseStationOutcome::AlreadyConnected);
            }
            info!("Radio: base station link {:?} lost", handle);
            self.state.base_station = None;
        }

        let now = clock.now_ms();
        if let Some(last) = self.state.last_advertise_ms {
            if now.saturating_sub(last) < u64::from(self.timings.advertise_retry_ms) {
                return Ok(BaseStationOutcome::Skipped);
            }
        }

        // 1. Tear everything down, sensor link included.
        if !self.disconnect_all(radio) {
            self.state.last_advertise_ms = Some(now);
            return Ok(BaseStationOutcome::Blocked);
        }

        // 2. Let the controller settle.
        delay.delay_ms(self.timings.advertise_settle_ms);

        // 3. Open the window.
        let deadline_ms = clock.now_ms() + u64::from(self.timings.advertise_window_ms);
        self.transition(RadioRole::AdvertisingWindow { deadline_ms })?;
        if let Err(e) = radio.start_advertising(&self.descriptor, self.timings.advertise_interval_ms) {
            warn!("Radio: advertising failed to start: {}", e);
            self.close_window(radio, clock);
            return Err(e);
        }
        info!(
            "Radio: advertising as '{}' for {} ms",
            self.descriptor.name, self.timings.advertise_window_ms
        );

        // 4. Wait for a central or the deadline.
        let connected = wait_until(clock, delay, deadline_ms, || radio.is_connected());

        // 5. Teardown left no links, so whoever is connected now is the
        //    base station.
        self.state.base_station = if connected {
            radio.connections().first().copied()
        } else {
            None
        };

        // 6. Close the window.
        self.close_window(radio, clock);

        Ok(match self.state.base_station {
            Some(handle) => {
                info!("Radio: base station connected ({:?})", handle);
                BaseStationOutcome::Connected
            }
            None => {
                info!("Radio: no base station within the window");
                BaseStationOutcome::NotFound
            }
        })
    }

    /// Scan for the sensor and connect if it is found.
    pub fn ensure_sensor(&mut self, radio: &mut impl RadioPort, clock: &impl Clock) -> SensorOutcome {
        if let Some(sensor) = self.state.role.sensor() {
            if radio.is_alive(sensor) {
                return SensorOutcome::AlreadyConnected;
            }
            self.prune_sensor(radio);
        }

        let now = clock.now_ms();
        let deadline_ms = now + u64::from(self.timings.scan_timeout_ms);
        if let Err(e) = self.transition(RadioRole::Scanning { deadline_ms }) {
            return SensorOutcome::Failed(e);
        }
        self.state.last_scan_ms = Some(now);

        let target = self.sensor_address;
        let found = radio.scan(self.timings.scan_timeout_ms, &mut |adv: &Advertisement| {
            adv.address == target
        });

        let outcome = match found {
            Ok(Some(adv)) => match radio.connect(&adv) {
                Ok(sensor) => {
                    info!("Radio: sensor connected ({:?}, rssi {})", sensor, adv.rssi);
                    return match self.transition(RadioRole::CentralConnected { sensor }) {
                        Ok(()) => SensorOutcome::Connected,
                        Err(e) => SensorOutcome::Failed(e),
                    };
                }
                Err(e) => SensorOutcome::Failed(e),
            },
            Ok(None) => {
                debug!("Radio: sensor not found in {} ms scan", self.timings.scan_timeout_ms);
                SensorOutcome::NotFound
            }
            Err(e) => SensorOutcome::Failed(e),
        };

        if let SensorOutcome::Failed(e) = outcome {
            warn!("Radio: sensor attempt failed: {} (will retry)", e);
        }
        let _ = self.transition(RadioRole::Idle);
        outcome
    }

    /// Drop a sensor handle that is no longer live.  Returns whether one
    /// was dropped.
    pub fn prune_sensor(&mut self, radio: &mut impl RadioPort) -> bool {
        match self.state.role.sensor() {
            Some(sensor) if !radio.is_alive(sensor) => {
                warn!("Radio: sensor link {:?} lost", sensor);
                self.demote_sensor(radio, sensor);
                true
            }
            _ => false,
        }
    }

    /// Read CO2 and TVOC from the connected sensor.
    ///
    /// `None` means there was no live sensor to read.  Any read or lookup
    /// failure demotes the connection and also yields `None`.
    pub fn read_sensor(&mut self, radio: &mut impl RadioPort, clock: &impl Clock) -> Option<Reading> {
        let sensor = self.state.role.sensor()?;
        if !radio.is_alive(sensor) {
            warn!("Radio: sensor link {:?} lost before read", sensor);
            self.demote_sensor(radio, sensor);
            return None;
        }

        match Self::read_pair(radio, sensor) {
            Ok((co2, tvoc)) => Some(Reading {
                co2,
                tvoc,
                taken_at_ms: clock.now_ms(),
            }),
            Err(e) => {
                warn!("Radio: sensor read failed: {}, dropping link", e);
                self.demote_sensor(radio, sensor);
                None
            }
        }
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn read_pair(radio: &mut impl RadioPort, sensor: ConnHandle) -> Result<(u16, u16), RadioError> {
        let co2 = radio.read(sensor, gatt::SENSOR_SERVICE_UUID, gatt::SENSOR_CO2_UUID)?;
        let co2 = gatt::decode_u16_le(&co2)?;
        let tvoc = radio.read(sensor, gatt::SENSOR_SERVICE_UUID, gatt::SENSOR_TVOC_UUID)?;
        let tvoc = gatt::decode_u16_le(&tvoc)?;
        Ok((co2, tvoc))
    }

    /// Drop the sensor link and return to `Idle`.  A link that refuses to
    /// close stays recorded so a second one is never opened.
    fn demote_sensor(&mut self, radio: &mut impl RadioPort, sensor: ConnHandle) {
        if radio.is_alive(sensor) {
            if let Err(e) = radio.disconnect(sensor) {
                warn!("Radio: disconnect {:?} failed: {}", sensor, e);
            }
            if radio.is_alive(sensor) {
                warn!("Radio: sensor link {:?} still up, keeping it", sensor);
                return;
            }
        }
        let _ = self.transition(RadioRole::Idle);
    }

    /// Force every link down.  Returns whether no links remain; a sensor
    /// link that survives keeps its `CentralConnected` role.
    fn disconnect_all(&mut self, radio: &mut impl RadioPort) -> bool {
        for pass in 0..MAX_DISCONNECT_PASSES {
            let conns = radio.connections();
            if conns.is_empty() {
                break;
            }
            debug!("Radio: disconnect pass {} ({} links)", pass, conns.len());
            for conn in conns {
                if let Err(e) = radio.disconnect(conn) {
                    warn!("Radio: disconnect {:?} failed: {}", conn, e);
                }
            }
        }
        if let Some(sensor) = self.state.role.sensor() {
            if !radio.is_alive(sensor) {
                let _ = self.transition(RadioRole::Idle);
            }
        }
        let clear = radio.connections().is_empty();
        if !clear {
            warn!(
                "Radio: links remain after {} disconnect passes, skipping window",
                MAX_DISCONNECT_PASSES
            );
        }
        clear
    }

    fn close_window(&mut self, radio: &mut impl RadioPort, clock: &impl Clock) {
        if let Err(e) = radio.stop_advertising() {
            warn!("Radio: stop advertising failed: {}", e);
        }
        let _ = self.transition(RadioRole::Idle);
        self.state.last_advertise_ms = Some(clock.now_ms());
    }
}
