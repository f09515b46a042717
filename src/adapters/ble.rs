//! Simulated dual-role BLE transport.
//!
//! Implements [`RadioPort`] in memory so the control loop can run on the
//! host.  The real Bluedroid transport lives outside this crate and plugs
//! into the same port.
//!
//! ## What it models
//!
//! | Aspect               | Behaviour                                         |
//! |----------------------|---------------------------------------------------|
//! | Base station         | connects as soon as advertising starts, if present |
//! | Sensor               | advertises at its address, if present             |
//! | Bystanders           | other advertisers the scan filter must skip       |
//! | Faults               | injected scan / connect / read / disconnect errors |
//! | Link loss            | sensor or base-station links dropped on demand    |
//!
//! ## Invariant counters
//!
//! `scans_while_advertising` and `max_sensor_links` record violations of the
//! dual-role rules instead of panicking, so tests can assert on them.

use log::{debug, info};

use crate::adapters::time::SimClock;
use crate::app::ports::{
    Advertisement, AdvertisingDescriptor, BleAddress, ConnHandle, MAX_CHAR_LEN, RadioPort,
};
use crate::error::RadioError;
use crate::radio::gatt;

const MAX_LINKS: usize = 4;
const MAX_BYSTANDERS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkKind {
    BaseStation,
    Sensor,
}

#[derive(Debug, Clone, Copy)]
struct Link {
    handle: ConnHandle,
    kind: LinkKind,
}

pub struct SimRadio {
    advertising: bool,
    base_station_present: bool,
    sensor: Option<Advertisement>,
    bystanders: heapless::Vec<Advertisement, MAX_BYSTANDERS>,
    links: heapless::Vec<Link, MAX_LINKS>,
    next_handle: u16,
    co2: u16,
    tvoc: u16,
    /// Scan misses advance this clock by the scan timeout.
    clock: Option<SimClock>,

    fail_scan: Option<RadioError>,
    fail_connect: Option<RadioError>,
    fail_read: Option<RadioError>,
    /// Error returned by the next `n` disconnect requests.
    fail_disconnect: Option<(RadioError, u32)>,

    scans: u32,
    scans_while_advertising: u32,
    advertise_starts: u32,
    max_sensor_links: usize,
}

impl Default for SimRadio {
    fn default() -> Self {
        Self::new()
    }
}

impl SimRadio {
    pub fn new() -> Self {
        Self {
            advertising: false,
            base_station_present: false,
            sensor: None,
            bystanders: heapless::Vec::new(),
            links: heapless::Vec::new(),
            next_handle: 1,
            co2: 400,
            tvoc: 0,
            clock: None,
            fail_scan: None,
            fail_connect: None,
            fail_read: None,
            fail_disconnect: None,
            scans: 0,
            scans_while_advertising: 0,
            advertise_starts: 0,
            max_sensor_links: 0,
        }
    }

    /// Let scan passes that find nothing take their full timeout.
    pub fn with_clock(mut self, clock: SimClock) -> Self {
        self.clock = Some(clock);
        self
    }

    // ── Scripting ─────────────────────────────────────────────

    pub fn set_base_station_present(&mut self, present: bool) {
        self.base_station_present = present;
    }

    pub fn set_sensor(&mut self, address: Option<BleAddress>) {
        self.sensor = address.map(|address| Advertisement { address, rssi: -60 });
    }

    pub fn add_bystander(&mut self, address: BleAddress) {
        let _ = self.bystanders.push(Advertisement { address, rssi: -80 });
    }

    pub fn set_reading(&mut self, co2: u16, tvoc: u16) {
        self.co2 = co2;
        self.tvoc = tvoc;
    }

    pub fn fail_next_scan(&mut self, err: RadioError) {
        self.fail_scan = Some(err);
    }

    pub fn fail_next_connect(&mut self, err: RadioError) {
        self.fail_connect = Some(err);
    }

    pub fn fail_next_read(&mut self, err: RadioError) {
        self.fail_read = Some(err);
    }

    pub fn fail_next_disconnect(&mut self, err: RadioError) {
        self.fail_disconnects(err, 1);
    }

    /// Refuse the next `times` disconnect requests, leaving the links up.
    pub fn fail_disconnects(&mut self, err: RadioError, times: u32) {
        self.fail_disconnect = (times > 0).then_some((err, times));
    }

    /// Drop every sensor link without telling the domain.
    pub fn drop_sensor_links(&mut self) {
        self.links.retain(|l| l.kind != LinkKind::Sensor);
    }

    /// Drop the base-station link without telling the domain.
    pub fn drop_base_station(&mut self) {
        self.links.retain(|l| l.kind != LinkKind::BaseStation);
    }

    // ── Inspection ────────────────────────────────────────────

    pub fn is_advertising(&self) -> bool {
        self.advertising
    }

    pub fn scans(&self) -> u32 {
        self.scans
    }

    pub fn scans_while_advertising(&self) -> u32 {
        self.scans_while_advertising
    }

    pub fn advertise_starts(&self) -> u32 {
        self.advertise_starts
    }

    pub fn sensor_links(&self) -> usize {
        self.links.iter().filter(|l| l.kind == LinkKind::Sensor).count()
    }

    pub fn max_sensor_links(&self) -> usize {
        self.max_sensor_links
    }

    pub fn base_station_linked(&self) -> bool {
        self.links.iter().any(|l| l.kind == LinkKind::BaseStation)
    }

    // ── Internal ──────────────────────────────────────────────

    fn open_link(&mut self, kind: LinkKind) -> Result<ConnHandle, RadioError> {
        let handle = ConnHandle(self.next_handle);
        self.links
            .push(Link { handle, kind })
            .map_err(|_| RadioError::ConnectFailed)?;
        self.next_handle = self.next_handle.wrapping_add(1).max(1);
        self.max_sensor_links = self.max_sensor_links.max(self.sensor_links());
        Ok(handle)
    }
}

impl RadioPort for SimRadio {
    fn start_advertising(
        &mut self,
        descriptor: &AdvertisingDescriptor,
        interval_ms: u32,
    ) -> Result<(), RadioError> {
        self.advertising = true;
        self.advertise_starts += 1;
        debug!(
            "SimRadio: advertising '{}' every {} ms",
            descriptor.name, interval_ms
        );
        if self.base_station_present && descriptor.connectable && !self.base_station_linked() {
            let handle = self.open_link(LinkKind::BaseStation)?;
            info!("SimRadio: base station connected as {:?}", handle);
        }
        Ok(())
    }

    fn stop_advertising(&mut self) -> Result<(), RadioError> {
        self.advertising = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        !self.links.is_empty()
    }

    fn connections(&self) -> heapless::Vec<ConnHandle, 4> {
        self.links.iter().map(|l| l.handle).collect()
    }

    fn scan(
        &mut self,
        timeout_ms: u32,
        filter: &mut dyn FnMut(&Advertisement) -> bool,
    ) -> Result<Option<Advertisement>, RadioError> {
        self.scans += 1;
        if self.advertising {
            self.scans_while_advertising += 1;
        }
        if let Some(err) = self.fail_scan.take() {
            return Err(err);
        }
        let candidates = self.bystanders.iter().chain(self.sensor.iter());
        for adv in candidates {
            if filter(adv) {
                return Ok(Some(adv.clone()));
            }
        }
        if let Some(clock) = &self.clock {
            clock.advance(u64::from(timeout_ms));
        }
        Ok(None)
    }

    fn connect(&mut self, peer: &Advertisement) -> Result<ConnHandle, RadioError> {
        if let Some(err) = self.fail_connect.take() {
            return Err(err);
        }
        if self.sensor.as_ref().map(|s| s.address) != Some(peer.address) {
            return Err(RadioError::ConnectFailed);
        }
        self.open_link(LinkKind::Sensor)
    }

    fn read(
        &mut self,
        conn: ConnHandle,
        service: u128,
        characteristic: u128,
    ) -> Result<heapless::Vec<u8, MAX_CHAR_LEN>, RadioError> {
        let link = self
            .links
            .iter()
            .find(|l| l.handle == conn)
            .ok_or(RadioError::NotConnected)?;
        if link.kind != LinkKind::Sensor || service != gatt::SENSOR_SERVICE_UUID {
            return Err(RadioError::ServiceUnavailable);
        }
        if let Some(err) = self.fail_read.take() {
            return Err(err);
        }
        let value = match characteristic {
            gatt::SENSOR_CO2_UUID => self.co2,
            gatt::SENSOR_TVOC_UUID => self.tvoc,
            _ => return Err(RadioError::ServiceUnavailable),
        };
        let mut out = heapless::Vec::new();
        let _ = out.extend_from_slice(&value.to_le_bytes());
        Ok(out)
    }

    fn disconnect(&mut self, conn: ConnHandle) -> Result<(), RadioError> {
        if let Some((err, left)) = self.fail_disconnect.take() {
            if left > 1 {
                self.fail_disconnect = Some((err, left - 1));
            }
            return Err(err);
        }
        let before = self.links.len();
        self.links.retain(|l| l.handle != conn);
        if self.links.len() == before {
            return Err(RadioError::NotConnected);
        }
        Ok(())
    }

    fn is_alive(&self, conn: ConnHandle) -> bool {
        self.links.iter().any(|l| l.handle == conn)
    }
}
