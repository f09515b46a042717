//! Local GATT table adapter.
//!
//! Implements [`ControlPointPort`] as an in-memory table of little-endian
//! byte values, one slot per [`ControlPoint`].  The radio transport reads
//! and writes the same bytes on behalf of connected clients; on the host
//! [`GattServer::client_write`] stands in for the dashboard.

use log::{debug, warn};

use crate::app::ports::ControlPointPort;
use crate::error::RadioError;
use crate::radio::gatt::{self, ControlPoint};

pub struct GattServer {
    values: [heapless::Vec<u8, 2>; ControlPoint::ALL.len()],
}

impl Default for GattServer {
    fn default() -> Self {
        Self::new()
    }
}

impl GattServer {
    /// Every point starts at zero.
    pub fn new() -> Self {
        Self {
            values: ControlPoint::ALL.map(|p| gatt::encode(p, 0)),
        }
    }

    fn slot(point: ControlPoint) -> usize {
        point as usize
    }

    /// Raw stored bytes, as a client would read them.
    pub fn client_read(&self, point: ControlPoint) -> &[u8] {
        &self.values[Self::slot(point)]
    }

    /// Apply a client write.  Rejects writes to read-only points and
    /// writes that do not match the point's width.
    pub fn client_write(&mut self, point: ControlPoint, bytes: &[u8]) -> Result<(), RadioError> {
        if !point.client_writable() {
            warn!("GATT: rejected write to read-only {}", point.name());
            return Err(RadioError::ReadOnly);
        }
        if let Err(e) = gatt::decode(point, bytes) {
            warn!("GATT: rejected {}-byte write to {}", bytes.len(), point.name());
            return Err(e);
        }
        let mut stored = heapless::Vec::new();
        let _ = stored.extend_from_slice(bytes);
        self.values[Self::slot(point)] = stored;
        debug!("GATT: client wrote {} = {:02X?}", point.name(), bytes);
        Ok(())
    }

    /// Client write by characteristic UUID, as it arrives from the stack.
    pub fn client_write_uuid(&mut self, uuid: u128, bytes: &[u8]) -> Result<(), RadioError> {
        let point = ControlPoint::from_uuid(uuid).ok_or(RadioError::ServiceUnavailable)?;
        self.client_write(point, bytes)
    }
}

impl ControlPointPort for GattServer {
    fn read(&self, point: ControlPoint) -> u16 {
        // Slots only ever hold values that decoded at write time.
        gatt::decode(point, self.client_read(point)).unwrap_or(0)
    }

    fn write(&mut self, point: ControlPoint, value: u16) {
        self.values[Self::slot(point)] = gatt::encode(point, value);
    }
}
