//! Fuzz target: control-point writes
//!
//! Feeds arbitrary client writes into the local GATT table and asserts
//! that a rejected write leaves the stored value untouched and an accepted
//! one reads back within the point's width.
//!
//! cargo fuzz run fuzz_control_point_decode

#![no_main]

use airflower::adapters::gatt_server::GattServer;
use airflower::app::ports::ControlPointPort;
use airflower::radio::gatt::{self, ControlPoint};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&selector, payload)) = data.split_first() else {
        return;
    };
    let point = ControlPoint::ALL[usize::from(selector) % ControlPoint::ALL.len()];

    let mut server = GattServer::new();
    server.write(point, 7);

    match server.client_write(point, payload) {
        Ok(()) => {
            let value = server.read(point);
            assert_eq!(Ok(value), gatt::decode(point, payload));
            if point.width() == 1 {
                assert!(value <= u16::from(u8::MAX));
            }
        }
        Err(_) => assert_eq!(server.read(point), 7, "rejected write must not stick"),
    }
});
