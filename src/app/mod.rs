//! Application core — pure domain logic, zero I/O.
//!
//! This module holds the orchestration rules for the flower: which task
//! runs when, how readings become a level, and how the level is shown.
//! All interaction with hardware and the radio happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable without
//! real peripherals.

pub mod events;
pub mod ports;
pub mod service;
