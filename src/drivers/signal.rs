//! Single digital output (indicator LED / relay).
//!
//! On ESP-IDF: drives the GPIO via hw_init.
//! On host/test: tracks state in-memory only.

use crate::drivers::hw_init;

pub struct SignalOutput {
    gpio: i32,
    high: bool,
}

impl SignalOutput {
    pub fn new(gpio: i32) -> Self {
        Self { gpio, high: false }
    }

    pub fn set(&mut self, high: bool) {
        hw_init::gpio_write(self.gpio, high);
        self.high = high;
    }

    pub fn is_high(&self) -> bool {
        self.high
    }

    pub fn gpio(&self) -> i32 {
        self.gpio
    }
}
