//! Level calculation and the outputs it drives.

pub mod actuator;
pub mod indicator;
pub mod intensity;
