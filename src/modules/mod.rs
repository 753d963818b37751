//! Built-in resource monitoring modules
//!
//! Each module wraps one platform sampler in the shared lifecycle. The
//! catalog order below is the registration order, which makes mount order
//! its reverse; rearranging it changes the status-bar layout contract.

pub mod battery;
pub mod bluetooth;
pub mod clock;
pub mod cpu;
pub mod disk;
pub mod gpu;
pub mod net;
pub mod ram;
pub mod sensors;

use crate::core::BoxedModule;

/// The full module catalog in registration order.
pub fn catalog() -> Vec<BoxedModule> {
    vec![
        Box::new(cpu::module()),
        Box::new(gpu::module()),
        Box::new(ram::module()),
        Box::new(disk::module()),
        Box::new(sensors::module()),
        Box::new(net::module()),
        Box::new(battery::module()),
        Box::new(bluetooth::module()),
        Box::new(clock::module()),
    ]
}
