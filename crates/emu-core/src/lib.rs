//! Core traits and types for frame-driven emulation.
//!
//! Machines advance one video frame at a time. Every bus access is charged to
//! the CPU's cycle counter, and debug tools observe execution through hook
//! triggers instead of being called directly by the components they watch.

mod bus;
mod cpu;
mod hooks;
mod observable;
mod subsystem;

pub use bus::{Bus, READ_SETUP_CYCLES, SimpleBus, TRANSFER_CYCLES, WRITE_SETUP_CYCLES};
pub use cpu::Cpu;
pub use hooks::{Hook, Registrar, Trigger};
pub use observable::{Observable, Value};
pub use subsystem::{FrameSubsystem, Subsystem};
