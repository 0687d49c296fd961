//! PK8000 machine core.
//!
//! An Intel 8080 at 2.5 MHz behind a banked bus: four 64 KiB banks (RAM,
//! BIOS ROM and two expansion banks) mapped per 16 KiB quadrant through port
//! 0x80, with RAM accesses stalled by the video controller. The machine runs
//! one 50 Hz frame at a time and exposes its memory, interrupt, opcode,
//! return and frame events as hooks for debug tools.
//!
//! Video, sound, tape and input devices are outside this crate; their port
//! registers are latched so a host can drive them.

mod bus;
mod config;
mod contention;
mod debug;
mod error;
mod machine;
mod memory;
mod ports;
mod timeline;

pub use bus::{AccessKind, BankMap, MemAccess, Pk8000Bus};
pub use config::Pk8000Config;
pub use contention::RamTiming;
pub use debug::{DumpFiles, Tracer, dump};
pub use error::{ConfigError, DebugError};
pub use machine::Pk8000;
pub use memory::{BANK_SIZE, BankKind, IoPorts, MemBanks, Memory, RomImage};
pub use timeline::{CLOCKS_PER_FRAME, CLOCKS_PER_LINE, FPS, FrameInfo, LINES_PER_FRAME, Timeline};
