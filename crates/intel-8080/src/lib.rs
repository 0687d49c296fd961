//! Intel 8080 CPU engine, driven one video frame at a time.
//!
//! `render_frame()` executes whole instructions until the cycle counter
//! reaches the frame budget. Memory and port timing come from the
//! [`emu_core::Bus`] the machine passes in; the engine adds each
//! instruction's internal cycles on top.
//!
//! Three triggers expose execution to debug tools: one fires after the
//! per-frame interrupt is taken, one before every opcode fetch and one
//! before every return pops its address. Callbacks receive the live
//! [`Registers`].

mod alu;
mod cpu;
mod flags;
mod registers;
mod ret_hook;

pub use alu::AluResult;
pub use cpu::{I8080, INT_VECTOR};
pub use flags::{BIT1, CF, FLAG_TABLE, HF, PF, SF, ZF, parity};
pub use registers::{HALT, INTE, RegisterPair, Registers};
pub use ret_hook::ReturnHook;
