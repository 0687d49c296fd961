//! CPU core trait.

use crate::Bus;

/// A CPU core driven one video frame at a time.
///
/// The bus is passed in, not owned, so the machine can keep it alongside
/// the other components that share memory and ports with the CPU.
pub trait Cpu {
    /// The type used for register inspection.
    type Registers;

    /// Prepare for a frame (the bus re-latches its per-frame state).
    fn start_frame<B: Bus>(&mut self, bus: &mut B);

    /// Execute instructions until the frame's cycle budget is spent.
    fn render_frame<B: Bus>(&mut self, bus: &mut B);

    /// Carry any cycle overshoot into the next frame.
    fn end_frame(&mut self);

    /// Returns the current program counter.
    fn pc(&self) -> u16;

    /// Returns the live register file.
    fn registers(&self) -> &Self::Registers;

    /// Returns true if the CPU is halted.
    fn is_halted(&self) -> bool;
}
