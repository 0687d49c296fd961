//! Lifecycle of machine components.

/// A component with a power-on lifecycle.
pub trait Subsystem {
    /// Bring the component to its power-on state.
    fn init(&mut self);

    /// Return to the reset state. Memory contents survive a reset.
    fn reset(&mut self);

    /// Release anything the component holds open.
    fn close(&mut self) {}
}

/// A component that advances in whole video frames.
///
/// The machine calls `start_frame` on every component, then `render_frame`,
/// then `end_frame` in reverse order.
pub trait FrameSubsystem: Subsystem {
    /// Latch state that must not change mid-frame.
    fn start_frame(&mut self) {}

    /// Do one frame's work.
    fn render_frame(&mut self);

    /// Settle counters for the next frame.
    fn end_frame(&mut self) {}
}
