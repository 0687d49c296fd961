//! Frame counter and frame trigger.

use std::time::{SystemTime, UNIX_EPOCH};

use emu_core::{FrameSubsystem, Hook, Registrar, Subsystem, Trigger};

/// CPU cycles per scanline.
pub const CLOCKS_PER_LINE: u32 = 160;

/// Scanlines per frame.
pub const LINES_PER_FRAME: u32 = 308;

/// CPU cycles per frame.
pub const CLOCKS_PER_FRAME: u32 = CLOCKS_PER_LINE * LINES_PER_FRAME;

/// Video frames per second.
pub const FPS: u32 = 50;

/// Argument of the frame trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    /// UNIX time at which the machine was initialised or last reset.
    pub start_time: u64,
    /// Frames completed since then.
    pub frame_num: u32,
}

/// Counts frames and announces each one before the CPU runs it.
pub struct Timeline {
    start_time: u64,
    frame_num: u32,
    frame_trigger: Trigger<FrameInfo>,
}

impl Timeline {
    #[must_use]
    pub fn new() -> Self {
        Self {
            start_time: unix_time(),
            frame_num: 0,
            frame_trigger: Trigger::new(),
        }
    }

    #[must_use]
    pub const fn start_time(&self) -> u64 {
        self.start_time
    }

    #[must_use]
    pub const fn frame_num(&self) -> u32 {
        self.frame_num
    }

    #[must_use]
    pub const fn info(&self) -> FrameInfo {
        FrameInfo {
            start_time: self.start_time,
            frame_num: self.frame_num,
        }
    }

    /// Subscribe to the start of every rendered frame.
    #[must_use = "dropping the hook unsubscribes immediately"]
    pub fn frame_hook<F>(&self, func: F) -> Hook<FrameInfo>
    where
        F: FnMut(&mut FrameInfo) + 'static,
    {
        self.frame_trigger.hook(func)
    }

    #[must_use]
    pub fn frame_registrar(&self) -> Registrar<FrameInfo> {
        self.frame_trigger.registrar()
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Subsystem for Timeline {
    fn init(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        self.start_time = unix_time();
        self.frame_num = 0;
    }
}

impl FrameSubsystem for Timeline {
    fn render_frame(&mut self) {
        let mut info = self.info();
        self.frame_trigger.fire(&mut info);
    }

    fn end_frame(&mut self) {
        self.frame_num += 1;
    }
}

fn unix_time() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}
