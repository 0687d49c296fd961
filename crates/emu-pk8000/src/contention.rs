//! RAM wait states.
//!
//! The video controller shares RAM with the CPU. In text modes (port 0x84
//! bit 5 set) the stall depends on where the access falls within the
//! scanline; each 256-cycle row of the frame starts at one of five phases of
//! a fixed pattern. In the other modes the CPU is simply aligned to the next
//! 4-cycle slot.

/// How RAM accesses are stalled, latched from port 0x84.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RamTiming {
    /// Scanline-phase pattern.
    Mode0,
    /// Align to a 4-cycle slot.
    Mode1,
}

impl RamTiming {
    #[must_use]
    pub const fn from_port84(port84: u8) -> Self {
        if port84 & 0x20 != 0 { Self::Mode0 } else { Self::Mode1 }
    }

    /// Wait states for a RAM access sampled at `clock`.
    #[must_use]
    pub fn wait_states(self, clock: u32) -> u32 {
        match self {
            Self::Mode0 => {
                let row = ROW_OFFSETS[((clock >> 8) % 5) as usize];
                u32::from(PATTERN[row + (clock & 0xFF) as usize])
            }
            Self::Mode1 => 3 - (clock & 3),
        }
    }
}

const PATTERN_LEN: usize = 2 * 4 + 40 * 3 + 10 * 4 + 40 * 3 + 10 * 4 + 20 * 3;

/// Start of each row within [`PATTERN`], repeating every five rows.
const ROW_OFFSETS: [usize; 5] = [0, 96, 32, 128, 64];

static PATTERN: [u8; PATTERN_LEN] = build_pattern();

const fn fill(buf: &mut [u8; PATTERN_LEN], mut pos: usize, run: &[u8], count: usize) -> usize {
    let mut n = 0;
    while n < count {
        let mut i = 0;
        while i < run.len() {
            buf[pos] = run[i];
            pos += 1;
            i += 1;
        }
        n += 1;
    }
    pos
}

const fn build_pattern() -> [u8; PATTERN_LEN] {
    const SLOW: &[u8] = &[3, 2, 1, 0];
    const FAST: &[u8] = &[2, 1, 0];
    let mut buf = [0; PATTERN_LEN];
    let mut pos = 0;
    pos = fill(&mut buf, pos, SLOW, 2);
    pos = fill(&mut buf, pos, FAST, 40);
    pos = fill(&mut buf, pos, SLOW, 10);
    pos = fill(&mut buf, pos, FAST, 40);
    pos = fill(&mut buf, pos, SLOW, 10);
    fill(&mut buf, pos, FAST, 20);
    buf
}
