//! 8080 register file.

#![allow(clippy::cast_possible_truncation)] // Intentional truncation for byte extraction.

/// Run-state bit: maskable interrupts are enabled.
pub const INTE: u8 = 0x01;

/// Run-state bit: the CPU executed HLT and waits for an interrupt.
pub const HALT: u8 = 0x02;

/// A 16-bit register pair addressable as two bytes.
///
/// The pair is one `u16`; `high()` is the first-named register (B of BC).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegisterPair(u16);

impl RegisterPair {
    /// Create a pair holding `value`.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// The whole pair.
    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }

    /// Replace the whole pair.
    pub fn set(&mut self, value: u16) {
        self.0 = value;
    }

    /// High byte (B, D or H).
    #[must_use]
    pub const fn high(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Low byte (C, E or L).
    #[must_use]
    pub const fn low(self) -> u8 {
        self.0 as u8
    }

    /// Replace the high byte.
    pub fn set_high(&mut self, value: u8) {
        self.0 = (u16::from(value) << 8) | (self.0 & 0x00FF);
    }

    /// Replace the low byte.
    pub fn set_low(&mut self, value: u8) {
        self.0 = (self.0 & 0xFF00) | u16::from(value);
    }
}

impl From<u16> for RegisterPair {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

/// Architectural state of the CPU.
///
/// Only the S, Z, AC, P and C bits of `f` are meaningful; bit 1 reads as
/// set after every flag-producing instruction and the remaining bits are
/// whatever was last popped into them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    /// Run-state bits ([`INTE`], [`HALT`]).
    pub state: u8,
    /// Cycles elapsed in the current frame. May pass the frame budget by
    /// the length of the last instruction.
    pub clock: u32,
    /// Accumulator.
    pub a: u8,
    /// Flags: S Z 0 AC 0 P 1 C, high bit first.
    pub f: u8,
    /// B (high) and C (low).
    pub bc: RegisterPair,
    /// D (high) and E (low).
    pub de: RegisterPair,
    /// Also the memory operand M.
    pub hl: RegisterPair,
    /// Stack pointer. The stack grows down.
    pub sp: u16,
    /// Address of the next opcode.
    pub pc: u16,
}

impl Registers {
    /// Accumulator and flags as the PSW pair.
    #[must_use]
    pub const fn psw(&self) -> u16 {
        (self.a as u16) << 8 | self.f as u16
    }

    /// Load accumulator and flags from a PSW value.
    pub fn set_psw(&mut self, value: u16) {
        self.a = (value >> 8) as u8;
        self.f = value as u8;
    }

    /// True if interrupts are enabled.
    #[must_use]
    pub const fn interrupts_enabled(&self) -> bool {
        self.state & INTE != 0
    }

    /// True if the CPU is halted.
    #[must_use]
    pub const fn halted(&self) -> bool {
        self.state & HALT != 0
    }

    /// Power-on values: everything zero except the fixed flag bit.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self {
            state: 0,
            clock: 0,
            a: 0,
            f: crate::flags::BIT1,
            bc: RegisterPair::default(),
            de: RegisterPair::default(),
            hl: RegisterPair::default(),
            sp: 0,
            pc: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_halves_are_big_end_first() {
        let mut bc = RegisterPair::new(0x1234);
        assert_eq!(bc.high(), 0x12);
        assert_eq!(bc.low(), 0x34);

        bc.set_high(0xAB);
        assert_eq!(bc.get(), 0xAB34);
        bc.set_low(0xCD);
        assert_eq!(bc.get(), 0xABCD);
    }

    #[test]
    fn psw_packs_a_over_f() {
        let mut regs = Registers::default();
        regs.set_psw(0x12D7);
        assert_eq!(regs.a, 0x12);
        assert_eq!(regs.f, 0xD7);
        assert_eq!(regs.psw(), 0x12D7);
    }

    #[test]
    fn reset_restores_power_on_state() {
        let mut regs = Registers {
            state: INTE | HALT,
            clock: 1234,
            a: 0x55,
            f: 0xFF,
            bc: RegisterPair::new(1),
            de: RegisterPair::new(2),
            hl: RegisterPair::new(3),
            sp: 4,
            pc: 5,
        };
        regs.reset();
        assert_eq!(regs, Registers::default());
        assert_eq!(regs.f, 0x02);
        assert!(!regs.interrupts_enabled());
        assert!(!regs.halted());
    }
}
