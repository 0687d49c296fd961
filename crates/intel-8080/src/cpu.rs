//! Intel 8080 CPU core with per-frame execution.

#![allow(clippy::cast_possible_truncation)] // Intentional truncation for low byte extraction.

mod execute;

use emu_core::{Bus, Cpu, Hook, Observable, Registrar, Subsystem, Trigger, Value};

use crate::flags::{CF, HF, PF, SF, ZF};
use crate::registers::{HALT, INTE, Registers};
use crate::ret_hook::ReturnHook;

/// Address the per-frame interrupt jumps to (RST 7).
pub const INT_VECTOR: u16 = 0x0038;

/// Intel 8080 CPU.
///
/// The CPU does not own the bus. The machine passes it to every frame call,
/// which lets the bus carry its own wait-state model, bank mapping and
/// memory hooks alongside the other components that need them.
pub struct I8080 {
    pub(crate) regs: Registers,
    /// Cycle budget of one frame.
    frame_clocks: u32,
    /// Fires after the frame interrupt has been dispatched.
    int_trigger: Trigger<Registers>,
    /// Fires before every opcode fetch.
    op_trigger: Trigger<Registers>,
    /// Fires before every return pops its address.
    ret_trigger: Trigger<Registers>,
}

impl I8080 {
    /// Create a CPU in its reset state with the given frame budget.
    #[must_use]
    pub fn new(frame_clocks: u32) -> Self {
        Self {
            regs: Registers::default(),
            frame_clocks,
            int_trigger: Trigger::new(),
            op_trigger: Trigger::new(),
            ret_trigger: Trigger::new(),
        }
    }

    /// Cycle budget of one frame.
    #[must_use]
    pub const fn frame_clocks(&self) -> u32 {
        self.frame_clocks
    }

    /// Mutable access to the register file, for debuggers and loaders.
    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.regs
    }

    /// Subscribe to the interrupt trigger.
    #[must_use = "dropping the hook unsubscribes immediately"]
    pub fn int_hook<F>(&self, func: F) -> Hook<Registers>
    where
        F: FnMut(&mut Registers) + 'static,
    {
        self.int_trigger.hook(func)
    }

    /// Subscribe to the pre-fetch trigger.
    #[must_use = "dropping the hook unsubscribes immediately"]
    pub fn op_hook<F>(&self, func: F) -> Hook<Registers>
    where
        F: FnMut(&mut Registers) + 'static,
    {
        self.op_trigger.hook(func)
    }

    /// Create a disarmed [`ReturnHook`] on the return trigger.
    #[must_use = "dropping the hook unsubscribes immediately"]
    pub fn ret_hook<F>(&self, func: F) -> ReturnHook
    where
        F: FnMut(&mut Registers) + 'static,
    {
        ReturnHook::new(&self.ret_trigger, func)
    }

    /// Handle for subscribing to the interrupt trigger without borrowing
    /// the CPU.
    #[must_use]
    pub fn int_registrar(&self) -> Registrar<Registers> {
        self.int_trigger.registrar()
    }

    /// Like [`Self::int_registrar`], for the pre-fetch trigger.
    #[must_use]
    pub fn op_registrar(&self) -> Registrar<Registers> {
        self.op_trigger.registrar()
    }

    /// Like [`Self::int_registrar`], for the return trigger.
    #[must_use]
    pub fn ret_registrar(&self) -> Registrar<Registers> {
        self.ret_trigger.registrar()
    }

    /// Execute one instruction: fire the pre-fetch trigger, fetch the
    /// opcode and run its handler. Ignores the frame budget.
    pub fn step<B: Bus>(&mut self, bus: &mut B) {
        self.execute_next(bus);
    }

    fn execute_next(&mut self, bus: &mut dyn Bus) {
        self.op_trigger.fire(&mut self.regs);
        let op = self.fetch(bus);
        execute::OPCODES[usize::from(op)](self, bus);
    }

    fn run_frame(&mut self, bus: &mut dyn Bus) {
        if self.regs.interrupts_enabled() {
            self.interrupt(bus);
        }
        if self.regs.halted() {
            self.regs.clock = self.frame_clocks;
        }
        while self.regs.clock < self.frame_clocks {
            self.execute_next(bus);
        }
    }

    /// Dispatch the frame interrupt. Leaves INTE set: the handler is
    /// expected to run with interrupts enabled until it issues DI.
    fn interrupt(&mut self, bus: &mut dyn Bus) {
        self.regs.state &= !HALT;
        self.rst(bus, INT_VECTOR);
        self.int_trigger.fire(&mut self.regs);
    }

    // =========================================================================
    // Bus helpers
    // =========================================================================

    pub(crate) fn read(&mut self, bus: &mut dyn Bus, addr: u16) -> u8 {
        bus.read(&mut self.regs.clock, addr)
    }

    pub(crate) fn write(&mut self, bus: &mut dyn Bus, addr: u16, value: u8) {
        bus.write(&mut self.regs.clock, addr, value);
    }

    pub(crate) fn read16(&mut self, bus: &mut dyn Bus, addr: u16) -> u16 {
        let lo = self.read(bus, addr);
        let hi = self.read(bus, addr.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }

    pub(crate) fn write16(&mut self, bus: &mut dyn Bus, addr: u16, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.write(bus, addr, lo);
        self.write(bus, addr.wrapping_add(1), hi);
    }

    pub(crate) fn fetch(&mut self, bus: &mut dyn Bus) -> u8 {
        let addr = self.regs.pc;
        self.regs.pc = addr.wrapping_add(1);
        self.read(bus, addr)
    }

    pub(crate) fn fetch16(&mut self, bus: &mut dyn Bus) -> u16 {
        let lo = self.fetch(bus);
        let hi = self.fetch(bus);
        u16::from_le_bytes([lo, hi])
    }

    pub(crate) fn push(&mut self, bus: &mut dyn Bus, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.write(bus, self.regs.sp, hi);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.write(bus, self.regs.sp, lo);
    }

    pub(crate) fn pop(&mut self, bus: &mut dyn Bus) -> u16 {
        let addr = self.regs.sp;
        self.regs.sp = addr.wrapping_add(1);
        let lo = self.read(bus, addr);
        let addr = self.regs.sp;
        self.regs.sp = addr.wrapping_add(1);
        let hi = self.read(bus, addr);
        u16::from_le_bytes([lo, hi])
    }

    pub(crate) fn rst(&mut self, bus: &mut dyn Bus, addr: u16) {
        self.regs.clock += 2;
        self.push(bus, self.regs.pc);
        self.regs.pc = addr;
    }

    /// Fire the return trigger, then pop the return address.
    pub(crate) fn do_return(&mut self, bus: &mut dyn Bus) {
        self.ret_trigger.fire(&mut self.regs);
        self.regs.pc = self.pop(bus);
    }

    // =========================================================================
    // Operand decoding
    // =========================================================================

    /// 8-bit register by its 3-bit code (0=B 1=C 2=D 3=E 4=H 5=L 7=A).
    /// Code 6 (M) is handled by the memory forms and never reaches here.
    pub(crate) fn reg(&self, code: u8) -> u8 {
        match code {
            0 => self.regs.bc.high(),
            1 => self.regs.bc.low(),
            2 => self.regs.de.high(),
            3 => self.regs.de.low(),
            4 => self.regs.hl.high(),
            5 => self.regs.hl.low(),
            _ => self.regs.a,
        }
    }

    pub(crate) fn set_reg(&mut self, code: u8, value: u8) {
        match code {
            0 => self.regs.bc.set_high(value),
            1 => self.regs.bc.set_low(value),
            2 => self.regs.de.set_high(value),
            3 => self.regs.de.set_low(value),
            4 => self.regs.hl.set_high(value),
            5 => self.regs.hl.set_low(value),
            _ => self.regs.a = value,
        }
    }

    /// Register pair by its 2-bit code (0=BC 1=DE 2=HL 3=SP).
    pub(crate) fn pair(&self, code: u8) -> u16 {
        match code {
            0 => self.regs.bc.get(),
            1 => self.regs.de.get(),
            2 => self.regs.hl.get(),
            _ => self.regs.sp,
        }
    }

    pub(crate) fn set_pair(&mut self, code: u8, value: u16) {
        match code {
            0 => self.regs.bc.set(value),
            1 => self.regs.de.set(value),
            2 => self.regs.hl.set(value),
            _ => self.regs.sp = value,
        }
    }

    /// Condition by its 3-bit code (NZ Z NC C PO PE P M).
    pub(crate) fn condition(&self, code: u8) -> bool {
        let flag = [ZF, CF, PF, SF][usize::from(code >> 1)];
        (self.regs.f & flag != 0) == (code & 1 != 0)
    }
}

impl Cpu for I8080 {
    type Registers = Registers;

    fn start_frame<B: Bus>(&mut self, bus: &mut B) {
        bus.start_frame();
    }

    fn render_frame<B: Bus>(&mut self, bus: &mut B) {
        self.run_frame(bus);
    }

    fn end_frame(&mut self) {
        self.regs.clock = self.regs.clock.saturating_sub(self.frame_clocks);
    }

    fn pc(&self) -> u16 {
        self.regs.pc
    }

    fn registers(&self) -> &Registers {
        &self.regs
    }

    fn is_halted(&self) -> bool {
        self.regs.halted()
    }
}

impl Subsystem for I8080 {
    fn init(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        self.regs.reset();
    }
}

const I8080_QUERY_PATHS: &[&str] = &[
    "a", "f", "b", "c", "d", "e", "h", "l", "psw", "bc", "de", "hl", "sp", "pc", "clock",
    "state", "inte", "halted", "flags.s", "flags.z", "flags.ac", "flags.p", "flags.c",
];

impl Observable for I8080 {
    fn query(&self, path: &str) -> Option<Value> {
        let r = &self.regs;
        let value = match path {
            "a" => r.a.into(),
            "f" => r.f.into(),
            "b" => r.bc.high().into(),
            "c" => r.bc.low().into(),
            "d" => r.de.high().into(),
            "e" => r.de.low().into(),
            "h" => r.hl.high().into(),
            "l" => r.hl.low().into(),
            "psw" => r.psw().into(),
            "bc" => r.bc.get().into(),
            "de" => r.de.get().into(),
            "hl" => r.hl.get().into(),
            "sp" => r.sp.into(),
            "pc" => r.pc.into(),
            "clock" => r.clock.into(),
            "state" => r.state.into(),
            "inte" => (r.state & INTE != 0).into(),
            "halted" => (r.state & HALT != 0).into(),
            "flags.s" => (r.f & SF != 0).into(),
            "flags.z" => (r.f & ZF != 0).into(),
            "flags.ac" => (r.f & HF != 0).into(),
            "flags.p" => (r.f & PF != 0).into(),
            "flags.c" => (r.f & CF != 0).into(),
            _ => return None,
        };
        Some(value)
    }

    fn query_paths(&self) -> &'static [&'static str] {
        I8080_QUERY_PATHS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emu_core::SimpleBus;

    #[test]
    fn conditions_test_flag_polarity() {
        let mut cpu = I8080::new(100);
        cpu.regs.f = ZF | CF;
        let taken: Vec<bool> = (0..8).map(|cc| cpu.condition(cc)).collect();
        // NZ Z NC C PO PE P M
        assert_eq!(taken, [false, true, false, true, true, false, true, false]);
    }

    #[test]
    fn push_writes_high_byte_first() {
        let mut cpu = I8080::new(100);
        let mut bus = SimpleBus::new();
        cpu.regs.sp = 0x1000;
        cpu.push(&mut bus, 0xBEEF);
        assert_eq!(cpu.regs.sp, 0x0FFE);
        assert_eq!(bus.peek(0x0FFF), 0xBE);
        assert_eq!(bus.peek(0x0FFE), 0xEF);
        assert_eq!(cpu.pop(&mut bus), 0xBEEF);
        assert_eq!(cpu.regs.sp, 0x1000);
    }

    #[test]
    fn query_reports_pairs_and_flags() {
        let mut cpu = I8080::new(100);
        cpu.regs.hl.set(0x1234);
        cpu.regs.f |= SF;
        assert_eq!(cpu.query("hl"), Some(Value::U16(0x1234)));
        assert_eq!(cpu.query("h"), Some(Value::U8(0x12)));
        assert_eq!(cpu.query("flags.s"), Some(Value::Bool(true)));
        assert_eq!(cpu.query("ix"), None);
        for path in cpu.query_paths() {
            assert!(cpu.query(path).is_some(), "{path}");
        }
    }
}
