//! PK8000 bus: bank mapping, RAM contention and memory hooks.
//!
//! Every timed access is charged in three steps: the setup cycles, the wait
//! states of the contention model (RAM only), then the transfer cycle. The
//! memory trigger fires between the wait states and the transfer, so a hook
//! sees the clock at the moment the byte moves and may replace that byte.
//!
//! The bank map and the RAM timing mode are latched from the port registers
//! at frame start and whenever port 0x80 is written. Writes to port 0x84
//! take effect at the next latch.

use emu_core::{
    Bus, Hook, READ_SETUP_CYCLES, Registrar, TRANSFER_CYCLES, Trigger, WRITE_SETUP_CYCLES,
};

use crate::contention::RamTiming;
use crate::memory::{BankKind, IoPorts, Memory};
use crate::ports::{IN_PORTS, OUT_PORTS};

/// Direction of a memory access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
}

/// Argument of the memory trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemAccess {
    pub kind: AccessKind,
    /// Bank the access resolved to. Always [`BankKind::Ram`] for writes.
    pub bank: BankKind,
    pub addr: u16,
    /// The byte about to be transferred. A hook may replace it.
    pub value: u8,
}

/// Read bank of each 16 KiB quadrant plus the RAM timing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankMap {
    read: [BankKind; 4],
    timing: RamTiming,
}

impl BankMap {
    /// Decode the map from the current port registers.
    #[must_use]
    pub fn latch(ports: &IoPorts) -> Self {
        let mut read = [BankKind::Ram; 4];
        for (quadrant, kind) in read.iter_mut().enumerate() {
            *kind = BankKind::from_selector(ports.port80 >> (2 * quadrant));
        }
        Self {
            read,
            timing: RamTiming::from_port84(ports.port84),
        }
    }

    /// Bank that serves reads at `addr`.
    #[must_use]
    pub fn read_bank(&self, addr: u16) -> BankKind {
        self.read[usize::from(addr >> 14)]
    }

    /// Read bank of quadrant `0..4`.
    #[must_use]
    pub fn quadrant(&self, quadrant: usize) -> BankKind {
        self.read[quadrant & 3]
    }

    /// RAM wait-state mode latched from port 0x84.
    #[must_use]
    pub const fn timing(&self) -> RamTiming {
        self.timing
    }
}

/// The PK8000 bus, implementing `emu_core::Bus`.
pub struct Pk8000Bus {
    pub memory: Memory,
    map: BankMap,
    mem_trigger: Trigger<MemAccess>,
}

impl Pk8000Bus {
    #[must_use]
    pub fn new(memory: Memory) -> Self {
        let map = BankMap::latch(&memory.ports);
        Self {
            memory,
            map,
            mem_trigger: Trigger::new(),
        }
    }

    /// Re-read the bank map and timing mode from the port registers.
    pub fn relatch(&mut self) {
        self.map = BankMap::latch(&self.memory.ports);
    }

    #[must_use]
    pub fn bank_map(&self) -> &BankMap {
        &self.map
    }

    /// Subscribe to every timed memory access, fetches included.
    #[must_use = "dropping the hook unsubscribes immediately"]
    pub fn mem_hook<F>(&self, func: F) -> Hook<MemAccess>
    where
        F: FnMut(&mut MemAccess) + 'static,
    {
        self.mem_trigger.hook(func)
    }

    #[must_use]
    pub fn mem_registrar(&self) -> Registrar<MemAccess> {
        self.mem_trigger.registrar()
    }

    fn wait(&self, clock: &mut u32, bank: BankKind) {
        if bank == BankKind::Ram {
            *clock += self.map.timing.wait_states(*clock);
        }
    }
}

impl Bus for Pk8000Bus {
    fn read(&mut self, clock: &mut u32, addr: u16) -> u8 {
        *clock += READ_SETUP_CYCLES;
        let bank = self.map.read_bank(addr);
        self.wait(clock, bank);
        let mut access = MemAccess {
            kind: AccessKind::Read,
            bank,
            addr,
            value: self.memory.banks.bank(bank)[usize::from(addr)],
        };
        self.mem_trigger.fire(&mut access);
        *clock += TRANSFER_CYCLES;
        access.value
    }

    fn write(&mut self, clock: &mut u32, addr: u16, value: u8) {
        *clock += WRITE_SETUP_CYCLES;
        self.wait(clock, BankKind::Ram);
        let mut access = MemAccess {
            kind: AccessKind::Write,
            bank: BankKind::Ram,
            addr,
            value,
        };
        self.mem_trigger.fire(&mut access);
        *clock += TRANSFER_CYCLES;
        self.memory.banks.ram[usize::from(addr)] = access.value;
    }

    fn peek(&self, addr: u16) -> u8 {
        self.memory.banks.bank(self.map.read_bank(addr))[usize::from(addr)]
    }

    fn poke(&mut self, addr: u16, value: u8) {
        self.memory.banks.ram[usize::from(addr)] = value;
    }

    fn io_read(&mut self, port: u8) -> u8 {
        IN_PORTS[usize::from(port)](self)
    }

    fn io_write(&mut self, port: u8, value: u8) {
        OUT_PORTS[usize::from(port)](self, value);
    }

    fn start_frame(&mut self) {
        self.relatch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn bus_with(port80: u8, port84: u8) -> Pk8000Bus {
        let mut bus = Pk8000Bus::new(Memory::new());
        bus.memory.ports.port80 = port80;
        bus.memory.ports.port84 = port84;
        bus.relatch();
        bus
    }

    #[test]
    fn reset_map_is_rom_low_ram_high() {
        let bus = Pk8000Bus::new(Memory::new());
        // 0xFC: quadrant 0 selects ROM, the rest RAM.
        assert_eq!(bus.bank_map().read_bank(0x0000), BankKind::Rom);
        assert_eq!(bus.bank_map().read_bank(0x3FFF), BankKind::Rom);
        assert_eq!(bus.bank_map().read_bank(0x4000), BankKind::Ram);
        assert_eq!(bus.bank_map().read_bank(0xFFFF), BankKind::Ram);
        assert_eq!(bus.bank_map().timing(), RamTiming::Mode0);
    }

    #[test]
    fn writes_land_in_ram_under_rom() {
        let mut bus = bus_with(0x00, 0x0F);
        let mut clock = 0;
        bus.write(&mut clock, 0x1000, 0x42);
        assert_eq!(bus.peek(0x1000), 0xFF, "reads still see ROM");
        assert_eq!(bus.memory.banks.ram[0x1000], 0x42);
    }

    #[test]
    fn rom_reads_do_not_wait() {
        let mut bus = bus_with(0x00, 0x0F);
        let mut clock = 1;
        bus.read(&mut clock, 0x0000);
        assert_eq!(clock, 5);
    }

    #[test]
    fn ram_reads_align_in_mode1() {
        let mut bus = bus_with(0xFF, 0x0F);
        let mut clock = 1;
        // Setup ends at 4, three waits to the next slot, then the transfer.
        bus.read(&mut clock, 0x8000);
        assert_eq!(clock, 8);
    }

    #[test]
    fn ram_writes_wait_in_mode0() {
        let mut bus = bus_with(0xFF, 0x2F);
        let mut clock = 0;
        bus.write(&mut clock, 0x8000, 0x11);
        // Waits sampled at clock 4: the second 3,2,1,0 group.
        assert_eq!(clock, 8);
    }

    #[test]
    fn hook_sees_access_after_waits_and_may_replace_value() {
        let mut bus = bus_with(0xFF, 0x0F);
        bus.memory.banks.ram[0x2000] = 0x10;
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        let _hook = bus.mem_hook(move |access| {
            log.borrow_mut().push(*access);
            if access.kind == AccessKind::Read {
                access.value = 0x99;
            }
        });

        let mut clock = 0;
        assert_eq!(bus.read(&mut clock, 0x2000), 0x99);
        bus.write(&mut clock, 0x3000, 0x55);
        assert_eq!(bus.memory.banks.ram[0x3000], 0x55);
        assert_eq!(
            *seen.borrow(),
            [
                MemAccess { kind: AccessKind::Read, bank: BankKind::Ram, addr: 0x2000, value: 0x10 },
                MemAccess { kind: AccessKind::Write, bank: BankKind::Ram, addr: 0x3000, value: 0x55 },
            ]
        );
    }

    #[test]
    fn peek_and_poke_are_untimed_and_silent() {
        let mut bus = bus_with(0xFC, 0x2F);
        let fired = Rc::new(RefCell::new(0));
        let count = Rc::clone(&fired);
        let _hook = bus.mem_hook(move |_| *count.borrow_mut() += 1);
        bus.poke(0x0010, 0xAA);
        assert_eq!(bus.peek(0x0010), 0xFF);
        bus.poke(0x8010, 0xBB);
        assert_eq!(bus.peek(0x8010), 0xBB);
        assert_eq!(*fired.borrow(), 0);
    }

    #[test]
    fn port80_write_remaps_immediately() {
        let mut bus = Pk8000Bus::new(Memory::new());
        bus.io_write(0x80, 0xFF);
        assert_eq!(bus.bank_map().read_bank(0x0000), BankKind::Ram);
        assert_eq!(bus.io_read(0x80), 0xFF);
    }

    #[test]
    fn port84_write_waits_for_the_next_latch() {
        let mut bus = Pk8000Bus::new(Memory::new());
        bus.io_write(0x84, 0x00);
        assert_eq!(bus.bank_map().timing(), RamTiming::Mode0);
        bus.start_frame();
        assert_eq!(bus.bank_map().timing(), RamTiming::Mode1);
    }
}
