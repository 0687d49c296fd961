//! Timed memory and I/O bus interface.

/// Cycles between the start of a read and its wait-state sample.
pub const READ_SETUP_CYCLES: u32 = 3;

/// Cycles between the start of a write and its wait-state sample.
pub const WRITE_SETUP_CYCLES: u32 = 4;

/// Cycles taken by the data transfer that completes every access.
pub const TRANSFER_CYCLES: u32 = 1;

/// Memory and I/O bus interface.
///
/// The CPU does not know where memory lives or how long it takes to reach
/// it. Every timed access is charged by the bus to the cycle counter passed
/// in: the setup cycles, any wait states the hardware inserts, then the
/// transfer cycle. Buses that fire hooks do so after the wait states and
/// before the transfer cycle.
pub trait Bus {
    /// Read a byte, charging the access to `clock`.
    fn read(&mut self, clock: &mut u32, addr: u16) -> u8;

    /// Write a byte, charging the access to `clock`.
    fn write(&mut self, clock: &mut u32, addr: u16, value: u8);

    /// Read a byte through the current mapping without timing or hooks.
    fn peek(&self, addr: u16) -> u8;

    /// Write a byte through the current mapping without timing or hooks.
    fn poke(&mut self, addr: u16, value: u8);

    /// Read from an input port. Unmapped ports float to 0xFF.
    fn io_read(&mut self, port: u8) -> u8;

    /// Write to an output port. Unmapped ports ignore the write.
    fn io_write(&mut self, port: u8, value: u8);

    /// Re-latch any state the hardware samples once per frame.
    fn start_frame(&mut self) {}
}

/// Flat 64K RAM with no wait states, for CPU tests.
///
/// Input ports return whatever was latched with [`SimpleBus::set_port`]
/// (0xFF by default). Output writes are recorded in order.
pub struct SimpleBus {
    ram: Box<[u8]>,
    ports: [u8; 256],
    io_writes: Vec<(u8, u8)>,
}

impl SimpleBus {
    /// Create a bus with zeroed RAM.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ram: vec![0; 0x1_0000].into_boxed_slice(),
            ports: [0xFF; 256],
            io_writes: Vec::new(),
        }
    }

    /// Copy `data` into RAM starting at `addr`, wrapping at the top.
    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let mut addr = addr;
        for &byte in data {
            self.ram[usize::from(addr)] = byte;
            addr = addr.wrapping_add(1);
        }
    }

    /// Latch the value returned by an input port.
    pub fn set_port(&mut self, port: u8, value: u8) {
        self.ports[usize::from(port)] = value;
    }

    /// Output writes seen so far, as `(port, value)`.
    #[must_use]
    pub fn io_writes(&self) -> &[(u8, u8)] {
        &self.io_writes
    }
}

impl Default for SimpleBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for SimpleBus {
    fn read(&mut self, clock: &mut u32, addr: u16) -> u8 {
        *clock += READ_SETUP_CYCLES + TRANSFER_CYCLES;
        self.ram[usize::from(addr)]
    }

    fn write(&mut self, clock: &mut u32, addr: u16, value: u8) {
        *clock += WRITE_SETUP_CYCLES + TRANSFER_CYCLES;
        self.ram[usize::from(addr)] = value;
    }

    fn peek(&self, addr: u16) -> u8 {
        self.ram[usize::from(addr)]
    }

    fn poke(&mut self, addr: u16, value: u8) {
        self.ram[usize::from(addr)] = value;
    }

    fn io_read(&mut self, port: u8) -> u8 {
        self.ports[usize::from(port)]
    }

    fn io_write(&mut self, port: u8, value: u8) {
        self.io_writes.push((port, value));
    }
}
