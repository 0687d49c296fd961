//! I/O port handlers.
//!
//! Two 256-entry tables built at compile time. Unmapped inputs float to
//! 0xFF and unmapped outputs are ignored. Several registers have bits that
//! are not wired and always read back as set.

use crate::bus::Pk8000Bus;

pub(crate) type InHandler = fn(&Pk8000Bus) -> u8;
pub(crate) type OutHandler = fn(&mut Pk8000Bus, u8);

pub(crate) static IN_PORTS: [InHandler; 256] = in_table();
pub(crate) static OUT_PORTS: [OutHandler; 256] = out_table();

const fn in_table() -> [InHandler; 256] {
    let mut table = [in_idle as InHandler; 256];
    table[0x80] = in80;
    table[0x81] = in81;
    table[0x82] = in82;
    table[0x84] = in84;
    table[0x85] = in85;
    table[0x86] = in86;
    table[0x88] = in88;
    table[0x8C] = in8c;
    table[0x8D] = in8d;
    table[0x90] = in90;
    table[0x91] = in91;
    table[0x92] = in92;
    table[0x93] = in93;
    table
}

const fn out_table() -> [OutHandler; 256] {
    let mut table = [out_idle as OutHandler; 256];
    table[0x80] = out80;
    table[0x82] = out82;
    table[0x84] = out84;
    table[0x85] = out85;
    table[0x86] = out86;
    table[0x88] = out88;
    table[0x90] = out90;
    table[0x91] = out91;
    table[0x92] = out92;
    table[0x93] = out93;
    table
}

fn in_idle(_bus: &Pk8000Bus) -> u8 {
    0xFF
}

fn out_idle(_bus: &mut Pk8000Bus, _value: u8) {}

// Bank control.

fn in80(bus: &Pk8000Bus) -> u8 {
    bus.memory.ports.port80
}

fn out80(bus: &mut Pk8000Bus, value: u8) {
    bus.memory.ports.port80 = value;
    bus.relatch();
    log::debug!("bank map {value:02x}: {:?}", bus.bank_map());
}

// Keyboard: port 0x82 selects the row that port 0x81 returns.

fn in81(bus: &Pk8000Bus) -> u8 {
    let ports = &bus.memory.ports;
    ports.port81[usize::from(ports.port82 & 0x0F)]
}

fn in82(bus: &Pk8000Bus) -> u8 {
    bus.memory.ports.port82
}

fn out82(bus: &mut Pk8000Bus, value: u8) {
    bus.memory.ports.port82 = value;
}

// Video mode. The low nibble is not wired.

fn in84(bus: &Pk8000Bus) -> u8 {
    bus.memory.ports.port84 | 0x0F
}

fn out84(bus: &mut Pk8000Bus, value: u8) {
    bus.memory.ports.port84 = value | 0x0F;
}

fn in85(bus: &Pk8000Bus) -> u8 {
    bus.memory.ports.port85
}

fn out85(bus: &mut Pk8000Bus, value: u8) {
    bus.memory.ports.port85 = value;
}

fn in86(bus: &Pk8000Bus) -> u8 {
    bus.memory.ports.port86 | 0xCE
}

fn out86(bus: &mut Pk8000Bus, value: u8) {
    bus.memory.ports.port86 = value | 0xCE;
}

fn in88(bus: &Pk8000Bus) -> u8 {
    bus.memory.ports.port88
}

fn out88(bus: &mut Pk8000Bus, value: u8) {
    bus.memory.ports.port88 = value;
}

// Joysticks are input only.

fn in8c(bus: &Pk8000Bus) -> u8 {
    bus.memory.ports.port8c & 0x3F
}

fn in8d(bus: &Pk8000Bus) -> u8 {
    bus.memory.ports.port8d & 0x3F
}

// Screen base registers.

fn in90(bus: &Pk8000Bus) -> u8 {
    bus.memory.ports.port90 | 0xF0
}

fn out90(bus: &mut Pk8000Bus, value: u8) {
    bus.memory.ports.port90 = value | 0xF0;
}

fn in91(bus: &Pk8000Bus) -> u8 {
    bus.memory.ports.port91 | 0xF1
}

fn out91(bus: &mut Pk8000Bus, value: u8) {
    bus.memory.ports.port91 = value | 0xF1;
}

fn in92(bus: &Pk8000Bus) -> u8 {
    bus.memory.ports.port92 | 0xF7
}

fn out92(bus: &mut Pk8000Bus, value: u8) {
    bus.memory.ports.port92 = value | 0xF7;
}

fn in93(bus: &Pk8000Bus) -> u8 {
    bus.memory.ports.port93 | 0xF7
}

fn out93(bus: &mut Pk8000Bus, value: u8) {
    bus.memory.ports.port93 = value | 0xF7;
}
