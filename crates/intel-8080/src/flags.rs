//! 8080 flag register bits and the result-flag table.

/// Sign flag (bit 7) - copy of bit 7 of the result.
pub const SF: u8 = 0b1000_0000;

/// Zero flag (bit 6) - set if the result is zero.
pub const ZF: u8 = 0b0100_0000;

/// Auxiliary carry (bit 4) - carry out of bit 3.
pub const HF: u8 = 0b0001_0000;

/// Parity flag (bit 2) - set if the result has an even number of 1 bits.
pub const PF: u8 = 0b0000_0100;

/// Bit 1 reads as set in every flag byte the ALU produces.
pub const BIT1: u8 = 0b0000_0010;

/// Carry flag (bit 0) - carry out of bit 7, or borrow.
pub const CF: u8 = 0b0000_0001;

/// Compute parity of a byte (true if even number of 1 bits).
#[must_use]
pub const fn parity(value: u8) -> bool {
    value.count_ones().is_multiple_of(2)
}

const fn szp(value: u8) -> u8 {
    let mut f = BIT1;
    if value & 0x80 != 0 {
        f |= SF;
    }
    if value == 0 {
        f |= ZF;
    }
    if parity(value) {
        f |= PF;
    }
    f
}

const fn build_table() -> [u8; 256] {
    let mut table = [0; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = szp(i as u8);
        i += 1;
    }
    table
}

/// S, Z and P flags (plus bit 1) for every result byte.
///
/// Instructions OR in their own carry and auxiliary-carry bits.
pub static FLAG_TABLE: [u8; 256] = build_table();
