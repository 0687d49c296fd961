//! ALU operations for the 8080.
//!
//! Auxiliary carry is derived the way the hardware does it: bit 4 of the
//! operation applied to both operands with their bit 4 cleared. For
//! subtraction this is not the same as "borrow from bit 4".

#![allow(clippy::cast_possible_truncation)] // Intentional truncation for low byte extraction.

use crate::flags::{CF, FLAG_TABLE, HF};

/// Result of an ALU operation with flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluResult {
    pub value: u8,
    pub flags: u8,
}

fn szp(value: u8) -> u8 {
    FLAG_TABLE[usize::from(value)]
}

/// ADD/ADC: `a + d + carry`.
#[must_use]
pub fn add(a: u8, d: u8, carry: bool) -> AluResult {
    let c = u8::from(carry);
    let ac = (a & !HF).wrapping_add(d & !HF).wrapping_add(c) & HF;
    let sum = u16::from(a) + u16::from(d) + u16::from(c);
    let value = sum as u8;
    AluResult {
        value,
        flags: szp(value) | ((sum >> 8) as u8 & CF) | ac,
    }
}

/// SUB/SBB/CMP: `a - d - borrow`. Carry is set on borrow.
#[must_use]
pub fn sub(a: u8, d: u8, borrow: bool) -> AluResult {
    let c = u8::from(borrow);
    let ac = (a & !HF).wrapping_sub(d & !HF).wrapping_sub(c) & HF;
    let diff = u16::from(a)
        .wrapping_sub(u16::from(d))
        .wrapping_sub(u16::from(c));
    let value = diff as u8;
    AluResult {
        value,
        flags: szp(value) | ((diff >> 8) as u8 & CF) | ac,
    }
}

/// ANA: AC is the OR of both operands' bit 3.
#[must_use]
pub fn and(a: u8, d: u8) -> AluResult {
    let value = a & d;
    AluResult {
        value,
        flags: szp(value) | (((a | d) & 0x08) << 1),
    }
}

/// XRA: clears carry and auxiliary carry.
#[must_use]
pub fn xor(a: u8, d: u8) -> AluResult {
    let value = a ^ d;
    AluResult {
        value,
        flags: szp(value),
    }
}

/// ORA: clears carry and auxiliary carry.
#[must_use]
pub fn or(a: u8, d: u8) -> AluResult {
    let value = a | d;
    AluResult {
        value,
        flags: szp(value),
    }
}

/// INR: carry is preserved from `f`.
#[must_use]
pub fn inc(r: u8, f: u8) -> AluResult {
    let value = r.wrapping_add(1);
    let ac = (r & !HF).wrapping_add(1) & HF;
    AluResult {
        value,
        flags: szp(value) | (f & CF) | ac,
    }
}

/// DCR on a register: carry is preserved from `f`.
#[must_use]
pub fn dec(r: u8, f: u8) -> AluResult {
    let value = r.wrapping_sub(1);
    let ac = (r & !HF).wrapping_sub(1) & HF;
    AluResult {
        value,
        flags: szp(value) | (f & CF) | ac,
    }
}

/// DCR M: derives AC as INR does, unlike the register form.
#[must_use]
pub fn dec_mem(r: u8, f: u8) -> AluResult {
    let value = r.wrapping_sub(1);
    let ac = (r & !HF).wrapping_add(1) & HF;
    AluResult {
        value,
        flags: szp(value) | (f & CF) | ac,
    }
}

/// DAA: decimal-adjust the accumulator after a BCD addition.
#[must_use]
pub fn daa(a: u8, f: u8) -> AluResult {
    let mut value = a;
    let mut ac = f & HF;
    let mut carry = f & CF;
    if (value & 0x0F) > 9 || ac != 0 {
        ac = (value & !HF).wrapping_add(0x06) & HF;
        let sum = u16::from(value) + 0x06;
        value = sum as u8;
        carry |= (sum >> 8) as u8 & CF;
    }
    if (value & 0xF0) > 0x90 || carry != 0 {
        let sum = u16::from(value) + 0x60;
        value = sum as u8;
        carry |= (sum >> 8) as u8 & CF;
    }
    AluResult {
        value,
        flags: szp(value) | ac | carry,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::{BIT1, PF, SF, ZF};
    use proptest::prelude::*;

    #[test]
    fn add_without_carries() {
        assert_eq!(add(0x12, 0x08, false), AluResult { value: 0x1A, flags: BIT1 });
    }

    #[test]
    fn add_sets_aux_carry_from_bit_3() {
        assert_eq!(add(0x0F, 0x01, false), AluResult { value: 0x10, flags: BIT1 | HF });
    }

    #[test]
    fn add_overflow_to_zero() {
        let r = add(0xFF, 0x01, false);
        assert_eq!(r.value, 0x00);
        assert_eq!(r.flags, ZF | PF | BIT1 | HF | CF);
    }

    #[test]
    fn adc_adds_carry_in() {
        assert_eq!(add(0x10, 0x20, true).value, 0x31);
    }

    #[test]
    fn sub_borrow_from_zero() {
        let r = sub(0x00, 0x01, false);
        assert_eq!(r.value, 0xFF);
        assert_eq!(r.flags, SF | PF | BIT1 | HF | CF);
    }

    #[test]
    fn sub_equal_operands() {
        assert_eq!(sub(0x3E, 0x3E, false), AluResult { value: 0, flags: ZF | PF | BIT1 });
    }

    #[test]
    fn and_aux_carry_from_bit_3_of_either_operand() {
        assert_eq!(and(0x08, 0x00).flags, ZF | PF | BIT1 | HF);
        assert_eq!(and(0xF0, 0x07).flags & HF, 0);
    }

    #[test]
    fn logical_ops_clear_carry() {
        assert_eq!(xor(0xFF, 0xFF), AluResult { value: 0, flags: ZF | PF | BIT1 });
        assert_eq!(or(0x80, 0x01), AluResult { value: 0x81, flags: SF | PF | BIT1 });
    }

    #[test]
    fn inc_keeps_carry() {
        assert_eq!(inc(0x0F, CF), AluResult { value: 0x10, flags: BIT1 | HF | CF });
        assert_eq!(inc(0xFF, 0).flags, ZF | PF | BIT1 | HF);
    }

    #[test]
    fn dec_register_and_memory_forms_differ_in_aux_carry() {
        assert_eq!(dec(0x10, 0), AluResult { value: 0x0F, flags: PF | BIT1 | HF });
        assert_eq!(dec_mem(0x10, 0), AluResult { value: 0x0F, flags: PF | BIT1 });
        assert_eq!(dec(0x01, CF), AluResult { value: 0, flags: ZF | PF | BIT1 | CF });
    }

    #[test]
    fn daa_adjusts_low_digit() {
        // 15 + 27 = 3C, adjusted to 42.
        let r = daa(0x3C, BIT1);
        assert_eq!(r, AluResult { value: 0x42, flags: PF | BIT1 | HF });
    }

    #[test]
    fn daa_carries_out_of_99() {
        // 99 + 01 = 9A, adjusted to 00 with carry.
        let r = daa(0x9A, BIT1);
        assert_eq!(r, AluResult { value: 0x00, flags: ZF | PF | BIT1 | HF | CF });
    }

    proptest! {
        #[test]
        fn sub_undoes_add(a: u8, d: u8) {
            let sum = add(a, d, false);
            let diff = sub(sum.value, d, false);
            prop_assert_eq!(diff.value, a);
            prop_assert_eq!(diff.flags & CF, sum.flags & CF);
        }

        #[test]
        fn flags_always_carry_bit1(a: u8, d: u8, carry: bool) {
            for r in [add(a, d, carry), sub(a, d, carry), and(a, d), xor(a, d), or(a, d)] {
                prop_assert_eq!(r.flags & BIT1, BIT1);
                prop_assert_eq!(r.flags & ZF != 0, r.value == 0);
            }
        }
    }
}
