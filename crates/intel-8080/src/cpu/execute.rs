//! Instruction handlers and the opcode table.
//!
//! Each handler charges the instruction's internal cycles to the clock;
//! memory and fetch cycles are charged by the bus as the handler touches it.
//! Register operands are const parameters so that one generic handler
//! covers a whole row or column of the opcode map.

use emu_core::Bus;

use crate::alu::{self, AluResult};
use crate::flags::CF;
use crate::registers::{HALT, INTE};

use super::I8080;

pub(super) type Handler = fn(&mut I8080, &mut dyn Bus);

const B: u8 = 0;
const C: u8 = 1;
const D: u8 = 2;
const E: u8 = 3;
const H: u8 = 4;
const L: u8 = 5;
const A: u8 = 7;

const BC: u8 = 0;
const DE: u8 = 1;
const HL: u8 = 2;
const SP: u8 = 3;
/// PUSH/POP use the SP slot for the accumulator and flags.
const PSW: u8 = 3;

const ADD: u8 = 0;
const ADC: u8 = 1;
const SUB: u8 = 2;
const SBB: u8 = 3;
const ANA: u8 = 4;
const XRA: u8 = 5;
const ORA: u8 = 6;
const CMP: u8 = 7;

/// Handler for every opcode. The undocumented encodings behave as their
/// documented twins: 08-38 as NOP, CB as JMP, D9 as RET, DD/ED/FD as CALL.
#[rustfmt::skip]
pub(super) static OPCODES: [Handler; 256] = [
    // 0x00
    nop,          lxi::<BC>,     stax::<BC>,    inx::<BC>,     inr::<B>,      dcr::<B>,      mvi::<B>,      rlc,
    nop,          dad::<BC>,     ldax::<BC>,    dcx::<BC>,     inr::<C>,      dcr::<C>,      mvi::<C>,      rrc,
    // 0x10
    nop,          lxi::<DE>,     stax::<DE>,    inx::<DE>,     inr::<D>,      dcr::<D>,      mvi::<D>,      ral,
    nop,          dad::<DE>,     ldax::<DE>,    dcx::<DE>,     inr::<E>,      dcr::<E>,      mvi::<E>,      rar,
    // 0x20
    nop,          lxi::<HL>,     shld,          inx::<HL>,     inr::<H>,      dcr::<H>,      mvi::<H>,      daa,
    nop,          dad::<HL>,     lhld,          dcx::<HL>,     inr::<L>,      dcr::<L>,      mvi::<L>,      cma,
    // 0x30
    nop,          lxi::<SP>,     sta,           inx::<SP>,     inr_m,         dcr_m,         mvi_m,         stc,
    nop,          dad::<SP>,     lda,           dcx::<SP>,     inr::<A>,      dcr::<A>,      mvi::<A>,      cmc,
    // 0x40
    mov::<B, B>,  mov::<B, C>,   mov::<B, D>,   mov::<B, E>,   mov::<B, H>,   mov::<B, L>,   mov_from_m::<B>, mov::<B, A>,
    mov::<C, B>,  mov::<C, C>,   mov::<C, D>,   mov::<C, E>,   mov::<C, H>,   mov::<C, L>,   mov_from_m::<C>, mov::<C, A>,
    // 0x50
    mov::<D, B>,  mov::<D, C>,   mov::<D, D>,   mov::<D, E>,   mov::<D, H>,   mov::<D, L>,   mov_from_m::<D>, mov::<D, A>,
    mov::<E, B>,  mov::<E, C>,   mov::<E, D>,   mov::<E, E>,   mov::<E, H>,   mov::<E, L>,   mov_from_m::<E>, mov::<E, A>,
    // 0x60
    mov::<H, B>,  mov::<H, C>,   mov::<H, D>,   mov::<H, E>,   mov::<H, H>,   mov::<H, L>,   mov_from_m::<H>, mov::<H, A>,
    mov::<L, B>,  mov::<L, C>,   mov::<L, D>,   mov::<L, E>,   mov::<L, H>,   mov::<L, L>,   mov_from_m::<L>, mov::<L, A>,
    // 0x70
    mov_to_m::<B>, mov_to_m::<C>, mov_to_m::<D>, mov_to_m::<E>, mov_to_m::<H>, mov_to_m::<L>, hlt,           mov_to_m::<A>,
    mov::<A, B>,  mov::<A, C>,   mov::<A, D>,   mov::<A, E>,   mov::<A, H>,   mov::<A, L>,   mov_from_m::<A>, mov::<A, A>,
    // 0x80
    alu_r::<ADD, B>, alu_r::<ADD, C>, alu_r::<ADD, D>, alu_r::<ADD, E>, alu_r::<ADD, H>, alu_r::<ADD, L>, alu_m::<ADD>, alu_r::<ADD, A>,
    alu_r::<ADC, B>, alu_r::<ADC, C>, alu_r::<ADC, D>, alu_r::<ADC, E>, alu_r::<ADC, H>, alu_r::<ADC, L>, alu_m::<ADC>, alu_r::<ADC, A>,
    // 0x90
    alu_r::<SUB, B>, alu_r::<SUB, C>, alu_r::<SUB, D>, alu_r::<SUB, E>, alu_r::<SUB, H>, alu_r::<SUB, L>, alu_m::<SUB>, alu_r::<SUB, A>,
    alu_r::<SBB, B>, alu_r::<SBB, C>, alu_r::<SBB, D>, alu_r::<SBB, E>, alu_r::<SBB, H>, alu_r::<SBB, L>, alu_m::<SBB>, alu_r::<SBB, A>,
    // 0xA0
    alu_r::<ANA, B>, alu_r::<ANA, C>, alu_r::<ANA, D>, alu_r::<ANA, E>, alu_r::<ANA, H>, alu_r::<ANA, L>, alu_m::<ANA>, alu_r::<ANA, A>,
    alu_r::<XRA, B>, alu_r::<XRA, C>, alu_r::<XRA, D>, alu_r::<XRA, E>, alu_r::<XRA, H>, alu_r::<XRA, L>, alu_m::<XRA>, alu_r::<XRA, A>,
    // 0xB0
    alu_r::<ORA, B>, alu_r::<ORA, C>, alu_r::<ORA, D>, alu_r::<ORA, E>, alu_r::<ORA, H>, alu_r::<ORA, L>, alu_m::<ORA>, alu_r::<ORA, A>,
    alu_r::<CMP, B>, alu_r::<CMP, C>, alu_r::<CMP, D>, alu_r::<CMP, E>, alu_r::<CMP, H>, alu_r::<CMP, L>, alu_m::<CMP>, alu_r::<CMP, A>,
    // 0xC0
    rcc::<0>,     pop::<BC>,     jcc::<0>,      jmp,           ccc::<0>,      push::<BC>,    alu_imm::<ADD>, rst::<0>,
    rcc::<1>,     ret,           jcc::<1>,      jmp,           ccc::<1>,      call,          alu_imm::<ADC>, rst::<1>,
    // 0xD0
    rcc::<2>,     pop::<DE>,     jcc::<2>,      out_port,      ccc::<2>,      push::<DE>,    alu_imm::<SUB>, rst::<2>,
    rcc::<3>,     ret,           jcc::<3>,      in_port,       ccc::<3>,      call,          alu_imm::<SBB>, rst::<3>,
    // 0xE0
    rcc::<4>,     pop::<HL>,     jcc::<4>,      xthl,          ccc::<4>,      push::<HL>,    alu_imm::<ANA>, rst::<4>,
    rcc::<5>,     pchl,          jcc::<5>,      xchg,          ccc::<5>,      call,          alu_imm::<XRA>, rst::<5>,
    // 0xF0
    rcc::<6>,     pop::<PSW>,    jcc::<6>,      di,            ccc::<6>,      push::<PSW>,   alu_imm::<ORA>, rst::<6>,
    rcc::<7>,     sphl,          jcc::<7>,      ei,            ccc::<7>,      call,          alu_imm::<CMP>, rst::<7>,
];

// =============================================================================
// Data transfer
// =============================================================================

fn mov<const DST: u8, const SRC: u8>(cpu: &mut I8080, _bus: &mut dyn Bus) {
    cpu.regs.clock += 2;
    cpu.set_reg(DST, cpu.reg(SRC));
}

fn mov_from_m<const DST: u8>(cpu: &mut I8080, bus: &mut dyn Bus) {
    cpu.regs.clock += 1;
    let value = cpu.read(bus, cpu.regs.hl.get());
    cpu.set_reg(DST, value);
}

fn mov_to_m<const SRC: u8>(cpu: &mut I8080, bus: &mut dyn Bus) {
    cpu.regs.clock += 1;
    cpu.write(bus, cpu.regs.hl.get(), cpu.reg(SRC));
}

fn mvi<const DST: u8>(cpu: &mut I8080, bus: &mut dyn Bus) {
    cpu.regs.clock += 1;
    let value = cpu.fetch(bus);
    cpu.set_reg(DST, value);
}

fn mvi_m(cpu: &mut I8080, bus: &mut dyn Bus) {
    cpu.regs.clock += 1;
    let value = cpu.fetch(bus);
    cpu.write(bus, cpu.regs.hl.get(), value);
}

fn lxi<const RP: u8>(cpu: &mut I8080, bus: &mut dyn Bus) {
    cpu.regs.clock += 1;
    let value = cpu.fetch16(bus);
    cpu.set_pair(RP, value);
}

fn lda(cpu: &mut I8080, bus: &mut dyn Bus) {
    cpu.regs.clock += 1;
    let addr = cpu.fetch16(bus);
    cpu.regs.a = cpu.read(bus, addr);
}

fn sta(cpu: &mut I8080, bus: &mut dyn Bus) {
    cpu.regs.clock += 1;
    let addr = cpu.fetch16(bus);
    cpu.write(bus, addr, cpu.regs.a);
}

fn lhld(cpu: &mut I8080, bus: &mut dyn Bus) {
    cpu.regs.clock += 1;
    let addr = cpu.fetch16(bus);
    let value = cpu.read16(bus, addr);
    cpu.regs.hl.set(value);
}

fn shld(cpu: &mut I8080, bus: &mut dyn Bus) {
    cpu.regs.clock += 1;
    let addr = cpu.fetch16(bus);
    cpu.write16(bus, addr, cpu.regs.hl.get());
}

fn ldax<const RP: u8>(cpu: &mut I8080, bus: &mut dyn Bus) {
    cpu.regs.clock += 1;
    cpu.regs.a = cpu.read(bus, cpu.pair(RP));
}

fn stax<const RP: u8>(cpu: &mut I8080, bus: &mut dyn Bus) {
    cpu.regs.clock += 1;
    cpu.write(bus, cpu.pair(RP), cpu.regs.a);
}

fn xchg(cpu: &mut I8080, _bus: &mut dyn Bus) {
    cpu.regs.clock += 1;
    std::mem::swap(&mut cpu.regs.hl, &mut cpu.regs.de);
}

fn sphl(cpu: &mut I8080, _bus: &mut dyn Bus) {
    cpu.regs.clock += 2;
    cpu.regs.sp = cpu.regs.hl.get();
}

fn xthl(cpu: &mut I8080, bus: &mut dyn Bus) {
    cpu.regs.clock += 1;
    let top = cpu.pop(bus);
    cpu.push(bus, cpu.regs.hl.get());
    cpu.regs.clock += 2;
    cpu.regs.hl.set(top);
}

fn push<const RP: u8>(cpu: &mut I8080, bus: &mut dyn Bus) {
    cpu.regs.clock += 2;
    let value = if RP == PSW { cpu.regs.psw() } else { cpu.pair(RP) };
    cpu.push(bus, value);
}

fn pop<const RP: u8>(cpu: &mut I8080, bus: &mut dyn Bus) {
    cpu.regs.clock += 1;
    let value = cpu.pop(bus);
    if RP == PSW {
        cpu.regs.set_psw(value);
    } else {
        cpu.set_pair(RP, value);
    }
}

// =============================================================================
// Arithmetic and logic
// =============================================================================

/// Apply an accumulator operation. CMP keeps A and only sets flags.
fn accumulate<const OP: u8>(cpu: &mut I8080, data: u8) {
    cpu.regs.clock += 1;
    let a = cpu.regs.a;
    let carry = cpu.regs.f & CF != 0;
    let AluResult { value, flags } = match OP {
        ADD => alu::add(a, data, false),
        ADC => alu::add(a, data, carry),
        SUB | CMP => alu::sub(a, data, false),
        SBB => alu::sub(a, data, carry),
        ANA => alu::and(a, data),
        XRA => alu::xor(a, data),
        _ => alu::or(a, data),
    };
    if OP != CMP {
        cpu.regs.a = value;
    }
    cpu.regs.f = flags;
}

fn alu_r<const OP: u8, const SRC: u8>(cpu: &mut I8080, _bus: &mut dyn Bus) {
    let data = cpu.reg(SRC);
    accumulate::<OP>(cpu, data);
}

fn alu_m<const OP: u8>(cpu: &mut I8080, bus: &mut dyn Bus) {
    let data = cpu.read(bus, cpu.regs.hl.get());
    accumulate::<OP>(cpu, data);
}

fn alu_imm<const OP: u8>(cpu: &mut I8080, bus: &mut dyn Bus) {
    let data = cpu.fetch(bus);
    accumulate::<OP>(cpu, data);
}

fn inr<const R: u8>(cpu: &mut I8080, _bus: &mut dyn Bus) {
    cpu.regs.clock += 2;
    let result = alu::inc(cpu.reg(R), cpu.regs.f);
    cpu.set_reg(R, result.value);
    cpu.regs.f = result.flags;
}

fn dcr<const R: u8>(cpu: &mut I8080, _bus: &mut dyn Bus) {
    cpu.regs.clock += 2;
    let result = alu::dec(cpu.reg(R), cpu.regs.f);
    cpu.set_reg(R, result.value);
    cpu.regs.f = result.flags;
}

fn inr_m(cpu: &mut I8080, bus: &mut dyn Bus) {
    cpu.regs.clock += 1;
    let addr = cpu.regs.hl.get();
    let value = cpu.read(bus, addr);
    let result = alu::inc(value, cpu.regs.f);
    cpu.regs.f = result.flags;
    cpu.write(bus, addr, result.value);
}

fn dcr_m(cpu: &mut I8080, bus: &mut dyn Bus) {
    cpu.regs.clock += 1;
    let addr = cpu.regs.hl.get();
    let value = cpu.read(bus, addr);
    let result = alu::dec_mem(value, cpu.regs.f);
    cpu.regs.f = result.flags;
    cpu.write(bus, addr, result.value);
}

fn inx<const RP: u8>(cpu: &mut I8080, _bus: &mut dyn Bus) {
    cpu.regs.clock += 2;
    cpu.set_pair(RP, cpu.pair(RP).wrapping_add(1));
}

fn dcx<const RP: u8>(cpu: &mut I8080, _bus: &mut dyn Bus) {
    cpu.regs.clock += 2;
    cpu.set_pair(RP, cpu.pair(RP).wrapping_sub(1));
}

/// DAD: only carry is affected.
fn dad<const RP: u8>(cpu: &mut I8080, _bus: &mut dyn Bus) {
    cpu.regs.clock += 1;
    let (sum, carry) = cpu.regs.hl.get().overflowing_add(cpu.pair(RP));
    cpu.regs.hl.set(sum);
    cpu.regs.f = (cpu.regs.f & !CF) | u8::from(carry);
    cpu.regs.clock += 6;
}

fn daa(cpu: &mut I8080, _bus: &mut dyn Bus) {
    cpu.regs.clock += 1;
    let result = alu::daa(cpu.regs.a, cpu.regs.f);
    cpu.regs.a = result.value;
    cpu.regs.f = result.flags;
}

fn cma(cpu: &mut I8080, _bus: &mut dyn Bus) {
    cpu.regs.clock += 1;
    cpu.regs.a = !cpu.regs.a;
}

fn rlc(cpu: &mut I8080, _bus: &mut dyn Bus) {
    cpu.regs.clock += 1;
    let carry = cpu.regs.a >> 7;
    cpu.regs.a = cpu.regs.a.rotate_left(1);
    cpu.regs.f = (cpu.regs.f & !CF) | carry;
}

fn rrc(cpu: &mut I8080, _bus: &mut dyn Bus) {
    cpu.regs.clock += 1;
    let carry = cpu.regs.a & 0x01;
    cpu.regs.a = cpu.regs.a.rotate_right(1);
    cpu.regs.f = (cpu.regs.f & !CF) | carry;
}

fn ral(cpu: &mut I8080, _bus: &mut dyn Bus) {
    cpu.regs.clock += 1;
    let carry = cpu.regs.a >> 7;
    cpu.regs.a = (cpu.regs.a << 1) | (cpu.regs.f & CF);
    cpu.regs.f = (cpu.regs.f & !CF) | carry;
}

fn rar(cpu: &mut I8080, _bus: &mut dyn Bus) {
    cpu.regs.clock += 1;
    let carry = cpu.regs.a & 0x01;
    cpu.regs.a = (cpu.regs.a >> 1) | ((cpu.regs.f & CF) << 7);
    cpu.regs.f = (cpu.regs.f & !CF) | carry;
}

fn stc(cpu: &mut I8080, _bus: &mut dyn Bus) {
    cpu.regs.clock += 1;
    cpu.regs.f |= CF;
}

fn cmc(cpu: &mut I8080, _bus: &mut dyn Bus) {
    cpu.regs.clock += 1;
    cpu.regs.f ^= CF;
}

// =============================================================================
// Control flow
// =============================================================================

fn jmp(cpu: &mut I8080, bus: &mut dyn Bus) {
    cpu.regs.clock += 1;
    cpu.regs.pc = cpu.fetch16(bus);
}

/// Conditional jump. The target is fetched whether or not it is taken.
fn jcc<const CC: u8>(cpu: &mut I8080, bus: &mut dyn Bus) {
    cpu.regs.clock += 2;
    let addr = cpu.fetch16(bus);
    if cpu.condition(CC) {
        cpu.regs.pc = addr;
    }
}

fn call(cpu: &mut I8080, bus: &mut dyn Bus) {
    cpu.regs.clock += 2;
    let addr = cpu.fetch16(bus);
    cpu.push(bus, cpu.regs.pc);
    cpu.regs.pc = addr;
}

fn ccc<const CC: u8>(cpu: &mut I8080, bus: &mut dyn Bus) {
    cpu.regs.clock += 2;
    let addr = cpu.fetch16(bus);
    if cpu.condition(CC) {
        cpu.push(bus, cpu.regs.pc);
        cpu.regs.pc = addr;
    }
}

fn ret(cpu: &mut I8080, bus: &mut dyn Bus) {
    cpu.regs.clock += 2;
    cpu.do_return(bus);
}

/// Conditional return. The return trigger only fires when taken.
fn rcc<const CC: u8>(cpu: &mut I8080, bus: &mut dyn Bus) {
    cpu.regs.clock += 2;
    if cpu.condition(CC) {
        cpu.do_return(bus);
    }
}

fn pchl(cpu: &mut I8080, _bus: &mut dyn Bus) {
    cpu.regs.clock += 2;
    cpu.regs.pc = cpu.regs.hl.get();
}

fn rst<const N: u16>(cpu: &mut I8080, bus: &mut dyn Bus) {
    cpu.rst(bus, N * 8);
}

// =============================================================================
// Machine control and I/O
// =============================================================================

fn ei(cpu: &mut I8080, _bus: &mut dyn Bus) {
    cpu.regs.clock += 1;
    cpu.regs.state |= INTE;
}

fn di(cpu: &mut I8080, _bus: &mut dyn Bus) {
    cpu.regs.clock += 1;
    cpu.regs.state &= !INTE;
}

/// HLT ends the frame: the clock is pushed to the budget if it is short.
fn hlt(cpu: &mut I8080, _bus: &mut dyn Bus) {
    cpu.regs.clock += 1;
    cpu.regs.state |= HALT;
    cpu.regs.clock += 2;
    cpu.regs.clock = cpu.regs.clock.max(cpu.frame_clocks);
}

fn nop(cpu: &mut I8080, _bus: &mut dyn Bus) {
    cpu.regs.clock += 1;
}

fn in_port(cpu: &mut I8080, bus: &mut dyn Bus) {
    cpu.regs.clock += 1;
    let port = cpu.fetch(bus);
    cpu.regs.clock += 3;
    cpu.regs.a = bus.io_read(port);
    cpu.regs.clock += 1;
}

fn out_port(cpu: &mut I8080, bus: &mut dyn Bus) {
    cpu.regs.clock += 1;
    let port = cpu.fetch(bus);
    cpu.regs.clock += 4;
    bus.io_write(port, cpu.regs.a);
    cpu.regs.clock += 1;
}
