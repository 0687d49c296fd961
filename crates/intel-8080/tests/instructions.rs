//! Unit tests for 8080 instruction behavior and cycle counts.
//!
//! `SimpleBus` charges 4 cycles per read and 5 per write, so every count
//! below is the instruction's internal cycles plus those bus costs.

use emu_core::{Bus, Cpu, SimpleBus};
use intel_8080::{BIT1, CF, HF, I8080, PF, SF, ZF};
use proptest::prelude::*;
use rstest::rstest;

const BUDGET: u32 = 1_000_000;

/// Load a program at 0000 and return a fresh CPU and bus.
fn setup_program(program: &[u8]) -> (I8080, SimpleBus) {
    let mut bus = SimpleBus::new();
    bus.load(0x0000, program);
    (I8080::new(BUDGET), bus)
}

fn run_instructions(cpu: &mut I8080, bus: &mut SimpleBus, count: usize) {
    for _ in 0..count {
        cpu.step(bus);
    }
}

#[test]
fn test_mvi_then_adi() {
    let (mut cpu, mut bus) = setup_program(&[
        0x3E, 0x12, // MVI A,12h
        0xC6, 0x08, // ADI 08h
    ]);
    run_instructions(&mut cpu, &mut bus, 2);

    let regs = cpu.registers();
    assert_eq!(regs.a, 0x1A);
    assert_eq!(regs.f, BIT1, "no carries, odd parity, non-zero");
    assert_eq!(regs.pc, 4);
    assert_eq!(regs.clock, 18);
}

#[rstest]
#[case::nop(&[0x00], 5)]
#[case::mov_r_r(&[0x41], 6)]
#[case::mov_r_m(&[0x46], 9)]
#[case::mov_m_r(&[0x70], 10)]
#[case::mvi_m(&[0x36, 0x00], 14)]
#[case::lxi(&[0x01, 0x00, 0x00], 13)]
#[case::lda(&[0x3A, 0x00, 0x00], 17)]
#[case::sta(&[0x32, 0x00, 0x10], 18)]
#[case::lhld(&[0x2A, 0x00, 0x00], 21)]
#[case::shld(&[0x22, 0x00, 0x10], 23)]
#[case::xchg(&[0xEB], 5)]
#[case::sphl(&[0xF9], 6)]
#[case::xthl(&[0xE3], 25)]
#[case::push(&[0xC5], 16)]
#[case::pop(&[0xC1], 13)]
#[case::add_r(&[0x80], 5)]
#[case::add_m(&[0x86], 9)]
#[case::adi(&[0xC6, 0x00], 9)]
#[case::inr_r(&[0x04], 6)]
#[case::inr_m(&[0x34], 14)]
#[case::inx(&[0x03], 6)]
#[case::dad(&[0x09], 11)]
#[case::daa(&[0x27], 5)]
#[case::jmp(&[0xC3, 0x00, 0x00], 13)]
#[case::jcc_not_taken(&[0xC2, 0x00, 0x00], 14)]
#[case::call(&[0xCD, 0x00, 0x00], 24)]
#[case::cnz_not_taken(&[0xC4, 0x00, 0x00], 14)]
#[case::ret(&[0xC9], 14)]
#[case::rnz_not_taken(&[0xC0], 6)]
#[case::pchl(&[0xE9], 6)]
#[case::rst(&[0xFF], 16)]
#[case::ei(&[0xFB], 5)]
#[case::in_port(&[0xDB, 0x10], 13)]
#[case::out_port(&[0xD3, 0x10], 14)]
fn test_cycle_counts(#[case] program: &[u8], #[case] expected: u32) {
    let (mut cpu, mut bus) = setup_program(program);
    // Make every conditional fail: Z set, everything else clear.
    cpu.registers_mut().f = ZF | BIT1;
    cpu.registers_mut().sp = 0x2000;
    cpu.step(&mut bus);
    assert_eq!(cpu.registers().clock, expected);
}

#[test]
fn test_halt_pins_clock_to_budget() {
    let mut bus = SimpleBus::new();
    bus.load(0, &[0x76]);
    let mut cpu = I8080::new(1000);
    cpu.step(&mut bus);
    assert!(cpu.is_halted());
    assert_eq!(cpu.registers().clock, 1000);
    assert_eq!(cpu.pc(), 1);
}

#[test]
fn test_halt_keeps_overshoot() {
    let mut bus = SimpleBus::new();
    bus.load(0, &[0x76]);
    let mut cpu = I8080::new(1000);
    cpu.registers_mut().clock = 998;
    cpu.step(&mut bus);
    assert_eq!(cpu.registers().clock, 1005);
}

#[test]
fn test_push_pop_psw() {
    let (mut cpu, mut bus) = setup_program(&[
        0x31, 0x00, 0x30, // LXI SP,3000h
        0x37, // STC
        0x3E, 0xA5, // MVI A,A5h
        0xF5, // PUSH PSW
        0xAF, // XRA A
        0xF1, // POP PSW
    ]);
    run_instructions(&mut cpu, &mut bus, 6);

    let regs = cpu.registers();
    assert_eq!(regs.a, 0xA5);
    assert_eq!(regs.f, BIT1 | CF);
    assert_eq!(regs.sp, 0x3000);
    assert_eq!(bus.peek(0x2FFF), 0xA5);
    assert_eq!(bus.peek(0x2FFE), BIT1 | CF);
}

#[test]
fn test_call_and_ret() {
    let mut bus = SimpleBus::new();
    bus.load(0x0000, &[
        0x31, 0x00, 0x20, // LXI SP,2000h
        0xCD, 0x00, 0x01, // CALL 0100h
        0x76, // HLT
    ]);
    bus.load(0x0100, &[0xC9]); // RET
    let mut cpu = I8080::new(BUDGET);

    run_instructions(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.pc(), 0x0100);
    assert_eq!(cpu.registers().sp, 0x1FFE);
    assert_eq!(bus.peek(0x1FFF), 0x00);
    assert_eq!(bus.peek(0x1FFE), 0x06);

    cpu.step(&mut bus);
    assert_eq!(cpu.pc(), 0x0006);
    assert_eq!(cpu.registers().sp, 0x2000);
}

#[test]
fn test_conditional_jump_consumes_operand() {
    let (mut cpu, mut bus) = setup_program(&[
        0xAF, // XRA A (sets Z)
        0xC2, 0x00, 0x10, // JNZ 1000h
        0xCA, 0x34, 0x12, // JZ 1234h
    ]);
    run_instructions(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.pc(), 0x0004);
    cpu.step(&mut bus);
    assert_eq!(cpu.pc(), 0x1234);
}

#[test]
fn test_port_io() {
    let (mut cpu, mut bus) = setup_program(&[
        0xDB, 0x10, // IN 10h
        0xD3, 0x20, // OUT 20h
        0xDB, 0x11, // IN 11h (unlatched)
    ]);
    bus.set_port(0x10, 0x5A);
    run_instructions(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.registers().a, 0x5A);
    assert_eq!(bus.io_writes(), &[(0x20, 0x5A)]);

    cpu.step(&mut bus);
    assert_eq!(cpu.registers().a, 0xFF);
}

#[test]
fn test_memory_increment_and_decrement() {
    let (mut cpu, mut bus) = setup_program(&[
        0x21, 0x00, 0x20, // LXI H,2000h
        0x34, // INR M
        0x35, // DCR M
        0x35, // DCR M
    ]);
    bus.poke(0x2000, 0x0F);
    run_instructions(&mut cpu, &mut bus, 2);
    assert_eq!(bus.peek(0x2000), 0x10);
    assert_eq!(cpu.registers().f & HF, HF);

    run_instructions(&mut cpu, &mut bus, 2);
    assert_eq!(bus.peek(0x2000), 0x0E);
    assert_eq!(cpu.registers().f & (SF | ZF | CF), 0);
}

#[test]
fn test_lhld_shld_little_endian() {
    let (mut cpu, mut bus) = setup_program(&[
        0x2A, 0x00, 0x30, // LHLD 3000h
        0x23, // INX H
        0x22, 0x02, 0x30, // SHLD 3002h
    ]);
    bus.load(0x3000, &[0xFF, 0x12]);
    run_instructions(&mut cpu, &mut bus, 3);
    assert_eq!(cpu.registers().hl.get(), 0x1300);
    assert_eq!(bus.peek(0x3002), 0x00);
    assert_eq!(bus.peek(0x3003), 0x13);
}

#[test]
fn test_bcd_addition() {
    let (mut cpu, mut bus) = setup_program(&[
        0x3E, 0x15, // MVI A,15h
        0xC6, 0x27, // ADI 27h
        0x27, // DAA
    ]);
    run_instructions(&mut cpu, &mut bus, 3);
    assert_eq!(cpu.registers().a, 0x42);
    assert_eq!(cpu.registers().f & PF, PF);
}

#[test]
fn test_stc_cmc_cma() {
    let (mut cpu, mut bus) = setup_program(&[
        0x37, // STC
        0x3F, // CMC
        0x2F, // CMA
    ]);
    run_instructions(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.registers().f & CF, 0);
    cpu.step(&mut bus);
    assert_eq!(cpu.registers().a, 0xFF);
    assert_eq!(cpu.registers().f, BIT1, "CMA leaves flags alone");
}

#[test]
fn test_undocumented_aliases() {
    let mut bus = SimpleBus::new();
    bus.load(0x0000, &[
        0x31, 0x00, 0x20, // LXI SP,2000h
        0x08, // NOP alias
        0xDD, 0x00, 0x01, // CALL alias
    ]);
    bus.load(0x0100, &[0xD9]); // RET alias
    let mut cpu = I8080::new(BUDGET);

    run_instructions(&mut cpu, &mut bus, 3);
    assert_eq!(cpu.pc(), 0x0100);
    cpu.step(&mut bus);
    assert_eq!(cpu.pc(), 0x0007);

    bus.load(0x0007, &[0xCB, 0x00, 0x40]); // JMP alias
    cpu.step(&mut bus);
    assert_eq!(cpu.pc(), 0x4000);
}

proptest! {
    #[test]
    fn sub_restores_accumulator_after_add(a: u8, d: u8) {
        let (mut cpu, mut bus) = setup_program(&[
            0x3E, a, // MVI A,a
            0xC6, d, // ADI d
        ]);
        run_instructions(&mut cpu, &mut bus, 2);
        let add_carry = cpu.registers().f & CF;

        bus.load(0x0004, &[0xD6, d]); // SUI d
        cpu.step(&mut bus);
        prop_assert_eq!(cpu.registers().a, a);
        prop_assert_eq!(cpu.registers().f & CF, add_carry);
    }
}
