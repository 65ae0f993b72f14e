/*
    Iron86
    https://github.com/iron86/iron86

    Copyright 2024-2025 The Iron86 Contributors

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    ---------------------------------------------------------------------------

    tests/instructions.rs

    Instruction-level scenarios driven through Intel8086::step.

*/

use iron86_core::{
    cpu_8086::{
        Intel8086,
        CPU_FLAG_AUX_CARRY,
        CPU_FLAG_CARRY,
        CPU_FLAG_DIRECTION,
        CPU_FLAG_OVERFLOW,
        CPU_FLAG_PARITY,
        CPU_FLAG_SIGN,
        CPU_FLAG_ZERO,
    },
    cpu_common::{Register8, Register16, StepOutcome},
};

/// Build a CPU with code placed at CS:IP.
fn cpu_with_code(cs: u16, ip: u16, code: &[u8]) -> Intel8086 {
    let mut cpu = Intel8086::new();
    cpu.set_register16(Register16::CS, cs);
    cpu.set_register16(Register16::IP, ip);
    let base = Intel8086::calc_linear_address(cs, ip);
    for (i, b) in code.iter().enumerate() {
        cpu.bus_mut().write_u8(base.wrapping_add(i as u32), *b);
    }
    cpu
}

fn arith_flags(cpu: &Intel8086) -> u16 {
    cpu.get_flags()
        & (CPU_FLAG_CARRY
            | CPU_FLAG_PARITY
            | CPU_FLAG_AUX_CARRY
            | CPU_FLAG_ZERO
            | CPU_FLAG_SIGN
            | CPU_FLAG_OVERFLOW)
}

#[test]
fn test_mov_al_imm8_preserves_ah() {
    let mut cpu = cpu_with_code(0x1000, 0x5F6C, &[0xB0, 0x8A]);
    cpu.set_register16(Register16::AX, 0xA9B1);
    let flags_before = cpu.get_flags();

    assert_eq!(cpu.step(), StepOutcome::Continued);
    assert_eq!(cpu.get_register16(Register16::AX), 0xA98A);
    assert_eq!(cpu.get_register16(Register16::IP), 0x5F6E);
    assert_eq!(cpu.get_flags(), flags_before);
}

#[test]
fn test_add_al_1_rollover() {
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0x04, 0x01]);
    cpu.set_register16(Register16::AX, 0x00FF);
    cpu.set_flags(0);

    assert_eq!(cpu.step(), StepOutcome::Continued);
    assert_eq!(cpu.get_register16(Register16::AX), 0x0000);
    assert_eq!(cpu.get_register16(Register16::IP), 0x0102);
    assert_eq!(
        arith_flags(&cpu),
        CPU_FLAG_CARRY | CPU_FLAG_ZERO | CPU_FLAG_AUX_CARRY | CPU_FLAG_PARITY
    );
}

#[test]
fn test_sub_al_1_borrow() {
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0x2C, 0x01]);
    cpu.set_register16(Register16::AX, 0x0000);
    cpu.set_flags(0);

    cpu.step();
    assert_eq!(cpu.get_register8(Register8::AL), 0xFF);
    assert_eq!(
        arith_flags(&cpu),
        CPU_FLAG_CARRY | CPU_FLAG_AUX_CARRY | CPU_FLAG_SIGN | CPU_FLAG_PARITY
    );
}

#[test]
fn test_inc_ax_overflow_leaves_carry() {
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0x40]);
    cpu.set_register16(Register16::AX, 0x7FFF);
    cpu.set_flags(CPU_FLAG_CARRY);

    cpu.step();
    assert_eq!(cpu.get_register16(Register16::AX), 0x8000);
    assert!(cpu.get_flags() & CPU_FLAG_OVERFLOW != 0);
    assert!(cpu.get_flags() & CPU_FLAG_SIGN != 0);
    assert!(cpu.get_flags() & CPU_FLAG_ZERO == 0);
    // INC must not disturb CF.
    assert!(cpu.get_flags() & CPU_FLAG_CARRY != 0);
}

#[test]
fn test_push_ax_pop_bx_round_trip() {
    let mut cpu = cpu_with_code(0x1000, 0x0200, &[0x50, 0x5B]);
    cpu.set_register16(Register16::AX, 0x1234);
    cpu.set_register16(Register16::SS, 0x2000);
    cpu.set_register16(Register16::SP, 0x0100);

    cpu.step();
    assert_eq!(cpu.get_register16(Register16::SP), 0x00FE);
    cpu.step();
    assert_eq!(cpu.get_register16(Register16::BX), 0x1234);
    assert_eq!(cpu.get_register16(Register16::SP), 0x0100);
    let stack_addr = Intel8086::calc_linear_address(0x2000, 0x00FE);
    assert_eq!(cpu.bus().read_u16(stack_addr), 0x1234);
}

#[test]
fn test_pop_di_little_endian() {
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0x5F]);
    cpu.set_register16(Register16::SS, 0xAB05);
    cpu.set_register16(Register16::SP, 0x4F31);
    cpu.set_register16(Register16::DI, 0x2379);
    cpu.bus_mut().write_u8(0xAFF81, 0x7D);
    cpu.bus_mut().write_u8(0xAFF82, 0x6F);

    cpu.step();
    assert_eq!(cpu.get_register16(Register16::DI), 0x6F7D);
    assert_eq!(cpu.get_register16(Register16::SP), 0x4F33);
}

#[test]
fn test_jz_taken() {
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0x74, 0x05]);
    cpu.set_flags(CPU_FLAG_ZERO);

    cpu.step();
    assert_eq!(cpu.get_register16(Register16::IP), 0x0107);
}

#[test]
fn test_jz_not_taken() {
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0x74, 0x05]);
    cpu.set_flags(0);

    cpu.step();
    assert_eq!(cpu.get_register16(Register16::IP), 0x0102);
}

#[test]
fn test_jcc_self_loop() {
    // A taken Jcc with displacement -2 lands on itself.
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0x74, 0xFE]);
    cpu.set_flags(CPU_FLAG_ZERO);

    cpu.step();
    assert_eq!(cpu.get_register16(Register16::IP), 0x0100);
}

#[test]
fn test_jcc_low_alias() {
    // 0x64 decodes as JZ on the 8086.
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0x64, 0x05]);
    cpu.set_flags(CPU_FLAG_ZERO);

    cpu.step();
    assert_eq!(cpu.get_register16(Register16::IP), 0x0107);
}

#[test]
fn test_movsb_forward() {
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0xA4]);
    cpu.set_register16(Register16::DS, 0x1000);
    cpu.set_register16(Register16::SI, 0x0010);
    cpu.set_register16(Register16::ES, 0x2000);
    cpu.set_register16(Register16::DI, 0x0020);
    cpu.bus_mut().write_u8(0x10010, 0x42);
    cpu.set_flags(0);
    let flags_before = cpu.get_flags();

    cpu.step();
    assert_eq!(cpu.bus().read_u8(0x20020), 0x42);
    assert_eq!(cpu.get_register16(Register16::SI), 0x0011);
    assert_eq!(cpu.get_register16(Register16::DI), 0x0021);
    assert_eq!(cpu.get_flags(), flags_before);
}

#[test]
fn test_movsb_backward() {
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0xA4]);
    cpu.set_register16(Register16::DS, 0x1000);
    cpu.set_register16(Register16::SI, 0x0010);
    cpu.set_register16(Register16::ES, 0x2000);
    cpu.set_register16(Register16::DI, 0x0020);
    cpu.set_flags(CPU_FLAG_DIRECTION);

    cpu.step();
    assert_eq!(cpu.get_register16(Register16::SI), 0x000F);
    assert_eq!(cpu.get_register16(Register16::DI), 0x001F);
}

#[test]
fn test_rep_movsb_steps_one_iteration() {
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0xF3, 0xA4]);
    cpu.set_register16(Register16::DS, 0x1000);
    cpu.set_register16(Register16::SI, 0x0010);
    cpu.set_register16(Register16::ES, 0x2000);
    cpu.set_register16(Register16::DI, 0x0020);
    cpu.set_register16(Register16::CX, 0x0003);
    cpu.bus_mut().write_u8(0x10010, 0xAA);
    cpu.bus_mut().write_u8(0x10011, 0xBB);
    cpu.bus_mut().write_u8(0x10012, 0xCC);

    // While the repeat continues, IP stays on the prefixed instruction.
    cpu.step();
    assert_eq!(cpu.get_register16(Register16::CX), 2);
    assert_eq!(cpu.get_register16(Register16::IP), 0x0100);

    cpu.step();
    cpu.step();
    assert_eq!(cpu.get_register16(Register16::CX), 0);
    assert_eq!(cpu.get_register16(Register16::IP), 0x0102);
    assert_eq!(cpu.bus().read_u8(0x20020), 0xAA);
    assert_eq!(cpu.bus().read_u8(0x20021), 0xBB);
    assert_eq!(cpu.bus().read_u8(0x20022), 0xCC);
}

#[test]
fn test_rep_with_zero_cx_is_a_nop() {
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0xF3, 0xA4]);
    cpu.set_register16(Register16::CX, 0);
    cpu.set_register16(Register16::SI, 0x0010);
    cpu.set_register16(Register16::DI, 0x0020);

    cpu.step();
    assert_eq!(cpu.get_register16(Register16::SI), 0x0010);
    assert_eq!(cpu.get_register16(Register16::DI), 0x0020);
    assert_eq!(cpu.get_register16(Register16::IP), 0x0102);
}

#[test]
fn test_repne_scasb_stops_on_match() {
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0xF2, 0xAE]);
    cpu.set_register16(Register16::ES, 0x2000);
    cpu.set_register16(Register16::DI, 0x0000);
    cpu.set_register16(Register16::CX, 0x0010);
    cpu.set_register8(Register8::AL, 0x42);
    cpu.bus_mut().write_u8(0x20000, 0x11);
    cpu.bus_mut().write_u8(0x20001, 0x42);

    // First byte differs: repeat continues.
    cpu.step();
    assert_eq!(cpu.get_register16(Register16::IP), 0x0100);
    // Second byte matches: ZF set, repeat ends.
    cpu.step();
    assert_eq!(cpu.get_register16(Register16::IP), 0x0102);
    assert_eq!(cpu.get_register16(Register16::CX), 0x000E);
    assert!(cpu.get_flags() & CPU_FLAG_ZERO != 0);
}

#[test]
fn test_segment_override_applies_to_source() {
    // es: mov al, [si]
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0x26, 0x8A, 0b00_000_100]);
    cpu.set_register16(Register16::DS, 0x3000);
    cpu.set_register16(Register16::ES, 0x4000);
    cpu.set_register16(Register16::SI, 0x0008);
    cpu.bus_mut().write_u8(0x30008, 0x55);
    cpu.bus_mut().write_u8(0x40008, 0x99);

    cpu.step();
    assert_eq!(cpu.get_register8(Register8::AL), 0x99);
    assert_eq!(cpu.get_register16(Register16::IP), 0x0103);
}

#[test]
fn test_bp_defaults_to_stack_segment() {
    // mov al, [bp] (encoded as bp+disp8 of zero)
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0x8A, 0b01_000_110, 0x00]);
    cpu.set_register16(Register16::SS, 0x5000);
    cpu.set_register16(Register16::DS, 0x3000);
    cpu.set_register16(Register16::BP, 0x0040);
    cpu.bus_mut().write_u8(0x50040, 0x77);

    cpu.step();
    assert_eq!(cpu.get_register8(Register8::AL), 0x77);
}

#[test]
fn test_lea_does_not_read_memory() {
    // lea bx, [si+0x10]: memory stays untouched and unread
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0x8D, 0b01_011_100, 0x10]);
    cpu.set_register16(Register16::SI, 0xFFF8);

    cpu.step();
    // Offset arithmetic wraps at 64K.
    assert_eq!(cpu.get_register16(Register16::BX), 0x0008);
    assert_eq!(cpu.get_register16(Register16::IP), 0x0103);
}

#[test]
fn test_xor_ax_ax() {
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0x31, 0b11_000_000]); // xor ax, ax
    cpu.set_register16(Register16::AX, 0xBEEF);
    cpu.set_flags(CPU_FLAG_CARRY | CPU_FLAG_OVERFLOW | CPU_FLAG_AUX_CARRY);

    cpu.step();
    assert_eq!(cpu.get_register16(Register16::AX), 0);
    assert_eq!(arith_flags(&cpu), CPU_FLAG_ZERO | CPU_FLAG_PARITY);
}

#[test]
fn test_neg_twice_restores() {
    // neg bl; neg bl
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0xF6, 0b11_011_011, 0xF6, 0b11_011_011]);
    cpu.set_register8(Register8::BL, 0x35);

    cpu.step();
    assert_eq!(cpu.get_register8(Register8::BL), 0xCB);
    assert!(cpu.get_flags() & CPU_FLAG_CARRY != 0);
    cpu.step();
    assert_eq!(cpu.get_register8(Register8::BL), 0x35);
}

#[test]
fn test_neg_zero_clears_carry() {
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0xF6, 0b11_011_011]);
    cpu.set_register8(Register8::BL, 0x00);
    cpu.set_flags(CPU_FLAG_CARRY);

    cpu.step();
    assert_eq!(cpu.get_register8(Register8::BL), 0x00);
    assert!(cpu.get_flags() & CPU_FLAG_CARRY == 0);
}

#[test]
fn test_mul_sets_carry_when_high_half_significant() {
    // mul bl with AL=0x40, BL=0x08 -> AX=0x0200
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0xF6, 0b11_100_011]);
    cpu.set_register8(Register8::AL, 0x40);
    cpu.set_register8(Register8::BL, 0x08);

    cpu.step();
    assert_eq!(cpu.get_register16(Register16::AX), 0x0200);
    assert!(cpu.get_flags() & CPU_FLAG_CARRY != 0);
    assert!(cpu.get_flags() & CPU_FLAG_OVERFLOW != 0);
}

#[test]
fn test_imul_sign_extension_clears_carry() {
    // imul bl with AL=-2, BL=3 -> AX=0xFFFA, high half is sign fill
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0xF6, 0b11_101_011]);
    cpu.set_register8(Register8::AL, 0xFE);
    cpu.set_register8(Register8::BL, 0x03);

    cpu.step();
    assert_eq!(cpu.get_register16(Register16::AX), 0xFFFA);
    assert!(cpu.get_flags() & CPU_FLAG_CARRY == 0);
    assert!(cpu.get_flags() & CPU_FLAG_OVERFLOW == 0);
}

#[test]
fn test_div_by_zero_aborts() {
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0xF6, 0b11_110_011]); // div bl
    cpu.set_register16(Register16::AX, 0x1234);
    cpu.set_register8(Register8::BL, 0x00);

    assert_eq!(cpu.step(), StepOutcome::DivideError);
    assert!(cpu.is_halted());
    // The destination registers are untouched on the error path.
    assert_eq!(cpu.get_register8(Register8::AH), 0x12);
}

#[test]
fn test_div_quotient_overflow_aborts() {
    // AX / 1 with AH nonzero cannot fit AL.
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0xF6, 0b11_110_011]);
    cpu.set_register16(Register16::AX, 0x0100);
    cpu.set_register8(Register8::BL, 0x01);

    assert_eq!(cpu.step(), StepOutcome::DivideError);
}

#[test]
fn test_div16() {
    // div cx: DX:AX = 0x0001_0000, CX = 2 -> AX=0x8000, DX=0
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0xF7, 0b11_110_001]);
    cpu.set_register16(Register16::DX, 0x0001);
    cpu.set_register16(Register16::AX, 0x0000);
    cpu.set_register16(Register16::CX, 0x0002);

    cpu.step();
    assert_eq!(cpu.get_register16(Register16::AX), 0x8000);
    assert_eq!(cpu.get_register16(Register16::DX), 0x0000);
}

#[test]
fn test_aam_zero_aborts() {
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0xD4, 0x00]);
    assert_eq!(cpu.step(), StepOutcome::DivideError);
}

#[test]
fn test_aam_divides_al() {
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0xD4, 0x0A]);
    cpu.set_register8(Register8::AL, 0x45); // 69 decimal
    cpu.set_register8(Register8::AH, 0xFF);

    cpu.step();
    assert_eq!(cpu.get_register8(Register8::AH), 6);
    assert_eq!(cpu.get_register8(Register8::AL), 9);
}

#[test]
fn test_shift_count_zero_changes_nothing() {
    // shl bl, cl with cl=0
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0xD2, 0b11_100_011]);
    cpu.set_register8(Register8::BL, 0x80);
    cpu.set_register8(Register8::CL, 0x00);
    cpu.set_flags(CPU_FLAG_CARRY | CPU_FLAG_OVERFLOW);

    cpu.step();
    assert_eq!(cpu.get_register8(Register8::BL), 0x80);
    assert!(cpu.get_flags() & CPU_FLAG_CARRY != 0);
    assert!(cpu.get_flags() & CPU_FLAG_OVERFLOW != 0);
}

#[test]
fn test_shl_by_one_flags() {
    // shl bl, 1 with BL=0x80: result 0, CF=1, OF = MSB(result)^CF = 1
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0xD0, 0b11_100_011]);
    cpu.set_register8(Register8::BL, 0x80);
    cpu.set_flags(0);

    cpu.step();
    assert_eq!(cpu.get_register8(Register8::BL), 0x00);
    assert!(cpu.get_flags() & CPU_FLAG_CARRY != 0);
    assert!(cpu.get_flags() & CPU_FLAG_OVERFLOW != 0);
    assert!(cpu.get_flags() & CPU_FLAG_ZERO != 0);
}

#[test]
fn test_shift_count_applied_verbatim() {
    // shr bl, cl with cl=9 shifts everything out including the carry.
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0xD2, 0b11_101_011]);
    cpu.set_register8(Register8::BL, 0xFF);
    cpu.set_register8(Register8::CL, 0x09);
    cpu.set_flags(CPU_FLAG_CARRY);

    cpu.step();
    assert_eq!(cpu.get_register8(Register8::BL), 0x00);
    assert!(cpu.get_flags() & CPU_FLAG_CARRY == 0);
}

#[test]
fn test_word_read_wraps_top_of_memory() {
    let mut cpu = Intel8086::new();
    cpu.bus_mut().write_u8(0xFFFFF, 0x34);
    cpu.bus_mut().write_u8(0x00000, 0x12);
    assert_eq!(cpu.bus().read_u16(0xFFFFF), 0x1234);
}

#[test]
fn test_call_ret_round_trip() {
    // call +3 (to 0x0106); target holds ret
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0xE8, 0x03, 0x00]);
    cpu.set_register16(Register16::SS, 0x2000);
    cpu.set_register16(Register16::SP, 0x0100);
    let target = Intel8086::calc_linear_address(0x1000, 0x0106);
    cpu.bus_mut().write_u8(target, 0xC3); // ret

    cpu.step();
    assert_eq!(cpu.get_register16(Register16::IP), 0x0106);
    let stack_addr = Intel8086::calc_linear_address(0x2000, 0x00FE);
    assert_eq!(cpu.bus().read_u16(stack_addr), 0x0103);

    cpu.step();
    assert_eq!(cpu.get_register16(Register16::IP), 0x0103);
    assert_eq!(cpu.get_register16(Register16::SP), 0x0100);
}

#[test]
fn test_ret_imm16_releases_stack() {
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0xC2, 0x04, 0x00]); // ret 4
    cpu.set_register16(Register16::SS, 0x2000);
    cpu.set_register16(Register16::SP, 0x00FE);
    let stack_addr = Intel8086::calc_linear_address(0x2000, 0x00FE);
    cpu.bus_mut().write_u16(stack_addr, 0x0456);

    cpu.step();
    assert_eq!(cpu.get_register16(Register16::IP), 0x0456);
    assert_eq!(cpu.get_register16(Register16::SP), 0x0104);
}

#[test]
fn test_call_far_and_retf() {
    // call 3000:0010
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0x9A, 0x10, 0x00, 0x00, 0x30]);
    cpu.set_register16(Register16::SS, 0x2000);
    cpu.set_register16(Register16::SP, 0x0100);
    let target = Intel8086::calc_linear_address(0x3000, 0x0010);
    cpu.bus_mut().write_u8(target, 0xCB); // retf

    cpu.step();
    assert_eq!(cpu.get_register16(Register16::CS), 0x3000);
    assert_eq!(cpu.get_register16(Register16::IP), 0x0010);
    assert_eq!(cpu.get_register16(Register16::SP), 0x00FC);

    cpu.step();
    assert_eq!(cpu.get_register16(Register16::CS), 0x1000);
    assert_eq!(cpu.get_register16(Register16::IP), 0x0105);
    assert_eq!(cpu.get_register16(Register16::SP), 0x0100);
}

#[test]
fn test_int_and_iret() {
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0xCD, 0x21]); // int 21h
    cpu.set_register16(Register16::SS, 0x2000);
    cpu.set_register16(Register16::SP, 0x0100);
    // Vector 0x21 at physical 0x84: handler at 0800:0004
    cpu.bus_mut().write_u16(0x21 * 4, 0x0004);
    cpu.bus_mut().write_u16(0x21 * 4 + 2, 0x0800);
    let handler = Intel8086::calc_linear_address(0x0800, 0x0004);
    cpu.bus_mut().write_u8(handler, 0xCF); // iret
    cpu.set_flags(CPU_FLAG_ZERO | 0x0200); // ZF and IF set

    cpu.step();
    assert_eq!(cpu.get_register16(Register16::CS), 0x0800);
    assert_eq!(cpu.get_register16(Register16::IP), 0x0004);
    // IF cleared on entry.
    assert!(cpu.get_flags() & 0x0200 == 0);

    cpu.step();
    assert_eq!(cpu.get_register16(Register16::CS), 0x1000);
    assert_eq!(cpu.get_register16(Register16::IP), 0x0102);
    // IRET restored the original flags.
    assert!(cpu.get_flags() & 0x0200 != 0);
    assert!(cpu.get_flags() & CPU_FLAG_ZERO != 0);
}

#[test]
fn test_into_only_traps_on_overflow() {
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0xCE]);
    cpu.set_flags(0);
    cpu.step();
    assert_eq!(cpu.get_register16(Register16::IP), 0x0101);
    assert_eq!(cpu.get_register16(Register16::CS), 0x1000);
}

#[test]
fn test_hlt_halts_and_advances_ip() {
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0xF4]);
    assert_eq!(cpu.step(), StepOutcome::Halted);
    assert!(cpu.is_halted());
    assert_eq!(cpu.get_register16(Register16::IP), 0x0101);
    // A halted CPU stays halted.
    assert_eq!(cpu.step(), StepOutcome::Halted);
}

#[test]
fn test_undefined_opcode_leaves_ip_at_byte() {
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0x26, 0xF0]);
    assert_eq!(cpu.step(), StepOutcome::UndefinedOpcode(0xF0));
    assert!(cpu.is_halted());
    // IP points at the offending opcode, past the prefix.
    assert_eq!(cpu.get_register16(Register16::IP), 0x0101);
}

#[test]
fn test_xchg_ax_reg() {
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0x93]); // xchg ax, bx
    cpu.set_register16(Register16::AX, 0x1111);
    cpu.set_register16(Register16::BX, 0x2222);

    cpu.step();
    assert_eq!(cpu.get_register16(Register16::AX), 0x2222);
    assert_eq!(cpu.get_register16(Register16::BX), 0x1111);
}

#[test]
fn test_xlat() {
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0xD7]);
    cpu.set_register16(Register16::DS, 0x3000);
    cpu.set_register16(Register16::BX, 0x0100);
    cpu.set_register8(Register8::AL, 0x05);
    cpu.bus_mut().write_u8(0x30105, 0x9A);

    cpu.step();
    assert_eq!(cpu.get_register8(Register8::AL), 0x9A);
}

#[test]
fn test_salc() {
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0xD6]);
    cpu.set_flags(CPU_FLAG_CARRY);
    cpu.step();
    assert_eq!(cpu.get_register8(Register8::AL), 0xFF);

    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0xD6]);
    cpu.set_register8(Register8::AL, 0x42);
    cpu.set_flags(0);
    cpu.step();
    assert_eq!(cpu.get_register8(Register8::AL), 0x00);
}

#[test]
fn test_esc_skips_modrm() {
    // esc with a memory operand: opcode + modrm + disp16
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0xD9, 0b10_000_110, 0x34, 0x12]);
    cpu.step();
    assert_eq!(cpu.get_register16(Register16::IP), 0x0104);
}

#[test]
fn test_lds_les() {
    // lds si, [0x0020]
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0xC5, 0b00_110_110, 0x20, 0x00]);
    cpu.set_register16(Register16::DS, 0x3000);
    cpu.bus_mut().write_u16(0x30020, 0xBEEF);
    cpu.bus_mut().write_u16(0x30022, 0x4000);

    cpu.step();
    assert_eq!(cpu.get_register16(Register16::SI), 0xBEEF);
    assert_eq!(cpu.get_register16(Register16::DS), 0x4000);
}

#[test]
fn test_lahf_sahf() {
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0x9F]); // lahf
    cpu.set_flags(CPU_FLAG_CARRY | CPU_FLAG_ZERO);
    cpu.step();
    // Bit 1 reads as set; bits 3 and 5 read clear.
    assert_eq!(
        cpu.get_register8(Register8::AH),
        (CPU_FLAG_CARRY | CPU_FLAG_ZERO | 0x0002) as u8
    );

    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0x9E]); // sahf
    cpu.set_register8(Register8::AH, 0xFF);
    cpu.set_flags(CPU_FLAG_OVERFLOW);
    cpu.step();
    // Only the five arithmetic flags transfer; OF stays put.
    assert!(cpu.get_flags() & CPU_FLAG_CARRY != 0);
    assert!(cpu.get_flags() & CPU_FLAG_ZERO != 0);
    assert!(cpu.get_flags() & CPU_FLAG_OVERFLOW != 0);
}

#[test]
fn test_pushf_popf() {
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0x9C, 0x9D]); // pushf; popf
    cpu.set_register16(Register16::SS, 0x2000);
    cpu.set_register16(Register16::SP, 0x0100);
    cpu.set_flags(0x0AD7);

    cpu.step();
    cpu.step();
    assert_eq!(cpu.get_flags(), 0x0AD7);
    assert_eq!(cpu.get_register16(Register16::SP), 0x0100);
}

#[test]
fn test_daa() {
    // 0x19 + 0x28 = 0x41; DAA corrects to 0x47.
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0x04, 0x28, 0x27]); // add al, 0x28; daa
    cpu.set_register8(Register8::AL, 0x19);

    cpu.step();
    cpu.step();
    assert_eq!(cpu.get_register8(Register8::AL), 0x47);
}

#[test]
fn test_aaa_propagates_into_ah() {
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0x37]);
    cpu.set_register16(Register16::AX, 0x000F);
    cpu.set_flags(0);

    cpu.step();
    assert_eq!(cpu.get_register16(Register16::AX), 0x0105);
    assert!(cpu.get_flags() & CPU_FLAG_CARRY != 0);
    assert!(cpu.get_flags() & CPU_FLAG_AUX_CARRY != 0);
}

#[test]
fn test_grp1_sign_extended_immediate() {
    // add ax, -1 via 0x83
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0x83, 0b11_000_000, 0xFF]);
    cpu.set_register16(Register16::AX, 0x0005);

    cpu.step();
    assert_eq!(cpu.get_register16(Register16::AX), 0x0004);
    assert!(cpu.get_flags() & CPU_FLAG_CARRY != 0);
}

#[test]
fn test_in_returns_all_ones() {
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0xE4, 0x60]); // in al, 0x60
    cpu.set_register8(Register8::AL, 0x00);
    cpu.step();
    assert_eq!(cpu.get_register8(Register8::AL), 0xFF);

    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0xED]); // in ax, dx
    cpu.set_register16(Register16::DX, 0x3F8);
    cpu.step();
    assert_eq!(cpu.get_register16(Register16::AX), 0xFFFF);
}

#[test]
fn test_out_is_discarded() {
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0xE6, 0x60]); // out 0x60, al
    cpu.set_register8(Register8::AL, 0x42);
    cpu.step();
    assert_eq!(cpu.get_register16(Register16::IP), 0x0102);
}

#[test]
fn test_loop_decrements_and_jumps() {
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0xE2, 0xFE]); // loop $
    cpu.set_register16(Register16::CX, 2);

    cpu.step();
    assert_eq!(cpu.get_register16(Register16::CX), 1);
    assert_eq!(cpu.get_register16(Register16::IP), 0x0100);

    cpu.step();
    assert_eq!(cpu.get_register16(Register16::CX), 0);
    assert_eq!(cpu.get_register16(Register16::IP), 0x0102);
}

#[test]
fn test_jcxz_does_not_decrement() {
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0xE3, 0x10]);
    cpu.set_register16(Register16::CX, 0);

    cpu.step();
    assert_eq!(cpu.get_register16(Register16::CX), 0);
    assert_eq!(cpu.get_register16(Register16::IP), 0x0112);
}

#[test]
fn test_pop_cs() {
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0x0F]);
    cpu.set_register16(Register16::SS, 0x2000);
    cpu.set_register16(Register16::SP, 0x0100);
    let stack_addr = Intel8086::calc_linear_address(0x2000, 0x0100);
    cpu.bus_mut().write_u16(stack_addr, 0x8000);

    cpu.step();
    assert_eq!(cpu.get_register16(Register16::CS), 0x8000);
    assert_eq!(cpu.get_register16(Register16::SP), 0x0102);
}

#[test]
fn test_push_sp_stores_decremented_value() {
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0x54]); // push sp
    cpu.set_register16(Register16::SS, 0x2000);
    cpu.set_register16(Register16::SP, 0x0100);

    cpu.step();
    let stack_addr = Intel8086::calc_linear_address(0x2000, 0x00FE);
    // The 8086 pushes the new SP, not the old one.
    assert_eq!(cpu.bus().read_u16(stack_addr), 0x00FE);
}

#[test]
fn test_cbw_cwd() {
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0x98, 0x99]); // cbw; cwd
    cpu.set_register8(Register8::AL, 0x80);
    cpu.set_register8(Register8::AH, 0x00);

    cpu.step();
    assert_eq!(cpu.get_register16(Register16::AX), 0xFF80);
    cpu.step();
    assert_eq!(cpu.get_register16(Register16::DX), 0xFFFF);
}

#[test]
fn test_mov_moffs() {
    // mov al, [0x0010]
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0xA0, 0x10, 0x00]);
    cpu.set_register16(Register16::DS, 0x3000);
    cpu.bus_mut().write_u8(0x30010, 0x5C);

    cpu.step();
    assert_eq!(cpu.get_register8(Register8::AL), 0x5C);
    assert_eq!(cpu.get_register16(Register16::IP), 0x0103);

    // mov [0x0020], ax
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0xA3, 0x20, 0x00]);
    cpu.set_register16(Register16::DS, 0x3000);
    cpu.set_register16(Register16::AX, 0xCAFE);

    cpu.step();
    assert_eq!(cpu.bus().read_u16(0x30020), 0xCAFE);
}

#[test]
fn test_read_modify_write_memory_operand() {
    // add byte [0x0040], al
    let mut cpu = cpu_with_code(0x1000, 0x0100, &[0x00, 0b00_000_110, 0x40, 0x00]);
    cpu.set_register16(Register16::DS, 0x3000);
    cpu.set_register8(Register8::AL, 0x11);
    cpu.bus_mut().write_u8(0x30040, 0x22);

    cpu.step();
    assert_eq!(cpu.bus().read_u8(0x30040), 0x33);
    assert_eq!(cpu.get_register16(Register16::IP), 0x0104);
}

#[test]
fn test_reset_vector() {
    let cpu = Intel8086::new();
    assert_eq!(cpu.get_register16(Register16::CS), 0xF000);
    assert_eq!(cpu.get_register16(Register16::IP), 0xFFF0);
    assert_eq!(cpu.get_register16(Register16::SP), 0xFFFE);
    assert_eq!(cpu.get_flags(), 0);
    assert_eq!(cpu.flat_ip(), 0xFFFF0);
}
