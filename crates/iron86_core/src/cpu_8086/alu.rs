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

    cpu_8086::alu.rs

    Applies the per-class flag policies on top of the pure ALU operations:
    math_op8/math_op16 execute one arithmetic or logical operation and
    leave the flag register in its architecturally defined state.

*/

use crate::{
    cpu_8086::{Flag, Intel8086, Mnemonic, PARITY_TABLE},
    cpu_common::alu::*,
};

impl Intel8086 {
    #[inline(always)]
    fn set_parity_flag_from_u8(&mut self, operand: u8) {
        self.set_flag_state(Flag::Parity, PARITY_TABLE[operand as usize]);
    }

    pub fn set_szp_flags_from_result_u8(&mut self, result: u8) {
        self.set_flag_state(Flag::Sign, result & 0x80 != 0);
        self.set_flag_state(Flag::Zero, result == 0);
        self.set_parity_flag_from_u8(result);
    }

    pub fn set_szp_flags_from_result_u16(&mut self, result: u16) {
        self.set_flag_state(Flag::Sign, result & 0x8000 != 0);
        self.set_flag_state(Flag::Zero, result == 0);
        // Parity always considers only the low 8 bits.
        self.set_parity_flag_from_u8((result & 0xFF) as u8);
    }

    #[inline]
    fn set_carry_overflow_aux(&mut self, carry: bool, overflow: bool, aux_carry: bool) {
        self.set_flag_state(Flag::Carry, carry);
        self.set_flag_state(Flag::Overflow, overflow);
        self.set_flag_state(Flag::AuxCarry, aux_carry);
    }

    /// Clear CF, OF and AF the way the logical operations do. AF is
    /// architecturally undefined after logic ops; this core pins it to 0.
    #[inline]
    fn clear_logic_flags(&mut self) {
        self.clear_flag(Flag::Carry);
        self.clear_flag(Flag::Overflow);
        self.clear_flag(Flag::AuxCarry);
    }

    /// Perform an 8-bit arithmetic or logical operation, setting flags.
    /// CMP and TEST return operand1 unchanged.
    pub fn math_op8(&mut self, mnemonic: Mnemonic, operand1: u8, operand2: u8) -> u8 {
        match mnemonic {
            Mnemonic::ADD => {
                let (result, carry, overflow, aux_carry) = operand1.alu_add(operand2);
                self.set_carry_overflow_aux(carry, overflow, aux_carry);
                self.set_szp_flags_from_result_u8(result);
                result
            }
            Mnemonic::ADC => {
                let (result, carry, overflow, aux_carry) =
                    operand1.alu_adc(operand2, self.get_flag(Flag::Carry));
                self.set_carry_overflow_aux(carry, overflow, aux_carry);
                self.set_szp_flags_from_result_u8(result);
                result
            }
            Mnemonic::SUB => {
                let (result, carry, overflow, aux_carry) = operand1.alu_sub(operand2);
                self.set_carry_overflow_aux(carry, overflow, aux_carry);
                self.set_szp_flags_from_result_u8(result);
                result
            }
            Mnemonic::SBB => {
                let (result, carry, overflow, aux_carry) =
                    operand1.alu_sbb(operand2, self.get_flag(Flag::Carry));
                self.set_carry_overflow_aux(carry, overflow, aux_carry);
                self.set_szp_flags_from_result_u8(result);
                result
            }
            Mnemonic::CMP => {
                // CMP is SUB without the writeback.
                let (result, carry, overflow, aux_carry) = operand1.alu_sub(operand2);
                self.set_carry_overflow_aux(carry, overflow, aux_carry);
                self.set_szp_flags_from_result_u8(result);
                operand1
            }
            Mnemonic::NEG => {
                // CF is set unless the operand was zero.
                let (result, _, overflow, aux_carry) = operand1.alu_neg();
                self.set_flag_state(Flag::Carry, operand1 != 0);
                self.set_flag_state(Flag::Overflow, overflow);
                self.set_flag_state(Flag::AuxCarry, aux_carry);
                self.set_szp_flags_from_result_u8(result);
                result
            }
            Mnemonic::INC => {
                // INC is ADD 1 that leaves CF alone.
                let (result, _, overflow, aux_carry) = operand1.alu_add(1);
                self.set_flag_state(Flag::Overflow, overflow);
                self.set_flag_state(Flag::AuxCarry, aux_carry);
                self.set_szp_flags_from_result_u8(result);
                result
            }
            Mnemonic::DEC => {
                let (result, _, overflow, aux_carry) = operand1.alu_sub(1);
                self.set_flag_state(Flag::Overflow, overflow);
                self.set_flag_state(Flag::AuxCarry, aux_carry);
                self.set_szp_flags_from_result_u8(result);
                result
            }
            Mnemonic::AND => {
                let result = operand1 & operand2;
                self.clear_logic_flags();
                self.set_szp_flags_from_result_u8(result);
                result
            }
            Mnemonic::OR => {
                let result = operand1 | operand2;
                self.clear_logic_flags();
                self.set_szp_flags_from_result_u8(result);
                result
            }
            Mnemonic::XOR => {
                let result = operand1 ^ operand2;
                self.clear_logic_flags();
                self.set_szp_flags_from_result_u8(result);
                result
            }
            Mnemonic::TEST => {
                let result = operand1 & operand2;
                self.clear_logic_flags();
                self.set_szp_flags_from_result_u8(result);
                operand1
            }
            Mnemonic::NOT => {
                // No flag effects.
                !operand1
            }
            _ => panic!("math_op8(): invalid opcode: {:?}", mnemonic),
        }
    }

    /// Perform a 16-bit arithmetic or logical operation, setting flags.
    pub fn math_op16(&mut self, mnemonic: Mnemonic, operand1: u16, operand2: u16) -> u16 {
        match mnemonic {
            Mnemonic::ADD => {
                let (result, carry, overflow, aux_carry) = operand1.alu_add(operand2);
                self.set_carry_overflow_aux(carry, overflow, aux_carry);
                self.set_szp_flags_from_result_u16(result);
                result
            }
            Mnemonic::ADC => {
                let (result, carry, overflow, aux_carry) =
                    operand1.alu_adc(operand2, self.get_flag(Flag::Carry));
                self.set_carry_overflow_aux(carry, overflow, aux_carry);
                self.set_szp_flags_from_result_u16(result);
                result
            }
            Mnemonic::SUB => {
                let (result, carry, overflow, aux_carry) = operand1.alu_sub(operand2);
                self.set_carry_overflow_aux(carry, overflow, aux_carry);
                self.set_szp_flags_from_result_u16(result);
                result
            }
            Mnemonic::SBB => {
                let (result, carry, overflow, aux_carry) =
                    operand1.alu_sbb(operand2, self.get_flag(Flag::Carry));
                self.set_carry_overflow_aux(carry, overflow, aux_carry);
                self.set_szp_flags_from_result_u16(result);
                result
            }
            Mnemonic::CMP => {
                let (result, carry, overflow, aux_carry) = operand1.alu_sub(operand2);
                self.set_carry_overflow_aux(carry, overflow, aux_carry);
                self.set_szp_flags_from_result_u16(result);
                operand1
            }
            Mnemonic::NEG => {
                let (result, _, overflow, aux_carry) = operand1.alu_neg();
                self.set_flag_state(Flag::Carry, operand1 != 0);
                self.set_flag_state(Flag::Overflow, overflow);
                self.set_flag_state(Flag::AuxCarry, aux_carry);
                self.set_szp_flags_from_result_u16(result);
                result
            }
            Mnemonic::INC => {
                let (result, _, overflow, aux_carry) = operand1.alu_add(1);
                self.set_flag_state(Flag::Overflow, overflow);
                self.set_flag_state(Flag::AuxCarry, aux_carry);
                self.set_szp_flags_from_result_u16(result);
                result
            }
            Mnemonic::DEC => {
                let (result, _, overflow, aux_carry) = operand1.alu_sub(1);
                self.set_flag_state(Flag::Overflow, overflow);
                self.set_flag_state(Flag::AuxCarry, aux_carry);
                self.set_szp_flags_from_result_u16(result);
                result
            }
            Mnemonic::AND => {
                let result = operand1 & operand2;
                self.clear_logic_flags();
                self.set_szp_flags_from_result_u16(result);
                result
            }
            Mnemonic::OR => {
                let result = operand1 | operand2;
                self.clear_logic_flags();
                self.set_szp_flags_from_result_u16(result);
                result
            }
            Mnemonic::XOR => {
                let result = operand1 ^ operand2;
                self.clear_logic_flags();
                self.set_szp_flags_from_result_u16(result);
                result
            }
            Mnemonic::TEST => {
                let result = operand1 & operand2;
                self.clear_logic_flags();
                self.set_szp_flags_from_result_u16(result);
                operand1
            }
            Mnemonic::NOT => !operand1,
            _ => panic!("math_op16(): invalid opcode: {:?}", mnemonic),
        }
    }
}
