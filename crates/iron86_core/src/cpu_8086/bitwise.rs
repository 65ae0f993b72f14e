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

    cpu_8086::bitwise.rs

    The Grp2 shift and rotate operations. The count is applied verbatim
    (the 8086 does not mask it). A count of zero changes nothing, flags
    included. OF is defined only for a count of one; for larger counts it
    is pinned to zero. Shifts clear AF and update ZF/SF/PF; rotates touch
    neither.

*/

use crate::{
    cpu_8086::{Flag, Intel8086, Mnemonic},
    cpu_common::alu::*,
};

impl Intel8086 {
    /// Perform an 8-bit shift or rotate. operand2 is 1 (D0) or CL (D2).
    pub fn bitshift_op8(&mut self, mnemonic: Mnemonic, operand1: u8, operand2: u8) -> u8 {
        if operand2 == 0 {
            return operand1;
        }
        let count = operand2;
        let result: u8;
        let carry: bool;

        match mnemonic {
            Mnemonic::ROL => {
                (result, carry) = operand1.alu_rol(count);
                self.set_flag_state(Flag::Carry, carry);
                self.set_rotate_overflow8(count, result, operand1, carry);
            }
            Mnemonic::ROR => {
                (result, carry) = operand1.alu_ror(count);
                self.set_flag_state(Flag::Carry, carry);
                self.set_rotate_right_overflow8(count, result);
            }
            Mnemonic::RCL => {
                (result, carry) = operand1.alu_rcl(count, self.get_flag(Flag::Carry));
                self.set_flag_state(Flag::Carry, carry);
                self.set_rotate_overflow8(count, result, operand1, carry);
            }
            Mnemonic::RCR => {
                (result, carry) = operand1.alu_rcr(count, self.get_flag(Flag::Carry));
                self.set_flag_state(Flag::Carry, carry);
                self.set_rotate_right_overflow8(count, result);
            }
            Mnemonic::SHL => {
                (result, carry) = operand1.alu_shl(count);
                self.set_flag_state(Flag::Carry, carry);
                self.set_rotate_overflow8(count, result, operand1, carry);
                self.clear_flag(Flag::AuxCarry);
                self.set_szp_flags_from_result_u8(result);
            }
            Mnemonic::SHR => {
                (result, carry) = operand1.alu_shr(count);
                self.set_flag_state(Flag::Carry, carry);
                // For a single shift OF reports the old sign bit, which a
                // right shift always clears.
                self.set_flag_state(Flag::Overflow, count == 1 && operand1 & 0x80 != 0);
                self.clear_flag(Flag::AuxCarry);
                self.set_szp_flags_from_result_u8(result);
            }
            Mnemonic::SAR => {
                (result, carry) = operand1.alu_sar(count);
                self.set_flag_state(Flag::Carry, carry);
                // SAR preserves the sign, so OF is always clear.
                self.clear_flag(Flag::Overflow);
                self.clear_flag(Flag::AuxCarry);
                self.set_szp_flags_from_result_u8(result);
            }
            _ => panic!("bitshift_op8(): invalid opcode: {:?}", mnemonic),
        }

        result
    }

    /// Perform a 16-bit shift or rotate. operand2 is 1 (D1) or CL (D3).
    pub fn bitshift_op16(&mut self, mnemonic: Mnemonic, operand1: u16, operand2: u8) -> u16 {
        if operand2 == 0 {
            return operand1;
        }
        let count = operand2;
        let result: u16;
        let carry: bool;

        match mnemonic {
            Mnemonic::ROL => {
                (result, carry) = operand1.alu_rol(count);
                self.set_flag_state(Flag::Carry, carry);
                self.set_rotate_overflow16(count, result, operand1, carry);
            }
            Mnemonic::ROR => {
                (result, carry) = operand1.alu_ror(count);
                self.set_flag_state(Flag::Carry, carry);
                self.set_rotate_right_overflow16(count, result);
            }
            Mnemonic::RCL => {
                (result, carry) = operand1.alu_rcl(count, self.get_flag(Flag::Carry));
                self.set_flag_state(Flag::Carry, carry);
                self.set_rotate_overflow16(count, result, operand1, carry);
            }
            Mnemonic::RCR => {
                (result, carry) = operand1.alu_rcr(count, self.get_flag(Flag::Carry));
                self.set_flag_state(Flag::Carry, carry);
                self.set_rotate_right_overflow16(count, result);
            }
            Mnemonic::SHL => {
                (result, carry) = operand1.alu_shl(count);
                self.set_flag_state(Flag::Carry, carry);
                self.set_rotate_overflow16(count, result, operand1, carry);
                self.clear_flag(Flag::AuxCarry);
                self.set_szp_flags_from_result_u16(result);
            }
            Mnemonic::SHR => {
                (result, carry) = operand1.alu_shr(count);
                self.set_flag_state(Flag::Carry, carry);
                self.set_flag_state(Flag::Overflow, count == 1 && operand1 & 0x8000 != 0);
                self.clear_flag(Flag::AuxCarry);
                self.set_szp_flags_from_result_u16(result);
            }
            Mnemonic::SAR => {
                (result, carry) = operand1.alu_sar(count);
                self.set_flag_state(Flag::Carry, carry);
                self.clear_flag(Flag::Overflow);
                self.clear_flag(Flag::AuxCarry);
                self.set_szp_flags_from_result_u16(result);
            }
            _ => panic!("bitshift_op16(): invalid opcode: {:?}", mnemonic),
        }

        result
    }

    /// OF after a left-class rotate or SHL: for count 1 it is the XOR of
    /// the result's sign bit with the carry out; for larger counts it is 0.
    fn set_rotate_overflow8(&mut self, count: u8, result: u8, _initial: u8, carry: bool) {
        let overflow = count == 1 && ((result & 0x80 != 0) ^ carry);
        self.set_flag_state(Flag::Overflow, overflow);
    }

    fn set_rotate_overflow16(&mut self, count: u8, result: u16, _initial: u16, carry: bool) {
        let overflow = count == 1 && ((result & 0x8000 != 0) ^ carry);
        self.set_flag_state(Flag::Overflow, overflow);
    }

    /// OF after a right rotate: for count 1 it is the XOR of the two most
    /// significant bits of the result; for larger counts it is 0.
    fn set_rotate_right_overflow8(&mut self, count: u8, result: u8) {
        let overflow = count == 1 && ((result & 0x80 != 0) ^ (result & 0x40 != 0));
        self.set_flag_state(Flag::Overflow, overflow);
    }

    fn set_rotate_right_overflow16(&mut self, count: u8, result: u16) {
        let overflow = count == 1 && ((result & 0x8000 != 0) ^ (result & 0x4000 != 0));
        self.set_flag_state(Flag::Overflow, overflow);
    }
}
