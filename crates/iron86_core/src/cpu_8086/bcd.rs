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

    cpu_8086::bcd.rs

    The decimal and ASCII adjust instructions.

*/

use crate::{
    cpu_8086::{Flag, Intel8086},
    cpu_common::{Register8, Register16},
};

impl Intel8086 {
    /// DAA: decimal adjust AL after addition. Both comparisons use the AL
    /// and CF values from before any adjustment.
    pub fn daa(&mut self) {
        let old_al = self.get_register8(Register8::AL);
        let old_cf = self.get_flag(Flag::Carry);

        if (old_al & 0x0F) > 9 || self.get_flag(Flag::AuxCarry) {
            self.set_register8(Register8::AL, old_al.wrapping_add(6));
            self.set_flag(Flag::AuxCarry);
        }
        else {
            self.clear_flag(Flag::AuxCarry);
        }

        if old_al > 0x99 || old_cf {
            let al = self.get_register8(Register8::AL);
            self.set_register8(Register8::AL, al.wrapping_add(0x60));
            self.set_flag(Flag::Carry);
        }
        else {
            self.clear_flag(Flag::Carry);
        }

        let al = self.get_register8(Register8::AL);
        self.set_szp_flags_from_result_u8(al);
    }

    /// DAS: decimal adjust AL after subtraction.
    pub fn das(&mut self) {
        let old_al = self.get_register8(Register8::AL);
        let old_cf = self.get_flag(Flag::Carry);

        if (old_al & 0x0F) > 9 || self.get_flag(Flag::AuxCarry) {
            self.set_register8(Register8::AL, old_al.wrapping_sub(6));
            self.set_flag(Flag::AuxCarry);
        }
        else {
            self.clear_flag(Flag::AuxCarry);
        }

        if old_al > 0x99 || old_cf {
            let al = self.get_register8(Register8::AL);
            self.set_register8(Register8::AL, al.wrapping_sub(0x60));
            self.set_flag(Flag::Carry);
        }
        else {
            self.clear_flag(Flag::Carry);
        }

        let al = self.get_register8(Register8::AL);
        self.set_szp_flags_from_result_u8(al);
    }

    /// AAA: ASCII adjust after addition. The adjustment adds through AX,
    /// so a low-byte carry propagates into AH.
    pub fn aaa(&mut self) {
        let al = self.get_register8(Register8::AL);
        if (al & 0x0F) > 9 || self.get_flag(Flag::AuxCarry) {
            let ax = self.get_register16(Register16::AX);
            self.set_register16(Register16::AX, ax.wrapping_add(0x106));
            self.set_flag(Flag::AuxCarry);
            self.set_flag(Flag::Carry);
        }
        else {
            self.clear_flag(Flag::AuxCarry);
            self.clear_flag(Flag::Carry);
        }
        let al = self.get_register8(Register8::AL);
        self.set_register8(Register8::AL, al & 0x0F);
    }

    /// AAS: ASCII adjust after subtraction.
    pub fn aas(&mut self) {
        let al = self.get_register8(Register8::AL);
        if (al & 0x0F) > 9 || self.get_flag(Flag::AuxCarry) {
            let ax = self.get_register16(Register16::AX);
            self.set_register16(Register16::AX, ax.wrapping_sub(6));
            let ah = self.get_register8(Register8::AH);
            self.set_register8(Register8::AH, ah.wrapping_sub(1));
            self.set_flag(Flag::AuxCarry);
            self.set_flag(Flag::Carry);
        }
        else {
            self.clear_flag(Flag::AuxCarry);
            self.clear_flag(Flag::Carry);
        }
        let al = self.get_register8(Register8::AL);
        self.set_register8(Register8::AL, al & 0x0F);
    }

    /// AAM: ASCII adjust AX after multiply. The caller has already
    /// screened out a zero divisor.
    pub fn aam(&mut self, imm8: u8) {
        let al = self.get_register8(Register8::AL);
        self.set_register8(Register8::AH, al / imm8);
        self.set_register8(Register8::AL, al % imm8);

        // Intel documents the flags as derived from AL.
        let al = self.get_register8(Register8::AL);
        self.set_szp_flags_from_result_u8(al);
    }

    /// AAD: ASCII adjust AX before division.
    pub fn aad(&mut self, imm8: u8) {
        let al = self.get_register8(Register8::AL);
        let ah = self.get_register8(Register8::AH);
        let result = ah.wrapping_mul(imm8).wrapping_add(al);
        self.set_register8(Register8::AL, result);
        self.set_register8(Register8::AH, 0);
        self.set_szp_flags_from_result_u8(result);
    }
}
