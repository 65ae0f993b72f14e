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

    cpu_8086::muldiv.rs

    Multiply and divide. MUL and IMUL report through CF and OF whether the
    upper half of the product is significant; the remaining arithmetic
    flags are left untouched, as are all flags after a divide. The divide
    routines return false when the divisor is zero or the quotient does
    not fit the destination; the caller raises the divide-error abort.

*/

use crate::{
    cpu_8086::{Flag, Intel8086},
    cpu_common::{Register8, Register16},
};

impl Intel8086 {
    /// MUL r/m8: AX := AL * operand.
    pub fn multiply_u8(&mut self, operand: u8) {
        let al = self.get_register8(Register8::AL);
        let product = (al as u16) * (operand as u16);
        self.set_register16(Register16::AX, product);

        let significant = product & 0xFF00 != 0;
        self.set_flag_state(Flag::Carry, significant);
        self.set_flag_state(Flag::Overflow, significant);
    }

    /// MUL r/m16: DX:AX := AX * operand.
    pub fn multiply_u16(&mut self, operand: u16) {
        let ax = self.get_register16(Register16::AX);
        let product = (ax as u32) * (operand as u32);
        self.set_register16(Register16::AX, (product & 0xFFFF) as u16);
        self.set_register16(Register16::DX, (product >> 16) as u16);

        let significant = product & 0xFFFF_0000 != 0;
        self.set_flag_state(Flag::Carry, significant);
        self.set_flag_state(Flag::Overflow, significant);
    }

    /// IMUL r/m8: AX := AL * operand, signed.
    pub fn multiply_i8(&mut self, operand: i8) {
        let al = self.get_register8(Register8::AL) as i8;
        let product = (al as i16) * (operand as i16);
        self.set_register16(Register16::AX, product as u16);

        // Flags report whether AH is more than the sign-extension of AL.
        let significant = product != (product as i8) as i16;
        self.set_flag_state(Flag::Carry, significant);
        self.set_flag_state(Flag::Overflow, significant);
    }

    /// IMUL r/m16: DX:AX := AX * operand, signed.
    pub fn multiply_i16(&mut self, operand: i16) {
        let ax = self.get_register16(Register16::AX) as i16;
        let product = (ax as i32) * (operand as i32);
        self.set_register16(Register16::AX, (product as u32 & 0xFFFF) as u16);
        self.set_register16(Register16::DX, (product as u32 >> 16) as u16);

        let significant = product != (product as i16) as i32;
        self.set_flag_state(Flag::Carry, significant);
        self.set_flag_state(Flag::Overflow, significant);
    }

    /// DIV r/m8: AL := AX / operand, AH := AX % operand.
    #[must_use]
    pub fn divide_u8(&mut self, operand: u8) -> bool {
        if operand == 0 {
            return false;
        }
        let dividend = self.get_register16(Register16::AX);
        let quotient = dividend / operand as u16;
        if quotient > 0xFF {
            return false;
        }
        self.set_register8(Register8::AL, quotient as u8);
        self.set_register8(Register8::AH, (dividend % operand as u16) as u8);
        true
    }

    /// DIV r/m16: AX := DX:AX / operand, DX := DX:AX % operand.
    #[must_use]
    pub fn divide_u16(&mut self, operand: u16) -> bool {
        if operand == 0 {
            return false;
        }
        let dividend = (self.get_register16(Register16::DX) as u32) << 16
            | self.get_register16(Register16::AX) as u32;
        let quotient = dividend / operand as u32;
        if quotient > 0xFFFF {
            return false;
        }
        self.set_register16(Register16::AX, quotient as u16);
        self.set_register16(Register16::DX, (dividend % operand as u32) as u16);
        true
    }

    /// IDIV r/m8: signed divide of AX. The quotient truncates toward
    /// zero and the remainder takes the dividend's sign.
    #[must_use]
    pub fn divide_i8(&mut self, operand: u8) -> bool {
        if operand == 0 {
            return false;
        }
        let dividend = self.get_register16(Register16::AX) as i16;
        let divisor = operand as i8 as i16;
        let quotient = dividend.wrapping_div(divisor);
        if quotient > 0x7F || quotient < -0x80 {
            return false;
        }
        self.set_register8(Register8::AL, quotient as u8);
        self.set_register8(Register8::AH, dividend.wrapping_rem(divisor) as u8);
        true
    }

    /// IDIV r/m16: signed divide of DX:AX.
    #[must_use]
    pub fn divide_i16(&mut self, operand: u16) -> bool {
        if operand == 0 {
            return false;
        }
        let dividend = ((self.get_register16(Register16::DX) as u32) << 16
            | self.get_register16(Register16::AX) as u32) as i32;
        let divisor = operand as i16 as i32;
        let quotient = dividend.wrapping_div(divisor);
        if quotient > 0x7FFF || quotient < -0x8000 {
            return false;
        }
        self.set_register16(Register16::AX, quotient as u16);
        self.set_register16(Register16::DX, dividend.wrapping_rem(divisor) as u16);
        true
    }
}
