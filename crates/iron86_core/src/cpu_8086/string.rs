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

    cpu_8086::string.rs

    One iteration of each string operation. The source is DS:SI (the
    segment override applies); the destination is ES:DI and cannot be
    overridden. SI and DI step by the operand size, backward when DF is
    set. CMPS and SCAS set flags exactly as SUB; the others touch none.

*/

use crate::{
    cpu_8086::{Flag, Intel8086, Mnemonic},
    cpu_common::{Register8, Register16},
};

impl Intel8086 {
    /// Execute a single iteration of a string instruction.
    pub fn string_op(&mut self, mnemonic: Mnemonic) {
        let src_segment = self.segment_base(Register16::DS);

        match mnemonic {
            Mnemonic::MOVSB => {
                let src_addr = Intel8086::calc_linear_address(src_segment, self.si);
                let dst_addr = Intel8086::calc_linear_address(self.es, self.di);
                let data = self.bus().read_u8(src_addr);
                self.bus_mut().write_u8(dst_addr, data);
                self.adjust_si(1);
                self.adjust_di(1);
            }
            Mnemonic::MOVSW => {
                let src_addr = Intel8086::calc_linear_address(src_segment, self.si);
                let dst_addr = Intel8086::calc_linear_address(self.es, self.di);
                let data = self.bus().read_u16(src_addr);
                self.bus_mut().write_u16(dst_addr, data);
                self.adjust_si(2);
                self.adjust_di(2);
            }
            Mnemonic::CMPSB => {
                // Compares source with destination; flags as SUB.
                let src_addr = Intel8086::calc_linear_address(src_segment, self.si);
                let dst_addr = Intel8086::calc_linear_address(self.es, self.di);
                let src = self.bus().read_u8(src_addr);
                let dst = self.bus().read_u8(dst_addr);
                self.math_op8(Mnemonic::CMP, src, dst);
                self.adjust_si(1);
                self.adjust_di(1);
            }
            Mnemonic::CMPSW => {
                let src_addr = Intel8086::calc_linear_address(src_segment, self.si);
                let dst_addr = Intel8086::calc_linear_address(self.es, self.di);
                let src = self.bus().read_u16(src_addr);
                let dst = self.bus().read_u16(dst_addr);
                self.math_op16(Mnemonic::CMP, src, dst);
                self.adjust_si(2);
                self.adjust_di(2);
            }
            Mnemonic::SCASB => {
                // Compares AL with the destination string; ES:DI only.
                let dst_addr = Intel8086::calc_linear_address(self.es, self.di);
                let dst = self.bus().read_u8(dst_addr);
                let al = self.get_register8(Register8::AL);
                self.math_op8(Mnemonic::CMP, al, dst);
                self.adjust_di(1);
            }
            Mnemonic::SCASW => {
                let dst_addr = Intel8086::calc_linear_address(self.es, self.di);
                let dst = self.bus().read_u16(dst_addr);
                let ax = self.get_register16(Register16::AX);
                self.math_op16(Mnemonic::CMP, ax, dst);
                self.adjust_di(2);
            }
            Mnemonic::LODSB => {
                let src_addr = Intel8086::calc_linear_address(src_segment, self.si);
                let data = self.bus().read_u8(src_addr);
                self.set_register8(Register8::AL, data);
                self.adjust_si(1);
            }
            Mnemonic::LODSW => {
                let src_addr = Intel8086::calc_linear_address(src_segment, self.si);
                let data = self.bus().read_u16(src_addr);
                self.set_register16(Register16::AX, data);
                self.adjust_si(2);
            }
            Mnemonic::STOSB => {
                let dst_addr = Intel8086::calc_linear_address(self.es, self.di);
                let al = self.get_register8(Register8::AL);
                self.bus_mut().write_u8(dst_addr, al);
                self.adjust_di(1);
            }
            Mnemonic::STOSW => {
                let dst_addr = Intel8086::calc_linear_address(self.es, self.di);
                let ax = self.get_register16(Register16::AX);
                self.bus_mut().write_u16(dst_addr, ax);
                self.adjust_di(2);
            }
            _ => panic!("string_op(): invalid opcode: {:?}", mnemonic),
        }
    }

    fn adjust_si(&mut self, size: u16) {
        if self.get_flag(Flag::Direction) {
            self.si = self.si.wrapping_sub(size);
        }
        else {
            self.si = self.si.wrapping_add(size);
        }
    }

    fn adjust_di(&mut self, size: u16) {
        if self.get_flag(Flag::Direction) {
            self.di = self.di.wrapping_sub(size);
        }
        else {
            self.di = self.di.wrapping_add(size);
        }
    }
}
