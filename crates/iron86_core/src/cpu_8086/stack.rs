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

    cpu_8086::stack.rs

    Stack operations. The stack grows downward in the SS segment: a push
    decrements SP by two and then writes, a pop reads and then increments.

*/

use crate::{cpu_8086::Intel8086, cpu_common::Register16};

impl Intel8086 {
    pub fn push_u16(&mut self, data: u16) {
        self.sp = self.sp.wrapping_sub(2);
        let stack_addr = Intel8086::calc_linear_address(self.ss, self.sp);
        self.bus_mut().write_u16(stack_addr, data);
    }

    pub fn pop_u16(&mut self) -> u16 {
        let stack_addr = Intel8086::calc_linear_address(self.ss, self.sp);
        let data = self.bus().read_u16(stack_addr);
        self.sp = self.sp.wrapping_add(2);
        data
    }

    pub fn push_register16(&mut self, reg: Register16) {
        // SP decrements before the value is read, so PUSH SP stores the
        // new SP. This is 8086 behavior; the 286 changed it.
        self.sp = self.sp.wrapping_sub(2);
        let data = self.get_register16(reg);
        let stack_addr = Intel8086::calc_linear_address(self.ss, self.sp);
        self.bus_mut().write_u16(stack_addr, data);
    }

    pub fn pop_register16(&mut self, reg: Register16) {
        let stack_addr = Intel8086::calc_linear_address(self.ss, self.sp);
        let data = self.bus().read_u16(stack_addr);
        self.sp = self.sp.wrapping_add(2);
        // POP SP loads the popped value; the increment above is discarded.
        self.set_register16(reg, data);
    }

    pub fn push_flags(&mut self) {
        let flags = self.get_flags();
        self.push_u16(flags);
    }

    /// POPF loads the full 16-bit flag register from the stack.
    pub fn pop_flags(&mut self) {
        let data = self.pop_u16();
        self.set_flags(data);
    }

    /// Discard `disp` bytes of stack, for the RET imm16 forms.
    pub fn release(&mut self, disp: u16) {
        self.sp = self.sp.wrapping_add(disp);
    }
}
