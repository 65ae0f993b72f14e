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

    cpu_8086::interrupt.rs

    Software interrupt entry and exit.

*/

use crate::cpu_8086::{Flag, Intel8086};

impl Intel8086 {
    /// Enter a software interrupt. IP must already point at the next
    /// instruction; it becomes the return address. The vector table entry
    /// at `vector * 4` holds the new IP in its low word and the new CS in
    /// its high word.
    pub fn sw_interrupt(&mut self, vector: u8) {
        self.push_flags();
        self.clear_flag(Flag::Interrupt);
        self.clear_flag(Flag::Trap);

        let cs = self.cs;
        let ip = self.ip;
        self.push_u16(cs);
        self.push_u16(ip);

        let vector_addr = (vector as u32) * 4;
        self.ip = self.bus().read_u16(vector_addr);
        self.cs = self.bus().read_u16(vector_addr.wrapping_add(2));
    }

    /// IRET: pop IP, CS, then the full flag register.
    pub fn end_interrupt(&mut self) {
        let ip = self.pop_u16();
        let cs = self.pop_u16();
        self.ip = ip;
        self.cs = cs;
        self.pop_flags();
    }
}
