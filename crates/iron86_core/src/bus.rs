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

    bus.rs

    Implements the memory bus: 1 MiB of flat RAM with little-endian word
    packing. All addresses are reduced modulo the 20-bit address space, so
    a word read at the top of memory wraps its high byte to address 0.

*/

use crate::{bytequeue::ByteQueue, memerror::MemError};

pub const ADDRESS_SPACE: usize = 0x10_0000;
pub const ADDRESS_MASK: u32 = 0x0F_FFFF;

pub struct BusInterface {
    memory: Vec<u8>,
    cursor_segment: u16,
    cursor_offset:  u16,
    cursor_read_ct: u32,
}

impl Default for BusInterface {
    fn default() -> Self {
        BusInterface {
            memory: vec![0; ADDRESS_SPACE],
            cursor_segment: 0,
            cursor_offset:  0,
            cursor_read_ct: 0,
        }
    }
}

impl BusInterface {
    pub fn new() -> BusInterface {
        Default::default()
    }

    pub fn clear(&mut self) {
        self.memory.fill(0);
    }

    #[inline]
    pub fn read_u8(&self, address: u32) -> u8 {
        self.memory[(address & ADDRESS_MASK) as usize]
    }

    #[inline]
    pub fn read_u16(&self, address: u32) -> u16 {
        // Split into two byte reads so the high byte wraps at the top of
        // the address space.
        let lo = self.read_u8(address);
        let hi = self.read_u8(address.wrapping_add(1));
        (hi as u16) << 8 | lo as u16
    }

    #[inline]
    pub fn write_u8(&mut self, address: u32, data: u8) {
        self.memory[(address & ADDRESS_MASK) as usize] = data;
    }

    #[inline]
    pub fn write_u16(&mut self, address: u32, data: u16) {
        self.write_u8(address, (data & 0xFF) as u8);
        self.write_u8(address.wrapping_add(1), (data >> 8) as u8);
    }

    /// Non-destructive read for external inspection. Unlike the CPU-facing
    /// accessors this does not mask the address; callers handing us raw
    /// addresses learn when they are out of range.
    pub fn peek_u8(&self, address: u32) -> Result<u8, MemError> {
        if (address as usize) < ADDRESS_SPACE {
            Ok(self.memory[address as usize])
        }
        else {
            Err(MemError::ReadOutOfBoundsError(address))
        }
    }
}

impl ByteQueue for BusInterface {
    fn seek(&mut self, segment: u16, offset: u16) {
        self.cursor_segment = segment;
        self.cursor_offset = offset;
        self.cursor_read_ct = 0;
    }

    fn tell(&self) -> u32 {
        self.cursor_read_ct
    }

    fn q_read_u8(&mut self) -> u8 {
        let addr = ((self.cursor_segment as u32) << 4).wrapping_add(self.cursor_offset as u32);
        let byte = self.read_u8(addr);
        // Fetch offsets wrap at the segment boundary like IP does.
        self.cursor_offset = self.cursor_offset.wrapping_add(1);
        self.cursor_read_ct += 1;
        byte
    }

    fn q_read_i8(&mut self) -> i8 {
        self.q_read_u8() as i8
    }

    fn q_read_u16(&mut self) -> u16 {
        let lo = self.q_read_u8();
        let hi = self.q_read_u8();
        (hi as u16) << 8 | lo as u16
    }

    fn q_read_i16(&mut self) -> i16 {
        self.q_read_u16() as i16
    }
}
