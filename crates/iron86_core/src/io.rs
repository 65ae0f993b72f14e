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

    io.rs

    The I/O port bus. No devices are attached at this layer: reads from an
    unconnected port float high, writes are discarded.

*/

pub const NO_IO_BYTE: u8 = 0xFF;
pub const NO_IO_WORD: u16 = 0xFFFF;

#[derive(Default)]
pub struct IoBusInterface {}

impl IoBusInterface {
    pub fn new() -> IoBusInterface {
        Default::default()
    }

    #[inline]
    pub fn read_u8(&mut self, _port: u16) -> u8 {
        NO_IO_BYTE
    }

    #[inline]
    pub fn read_u16(&mut self, _port: u16) -> u16 {
        NO_IO_WORD
    }

    #[inline]
    pub fn write_u8(&mut self, _port: u16, _data: u8) {}

    #[inline]
    pub fn write_u16(&mut self, _port: u16, _data: u16) {}
}
