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

    bytequeue.rs

    Defines the ByteQueue trait the instruction decoder reads code bytes
    through. The queue is addressed by segment:offset so that fetches wrap
    at the 64K segment boundary, the same way IP does.

*/

pub trait ByteQueue {
    /// Position the queue at segment:offset.
    fn seek(&mut self, segment: u16, offset: u16);
    /// Number of bytes consumed since the last seek.
    fn tell(&self) -> u32;

    fn q_read_u8(&mut self) -> u8;
    fn q_read_i8(&mut self) -> i8;
    fn q_read_u16(&mut self) -> u16;
    fn q_read_i16(&mut self) -> i16;
}
