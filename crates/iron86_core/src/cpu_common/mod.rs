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

    cpu_common::mod.rs

    Types shared by the CPU core and its callers: register selectors,
    exception and step outcome enums.

*/

pub mod alu;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Register8 {
    AL,
    CL,
    DL,
    BL,
    AH,
    CH,
    DH,
    BH,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Register16 {
    AX,
    CX,
    DX,
    BX,
    SP,
    BP,
    SI,
    DI,
    ES,
    CS,
    SS,
    DS,
    IP,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CpuException {
    NoException,
    DivideError,
}

/// What a single `step` observed. `Continued` is the common case; the
/// other three leave the CPU halted.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Continued,
    Halted,
    DivideError,
    UndefinedOpcode(u8),
}

/// Internal result of executing one decoded instruction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExecutionResult {
    Okay,
    OkayJump,
    /// A repeated string instruction performed one iteration and the
    /// repeat has not terminated; IP must return to the instruction start.
    OkayRep,
    UnsupportedOpcode(u8),
    ExceptionError(CpuException),
    Halt,
}
