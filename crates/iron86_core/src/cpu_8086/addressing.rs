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

    cpu_8086::addressing.rs

    The segmented addressing unit: effective address calculation for every
    ModR/M form and operand read/write plumbing, with segment-override
    prefixes honored on all memory operands.

*/

use crate::{
    cpu_8086::{decode::OperandType, Intel8086, SegmentOverride},
    cpu_common::Register16,
};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Displacement {
    #[default]
    NoDisp,
    Disp8(i8),
    Disp16(i16),
}

impl Displacement {
    /// The displacement as a 16-bit offset term. Two's complement makes
    /// sign-extension the same as subtraction for negative displacements.
    pub fn get_u16(&self) -> u16 {
        match self {
            Displacement::NoDisp => 0,
            Displacement::Disp8(disp) => *disp as i16 as u16,
            Displacement::Disp16(disp) => *disp as u16,
        }
    }
}

/// The eight memory addressing forms of the ModR/M byte, plus register
/// mode. BP-based forms default to the stack segment.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum AddressingMode {
    BxSi(Displacement),
    BxDi(Displacement),
    BpSi(Displacement),
    BpDi(Displacement),
    Si(Displacement),
    Di(Displacement),
    Disp16(Displacement),
    Bp(Displacement),
    Bx(Displacement),
    #[default]
    RegisterMode,
}

impl Intel8086 {
    #[inline]
    pub fn calc_linear_address(segment: u16, offset: u16) -> u32 {
        ((segment as u32) << 4).wrapping_add(offset as u32) & 0xFFFFF
    }

    /// The segment an instruction's memory operand uses: the active
    /// override if one was prefixed, otherwise the given default.
    pub fn segment_base(&self, default: Register16) -> u16 {
        match self.i.segment_override {
            SegmentOverride::None => self.get_register16(default),
            SegmentOverride::ES => self.es,
            SegmentOverride::CS => self.cs,
            SegmentOverride::SS => self.ss,
            SegmentOverride::DS => self.ds,
        }
    }

    /// Calculate the effective address for an addressing mode, yielding
    /// the segment value (override applied) and the 16-bit offset. All
    /// offset arithmetic wraps at 64K before segmentation.
    fn calc_effective_address(&self, mode: AddressingMode) -> (u16, u16) {
        let bx = self.get_register16(Register16::BX);

        match mode {
            AddressingMode::BxSi(d) => (
                self.segment_base(Register16::DS),
                bx.wrapping_add(self.si).wrapping_add(d.get_u16()),
            ),
            AddressingMode::BxDi(d) => (
                self.segment_base(Register16::DS),
                bx.wrapping_add(self.di).wrapping_add(d.get_u16()),
            ),
            // BP as a base selects SS by default.
            AddressingMode::BpSi(d) => (
                self.segment_base(Register16::SS),
                self.bp.wrapping_add(self.si).wrapping_add(d.get_u16()),
            ),
            AddressingMode::BpDi(d) => (
                self.segment_base(Register16::SS),
                self.bp.wrapping_add(self.di).wrapping_add(d.get_u16()),
            ),
            AddressingMode::Si(d) => {
                (self.segment_base(Register16::DS), self.si.wrapping_add(d.get_u16()))
            }
            AddressingMode::Di(d) => {
                (self.segment_base(Register16::DS), self.di.wrapping_add(d.get_u16()))
            }
            AddressingMode::Disp16(d) => (self.segment_base(Register16::DS), d.get_u16()),
            AddressingMode::Bp(d) => {
                (self.segment_base(Register16::SS), self.bp.wrapping_add(d.get_u16()))
            }
            AddressingMode::Bx(d) => {
                (self.segment_base(Register16::DS), bx.wrapping_add(d.get_u16()))
            }
            AddressingMode::RegisterMode => {
                panic!("calc_effective_address(): register operand has no EA")
            }
        }
    }

    /// LEA: the offset portion of the effective address. Never reads
    /// memory. A register-mode source is undefined on the 8086; we report
    /// no address and the handler leaves the destination alone.
    pub fn load_effective_address(&self, operand: OperandType) -> Option<u16> {
        if let OperandType::AddressingMode(mode) = operand {
            let (_, offset) = self.calc_effective_address(mode);
            return Some(offset);
        }
        None
    }

    /// Return the value of an 8-bit operand.
    pub fn read_operand8(&mut self, operand: OperandType) -> u8 {
        match operand {
            OperandType::Immediate8(imm8) => imm8,
            OperandType::Relative8(rel8) => rel8 as u8,
            OperandType::Offset8(offset) => {
                let segment = self.segment_base(Register16::DS);
                let addr = Intel8086::calc_linear_address(segment, offset);
                self.bus().read_u8(addr)
            }
            OperandType::Register8(reg) => self.get_register8(reg),
            OperandType::AddressingMode(mode) => {
                let (segment, offset) = self.calc_effective_address(mode);
                let addr = Intel8086::calc_linear_address(segment, offset);
                self.bus().read_u8(addr)
            }
            _ => {
                log::error!("read_operand8(): unexpected operand type: {:?}", operand);
                0
            }
        }
    }

    /// Return the value of a 16-bit operand.
    pub fn read_operand16(&mut self, operand: OperandType) -> u16 {
        match operand {
            OperandType::Immediate16(imm16) => imm16,
            OperandType::Relative16(rel16) => rel16 as u16,
            OperandType::Offset16(offset) => {
                let segment = self.segment_base(Register16::DS);
                let addr = Intel8086::calc_linear_address(segment, offset);
                self.bus().read_u16(addr)
            }
            OperandType::Register16(reg) => self.get_register16(reg),
            OperandType::AddressingMode(mode) => {
                let (segment, offset) = self.calc_effective_address(mode);
                let addr = Intel8086::calc_linear_address(segment, offset);
                self.bus().read_u16(addr)
            }
            _ => {
                log::error!("read_operand16(): unexpected operand type: {:?}", operand);
                0
            }
        }
    }

    /// Read the segment:offset pair a memory operand points at, for
    /// LES/LDS and the far indirect CALL/JMP forms. The offset word comes
    /// first, the segment word two bytes above it.
    pub fn read_operand_farptr(&mut self, operand: OperandType) -> Option<(u16, u16)> {
        match operand {
            OperandType::AddressingMode(mode) => {
                let (segment, offset) = self.calc_effective_address(mode);
                let addr = Intel8086::calc_linear_address(segment, offset);
                let ptr_offset = self.bus().read_u16(addr);
                let addr_hi =
                    Intel8086::calc_linear_address(segment, offset.wrapping_add(2));
                let ptr_segment = self.bus().read_u16(addr_hi);
                Some((ptr_segment, ptr_offset))
            }
            _ => None,
        }
    }

    /// Write an 8-bit value to a destination operand.
    pub fn write_operand8(&mut self, operand: OperandType, value: u8) {
        match operand {
            OperandType::Register8(reg) => self.set_register8(reg, value),
            OperandType::Offset8(offset) => {
                let segment = self.segment_base(Register16::DS);
                let addr = Intel8086::calc_linear_address(segment, offset);
                self.bus_mut().write_u8(addr, value);
            }
            OperandType::AddressingMode(mode) => {
                let (segment, offset) = self.calc_effective_address(mode);
                let addr = Intel8086::calc_linear_address(segment, offset);
                self.bus_mut().write_u8(addr, value);
            }
            _ => {
                log::error!("write_operand8(): unexpected operand type: {:?}", operand);
            }
        }
    }

    /// Write a 16-bit value to a destination operand.
    pub fn write_operand16(&mut self, operand: OperandType, value: u16) {
        match operand {
            OperandType::Register16(reg) => self.set_register16(reg, value),
            OperandType::Offset16(offset) => {
                let segment = self.segment_base(Register16::DS);
                let addr = Intel8086::calc_linear_address(segment, offset);
                self.bus_mut().write_u16(addr, value);
            }
            OperandType::AddressingMode(mode) => {
                let (segment, offset) = self.calc_effective_address(mode);
                let addr = Intel8086::calc_linear_address(segment, offset);
                self.bus_mut().write_u16(addr, value);
            }
            _ => {
                log::error!("write_operand16(): unexpected operand type: {:?}", operand);
            }
        }
    }
}
