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

    cpu_8086::modrm.rs

    Loading and parsing of ModR/M bytes.

*/

use crate::{
    bytequeue::ByteQueue,
    cpu_8086::addressing::{AddressingMode, Displacement},
    cpu_common::{Register16, Register8},
};

#[derive(Copy, Clone, Default)]
pub struct ModRmByte {
    b_mod: u8,
    b_reg: u8,
    b_rm:  u8,
    addressing_mode: AddressingMode,
}

impl ModRmByte {
    /// Read the ModR/M byte and any displacement it calls for. Decoding is
    /// a pure function of the bytes consumed, so repeating it on the same
    /// bytes always yields the same descriptor and count.
    pub fn read(bytes: &mut impl ByteQueue) -> ModRmByte {
        let byte = bytes.q_read_u8();

        let b_mod = (byte >> 6) & 0x03;
        let b_reg = (byte >> 3) & 0x07;
        let b_rm = byte & 0x07;

        let disp = match (b_mod, b_rm) {
            // [disp16] is the one direct-address form of mod 00.
            (0b00, 0b110) => Displacement::Disp16(bytes.q_read_i16()),
            (0b00, _) => Displacement::NoDisp,
            // Mod 01 carries an 8-bit displacement, sign-extended.
            (0b01, _) => Displacement::Disp8(bytes.q_read_i8()),
            (0b10, _) => Displacement::Disp16(bytes.q_read_i16()),
            _ => Displacement::NoDisp,
        };

        let addressing_mode = match b_mod {
            0b11 => AddressingMode::RegisterMode,
            _ => match b_rm {
                0b000 => AddressingMode::BxSi(disp),
                0b001 => AddressingMode::BxDi(disp),
                0b010 => AddressingMode::BpSi(disp),
                0b011 => AddressingMode::BpDi(disp),
                0b100 => AddressingMode::Si(disp),
                0b101 => AddressingMode::Di(disp),
                0b110 => {
                    if b_mod == 0b00 {
                        AddressingMode::Disp16(disp)
                    }
                    else {
                        AddressingMode::Bp(disp)
                    }
                }
                _ => AddressingMode::Bx(disp),
            },
        };

        ModRmByte {
            b_mod,
            b_reg,
            b_rm,
            addressing_mode,
        }
    }

    #[inline]
    pub fn is_register_mode(&self) -> bool {
        self.b_mod == 0b11
    }

    // Interpret the R/M field as an 8-bit register selector.
    pub fn get_op1_reg8(&self) -> Register8 {
        ModRmByte::reg8_from_slot(self.b_rm)
    }

    // Interpret the R/M field as a 16-bit register selector.
    pub fn get_op1_reg16(&self) -> Register16 {
        ModRmByte::reg16_from_slot(self.b_rm)
    }

    // Interpret the REG field as an 8-bit register selector.
    pub fn get_op2_reg8(&self) -> Register8 {
        ModRmByte::reg8_from_slot(self.b_reg)
    }

    // Interpret the REG field as a 16-bit register selector.
    pub fn get_op2_reg16(&self) -> Register16 {
        ModRmByte::reg16_from_slot(self.b_reg)
    }

    // Interpret the REG field as a segment register selector. Only two
    // bits participate, so the four registers repeat across the field.
    pub fn get_op2_segmentreg16(&self) -> Register16 {
        match self.b_reg & 0x03 {
            0x00 => Register16::ES,
            0x01 => Register16::CS,
            0x02 => Register16::SS,
            _ => Register16::DS,
        }
    }

    // Interpret the REG field as a group opcode extension.
    #[inline]
    pub fn get_op_extension(&self) -> u8 {
        self.b_reg
    }

    #[inline]
    pub fn get_addressing_mode(&self) -> AddressingMode {
        self.addressing_mode
    }

    fn reg8_from_slot(slot: u8) -> Register8 {
        match slot {
            0x00 => Register8::AL,
            0x01 => Register8::CL,
            0x02 => Register8::DL,
            0x03 => Register8::BL,
            0x04 => Register8::AH,
            0x05 => Register8::CH,
            0x06 => Register8::DH,
            _ => Register8::BH,
        }
    }

    fn reg16_from_slot(slot: u8) -> Register16 {
        match slot {
            0x00 => Register16::AX,
            0x01 => Register16::CX,
            0x02 => Register16::DX,
            0x03 => Register16::BX,
            0x04 => Register16::SP,
            0x05 => Register16::BP,
            0x06 => Register16::SI,
            _ => Register16::DI,
        }
    }
}
