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

    cpu_8086::decode.rs

    Instruction decoding: prefix collection, the opcode template table, the
    group extension tables, and operand materialization. Decoding consumes
    exactly the instruction's bytes from the queue; the resulting size is
    what the dispatcher advances IP by.

*/

use crate::{
    bytequeue::ByteQueue,
    cpu_8086::{
        addressing::AddressingMode,
        modrm::ModRmByte,
        Intel8086,
        RepType,
        SegmentOverride,
        OPCODE_REGISTER_SELECT_MASK,
    },
    cpu_common::{Register16, Register8},
};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Mnemonic {
    #[default]
    Invalid,
    NOP,
    WAIT,
    ADD,
    ADC,
    SUB,
    SBB,
    CMP,
    AND,
    OR,
    XOR,
    TEST,
    NOT,
    NEG,
    MUL,
    IMUL,
    DIV,
    IDIV,
    INC,
    DEC,
    MOV,
    XCHG,
    LEA,
    LDS,
    LES,
    PUSH,
    POP,
    PUSHF,
    POPF,
    SAHF,
    LAHF,
    CBW,
    CWD,
    DAA,
    DAS,
    AAA,
    AAS,
    AAM,
    AAD,
    JO,
    JNO,
    JB,
    JNB,
    JZ,
    JNZ,
    JBE,
    JNBE,
    JS,
    JNS,
    JP,
    JNP,
    JL,
    JNL,
    JLE,
    JNLE,
    JMP,
    JMPF,
    CALL,
    CALLF,
    RETN,
    RETF,
    LOOP,
    LOOPE,
    LOOPNE,
    JCXZ,
    INT,
    INT3,
    INTO,
    IRET,
    HLT,
    CMC,
    CLC,
    STC,
    CLI,
    STI,
    CLD,
    STD,
    IN,
    OUT,
    XLAT,
    SALC,
    ESC,
    MOVSB,
    MOVSW,
    CMPSB,
    CMPSW,
    STOSB,
    STOSW,
    LODSB,
    LODSW,
    SCASB,
    SCASW,
    ROL,
    ROR,
    RCL,
    RCR,
    SHL,
    SHR,
    SAR,
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum OperandType {
    Immediate8(u8),
    Immediate16(u16),
    Relative8(i8),
    Relative16(i16),
    Offset8(u16),
    Offset16(u16),
    Register8(Register8),
    Register16(Register16),
    AddressingMode(AddressingMode),
    FarAddress(u16, u16),
    #[default]
    NoOperand,
}

#[derive(Copy, Clone, PartialEq)]
enum OperandTemplate {
    NoTemplate,
    NoOperand,
    ModRM8,
    ModRM16,
    Register8,
    Register16,
    SegmentRegister,
    Register8Encoded,
    Register16Encoded,
    Immediate8,
    Immediate16,
    Immediate8SignExtended,
    Relative8,
    Relative16,
    Offset8,
    Offset16,
    FixedRegister8(Register8),
    FixedRegister16(Register16),
    FarAddress,
}

#[derive(Copy, Clone, Default)]
pub struct Instruction {
    pub opcode: u8,
    pub size: u32,
    pub mnemonic: Mnemonic,
    pub segment_override: SegmentOverride,
    pub rep_prefix: RepType,
    pub operand1_type: OperandType,
    pub operand2_type: OperandType,
}

impl Intel8086 {
    /// Decode one instruction from the byte queue. Never fails: an opcode
    /// with no handler decodes to `Mnemonic::Invalid` with its consumed
    /// prefix bytes accounted for, and the dispatcher reports it.
    pub fn decode(bytes: &mut impl ByteQueue) -> Instruction {
        use OperandTemplate as Ot;

        let mut opcode = bytes.q_read_u8();
        let mut segment_override = SegmentOverride::None;
        let mut rep_prefix = RepType::NoRep;

        // Consume prefix bytes. A 64K segment filled with prefixes could
        // never reach an opcode, so the scan is bounded by the segment.
        for _ in 0..0x10000 {
            match opcode {
                0x26 => segment_override = SegmentOverride::ES,
                0x2E => segment_override = SegmentOverride::CS,
                0x36 => segment_override = SegmentOverride::SS,
                0x3E => segment_override = SegmentOverride::DS,
                0xF2 => rep_prefix = RepType::Repne,
                0xF3 => rep_prefix = RepType::Rep,
                _ => break,
            }
            opcode = bytes.q_read_u8();
        }

        // Match templatizable instructions.
        #[rustfmt::skip]
        let (mut mnemonic, op1_template, op2_template) = match opcode {
            0x00 => (Mnemonic::ADD,  Ot::ModRM8,    Ot::Register8),
            0x01 => (Mnemonic::ADD,  Ot::ModRM16,   Ot::Register16),
            0x02 => (Mnemonic::ADD,  Ot::Register8, Ot::ModRM8),
            0x03 => (Mnemonic::ADD,  Ot::Register16, Ot::ModRM16),
            0x04 => (Mnemonic::ADD,  Ot::FixedRegister8(Register8::AL), Ot::Immediate8),
            0x05 => (Mnemonic::ADD,  Ot::FixedRegister16(Register16::AX), Ot::Immediate16),
            0x06 => (Mnemonic::PUSH, Ot::FixedRegister16(Register16::ES), Ot::NoOperand),
            0x07 => (Mnemonic::POP,  Ot::FixedRegister16(Register16::ES), Ot::NoOperand),
            0x08 => (Mnemonic::OR,   Ot::ModRM8,    Ot::Register8),
            0x09 => (Mnemonic::OR,   Ot::ModRM16,   Ot::Register16),
            0x0A => (Mnemonic::OR,   Ot::Register8, Ot::ModRM8),
            0x0B => (Mnemonic::OR,   Ot::Register16, Ot::ModRM16),
            0x0C => (Mnemonic::OR,   Ot::FixedRegister8(Register8::AL), Ot::Immediate8),
            0x0D => (Mnemonic::OR,   Ot::FixedRegister16(Register16::AX), Ot::Immediate16),
            0x0E => (Mnemonic::PUSH, Ot::FixedRegister16(Register16::CS), Ot::NoOperand),
            // POP CS: undocumented but defined on the 8086.
            0x0F => (Mnemonic::POP,  Ot::FixedRegister16(Register16::CS), Ot::NoOperand),
            0x10 => (Mnemonic::ADC,  Ot::ModRM8,    Ot::Register8),
            0x11 => (Mnemonic::ADC,  Ot::ModRM16,   Ot::Register16),
            0x12 => (Mnemonic::ADC,  Ot::Register8, Ot::ModRM8),
            0x13 => (Mnemonic::ADC,  Ot::Register16, Ot::ModRM16),
            0x14 => (Mnemonic::ADC,  Ot::FixedRegister8(Register8::AL), Ot::Immediate8),
            0x15 => (Mnemonic::ADC,  Ot::FixedRegister16(Register16::AX), Ot::Immediate16),
            0x16 => (Mnemonic::PUSH, Ot::FixedRegister16(Register16::SS), Ot::NoOperand),
            0x17 => (Mnemonic::POP,  Ot::FixedRegister16(Register16::SS), Ot::NoOperand),
            0x18 => (Mnemonic::SBB,  Ot::ModRM8,    Ot::Register8),
            0x19 => (Mnemonic::SBB,  Ot::ModRM16,   Ot::Register16),
            0x1A => (Mnemonic::SBB,  Ot::Register8, Ot::ModRM8),
            0x1B => (Mnemonic::SBB,  Ot::Register16, Ot::ModRM16),
            0x1C => (Mnemonic::SBB,  Ot::FixedRegister8(Register8::AL), Ot::Immediate8),
            0x1D => (Mnemonic::SBB,  Ot::FixedRegister16(Register16::AX), Ot::Immediate16),
            0x1E => (Mnemonic::PUSH, Ot::FixedRegister16(Register16::DS), Ot::NoOperand),
            0x1F => (Mnemonic::POP,  Ot::FixedRegister16(Register16::DS), Ot::NoOperand),
            0x20 => (Mnemonic::AND,  Ot::ModRM8,    Ot::Register8),
            0x21 => (Mnemonic::AND,  Ot::ModRM16,   Ot::Register16),
            0x22 => (Mnemonic::AND,  Ot::Register8, Ot::ModRM8),
            0x23 => (Mnemonic::AND,  Ot::Register16, Ot::ModRM16),
            0x24 => (Mnemonic::AND,  Ot::FixedRegister8(Register8::AL), Ot::Immediate8),
            0x25 => (Mnemonic::AND,  Ot::FixedRegister16(Register16::AX), Ot::Immediate16),
            0x27 => (Mnemonic::DAA,  Ot::NoOperand, Ot::NoOperand),
            0x28 => (Mnemonic::SUB,  Ot::ModRM8,    Ot::Register8),
            0x29 => (Mnemonic::SUB,  Ot::ModRM16,   Ot::Register16),
            0x2A => (Mnemonic::SUB,  Ot::Register8, Ot::ModRM8),
            0x2B => (Mnemonic::SUB,  Ot::Register16, Ot::ModRM16),
            0x2C => (Mnemonic::SUB,  Ot::FixedRegister8(Register8::AL), Ot::Immediate8),
            0x2D => (Mnemonic::SUB,  Ot::FixedRegister16(Register16::AX), Ot::Immediate16),
            0x2F => (Mnemonic::DAS,  Ot::NoOperand, Ot::NoOperand),
            0x30 => (Mnemonic::XOR,  Ot::ModRM8,    Ot::Register8),
            0x31 => (Mnemonic::XOR,  Ot::ModRM16,   Ot::Register16),
            0x32 => (Mnemonic::XOR,  Ot::Register8, Ot::ModRM8),
            0x33 => (Mnemonic::XOR,  Ot::Register16, Ot::ModRM16),
            0x34 => (Mnemonic::XOR,  Ot::FixedRegister8(Register8::AL), Ot::Immediate8),
            0x35 => (Mnemonic::XOR,  Ot::FixedRegister16(Register16::AX), Ot::Immediate16),
            0x37 => (Mnemonic::AAA,  Ot::NoOperand, Ot::NoOperand),
            0x38 => (Mnemonic::CMP,  Ot::ModRM8,    Ot::Register8),
            0x39 => (Mnemonic::CMP,  Ot::ModRM16,   Ot::Register16),
            0x3A => (Mnemonic::CMP,  Ot::Register8, Ot::ModRM8),
            0x3B => (Mnemonic::CMP,  Ot::Register16, Ot::ModRM16),
            0x3C => (Mnemonic::CMP,  Ot::FixedRegister8(Register8::AL), Ot::Immediate8),
            0x3D => (Mnemonic::CMP,  Ot::FixedRegister16(Register16::AX), Ot::Immediate16),
            0x3F => (Mnemonic::AAS,  Ot::NoOperand, Ot::NoOperand),
            0x40..=0x47 => (Mnemonic::INC,  Ot::Register16Encoded, Ot::NoOperand),
            0x48..=0x4F => (Mnemonic::DEC,  Ot::Register16Encoded, Ot::NoOperand),
            0x50..=0x57 => (Mnemonic::PUSH, Ot::Register16Encoded, Ot::NoOperand),
            0x58..=0x5F => (Mnemonic::POP,  Ot::Register16Encoded, Ot::NoOperand),
            // 0x60..=0x6F alias 0x70..=0x7F on the 8086.
            0x60 | 0x70 => (Mnemonic::JO,   Ot::Relative8, Ot::NoOperand),
            0x61 | 0x71 => (Mnemonic::JNO,  Ot::Relative8, Ot::NoOperand),
            0x62 | 0x72 => (Mnemonic::JB,   Ot::Relative8, Ot::NoOperand),
            0x63 | 0x73 => (Mnemonic::JNB,  Ot::Relative8, Ot::NoOperand),
            0x64 | 0x74 => (Mnemonic::JZ,   Ot::Relative8, Ot::NoOperand),
            0x65 | 0x75 => (Mnemonic::JNZ,  Ot::Relative8, Ot::NoOperand),
            0x66 | 0x76 => (Mnemonic::JBE,  Ot::Relative8, Ot::NoOperand),
            0x67 | 0x77 => (Mnemonic::JNBE, Ot::Relative8, Ot::NoOperand),
            0x68 | 0x78 => (Mnemonic::JS,   Ot::Relative8, Ot::NoOperand),
            0x69 | 0x79 => (Mnemonic::JNS,  Ot::Relative8, Ot::NoOperand),
            0x6A | 0x7A => (Mnemonic::JP,   Ot::Relative8, Ot::NoOperand),
            0x6B | 0x7B => (Mnemonic::JNP,  Ot::Relative8, Ot::NoOperand),
            0x6C | 0x7C => (Mnemonic::JL,   Ot::Relative8, Ot::NoOperand),
            0x6D | 0x7D => (Mnemonic::JNL,  Ot::Relative8, Ot::NoOperand),
            0x6E | 0x7E => (Mnemonic::JLE,  Ot::Relative8, Ot::NoOperand),
            0x6F | 0x7F => (Mnemonic::JNLE, Ot::Relative8, Ot::NoOperand),
            0x84 => (Mnemonic::TEST, Ot::ModRM8,    Ot::Register8),
            0x85 => (Mnemonic::TEST, Ot::ModRM16,   Ot::Register16),
            0x86 => (Mnemonic::XCHG, Ot::Register8, Ot::ModRM8),
            0x87 => (Mnemonic::XCHG, Ot::Register16, Ot::ModRM16),
            0x88 => (Mnemonic::MOV,  Ot::ModRM8,    Ot::Register8),
            0x89 => (Mnemonic::MOV,  Ot::ModRM16,   Ot::Register16),
            0x8A => (Mnemonic::MOV,  Ot::Register8, Ot::ModRM8),
            0x8B => (Mnemonic::MOV,  Ot::Register16, Ot::ModRM16),
            0x8C => (Mnemonic::MOV,  Ot::ModRM16,   Ot::SegmentRegister),
            0x8D => (Mnemonic::LEA,  Ot::Register16, Ot::ModRM16),
            0x8E => (Mnemonic::MOV,  Ot::SegmentRegister, Ot::ModRM16),
            0x8F => (Mnemonic::POP,  Ot::ModRM16,   Ot::NoOperand),
            // XCHG AX, AX is the canonical NOP.
            0x90 => (Mnemonic::NOP,  Ot::NoOperand, Ot::NoOperand),
            0x91..=0x97 => {
                (Mnemonic::XCHG, Ot::Register16Encoded, Ot::FixedRegister16(Register16::AX))
            }
            0x98 => (Mnemonic::CBW,  Ot::NoOperand, Ot::NoOperand),
            0x99 => (Mnemonic::CWD,  Ot::NoOperand, Ot::NoOperand),
            0x9A => (Mnemonic::CALLF, Ot::FarAddress, Ot::NoOperand),
            0x9B => (Mnemonic::WAIT, Ot::NoOperand, Ot::NoOperand),
            0x9C => (Mnemonic::PUSHF, Ot::NoOperand, Ot::NoOperand),
            0x9D => (Mnemonic::POPF, Ot::NoOperand, Ot::NoOperand),
            0x9E => (Mnemonic::SAHF, Ot::NoOperand, Ot::NoOperand),
            0x9F => (Mnemonic::LAHF, Ot::NoOperand, Ot::NoOperand),
            // Accumulator moffs moves take a direct offset, no ModR/M.
            0xA0 => (Mnemonic::MOV,  Ot::FixedRegister8(Register8::AL), Ot::Offset8),
            0xA1 => (Mnemonic::MOV,  Ot::FixedRegister16(Register16::AX), Ot::Offset16),
            0xA2 => (Mnemonic::MOV,  Ot::Offset8,  Ot::FixedRegister8(Register8::AL)),
            0xA3 => (Mnemonic::MOV,  Ot::Offset16, Ot::FixedRegister16(Register16::AX)),
            0xA4 => (Mnemonic::MOVSB, Ot::NoOperand, Ot::NoOperand),
            0xA5 => (Mnemonic::MOVSW, Ot::NoOperand, Ot::NoOperand),
            0xA6 => (Mnemonic::CMPSB, Ot::NoOperand, Ot::NoOperand),
            0xA7 => (Mnemonic::CMPSW, Ot::NoOperand, Ot::NoOperand),
            0xA8 => (Mnemonic::TEST, Ot::FixedRegister8(Register8::AL), Ot::Immediate8),
            0xA9 => (Mnemonic::TEST, Ot::FixedRegister16(Register16::AX), Ot::Immediate16),
            0xAA => (Mnemonic::STOSB, Ot::NoOperand, Ot::NoOperand),
            0xAB => (Mnemonic::STOSW, Ot::NoOperand, Ot::NoOperand),
            0xAC => (Mnemonic::LODSB, Ot::NoOperand, Ot::NoOperand),
            0xAD => (Mnemonic::LODSW, Ot::NoOperand, Ot::NoOperand),
            0xAE => (Mnemonic::SCASB, Ot::NoOperand, Ot::NoOperand),
            0xAF => (Mnemonic::SCASW, Ot::NoOperand, Ot::NoOperand),
            0xB0..=0xB7 => (Mnemonic::MOV, Ot::Register8Encoded, Ot::Immediate8),
            0xB8..=0xBF => (Mnemonic::MOV, Ot::Register16Encoded, Ot::Immediate16),
            // 0xC0/0xC1 and 0xC8/0xC9 are undocumented aliases of the
            // documented RET forms two slots up.
            0xC0 | 0xC2 => (Mnemonic::RETN, Ot::Immediate16, Ot::NoOperand),
            0xC1 | 0xC3 => (Mnemonic::RETN, Ot::NoOperand, Ot::NoOperand),
            0xC4 => (Mnemonic::LES, Ot::Register16, Ot::ModRM16),
            0xC5 => (Mnemonic::LDS, Ot::Register16, Ot::ModRM16),
            0xC6 => (Mnemonic::MOV, Ot::ModRM8,  Ot::Immediate8),
            0xC7 => (Mnemonic::MOV, Ot::ModRM16, Ot::Immediate16),
            0xC8 | 0xCA => (Mnemonic::RETF, Ot::Immediate16, Ot::NoOperand),
            0xC9 | 0xCB => (Mnemonic::RETF, Ot::NoOperand, Ot::NoOperand),
            0xCC => (Mnemonic::INT3, Ot::NoOperand, Ot::NoOperand),
            0xCD => (Mnemonic::INT,  Ot::Immediate8, Ot::NoOperand),
            0xCE => (Mnemonic::INTO, Ot::NoOperand, Ot::NoOperand),
            0xCF => (Mnemonic::IRET, Ot::NoOperand, Ot::NoOperand),
            0xD4 => (Mnemonic::AAM, Ot::Immediate8, Ot::NoOperand),
            0xD5 => (Mnemonic::AAD, Ot::Immediate8, Ot::NoOperand),
            0xD6 => (Mnemonic::SALC, Ot::NoOperand, Ot::NoOperand),
            0xD7 => (Mnemonic::XLAT, Ot::NoOperand, Ot::NoOperand),
            // ESC: coprocessor opcodes decode their ModR/M and do nothing.
            0xD8..=0xDF => (Mnemonic::ESC, Ot::ModRM16, Ot::NoOperand),
            0xE0 => (Mnemonic::LOOPNE, Ot::Relative8, Ot::NoOperand),
            0xE1 => (Mnemonic::LOOPE,  Ot::Relative8, Ot::NoOperand),
            0xE2 => (Mnemonic::LOOP, Ot::Relative8, Ot::NoOperand),
            0xE3 => (Mnemonic::JCXZ, Ot::Relative8, Ot::NoOperand),
            0xE4 => (Mnemonic::IN,  Ot::FixedRegister8(Register8::AL), Ot::Immediate8),
            0xE5 => (Mnemonic::IN,  Ot::FixedRegister16(Register16::AX), Ot::Immediate8),
            0xE6 => (Mnemonic::OUT, Ot::Immediate8, Ot::FixedRegister8(Register8::AL)),
            0xE7 => (Mnemonic::OUT, Ot::Immediate8, Ot::FixedRegister16(Register16::AX)),
            0xE8 => (Mnemonic::CALL, Ot::Relative16, Ot::NoOperand),
            0xE9 => (Mnemonic::JMP,  Ot::Relative16, Ot::NoOperand),
            0xEA => (Mnemonic::JMPF, Ot::FarAddress, Ot::NoOperand),
            0xEB => (Mnemonic::JMP,  Ot::Relative8, Ot::NoOperand),
            0xEC => (Mnemonic::IN,  Ot::FixedRegister8(Register8::AL), Ot::FixedRegister16(Register16::DX)),
            0xED => (Mnemonic::IN,  Ot::FixedRegister16(Register16::AX), Ot::FixedRegister16(Register16::DX)),
            0xEE => (Mnemonic::OUT, Ot::FixedRegister16(Register16::DX), Ot::FixedRegister8(Register8::AL)),
            0xEF => (Mnemonic::OUT, Ot::FixedRegister16(Register16::DX), Ot::FixedRegister16(Register16::AX)),
            0xF4 => (Mnemonic::HLT, Ot::NoOperand, Ot::NoOperand),
            0xF5 => (Mnemonic::CMC, Ot::NoOperand, Ot::NoOperand),
            0xF8 => (Mnemonic::CLC, Ot::NoOperand, Ot::NoOperand),
            0xF9 => (Mnemonic::STC, Ot::NoOperand, Ot::NoOperand),
            0xFA => (Mnemonic::CLI, Ot::NoOperand, Ot::NoOperand),
            0xFB => (Mnemonic::STI, Ot::NoOperand, Ot::NoOperand),
            0xFC => (Mnemonic::CLD, Ot::NoOperand, Ot::NoOperand),
            0xFD => (Mnemonic::STD, Ot::NoOperand, Ot::NoOperand),
            // Group opcodes and everything else resolve below.
            _ => (Mnemonic::Invalid, Ot::NoTemplate, Ot::NoTemplate),
        };

        let mut op1_template = op1_template;
        let mut op2_template = op2_template;
        let mut modrm = ModRmByte::default();
        let mut loaded_modrm = false;

        // If no template matched, this is a group opcode (or genuinely
        // undefined). Group instructions carry a ModR/M byte whose REG
        // field selects the operation.
        if mnemonic == Mnemonic::Invalid && matches!(opcode, 0x80..=0x83 | 0xD0..=0xD3 | 0xF6 | 0xF7 | 0xFE | 0xFF) {
            modrm = ModRmByte::read(bytes);
            loaded_modrm = true;
            let op_ext = modrm.get_op_extension();

            #[rustfmt::skip]
            let group = match (opcode, op_ext) {
                // Grp1: 0x82 is an alias of 0x80 on the 8086.
                (0x80 | 0x82, 0x00) => (Mnemonic::ADD, Ot::ModRM8, Ot::Immediate8),
                (0x80 | 0x82, 0x01) => (Mnemonic::OR,  Ot::ModRM8, Ot::Immediate8),
                (0x80 | 0x82, 0x02) => (Mnemonic::ADC, Ot::ModRM8, Ot::Immediate8),
                (0x80 | 0x82, 0x03) => (Mnemonic::SBB, Ot::ModRM8, Ot::Immediate8),
                (0x80 | 0x82, 0x04) => (Mnemonic::AND, Ot::ModRM8, Ot::Immediate8),
                (0x80 | 0x82, 0x05) => (Mnemonic::SUB, Ot::ModRM8, Ot::Immediate8),
                (0x80 | 0x82, 0x06) => (Mnemonic::XOR, Ot::ModRM8, Ot::Immediate8),
                (0x80 | 0x82, 0x07) => (Mnemonic::CMP, Ot::ModRM8, Ot::Immediate8),

                (0x81, 0x00) => (Mnemonic::ADD, Ot::ModRM16, Ot::Immediate16),
                (0x81, 0x01) => (Mnemonic::OR,  Ot::ModRM16, Ot::Immediate16),
                (0x81, 0x02) => (Mnemonic::ADC, Ot::ModRM16, Ot::Immediate16),
                (0x81, 0x03) => (Mnemonic::SBB, Ot::ModRM16, Ot::Immediate16),
                (0x81, 0x04) => (Mnemonic::AND, Ot::ModRM16, Ot::Immediate16),
                (0x81, 0x05) => (Mnemonic::SUB, Ot::ModRM16, Ot::Immediate16),
                (0x81, 0x06) => (Mnemonic::XOR, Ot::ModRM16, Ot::Immediate16),
                (0x81, 0x07) => (Mnemonic::CMP, Ot::ModRM16, Ot::Immediate16),

                (0x83, 0x00) => (Mnemonic::ADD, Ot::ModRM16, Ot::Immediate8SignExtended),
                (0x83, 0x01) => (Mnemonic::OR,  Ot::ModRM16, Ot::Immediate8SignExtended),
                (0x83, 0x02) => (Mnemonic::ADC, Ot::ModRM16, Ot::Immediate8SignExtended),
                (0x83, 0x03) => (Mnemonic::SBB, Ot::ModRM16, Ot::Immediate8SignExtended),
                (0x83, 0x04) => (Mnemonic::AND, Ot::ModRM16, Ot::Immediate8SignExtended),
                (0x83, 0x05) => (Mnemonic::SUB, Ot::ModRM16, Ot::Immediate8SignExtended),
                (0x83, 0x06) => (Mnemonic::XOR, Ot::ModRM16, Ot::Immediate8SignExtended),
                (0x83, 0x07) => (Mnemonic::CMP, Ot::ModRM16, Ot::Immediate8SignExtended),

                // Grp2: subfunction 6 executes as SHL.
                (0xD0, 0x00) => (Mnemonic::ROL, Ot::ModRM8, Ot::NoOperand),
                (0xD0, 0x01) => (Mnemonic::ROR, Ot::ModRM8, Ot::NoOperand),
                (0xD0, 0x02) => (Mnemonic::RCL, Ot::ModRM8, Ot::NoOperand),
                (0xD0, 0x03) => (Mnemonic::RCR, Ot::ModRM8, Ot::NoOperand),
                (0xD0, 0x04 | 0x06) => (Mnemonic::SHL, Ot::ModRM8, Ot::NoOperand),
                (0xD0, 0x05) => (Mnemonic::SHR, Ot::ModRM8, Ot::NoOperand),
                (0xD0, 0x07) => (Mnemonic::SAR, Ot::ModRM8, Ot::NoOperand),

                (0xD1, 0x00) => (Mnemonic::ROL, Ot::ModRM16, Ot::NoOperand),
                (0xD1, 0x01) => (Mnemonic::ROR, Ot::ModRM16, Ot::NoOperand),
                (0xD1, 0x02) => (Mnemonic::RCL, Ot::ModRM16, Ot::NoOperand),
                (0xD1, 0x03) => (Mnemonic::RCR, Ot::ModRM16, Ot::NoOperand),
                (0xD1, 0x04 | 0x06) => (Mnemonic::SHL, Ot::ModRM16, Ot::NoOperand),
                (0xD1, 0x05) => (Mnemonic::SHR, Ot::ModRM16, Ot::NoOperand),
                (0xD1, 0x07) => (Mnemonic::SAR, Ot::ModRM16, Ot::NoOperand),

                (0xD2, 0x00) => (Mnemonic::ROL, Ot::ModRM8, Ot::FixedRegister8(Register8::CL)),
                (0xD2, 0x01) => (Mnemonic::ROR, Ot::ModRM8, Ot::FixedRegister8(Register8::CL)),
                (0xD2, 0x02) => (Mnemonic::RCL, Ot::ModRM8, Ot::FixedRegister8(Register8::CL)),
                (0xD2, 0x03) => (Mnemonic::RCR, Ot::ModRM8, Ot::FixedRegister8(Register8::CL)),
                (0xD2, 0x04 | 0x06) => (Mnemonic::SHL, Ot::ModRM8, Ot::FixedRegister8(Register8::CL)),
                (0xD2, 0x05) => (Mnemonic::SHR, Ot::ModRM8, Ot::FixedRegister8(Register8::CL)),
                (0xD2, 0x07) => (Mnemonic::SAR, Ot::ModRM8, Ot::FixedRegister8(Register8::CL)),

                (0xD3, 0x00) => (Mnemonic::ROL, Ot::ModRM16, Ot::FixedRegister8(Register8::CL)),
                (0xD3, 0x01) => (Mnemonic::ROR, Ot::ModRM16, Ot::FixedRegister8(Register8::CL)),
                (0xD3, 0x02) => (Mnemonic::RCL, Ot::ModRM16, Ot::FixedRegister8(Register8::CL)),
                (0xD3, 0x03) => (Mnemonic::RCR, Ot::ModRM16, Ot::FixedRegister8(Register8::CL)),
                (0xD3, 0x04 | 0x06) => (Mnemonic::SHL, Ot::ModRM16, Ot::FixedRegister8(Register8::CL)),
                (0xD3, 0x05) => (Mnemonic::SHR, Ot::ModRM16, Ot::FixedRegister8(Register8::CL)),
                (0xD3, 0x07) => (Mnemonic::SAR, Ot::ModRM16, Ot::FixedRegister8(Register8::CL)),

                // Grp3: subfunction 1 executes as TEST.
                (0xF6, 0x00 | 0x01) => (Mnemonic::TEST, Ot::ModRM8, Ot::Immediate8),
                (0xF6, 0x02) => (Mnemonic::NOT,  Ot::ModRM8, Ot::NoOperand),
                (0xF6, 0x03) => (Mnemonic::NEG,  Ot::ModRM8, Ot::NoOperand),
                (0xF6, 0x04) => (Mnemonic::MUL,  Ot::ModRM8, Ot::NoOperand),
                (0xF6, 0x05) => (Mnemonic::IMUL, Ot::ModRM8, Ot::NoOperand),
                (0xF6, 0x06) => (Mnemonic::DIV,  Ot::ModRM8, Ot::NoOperand),
                (0xF6, 0x07) => (Mnemonic::IDIV, Ot::ModRM8, Ot::NoOperand),

                (0xF7, 0x00 | 0x01) => (Mnemonic::TEST, Ot::ModRM16, Ot::Immediate16),
                (0xF7, 0x02) => (Mnemonic::NOT,  Ot::ModRM16, Ot::NoOperand),
                (0xF7, 0x03) => (Mnemonic::NEG,  Ot::ModRM16, Ot::NoOperand),
                (0xF7, 0x04) => (Mnemonic::MUL,  Ot::ModRM16, Ot::NoOperand),
                (0xF7, 0x05) => (Mnemonic::IMUL, Ot::ModRM16, Ot::NoOperand),
                (0xF7, 0x06) => (Mnemonic::DIV,  Ot::ModRM16, Ot::NoOperand),
                (0xF7, 0x07) => (Mnemonic::IDIV, Ot::ModRM16, Ot::NoOperand),

                // Grp4: only INC/DEC are byte-sized; the remaining slots
                // fall through to the Grp5 operations on a word operand.
                (0xFE, 0x00) => (Mnemonic::INC, Ot::ModRM8, Ot::NoOperand),
                (0xFE, 0x01) => (Mnemonic::DEC, Ot::ModRM8, Ot::NoOperand),
                (0xFF, 0x00) => (Mnemonic::INC, Ot::ModRM16, Ot::NoOperand),
                (0xFF, 0x01) => (Mnemonic::DEC, Ot::ModRM16, Ot::NoOperand),
                (0xFE | 0xFF, 0x02) => (Mnemonic::CALL,  Ot::ModRM16, Ot::NoOperand),
                (0xFE | 0xFF, 0x03) => (Mnemonic::CALLF, Ot::ModRM16, Ot::NoOperand),
                (0xFE | 0xFF, 0x04) => (Mnemonic::JMP,   Ot::ModRM16, Ot::NoOperand),
                (0xFE | 0xFF, 0x05) => (Mnemonic::JMPF,  Ot::ModRM16, Ot::NoOperand),
                (0xFE | 0xFF, 0x06 | 0x07) => (Mnemonic::PUSH, Ot::ModRM16, Ot::NoOperand),

                _ => (Mnemonic::Invalid, Ot::NoTemplate, Ot::NoTemplate),
            };
            (mnemonic, op1_template, op2_template) = group;
        }

        // Load the ModR/M byte if an operand requires one and the group
        // path hasn't already.
        let needs_modrm = |t: OperandTemplate| {
            matches!(
                t,
                Ot::ModRM8 | Ot::ModRM16 | Ot::Register8 | Ot::Register16 | Ot::SegmentRegister
            )
        };
        if !loaded_modrm && (needs_modrm(op1_template) || needs_modrm(op2_template)) {
            modrm = ModRmByte::read(bytes);
        }

        // Materialize templated operands.
        let mut match_op = |op_template| -> OperandType {
            match op_template {
                Ot::ModRM8 => {
                    if modrm.is_register_mode() {
                        OperandType::Register8(modrm.get_op1_reg8())
                    }
                    else {
                        OperandType::AddressingMode(modrm.get_addressing_mode())
                    }
                }
                Ot::ModRM16 => {
                    if modrm.is_register_mode() {
                        OperandType::Register16(modrm.get_op1_reg16())
                    }
                    else {
                        OperandType::AddressingMode(modrm.get_addressing_mode())
                    }
                }
                Ot::Register8 => OperandType::Register8(modrm.get_op2_reg8()),
                Ot::Register16 => OperandType::Register16(modrm.get_op2_reg16()),
                Ot::SegmentRegister => OperandType::Register16(modrm.get_op2_segmentreg16()),
                Ot::Register8Encoded => {
                    OperandType::Register8(match opcode & OPCODE_REGISTER_SELECT_MASK {
                        0x00 => Register8::AL,
                        0x01 => Register8::CL,
                        0x02 => Register8::DL,
                        0x03 => Register8::BL,
                        0x04 => Register8::AH,
                        0x05 => Register8::CH,
                        0x06 => Register8::DH,
                        _ => Register8::BH,
                    })
                }
                Ot::Register16Encoded => {
                    OperandType::Register16(match opcode & OPCODE_REGISTER_SELECT_MASK {
                        0x00 => Register16::AX,
                        0x01 => Register16::CX,
                        0x02 => Register16::DX,
                        0x03 => Register16::BX,
                        0x04 => Register16::SP,
                        0x05 => Register16::BP,
                        0x06 => Register16::SI,
                        _ => Register16::DI,
                    })
                }
                Ot::Immediate8 => OperandType::Immediate8(bytes.q_read_u8()),
                Ot::Immediate16 => OperandType::Immediate16(bytes.q_read_u16()),
                Ot::Immediate8SignExtended => {
                    OperandType::Immediate16(bytes.q_read_i8() as i16 as u16)
                }
                Ot::Relative8 => OperandType::Relative8(bytes.q_read_i8()),
                Ot::Relative16 => OperandType::Relative16(bytes.q_read_i16()),
                Ot::Offset8 => OperandType::Offset8(bytes.q_read_u16()),
                Ot::Offset16 => OperandType::Offset16(bytes.q_read_u16()),
                Ot::FixedRegister8(reg) => OperandType::Register8(reg),
                Ot::FixedRegister16(reg) => OperandType::Register16(reg),
                Ot::FarAddress => {
                    let offset = bytes.q_read_u16();
                    let segment = bytes.q_read_u16();
                    OperandType::FarAddress(segment, offset)
                }
                Ot::NoTemplate | Ot::NoOperand => OperandType::NoOperand,
            }
        };

        let operand1_type = match_op(op1_template);
        let operand2_type = match_op(op2_template);

        Instruction {
            opcode,
            size: bytes.tell(),
            mnemonic,
            segment_override,
            rep_prefix,
            operand1_type,
            operand2_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::BusInterface;

    fn decode_bytes(code: &[u8]) -> Instruction {
        let mut bus = BusInterface::new();
        for (i, b) in code.iter().enumerate() {
            bus.write_u8(0x1000 + i as u32, *b);
        }
        bus.seek(0x0100, 0x0000);
        Intel8086::decode(&mut bus)
    }

    #[test]
    fn test_decode_mov_al_imm8() {
        let i = decode_bytes(&[0xB0, 0x8A]);
        assert_eq!(i.mnemonic, Mnemonic::MOV);
        assert_eq!(i.size, 2);
        assert_eq!(i.operand1_type, OperandType::Register8(Register8::AL));
        assert_eq!(i.operand2_type, OperandType::Immediate8(0x8A));
    }

    #[test]
    fn test_decode_prefixes() {
        let i = decode_bytes(&[0x26, 0x8B, 0b00_000_100]); // es: mov ax, [si]
        assert_eq!(i.mnemonic, Mnemonic::MOV);
        assert_eq!(i.segment_override, SegmentOverride::ES);
        assert_eq!(i.size, 3);

        let i = decode_bytes(&[0xF3, 0xA4]); // rep movsb
        assert_eq!(i.mnemonic, Mnemonic::MOVSB);
        assert_eq!(i.rep_prefix, RepType::Rep);
        assert_eq!(i.size, 2);
    }

    #[test]
    fn test_decode_group_sizes() {
        // add word [bx+di+disp16], imm16: opcode + modrm + disp16 + imm16
        let i = decode_bytes(&[0x81, 0b10_000_001, 0x34, 0x12, 0xCD, 0xAB]);
        assert_eq!(i.mnemonic, Mnemonic::ADD);
        assert_eq!(i.size, 6);
        assert_eq!(i.operand2_type, OperandType::Immediate16(0xABCD));

        // Grp3 TEST keeps its trailing immediate.
        let i = decode_bytes(&[0xF6, 0b11_000_010, 0x55]); // test dl, 0x55
        assert_eq!(i.mnemonic, Mnemonic::TEST);
        assert_eq!(i.size, 3);
    }

    #[test]
    fn test_decode_sign_extended_imm() {
        let i = decode_bytes(&[0x83, 0b11_101_000, 0xFF]); // sub ax, -1
        assert_eq!(i.mnemonic, Mnemonic::SUB);
        assert_eq!(i.operand2_type, OperandType::Immediate16(0xFFFF));
        assert_eq!(i.size, 3);
    }

    #[test]
    fn test_decode_jcc_low_aliases() {
        let lo = decode_bytes(&[0x64, 0x05]);
        let hi = decode_bytes(&[0x74, 0x05]);
        assert_eq!(lo.mnemonic, Mnemonic::JZ);
        assert_eq!(hi.mnemonic, Mnemonic::JZ);
    }

    #[test]
    fn test_decode_far_address() {
        let i = decode_bytes(&[0xEA, 0x34, 0x12, 0x00, 0xF0]); // jmp F000:1234
        assert_eq!(i.mnemonic, Mnemonic::JMPF);
        assert_eq!(i.operand1_type, OperandType::FarAddress(0xF000, 0x1234));
        assert_eq!(i.size, 5);
    }

    #[test]
    fn test_decode_undefined_prefix_class() {
        let i = decode_bytes(&[0xF0, 0x90]);
        assert_eq!(i.mnemonic, Mnemonic::Invalid);
        assert_eq!(i.opcode, 0xF0);
        assert_eq!(i.size, 1);
    }
}
