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

    cpu_8086::execute.rs

    Executes one decoded instruction. IP already points past the
    instruction when a handler runs; control-flow handlers overwrite it
    with their target, and a continuing REP iteration reports OkayRep so
    the dispatcher can rewind it.

*/

use crate::{
    cpu_8086::{Flag, Intel8086, Mnemonic, OperandType, RepType},
    cpu_common::{CpuException, ExecutionResult, Register8, Register16},
};

impl Intel8086 {
    pub fn execute_instruction(&mut self) -> ExecutionResult {
        let mut unhandled = false;
        let mut rep_continues = false;
        let mut exception = CpuException::NoException;

        // Resolve the repeat prefix against the instruction it modifies.
        // F2 and F3 both act as a plain repeat on the non-comparing string
        // ops; only CMPS/SCAS distinguish REPE from REPNE.
        let rep_type = if self.i.rep_prefix != RepType::NoRep {
            match self.i.mnemonic {
                Mnemonic::MOVSB
                | Mnemonic::MOVSW
                | Mnemonic::STOSB
                | Mnemonic::STOSW
                | Mnemonic::LODSB
                | Mnemonic::LODSW => RepType::Rep,
                Mnemonic::CMPSB | Mnemonic::CMPSW | Mnemonic::SCASB | Mnemonic::SCASW => {
                    self.i.rep_prefix
                }
                _ => {
                    log::warn!(
                        "REP prefix on invalid opcode: {:?} at [{:04X}:{:04X}]",
                        self.i.mnemonic,
                        self.cs,
                        self.ip
                    );
                    RepType::NoRep
                }
            }
        }
        else {
            RepType::NoRep
        };

        match self.i.opcode {
            0x00 | 0x02 | 0x04 | 0x08 | 0x0A | 0x0C | 0x10 | 0x12 | 0x14 | 0x18 | 0x1A | 0x1C
            | 0x20 | 0x22 | 0x24 | 0x28 | 0x2A | 0x2C | 0x30 | 0x32 | 0x34 => {
                // 8-bit ADD/OR/ADC/SBB/AND/SUB/XOR: r/m,r | r,r/m | al,imm8
                let op1_value = self.read_operand8(self.i.operand1_type);
                let op2_value = self.read_operand8(self.i.operand2_type);
                let result = self.math_op8(self.i.mnemonic, op1_value, op2_value);
                self.write_operand8(self.i.operand1_type, result);
            }
            0x01 | 0x03 | 0x05 | 0x09 | 0x0B | 0x0D | 0x11 | 0x13 | 0x15 | 0x19 | 0x1B | 0x1D
            | 0x21 | 0x23 | 0x25 | 0x29 | 0x2B | 0x2D | 0x31 | 0x33 | 0x35 => {
                // 16-bit ADD/OR/ADC/SBB/AND/SUB/XOR variants
                let op1_value = self.read_operand16(self.i.operand1_type);
                let op2_value = self.read_operand16(self.i.operand2_type);
                let result = self.math_op16(self.i.mnemonic, op1_value, op2_value);
                self.write_operand16(self.i.operand1_type, result);
            }
            0x38 | 0x3A | 0x3C => {
                // CMP r/m8,r8 | r8,r/m8 | al,imm8 - discards the result
                let op1_value = self.read_operand8(self.i.operand1_type);
                let op2_value = self.read_operand8(self.i.operand2_type);
                self.math_op8(Mnemonic::CMP, op1_value, op2_value);
            }
            0x39 | 0x3B | 0x3D => {
                // CMP r/m16,r16 | r16,r/m16 | ax,imm16
                let op1_value = self.read_operand16(self.i.operand1_type);
                let op2_value = self.read_operand16(self.i.operand2_type);
                self.math_op16(Mnemonic::CMP, op1_value, op2_value);
            }
            0x06 | 0x0E | 0x16 | 0x1E => {
                // PUSH ES/CS/SS/DS
                if let OperandType::Register16(reg) = self.i.operand1_type {
                    self.push_register16(reg);
                }
            }
            0x07 | 0x0F | 0x17 | 0x1F => {
                // POP ES/CS/SS/DS. POP CS (0x0F) is undocumented but real.
                if let OperandType::Register16(reg) = self.i.operand1_type {
                    self.pop_register16(reg);
                }
            }
            0x27 => {
                // DAA - decimal adjust AL after addition
                self.daa();
            }
            0x2F => {
                // DAS
                self.das();
            }
            0x37 => {
                // AAA
                self.aaa();
            }
            0x3F => {
                // AAS
                self.aas();
            }
            0x40..=0x47 => {
                // INC r16 register short forms; CF is not touched
                let op1_value = self.read_operand16(self.i.operand1_type);
                let result = self.math_op16(Mnemonic::INC, op1_value, 0);
                self.write_operand16(self.i.operand1_type, result);
            }
            0x48..=0x4F => {
                // DEC r16 register short forms
                let op1_value = self.read_operand16(self.i.operand1_type);
                let result = self.math_op16(Mnemonic::DEC, op1_value, 0);
                self.write_operand16(self.i.operand1_type, result);
            }
            0x50..=0x57 => {
                // PUSH r16
                if let OperandType::Register16(reg) = self.i.operand1_type {
                    self.push_register16(reg);
                }
            }
            0x58..=0x5F => {
                // POP r16
                if let OperandType::Register16(reg) = self.i.operand1_type {
                    self.pop_register16(reg);
                }
            }
            0x60..=0x7F => {
                // Jcc rel8. 0x60-0x6F mirror 0x70-0x7F on the 8086.
                let take = match self.i.opcode & 0x0F {
                    0x00 => self.get_flag(Flag::Overflow),
                    0x01 => !self.get_flag(Flag::Overflow),
                    0x02 => self.get_flag(Flag::Carry),
                    0x03 => !self.get_flag(Flag::Carry),
                    0x04 => self.get_flag(Flag::Zero),
                    0x05 => !self.get_flag(Flag::Zero),
                    0x06 => self.get_flag(Flag::Carry) || self.get_flag(Flag::Zero),
                    0x07 => !self.get_flag(Flag::Carry) && !self.get_flag(Flag::Zero),
                    0x08 => self.get_flag(Flag::Sign),
                    0x09 => !self.get_flag(Flag::Sign),
                    0x0A => self.get_flag(Flag::Parity),
                    0x0B => !self.get_flag(Flag::Parity),
                    0x0C => self.get_flag(Flag::Sign) != self.get_flag(Flag::Overflow),
                    0x0D => self.get_flag(Flag::Sign) == self.get_flag(Flag::Overflow),
                    0x0E => {
                        self.get_flag(Flag::Zero)
                            || (self.get_flag(Flag::Sign) != self.get_flag(Flag::Overflow))
                    }
                    _ => {
                        !self.get_flag(Flag::Zero)
                            && (self.get_flag(Flag::Sign) == self.get_flag(Flag::Overflow))
                    }
                };
                if take {
                    if let OperandType::Relative8(rel8) = self.i.operand1_type {
                        self.reljmp(rel8 as i16);
                    }
                    return ExecutionResult::OkayJump;
                }
            }
            0x80..=0x83 => {
                // Grp1: ADD/OR/ADC/SBB/AND/SUB/XOR/CMP r/m, imm
                match self.i.operand2_type {
                    OperandType::Immediate8(_) => {
                        let op1_value = self.read_operand8(self.i.operand1_type);
                        let op2_value = self.read_operand8(self.i.operand2_type);
                        let result = self.math_op8(self.i.mnemonic, op1_value, op2_value);
                        if self.i.mnemonic != Mnemonic::CMP {
                            self.write_operand8(self.i.operand1_type, result);
                        }
                    }
                    _ => {
                        // 0x83's imm8 was sign-extended at decode time.
                        let op1_value = self.read_operand16(self.i.operand1_type);
                        let op2_value = self.read_operand16(self.i.operand2_type);
                        let result = self.math_op16(self.i.mnemonic, op1_value, op2_value);
                        if self.i.mnemonic != Mnemonic::CMP {
                            self.write_operand16(self.i.operand1_type, result);
                        }
                    }
                }
            }
            0x84 => {
                // TEST r/m8, r8
                let op1_value = self.read_operand8(self.i.operand1_type);
                let op2_value = self.read_operand8(self.i.operand2_type);
                self.math_op8(Mnemonic::TEST, op1_value, op2_value);
            }
            0x85 => {
                // TEST r/m16, r16
                let op1_value = self.read_operand16(self.i.operand1_type);
                let op2_value = self.read_operand16(self.i.operand2_type);
                self.math_op16(Mnemonic::TEST, op1_value, op2_value);
            }
            0x86 => {
                // XCHG r8, r/m8
                let op1_value = self.read_operand8(self.i.operand1_type);
                let op2_value = self.read_operand8(self.i.operand2_type);
                self.write_operand8(self.i.operand1_type, op2_value);
                self.write_operand8(self.i.operand2_type, op1_value);
            }
            0x87 | 0x91..=0x97 => {
                // XCHG r16, r/m16 and the XCHG AX short forms
                let op1_value = self.read_operand16(self.i.operand1_type);
                let op2_value = self.read_operand16(self.i.operand2_type);
                self.write_operand16(self.i.operand1_type, op2_value);
                self.write_operand16(self.i.operand2_type, op1_value);
            }
            0x88 | 0x8A | 0xA0 | 0xA2 | 0xB0..=0xB7 | 0xC6 => {
                // 8-bit MOV forms
                let op_value = self.read_operand8(self.i.operand2_type);
                self.write_operand8(self.i.operand1_type, op_value);
            }
            0x89 | 0x8B | 0x8C | 0x8E | 0xA1 | 0xA3 | 0xB8..=0xBF | 0xC7 => {
                // 16-bit MOV forms, including the segment register moves
                let op_value = self.read_operand16(self.i.operand2_type);
                self.write_operand16(self.i.operand1_type, op_value);
            }
            0x8D => {
                // LEA: loads the offset only; memory is never read. The
                // register-direct form has no EA and leaves r16 alone.
                if let Some(offset) = self.load_effective_address(self.i.operand2_type) {
                    self.write_operand16(self.i.operand1_type, offset);
                }
            }
            0x8F => {
                // POP r/m16
                let value = self.pop_u16();
                self.write_operand16(self.i.operand1_type, value);
            }
            0x90 => {
                // NOP (XCHG AX, AX)
            }
            0x98 => {
                // CBW
                self.sign_extend_al();
            }
            0x99 => {
                // CWD
                self.sign_extend_ax();
            }
            0x9A => {
                // CALLF ptr16:16
                if let OperandType::FarAddress(segment, offset) = self.i.operand1_type {
                    let cs = self.cs;
                    let ip = self.ip;
                    self.push_u16(cs);
                    self.push_u16(ip);
                    self.cs = segment;
                    self.ip = offset;
                }
                return ExecutionResult::OkayJump;
            }
            0x9B => {
                // WAIT: no coprocessor, nothing to wait on
            }
            0x9C => {
                // PUSHF
                self.push_flags();
            }
            0x9D => {
                // POPF
                self.pop_flags();
            }
            0x9E => {
                // SAHF
                let ah = self.get_register8(Register8::AH);
                self.store_flags(ah as u16);
            }
            0x9F => {
                // LAHF
                let flags = self.load_flags() as u8;
                self.set_register8(Register8::AH, flags);
            }
            0xA4 | 0xA5 | 0xAA | 0xAB | 0xAC | 0xAD => {
                // MOVS/STOS/LODS: plain repeat, terminated by CX alone
                if rep_type != RepType::NoRep {
                    let cx = self.get_register16(Register16::CX);
                    if cx > 0 {
                        self.string_op(self.i.mnemonic);
                        let cx = cx.wrapping_sub(1);
                        self.set_register16(Register16::CX, cx);
                        if cx > 0 {
                            rep_continues = true;
                        }
                    }
                }
                else {
                    self.string_op(self.i.mnemonic);
                }
            }
            0xA6 | 0xA7 | 0xAE | 0xAF => {
                // CMPS/SCAS: repeat also ends when the ZF condition fails
                if rep_type != RepType::NoRep {
                    let cx = self.get_register16(Register16::CX);
                    if cx > 0 {
                        self.string_op(self.i.mnemonic);
                        let cx = cx.wrapping_sub(1);
                        self.set_register16(Register16::CX, cx);
                        let condition_holds = match rep_type {
                            RepType::Rep => self.get_flag(Flag::Zero),
                            RepType::Repne => !self.get_flag(Flag::Zero),
                            RepType::NoRep => false,
                        };
                        if cx > 0 && condition_holds {
                            rep_continues = true;
                        }
                    }
                }
                else {
                    self.string_op(self.i.mnemonic);
                }
            }
            0xA8 => {
                // TEST al, imm8
                let op1_value = self.read_operand8(self.i.operand1_type);
                let op2_value = self.read_operand8(self.i.operand2_type);
                self.math_op8(Mnemonic::TEST, op1_value, op2_value);
            }
            0xA9 => {
                // TEST ax, imm16
                let op1_value = self.read_operand16(self.i.operand1_type);
                let op2_value = self.read_operand16(self.i.operand2_type);
                self.math_op16(Mnemonic::TEST, op1_value, op2_value);
            }
            0xC0 | 0xC2 => {
                // RETN imm16: pop IP, then discard the argument bytes
                let stack_disp = self.read_operand16(self.i.operand1_type);
                self.ip = self.pop_u16();
                self.release(stack_disp);
                return ExecutionResult::OkayJump;
            }
            0xC1 | 0xC3 => {
                // RETN
                self.ip = self.pop_u16();
                return ExecutionResult::OkayJump;
            }
            0xC4 => {
                // LES r16, m16:16
                if let Some((segment, offset)) = self.read_operand_farptr(self.i.operand2_type) {
                    self.write_operand16(self.i.operand1_type, offset);
                    self.es = segment;
                }
                else {
                    log::warn!("LES with register operand at [{:04X}:{:04X}]", self.cs, self.ip);
                }
            }
            0xC5 => {
                // LDS r16, m16:16
                if let Some((segment, offset)) = self.read_operand_farptr(self.i.operand2_type) {
                    self.write_operand16(self.i.operand1_type, offset);
                    self.ds = segment;
                }
                else {
                    log::warn!("LDS with register operand at [{:04X}:{:04X}]", self.cs, self.ip);
                }
            }
            0xC8 | 0xCA => {
                // RETF imm16
                let stack_disp = self.read_operand16(self.i.operand1_type);
                self.ip = self.pop_u16();
                self.cs = self.pop_u16();
                self.release(stack_disp);
                return ExecutionResult::OkayJump;
            }
            0xC9 | 0xCB => {
                // RETF
                self.ip = self.pop_u16();
                self.cs = self.pop_u16();
                return ExecutionResult::OkayJump;
            }
            0xCC => {
                // INT 3
                self.sw_interrupt(3);
                return ExecutionResult::OkayJump;
            }
            0xCD => {
                // INT imm8. IF does not gate software interrupts.
                let vector = self.read_operand8(self.i.operand1_type);
                self.sw_interrupt(vector);
                return ExecutionResult::OkayJump;
            }
            0xCE => {
                // INTO: interrupt 4, taken only when OF is set
                if self.get_flag(Flag::Overflow) {
                    self.sw_interrupt(4);
                    return ExecutionResult::OkayJump;
                }
            }
            0xCF => {
                // IRET
                self.end_interrupt();
                return ExecutionResult::OkayJump;
            }
            0xD0 | 0xD1 | 0xD2 | 0xD3 => {
                // Grp2 shifts/rotates: count is 1 or CL
                let count = match self.i.operand2_type {
                    OperandType::Register8(_) => self.read_operand8(self.i.operand2_type),
                    _ => 1,
                };
                if self.i.opcode & 0x01 == 0 {
                    let op1_value = self.read_operand8(self.i.operand1_type);
                    let result = self.bitshift_op8(self.i.mnemonic, op1_value, count);
                    self.write_operand8(self.i.operand1_type, result);
                }
                else {
                    let op1_value = self.read_operand16(self.i.operand1_type);
                    let result = self.bitshift_op16(self.i.mnemonic, op1_value, count);
                    self.write_operand16(self.i.operand1_type, result);
                }
            }
            0xD4 => {
                // AAM imm8: divides by the immediate, so zero aborts
                let imm8 = self.read_operand8(self.i.operand1_type);
                if imm8 == 0 {
                    exception = CpuException::DivideError;
                }
                else {
                    self.aam(imm8);
                }
            }
            0xD5 => {
                // AAD imm8
                let imm8 = self.read_operand8(self.i.operand1_type);
                self.aad(imm8);
            }
            0xD6 => {
                // SALC (undocumented): AL from the carry flag
                let al = if self.get_flag(Flag::Carry) { 0xFF } else { 0x00 };
                self.set_register8(Register8::AL, al);
            }
            0xD7 => {
                // XLAT: AL := [seg:BX+AL], override honored
                let segment = self.segment_base(Register16::DS);
                let al = self.get_register8(Register8::AL);
                let bx = self.get_register16(Register16::BX);
                let offset = bx.wrapping_add(al as u16);
                let addr = Intel8086::calc_linear_address(segment, offset);
                let value = self.bus().read_u8(addr);
                self.set_register8(Register8::AL, value);
            }
            0xD8..=0xDF => {
                // ESC: the ModR/M byte was consumed at decode; no 8087 is
                // attached, so the instruction has no other effect
            }
            0xE0 => {
                // LOOPNE rel8
                let cx = self.get_register16(Register16::CX).wrapping_sub(1);
                self.set_register16(Register16::CX, cx);
                if cx != 0 && !self.get_flag(Flag::Zero) {
                    if let OperandType::Relative8(rel8) = self.i.operand1_type {
                        self.reljmp(rel8 as i16);
                        return ExecutionResult::OkayJump;
                    }
                }
            }
            0xE1 => {
                // LOOPE rel8
                let cx = self.get_register16(Register16::CX).wrapping_sub(1);
                self.set_register16(Register16::CX, cx);
                if cx != 0 && self.get_flag(Flag::Zero) {
                    if let OperandType::Relative8(rel8) = self.i.operand1_type {
                        self.reljmp(rel8 as i16);
                        return ExecutionResult::OkayJump;
                    }
                }
            }
            0xE2 => {
                // LOOP rel8
                let cx = self.get_register16(Register16::CX).wrapping_sub(1);
                self.set_register16(Register16::CX, cx);
                if cx != 0 {
                    if let OperandType::Relative8(rel8) = self.i.operand1_type {
                        self.reljmp(rel8 as i16);
                        return ExecutionResult::OkayJump;
                    }
                }
            }
            0xE3 => {
                // JCXZ rel8: tests CX without decrementing it
                if self.get_register16(Register16::CX) == 0 {
                    if let OperandType::Relative8(rel8) = self.i.operand1_type {
                        self.reljmp(rel8 as i16);
                        return ExecutionResult::OkayJump;
                    }
                }
            }
            0xE4 | 0xEC => {
                // IN al, imm8/dx
                let port = self.read_operand_port();
                let byte = self.io.read_u8(port);
                self.set_register8(Register8::AL, byte);
            }
            0xE5 | 0xED => {
                // IN ax, imm8/dx
                let port = self.read_operand_port();
                let word = self.io.read_u16(port);
                self.set_register16(Register16::AX, word);
            }
            0xE6 | 0xEE => {
                // OUT imm8/dx, al
                let port = match self.i.operand1_type {
                    OperandType::Immediate8(imm8) => imm8 as u16,
                    _ => self.read_operand16(self.i.operand1_type),
                };
                let data = self.read_operand8(self.i.operand2_type);
                self.io.write_u8(port, data);
            }
            0xE7 | 0xEF => {
                // OUT imm8/dx, ax
                let port = match self.i.operand1_type {
                    OperandType::Immediate8(imm8) => imm8 as u16,
                    _ => self.read_operand16(self.i.operand1_type),
                };
                let data = self.read_operand16(self.i.operand2_type);
                self.io.write_u16(port, data);
            }
            0xE8 => {
                // CALL rel16: push the return address, then jump
                if let OperandType::Relative16(rel16) = self.i.operand1_type {
                    let return_ip = self.ip;
                    self.push_u16(return_ip);
                    self.reljmp(rel16);
                }
                return ExecutionResult::OkayJump;
            }
            0xE9 => {
                // JMP rel16
                if let OperandType::Relative16(rel16) = self.i.operand1_type {
                    self.reljmp(rel16);
                }
                return ExecutionResult::OkayJump;
            }
            0xEA => {
                // JMPF ptr16:16
                if let OperandType::FarAddress(segment, offset) = self.i.operand1_type {
                    self.cs = segment;
                    self.ip = offset;
                }
                return ExecutionResult::OkayJump;
            }
            0xEB => {
                // JMP rel8
                if let OperandType::Relative8(rel8) = self.i.operand1_type {
                    self.reljmp(rel8 as i16);
                }
                return ExecutionResult::OkayJump;
            }
            0xF4 => {
                // HLT
                return ExecutionResult::Halt;
            }
            0xF5 => {
                // CMC
                let carry = self.get_flag(Flag::Carry);
                self.set_flag_state(Flag::Carry, !carry);
            }
            0xF6 | 0xF7 => {
                // Grp3 subfunctions
                exception = self.execute_group3();
            }
            0xF8 => {
                // CLC
                self.clear_flag(Flag::Carry);
            }
            0xF9 => {
                // STC
                self.set_flag(Flag::Carry);
            }
            0xFA => {
                // CLI
                self.clear_flag(Flag::Interrupt);
            }
            0xFB => {
                // STI
                self.set_flag(Flag::Interrupt);
            }
            0xFC => {
                // CLD
                self.clear_flag(Flag::Direction);
            }
            0xFD => {
                // STD
                self.set_flag(Flag::Direction);
            }
            0xFE | 0xFF => {
                // Grp4/Grp5 subfunctions
                match self.i.mnemonic {
                    Mnemonic::INC | Mnemonic::DEC if self.i.opcode == 0xFE => {
                        let op_value = self.read_operand8(self.i.operand1_type);
                        let result = self.math_op8(self.i.mnemonic, op_value, 0);
                        self.write_operand8(self.i.operand1_type, result);
                    }
                    Mnemonic::INC | Mnemonic::DEC => {
                        let op_value = self.read_operand16(self.i.operand1_type);
                        let result = self.math_op16(self.i.mnemonic, op_value, 0);
                        self.write_operand16(self.i.operand1_type, result);
                    }
                    Mnemonic::PUSH => {
                        let op_value = self.read_operand16(self.i.operand1_type);
                        self.push_u16(op_value);
                    }
                    Mnemonic::CALL => {
                        let target = self.read_operand16(self.i.operand1_type);
                        let return_ip = self.ip;
                        self.push_u16(return_ip);
                        self.ip = target;
                        return ExecutionResult::OkayJump;
                    }
                    Mnemonic::CALLF => {
                        if let Some((segment, offset)) =
                            self.read_operand_farptr(self.i.operand1_type)
                        {
                            let cs = self.cs;
                            let ip = self.ip;
                            self.push_u16(cs);
                            self.push_u16(ip);
                            self.cs = segment;
                            self.ip = offset;
                            return ExecutionResult::OkayJump;
                        }
                        log::warn!(
                            "far CALL with register operand at [{:04X}:{:04X}]",
                            self.cs,
                            self.ip
                        );
                    }
                    Mnemonic::JMP => {
                        self.ip = self.read_operand16(self.i.operand1_type);
                        return ExecutionResult::OkayJump;
                    }
                    Mnemonic::JMPF => {
                        if let Some((segment, offset)) =
                            self.read_operand_farptr(self.i.operand1_type)
                        {
                            self.cs = segment;
                            self.ip = offset;
                            return ExecutionResult::OkayJump;
                        }
                        log::warn!(
                            "far JMP with register operand at [{:04X}:{:04X}]",
                            self.cs,
                            self.ip
                        );
                    }
                    _ => unhandled = true,
                }
            }
            _ => {
                unhandled = true;
            }
        }

        if unhandled {
            ExecutionResult::UnsupportedOpcode(self.i.opcode)
        }
        else if rep_continues {
            ExecutionResult::OkayRep
        }
        else {
            match exception {
                CpuException::DivideError => ExecutionResult::ExceptionError(exception),
                CpuException::NoException => ExecutionResult::Okay,
            }
        }
    }

    /// Relative jump from the already-advanced IP.
    #[inline]
    fn reljmp(&mut self, rel: i16) {
        self.ip = self.ip.wrapping_add(rel as u16);
    }

    /// The port number for an IN instruction: imm8 zero-extends, DX is
    /// used as-is.
    fn read_operand_port(&mut self) -> u16 {
        match self.i.operand2_type {
            OperandType::Immediate8(imm8) => imm8 as u16,
            _ => self.read_operand16(self.i.operand2_type),
        }
    }

    /// Grp3: TEST/NOT/NEG/MUL/IMUL/DIV/IDIV on r/m.
    fn execute_group3(&mut self) -> CpuException {
        let mut exception = CpuException::NoException;

        if self.i.opcode == 0xF6 {
            match self.i.mnemonic {
                Mnemonic::TEST => {
                    let op1_value = self.read_operand8(self.i.operand1_type);
                    let op2_value = self.read_operand8(self.i.operand2_type);
                    self.math_op8(Mnemonic::TEST, op1_value, op2_value);
                }
                Mnemonic::NOT | Mnemonic::NEG => {
                    let op1_value = self.read_operand8(self.i.operand1_type);
                    let result = self.math_op8(self.i.mnemonic, op1_value, 0);
                    self.write_operand8(self.i.operand1_type, result);
                }
                Mnemonic::MUL => {
                    let op1_value = self.read_operand8(self.i.operand1_type);
                    self.multiply_u8(op1_value);
                }
                Mnemonic::IMUL => {
                    let op1_value = self.read_operand8(self.i.operand1_type);
                    self.multiply_i8(op1_value as i8);
                }
                Mnemonic::DIV => {
                    let op1_value = self.read_operand8(self.i.operand1_type);
                    if !self.divide_u8(op1_value) {
                        exception = CpuException::DivideError;
                    }
                }
                Mnemonic::IDIV => {
                    let op1_value = self.read_operand8(self.i.operand1_type);
                    if !self.divide_i8(op1_value) {
                        exception = CpuException::DivideError;
                    }
                }
                _ => {}
            }
        }
        else {
            match self.i.mnemonic {
                Mnemonic::TEST => {
                    let op1_value = self.read_operand16(self.i.operand1_type);
                    let op2_value = self.read_operand16(self.i.operand2_type);
                    self.math_op16(Mnemonic::TEST, op1_value, op2_value);
                }
                Mnemonic::NOT | Mnemonic::NEG => {
                    let op1_value = self.read_operand16(self.i.operand1_type);
                    let result = self.math_op16(self.i.mnemonic, op1_value, 0);
                    self.write_operand16(self.i.operand1_type, result);
                }
                Mnemonic::MUL => {
                    let op1_value = self.read_operand16(self.i.operand1_type);
                    self.multiply_u16(op1_value);
                }
                Mnemonic::IMUL => {
                    let op1_value = self.read_operand16(self.i.operand1_type);
                    self.multiply_i16(op1_value as i16);
                }
                Mnemonic::DIV => {
                    let op1_value = self.read_operand16(self.i.operand1_type);
                    if !self.divide_u16(op1_value) {
                        exception = CpuException::DivideError;
                    }
                }
                Mnemonic::IDIV => {
                    let op1_value = self.read_operand16(self.i.operand1_type);
                    if !self.divide_i16(op1_value) {
                        exception = CpuException::DivideError;
                    }
                }
                _ => {}
            }
        }

        exception
    }
}
