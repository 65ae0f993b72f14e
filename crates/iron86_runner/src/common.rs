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

    common.rs - Fixture schema, loading, and state validation.

*/

use std::{
    collections::HashMap,
    ffi::OsString,
    fs::File,
    io::{BufReader, ErrorKind, Read},
    path::Path,
    time::Duration,
};

use anyhow::{bail, Error};
use colored::Colorize;
use flate2::read::GzDecoder;
use serde_derive::{Deserialize, Serialize};

use iron86_core::cpu_8086::{
    CpuRegisterState,
    Intel8086,
    CPU_FLAG_AUX_CARRY,
    CPU_FLAG_CARRY,
    CPU_FLAG_DIRECTION,
    CPU_FLAG_INT_ENABLE,
    CPU_FLAG_OVERFLOW,
    CPU_FLAG_PARITY,
    CPU_FLAG_SIGN,
    CPU_FLAG_TRAP,
    CPU_FLAG_ZERO,
};

/// Register image from a fixture. `final.regs` carries only the registers
/// whose value changed, so every field is optional; a missing key means
/// "same as initial".
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize)]
pub struct TestRegisters {
    pub ax: Option<u16>,
    pub bx: Option<u16>,
    pub cx: Option<u16>,
    pub dx: Option<u16>,
    pub cs: Option<u16>,
    pub ss: Option<u16>,
    pub ds: Option<u16>,
    pub es: Option<u16>,
    pub sp: Option<u16>,
    pub bp: Option<u16>,
    pub si: Option<u16>,
    pub di: Option<u16>,
    pub ip: Option<u16>,
    pub flags: Option<u16>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestState {
    pub regs: TestRegisters,
    pub ram:  Vec<[u32; 2]>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CpuTest {
    /// Human readable name (disassembly)
    pub name:  String,
    /// Instruction bytes
    pub bytes: Vec<u8>,

    #[serde(rename = "initial")]
    pub initial_state: TestState,

    #[serde(rename = "final")]
    pub final_state: TestState,
}

#[derive(Default)]
pub struct TestResult {
    pub duration: Duration,
    pub passed: u32,
    pub failed: u32,
    pub reg_mismatch: u32,
    pub mem_mismatch: u32,
}

pub struct TestResultSummary {
    pub results: HashMap<OsString, TestResult>,
}

/// Extract the opcode a fixture file covers from its file stem, e.g.
/// "D4.json.gz" -> 0xD4.
pub fn opcode_from_path(path: &Path) -> Option<u8> {
    path.file_stem()
        .and_then(|os_str| os_str.to_str())
        .and_then(|filename| filename.get(0..2))
        .and_then(|hex_str| u8::from_str_radix(hex_str, 16).ok())
}

/// Read a fixture file, transparently decompressing ".gz".
pub fn read_tests_from_file(test_path: &Path) -> Option<Vec<CpuTest>> {
    let file = match File::open(test_path) {
        Ok(file) => file,
        Err(error) => {
            match error.kind() {
                ErrorKind::NotFound => {
                    eprintln!("File not found: {:?}", test_path);
                }
                error => {
                    eprintln!("Failed to open the file due to: {:?}", error);
                }
            }
            return None;
        }
    };

    let mut file_string = String::new();

    match test_path.extension().and_then(std::ffi::OsStr::to_str) {
        Some("gz") => {
            let mut decoder = GzDecoder::new(BufReader::new(file));
            if let Err(e) = decoder.read_to_string(&mut file_string) {
                eprintln!("Failed to decompress gzip archive {:?}: {}", test_path, e);
                return None;
            }
        }
        Some("json") => {
            let mut reader = BufReader::new(file);
            if let Err(e) = reader.read_to_string(&mut file_string) {
                eprintln!("Error reading JSON file {:?}: {}", test_path, e);
                return None;
            }
        }
        _ => {
            log::error!("Bad extension: {:?}", test_path);
            return None;
        }
    }

    match serde_json::from_str(&file_string) {
        Ok(json_obj) => Some(json_obj),
        Err(e) if e.is_eof() => {
            println!("JSON file {:?} is empty. Creating new vector.", test_path);
            Some(Vec::new())
        }
        Err(e) => {
            eprintln!("Failed to read json from file: {:?}: {:?}", test_path, e);
            None
        }
    }
}

macro_rules! check_reg {
    ($mismatches:ident, $name:literal, $expected:expr, $initial:expr, $actual:expr) => {{
        let expected = $expected.unwrap_or($initial.unwrap_or(0));
        if expected != $actual {
            $mismatches.push(format!(
                "{}: expected {:04X} actual {:04X}",
                $name, expected, $actual
            ));
        }
    }};
}

/// Compare the CPU's final registers against a fixture's expectation.
/// Registers absent from `final.regs` must retain their initial value.
/// Returns the list of mismatches, empty on success.
pub fn validate_registers(
    initial: &TestRegisters,
    expected: &TestRegisters,
    actual: &CpuRegisterState,
) -> Vec<String> {
    let mut mismatches = Vec::new();

    check_reg!(mismatches, "ax", expected.ax, initial.ax, actual.ax);
    check_reg!(mismatches, "bx", expected.bx, initial.bx, actual.bx);
    check_reg!(mismatches, "cx", expected.cx, initial.cx, actual.cx);
    check_reg!(mismatches, "dx", expected.dx, initial.dx, actual.dx);
    check_reg!(mismatches, "cs", expected.cs, initial.cs, actual.cs);
    check_reg!(mismatches, "ss", expected.ss, initial.ss, actual.ss);
    check_reg!(mismatches, "ds", expected.ds, initial.ds, actual.ds);
    check_reg!(mismatches, "es", expected.es, initial.es, actual.es);
    check_reg!(mismatches, "sp", expected.sp, initial.sp, actual.sp);
    check_reg!(mismatches, "bp", expected.bp, initial.bp, actual.bp);
    check_reg!(mismatches, "si", expected.si, initial.si, actual.si);
    check_reg!(mismatches, "di", expected.di, initial.di, actual.di);
    check_reg!(mismatches, "ip", expected.ip, initial.ip, actual.ip);

    let expected_flags = expected.flags.unwrap_or(initial.flags.unwrap_or(0));
    if expected_flags != actual.flags {
        mismatches.push(format!(
            "flags: expected {:04X} actual {:04X} ({})",
            expected_flags,
            actual.flags,
            flag_diff_string(expected_flags, actual.flags)
        ));
    }

    mismatches
}

/// Name the flags that differ between two flag images.
fn flag_diff_string(expected: u16, actual: u16) -> String {
    let diff = expected ^ actual;
    let mut names = Vec::new();

    for (mask, name) in [
        (CPU_FLAG_CARRY, "CF"),
        (CPU_FLAG_PARITY, "PF"),
        (CPU_FLAG_AUX_CARRY, "AF"),
        (CPU_FLAG_ZERO, "ZF"),
        (CPU_FLAG_SIGN, "SF"),
        (CPU_FLAG_TRAP, "TF"),
        (CPU_FLAG_INT_ENABLE, "IF"),
        (CPU_FLAG_DIRECTION, "DF"),
        (CPU_FLAG_OVERFLOW, "OF"),
    ] {
        if diff & mask != 0 {
            names.push(name);
        }
    }
    names.join(",")
}

/// Verify every memory cell the fixture's final state names.
pub fn validate_memory(cpu: &Intel8086, final_ram: &[[u32; 2]]) -> Result<(), Error> {
    for mem_entry in final_ram {
        if mem_entry[0] > 0xFFFFF {
            bail!("Memory address out of range: {:?}", mem_entry[0]);
        }

        let addr = mem_entry[0];
        let expected: u8 = match mem_entry[1].try_into() {
            Ok(byte) => byte,
            Err(e) => {
                bail!("Invalid memory byte value: {:?}: {}", mem_entry[1], e);
            }
        };

        let actual = match cpu.bus().peek_u8(addr) {
            Ok(byte) => byte,
            Err(e) => {
                bail!("Failed to peek mem from CPU: {}", e);
            }
        };

        if expected != actual {
            bail!(
                "Address: {:05X} Test value: {:02X} Actual value: {:02X}",
                addr,
                expected,
                actual
            );
        }
    }
    Ok(())
}

pub fn print_summary(summary: &TestResultSummary) {
    let mut keys: Vec<_> = summary.results.keys().collect();
    keys.sort();

    for key in keys {
        if let Some(result) = summary.results.get(key) {
            let filename = format!("{:?}", key);
            println!(
                "File: {:15} Passed: {:6} Failed: {:6} Reg: {:6} Mem: {:6}",
                filename.bright_blue(),
                result.passed,
                if result.failed > 0 {
                    format!("{:6}", result.failed.to_string().red())
                }
                else {
                    "0".to_string()
                },
                if result.reg_mismatch > 0 {
                    format!("{:6}", result.reg_mismatch.to_string().red())
                }
                else {
                    "0".to_string()
                },
                if result.mem_mismatch > 0 {
                    format!("{:6}", result.mem_mismatch.to_string().red())
                }
                else {
                    "0".to_string()
                },
            );
        }
    }
}
