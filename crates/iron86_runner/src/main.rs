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

    main.rs - Conformance test runner: seed, single-step, validate.

*/

mod common;

use std::{
    fs::read_dir,
    path::PathBuf,
    process::ExitCode,
    time::Instant,
};

use bpaf::Bpaf;
use colored::Colorize;

use iron86_core::{
    cpu_8086::Intel8086,
    cpu_common::Register16,
};

use crate::common::{
    opcode_from_path,
    print_summary,
    read_tests_from_file,
    validate_memory,
    validate_registers,
    CpuTest,
    TestResult,
    TestResultSummary,
};

#[derive(Debug, Clone, Bpaf)]
#[bpaf(options, version)]
struct Options {
    /// Run only the Nth batch of fixture files
    #[bpaf(short, long)]
    batch: Option<usize>,

    /// Number of fixture files per batch
    #[bpaf(long, fallback(10))]
    batch_size: usize,

    /// Stop at the first failing fixture file
    #[bpaf(long)]
    stop_on_failure: bool,

    /// Print each failing case
    #[bpaf(short, long)]
    verbose: bool,

    /// Fixture file or directory of per-opcode fixture files
    #[bpaf(positional("PATH"))]
    path: PathBuf,
}

fn main() -> ExitCode {
    env_logger::init();
    let opts = options().run();

    let mut files = match collect_fixture_files(&opts.path) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    files.sort();

    if let Some(batch) = opts.batch {
        let start = batch * opts.batch_size;
        if start >= files.len() {
            eprintln!("Batch {} is beyond available files", batch);
            return ExitCode::FAILURE;
        }
        let end = usize::min(start + opts.batch_size, files.len());
        files = files[start..end].to_vec();
    }

    println!("Found {} fixture file(s)", files.len());

    let mut summary = TestResultSummary {
        results: Default::default(),
    };
    let mut cpu = Intel8086::new();
    let suite_start = Instant::now();
    let mut any_failed = false;

    for path in files {
        let Some(tests) = read_tests_from_file(&path) else {
            eprintln!("Failed to parse fixture file: {:?}. Skipping...", path);
            any_failed = true;
            continue;
        };

        if let Some(opcode) = opcode_from_path(&path) {
            log::debug!("Running {} tests for opcode {:02X}", tests.len(), opcode);
        }

        let result = run_tests(&mut cpu, &tests, opts.verbose);

        println!(
            "{:40} {}/{} passed in {:.2}s",
            path.file_name().map(|f| f.to_string_lossy().to_string()).unwrap_or_default(),
            result.passed,
            tests.len(),
            result.duration.as_secs_f32()
        );

        let failed = result.failed > 0;
        any_failed |= failed;
        summary
            .results
            .insert(path.file_name().map(|f| f.to_os_string()).unwrap_or_default(), result);

        if failed && opts.stop_on_failure {
            break;
        }
    }

    println!();
    print_summary(&summary);
    println!("Completed in: {:.2} seconds", suite_start.elapsed().as_secs_f32());

    if any_failed {
        println!("{}", "FAILED".red());
        ExitCode::FAILURE
    }
    else {
        println!("{}", "PASSED".green());
        ExitCode::SUCCESS
    }
}

fn collect_fixture_files(path: &PathBuf) -> Result<Vec<PathBuf>, String> {
    if path.is_dir() {
        let entries = read_dir(path).map_err(|e| format!("Error reading directory: {}", e))?;
        let mut files = Vec::new();
        for entry in entries.flatten() {
            let entry_path = entry.path();
            if let Some(extension) = entry_path.extension() {
                if extension.eq_ignore_ascii_case("json") || extension.eq_ignore_ascii_case("gz") {
                    files.push(entry_path);
                }
            }
        }
        Ok(files)
    }
    else if path.is_file() {
        Ok(vec![path.clone()])
    }
    else {
        Err(format!("No such file or directory: {:?}", path))
    }
}

fn run_tests(cpu: &mut Intel8086, tests: &[CpuTest], verbose: bool) -> TestResult {
    let mut result = TestResult::default();
    let start = Instant::now();

    for (n, test) in tests.iter().enumerate() {
        cpu.reset();
        seed_initial_state(cpu, test);

        // Advance by exactly one instruction. Halts and aborts are legal
        // outcomes; the state comparison below is the verdict.
        let outcome = cpu.step();
        log::trace!("{}| {}: {:?}", n, test.name, outcome);

        let regs = cpu.get_register_state();
        let mismatches =
            validate_registers(&test.initial_state.regs, &test.final_state.regs, &regs);

        let mut passed = mismatches.is_empty();
        if !passed {
            result.reg_mismatch += 1;
            if verbose {
                println!("{}| {}: {}", n, test.name.red(), mismatches.join("; "));
            }
        }

        if let Err(e) = validate_memory(cpu, &test.final_state.ram) {
            result.mem_mismatch += 1;
            if verbose {
                println!("{}| {}: {}", n, test.name.red(), e);
            }
            passed = false;
        }

        if passed {
            result.passed += 1;
        }
        else {
            result.failed += 1;
        }
    }

    result.duration = start.elapsed();
    result
}

/// Seed CPU state from a fixture's initial block. The instruction bytes
/// land at CS:IP first; the ram list then takes precedence where the two
/// overlap.
fn seed_initial_state(cpu: &mut Intel8086, test: &CpuTest) {
    let regs = &test.initial_state.regs;

    cpu.set_register16(Register16::AX, regs.ax.unwrap_or(0));
    cpu.set_register16(Register16::BX, regs.bx.unwrap_or(0));
    cpu.set_register16(Register16::CX, regs.cx.unwrap_or(0));
    cpu.set_register16(Register16::DX, regs.dx.unwrap_or(0));
    cpu.set_register16(Register16::CS, regs.cs.unwrap_or(0));
    cpu.set_register16(Register16::SS, regs.ss.unwrap_or(0));
    cpu.set_register16(Register16::DS, regs.ds.unwrap_or(0));
    cpu.set_register16(Register16::ES, regs.es.unwrap_or(0));
    cpu.set_register16(Register16::SP, regs.sp.unwrap_or(0));
    cpu.set_register16(Register16::BP, regs.bp.unwrap_or(0));
    cpu.set_register16(Register16::SI, regs.si.unwrap_or(0));
    cpu.set_register16(Register16::DI, regs.di.unwrap_or(0));
    cpu.set_register16(Register16::IP, regs.ip.unwrap_or(0));
    cpu.set_flags(regs.flags.unwrap_or(0));

    let code_base = Intel8086::calc_linear_address(regs.cs.unwrap_or(0), regs.ip.unwrap_or(0));
    for (i, byte) in test.bytes.iter().enumerate() {
        let addr = code_base.wrapping_add(i as u32) & 0xFFFFF;
        cpu.bus_mut().write_u8(addr, *byte);
    }

    for mem_entry in &test.initial_state.ram {
        cpu.bus_mut().write_u8(mem_entry[0], mem_entry[1] as u8);
    }
}
