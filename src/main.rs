//! Gatework - gate-level CPU simulator
//!
//! Loads a program (and optionally a microcode store) from word files,
//! runs the simulated CPU to its halt instruction, and prints the final
//! machine state.
//!
//! # Usage
//!
//! ```bash
//! gatework program.bin --max-pulses 4096
//! ```

use std::io;
use std::path::PathBuf;

use clap::Parser;
use gatework::control::microcode;
use gatework::error::Result;
use gatework::{Cpu, SimConfig, Storage};
use tracing_subscriber::prelude::*;

/// Gate-level CPU simulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the program word file
    #[arg(value_name = "PROGRAM_FILE")]
    program: PathBuf,

    /// Path to a microcode word file (defaults to the built-in store)
    #[arg(short, long)]
    microcode: Option<PathBuf>,

    /// Maximum raw clock pulses before giving up
    #[arg(long, default_value_t = 4096)]
    max_pulses: usize,

    /// Suppress transient bus-conflict warnings
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let stderr_format = tracing_subscriber::fmt::layer().with_writer(io::stderr);
    tracing_subscriber::registry().with(stderr_format).init();

    let args = Args::parse();

    let program = Storage::read(&args.program)?;
    let microcode_store = match &args.microcode {
        Some(path) => Storage::read(path)?,
        None => microcode::default_microcode(),
    };
    let config = SimConfig::new().with_quiet_conflicts(args.quiet);

    let mut cpu = Cpu::with_microcode(program, microcode_store, config)?;
    let pulses = cpu.run(args.max_pulses)?;

    println!("halted after {pulses} clock pulses, pc = {}", cpu.pc());
    for index in 0..8 {
        println!("r{index} = {}", cpu.register(index)?);
    }
    Ok(())
}
