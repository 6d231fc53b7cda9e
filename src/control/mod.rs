//! The microcoded control unit and the CPU built around it.

pub mod microcode;

mod cpu;
mod sequencer;

pub use cpu::Cpu;
pub use sequencer::{ControlLines, ControlUnit, STATES};
