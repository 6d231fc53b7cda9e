//! The demo CPU: datapath composition and the run loop.
//!
//! Program words are 16 bits wide: opcode in bits 15..12, register
//! select in bits 11..9, immediate operand in bits 7..0. The microcode
//! store maps each opcode to one control word (see
//! [`microcode::default_microcode`] for the demo instruction set). This
//! machine is a consumer of the kernel, not part of it: everything here
//! is ordinary elaboration against the public circuit API.

use crate::circuit::{lanes_to_usize, usize_to_lanes, Circuit, NodeId, WireId};
use crate::compose::{AddSubtract, Alu, AluOp, DFlipFlop, Decoder, FlipFlopOptions, RegisterFile};
use crate::error::{Result, SimError};
use crate::scheduler::SimConfig;
use crate::storage::Storage;

use super::microcode::{self, ALU_OP_BITS, WORD_WIDTH};
use super::sequencer::ControlUnit;

/// Program word width in bits.
pub const PROGRAM_WORD_WIDTH: usize = 16;
/// Register width in bits.
pub const REGISTER_WIDTH: usize = 8;
/// Program-counter width in bits.
pub const PC_WIDTH: usize = 8;
/// Data-memory size in words.
pub const DATA_WORDS: usize = 256;

/// A complete microcoded processor elaborated over one [`Circuit`].
#[derive(Debug)]
pub struct Cpu {
    circuit: Circuit,
    clock: NodeId,
    halt: NodeId,
    ram: NodeId,
    pc: WireId,
    registers: Vec<WireId>,
}

impl Cpu {
    /// Assemble a CPU around `program` with the default microcode store.
    pub fn new(program: Storage) -> Result<Self> {
        Self::with_microcode(program, microcode::default_microcode(), SimConfig::default())
    }

    /// Assemble a CPU with an explicit microcode store and configuration.
    pub fn with_microcode(
        program: Storage,
        microcode_store: Storage,
        config: SimConfig,
    ) -> Result<Self> {
        if program.width() != PROGRAM_WORD_WIDTH {
            return Err(SimError::invalid_shape(format!(
                "program words must be {PROGRAM_WORD_WIDTH} bits, got {}",
                program.width()
            )));
        }
        if microcode_store.width() != WORD_WIDTH {
            return Err(SimError::invalid_shape(format!(
                "microcode words must be {WORD_WIDTH} bits, got {}",
                microcode_store.width()
            )));
        }

        let mut c = Circuit::with_config(config);
        let (clock, clock_wire) = c.add_input("cpu/clock", vec![false]);
        let (reset, reset_wire) = c.add_input("cpu/reset", vec![false]);

        // Control unit first; the fetched-word wire is bridged from the
        // microcode store once instruction decode exists.
        let fetched = c.add_wire(WORD_WIDTH);
        let cu = ControlUnit::build(&mut c, clock_wire, fetched, reset_wire)?;

        // Instruction-address generator: the program counter plus an
        // increment-by-one path back into its data input.
        let pc_next = c.add_wire(PC_WIDTH);
        let pc = DFlipFlop::build(
            &mut c,
            pc_next,
            cu.lines.pc_inc,
            FlipFlopOptions {
                clear: Some(reset_wire),
                ..Default::default()
            },
        )?;
        let one = c.constant("cpu/one", usize_to_lanes(1, PC_WIDTH))?;
        let add_mode = c.constant("cpu/add_mode", vec![false])?;
        let incr = AddSubtract::build(&mut c, pc.q, one, add_mode)?;
        let inc_bridge = c.add_splitter("cpu/pc_next", vec![incr.sum], vec![pc_next])?;

        // Program memory onto the instruction bus.
        let (prog, prog_out) = c.add_rom("cpu/program", pc.q, program);
        let instr_bus = c.add_wire(PROGRAM_WORD_WIDTH);
        let t_prog = c.add_tri_state("cpu/mem_read", prog_out, cu.lines.mem_read, instr_bus)?;

        // Instruction register and its field split.
        let ir = DFlipFlop::build(
            &mut c,
            instr_bus,
            cu.lines.ir_in,
            FlipFlopOptions {
                clear: Some(reset_wire),
                ..Default::default()
            },
        )?;
        let imm = c.add_wire(REGISTER_WIDTH);
        let pad = c.add_wire(1);
        let reg_sel = c.add_wire(3);
        let opcode = c.add_wire(4);
        let ir_split =
            c.add_splitter("cpu/ir_fields", vec![ir.q], vec![imm, pad, reg_sel, opcode])?;

        // Instruction decode: the microcode store keyed by opcode.
        let (mc, mc_out) = c.add_rom("cpu/microcode", opcode, microcode_store);
        let mc_bridge = c.add_splitter("cpu/fetched", vec![mc_out], vec![fetched])?;
        // Memory cells are seeded here so their outputs carry word 0
        // before the first fetch; they re-evaluate only on input changes.
        c.settle([inc_bridge, t_prog, ir_split, mc_bridge, prog, mc])?;

        // Register file on the shared write bus.
        let write_bus = c.add_wire(REGISTER_WIDTH);
        let rf = RegisterFile::build(
            &mut c,
            reg_sel,
            write_bus,
            cu.lines.reg_write,
            cu.lines.reg_read,
        )?;

        // ALU over the operand bus and the immediate, with the control
        // word's operation field decoded to the one-hot select.
        let op_decoder = Decoder::build(&mut c, cu.lines.alu_op)?;
        debug_assert_eq!(op_decoder.lines.len(), 1 << ALU_OP_BITS);
        let alu_select = c.add_wire(AluOp::LANES);
        let sel_merge = c.add_splitter("cpu/alu_select", op_decoder.lines, vec![alu_select])?;
        c.settle([sel_merge])?;
        let alu = Alu::build(&mut c, rf.out, imm, alu_select)?;

        // Data memory, addressed by the immediate field.
        let (ram, ram_out) = c.add_ram(
            "cpu/data",
            imm,
            rf.out,
            cu.lines.ram_write,
            Storage::zeroed(REGISTER_WIDTH, DATA_WORDS),
        )?;

        // Write-bus drivers.
        let t_imm = c.add_tri_state("cpu/imm_out", imm, cu.lines.imm_out, write_bus)?;
        let t_alu = c.add_tri_state("cpu/alu_out", alu.out, cu.lines.alu_out, write_bus)?;
        let t_mem = c.add_tri_state("cpu/mem_out", ram_out, cu.lines.mem_out, write_bus)?;
        let halt = c.add_output("cpu/halt", cu.lines.halt);
        c.settle([ram, t_imm, t_alu, t_mem, halt])?;

        // Power-on reset: seed the ring at S0, zero the state registers.
        c.set_input(reset, vec![true])?;
        c.set_input(reset, vec![false])?;

        Ok(Self {
            circuit: c,
            clock,
            halt,
            ram,
            pc: pc.q,
            registers: rf.registers,
        })
    }

    /// Issue one raw clock pulse (rising then falling edge).
    pub fn pulse(&mut self) -> Result<()> {
        self.circuit.set_input(self.clock, vec![true])?;
        self.circuit.set_input(self.clock, vec![false])?;
        Ok(())
    }

    /// Run one logical control-unit cycle: two raw clock pulses.
    pub fn step(&mut self) -> Result<()> {
        self.pulse()?;
        self.pulse()
    }

    /// Pulse the clock until the program halts.
    ///
    /// Returns the number of raw pulses issued. A program that has not
    /// asserted its halt line within `max_pulses` is reported as
    /// [`SimError::NoHalt`].
    pub fn run(&mut self, max_pulses: usize) -> Result<usize> {
        let mut pulses = 0;
        while !self.halted() {
            if pulses >= max_pulses {
                return Err(SimError::NoHalt { pulses });
            }
            self.pulse()?;
            pulses += 1;
        }
        Ok(pulses)
    }

    /// Whether the halt control line is currently asserted.
    pub fn halted(&self) -> bool {
        self.circuit.sample(self.halt) == [true]
    }

    /// Current unsigned value of a register.
    pub fn register(&self, index: usize) -> Result<usize> {
        let wire = self
            .registers
            .get(index)
            .ok_or(SimError::SelectionOutOfRange {
                what: "register",
                index,
                limit: self.registers.len(),
            })?;
        Ok(lanes_to_usize(self.circuit.read_wire(*wire)))
    }

    /// Current program-counter value.
    pub fn pc(&self) -> usize {
        lanes_to_usize(self.circuit.read_wire(self.pc))
    }

    /// The data memory contents.
    pub fn data_memory(&self) -> &Storage {
        self.circuit.storage_of(self.ram).expect("ram node")
    }

    /// The underlying circuit, for probing and tracing.
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Assemble a program from (opcode, register, immediate) triples.
    fn assemble(instructions: &[(usize, usize, usize)]) -> Storage {
        let mut store = Storage::zeroed(PROGRAM_WORD_WIDTH, instructions.len());
        for (address, &(op, reg, imm)) in instructions.iter().enumerate() {
            let mut lanes = usize_to_lanes(imm, PROGRAM_WORD_WIDTH);
            for bit in 0..3 {
                lanes[9 + bit] = (reg >> bit) & 1 == 1;
            }
            for bit in 0..4 {
                lanes[12 + bit] = (op >> bit) & 1 == 1;
            }
            store.put(address, &lanes).unwrap();
        }
        store
    }

    #[test]
    fn test_scenario_d_load_then_add_immediate() {
        let program = assemble(&[
            (microcode::opcode::LDI, 0, 5),
            (microcode::opcode::ADDI, 0, 3),
            (microcode::opcode::HLT, 0, 0),
        ]);
        let mut cpu = Cpu::new(program).unwrap();
        let pulses = cpu.run(128).unwrap();
        assert!(cpu.halted());
        assert_eq!(cpu.register(0).unwrap(), 8);
        // Three instructions at eight two-pulse cycles each.
        assert!(pulses <= 48, "took {pulses} pulses");
    }

    #[test]
    fn test_registers_are_independent() {
        let program = assemble(&[
            (microcode::opcode::LDI, 0, 11),
            (microcode::opcode::LDI, 3, 22),
            (microcode::opcode::SUBI, 3, 2),
            (microcode::opcode::HLT, 0, 0),
        ]);
        let mut cpu = Cpu::new(program).unwrap();
        cpu.run(128).unwrap();
        assert_eq!(cpu.register(0).unwrap(), 11);
        assert_eq!(cpu.register(3).unwrap(), 20);
        assert_eq!(cpu.register(1).unwrap(), 0);
    }

    #[test]
    fn test_store_and_load_round_trip_through_data_memory() {
        let program = assemble(&[
            (microcode::opcode::LDI, 1, 42),
            (microcode::opcode::STORE, 1, 7),
            (microcode::opcode::LOAD, 2, 7),
            (microcode::opcode::HLT, 0, 0),
        ]);
        let mut cpu = Cpu::new(program).unwrap();
        cpu.run(192).unwrap();
        assert_eq!(cpu.register(2).unwrap(), 42);
        assert_eq!(
            lanes_to_usize(cpu.data_memory().get(7).unwrap()),
            42
        );
    }

    #[test]
    fn test_program_width_checked() {
        let err = Cpu::new(Storage::zeroed(8, 4)).unwrap_err();
        assert!(matches!(err, SimError::InvalidShape { .. }));
    }

    #[test]
    fn test_pc_advances_once_per_instruction() {
        let program = assemble(&[
            (microcode::opcode::LDI, 0, 1),
            (microcode::opcode::HLT, 0, 0),
        ]);
        let mut cpu = Cpu::new(program).unwrap();
        assert_eq!(cpu.pc(), 0);
        // One full instruction: eight cycles.
        for _ in 0..8 {
            cpu.step().unwrap();
        }
        assert_eq!(cpu.pc(), 1);
    }
}
