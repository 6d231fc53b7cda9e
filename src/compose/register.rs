//! Storage registers and the register file.

use crate::circuit::{Circuit, WireId};
use crate::error::{Result, SimError};
use crate::nodes::GateKind;

use super::flipflop::{DFlipFlop, FlipFlopOptions};
use super::latch::DLatch;
use super::select::Decoder;

/// A single bus-attachable register: a [`DLatch`] behind a tri-state
/// output buffer.
///
/// Writing goes through the latch enable; reading asserts the read
/// enable, which drives the stored value onto the output bus without
/// disturbing it, so many registers can share one bus.
#[derive(Debug, Clone, Copy)]
pub struct Register {
    /// Stored value, readable without touching the bus.
    pub q: WireId,
}

impl Register {
    pub fn build(
        circuit: &mut Circuit,
        data: WireId,
        write: WireId,
        read: WireId,
        bus: WireId,
    ) -> Result<Self> {
        let latch = DLatch::build(circuit, data, write)?;
        let buf = circuit.add_tri_state("reg/out", latch.q, read, bus)?;
        circuit.settle([buf])?;
        Ok(Self { q: latch.q })
    }
}

/// A register file: 2^n edge-triggered registers behind one decoder.
///
/// One address port selects the register for both ports: a write strobe
/// clocks the addressed register's flip-flop on its rising edge, and the
/// read enable drives the addressed register onto the shared output bus.
/// Edge-triggered storage keeps read-modify-write paths (ALU writeback
/// into the register being read) convergent: the flip-flop captures the
/// value settled before the strobe and holds it stable afterwards.
#[derive(Debug)]
pub struct RegisterFile {
    /// Shared read bus.
    pub out: WireId,
    /// Stored word per register, for direct inspection.
    pub registers: Vec<WireId>,
}

impl RegisterFile {
    pub fn build(
        circuit: &mut Circuit,
        address: WireId,
        data: WireId,
        write: WireId,
        read: WireId,
    ) -> Result<Self> {
        let width = circuit.wire(data).width();
        if circuit.wire(address).width() == 0 {
            return Err(SimError::invalid_shape("register file needs a non-empty address"));
        }
        let decoder = Decoder::build(circuit, address)?;
        let out = circuit.add_wire(width);

        let mut registers = Vec::with_capacity(decoder.lines.len());
        for (index, &line) in decoder.lines.iter().enumerate() {
            let write_clk = circuit.add_wire(1);
            let g_w = circuit.add_gate(
                format!("rf/{index}/write"),
                GateKind::And,
                vec![line, write],
                write_clk,
            )?;
            let read_en = circuit.add_wire(1);
            let g_r = circuit.add_gate(
                format!("rf/{index}/read"),
                GateKind::And,
                vec![line, read],
                read_en,
            )?;
            circuit.settle([g_w, g_r])?;

            let ff = DFlipFlop::build(circuit, data, write_clk, FlipFlopOptions::default())?;
            let buf = circuit.add_tri_state(format!("rf/{index}/out"), ff.q, read_en, out)?;
            circuit.settle([buf])?;
            registers.push(ff.q);
        }

        Ok(Self { out, registers })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{usize_to_lanes, Circuit};

    #[test]
    fn test_register_read_does_not_disturb() {
        let mut c = Circuit::new();
        let (pd, data) = c.add_input("data", vec![false; 4]);
        let (pw, write) = c.add_input("write", vec![false]);
        let (pr, read) = c.add_input("read", vec![false]);
        let bus = c.add_wire(4);
        let reg = Register::build(&mut c, data, write, read, bus).unwrap();
        c.settle([pd, pw, pr]).unwrap();

        c.set_input(pd, vec![true, false, false, true]).unwrap();
        c.set_input(pw, vec![true]).unwrap();
        c.set_input(pw, vec![false]).unwrap();
        assert_eq!(c.read_wire(reg.q), &[true, false, false, true]);

        // Bus only carries the value while read is asserted.
        assert_eq!(c.read_wire(bus), &[false; 4]);
        c.set_input(pr, vec![true]).unwrap();
        assert_eq!(c.read_wire(bus), &[true, false, false, true]);
        c.set_input(pr, vec![false]).unwrap();
        assert_eq!(c.read_wire(reg.q), &[true, false, false, true]);
    }

    #[test]
    fn test_scenario_c_register_file() {
        let mut c = Circuit::new();
        let (paddr, address) = c.add_input("address", vec![false; 3]);
        let (pdata, data) = c.add_input("data", vec![false; 4]);
        let (pw, write) = c.add_input("write", vec![false]);
        let (pr, read) = c.add_input("read", vec![false]);
        let rf = RegisterFile::build(&mut c, address, data, write, read).unwrap();
        c.settle([paddr, pdata, pw, pr]).unwrap();
        assert_eq!(rf.registers.len(), 8);

        // Write 0b1111 to address 5.
        c.set_input(paddr, usize_to_lanes(5, 3)).unwrap();
        c.set_input(pdata, vec![true; 4]).unwrap();
        c.set_input(pw, vec![true]).unwrap();
        c.set_input(pw, vec![false]).unwrap();

        // Read back address 5.
        c.set_input(pr, vec![true]).unwrap();
        assert_eq!(c.read_wire(rf.out), &[true; 4]);

        // Address 2 is still all-zero.
        c.set_input(paddr, usize_to_lanes(2, 3)).unwrap();
        assert_eq!(c.read_wire(rf.out), &[false; 4]);

        c.set_input(pr, vec![false]).unwrap();
        assert_eq!(c.read_wire(rf.registers[5]), &[true; 4]);
    }
}
