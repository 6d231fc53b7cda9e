//! Composite circuit builders.
//!
//! A composite is a pure elaboration-time function: it allocates internal
//! wires, instantiates primitive and sequential nodes against the
//! caller's parameter wires, settles the freshly built subgraph to a
//! fixpoint, and returns a struct exposing the wires its caller may
//! observe or drive. Composites perform no simulation of their own
//! afterwards; they are ordinary subgraphs of the enclosing circuit.
//!
//! Any external circuit participates the same way: allocate wires,
//! instantiate nodes, settle, expose handles.

mod alu;
mod arith;
mod flipflop;
mod latch;
mod logic;
mod register;
mod select;

pub use alu::{Alu, AluOp};
pub use arith::AddSubtract;
pub use flipflop::{DFlipFlop, FlipFlopOptions, TFlipFlop};
pub use latch::{DLatch, SrLatch};
pub use logic::{LogicOp, LogicUnit};
pub use register::{Register, RegisterFile};
pub use select::{Decoder, Multiplexer};

use crate::circuit::{Circuit, WireId};
use crate::error::Result;

/// Broadcast a single-lane wire across `width` lanes.
///
/// Implemented as a merger reading the same wire once per output lane,
/// so lane-wise gates can combine a 1-bit enable with a full bus. For
/// width 1 the wire itself is returned.
pub(crate) fn fan_out(circuit: &mut Circuit, wire: WireId, width: usize) -> Result<WireId> {
    if width == 1 {
        return Ok(wire);
    }
    let wide = circuit.add_wire(width);
    let node = circuit.add_splitter("fan", vec![wire; width], vec![wide])?;
    circuit.settle([node])?;
    Ok(wide)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Circuit;

    #[test]
    fn test_fan_out_broadcasts() {
        let mut c = Circuit::new();
        let (probe, narrow) = c.add_input("bit", vec![true]);
        let wide = fan_out(&mut c, narrow, 4).unwrap();
        c.settle([probe]).unwrap();
        assert_eq!(c.read_wire(wide), &[true; 4]);

        c.set_input(probe, vec![false]).unwrap();
        assert_eq!(c.read_wire(wide), &[false; 4]);
    }
}
