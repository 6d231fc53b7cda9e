//! The arithmetic-logic unit.

use crate::circuit::{Circuit, WireId};
use crate::error::{Result, SimError};
use crate::nodes::GateKind;

use super::arith::AddSubtract;
use super::logic::{LogicOp, LogicUnit};

/// ALU operations, in select-lane order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Add = 0,
    Subtract = 1,
    Not = 2,
    Or = 3,
    And = 4,
    Xor = 5,
    Nand = 6,
    Nor = 7,
}

impl AluOp {
    /// Number of select lanes.
    pub const LANES: usize = 8;

    /// One-hot select lanes for this operation.
    pub fn one_hot(self) -> Vec<bool> {
        let mut lanes = vec![false; Self::LANES];
        lanes[self as usize] = true;
        lanes
    }
}

/// An ALU: an [`AddSubtract`] chain and a [`LogicUnit`] sharing one
/// result bus behind an 8-lane one-hot operation select.
///
/// Lane 0 selects addition, lane 1 subtraction (which also seeds the
/// adder's carry-in), lanes 2..8 select the logic operations in
/// [`LogicOp`] order. The overflow flag is meaningful for the
/// arithmetic operations only.
#[derive(Debug, Clone, Copy)]
pub struct Alu {
    pub out: WireId,
    pub overflow: WireId,
}

impl Alu {
    pub fn build(circuit: &mut Circuit, a: WireId, b: WireId, select: WireId) -> Result<Self> {
        if circuit.wire(select).width() != AluOp::LANES {
            return Err(SimError::invalid_shape(format!(
                "ALU select must have {} lanes",
                AluOp::LANES
            )));
        }
        let width = circuit.wire(a).width();

        let lines: Vec<WireId> = (0..AluOp::LANES).map(|_| circuit.add_wire(1)).collect();
        let split = circuit.add_splitter("alu/select", vec![select], lines.clone())?;

        // Arithmetic side: subtract's select lane is also the mode control.
        let arithmetic = circuit.add_wire(1);
        let g_arith = circuit.add_gate(
            "alu/arith",
            GateKind::Or,
            vec![lines[AluOp::Add as usize], lines[AluOp::Subtract as usize]],
            arithmetic,
        )?;
        circuit.settle([split, g_arith])?;

        let adder = AddSubtract::build(circuit, a, b, lines[AluOp::Subtract as usize])?;

        let out = circuit.add_wire(width);
        let t_sum = circuit.add_tri_state("alu/sum", adder.sum, arithmetic, out)?;

        // Logic side: re-merge its six select lanes and bridge its bus in.
        let logic_select = circuit.add_wire(LogicOp::ALL.len());
        let merge = circuit.add_splitter(
            "alu/logic_select",
            lines[2..].to_vec(),
            vec![logic_select],
        )?;
        let any_logic = circuit.add_wire(1);
        let g_logic = circuit.add_gate("alu/logic", GateKind::Or, lines[2..].to_vec(), any_logic)?;
        circuit.settle([merge, g_logic])?;

        let logic = LogicUnit::build(circuit, a, b, logic_select)?;
        let t_logic = circuit.add_tri_state("alu/logic_out", logic.out, any_logic, out)?;
        circuit.settle([t_sum, t_logic])?;

        Ok(Self {
            out,
            overflow: adder.overflow,
        })
    }
}
