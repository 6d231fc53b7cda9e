//! The bitwise logic unit.

use crate::circuit::{Circuit, WireId};
use crate::error::{Result, SimError};
use crate::nodes::GateKind;

/// Operations the logic unit computes, in select-lane order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    Not = 0,
    Or = 1,
    And = 2,
    Xor = 3,
    Nand = 4,
    Nor = 5,
}

impl LogicOp {
    /// All operations, indexed by their select lane.
    pub const ALL: [LogicOp; 6] = [
        LogicOp::Not,
        LogicOp::Or,
        LogicOp::And,
        LogicOp::Xor,
        LogicOp::Nand,
        LogicOp::Nor,
    ];

    fn gate_kind(self) -> GateKind {
        match self {
            LogicOp::Not => GateKind::Not,
            LogicOp::Or => GateKind::Or,
            LogicOp::And => GateKind::And,
            LogicOp::Xor => GateKind::Xor,
            LogicOp::Nand => GateKind::Nand,
            LogicOp::Nor => GateKind::Nor,
        }
    }
}

/// Computes every bitwise operation in parallel from the same two
/// operands and tri-states exactly one result onto the shared output
/// bus, chosen by a one-hot select vector (lane order per [`LogicOp`]).
///
/// NOT applies to the first operand only. With no select lane asserted
/// the bus is relinquished and holds its last value.
#[derive(Debug, Clone, Copy)]
pub struct LogicUnit {
    pub out: WireId,
}

impl LogicUnit {
    pub fn build(circuit: &mut Circuit, a: WireId, b: WireId, select: WireId) -> Result<Self> {
        let width = circuit.wire(a).width();
        if circuit.wire(b).width() != width {
            return Err(SimError::invalid_shape(format!(
                "logic unit operands must match: {width} vs {} lanes",
                circuit.wire(b).width()
            )));
        }
        if circuit.wire(select).width() != LogicOp::ALL.len() {
            return Err(SimError::invalid_shape(format!(
                "logic unit select must have {} lanes",
                LogicOp::ALL.len()
            )));
        }

        let lines: Vec<WireId> = (0..LogicOp::ALL.len()).map(|_| circuit.add_wire(1)).collect();
        let split = circuit.add_splitter("logic/select", vec![select], lines.clone())?;
        let mut seeds = vec![split];

        let out = circuit.add_wire(width);
        for op in LogicOp::ALL {
            let kind = op.gate_kind();
            let inputs = if kind.is_unary() { vec![a] } else { vec![a, b] };
            let result = circuit.add_wire(width);
            seeds.push(circuit.add_gate(format!("logic/{kind}"), kind, inputs, result)?);
            seeds.push(circuit.add_tri_state(
                format!("logic/{kind}/out"),
                result,
                lines[op as usize],
                out,
            )?);
        }

        circuit.settle(seeds)?;
        Ok(Self { out })
    }
}
