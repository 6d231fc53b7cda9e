//! Ripple-carry addition and subtraction.

use crate::circuit::{Circuit, WireId};
use crate::error::{Result, SimError};
use crate::nodes::GateKind;

/// A combined adder/subtracter over two equal-width operands.
///
/// A ripple chain of full adders processes the least significant bit
/// first. Subtraction reuses the same chain through the two's-complement
/// trick: the control lane XOR-complements every bit of the second
/// operand and doubles as the initial carry-in. The overflow flag
/// compares the carry into the most significant bit with the carry out
/// of it; a mismatch means the true signed result fell outside the
/// representable range.
#[derive(Debug, Clone, Copy)]
pub struct AddSubtract {
    /// The w-bit result, `a + b` or `a - b` mod 2^w.
    pub sum: WireId,
    /// Signed overflow flag.
    pub overflow: WireId,
    /// Carry out of the most significant bit.
    pub carry_out: WireId,
}

impl AddSubtract {
    pub fn build(
        circuit: &mut Circuit,
        a: WireId,
        b: WireId,
        subtract: WireId,
    ) -> Result<Self> {
        let width = circuit.wire(a).width();
        let b_width = circuit.wire(b).width();
        if b_width != width {
            return Err(SimError::invalid_shape(format!(
                "add/subtract operands must match: {width} vs {b_width} lanes"
            )));
        }

        let a_bits: Vec<WireId> = (0..width).map(|_| circuit.add_wire(1)).collect();
        let b_bits: Vec<WireId> = (0..width).map(|_| circuit.add_wire(1)).collect();
        let mut seeds = vec![
            circuit.add_splitter("addsub/split_a", vec![a], a_bits.clone())?,
            circuit.add_splitter("addsub/split_b", vec![b], b_bits.clone())?,
        ];

        // Carry 0 is the subtract control itself.
        let mut carries = vec![subtract];
        let mut sum_bits = Vec::with_capacity(width);
        for i in 0..width {
            let b_eff = circuit.add_wire(1);
            seeds.push(circuit.add_gate(
                format!("addsub/{i}/b_eff"),
                GateKind::Xor,
                vec![b_bits[i], subtract],
                b_eff,
            )?);

            let carry_in = carries[i];
            let propagate = circuit.add_wire(1);
            seeds.push(circuit.add_gate(
                format!("addsub/{i}/p"),
                GateKind::Xor,
                vec![a_bits[i], b_eff],
                propagate,
            )?);

            let sum = circuit.add_wire(1);
            seeds.push(circuit.add_gate(
                format!("addsub/{i}/sum"),
                GateKind::Xor,
                vec![propagate, carry_in],
                sum,
            )?);
            sum_bits.push(sum);

            let generate = circuit.add_wire(1);
            seeds.push(circuit.add_gate(
                format!("addsub/{i}/g"),
                GateKind::And,
                vec![a_bits[i], b_eff],
                generate,
            )?);
            let forward = circuit.add_wire(1);
            seeds.push(circuit.add_gate(
                format!("addsub/{i}/f"),
                GateKind::And,
                vec![propagate, carry_in],
                forward,
            )?);
            let carry_out = circuit.add_wire(1);
            seeds.push(circuit.add_gate(
                format!("addsub/{i}/c"),
                GateKind::Or,
                vec![generate, forward],
                carry_out,
            )?);
            carries.push(carry_out);
        }

        let sum = circuit.add_wire(width);
        seeds.push(circuit.add_splitter("addsub/merge", sum_bits, vec![sum])?);

        // Signed overflow: carry into the top bit vs. carry out of it.
        let overflow = circuit.add_wire(1);
        seeds.push(circuit.add_gate(
            "addsub/overflow",
            GateKind::Xor,
            vec![carries[width - 1], carries[width]],
            overflow,
        )?);

        circuit.settle(seeds)?;
        Ok(Self {
            sum,
            overflow,
            carry_out: carries[width],
        })
    }
}
