//! Address decoding and input selection.

use crate::circuit::{Circuit, WireId};
use crate::error::{Result, SimError};
use crate::nodes::GateKind;

use super::fan_out;

/// An n-to-2^n decoder: exactly one output line is high, the one whose
/// index matches the input's unsigned-binary value.
///
/// Each output ANDs together, for every input bit, either the bit or its
/// inversion according to that bit of the output index.
#[derive(Debug)]
pub struct Decoder {
    /// One single-lane output per index, `lines[k]` high iff input == k.
    pub lines: Vec<WireId>,
}

impl Decoder {
    pub fn build(circuit: &mut Circuit, input: WireId) -> Result<Self> {
        let n = circuit.wire(input).width();
        if n == 0 {
            return Err(SimError::invalid_shape("decoder input must be at least one bit"));
        }

        // Split the input into individual bits and invert each once.
        let bits: Vec<WireId> = (0..n).map(|_| circuit.add_wire(1)).collect();
        let split = circuit.add_splitter("dec/split", vec![input], bits.clone())?;
        let mut seeds = vec![split];
        let mut inverted = Vec::with_capacity(n);
        for (i, &bit) in bits.iter().enumerate() {
            let not_bit = circuit.add_wire(1);
            seeds.push(circuit.add_gate(
                format!("dec/not{i}"),
                GateKind::Not,
                vec![bit],
                not_bit,
            )?);
            inverted.push(not_bit);
        }

        let mut lines = Vec::with_capacity(1 << n);
        if n == 1 {
            lines.push(inverted[0]);
            lines.push(bits[0]);
        } else {
            for index in 0..1usize << n {
                let terms: Vec<WireId> = (0..n)
                    .map(|bit| {
                        if (index >> bit) & 1 == 1 {
                            bits[bit]
                        } else {
                            inverted[bit]
                        }
                    })
                    .collect();
                let line = circuit.add_wire(1);
                seeds.push(circuit.add_gate(
                    format!("dec/line{index}"),
                    GateKind::And,
                    terms,
                    line,
                )?);
                lines.push(line);
            }
        }

        circuit.settle(seeds)?;
        Ok(Self { lines })
    }
}

/// A 2^n-way multiplexer: a [`Decoder`] on the select wire masks each
/// candidate input, and the masked candidates are OR-reduced onto the
/// single output.
#[derive(Debug, Clone, Copy)]
pub struct Multiplexer {
    pub out: WireId,
}

impl Multiplexer {
    pub fn build(circuit: &mut Circuit, select: WireId, inputs: &[WireId]) -> Result<Self> {
        let n = circuit.wire(select).width();
        let expected = 1usize << n;
        if inputs.len() != expected {
            return Err(SimError::invalid_shape(format!(
                "multiplexer with {n}-bit select takes {expected} inputs, got {}",
                inputs.len()
            )));
        }
        let width = circuit.wire(inputs[0]).width();

        let decoder = Decoder::build(circuit, select)?;
        let mut seeds = Vec::new();
        let mut masked = Vec::with_capacity(inputs.len());
        for (index, (&input, &line)) in inputs.iter().zip(&decoder.lines).enumerate() {
            let line_wide = fan_out(circuit, line, width)?;
            let gated = circuit.add_wire(width);
            seeds.push(circuit.add_gate(
                format!("mux/and{index}"),
                GateKind::And,
                vec![input, line_wide],
                gated,
            )?);
            masked.push(gated);
        }

        let out = circuit.add_wire(width);
        seeds.push(circuit.add_gate("mux/or", GateKind::Or, masked, out)?);
        circuit.settle(seeds)?;
        Ok(Self { out })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{usize_to_lanes, Circuit};

    #[test]
    fn test_decoder_is_one_hot() {
        let mut c = Circuit::new();
        let (probe, input) = c.add_input("sel", vec![false; 3]);
        let dec = Decoder::build(&mut c, input).unwrap();
        c.settle([probe]).unwrap();
        assert_eq!(dec.lines.len(), 8);

        for value in 0..8 {
            c.set_input(probe, usize_to_lanes(value, 3)).unwrap();
            for (index, &line) in dec.lines.iter().enumerate() {
                assert_eq!(c.read_wire(line), &[index == value], "value {value} line {index}");
            }
        }
    }

    #[test]
    fn test_decoder_single_bit() {
        let mut c = Circuit::new();
        let (probe, input) = c.add_input("sel", vec![false]);
        let dec = Decoder::build(&mut c, input).unwrap();
        c.settle([probe]).unwrap();
        assert_eq!(c.read_wire(dec.lines[0]), &[true]);
        assert_eq!(c.read_wire(dec.lines[1]), &[false]);

        c.set_input(probe, vec![true]).unwrap();
        assert_eq!(c.read_wire(dec.lines[0]), &[false]);
        assert_eq!(c.read_wire(dec.lines[1]), &[true]);
    }

    #[test]
    fn test_multiplexer_routes_selected_input() {
        let mut c = Circuit::new();
        let (psel, select) = c.add_input("sel", vec![false; 2]);
        let mut probes = Vec::new();
        let mut inputs = Vec::new();
        for i in 0..4 {
            let (p, w) = c.add_input(format!("in{i}"), usize_to_lanes(i + 4, 4));
            probes.push(p);
            inputs.push(w);
        }
        let mux = Multiplexer::build(&mut c, select, &inputs).unwrap();
        let mut seeds = probes.clone();
        seeds.push(psel);
        c.settle(seeds).unwrap();

        for value in 0..4 {
            c.set_input(psel, usize_to_lanes(value, 2)).unwrap();
            assert_eq!(c.read_wire(mux.out), usize_to_lanes(value + 4, 4).as_slice());
        }
    }

    #[test]
    fn test_multiplexer_arity_checked() {
        let mut c = Circuit::new();
        let (_, select) = c.add_input("sel", vec![false; 2]);
        let a = c.add_wire(4);
        let b = c.add_wire(4);
        let err = Multiplexer::build(&mut c, select, &[a, b]).unwrap_err();
        assert!(matches!(err, SimError::InvalidShape { .. }));
    }
}
