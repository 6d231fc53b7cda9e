//! Bus plumbing nodes: splitters/mergers and tri-state buffers.

use crate::circuit::{NodeId, WireId};

/// A splitter/merger: concatenates its input wires (lane 0 of the first
/// input is least significant) and re-slices the combined lanes across
/// its output wires.
///
/// A single input fanned into several outputs splits a bus; several
/// inputs into a single output merges one. Total input width must equal
/// total output width, checked at construction. Splitter outputs are
/// fixed at elaboration time, so they are permanent drivers: a conflicting
/// commit to one of their output wires is a hard fault.
#[derive(Debug, Clone)]
pub struct Splitter {
    pub id: NodeId,
    pub name: String,
    pub inputs: Vec<WireId>,
    pub outputs: Vec<WireId>,
}

impl Splitter {
    pub fn new(id: NodeId, name: String, inputs: Vec<WireId>, outputs: Vec<WireId>) -> Self {
        Self {
            id,
            name,
            inputs,
            outputs,
        }
    }

    /// Slice concatenated input lanes into per-output lane vectors.
    pub fn compute(&self, concatenated: &[bool], output_widths: &[usize]) -> Vec<Vec<bool>> {
        let mut offset = 0;
        output_widths
            .iter()
            .map(|&w| {
                let slice = concatenated[offset..offset + w].to_vec();
                offset += w;
                slice
            })
            .collect()
    }
}

/// A tri-state buffer: drives its input through to its output while the
/// single-lane enable is high, and electrically relinquishes the output
/// while low.
///
/// Relinquishing clears the output wire's recorded driver if this buffer
/// was it, so that another driver can take the bus without tripping the
/// consistency check. The wire keeps its last committed data either way.
#[derive(Debug, Clone)]
pub struct TriState {
    pub id: NodeId,
    pub name: String,
    pub input: WireId,
    pub enable: WireId,
    pub output: WireId,
}

impl TriState {
    pub fn new(id: NodeId, name: String, input: WireId, enable: WireId, output: WireId) -> Self {
        Self {
            id,
            name,
            input,
            enable,
            output,
        }
    }
}
