//! Circuit nodes: every evaluable element of a circuit.
//!
//! A node is one closed variant over the element kinds the kernel knows
//! how to evaluate: primitive gates, splitters/mergers, tri-state
//! buffers, stimulus/observation probes, and memory cells. Each variant
//! carries [`WireId`] handles for the wires it reads and writes, never
//! ownership. The evaluation protocol itself lives in
//! [`crate::scheduler`], which matches on this enum.

mod gates;
mod memory;
mod probes;
mod wiring;

pub use gates::{Gate, GateKind};
pub use memory::{Ram, Rom};
pub use probes::{InputProbe, OutputProbe};
pub use wiring::{Splitter, TriState};

use crate::circuit::{NodeId, WireId};

/// Any evaluable circuit element.
#[derive(Debug, Clone)]
pub enum Node {
    Gate(Gate),
    Splitter(Splitter),
    TriState(TriState),
    InputProbe(InputProbe),
    OutputProbe(OutputProbe),
    Rom(Rom),
    Ram(Ram),
}

impl Node {
    /// The node's handle in the circuit arena.
    pub fn id(&self) -> NodeId {
        match self {
            Node::Gate(g) => g.id,
            Node::Splitter(s) => s.id,
            Node::TriState(t) => t.id,
            Node::InputProbe(p) => p.id,
            Node::OutputProbe(p) => p.id,
            Node::Rom(r) => r.id,
            Node::Ram(r) => r.id,
        }
    }

    /// The node's diagnostic name.
    pub fn name(&self) -> &str {
        match self {
            Node::Gate(g) => &g.name,
            Node::Splitter(s) => &s.name,
            Node::TriState(t) => &t.name,
            Node::InputProbe(p) => &p.name,
            Node::OutputProbe(p) => &p.name,
            Node::Rom(r) => &r.name,
            Node::Ram(r) => &r.name,
        }
    }

    /// Wires this node reads during evaluation.
    pub fn reads(&self) -> Vec<WireId> {
        match self {
            Node::Gate(g) => g.inputs.clone(),
            Node::Splitter(s) => s.inputs.clone(),
            Node::TriState(t) => vec![t.input, t.enable],
            Node::InputProbe(_) => Vec::new(),
            Node::OutputProbe(p) => vec![p.wire],
            Node::Rom(r) => vec![r.address],
            Node::Ram(r) => vec![r.address, r.data_in, r.write_enable],
        }
    }

    /// Wires this node writes during evaluation.
    pub fn writes(&self) -> Vec<WireId> {
        match self {
            Node::Gate(g) => vec![g.output],
            Node::Splitter(s) => s.outputs.clone(),
            Node::TriState(t) => vec![t.output],
            Node::InputProbe(p) => vec![p.wire],
            Node::OutputProbe(_) => Vec::new(),
            Node::Rom(r) => vec![r.output],
            Node::Ram(r) => vec![r.output],
        }
    }

    /// Whether this node is a permanently bound source.
    ///
    /// Permanent sources (input probes bound at construction, splitter
    /// outputs fixed at elaboration) can never legitimately share a wire
    /// with another driver, so a conflicting commit against one is a hard
    /// fault rather than a transient-race warning.
    pub fn permanent_driver(&self) -> bool {
        matches!(self, Node::InputProbe(_) | Node::Splitter(_))
    }
}
