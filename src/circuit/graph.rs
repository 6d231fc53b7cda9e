//! Circuit arena: wires and nodes addressed by handle.

use crate::circuit::{NodeId, WireId};
use crate::circuit::wire::Wire;
use crate::error::{Result, SimError};
use crate::nodes::{Gate, GateKind, InputProbe, Node, OutputProbe, Ram, Rom, Splitter, TriState};
use crate::scheduler::{self, SimConfig, Worklist};
use crate::storage::Storage;

/// A complete circuit under simulation.
///
/// Wires and nodes live in arenas and refer to each other exclusively by
/// [`WireId`]/[`NodeId`] handle, so the cyclic graphs that latches and the
/// control ring require never form ownership cycles. Elements are created
/// during elaboration and persist for the life of the circuit; there is no
/// per-element teardown.
#[derive(Debug)]
pub struct Circuit {
    wires: Vec<Wire>,
    nodes: Vec<Node>,
    /// Simulation policy threaded through every drain.
    pub config: SimConfig,
}

impl Default for Circuit {
    fn default() -> Self {
        Self::new()
    }
}

impl Circuit {
    /// Create an empty circuit with default configuration.
    pub fn new() -> Self {
        Self::with_config(SimConfig::default())
    }

    /// Create an empty circuit with explicit configuration.
    pub fn with_config(config: SimConfig) -> Self {
        Self {
            wires: Vec::new(),
            nodes: Vec::new(),
            config,
        }
    }

    // ============ Arena access ============

    /// Allocate a wire of the given width, all lanes low.
    pub fn add_wire(&mut self, width: usize) -> WireId {
        let id = WireId(self.wires.len());
        self.wires.push(Wire::new(width));
        id
    }

    pub fn wire(&self, id: WireId) -> &Wire {
        &self.wires[id.0]
    }

    pub(crate) fn wire_mut(&mut self, id: WireId) -> &mut Wire {
        &mut self.wires[id.0]
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Number of nodes in the arena.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Current lane values of a wire.
    pub fn read_wire(&self, id: WireId) -> &[bool] {
        self.wires[id.0].read()
    }

    fn next_node_id(&self) -> NodeId {
        NodeId(self.nodes.len())
    }

    /// Insert a constructed node, registering one endpoint slot on every
    /// wire it reads or writes.
    fn insert(&mut self, node: Node) -> NodeId {
        let id = node.id();
        debug_assert_eq!(id, self.next_node_id());
        for w in node.reads() {
            self.wires[w.0].attach(id);
        }
        for w in node.writes() {
            self.wires[w.0].attach(id);
        }
        self.nodes.push(node);
        id
    }

    // ============ Node constructors ============

    /// Add a primitive gate. All input wires must match the output wire's
    /// width; NOT takes exactly one input, every other kind at least two.
    pub fn add_gate(
        &mut self,
        name: impl Into<String>,
        kind: GateKind,
        inputs: Vec<WireId>,
        output: WireId,
    ) -> Result<NodeId> {
        let id = self.next_node_id();
        let expected = if kind.is_unary() { 1 } else { 2 };
        if inputs.len() < expected || (kind.is_unary() && inputs.len() != 1) {
            return Err(SimError::invalid_shape(format!(
                "{kind} gate takes {} inputs, got {}",
                if kind.is_unary() { "exactly 1" } else { "2 or more" },
                inputs.len()
            )));
        }
        let width = self.wires[output.0].width();
        for &input in &inputs {
            let found = self.wires[input.0].width();
            if found != width {
                return Err(SimError::width_mismatch(id, width, found));
            }
        }
        Ok(self.insert(Node::Gate(Gate::new(id, name.into(), kind, inputs, output))))
    }

    /// Add a splitter/merger. Total input width must equal total output
    /// width, else [`SimError::IllegalMerge`].
    pub fn add_splitter(
        &mut self,
        name: impl Into<String>,
        inputs: Vec<WireId>,
        outputs: Vec<WireId>,
    ) -> Result<NodeId> {
        let id = self.next_node_id();
        let input_bits: usize = inputs.iter().map(|&w| self.wires[w.0].width()).sum();
        let output_bits: usize = outputs.iter().map(|&w| self.wires[w.0].width()).sum();
        if input_bits != output_bits {
            return Err(SimError::illegal_merge(id, input_bits, output_bits));
        }
        Ok(self.insert(Node::Splitter(Splitter::new(id, name.into(), inputs, outputs))))
    }

    /// Add a tri-state buffer. Input and output widths must match; the
    /// enable wire must be a single lane.
    pub fn add_tri_state(
        &mut self,
        name: impl Into<String>,
        input: WireId,
        enable: WireId,
        output: WireId,
    ) -> Result<NodeId> {
        let id = self.next_node_id();
        let in_width = self.wires[input.0].width();
        let out_width = self.wires[output.0].width();
        if in_width != out_width {
            return Err(SimError::width_mismatch(id, out_width, in_width));
        }
        let en_width = self.wires[enable.0].width();
        if en_width != 1 {
            return Err(SimError::width_mismatch(id, 1, en_width));
        }
        Ok(self.insert(Node::TriState(TriState::new(
            id,
            name.into(),
            input,
            enable,
            output,
        ))))
    }

    /// Add an input probe driving a freshly allocated wire. Returns the
    /// probe's node and the wire it permanently drives. The initial lanes
    /// are committed on the first settle that includes the probe.
    pub fn add_input(
        &mut self,
        name: impl Into<String>,
        lanes: Vec<bool>,
    ) -> (NodeId, WireId) {
        let wire = self.add_wire(lanes.len());
        let id = self.next_node_id();
        let node = self.insert(Node::InputProbe(InputProbe::new(id, name.into(), wire, lanes)));
        (node, wire)
    }

    /// Add an observing output probe on an existing wire.
    pub fn add_output(&mut self, name: impl Into<String>, wire: WireId) -> NodeId {
        let width = self.wires[wire.0].width();
        let id = self.next_node_id();
        self.insert(Node::OutputProbe(OutputProbe::new(id, name.into(), wire, width)))
    }

    /// Allocate a wire permanently driven with fixed lanes. The probe is
    /// settled immediately, so the wire carries its value on return.
    pub fn constant(&mut self, name: impl Into<String>, lanes: Vec<bool>) -> Result<WireId> {
        let (node, wire) = self.add_input(name, lanes);
        self.settle([node])?;
        Ok(wire)
    }

    /// Add a ROM cell reading `storage` at the address wire's value.
    pub fn add_rom(
        &mut self,
        name: impl Into<String>,
        address: WireId,
        storage: Storage,
    ) -> (NodeId, WireId) {
        let output = self.add_wire(storage.width());
        let id = self.next_node_id();
        let node = self.insert(Node::Rom(Rom::new(id, name.into(), address, output, storage)));
        (node, output)
    }

    /// Add a RAM cell. Reads are combinational; the data-in word is
    /// committed on the falling edge of the single-lane write-enable.
    pub fn add_ram(
        &mut self,
        name: impl Into<String>,
        address: WireId,
        data_in: WireId,
        write_enable: WireId,
        storage: Storage,
    ) -> Result<(NodeId, WireId)> {
        let id = self.next_node_id();
        let data_width = self.wires[data_in.0].width();
        if data_width != storage.width() {
            return Err(SimError::width_mismatch(id, storage.width(), data_width));
        }
        let en_width = self.wires[write_enable.0].width();
        if en_width != 1 {
            return Err(SimError::width_mismatch(id, 1, en_width));
        }
        let output = self.add_wire(storage.width());
        let node = self.insert(Node::Ram(Ram::new(
            id,
            name.into(),
            address,
            data_in,
            write_enable,
            output,
            storage,
        )));
        Ok((node, output))
    }

    // ============ Stimulus and observation ============

    /// Bind new lanes to an input probe and propagate to fixpoint.
    ///
    /// This is the sole external API for advancing simulated time: all
    /// state transitions happen as a consequence of a probe mutation
    /// followed by the drain.
    pub fn set_input(&mut self, probe: NodeId, lanes: Vec<bool>) -> Result<()> {
        match &mut self.nodes[probe.0] {
            Node::InputProbe(p) => {
                let expected = self.wires[p.wire.0].width();
                if lanes.len() != expected {
                    return Err(SimError::width_mismatch(probe, expected, lanes.len()));
                }
                p.lanes = lanes;
            }
            other => {
                return Err(SimError::invalid_shape(format!(
                    "{} ({}) is not an input probe",
                    other.id(),
                    other.name()
                )))
            }
        }
        self.settle([probe])?;
        Ok(())
    }

    /// Last value captured by an output probe.
    pub fn sample(&self, probe: NodeId) -> &[bool] {
        match &self.nodes[probe.0] {
            Node::OutputProbe(p) => &p.seen,
            _ => panic!("{probe} is not an output probe"),
        }
    }

    /// Borrow the storage behind a ROM or RAM node.
    pub fn storage_of(&self, node: NodeId) -> Option<&Storage> {
        match &self.nodes[node.0] {
            Node::Rom(r) => Some(&r.storage),
            Node::Ram(r) => Some(&r.storage),
            _ => None,
        }
    }

    /// Seed a worklist with the given nodes and drain it to a global
    /// fixpoint. Returns the number of node evaluations performed.
    ///
    /// Composite builders call this once over their freshly elaborated
    /// subgraph so internal wires reach a steady state before the
    /// composite's wires are exposed to the enclosing circuit.
    pub fn settle(&mut self, seeds: impl IntoIterator<Item = NodeId>) -> Result<usize> {
        let mut worklist = Worklist::new();
        for seed in seeds {
            worklist.push(seed);
        }
        scheduler::drain(self, &mut worklist)
    }

    // ============ Rewiring ============

    /// Repoint one of a gate's input slots at a different wire, keeping
    /// endpoint bookkeeping consistent on both wires.
    pub fn rewire_gate_input(&mut self, gate: NodeId, slot: usize, to: WireId) -> Result<()> {
        let (from, width) = match &self.nodes[gate.0] {
            Node::Gate(g) => {
                let from = *g.inputs.get(slot).ok_or(SimError::SelectionOutOfRange {
                    what: "gate input slot",
                    index: slot,
                    limit: g.inputs.len(),
                })?;
                (from, self.wires[g.output.0].width())
            }
            other => {
                return Err(SimError::invalid_shape(format!(
                    "{} ({}) is not a gate",
                    other.id(),
                    other.name()
                )))
            }
        };
        let found = self.wires[to.0].width();
        if found != width {
            return Err(SimError::width_mismatch(gate, width, found));
        }
        self.wires[from.0].detach(gate);
        self.wires[to.0].attach(gate);
        if let Node::Gate(g) = &mut self.nodes[gate.0] {
            g.inputs[slot] = to;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_a_one_bit_and() {
        let mut c = Circuit::new();
        let (a_probe, a) = c.add_input("a", vec![true]);
        let (b_probe, b) = c.add_input("b", vec![true]);
        let out = c.add_wire(1);
        let gate = c.add_gate("and", GateKind::And, vec![a, b], out).unwrap();
        c.settle([a_probe, b_probe, gate]).unwrap();
        assert_eq!(c.read_wire(out), &[true]);

        c.set_input(b_probe, vec![false]).unwrap();
        assert_eq!(c.read_wire(out), &[false]);
    }

    #[test]
    fn test_set_input_width_checked() {
        let mut c = Circuit::new();
        let (probe, _) = c.add_input("in", vec![false; 4]);
        let err = c.set_input(probe, vec![true; 3]).unwrap_err();
        assert!(matches!(
            err,
            SimError::WidthMismatch {
                expected: 4,
                found: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_gate_width_checked_at_elaboration() {
        let mut c = Circuit::new();
        let a = c.add_wire(2);
        let b = c.add_wire(3);
        let out = c.add_wire(2);
        let err = c.add_gate("and", GateKind::And, vec![a, b], out).unwrap_err();
        assert!(matches!(err, SimError::WidthMismatch { .. }));
    }

    #[test]
    fn test_splitter_widths_checked() {
        let mut c = Circuit::new();
        let a = c.add_wire(4);
        let lo = c.add_wire(2);
        let hi = c.add_wire(3);
        let err = c.add_splitter("split", vec![a], vec![lo, hi]).unwrap_err();
        assert!(matches!(
            err,
            SimError::IllegalMerge {
                input_bits: 4,
                output_bits: 5,
                ..
            }
        ));
    }

    #[test]
    fn test_split_merge_round_trip() {
        let mut c = Circuit::new();
        let (probe, bus) = c.add_input("bus", vec![true, false, true, true, false]);
        let lo = c.add_wire(2);
        let hi = c.add_wire(3);
        let split = c.add_splitter("split", vec![bus], vec![lo, hi]).unwrap();
        let back = c.add_wire(5);
        let merge = c.add_splitter("merge", vec![lo, hi], vec![back]).unwrap();
        c.settle([probe, split, merge]).unwrap();
        assert_eq!(c.read_wire(back), c.read_wire(bus));

        // A different partition of the same bus.
        let a = c.add_wire(1);
        let b = c.add_wire(3);
        let d = c.add_wire(1);
        let split2 = c.add_splitter("split2", vec![bus], vec![a, b, d]).unwrap();
        let back2 = c.add_wire(5);
        let merge2 = c.add_splitter("merge2", vec![a, b, d], vec![back2]).unwrap();
        c.settle([split2, merge2]).unwrap();
        assert_eq!(c.read_wire(back2), c.read_wire(bus));
    }

    #[test]
    fn test_rewire_gate_input() {
        let mut c = Circuit::new();
        let (pa, a) = c.add_input("a", vec![true]);
        let (pb, b) = c.add_input("b", vec![false]);
        let (pc_, c2) = c.add_input("c", vec![true]);
        let out = c.add_wire(1);
        let gate = c.add_gate("and", GateKind::And, vec![a, b], out).unwrap();
        c.settle([pa, pb, pc_, gate]).unwrap();
        assert_eq!(c.read_wire(out), &[false]);

        c.rewire_gate_input(gate, 1, c2).unwrap();
        c.settle([gate]).unwrap();
        assert_eq!(c.read_wire(out), &[true]);
        // The detached wire no longer re-evaluates the gate.
        assert!(!c.wire(b).neighbours(NodeId(usize::MAX)).contains(&gate));
    }

    #[test]
    fn test_output_probe_samples() {
        let mut c = Circuit::new();
        let (probe, wire) = c.add_input("in", vec![false, true]);
        let out = c.add_output("watch", wire);
        c.settle([probe]).unwrap();
        assert_eq!(c.sample(out), &[false, true]);
    }
}
