//! The node evaluation protocol and source-consistency checking.

use crate::circuit::{lanes_to_usize, Circuit, NodeId, WireId};
use crate::error::{render_lanes, Result, SimError};
use crate::nodes::Node;

use super::Worklist;

/// Drain the worklist to a global fixpoint.
///
/// Returns the number of node evaluations performed. A fault aborts the
/// drain immediately; wire state committed before the faulting
/// evaluation remains in place.
pub(crate) fn drain(circuit: &mut Circuit, worklist: &mut Worklist) -> Result<usize> {
    let cap = circuit.config.max_evaluations;
    let mut evaluations = 0usize;
    while let Some(id) = worklist.pop() {
        evaluations += 1;
        if evaluations > cap {
            return Err(SimError::Unconverged { evaluations });
        }
        evaluate(circuit, id, worklist)?;
    }
    Ok(evaluations)
}

/// Evaluate one node: verify sizes, compute outputs from the current
/// input wire contents, and commit each output through the consistency
/// check, enqueuing neighbours of any wire whose data changed.
fn evaluate(circuit: &mut Circuit, id: NodeId, worklist: &mut Worklist) -> Result<()> {
    sizes_match(circuit, id)?;
    tracing::trace!(node = %id, name = circuit.node(id).name(), "evaluate");

    match circuit.node(id) {
        Node::Gate(g) => {
            let inputs: Vec<Vec<bool>> = g
                .inputs
                .iter()
                .map(|&w| circuit.read_wire(w).to_vec())
                .collect();
            let output = g.output;
            let lanes = g.kind.compute(&inputs);
            commit(circuit, id, output, lanes, worklist)
        }

        Node::Splitter(s) => {
            let mut concatenated = Vec::new();
            for &input in &s.inputs {
                concatenated.extend_from_slice(circuit.read_wire(input));
            }
            let outputs = s.outputs.clone();
            let widths: Vec<usize> = outputs.iter().map(|&w| circuit.wire(w).width()).collect();
            let slices = s.compute(&concatenated, &widths);
            for (wire, lanes) in outputs.into_iter().zip(slices) {
                commit(circuit, id, wire, lanes, worklist)?;
            }
            Ok(())
        }

        Node::TriState(t) => {
            let enabled = circuit.read_wire(t.enable)[0];
            let output = t.output;
            if enabled {
                let lanes = circuit.read_wire(t.input).to_vec();
                commit(circuit, id, output, lanes, worklist)
            } else {
                relinquish(circuit, id, output, worklist);
                Ok(())
            }
        }

        Node::InputProbe(p) => {
            let wire = p.wire;
            let lanes = p.lanes.clone();
            commit(circuit, id, wire, lanes, worklist)
        }

        Node::OutputProbe(p) => {
            let wire = p.wire;
            let seen = circuit.read_wire(wire).to_vec();
            if let Node::OutputProbe(p) = circuit.node_mut(id) {
                if p.seen != seen {
                    tracing::trace!(probe = %id, name = %p.name, value = %render_lanes(&seen), "observed");
                    p.seen = seen;
                }
            }
            Ok(())
        }

        Node::Rom(r) => {
            let address = lanes_to_usize(circuit.read_wire(r.address));
            let output = r.output;
            let lanes = match r.storage.get(address) {
                Ok(word) => word.to_vec(),
                Err(_) => vec![false; r.storage.width()],
            };
            commit(circuit, id, output, lanes, worklist)
        }

        Node::Ram(r) => {
            let address = lanes_to_usize(circuit.read_wire(r.address));
            let we = circuit.read_wire(r.write_enable)[0];
            let data = circuit.read_wire(r.data_in).to_vec();
            let output = r.output;
            let falling = r.we_prev && !we;
            if let Node::Ram(r) = circuit.node_mut(id) {
                if falling {
                    r.storage.put(address, &data)?;
                }
                r.we_prev = we;
            }
            let lanes = match circuit.node(id) {
                Node::Ram(r) => match r.storage.get(address) {
                    Ok(word) => word.to_vec(),
                    Err(_) => vec![false; r.storage.width()],
                },
                _ => unreachable!(),
            };
            commit(circuit, id, output, lanes, worklist)
        }
    }
}

/// Verify a node's declared widths against the wires it is attached to.
fn sizes_match(circuit: &Circuit, id: NodeId) -> Result<()> {
    let width_of = |w: WireId| circuit.wire(w).width();
    let check = |expected: usize, found: usize| -> Result<()> {
        if expected == found {
            Ok(())
        } else {
            Err(SimError::width_mismatch(id, expected, found))
        }
    };

    match circuit.node(id) {
        Node::Gate(g) => {
            let out = width_of(g.output);
            for &input in &g.inputs {
                check(out, width_of(input))?;
            }
            Ok(())
        }
        Node::Splitter(s) => {
            let input_bits: usize = s.inputs.iter().map(|&w| width_of(w)).sum();
            let output_bits: usize = s.outputs.iter().map(|&w| width_of(w)).sum();
            if input_bits == output_bits {
                Ok(())
            } else {
                Err(SimError::illegal_merge(id, input_bits, output_bits))
            }
        }
        Node::TriState(t) => {
            check(width_of(t.output), width_of(t.input))?;
            check(1, width_of(t.enable))
        }
        Node::InputProbe(p) => check(width_of(p.wire), p.lanes.len()),
        Node::OutputProbe(p) => check(width_of(p.wire), p.seen.len()),
        Node::Rom(r) => check(r.storage.width(), width_of(r.output)),
        Node::Ram(r) => {
            check(r.storage.width(), width_of(r.data_in))?;
            check(r.storage.width(), width_of(r.output))?;
            check(1, width_of(r.write_enable))
        }
    }
}

/// Commit `lanes` to `wire` on behalf of `source`.
///
/// Applies the source-consistency protocol: an unclaimed wire or a
/// re-commit by the recorded driver is always accepted; a different node
/// offering different data is a hard fault when a permanent source is
/// involved on either side, and otherwise a logged, recoverable race.
/// In the race case the previously committed value is kept and the drain
/// continues, because exactly one combinational driver is expected to
/// remain once propagation finishes. Neighbours are enqueued only when
/// the wire's data actually changes, which is what makes fixpoint
/// termination work.
fn commit(
    circuit: &mut Circuit,
    source: NodeId,
    wire: WireId,
    lanes: Vec<bool>,
    worklist: &mut Worklist,
) -> Result<()> {
    let changed = circuit.wire(wire).read() != lanes.as_slice();

    if let Some(driver) = circuit.wire(wire).driver() {
        if driver != source && changed {
            if circuit.node(source).permanent_driver() || circuit.node(driver).permanent_driver() {
                return Err(SimError::inconsistent_drivers(
                    wire,
                    driver,
                    source,
                    circuit.wire(wire).read(),
                    &lanes,
                ));
            }
            if !circuit.config.quiet_conflicts {
                tracing::warn!(
                    wire = %wire,
                    driver = %driver,
                    contender = %source,
                    committed = %render_lanes(circuit.wire(wire).read()),
                    offered = %render_lanes(&lanes),
                    "racing combinational drivers, keeping committed value"
                );
            }
            return Ok(());
        }
    }

    if changed {
        for neighbour in circuit.wire(wire).neighbours(source) {
            worklist.push(neighbour);
        }
    }
    let w = circuit.wire_mut(wire);
    w.write(lanes);
    w.driver = Some(source);
    Ok(())
}

/// Tri-state relinquish: clear the wire's recorded driver if `source` is
/// it, leaving the data untouched so the bus holds its last value until
/// another driver takes over.
///
/// Clearing the driver re-enqueues the wire's neighbours: a contending
/// buffer whose earlier offer lost the race must re-offer now that the
/// bus is free, or the handover would depend on evaluation order.
fn relinquish(circuit: &mut Circuit, source: NodeId, wire: WireId, worklist: &mut Worklist) {
    let w = circuit.wire_mut(wire);
    if w.driver == Some(source) {
        w.driver = None;
        for neighbour in circuit.wire(wire).neighbours(source) {
            worklist.push(neighbour);
        }
    }
}
