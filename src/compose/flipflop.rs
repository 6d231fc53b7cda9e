//! Edge-triggered flip-flops built from paired D-latches.

use crate::circuit::{Circuit, WireId};
use crate::error::Result;
use crate::nodes::GateKind;

use super::latch::DLatch;

/// Build options for [`DFlipFlop`] and [`TFlipFlop`].
///
/// One options struct with defaults instead of a spread of convenience
/// constructors; callers override only what they need.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlipFlopOptions {
    /// Synchronous preset: forces Q high while asserted.
    pub preset: Option<WireId>,
    /// Synchronous clear: forces Q low while asserted.
    pub clear: Option<WireId>,
    /// Capture on the falling clock edge instead of the rising one.
    pub falling_edge: bool,
}

/// A D flip-flop: a master latch enabled on one clock phase feeding a
/// slave latch enabled on the other.
///
/// The internally generated master enable is the inverted clock, which
/// is what turns two level-sensitive latches into edge capture: while
/// the clock is low the master tracks D and the slave holds; the rising
/// edge closes the master and opens the slave, so Q takes the value D
/// held just before the edge and feedback through downstream logic
/// cannot shoot through. `falling_edge` swaps which phase each stage is
/// open on. Preset/clear are forwarded into both stages so they override
/// the stored value regardless of the clock level.
#[derive(Debug, Clone, Copy)]
pub struct DFlipFlop {
    pub q: WireId,
    pub q_bar: WireId,
}

impl DFlipFlop {
    /// Elaborate a flip-flop capturing `d` on the active edge of `clock`.
    pub fn build(
        circuit: &mut Circuit,
        d: WireId,
        clock: WireId,
        options: FlipFlopOptions,
    ) -> Result<Self> {
        let not_clock = circuit.add_wire(1);
        let inv = circuit.add_gate("dff/not_clk", GateKind::Not, vec![clock], not_clock)?;
        circuit.settle([inv])?;

        let (master_en, slave_en) = if options.falling_edge {
            (clock, not_clock)
        } else {
            (not_clock, clock)
        };

        let master =
            DLatch::build_with(circuit, d, master_en, options.preset, options.clear)?;
        let slave =
            DLatch::build_with(circuit, master.q, slave_en, options.preset, options.clear)?;
        Ok(Self {
            q: slave.q,
            q_bar: slave.q_bar,
        })
    }
}

/// A T flip-flop: a [`DFlipFlop`] whose data input is
/// `(T ∧ ¬Q) ∨ (¬T ∧ Q)`, so Q toggles on every active clock edge while
/// T is held high. With T tied high this is the divide-by-two stage the
/// control unit derives its phase clock from.
#[derive(Debug, Clone, Copy)]
pub struct TFlipFlop {
    pub q: WireId,
    pub q_bar: WireId,
}

impl TFlipFlop {
    pub fn build(
        circuit: &mut Circuit,
        t: WireId,
        clock: WireId,
        options: FlipFlopOptions,
    ) -> Result<Self> {
        let d = circuit.add_wire(1);
        let ff = DFlipFlop::build(circuit, d, clock, options)?;

        let not_t = circuit.add_wire(1);
        let n_t = circuit.add_gate("tff/not_t", GateKind::Not, vec![t], not_t)?;
        let toggle = circuit.add_wire(1);
        let g_t = circuit.add_gate("tff/toggle", GateKind::And, vec![t, ff.q_bar], toggle)?;
        let keep = circuit.add_wire(1);
        let g_k = circuit.add_gate("tff/keep", GateKind::And, vec![not_t, ff.q], keep)?;
        let g_d = circuit.add_gate("tff/next", GateKind::Or, vec![toggle, keep], d)?;
        circuit.settle([n_t, g_t, g_k, g_d])?;

        Ok(Self {
            q: ff.q,
            q_bar: ff.q_bar,
        })
    }
}
