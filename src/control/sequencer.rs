//! The control unit: phase divider, one-hot state ring, microinstruction
//! register, and control-signal fan-out.

use crate::circuit::{Circuit, WireId};
use crate::compose::{DFlipFlop, FlipFlopOptions, TFlipFlop};
use crate::error::Result;
use crate::nodes::GateKind;

use super::microcode::{
    self, common_words, ALU_OP0, ALU_OP_BITS, END, HALT, WORD_WIDTH,
};

/// Number of ring states.
pub const STATES: usize = 8;

/// The named control lanes split out of the microinstruction register.
///
/// Pulse-kind signals are already gated with the phase clock: they
/// assert only during the inactive half of each logical cycle and
/// de-assert on the other half, which satisfies the downstream
/// flip-flops' capture discipline without an explicit timer.
#[derive(Debug, Clone, Copy)]
pub struct ControlLines {
    pub pc_inc: WireId,
    pub mem_read: WireId,
    pub ir_in: WireId,
    pub reg_read: WireId,
    pub reg_write: WireId,
    pub imm_out: WireId,
    pub alu_out: WireId,
    pub mem_out: WireId,
    pub ram_write: WireId,
    /// The ALU operation field, re-merged to its own bus.
    pub alu_op: WireId,
    pub halt: WireId,
    pub end: WireId,
}

/// The microcoded control unit.
///
/// A T flip-flop divides the raw external clock by two into the phase
/// clock, so one logical cycle costs two raw clock pulses. An 8-state
/// one-hot ring of D flip-flops advances once per cycle; states S0..S6
/// drive the seven common fetch words onto the microinstruction bus
/// through per-state tri-states, and S7 drives the fetched word supplied
/// by instruction decode. The bus feeds the microinstruction register,
/// sampled once per phase edge, whose lanes split into [`ControlLines`].
///
/// The ring's advance enable drops when S7 is reached with `END` low, so
/// a multi-cycle instruction re-issues its word until the microcode
/// asserts `END`; `END` AND the wrap state re-arms the enable.
#[derive(Debug)]
pub struct ControlUnit {
    /// The divided phase clock.
    pub phase: WireId,
    /// One-hot state outputs, `states[i]` high while the ring sits in Si.
    pub states: Vec<WireId>,
    pub lines: ControlLines,
}

impl ControlUnit {
    /// Elaborate the control unit.
    ///
    /// `clock` is the raw external clock lane, `fetched` the decoded
    /// microinstruction word for the current instruction, and `reset` a
    /// lane pulsed once after elaboration to seed the ring at S0 and
    /// zero the microinstruction register.
    pub fn build(
        circuit: &mut Circuit,
        clock: WireId,
        fetched: WireId,
        reset: WireId,
    ) -> Result<Self> {
        // Phase divider.
        let always = circuit.constant("cu/high", vec![true])?;
        let divider = TFlipFlop::build(
            circuit,
            always,
            clock,
            FlipFlopOptions {
                clear: Some(reset),
                ..Default::default()
            },
        )?;
        let phase = divider.q;
        let phase_bar = divider.q_bar;

        // Ring clock, gated by the advance enable. The enable wire is
        // allocated up front; its gates close over the ring's own state
        // below.
        let advance = circuit.add_wire(1);
        let ring_clock = circuit.add_wire(1);
        let g_ring_clock =
            circuit.add_gate("cu/ring_clk", GateKind::And, vec![phase, advance], ring_clock)?;

        // The one-hot ring: Si+1 fed from Si, S0 closed from S7 below.
        // Falling-edge capture advances the ring at each phase fall,
        // half a cycle after the microinstruction register samples.
        let s0_d = circuit.add_wire(1);
        let mut states = Vec::with_capacity(STATES);
        let mut d = s0_d;
        for index in 0..STATES {
            let options = if index == 0 {
                FlipFlopOptions {
                    preset: Some(reset),
                    falling_edge: true,
                    ..Default::default()
                }
            } else {
                FlipFlopOptions {
                    clear: Some(reset),
                    falling_edge: true,
                    ..Default::default()
                }
            };
            let ff = DFlipFlop::build(circuit, d, ring_clock, options)?;
            states.push(ff.q);
            d = ff.q;
        }
        let close = circuit.add_splitter("cu/wrap", vec![states[STATES - 1]], vec![s0_d])?;
        circuit.settle([g_ring_clock, close])?;

        // The microinstruction bus and its per-state drivers.
        let bus = circuit.add_wire(WORD_WIDTH);
        let mut seeds = Vec::new();
        for (index, lanes) in common_words().into_iter().enumerate() {
            let word = circuit.constant(format!("cu/s{index}/word"), lanes)?;
            seeds.push(circuit.add_tri_state(
                format!("cu/s{index}/drive"),
                word,
                states[index],
                bus,
            )?);
        }
        seeds.push(circuit.add_tri_state(
            "cu/s7/drive",
            fetched,
            states[STATES - 1],
            bus,
        )?);
        circuit.settle(seeds)?;

        // Microinstruction register, sampled on the phase rise.
        let mir = DFlipFlop::build(
            circuit,
            bus,
            phase,
            FlipFlopOptions {
                clear: Some(reset),
                ..Default::default()
            },
        )?;

        // Split the register into individual control lanes.
        let raw: Vec<WireId> = (0..WORD_WIDTH).map(|_| circuit.add_wire(1)).collect();
        let split = circuit.add_splitter("cu/signals", vec![mir.q], raw.clone())?;
        let alu_op = circuit.add_wire(ALU_OP_BITS);
        let alu_merge = circuit.add_splitter(
            "cu/alu_op",
            raw[ALU_OP0..ALU_OP0 + ALU_OP_BITS].to_vec(),
            vec![alu_op],
        )?;
        circuit.settle([split, alu_merge])?;

        // Re-arm: END of the issued word, ANDed with the wrap state,
        // reopens the ring; below S7 the ring is always free to advance.
        let not_s7 = circuit.add_wire(1);
        let g_not_s7 = circuit.add_gate(
            "cu/not_s7",
            GateKind::Not,
            vec![states[STATES - 1]],
            not_s7,
        )?;
        let re_arm = circuit.add_wire(1);
        let g_re_arm = circuit.add_gate(
            "cu/re_arm",
            GateKind::And,
            vec![raw[END], states[STATES - 1]],
            re_arm,
        )?;
        let g_advance =
            circuit.add_gate("cu/advance", GateKind::Or, vec![not_s7, re_arm], advance)?;
        circuit.settle([g_not_s7, g_re_arm, g_advance])?;

        // Pulse signals assert during the half-cycle after the register
        // samples, so the datapath has settled before their edges.
        let pulse = |circuit: &mut Circuit, name: &str, lane: usize| -> Result<WireId> {
            let gated = circuit.add_wire(1);
            let g = circuit.add_gate(
                format!("cu/{name}"),
                GateKind::And,
                vec![raw[lane], phase_bar],
                gated,
            )?;
            circuit.settle([g])?;
            Ok(gated)
        };

        let lines = ControlLines {
            pc_inc: pulse(circuit, "pc_inc", microcode::PC_INC)?,
            ir_in: pulse(circuit, "ir_in", microcode::IR_IN)?,
            reg_write: pulse(circuit, "reg_write", microcode::REG_WRITE)?,
            ram_write: pulse(circuit, "ram_write", microcode::RAM_WRITE)?,
            mem_read: raw[microcode::MEM_READ],
            reg_read: raw[microcode::REG_READ],
            imm_out: raw[microcode::IMM_OUT],
            alu_out: raw[microcode::ALU_OUT],
            mem_out: raw[microcode::MEM_OUT],
            alu_op,
            halt: raw[HALT],
            end: raw[END],
        };

        Ok(Self {
            phase,
            states,
            lines,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{Circuit, NodeId};
    use crate::control::microcode::{word, END};

    struct Rig {
        c: Circuit,
        pclk: NodeId,
        cu: ControlUnit,
    }

    fn rig(fetched_lanes: Vec<bool>) -> Rig {
        let mut c = Circuit::new();
        let (pclk, clock) = c.add_input("clock", vec![false]);
        let (pfetched, fetched) = c.add_input("fetched", fetched_lanes);
        let (preset, reset) = c.add_input("reset", vec![false]);
        let cu = ControlUnit::build(&mut c, clock, fetched, reset).unwrap();
        c.settle([pclk, pfetched, preset]).unwrap();
        c.set_input(preset, vec![true]).unwrap();
        c.set_input(preset, vec![false]).unwrap();
        Rig { c, pclk, cu }
    }

    fn one_hot_state(rig: &Rig) -> Option<usize> {
        let mut active = None;
        for (index, &state) in rig.cu.states.iter().enumerate() {
            if rig.c.read_wire(state) == [true] {
                if active.is_some() {
                    return None;
                }
                active = Some(index);
            }
        }
        active
    }

    /// One logical cycle: two raw clock pulses.
    fn cycle(rig: &mut Rig) {
        for _ in 0..2 {
            rig.c.set_input(rig.pclk, vec![true]).unwrap();
            rig.c.set_input(rig.pclk, vec![false]).unwrap();
        }
    }

    #[test]
    fn test_ring_stays_one_hot_and_wraps() {
        let mut r = rig(word(&[END]));
        assert_eq!(one_hot_state(&r), Some(0));

        for expected in [1, 2, 3, 4, 5, 6, 7, 0] {
            cycle(&mut r);
            assert_eq!(one_hot_state(&r), Some(expected));
        }
    }

    #[test]
    fn test_ring_parks_at_s7_without_end() {
        let mut r = rig(word(&[]));
        for _ in 0..7 {
            cycle(&mut r);
        }
        assert_eq!(one_hot_state(&r), Some(7));

        // END never asserts: the ring re-issues S7 indefinitely.
        cycle(&mut r);
        assert_eq!(one_hot_state(&r), Some(7));
        cycle(&mut r);
        assert_eq!(one_hot_state(&r), Some(7));
    }

    #[test]
    fn test_phase_divides_raw_clock() {
        let mut r = rig(word(&[END]));
        assert_eq!(r.c.read_wire(r.cu.phase), &[false]);
        r.c.set_input(r.pclk, vec![true]).unwrap();
        assert_eq!(r.c.read_wire(r.cu.phase), &[true]);
        r.c.set_input(r.pclk, vec![false]).unwrap();
        assert_eq!(r.c.read_wire(r.cu.phase), &[true]);
        r.c.set_input(r.pclk, vec![true]).unwrap();
        assert_eq!(r.c.read_wire(r.cu.phase), &[false]);
    }

    #[test]
    fn test_fetch_signals_follow_the_ring() {
        let mut r = rig(word(&[END]));
        let raw_rise = |r: &mut Rig| {
            r.c.set_input(r.pclk, vec![true]).unwrap();
            r.c.set_input(r.pclk, vec![false]).unwrap();
        };

        // Rise 1: the register samples S0's word; MEM_READ is a level
        // and asserts immediately, IR_IN stays low.
        raw_rise(&mut r);
        assert_eq!(r.c.read_wire(r.cu.lines.mem_read), &[true]);
        assert_eq!(r.c.read_wire(r.cu.lines.ir_in), &[false]);

        // Rise 2: phase falls, S0 has no pulse lanes.
        raw_rise(&mut r);
        assert_eq!(r.c.read_wire(r.cu.lines.ir_in), &[false]);

        // Rise 3: the register samples S1's word.
        raw_rise(&mut r);
        assert_eq!(r.c.read_wire(r.cu.lines.mem_read), &[true]);
        assert_eq!(r.c.read_wire(r.cu.lines.ir_in), &[false]);

        // Rise 4: phase falls; IR_IN pulses during the inactive half.
        raw_rise(&mut r);
        assert_eq!(r.c.read_wire(r.cu.lines.ir_in), &[true]);

        // Rise 5: the pulse de-asserts as the next word is sampled.
        raw_rise(&mut r);
        assert_eq!(r.c.read_wire(r.cu.lines.ir_in), &[false]);
    }
}
