//! Level-sensitive latches built from cross-coupled NOR gates.

use crate::circuit::{Circuit, WireId};
use crate::error::Result;
use crate::nodes::GateKind;

use super::fan_out;

/// A set/reset latch: two cross-coupled NOR gates.
///
/// `S=1,R=0` sets Q high; `R=1,S=0` resets it; `S=R=0` holds the stored
/// value through the feedback loop. This is the one place a
/// combinational-looking cycle is intentional: the scheduler settles it
/// because exactly one of the two NOR outputs ends up high.
#[derive(Debug, Clone, Copy)]
pub struct SrLatch {
    pub q: WireId,
    pub q_bar: WireId,
}

impl SrLatch {
    /// Elaborate a latch over equal-width set/reset wires.
    ///
    /// The Q̄-side NOR is settled first, so a latch built with both
    /// inputs low initializes to Q low.
    pub fn build(circuit: &mut Circuit, s: WireId, r: WireId) -> Result<Self> {
        let width = circuit.wire(s).width();
        let q = circuit.add_wire(width);
        let q_bar = circuit.add_wire(width);
        let nor_q_bar = circuit.add_gate("sr/nor_qbar", GateKind::Nor, vec![s, q], q_bar)?;
        let nor_q = circuit.add_gate("sr/nor_q", GateKind::Nor, vec![r, q_bar], q)?;
        circuit.settle([nor_q_bar, nor_q])?;
        Ok(Self { q, q_bar })
    }
}

/// A D-latch: an enable-gated D/¬D pair feeding an [`SrLatch`].
///
/// While `enable` is high the output tracks `d`; while low, the NOR
/// cross-coupling holds the last value. Optional preset/clear lanes are
/// OR-ed into the set/reset paths and override the stored value
/// unconditionally while asserted, independent of the enable.
#[derive(Debug, Clone, Copy)]
pub struct DLatch {
    pub q: WireId,
    pub q_bar: WireId,
}

impl DLatch {
    /// Elaborate a plain D-latch.
    pub fn build(circuit: &mut Circuit, d: WireId, enable: WireId) -> Result<Self> {
        Self::build_with(circuit, d, enable, None, None)
    }

    /// Elaborate a D-latch with optional preset/clear override lanes.
    pub fn build_with(
        circuit: &mut Circuit,
        d: WireId,
        enable: WireId,
        preset: Option<WireId>,
        clear: Option<WireId>,
    ) -> Result<Self> {
        let width = circuit.wire(d).width();
        let enable_wide = fan_out(circuit, enable, width)?;

        let not_d = circuit.add_wire(width);
        let n0 = circuit.add_gate("dlatch/not_d", GateKind::Not, vec![d], not_d)?;

        let mut s = circuit.add_wire(width);
        let g_s = circuit.add_gate("dlatch/set", GateKind::And, vec![d, enable_wide], s)?;
        let mut r = circuit.add_wire(width);
        let g_r = circuit.add_gate("dlatch/reset", GateKind::And, vec![not_d, enable_wide], r)?;
        let mut seeds = vec![n0, g_s, g_r];

        if let Some(preset) = preset {
            let preset_wide = fan_out(circuit, preset, width)?;
            let s_or = circuit.add_wire(width);
            seeds.push(circuit.add_gate("dlatch/preset", GateKind::Or, vec![s, preset_wide], s_or)?);
            s = s_or;
        }
        if let Some(clear) = clear {
            let clear_wide = fan_out(circuit, clear, width)?;
            let r_or = circuit.add_wire(width);
            seeds.push(circuit.add_gate("dlatch/clear", GateKind::Or, vec![r, clear_wide], r_or)?);
            r = r_or;
        }

        circuit.settle(seeds)?;
        let sr = SrLatch::build(circuit, s, r)?;
        Ok(Self {
            q: sr.q,
            q_bar: sr.q_bar,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Circuit;

    #[test]
    fn test_sr_latch_set_reset_hold() {
        let mut c = Circuit::new();
        let (ps, s) = c.add_input("s", vec![false]);
        let (pr, r) = c.add_input("r", vec![false]);
        let latch = SrLatch::build(&mut c, s, r).unwrap();
        c.settle([ps, pr]).unwrap();

        c.set_input(ps, vec![true]).unwrap();
        assert_eq!(c.read_wire(latch.q), &[true]);
        assert_eq!(c.read_wire(latch.q_bar), &[false]);

        // Hold after set is released.
        c.set_input(ps, vec![false]).unwrap();
        assert_eq!(c.read_wire(latch.q), &[true]);
        assert_eq!(c.read_wire(latch.q_bar), &[false]);

        c.set_input(pr, vec![true]).unwrap();
        assert_eq!(c.read_wire(latch.q), &[false]);
        assert_eq!(c.read_wire(latch.q_bar), &[true]);

        c.set_input(pr, vec![false]).unwrap();
        assert_eq!(c.read_wire(latch.q), &[false]);
        assert_eq!(c.read_wire(latch.q_bar), &[true]);
    }

    #[test]
    fn test_scenario_b_d_latch_transparent_then_holds() {
        let mut c = Circuit::new();
        let (pd, d) = c.add_input("d", vec![false]);
        let (pe, enable) = c.add_input("enable", vec![false]);
        let latch = DLatch::build(&mut c, d, enable).unwrap();
        c.settle([pd, pe]).unwrap();

        c.set_input(pd, vec![true]).unwrap();
        c.set_input(pe, vec![true]).unwrap();
        assert_eq!(c.read_wire(latch.q), &[true]);
        assert_eq!(c.read_wire(latch.q_bar), &[false]);

        // Close the latch; D changes must not disturb Q.
        c.set_input(pe, vec![false]).unwrap();
        c.set_input(pd, vec![false]).unwrap();
        assert_eq!(c.read_wire(latch.q), &[true]);
        assert_eq!(c.read_wire(latch.q_bar), &[false]);
    }

    #[test]
    fn test_d_latch_bus_width() {
        let mut c = Circuit::new();
        let (pd, d) = c.add_input("d", vec![false; 4]);
        let (pe, enable) = c.add_input("enable", vec![true]);
        let latch = DLatch::build(&mut c, d, enable).unwrap();
        c.settle([pd, pe]).unwrap();

        c.set_input(pd, vec![true, false, true, true]).unwrap();
        assert_eq!(c.read_wire(latch.q), &[true, false, true, true]);

        c.set_input(pe, vec![false]).unwrap();
        c.set_input(pd, vec![false; 4]).unwrap();
        assert_eq!(c.read_wire(latch.q), &[true, false, true, true]);
    }

    #[test]
    fn test_preset_and_clear_override() {
        let mut c = Circuit::new();
        let (pd, d) = c.add_input("d", vec![false]);
        let (pe, enable) = c.add_input("enable", vec![false]);
        let (ppre, preset) = c.add_input("preset", vec![false]);
        let (pclr, clear) = c.add_input("clear", vec![false]);
        let latch =
            DLatch::build_with(&mut c, d, enable, Some(preset), Some(clear)).unwrap();
        c.settle([pd, pe, ppre, pclr]).unwrap();

        // Preset wins with the latch closed.
        c.set_input(ppre, vec![true]).unwrap();
        assert_eq!(c.read_wire(latch.q), &[true]);
        c.set_input(ppre, vec![false]).unwrap();
        assert_eq!(c.read_wire(latch.q), &[true]);

        c.set_input(pclr, vec![true]).unwrap();
        assert_eq!(c.read_wire(latch.q), &[false]);
        c.set_input(pclr, vec![false]).unwrap();
        assert_eq!(c.read_wire(latch.q), &[false]);
    }
}
