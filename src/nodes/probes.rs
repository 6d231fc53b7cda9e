//! Stimulus and observation probes.
//!
//! Probes are the only crossing point between external code and the
//! simulated circuit: an [`InputProbe`] injects lanes bound from outside,
//! an [`OutputProbe`] snapshots a wire for external reading. Setting an
//! input probe's data and draining the scheduler is the sole way
//! simulated time advances.

use crate::circuit::{NodeId, WireId};

/// An externally driven source bound to one wire at construction.
///
/// The probe is a permanent driver: any other node committing different
/// data to its wire is a hard consistency fault.
#[derive(Debug, Clone)]
pub struct InputProbe {
    pub id: NodeId,
    pub name: String,
    pub wire: WireId,
    /// Lanes most recently bound from outside the circuit.
    pub lanes: Vec<bool>,
}

impl InputProbe {
    pub fn new(id: NodeId, name: String, wire: WireId, lanes: Vec<bool>) -> Self {
        Self {
            id,
            name,
            wire,
            lanes,
        }
    }
}

/// An observing sink attached to one wire.
///
/// Drives nothing; each evaluation snapshots the wire so external code
/// can read a settled value without touching the wire arena.
#[derive(Debug, Clone)]
pub struct OutputProbe {
    pub id: NodeId,
    pub name: String,
    pub wire: WireId,
    /// Last value seen at evaluation time.
    pub seen: Vec<bool>,
}

impl OutputProbe {
    pub fn new(id: NodeId, name: String, wire: WireId, width: usize) -> Self {
        Self {
            id,
            name,
            wire,
            seen: vec![false; width],
        }
    }
}
