//! Core handle types for circuit representation.

use std::fmt;

/// A unique identifier for a wire in the circuit arena.
///
/// All cross-references between wires and nodes are expressed through
/// these handles rather than owned pointers, so feedback loops (latches,
/// the control ring) never create ownership cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WireId(pub usize);

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "W{}", self.0)
    }
}

/// A unique identifier for a node (gate, splitter, buffer, probe, or
/// memory cell) in the circuit arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N{}", self.0)
    }
}

/// Interpret a lane vector as an unsigned integer, lane 0 least significant.
pub fn lanes_to_usize(lanes: &[bool]) -> usize {
    lanes
        .iter()
        .enumerate()
        .fold(0usize, |acc, (i, &b)| acc | (usize::from(b) << i))
}

/// Produce a lane vector of the given width from an unsigned integer,
/// lane 0 least significant. Bits beyond `width` are discarded.
pub fn usize_to_lanes(value: usize, width: usize) -> Vec<bool> {
    (0..width).map(|i| (value >> i) & 1 == 1).collect()
}
