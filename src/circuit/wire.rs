//! Wires: fixed-width buses of boolean lanes.

use crate::circuit::NodeId;

/// A fixed-width bus of boolean lanes connecting circuit nodes.
///
/// A wire tracks three things: its current data, the multiset of nodes
/// attached to it (one entry per attachment slot, so a gate with both
/// inputs tied to the same wire appears twice), and the identity of the
/// node that last committed data to it. The driver field exists purely
/// for source-consistency checking and never implies ownership.
#[derive(Debug, Clone)]
pub struct Wire {
    /// Current lane values, lane 0 least significant.
    lanes: Vec<bool>,
    /// Attached nodes, with multiplicity.
    endpoints: Vec<NodeId>,
    /// The node that last committed data, if any.
    pub(crate) driver: Option<NodeId>,
}

impl Wire {
    /// Create a wire of the given width with all lanes low.
    pub fn new(width: usize) -> Self {
        Self {
            lanes: vec![false; width],
            endpoints: Vec::new(),
            driver: None,
        }
    }

    /// The fixed lane count of this wire.
    pub fn width(&self) -> usize {
        self.lanes.len()
    }

    /// Current lane values.
    pub fn read(&self) -> &[bool] {
        &self.lanes
    }

    /// Overwrite the lane values. The caller is responsible for having
    /// width-checked `lanes` against [`Wire::width`]; the kernel performs
    /// that check in the evaluation protocol before committing.
    pub(crate) fn write(&mut self, lanes: Vec<bool>) {
        debug_assert_eq!(lanes.len(), self.lanes.len());
        self.lanes = lanes;
    }

    /// The node currently recorded as this wire's driver.
    pub fn driver(&self) -> Option<NodeId> {
        self.driver
    }

    /// Record an attachment slot for `node`.
    pub fn attach(&mut self, node: NodeId) {
        self.endpoints.push(node);
    }

    /// Remove one attachment slot for `node`, if present. Used when a node
    /// is rewired to read or write a different wire.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(pos) = self.endpoints.iter().position(|&n| n == node) {
            self.endpoints.swap_remove(pos);
        }
    }

    /// Every attached node except one occurrence of `excluding`.
    ///
    /// Multiplicity is preserved: a node attached through two slots (for
    /// example a gate with both inputs tied to this wire) appears once per
    /// remaining slot, so it is re-evaluated for each port it reads
    /// through. A node feeding its own input keeps its other occurrences
    /// and will re-enqueue itself.
    pub fn neighbours(&self, excluding: NodeId) -> Vec<NodeId> {
        let mut skipped = false;
        self.endpoints
            .iter()
            .copied()
            .filter(|&n| {
                if !skipped && n == excluding {
                    skipped = true;
                    false
                } else {
                    true
                }
            })
            .collect()
    }
}
