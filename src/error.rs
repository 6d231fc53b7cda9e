//! Error types for the gatework simulator.
//!
//! This module provides a unified error type [`SimError`] that covers
//! all error conditions that can occur during circuit elaboration,
//! fixpoint propagation, and persisted-word storage access.

use thiserror::Error;

use crate::circuit::{NodeId, WireId};

/// Result type alias using [`SimError`].
pub type Result<T> = std::result::Result<T, SimError>;

/// Unified error type for all gatework operations.
#[derive(Error, Debug)]
pub enum SimError {
    // ============ Kernel Errors ============
    /// A node's declared width disagrees with an attached wire, or an
    /// external caller supplied data of the wrong length.
    #[error("Width mismatch at {node}: expected {expected} lanes, found {found}")]
    WidthMismatch {
        node: NodeId,
        expected: usize,
        found: usize,
    },

    /// Two distinct nodes claim to permanently drive the same wire with
    /// differing data.
    #[error(
        "Inconsistent drivers on {wire}: {driver} committed {committed}, {contender} offered {offered}"
    )]
    InconsistentDrivers {
        wire: WireId,
        driver: NodeId,
        contender: NodeId,
        committed: String,
        offered: String,
    },

    /// A splitter's total input bit-width does not equal its total
    /// output bit-width.
    #[error("Illegal merge at {node}: {input_bits} input bits into {output_bits} output bits")]
    IllegalMerge {
        node: NodeId,
        input_bits: usize,
        output_bits: usize,
    },

    /// A propagation drain exceeded the evaluation cap without reaching
    /// a fixpoint (combinational oscillation).
    #[error("Propagation did not converge after {evaluations} node evaluations")]
    Unconverged { evaluations: usize },

    // ============ Elaboration Errors ============
    /// A builder parameter referenced a lane outside the wire it selects
    /// from (register index, decoder output, op-select line).
    #[error("Selection out of range for {what}: index {index}, only {limit} available")]
    SelectionOutOfRange {
        what: &'static str,
        index: usize,
        limit: usize,
    },

    /// A builder was asked for a zero-width or otherwise degenerate shape.
    #[error("Invalid circuit shape: {message}")]
    InvalidShape { message: String },

    /// A program ran through its clock-pulse budget without asserting
    /// the halt line.
    #[error("Program did not halt within {pulses} clock pulses")]
    NoHalt { pulses: usize },

    // ============ Storage Errors ============
    /// A word address fell outside the storage array.
    #[error("Address {address} out of range for storage of {words} words")]
    BadAddress { address: usize, words: usize },

    /// Persisted storage rows of unequal width encountered on load.
    #[error("Word size mismatch at line {line}: expected {expected} bits, found {found}")]
    WordSizeMismatch {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// A storage row contained something other than '0' or '1'.
    #[error("Bad word at line {line}, column {column}: expected '0' or '1'")]
    BadWord { line: usize, column: usize },

    // ============ I/O Errors ============
    /// Error reading a storage file.
    #[error("Failed to read storage file '{path}': {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Error writing a storage file.
    #[error("Failed to write storage file '{path}': {source}")]
    FileWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl SimError {
    /// Create a width-mismatch error.
    pub fn width_mismatch(node: NodeId, expected: usize, found: usize) -> Self {
        Self::WidthMismatch {
            node,
            expected,
            found,
        }
    }

    /// Create an inconsistent-drivers error, rendering both sides' lanes.
    pub fn inconsistent_drivers(
        wire: WireId,
        driver: NodeId,
        contender: NodeId,
        committed: &[bool],
        offered: &[bool],
    ) -> Self {
        Self::InconsistentDrivers {
            wire,
            driver,
            contender,
            committed: render_lanes(committed),
            offered: render_lanes(offered),
        }
    }

    /// Create an illegal-merge error.
    pub fn illegal_merge(node: NodeId, input_bits: usize, output_bits: usize) -> Self {
        Self::IllegalMerge {
            node,
            input_bits,
            output_bits,
        }
    }

    /// Create an invalid-shape error.
    pub fn invalid_shape(message: impl Into<String>) -> Self {
        Self::InvalidShape {
            message: message.into(),
        }
    }
}

/// Render a lane vector as a binary string, most significant lane first.
pub(crate) fn render_lanes(lanes: &[bool]) -> String {
    lanes
        .iter()
        .rev()
        .map(|&b| if b { '1' } else { '0' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_lanes_msb_first() {
        // Lane 0 is the least significant bit.
        assert_eq!(render_lanes(&[true, false, false]), "001");
        assert_eq!(render_lanes(&[false, true, true]), "110");
    }

    #[test]
    fn test_inconsistent_drivers_display() {
        let err = SimError::inconsistent_drivers(
            WireId(3),
            NodeId(1),
            NodeId(2),
            &[true, false],
            &[false, true],
        );
        let msg = err.to_string();
        assert!(msg.contains("W3"));
        assert!(msg.contains("N1"));
        assert!(msg.contains("N2"));
        assert!(msg.contains("01"));
        assert!(msg.contains("10"));
    }
}
