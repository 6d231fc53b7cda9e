//! Circuit representation: the wire/node arena.
//!
//! This module provides the kernel's data model. A [`Circuit`] owns every
//! [`Wire`] and node in arena vectors; all cross-references are integer
//! handles ([`WireId`], [`NodeId`]), which keeps the deliberately cyclic
//! graphs of latches and the control ring free of ownership cycles.

mod graph;
mod types;
mod wire;

pub use graph::Circuit;
pub use types::{lanes_to_usize, usize_to_lanes, NodeId, WireId};
pub use wire::Wire;
