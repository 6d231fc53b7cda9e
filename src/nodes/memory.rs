//! Memory cells: ROM and RAM over word [`Storage`].

use crate::circuit::{NodeId, WireId};
use crate::storage::Storage;

/// A read-only memory cell.
///
/// Combinational: the output wire always carries the stored word at the
/// address wire's unsigned-binary value. Addresses past the end of the
/// storage read as all-zero, matching unpopulated locations.
#[derive(Debug, Clone)]
pub struct Rom {
    pub id: NodeId,
    pub name: String,
    pub address: WireId,
    pub output: WireId,
    pub storage: Storage,
}

impl Rom {
    pub fn new(id: NodeId, name: String, address: WireId, output: WireId, storage: Storage) -> Self {
        Self {
            id,
            name,
            address,
            output,
            storage,
        }
    }
}

/// A random-access memory cell.
///
/// The read path is combinational like [`Rom`]. The write path is edge
/// triggered: the word on the data-in wire is committed to storage on the
/// falling edge of the single-lane write-enable, detected against the
/// enable value seen at the previous evaluation.
#[derive(Debug, Clone)]
pub struct Ram {
    pub id: NodeId,
    pub name: String,
    pub address: WireId,
    pub data_in: WireId,
    pub write_enable: WireId,
    pub output: WireId,
    pub storage: Storage,
    /// Write-enable level at the previous evaluation, for edge detection.
    pub we_prev: bool,
}

impl Ram {
    pub fn new(
        id: NodeId,
        name: String,
        address: WireId,
        data_in: WireId,
        write_enable: WireId,
        output: WireId,
        storage: Storage,
    ) -> Self {
        Self {
            id,
            name,
            address,
            data_in,
            write_enable,
            output,
            storage,
            we_prev: false,
        }
    }
}
