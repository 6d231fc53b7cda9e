//! Microinstruction word layout and the common fetch sequence.
//!
//! A microinstruction is one fixed-width control word. Lane assignments:
//!
//! | Lane  | Signal      | Kind  | Effect                                      |
//! |-------|-------------|-------|---------------------------------------------|
//! | 0     | `PC_INC`    | pulse | advance the program counter                 |
//! | 1     | `MEM_READ`  | level | program memory drives the instruction bus   |
//! | 2     | `IR_IN`     | pulse | instruction register captures the bus       |
//! | 3     | `REG_READ`  | level | register file drives the operand bus        |
//! | 4     | `REG_WRITE` | pulse | addressed register captures the write bus   |
//! | 5     | `IMM_OUT`   | level | immediate field drives the write bus        |
//! | 6     | `ALU_OUT`   | level | ALU result drives the write bus             |
//! | 7     | `MEM_OUT`   | level | data memory drives the write bus            |
//! | 8     | `RAM_WRITE` | pulse | data memory commits the operand bus         |
//! | 9-11  | `ALU_OP`    | field | ALU operation, decoded to one-hot           |
//! | 12    | `HALT`      | level | stop the run loop                           |
//! | 13    | `END`       | level | instruction finished, re-arm the ring       |
//!
//! States S0..S6 issue fixed "common" words implementing fetch: drive
//! program memory, capture the instruction register, advance the program
//! counter, then settle. S7 issues the fetched word selected by the
//! instruction's opcode from the microcode store.

use crate::storage::Storage;

/// Control-word width in lanes.
pub const WORD_WIDTH: usize = 14;

pub const PC_INC: usize = 0;
pub const MEM_READ: usize = 1;
pub const IR_IN: usize = 2;
pub const REG_READ: usize = 3;
pub const REG_WRITE: usize = 4;
pub const IMM_OUT: usize = 5;
pub const ALU_OUT: usize = 6;
pub const MEM_OUT: usize = 7;
pub const RAM_WRITE: usize = 8;
/// First of the three ALU-operation lanes.
pub const ALU_OP0: usize = 9;
pub const HALT: usize = 12;
pub const END: usize = 13;

/// Width of the ALU-operation field.
pub const ALU_OP_BITS: usize = 3;

/// Build a control word asserting the given signal lanes.
pub fn word(signals: &[usize]) -> Vec<bool> {
    let mut lanes = vec![false; WORD_WIDTH];
    for &signal in signals {
        lanes[signal] = true;
    }
    lanes
}

/// Build a control word with an ALU operation in its field lanes.
pub fn word_with_alu_op(signals: &[usize], alu_op: usize) -> Vec<bool> {
    let mut lanes = word(signals);
    for bit in 0..ALU_OP_BITS {
        lanes[ALU_OP0 + bit] = (alu_op >> bit) & 1 == 1;
    }
    lanes
}

/// The seven fixed microinstructions issued by ring states S0..S6.
pub fn common_words() -> [Vec<bool>; 7] {
    [
        // S0: program memory onto the instruction bus.
        word(&[MEM_READ]),
        // S1: capture the instruction register.
        word(&[MEM_READ, IR_IN]),
        // S2: advance the program counter.
        word(&[PC_INC]),
        // S3..S6: settle.
        word(&[]),
        word(&[]),
        word(&[]),
        word(&[]),
    ]
}

/// Demo instruction opcodes, the microcode store's address space.
pub mod opcode {
    /// Load the immediate field into the addressed register.
    pub const LDI: usize = 0;
    /// Add the immediate to the addressed register.
    pub const ADDI: usize = 1;
    /// Subtract the immediate from the addressed register.
    pub const SUBI: usize = 2;
    /// Load data memory at the immediate address into the register.
    pub const LOAD: usize = 3;
    /// Store the addressed register to data memory at the immediate.
    pub const STORE: usize = 4;
    /// Stop execution.
    pub const HLT: usize = 15;
}

/// The default microcode store: one control word per opcode.
pub fn default_microcode() -> Storage {
    let mut store = Storage::zeroed(WORD_WIDTH, 16);
    let entries: [(usize, Vec<bool>); 6] = [
        (opcode::LDI, word(&[IMM_OUT, REG_WRITE, END])),
        (
            opcode::ADDI,
            word_with_alu_op(&[REG_READ, ALU_OUT, REG_WRITE, END], 0),
        ),
        (
            opcode::SUBI,
            word_with_alu_op(&[REG_READ, ALU_OUT, REG_WRITE, END], 1),
        ),
        (opcode::LOAD, word(&[MEM_OUT, REG_WRITE, END])),
        (opcode::STORE, word(&[REG_READ, RAM_WRITE, END])),
        (opcode::HLT, word(&[HALT, END])),
    ];
    for (op, lanes) in entries {
        store.put(op, &lanes).expect("microcode store shape");
    }
    // Unassigned opcodes fall through as single-cycle no-ops.
    for op in 0..16 {
        if !entries_contains(op) {
            store.put(op, &word(&[END])).expect("microcode store shape");
        }
    }
    store
}

fn entries_contains(op: usize) -> bool {
    matches!(
        op,
        opcode::LDI | opcode::ADDI | opcode::SUBI | opcode::LOAD | opcode::STORE | opcode::HLT
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_sets_named_lanes() {
        let w = word(&[MEM_READ, IR_IN]);
        assert_eq!(w.len(), WORD_WIDTH);
        assert!(w[MEM_READ]);
        assert!(w[IR_IN]);
        assert!(!w[PC_INC]);
    }

    #[test]
    fn test_alu_op_field_encoding() {
        let w = word_with_alu_op(&[ALU_OUT], 0b101);
        assert!(w[ALU_OP0]);
        assert!(!w[ALU_OP0 + 1]);
        assert!(w[ALU_OP0 + 2]);
    }

    #[test]
    fn test_default_microcode_covers_all_opcodes() {
        let store = default_microcode();
        assert_eq!(store.len(), 16);
        assert_eq!(store.width(), WORD_WIDTH);
        // Every word is a terminating instruction in the demo set.
        for op in 0..16 {
            assert!(store.get(op).unwrap()[END], "opcode {op} must set END");
        }
        assert!(store.get(opcode::HLT).unwrap()[HALT]);
    }
}
