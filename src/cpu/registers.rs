//! MIC-1 registers and condition flags.
//!
//! The programmer-visible register file:
//! - PC: program counter
//! - AC: accumulator
//! - SP: stack pointer (starts at the top of memory, grows down)
//! - MAR/MBR: address and data of the last memory access (observability only)
//! - IR: the word most recently fetched as an opcode

use crate::cpu::memory::{Address, Word, MEMORY_SIZE};
use serde::{Serialize, Deserialize};

/// Initial stack pointer: the highest memory address.
pub const SP_INIT: Address = MEMORY_SIZE as Address - 1;

/// Condition flags, recomputed only by flag-affecting instructions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flags {
    /// Last flag-affecting result was exactly zero.
    pub zero: bool,
    /// Last flag-affecting result was below zero.
    pub negative: bool,
}

impl Flags {
    /// Flags describing `value`.
    pub fn from_value(value: i64) -> Self {
        Self {
            zero: value == 0,
            negative: value < 0,
        }
    }
}

/// The MIC-1 register file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// Address of the next word to fetch.
    pub pc: Address,

    /// Accumulator. Not truncated between operations; memory writes
    /// keep its low 16 bits.
    pub ac: i64,

    /// Stack pointer. Signed so overflow past address 0 is observable.
    pub sp: Address,

    /// Memory address register.
    pub mar: Address,

    /// Memory buffer register.
    pub mbr: i64,

    /// Instruction register.
    pub ir: Word,

    pub flags: Flags,
}

impl Registers {
    /// Create a register file in its reset state.
    pub fn new() -> Self {
        Self {
            pc: 0,
            ac: 0,
            sp: SP_INIT,
            mar: 0,
            mbr: 0,
            ir: 0,
            flags: Flags::default(),
        }
    }

    /// Reset every register and flag.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Recompute the flags from `value`.
    pub fn set_flags(&mut self, value: i64) {
        self.flags = Flags::from_value(value);
    }

    /// Increment the program counter by 1.
    /// Returns the old value.
    pub fn advance_pc(&mut self) -> Address {
        let old = self.pc;
        self.pc += 1;
        old
    }

    /// Set the program counter to an absolute address.
    pub fn jump(&mut self, target: Word) {
        self.pc = Address::from(target);
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}
