//! CPU emulation for the MIC-1.
//!
//! This module implements the accumulator machine:
//! - 4096 sixteen-bit memory words
//! - PC, AC, SP, MAR, MBR and IR registers, Z and N flags
//! - 17-opcode instruction set with an implicit downward-growing stack

pub mod memory;
pub mod registers;
pub mod decode;
pub mod execute;
pub mod stack;

pub use memory::{Memory, MemoryError, Word, Address, MEMORY_SIZE};
pub use registers::{Registers, Flags};
pub use decode::{Opcode, DecodeError};
pub use execute::{Cpu, CpuError, CpuState, Snapshot};
