//! MIC-1 main memory.
//!
//! 4096 word-addressed cells of 16 bits each. Every write is masked to
//! the low 16 bits; reads hand back the stored word untouched.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// The number of memory cells.
pub const MEMORY_SIZE: usize = 4096;

/// Mask applied to every value written into memory.
pub const WORD_MASK: i64 = 0xFFFF;

/// A 16-bit machine word.
pub type Word = u16;

/// A memory address as carried by the address-holding registers.
///
/// Signed so that a stack pointer driven below zero stays representable
/// and faults on the next access instead of wrapping.
pub type Address = i32;

/// MIC-1 memory: 4096 sixteen-bit cells.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    #[serde(deserialize_with = "deserialize_cells")]
    cells: Vec<Word>,
}

/// Accept only a full memory image, so every in-range address has a cell.
fn deserialize_cells<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Word>, D::Error> {
    let cells = Vec::<Word>::deserialize(deserializer)?;
    if cells.len() != MEMORY_SIZE {
        return Err(D::Error::invalid_length(cells.len(), &"4096 memory cells"));
    }
    Ok(cells)
}

impl Memory {
    /// Create a new memory with all cells zeroed.
    pub fn new() -> Self {
        Self {
            cells: vec![0; MEMORY_SIZE],
        }
    }

    /// Read the word at `addr`.
    #[inline]
    pub fn read(&self, addr: Address) -> Result<Word, MemoryError> {
        let index = Self::index(addr)?;
        Ok(self.cells[index])
    }

    /// Write `value` at `addr`, keeping only its low 16 bits.
    #[inline]
    pub fn write(&mut self, addr: Address, value: i64) -> Result<(), MemoryError> {
        let index = Self::index(addr)?;
        self.cells[index] = truncate(value);
        Ok(())
    }

    fn index(addr: Address) -> Result<usize, MemoryError> {
        usize::try_from(addr)
            .ok()
            .filter(|&index| index < MEMORY_SIZE)
            .ok_or(MemoryError::AddressFault(addr))
    }

    /// Copy `program` into memory starting at address 0.
    ///
    /// Nothing is written if the program does not fit.
    pub fn load_program(&mut self, program: &[Word]) -> Result<(), MemoryError> {
        if program.len() > MEMORY_SIZE {
            return Err(MemoryError::ProgramTooLarge {
                size: program.len(),
                available: MEMORY_SIZE,
            });
        }

        self.cells[..program.len()].copy_from_slice(program);
        Ok(())
    }

    /// All cells, address 0 first.
    pub fn cells(&self) -> &[Word] {
        &self.cells
    }

    /// Dump memory contents (for debugging).
    pub fn dump(&self, start: usize, count: usize) -> Vec<(usize, Word)> {
        let end = start.saturating_add(count).min(MEMORY_SIZE);
        (start.min(end)..end)
            .map(|i| (i, self.cells[i]))
            .collect()
    }
}

/// Keep the low 16 bits of `value` (two's complement for negatives).
#[inline]
pub fn truncate(value: i64) -> Word {
    (value & WORD_MASK) as Word
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.cells.iter().filter(|&&cell| cell != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &MEMORY_SIZE)
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// Address is outside 0..4095.
    #[error("address fault: {0} is outside 0..{max}", max = MEMORY_SIZE - 1)]
    AddressFault(Address),

    /// Program is too large to fit in memory.
    #[error("program size {size} exceeds available space {available}")]
    ProgramTooLarge { size: usize, available: usize },
}
