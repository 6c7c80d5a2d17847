//! # MIC-1 Emulator
//!
//! An emulator of the MIC-1, the accumulator machine used to teach
//! computer architecture.
//!
//! The machine has 4096 sixteen-bit words of memory, an accumulator, a
//! downward-growing stack addressed through SP, two condition flags and a
//! 17-opcode instruction set. The core is driven one instruction at a time
//! through [`Cpu::step`]; everything else (assembler, image files, the
//! terminal debugger) is layered on top of it.

pub mod cpu;
pub mod asm;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use cpu::{Cpu, CpuState, CpuError, Memory, Registers, Flags, Opcode, Snapshot, Word};
pub use asm::{assemble, disassemble, AssemblerError, ImageFile, load_image, save_image};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
