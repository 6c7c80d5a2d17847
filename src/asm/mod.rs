//! Assembler and disassembler for MIC-1 programs.
//!
//! This module provides:
//! - A simple two-pass assembler (text → words)
//! - A disassembler (words → readable text)
//! - The program image file format

pub mod assembler;
pub mod disasm;
pub mod image;

pub use assembler::{assemble, AssemblerError};
pub use disasm::disassemble;
pub use image::{ImageFile, ImageError, load_image, save_image};
