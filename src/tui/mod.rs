//! TUI debugger for the MIC-1 emulator.
//!
//! Provides an interactive terminal-based debugger with:
//! - Register and flag panel, including the next instruction
//! - Memory and stack views
//! - Step/run/pause/reset controls with adjustable run speed
//! - Disassembly view with breakpoints

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
