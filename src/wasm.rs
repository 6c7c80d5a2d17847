//! WebAssembly bindings for the MIC-1 emulator.
//!
//! This module provides JavaScript-friendly wrappers around the core emulator.

use wasm_bindgen::prelude::*;
use crate::Cpu;
use crate::asm::assembler::assemble;
use crate::asm::disasm::disassemble_instruction;
use crate::cpu::{Word, MEMORY_SIZE};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WebAssembly-friendly CPU wrapper.
#[wasm_bindgen]
pub struct WasmCpu {
    cpu: Cpu,
    program: Vec<Word>,
}

#[wasm_bindgen]
impl WasmCpu {
    /// Create a new CPU instance.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            cpu: Cpu::new(),
            program: Vec::new(),
        }
    }

    /// Load a program from assembly source code. Returns its length in words.
    #[wasm_bindgen]
    pub fn load_asm(&mut self, source: &str) -> Result<usize, JsError> {
        let words = assemble(source)
            .map_err(|e| JsError::new(&format!("{}", e)))?;
        self.load_words(words)
    }

    /// Load an already assembled program.
    #[wasm_bindgen]
    pub fn load_words(&mut self, words: Vec<Word>) -> Result<usize, JsError> {
        self.cpu.load(&words)
            .map_err(|e| JsError::new(&format!("{}", e)))?;
        let len = words.len();
        self.program = words;
        Ok(len)
    }

    /// Step one instruction. Returns whether another step may follow.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<bool, JsError> {
        self.cpu.step()
            .map_err(|e| JsError::new(&format!("{}", e)))
    }

    /// Run until halt or max cycles. Returns instructions executed.
    #[wasm_bindgen]
    pub fn run(&mut self, max_cycles: u32) -> Result<u64, JsError> {
        self.cpu.run_limited(u64::from(max_cycles))
            .map_err(|e| JsError::new(&format!("{}", e)))
    }

    /// Restart the program in memory; memory is not reloaded.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.cpu.reset();
    }

    /// Reload the last loaded program from scratch.
    #[wasm_bindgen]
    pub fn reload(&mut self) -> Result<(), JsError> {
        self.cpu.load(&self.program)
            .map_err(|e| JsError::new(&format!("{}", e)))
    }

    /// Check if CPU is running.
    #[wasm_bindgen]
    pub fn is_running(&self) -> bool {
        self.cpu.is_running()
    }

    /// Get cycle count.
    #[wasm_bindgen]
    pub fn cycles(&self) -> u64 {
        self.cpu.cycles
    }

    /// Get program counter.
    #[wasm_bindgen]
    pub fn pc(&self) -> i32 {
        self.cpu.regs.pc
    }

    /// Get accumulator value.
    #[wasm_bindgen]
    pub fn accumulator(&self) -> i64 {
        self.cpu.regs.ac
    }

    /// Get stack pointer.
    #[wasm_bindgen]
    pub fn sp(&self) -> i32 {
        self.cpu.regs.sp
    }

    /// Get instruction register.
    #[wasm_bindgen]
    pub fn ir(&self) -> Word {
        self.cpu.regs.ir
    }

    /// Zero flag.
    #[wasm_bindgen]
    pub fn zero(&self) -> bool {
        self.cpu.regs.flags.zero
    }

    /// Negative flag.
    #[wasm_bindgen]
    pub fn negative(&self) -> bool {
        self.cpu.regs.flags.negative
    }

    /// Mnemonic at PC, or undefined.
    #[wasm_bindgen]
    pub fn next_instruction(&self) -> Option<String> {
        self.cpu.peek_next_instruction_name().map(str::to_owned)
    }

    /// Get memory word at address (0-4095).
    #[wasm_bindgen]
    pub fn memory_at(&self, addr: usize) -> Word {
        self.cpu.mem.cells().get(addr).copied().unwrap_or(0)
    }

    /// Get all memory.
    #[wasm_bindgen]
    pub fn memory_all(&self) -> Vec<Word> {
        self.cpu.mem.cells().to_vec()
    }

    /// Disassemble the instruction at an address.
    #[wasm_bindgen]
    pub fn disassemble_at(&self, addr: usize) -> String {
        if addr >= MEMORY_SIZE {
            return "---".to_string();
        }
        disassemble_instruction(self.cpu.mem.cells(), addr).0
    }

    /// Get the observable state as a JSON string.
    #[wasm_bindgen]
    pub fn snapshot_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.cpu.snapshot())
            .map_err(|e| JsError::new(&format!("{}", e)))
    }
}

impl Default for WasmCpu {
    fn default() -> Self {
        Self::new()
    }
}

/// Assemble source code and return the words.
#[wasm_bindgen]
pub fn wasm_assemble(source: &str) -> Result<Vec<Word>, JsError> {
    assemble(source).map_err(|e| JsError::new(&format!("{}", e)))
}
