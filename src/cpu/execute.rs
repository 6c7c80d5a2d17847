//! CPU execution engine for the MIC-1.
//!
//! Implements the fetch-decode-execute cycle, the program loader and all
//! instruction behaviors. The engine has no internal clock: a driver calls
//! [`Cpu::step`] as often (and as slowly) as it likes.

use crate::cpu::{Memory, Registers};
use crate::cpu::decode::{DecodeError, Opcode};
use crate::cpu::memory::{Address, MemoryError, Word, MEMORY_SIZE};
use log::{debug, trace};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// CPU will execute the next `step`.
    Running,
    /// CPU executed HALT, ran off the end of memory, or was never started.
    Halted,
}

/// The MIC-1 CPU.
#[derive(Clone, Serialize, Deserialize)]
pub struct Cpu {
    /// CPU registers and flags.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    /// Current execution state.
    pub state: CpuState,
    /// Instructions executed since the last reset.
    pub cycles: u64,
    /// Last executed opcode (for debugging).
    last_opcode: Option<Opcode>,
}

impl Cpu {
    /// Create a new CPU with zeroed memory. It stays halted until a
    /// program is loaded or it is reset.
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            state: CpuState::Halted,
            cycles: 0,
            last_opcode: None,
        }
    }

    /// Clear memory, install `program` at address 0 and reset.
    ///
    /// A program that does not fit leaves the CPU untouched.
    pub fn load(&mut self, program: &[Word]) -> Result<(), CpuError> {
        let mut mem = Memory::new();
        mem.load_program(program)?;
        self.mem = mem;
        self.reset();

        debug!("loaded {} words", program.len());
        Ok(())
    }

    /// Reset registers and flags and start running, keeping memory as is.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.state = CpuState::Running;
        self.cycles = 0;
        self.last_opcode = None;
    }

    /// Execute a single instruction.
    ///
    /// Returns whether another step may follow. Stepping a halted CPU
    /// does nothing and returns `Ok(false)`.
    pub fn step(&mut self) -> Result<bool, CpuError> {
        if !self.is_running() {
            return Ok(false);
        }

        // Fetch
        let Some(word) = self.fetch()? else {
            return Ok(false);
        };
        let at = self.regs.pc - 1;

        // Decode
        let opcode = Opcode::decode(word)?;

        // Execute
        self.execute(opcode)?;

        self.cycles += 1;
        self.last_opcode = Some(opcode);

        match opcode.has_operand().then(|| self.mem.read(at + 1)) {
            Some(Ok(operand)) => {
                trace!("{:04}: {} {}  AC={} SP={}", at, opcode, operand, self.regs.ac, self.regs.sp);
            }
            _ => trace!("{:04}: {}  AC={} SP={}", at, opcode, self.regs.ac, self.regs.sp),
        }

        Ok(self.is_running())
    }

    /// Run until halt or error.
    ///
    /// Returns the number of instructions executed.
    pub fn run(&mut self) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;

        while self.step()? {}

        Ok(self.cycles - start_cycles)
    }

    /// Run for at most `max_cycles` instructions.
    pub fn run_limited(&mut self, max_cycles: u64) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;
        let limit = self.cycles + max_cycles;

        while self.is_running() && self.cycles < limit {
            self.step()?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Read the opcode word at PC into IR and advance PC.
    ///
    /// Running off the end of memory halts instead of faulting.
    fn fetch(&mut self) -> Result<Option<Word>, CpuError> {
        if self.regs.pc >= MEMORY_SIZE as Address {
            debug!("PC={} is past the end of memory, halting", self.regs.pc);
            self.state = CpuState::Halted;
            return Ok(None);
        }

        self.regs.ir = self.mem.read(self.regs.pc)?;
        self.regs.advance_pc();
        Ok(Some(self.regs.ir))
    }

    /// Execute a decoded instruction. PC points at its operand word, or at
    /// the next instruction for operand-less opcodes.
    fn execute(&mut self, opcode: Opcode) -> Result<(), CpuError> {
        match opcode {
            Opcode::Halt => {
                debug!("HALT at PC={}", self.regs.pc - 1);
                self.state = CpuState::Halted;
            }

            // ==================== Direct addressing ====================

            Opcode::Lodd => {
                self.regs.mar = Address::from(self.operand()?);
                self.regs.mbr = i64::from(self.mem.read(self.regs.mar)?);
                self.regs.ac = self.regs.mbr;
                self.regs.advance_pc();
                self.regs.set_flags(self.regs.ac);
            }

            Opcode::Stod => {
                self.regs.mar = Address::from(self.operand()?);
                self.regs.mbr = self.regs.ac;
                self.mem.write(self.regs.mar, self.regs.mbr)?;
                self.regs.advance_pc();
            }

            Opcode::Addd => {
                let value = self.read_direct()?;
                self.regs.ac = self.regs.ac.wrapping_add(value);
                self.regs.advance_pc();
                self.regs.set_flags(self.regs.ac);
            }

            Opcode::Subd => {
                let value = self.read_direct()?;
                self.regs.ac = self.regs.ac.wrapping_sub(value);
                self.regs.advance_pc();
                self.regs.set_flags(self.regs.ac);
            }

            Opcode::Stodl => {
                let value = self.read_direct()?;
                self.regs.ac |= value;
                self.regs.advance_pc();
                self.regs.set_flags(self.regs.ac);
            }

            Opcode::Loco => {
                // The immediate is a 16-bit two's complement constant.
                self.regs.ac = i64::from(self.operand()? as i16);
                self.regs.advance_pc();
                self.regs.set_flags(self.regs.ac);
            }

            // ==================== Control flow ====================

            Opcode::Jpos => {
                let flags = self.regs.flags;
                self.branch(!flags.negative && !flags.zero)?;
            }

            Opcode::Jump => {
                self.branch(true)?;
            }

            Opcode::Jzer => {
                self.branch(self.regs.flags.zero)?;
            }

            Opcode::Jneg => {
                self.branch(self.regs.flags.negative)?;
            }

            // ==================== Stack ====================

            Opcode::Addl => {
                self.regs.mar = self.regs.sp;
                self.regs.mbr = i64::from(self.mem.read(self.regs.mar)?);
                self.regs.ac = self.regs.ac.wrapping_add(self.regs.mbr);
                self.regs.advance_pc();
                self.regs.set_flags(self.regs.ac);
            }

            Opcode::Insp => {
                self.regs.sp += 1;
                self.regs.advance_pc();
                self.regs.set_flags(i64::from(self.regs.sp));
            }

            Opcode::Push => {
                self.push(self.regs.ac)?;
                self.regs.advance_pc();
            }

            Opcode::Pop => {
                self.regs.ac = i64::from(self.pop()?);
                self.regs.advance_pc();
                self.regs.set_flags(self.regs.ac);
            }

            // ==================== I/O ====================

            Opcode::Ins | Opcode::Out => {}
        }

        Ok(())
    }

    /// The operand word at PC.
    fn operand(&self) -> Result<Word, CpuError> {
        Ok(self.mem.read(self.regs.pc)?)
    }

    /// Read the word addressed by the operand, latching the address in MAR.
    fn read_direct(&mut self) -> Result<i64, CpuError> {
        self.regs.mar = Address::from(self.operand()?);
        Ok(i64::from(self.mem.read(self.regs.mar)?))
    }

    /// Jump to the operand when `taken`, otherwise step over it.
    fn branch(&mut self, taken: bool) -> Result<(), CpuError> {
        let target = self.operand()?;
        if taken {
            self.regs.jump(target);
        } else {
            self.regs.advance_pc();
        }
        Ok(())
    }

    /// Mnemonic of the opcode at PC, without side effects.
    ///
    /// `None` if PC is outside memory or the word there is not an opcode.
    pub fn peek_next_instruction_name(&self) -> Option<&'static str> {
        let word = self.mem.read(self.regs.pc).ok()?;
        Opcode::decode(word).ok().map(Opcode::mnemonic)
    }

    /// Capture the observable state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            pc: self.regs.pc,
            ac: self.regs.ac,
            sp: self.regs.sp,
            mar: self.regs.mar,
            mbr: self.regs.mbr,
            ir: self.regs.ir,
            zero: self.regs.flags.zero,
            negative: self.regs.flags.negative,
            running: self.is_running(),
            cycles: self.cycles,
            next_instruction: self.peek_next_instruction_name().map(str::to_owned),
        }
    }

    /// Get the last executed opcode.
    pub fn last_opcode(&self) -> Option<Opcode> {
        self.last_opcode
    }

    /// Check if the CPU is halted.
    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }

    /// Check if the CPU is running.
    pub fn is_running(&self) -> bool {
        self.state == CpuState::Running
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .finish()
    }
}

/// Read-only view of everything a front end displays after a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub pc: Address,
    pub ac: i64,
    pub sp: Address,
    pub mar: Address,
    pub mbr: i64,
    pub ir: Word,
    pub zero: bool,
    pub negative: bool,
    pub running: bool,
    pub cycles: u64,
    pub next_instruction: Option<String>,
}

/// Errors that can occur during CPU execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The push completed, but SP moved below address 0.
    #[error("stack overflow (SP={sp})")]
    StackOverflow { sp: Address },

    /// SP moved past the top of memory; nothing was read.
    #[error("stack underflow (SP={sp})")]
    StackUnderflow { sp: Address },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::registers::Flags;
    use proptest::prelude::*;

    fn op(opcode: Opcode) -> Word {
        opcode.code()
    }

    fn loaded(program: &[Word]) -> Cpu {
        let mut cpu = Cpu::new();
        cpu.load(program).unwrap();
        cpu
    }

    #[test]
    fn test_new_cpu_is_halted() {
        let mut cpu = Cpu::new();

        assert!(cpu.is_halted());
        assert_eq!(cpu.step(), Ok(false));
        assert_eq!(cpu.regs.pc, 0);
    }

    #[test]
    fn test_cpu_halt() {
        let mut cpu = loaded(&[op(Opcode::Halt)]);

        assert_eq!(cpu.step(), Ok(false));
        assert!(cpu.is_halted());
        assert_eq!(cpu.regs.pc, 1);
    }

    #[test]
    fn test_step_while_halted_is_noop() {
        let mut cpu = loaded(&[op(Opcode::Halt), op(Opcode::Loco), 5]);
        cpu.run().unwrap();
        let before = cpu.snapshot();

        assert_eq!(cpu.step(), Ok(false));
        assert_eq!(cpu.snapshot(), before);
    }

    #[test]
    fn test_loco_sets_flags() {
        let mut cpu = loaded(&[op(Opcode::Loco), 0, op(Opcode::Halt)]);
        cpu.run().unwrap();
        assert_eq!(cpu.regs.flags, Flags { zero: true, negative: false });

        let mut cpu = loaded(&[op(Opcode::Loco), 0xFFFD, op(Opcode::Halt)]);
        cpu.run().unwrap();
        assert_eq!(cpu.regs.ac, -3);
        assert_eq!(cpu.regs.flags, Flags { zero: false, negative: true });
    }

    #[test]
    fn test_store_then_load() {
        let mut cpu = loaded(&[
            op(Opcode::Loco), 5,
            op(Opcode::Stod), 100,
            op(Opcode::Loco), 0,
            op(Opcode::Lodd), 100,
            op(Opcode::Halt),
        ]);

        let executed = cpu.run().unwrap();

        assert_eq!(executed, 5);
        assert_eq!(cpu.regs.ac, 5);
        assert_eq!(cpu.mem.read(100).unwrap(), 5);
        assert_eq!(cpu.regs.mar, 100);
        assert_eq!(cpu.regs.mbr, 5);
    }

    #[test]
    fn test_stod_does_not_touch_flags() {
        let mut cpu = loaded(&[
            op(Opcode::Loco), 0,
            op(Opcode::Stod), 100,
            op(Opcode::Halt),
        ]);
        cpu.step().unwrap();
        cpu.regs.ac = -9;
        cpu.run().unwrap();

        assert_eq!(cpu.regs.flags, Flags { zero: true, negative: false });
        assert_eq!(cpu.mem.read(100).unwrap(), 0xFFF7);
    }

    #[test]
    fn test_add_and_subtract() {
        let mut cpu = loaded(&[
            op(Opcode::Loco), 5,
            op(Opcode::Stod), 100,
            op(Opcode::Loco), 3,
            op(Opcode::Subd), 100,
            op(Opcode::Halt),
        ]);
        cpu.run().unwrap();
        assert_eq!(cpu.regs.ac, -2);
        assert!(cpu.regs.flags.negative);

        let mut cpu = loaded(&[
            op(Opcode::Loco), 5,
            op(Opcode::Stod), 100,
            op(Opcode::Addd), 100,
            op(Opcode::Halt),
        ]);
        cpu.run().unwrap();
        assert_eq!(cpu.regs.ac, 10);
        assert_eq!(cpu.regs.mar, 100);
    }

    #[test]
    fn test_accumulator_is_not_truncated() {
        let mut cpu = loaded(&[
            op(Opcode::Loco), 0x7FFF,
            op(Opcode::Stod), 100,
            op(Opcode::Addd), 100,
            op(Opcode::Stod), 101,
            op(Opcode::Addd), 100,
            op(Opcode::Halt),
        ]);
        cpu.run().unwrap();

        assert_eq!(cpu.regs.ac, 0x7FFF * 3);
        assert!(!cpu.regs.flags.negative);
        assert_eq!(cpu.mem.read(101).unwrap(), 0xFFFE);
    }

    #[test]
    fn test_stodl_is_bitwise_or() {
        let mut cpu = loaded(&[
            op(Opcode::Loco), 0b0110,
            op(Opcode::Stod), 50,
            op(Opcode::Loco), 0b0011,
            op(Opcode::Stodl), 50,
            op(Opcode::Halt),
        ]);
        cpu.run().unwrap();

        assert_eq!(cpu.regs.ac, 0b0111);
        assert_eq!(cpu.mem.read(50).unwrap(), 0b0110);
    }

    #[test]
    fn test_jneg_branches_on_flag() {
        let program = |k: Word| {
            vec![
                op(Opcode::Loco), k,
                op(Opcode::Jneg), 6,
                op(Opcode::Loco), 99,
                op(Opcode::Halt),
            ]
        };

        let mut cpu = loaded(&program(0xFFFD));
        cpu.run().unwrap();
        assert_eq!(cpu.regs.ac, -3);

        let mut cpu = loaded(&program(3));
        cpu.run().unwrap();
        assert_eq!(cpu.regs.ac, 99);
    }

    #[test]
    fn test_jpos_requires_strictly_positive() {
        let program = |k: Word| {
            vec![
                op(Opcode::Loco), k,
                op(Opcode::Jpos), 6,
                op(Opcode::Loco), 99,
                op(Opcode::Halt),
            ]
        };

        let mut cpu = loaded(&program(1));
        assert_eq!(cpu.run().unwrap(), 3);
        assert_eq!(cpu.regs.ac, 1);

        let mut cpu = loaded(&program(0));
        assert_eq!(cpu.run().unwrap(), 4);
        assert_eq!(cpu.regs.ac, 99);

        // -3: nonzero but negative, so no jump either
        let mut cpu = loaded(&program(0xFFFD));
        assert_eq!(cpu.run().unwrap(), 4);
        assert_eq!(cpu.regs.ac, 99);
    }

    #[test]
    fn test_jzer_ignores_negative_values() {
        let mut cpu = loaded(&[
            op(Opcode::Loco), 0xFFFD,
            op(Opcode::Jzer), 6,
            op(Opcode::Loco), 99,
            op(Opcode::Halt),
        ]);

        assert_eq!(cpu.run().unwrap(), 4);
        assert_eq!(cpu.regs.ac, 99);
    }

    #[test]
    fn test_flags_change_only_for_flag_opcodes() {
        let stale = Flags { zero: true, negative: true };

        for opcode in Opcode::ALL {
            let mut cpu = loaded(&[op(opcode), 100]);
            cpu.mem.write(100, 7).unwrap();
            cpu.mem.write(4095, 5).unwrap();
            cpu.regs.sp = 4094;
            cpu.regs.ac = 3;
            cpu.regs.flags = stale;

            cpu.step().unwrap();

            assert_eq!(
                cpu.regs.flags != stale,
                opcode.affects_flags(),
                "flags after {}",
                opcode
            );
        }
    }

    #[test]
    fn test_jzer_and_jump() {
        let mut cpu = loaded(&[
            op(Opcode::Loco), 0,
            op(Opcode::Jzer), 8,
            op(Opcode::Loco), 99,
            op(Opcode::Halt),
            op(Opcode::Halt),
            op(Opcode::Jump), 6,
        ]);

        cpu.step().unwrap();
        cpu.step().unwrap();
        assert_eq!(cpu.regs.pc, 8);
        cpu.step().unwrap();
        assert_eq!(cpu.regs.pc, 6);
        assert_eq!(cpu.step(), Ok(false));
        assert_eq!(cpu.regs.ac, 0);
    }

    #[test]
    fn test_untaken_branch_skips_operand() {
        let mut cpu = loaded(&[
            op(Opcode::Loco), 1,
            op(Opcode::Jzer), 0,
            op(Opcode::Halt),
        ]);

        cpu.step().unwrap();
        cpu.step().unwrap();
        assert_eq!(cpu.regs.pc, 4);
    }

    #[test]
    fn test_push_pop_roundtrip() {
        let mut cpu = loaded(&[
            op(Opcode::Loco), 7,
            op(Opcode::Push),
            op(Opcode::Loco), 0,
            op(Opcode::Pop),
            op(Opcode::Halt),
        ]);
        cpu.run().unwrap();

        assert_eq!(cpu.regs.ac, 7);
        assert_eq!(cpu.regs.sp, 4095);
        assert_eq!(cpu.mem.read(4095).unwrap(), 7);
        assert_eq!(cpu.regs.flags, Flags { zero: false, negative: false });
    }

    #[test]
    fn test_addl_reads_top_without_popping() {
        let mut cpu = loaded(&[
            op(Opcode::Loco), 4,
            op(Opcode::Push),
            op(Opcode::Loco), 10,
            op(Opcode::Addl),
            op(Opcode::Halt),
        ]);
        cpu.run().unwrap();

        // SP points at the free slot below the pushed value.
        assert_eq!(cpu.regs.sp, 4094);
        assert_eq!(cpu.regs.mar, 4094);
        assert_eq!(cpu.regs.ac, 10);
    }

    #[test]
    fn test_insp_sets_flags_from_sp() {
        let mut cpu = loaded(&[op(Opcode::Insp), op(Opcode::Halt)]);
        cpu.regs.sp = -1;
        cpu.run().unwrap();

        assert_eq!(cpu.regs.sp, 0);
        assert_eq!(cpu.regs.flags, Flags { zero: true, negative: false });
        assert_eq!(cpu.regs.ac, 0);
    }

    #[test]
    fn test_push_instruction_overflow() {
        let mut cpu = loaded(&[
            op(Opcode::Loco), 9,
            op(Opcode::Push),
            op(Opcode::Push),
            op(Opcode::Halt),
        ]);
        cpu.regs.sp = 1;

        cpu.step().unwrap();
        cpu.step().unwrap();
        assert_eq!(cpu.step(), Err(CpuError::StackOverflow { sp: -1 }));

        // The write landed and PC was not advanced past the fetch.
        assert_eq!(cpu.mem.read(0).unwrap(), 9);
        assert_eq!(cpu.regs.pc, 4);
        assert_eq!(cpu.cycles, 2);
    }

    #[test]
    fn test_pop_instruction_underflow() {
        let mut cpu = loaded(&[
            op(Opcode::Loco), 42,
            op(Opcode::Pop),
            op(Opcode::Halt),
        ]);

        cpu.step().unwrap();
        assert_eq!(cpu.step(), Err(CpuError::StackUnderflow { sp: 4096 }));
        assert_eq!(cpu.regs.ac, 42);
        assert_eq!(cpu.regs.pc, 3);
        assert!(cpu.is_running());
    }

    #[test]
    fn test_io_opcodes_do_nothing() {
        let mut cpu = loaded(&[op(Opcode::Ins), op(Opcode::Out), op(Opcode::Halt)]);
        let before = cpu.regs.clone();

        assert_eq!(cpu.run().unwrap(), 3);
        assert_eq!(cpu.regs.ac, before.ac);
        assert_eq!(cpu.regs.sp, before.sp);
        assert_eq!(cpu.regs.flags, before.flags);
    }

    #[test]
    fn test_running_off_the_end_halts() {
        let mut cpu = loaded(&[op(Opcode::Jump), 4096]);

        assert_eq!(cpu.step(), Ok(true));
        assert_eq!(cpu.regs.pc, 4096);
        assert_eq!(cpu.step(), Ok(false));
        assert!(cpu.is_halted());
    }

    #[test]
    fn test_operand_past_end_faults() {
        let mut cpu = loaded(&[]);
        cpu.mem.write(4095, i64::from(op(Opcode::Loco))).unwrap();
        cpu.regs.pc = 4095;

        assert_eq!(
            cpu.step(),
            Err(CpuError::Memory(MemoryError::AddressFault(4096)))
        );
    }

    #[test]
    fn test_illegal_opcode() {
        let mut cpu = loaded(&[0x11]);

        assert_eq!(
            cpu.step(),
            Err(CpuError::Decode(DecodeError::IllegalOpcode(0x11)))
        );
        assert_eq!(cpu.regs.ir, 0x11);
    }

    #[test]
    fn test_load_resets_state() {
        let mut cpu = loaded(&[op(Opcode::Loco), 5, op(Opcode::Stod), 200, op(Opcode::Halt)]);
        cpu.run().unwrap();

        cpu.load(&[op(Opcode::Halt)]).unwrap();

        assert!(cpu.is_running());
        assert_eq!(cpu.regs, Registers::new());
        assert_eq!(cpu.mem.read(200).unwrap(), 0);
        assert_eq!(cpu.cycles, 0);
    }

    #[test]
    fn test_load_too_large_leaves_cpu_alone() {
        let mut cpu = loaded(&[op(Opcode::Halt)]);
        cpu.run().unwrap();

        let result = cpu.load(&vec![0; MEMORY_SIZE + 1]);

        assert!(matches!(
            result,
            Err(CpuError::Memory(MemoryError::ProgramTooLarge { .. }))
        ));
        assert!(cpu.is_halted());
    }

    #[test]
    fn test_reset_keeps_memory() {
        let mut cpu = loaded(&[op(Opcode::Loco), 5, op(Opcode::Stod), 200, op(Opcode::Halt)]);
        cpu.run().unwrap();

        cpu.reset();

        assert!(cpu.is_running());
        assert_eq!(cpu.regs.pc, 0);
        assert_eq!(cpu.regs.ac, 0);
        assert_eq!(cpu.mem.read(200).unwrap(), 5);
    }

    #[test]
    fn test_peek_next_instruction_name() {
        let mut cpu = loaded(&[op(Opcode::Loco), 5, op(Opcode::Halt), 0x11]);
        assert_eq!(cpu.peek_next_instruction_name(), Some("LOCO"));

        cpu.step().unwrap();
        assert_eq!(cpu.peek_next_instruction_name(), Some("HALT"));

        cpu.regs.pc = 3;
        assert_eq!(cpu.peek_next_instruction_name(), None);

        cpu.regs.pc = 4096;
        assert_eq!(cpu.peek_next_instruction_name(), None);
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut cpu = loaded(&[op(Opcode::Loco), 0xFFFD, op(Opcode::Halt)]);
        cpu.step().unwrap();

        let json = serde_json::to_value(cpu.snapshot()).unwrap();

        assert_eq!(json["ac"], -3);
        assert_eq!(json["negative"], true);
        assert_eq!(json["running"], true);
        assert_eq!(json["next_instruction"], "HALT");
    }

    #[test]
    fn test_run_limited() {
        let mut cpu = loaded(&[op(Opcode::Jump), 0]);

        assert_eq!(cpu.run_limited(10).unwrap(), 10);
        assert!(cpu.is_running());
        assert_eq!(cpu.last_opcode(), Some(Opcode::Jump));
    }

    proptest! {
        #[test]
        fn prop_loco_loads_signed_immediate(k in any::<i16>()) {
            let mut cpu = loaded(&[op(Opcode::Loco), k as Word, op(Opcode::Halt)]);
            cpu.run().unwrap();

            prop_assert_eq!(cpu.regs.ac, i64::from(k));
            prop_assert_eq!(cpu.regs.flags.zero, k == 0);
            prop_assert_eq!(cpu.regs.flags.negative, k < 0);
        }

        #[test]
        fn prop_store_load_roundtrip(k in any::<Word>(), addr in 100u16..4000) {
            let mut cpu = loaded(&[
                op(Opcode::Loco), k,
                op(Opcode::Stod), addr,
                op(Opcode::Lodd), addr,
                op(Opcode::Halt),
            ]);
            cpu.run().unwrap();

            prop_assert_eq!(cpu.regs.ac, i64::from(k));
            prop_assert!(!cpu.regs.flags.negative);
        }
    }
}
