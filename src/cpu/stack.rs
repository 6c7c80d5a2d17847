//! The implicit hardware stack.
//!
//! The stack lives in main memory, starts at the top address and grows
//! toward address 0. SP always names the next free slot.
//!
//! Bounds are checked after SP moves: a push writes first and reports
//! overflow once SP has gone below 0, while a pop reports underflow as
//! soon as SP passes the top of memory, before anything is read.

use crate::cpu::{Cpu, CpuError};
use crate::cpu::memory::{Address, Word, MEMORY_SIZE};

impl Cpu {
    /// Write `value` at SP, then move SP down.
    ///
    /// On `StackOverflow` the write has already happened.
    pub fn push(&mut self, value: i64) -> Result<(), CpuError> {
        self.mem.write(self.regs.sp, value)?;
        self.regs.sp -= 1;

        if self.regs.sp < 0 {
            return Err(CpuError::StackOverflow { sp: self.regs.sp });
        }
        Ok(())
    }

    /// Move SP up, then read the word there.
    pub fn pop(&mut self) -> Result<Word, CpuError> {
        self.regs.sp += 1;

        if self.regs.sp >= MEMORY_SIZE as Address {
            return Err(CpuError::StackUnderflow { sp: self.regs.sp });
        }
        Ok(self.mem.read(self.regs.sp)?)
    }

    /// Number of words currently on the stack.
    pub fn stack_depth(&self) -> usize {
        usize::try_from(MEMORY_SIZE as Address - 1 - self.regs.sp).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::memory::MemoryError;

    fn fresh() -> Cpu {
        let mut cpu = Cpu::new();
        cpu.load(&[]).unwrap();
        cpu
    }

    #[test]
    fn test_push_then_pop() {
        let mut cpu = fresh();

        cpu.push(11).unwrap();
        cpu.push(22).unwrap();
        assert_eq!(cpu.stack_depth(), 2);

        assert_eq!(cpu.pop().unwrap(), 22);
        assert_eq!(cpu.pop().unwrap(), 11);
        assert_eq!(cpu.regs.sp, 4095);
        assert_eq!(cpu.stack_depth(), 0);
    }

    #[test]
    fn test_push_truncates() {
        let mut cpu = fresh();

        cpu.push(-1).unwrap();
        assert_eq!(cpu.pop().unwrap(), 0xFFFF);
    }

    #[test]
    fn test_overflow_on_last_push() {
        let mut cpu = fresh();

        for i in 0..(MEMORY_SIZE as i64 - 1) {
            cpu.push(i).unwrap();
        }
        assert_eq!(cpu.regs.sp, 0);

        assert_eq!(cpu.push(0xBEEF), Err(CpuError::StackOverflow { sp: -1 }));
        assert_eq!(cpu.mem.read(0).unwrap(), 0xBEEF);
        assert_eq!(cpu.mem.read(4095).unwrap(), 0);
    }

    #[test]
    fn test_push_after_overflow_faults() {
        let mut cpu = fresh();
        cpu.regs.sp = -1;

        assert_eq!(
            cpu.push(1),
            Err(CpuError::Memory(MemoryError::AddressFault(-1)))
        );
        assert_eq!(cpu.regs.sp, -1);
    }

    #[test]
    fn test_underflow_on_empty_stack() {
        let mut cpu = fresh();
        cpu.regs.ac = 77;

        assert_eq!(cpu.pop(), Err(CpuError::StackUnderflow { sp: 4096 }));
        assert_eq!(cpu.regs.ac, 77);
        assert_eq!(cpu.stack_depth(), 0);
    }
}
