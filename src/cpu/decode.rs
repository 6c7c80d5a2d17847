//! Instruction decoder for the MIC-1.
//!
//! Each instruction is one opcode word, optionally followed by one
//! operand word. Seventeen opcodes exist, 0x00 through 0x10.

use crate::cpu::memory::Word;
use serde::{Serialize, Deserialize};
use std::fmt;
use thiserror::Error;

/// MIC-1 opcode.
///
/// Instructions that take an operand read it from the word following the
/// opcode. For the direct-addressing group the operand is an address;
/// for `LOCO` it is the value itself; for jumps it is the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Opcode {
    /// Stop running.
    Halt = 0x00,

    // ==================== Direct addressing ====================

    /// AC := [addr]
    Lodd = 0x01,
    /// [addr] := AC
    Stod = 0x02,
    /// AC := AC + [addr]
    Addd = 0x03,
    /// AC := AC - [addr]
    Subd = 0x04,

    /// Jump if AC was positive: !N && !Z
    Jpos = 0x05,

    /// AC := AC | [addr] (bitwise OR, despite the name)
    Stodl = 0x06,

    /// AC := constant
    Loco = 0x07,

    // ==================== Control flow ====================

    /// Unconditional jump.
    Jump = 0x08,
    /// Jump if Z.
    Jzer = 0x09,
    /// Jump if N.
    Jneg = 0x0A,

    // ==================== Stack ====================

    /// AC := AC + [SP] without popping.
    Addl = 0x0B,
    /// SP := SP + 1
    Insp = 0x0C,
    /// Push AC.
    Push = 0x0D,
    /// Pop into AC.
    Pop = 0x0E,

    // ==================== I/O (not modelled) ====================

    /// Reserved, no effect.
    Ins = 0x0F,
    /// Reserved, no effect.
    Out = 0x10,
}

impl Opcode {
    /// Every opcode, in numeric order.
    pub const ALL: [Opcode; 17] = [
        Opcode::Halt,
        Opcode::Lodd,
        Opcode::Stod,
        Opcode::Addd,
        Opcode::Subd,
        Opcode::Jpos,
        Opcode::Stodl,
        Opcode::Loco,
        Opcode::Jump,
        Opcode::Jzer,
        Opcode::Jneg,
        Opcode::Addl,
        Opcode::Insp,
        Opcode::Push,
        Opcode::Pop,
        Opcode::Ins,
        Opcode::Out,
    ];

    /// Decode a fetched word.
    pub fn decode(word: Word) -> Result<Opcode, DecodeError> {
        let opcode = match word {
            0x00 => Opcode::Halt,
            0x01 => Opcode::Lodd,
            0x02 => Opcode::Stod,
            0x03 => Opcode::Addd,
            0x04 => Opcode::Subd,
            0x05 => Opcode::Jpos,
            0x06 => Opcode::Stodl,
            0x07 => Opcode::Loco,
            0x08 => Opcode::Jump,
            0x09 => Opcode::Jzer,
            0x0A => Opcode::Jneg,
            0x0B => Opcode::Addl,
            0x0C => Opcode::Insp,
            0x0D => Opcode::Push,
            0x0E => Opcode::Pop,
            0x0F => Opcode::Ins,
            0x10 => Opcode::Out,
            _ => return Err(DecodeError::IllegalOpcode(word)),
        };

        Ok(opcode)
    }

    /// The encoded opcode word.
    pub const fn code(self) -> Word {
        self as u8 as Word
    }

    /// Assembly mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Halt => "HALT",
            Opcode::Lodd => "LODD",
            Opcode::Stod => "STOD",
            Opcode::Addd => "ADDD",
            Opcode::Subd => "SUBD",
            Opcode::Jpos => "JPOS",
            Opcode::Stodl => "STODL",
            Opcode::Loco => "LOCO",
            Opcode::Jump => "JUMP",
            Opcode::Jzer => "JZER",
            Opcode::Jneg => "JNEG",
            Opcode::Addl => "ADDL",
            Opcode::Insp => "INSP",
            Opcode::Push => "PUSH",
            Opcode::Pop => "POP",
            Opcode::Ins => "INS",
            Opcode::Out => "OUT",
        }
    }

    /// Look up an opcode by mnemonic (case-insensitive).
    pub fn from_mnemonic(name: &str) -> Option<Opcode> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(name))
    }

    /// Whether the opcode is followed by an operand word.
    pub const fn has_operand(self) -> bool {
        matches!(
            self,
            Opcode::Lodd
                | Opcode::Stod
                | Opcode::Addd
                | Opcode::Subd
                | Opcode::Jpos
                | Opcode::Stodl
                | Opcode::Loco
                | Opcode::Jump
                | Opcode::Jzer
                | Opcode::Jneg
        )
    }

    /// Encoded length in words.
    pub const fn encoded_len(self) -> usize {
        if self.has_operand() { 2 } else { 1 }
    }

    /// Whether executing the opcode recomputes the flags.
    pub const fn affects_flags(self) -> bool {
        matches!(
            self,
            Opcode::Lodd
                | Opcode::Addd
                | Opcode::Subd
                | Opcode::Stodl
                | Opcode::Loco
                | Opcode::Addl
                | Opcode::Insp
                | Opcode::Pop
        )
    }
}

impl TryFrom<Word> for Opcode {
    type Error = DecodeError;

    fn try_from(word: Word) -> Result<Self, Self::Error> {
        Opcode::decode(word)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("illegal opcode: 0x{0:04X}")]
    IllegalOpcode(Word),
}
