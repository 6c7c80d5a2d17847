//! Simple assembler for MIC-1 programs.
//!
//! Syntax:
//! ```text
//! / Comment
//! start:  LOCO 10     / Load the constant 10
//!         STOD 100    / Store AC at address 100
//! loop:   SUBD one    / Labels may be used as operands
//!         JPOS loop
//!         HALT
//!
//!         ORG 50      / Pad with zeros up to address 50
//! one:    DAT 1       / Define a data word
//! ```

use crate::cpu::decode::Opcode;
use crate::cpu::memory::{truncate, Word, MEMORY_SIZE};
use std::collections::HashMap;
use thiserror::Error;

/// Assemble source code to a flat sequence of words, address 0 first.
pub fn assemble(source: &str) -> Result<Vec<Word>, AssemblerError> {
    let mut asm = Assembler::new();
    asm.assemble(source)
}

/// The assembler state.
struct Assembler {
    /// Symbol table (label -> address).
    symbols: HashMap<String, Word>,
    /// Pending references: (output index, label, source line).
    pending: Vec<(usize, String, usize)>,
    /// Output words.
    output: Vec<Word>,
}

impl Assembler {
    fn new() -> Self {
        Self {
            symbols: HashMap::new(),
            pending: Vec::new(),
            output: Vec::new(),
        }
    }

    fn assemble(&mut self, source: &str) -> Result<Vec<Word>, AssemblerError> {
        // Pass 1: collect labels and generate code
        for (line_num, line) in source.lines().enumerate() {
            self.process_line(line, line_num + 1)?;
        }

        // Pass 2: resolve label operands
        self.resolve_references()?;

        if self.output.len() > MEMORY_SIZE {
            return Err(AssemblerError::ProgramTooLarge { size: self.output.len() });
        }

        Ok(std::mem::take(&mut self.output))
    }

    fn process_line(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        // Remove comments
        let line = match line.find('/') {
            Some(idx) => &line[..idx],
            None => line,
        };
        let mut line = line.trim();

        // Label definitions
        while let Some(colon_idx) = line.find(':') {
            let label = line[..colon_idx].trim().to_uppercase();
            self.define_label(label, line_num)?;
            line = line[colon_idx + 1..].trim();
        }

        if line.is_empty() {
            return Ok(());
        }

        self.process_instruction(line, line_num)
    }

    fn define_label(&mut self, label: String, line_num: usize) -> Result<(), AssemblerError> {
        if !is_identifier(&label) {
            return Err(AssemblerError::SyntaxError {
                line: line_num,
                message: format!("invalid label name '{}'", label),
            });
        }
        if self.symbols.contains_key(&label) {
            return Err(AssemblerError::DuplicateLabel { line: line_num, label });
        }

        let addr = truncate(self.output.len() as i64);
        self.symbols.insert(label, addr);
        Ok(())
    }

    fn process_instruction(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let mnemonic = parts[0].to_uppercase();
        let operand = parts.get(1).copied();

        if parts.len() > 2 {
            return Err(AssemblerError::SyntaxError {
                line: line_num,
                message: format!("unexpected '{}'", parts[2]),
            });
        }

        match mnemonic.as_str() {
            // Directives
            "ORG" => {
                let operand = operand.ok_or(AssemblerError::MissingOperand {
                    line: line_num,
                    mnemonic: mnemonic.clone(),
                })?;
                let target = parse_number(operand, line_num)?
                    .ok_or_else(|| AssemblerError::SyntaxError {
                        line: line_num,
                        message: "ORG requires a numeric address".into(),
                    })?;
                self.org(target, line_num)?;
            }

            "DAT" | "DATA" => {
                let operand = operand.ok_or(AssemblerError::MissingOperand {
                    line: line_num,
                    mnemonic: mnemonic.clone(),
                })?;
                let word = self.parse_operand(operand, line_num)?;
                self.emit(word);
            }

            // Instructions
            _ => {
                let opcode = Opcode::from_mnemonic(&mnemonic).ok_or_else(|| {
                    AssemblerError::UnknownMnemonic { line: line_num, mnemonic: mnemonic.clone() }
                })?;

                match (opcode.has_operand(), operand) {
                    (true, Some(operand)) => {
                        self.emit(opcode.code());
                        let word = self.parse_operand(operand, line_num)?;
                        self.emit(word);
                    }
                    (true, None) => {
                        return Err(AssemblerError::MissingOperand {
                            line: line_num,
                            mnemonic: mnemonic.clone(),
                        });
                    }
                    (false, Some(operand)) => {
                        return Err(AssemblerError::UnexpectedOperand {
                            line: line_num,
                            mnemonic: mnemonic.clone(),
                            operand: operand.to_string(),
                        });
                    }
                    (false, None) => self.emit(opcode.code()),
                }
            }
        }

        Ok(())
    }

    /// Parse a numeric or label operand. Labels emit a placeholder that
    /// pass 2 patches.
    fn parse_operand(&mut self, operand: &str, line_num: usize) -> Result<Word, AssemblerError> {
        if let Some(value) = parse_number(operand, line_num)? {
            return Ok(value);
        }

        let label = operand.to_uppercase();
        if !is_identifier(&label) {
            return Err(AssemblerError::SyntaxError {
                line: line_num,
                message: format!("invalid operand '{}'", operand),
            });
        }

        self.pending.push((self.output.len(), label, line_num));
        Ok(0)
    }

    fn org(&mut self, target: Word, line_num: usize) -> Result<(), AssemblerError> {
        let target = usize::from(target);
        if target < self.output.len() {
            return Err(AssemblerError::OriginBackwards {
                line: line_num,
                origin: target,
                current: self.output.len(),
            });
        }

        self.output.resize(target, 0);
        Ok(())
    }

    fn emit(&mut self, word: Word) {
        self.output.push(word);
    }

    fn resolve_references(&mut self) -> Result<(), AssemblerError> {
        for (out_idx, label, line_num) in &self.pending {
            let addr = self.symbols.get(label).ok_or_else(|| AssemblerError::UndefinedLabel {
                line: *line_num,
                label: label.clone(),
            })?;
            self.output[*out_idx] = *addr;
        }
        Ok(())
    }
}

/// Parse a decimal, `0x` hex or `0b` binary literal.
///
/// Returns `Ok(None)` when `operand` is not a number at all (a label).
fn parse_number(operand: &str, line_num: usize) -> Result<Option<Word>, AssemblerError> {
    let (negative, digits) = match operand.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, operand),
    };

    let parsed = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16)
    } else if let Some(bin) = digits.strip_prefix("0b").or_else(|| digits.strip_prefix("0B")) {
        i64::from_str_radix(bin, 2)
    } else if digits.starts_with(|c: char| c.is_ascii_digit()) {
        digits.parse::<i64>()
    } else if negative {
        return Err(AssemblerError::SyntaxError {
            line: line_num,
            message: format!("invalid number '{}'", operand),
        });
    } else {
        return Ok(None);
    };

    let magnitude = parsed.map_err(|_| AssemblerError::SyntaxError {
        line: line_num,
        message: format!("invalid number '{}'", operand),
    })?;
    let value = if negative { -magnitude } else { magnitude };

    if !(i64::from(i16::MIN)..=i64::from(Word::MAX)).contains(&value) {
        return Err(AssemblerError::ValueOutOfRange { line: line_num, value });
    }

    Ok(Some(truncate(value)))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Errors that can occur during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("syntax error on line {line}: {message}")]
    SyntaxError { line: usize, message: String },

    #[error("unknown mnemonic on line {line}: {mnemonic}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("{mnemonic} on line {line} requires an operand")]
    MissingOperand { line: usize, mnemonic: String },

    #[error("{mnemonic} on line {line} takes no operand, found '{operand}'")]
    UnexpectedOperand { line: usize, mnemonic: String, operand: String },

    #[error("undefined label on line {line}: {label}")]
    UndefinedLabel { line: usize, label: String },

    #[error("duplicate label on line {line}: {label}")]
    DuplicateLabel { line: usize, label: String },

    #[error("value out of range on line {line}: {value}")]
    ValueOutOfRange { line: usize, value: i64 },

    #[error("ORG {origin} on line {line} is behind the current address {current}")]
    OriginBackwards { line: usize, origin: usize, current: usize },

    #[error("program of {size} words does not fit in memory")]
    ProgramTooLarge { size: usize },
}
