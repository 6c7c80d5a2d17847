//! Disassembler for MIC-1 programs.
//!
//! Converts word sequences back to readable assembly.

use crate::cpu::decode::Opcode;
use crate::cpu::memory::Word;

/// Disassemble the instruction starting at `addr`.
///
/// Returns the text and the number of words it occupies. Words that are
/// not opcodes come out as `DAT` lines.
pub fn disassemble_instruction(words: &[Word], addr: usize) -> (String, usize) {
    let Some(&word) = words.get(addr) else {
        return ("---".to_string(), 1);
    };

    match Opcode::decode(word) {
        Ok(opcode) if opcode.has_operand() => match words.get(addr + 1) {
            Some(operand) => (format_instruction(opcode, Some(*operand)), opcode.encoded_len()),
            None => (format!("{} ???", opcode), 1),
        },
        Ok(opcode) => (format_instruction(opcode, None), opcode.encoded_len()),
        Err(_) => (format!("DAT {}", word), 1),
    }
}

/// Disassemble a whole program, one instruction per line.
pub fn disassemble(words: &[Word]) -> String {
    let mut output = String::new();
    output.push_str("/ MIC-1 Disassembly\n");
    output.push_str("/ -----------------\n\n");

    for (addr, line, len) in listing(words) {
        let raw: Vec<String> = words[addr..addr + len]
            .iter()
            .map(|w| format!("{:04X}", w))
            .collect();
        output.push_str(&format!("{:04}: {:<14} / {}\n", addr, line, raw.join(" ")));
    }

    output
}

/// Walk `words` from address 0, yielding `(address, text, length)`.
pub fn listing(words: &[Word]) -> Vec<(usize, String, usize)> {
    let mut lines = Vec::new();
    let mut addr = 0;

    while addr < words.len() {
        let (line, len) = disassemble_instruction(words, addr);
        lines.push((addr, line, len));
        addr += len;
    }

    lines
}

/// Format an opcode and its operand as assembly text.
fn format_instruction(opcode: Opcode, operand: Option<Word>) -> String {
    match (opcode, operand) {
        // LOCO carries a signed constant, not an address.
        (Opcode::Loco, Some(value)) => format!("LOCO {}", value as i16),
        (_, Some(value)) => format!("{} {}", opcode, value),
        (_, None) => opcode.to_string(),
    }
}
