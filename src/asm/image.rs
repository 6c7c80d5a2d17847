//! Program image files.
//!
//! A simple text-based format:
//! - One 16-bit word per line, written as 16 binary digits
//! - `0x`-prefixed hex words are accepted as well
//! - Anything after `;` is a comment; blank and comment lines are ignored

use crate::cpu::memory::Word;
use std::path::Path;
use std::io::{BufRead, BufReader, Write};
use thiserror::Error;

/// A loaded program image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageFile {
    /// The program words, address 0 first.
    pub words: Vec<Word>,
    /// Comment attached to each word (for listings).
    pub comments: Vec<String>,
}

impl ImageFile {
    /// Create a new empty image.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an image from bare words.
    pub fn from_words(words: &[Word]) -> Self {
        Self {
            words: words.to_vec(),
            comments: vec![String::new(); words.len()],
        }
    }

    /// Add a word.
    pub fn push(&mut self, word: Word, comment: &str) {
        self.words.push(word);
        self.comments.push(comment.to_string());
    }

    /// Get the number of words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Parse image text.
pub fn parse_image(text: &str) -> Result<ImageFile, ImageError> {
    let mut image = ImageFile::new();

    for (line_num, line) in text.lines().enumerate() {
        let (data, comment) = match line.split_once(';') {
            Some((data, comment)) => (data.trim(), comment.trim()),
            None => (line.trim(), ""),
        };

        if data.is_empty() {
            continue;
        }

        image.push(parse_word(data, line_num + 1)?, comment);
    }

    Ok(image)
}

fn parse_word(data: &str, line: usize) -> Result<Word, ImageError> {
    let parsed = if let Some(hex) = data.strip_prefix("0x").or_else(|| data.strip_prefix("0X")) {
        Word::from_str_radix(hex, 16)
    } else {
        if data.len() != 16 {
            return Err(ImageError::ParseError {
                line,
                message: format!("expected 16 binary digits, found '{}'", data),
            });
        }
        Word::from_str_radix(data, 2)
    };

    parsed.map_err(|e| ImageError::ParseError {
        line,
        message: format!("'{}': {}", data, e),
    })
}

/// Render an image as text.
pub fn format_image(image: &ImageFile) -> String {
    let mut text = String::new();
    text.push_str("; MIC-1 program image\n");
    text.push_str(&format!("; {} words\n\n", image.len()));

    for (addr, word) in image.words.iter().enumerate() {
        match image.comments.get(addr).filter(|c| !c.is_empty()) {
            Some(comment) => text.push_str(&format!("{:016b} ; {:04} {}\n", word, addr, comment)),
            None => text.push_str(&format!("{:016b} ; {:04}\n", word, addr)),
        }
    }

    text
}

/// Load an image file from disk.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<ImageFile, ImageError> {
    let file = std::fs::File::open(path.as_ref())
        .map_err(|e| ImageError::IoError(e.to_string()))?;
    let mut text = String::new();

    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| ImageError::IoError(e.to_string()))?;
        text.push_str(&line);
        text.push('\n');
    }

    parse_image(&text)
}

/// Save an image file to disk.
pub fn save_image<P: AsRef<Path>>(path: P, image: &ImageFile) -> Result<(), ImageError> {
    let mut file = std::fs::File::create(path.as_ref())
        .map_err(|e| ImageError::IoError(e.to_string()))?;

    file.write_all(format_image(image).as_bytes())
        .map_err(|e| ImageError::IoError(e.to_string()))
}

/// Errors that can occur during image file operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("parse error on line {line}: {message}")]
    ParseError { line: usize, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_binary_and_hex() {
        let text = "; header\n\n0000000000000111 ; LOCO\n0x0005\n  0000000000000000  \n";
        let image = parse_image(text).unwrap();

        assert_eq!(image.words, vec![7, 5, 0]);
        assert_eq!(image.comments[0], "LOCO");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_image("0101"),
            Err(ImageError::ParseError { line: 1, .. })
        ));
        assert!(matches!(
            parse_image("0000000000000000\n000000000000000x"),
            Err(ImageError::ParseError { line: 2, .. })
        ));
        assert!(matches!(
            parse_image("0x10000"),
            Err(ImageError::ParseError { line: 1, .. })
        ));
    }

    #[test]
    fn test_format_then_parse() {
        let mut image = ImageFile::new();
        image.push(0x07, "LOCO -3");
        image.push(0xFFFD, "");
        image.push(0x00, "HALT");

        let text = format_image(&image);
        assert!(text.contains("1111111111111101 ; 0001"));

        let parsed = parse_image(&text).unwrap();
        assert_eq!(parsed.words, image.words);
    }

    #[test]
    fn test_missing_file() {
        let result = load_image("/nonexistent/definitely/missing.mic");
        assert!(matches!(result, Err(ImageError::IoError(_))));
    }
}
