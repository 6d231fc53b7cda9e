//! Persisted word storage for ROM and RAM cells.
//!
//! A [`Storage`] is an addressable array of fixed-width boolean words,
//! identified by the file it was loaded from. The on-disk format is
//! line-oriented and human-editable: one word per line as `0`/`1`
//! characters with the most significant bit first, `#` starting a
//! comment, blank lines ignored.
//!
//! ```text
//! # LDI r0, 5
//! 0000000000000101
//! # ADDI r0, 3
//! 0001000000000011
//! ```
//!
//! The kernel's ROM and RAM nodes consume this purely as a lookup/update
//! table keyed by an address wire's unsigned-binary value; persistence
//! and parsing never leak into the kernel.

use std::path::{Path, PathBuf};

use crate::error::{Result, SimError};

/// An addressable array of fixed-width boolean words.
#[derive(Debug, Clone)]
pub struct Storage {
    /// Word width in bits.
    width: usize,
    /// The words, lane 0 least significant.
    words: Vec<Vec<bool>>,
    /// Originating file, if loaded from or bound to one.
    path: Option<PathBuf>,
}

impl Storage {
    /// Create an in-memory storage of `words` zeroed words of `width` bits.
    pub fn zeroed(width: usize, words: usize) -> Self {
        Self {
            width,
            words: vec![vec![false; width]; words],
            path: None,
        }
    }

    /// Load a storage from a word file.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SimError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;
        let mut storage = Self::parse(&content)?;
        storage.path = Some(path.to_path_buf());
        Ok(storage)
    }

    /// Parse word-file content. Exposed separately so programs can be
    /// assembled from string literals in tests and embedded microcode.
    pub fn parse(content: &str) -> Result<Self> {
        let mut width = None;
        let mut words = Vec::new();

        for (idx, raw) in content.lines().enumerate() {
            let line_no = idx + 1;
            let line = match raw.find('#') {
                Some(pos) => &raw[..pos],
                None => raw,
            }
            .trim();
            if line.is_empty() {
                continue;
            }

            let mut word = Vec::with_capacity(line.len());
            for (col, ch) in line.chars().enumerate() {
                match ch {
                    '0' => word.push(false),
                    '1' => word.push(true),
                    _ => {
                        return Err(SimError::BadWord {
                            line: line_no,
                            column: col + 1,
                        })
                    }
                }
            }
            // File rows are written MSB first; lanes are LSB first.
            word.reverse();

            match width {
                None => width = Some(word.len()),
                Some(w) if w != word.len() => {
                    return Err(SimError::WordSizeMismatch {
                        line: line_no,
                        expected: w,
                        found: word.len(),
                    })
                }
                Some(_) => {}
            }
            words.push(word);
        }

        let width = width.ok_or_else(|| SimError::invalid_shape("storage file has no words"))?;
        Ok(Self {
            width,
            words,
            path: None,
        })
    }

    /// Word width in bits.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of addressable words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the storage holds no words.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Read the word at `address`.
    pub fn get(&self, address: usize) -> Result<&[bool]> {
        self.words
            .get(address)
            .map(Vec::as_slice)
            .ok_or(SimError::BadAddress {
                address,
                words: self.words.len(),
            })
    }

    /// Overwrite the word at `address`.
    pub fn put(&mut self, address: usize, word: &[bool]) -> Result<()> {
        if word.len() != self.width {
            return Err(SimError::WordSizeMismatch {
                line: address,
                expected: self.width,
                found: word.len(),
            });
        }
        let words = self.words.len();
        let slot = self
            .words
            .get_mut(address)
            .ok_or(SimError::BadAddress { address, words })?;
        slot.copy_from_slice(word);
        Ok(())
    }

    /// Write the storage back to the file it was loaded from.
    pub fn save(&self) -> Result<()> {
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| SimError::invalid_shape("storage has no backing file"))?;
        let mut out = String::with_capacity(self.words.len() * (self.width + 1));
        for word in &self.words {
            for &lane in word.iter().rev() {
                out.push(if lane { '1' } else { '0' });
            }
            out.push('\n');
        }
        std::fs::write(path, out).map_err(|e| SimError::FileWrite {
            path: path.display().to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let s = Storage::parse("# two words\n0101\n1100\n").unwrap();
        assert_eq!(s.width(), 4);
        assert_eq!(s.len(), 2);
        // "0101" is MSB first, so lanes are [1,0,1,0].
        assert_eq!(s.get(0).unwrap(), &[true, false, true, false]);
        assert_eq!(s.get(1).unwrap(), &[false, false, true, true]);
    }

    #[test]
    fn test_parse_trailing_comment_and_blanks() {
        let s = Storage::parse("\n01 # padded\n\n10\n").unwrap();
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn test_parse_rejects_ragged_rows() {
        let err = Storage::parse("0101\n011\n").unwrap_err();
        match err {
            SimError::WordSizeMismatch {
                line,
                expected,
                found,
            } => {
                assert_eq!(line, 2);
                assert_eq!(expected, 4);
                assert_eq!(found, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_rejects_non_binary() {
        let err = Storage::parse("01x1\n").unwrap_err();
        match err {
            SimError::BadWord { line, column } => {
                assert_eq!(line, 1);
                assert_eq!(column, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_save_then_read_round_trips() {
        let path = std::env::temp_dir().join(format!(
            "gatework-storage-{}.txt",
            std::process::id()
        ));
        std::fs::write(&path, "0101\n1111\n").unwrap();

        let mut s = Storage::read(&path).unwrap();
        s.put(0, &[false, true, false, false]).unwrap();
        s.save().unwrap();

        let reloaded = Storage::read(&path).unwrap();
        assert_eq!(reloaded.get(0).unwrap(), &[false, true, false, false]);
        assert_eq!(reloaded.get(1).unwrap(), &[true; 4]);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_put_and_get() {
        let mut s = Storage::zeroed(4, 8);
        s.put(5, &[true, true, true, true]).unwrap();
        assert_eq!(s.get(5).unwrap(), &[true; 4]);
        assert_eq!(s.get(2).unwrap(), &[false; 4]);
        assert!(matches!(s.get(8), Err(SimError::BadAddress { .. })));
        assert!(matches!(
            s.put(0, &[true]),
            Err(SimError::WordSizeMismatch { .. })
        ));
    }
}
