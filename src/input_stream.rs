//! Candidate line held as Unicode characters
//!
//! Offsets and lengths used by the matcher are character indices, so a
//! terminal always consumes one `char` regardless of its UTF-8 width.

use std::fmt;

/// Random-access view of one candidate line
#[derive(Clone)]
pub struct InputStream {
    chars: Vec<char>,
}

impl InputStream {
    /// Create a new input stream from a string
    pub fn new(input: &str) -> Self {
        InputStream {
            chars: input.chars().collect(),
        }
    }

    /// Character at `offset`, or `None` past the end
    pub fn char_at(&self, offset: usize) -> Option<char> {
        self.chars.get(offset).copied()
    }

    /// Total length in characters
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Get a substring from start to end positions
    pub fn substring(&self, start: usize, end: usize) -> String {
        let end = end.min(self.chars.len());
        self.chars[start.min(end)..end].iter().collect()
    }
}

impl fmt::Debug for InputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InputStream(len={}, text={:?})",
            self.chars.len(),
            self.substring(0, 20)
        )
    }
}
