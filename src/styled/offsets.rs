//! UTF-16 offset bookkeeping.
//!
//! Spans are addressed in UTF-16 code units, the unit the persisted notes
//! were written in. Rust strings are UTF-8, so every offset that reaches the
//! text goes through a rope to find the matching char index.

use ropey::Rope;

use super::edit::EditError;
use super::types::is_placeholder;

/// Read/modify view of a text addressed by UTF-16 offsets.
#[derive(Debug, Clone)]
pub(crate) struct Utf16Text {
    rope: Rope,
}

impl Utf16Text {
    pub(crate) fn new(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Length in UTF-16 code units.
    pub(crate) fn len(&self) -> usize {
        self.rope.len_utf16_cu()
    }

    /// True if `offset` is in range and does not fall between the two halves
    /// of a surrogate pair.
    pub(crate) fn is_boundary(&self, offset: usize) -> bool {
        if offset > self.len() {
            return false;
        }
        let char_idx = self.rope.utf16_cu_to_char(offset);
        self.rope.char_to_utf16_cu(char_idx) == offset
    }

    /// Char index for a UTF-16 offset already known to be a boundary.
    pub(crate) fn char_index(&self, offset: usize) -> usize {
        self.rope.utf16_cu_to_char(offset)
    }

    /// UTF-16 offset of a char index.
    pub(crate) fn utf16_offset(&self, char_idx: usize) -> usize {
        self.rope.char_to_utf16_cu(char_idx)
    }

    /// Validate a caller-supplied `[start, end)` range.
    pub(crate) fn check_range(&self, start: usize, end: usize) -> Result<(), EditError> {
        if start > end {
            return Err(EditError::InvertedRange { start, end });
        }
        let len = self.len();
        if end > len {
            return Err(EditError::OutOfBounds { start, end, len });
        }
        for offset in [start, end] {
            if !self.is_boundary(offset) {
                return Err(EditError::SplitsSurrogatePair { offset });
            }
        }
        Ok(())
    }

    /// True if `[start, end)` is exactly one placeholder character, current
    /// or legacy.
    pub(crate) fn is_placeholder_at(&self, start: usize, end: usize) -> bool {
        end == start + 1
            && end <= self.len()
            && self.is_boundary(start)
            && is_placeholder(self.rope.char(self.char_index(start)))
    }

    /// Replace `[start, end)` with a single character.
    ///
    /// The range must already have passed [`Self::check_range`].
    pub(crate) fn replace_with_char(&mut self, start: usize, end: usize, ch: char) {
        let from = self.char_index(start);
        let to = self.char_index(end);
        self.rope.remove(from..to);
        self.rope.insert_char(from, ch);
    }

    pub(crate) const fn rope(&self) -> &Rope {
        &self.rope
    }

    pub(crate) fn into_string(self) -> String {
        self.rope.to_string()
    }
}
