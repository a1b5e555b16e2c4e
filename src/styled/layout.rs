//! Line layout collaborator used to widen a selection to whole paragraphs.

use super::offsets::Utf16Text;
use super::types::StyledText;

/// Supplies line geometry for alignment edits.
///
/// The rendering host owns real line layout (soft wraps included), so the
/// core only asks it one question.
pub trait LineLayout {
    /// Resolve `[start, end)` to the start of the first selected line and the
    /// visible end of the last selected line.
    ///
    /// Returns `None` when there is no selection, which turns the alignment
    /// edit into a no-op.
    fn line_range(&self, start: usize, end: usize) -> Option<(usize, usize)>;
}

impl<F> LineLayout for F
where
    F: Fn(usize, usize) -> Option<(usize, usize)>,
{
    fn line_range(&self, start: usize, end: usize) -> Option<(usize, usize)> {
        self(start, end)
    }
}

/// Layout for a host with no active selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoSelection;

impl LineLayout for NoSelection {
    fn line_range(&self, _start: usize, _end: usize) -> Option<(usize, usize)> {
        None
    }
}

/// Layout that only knows hard line breaks.
///
/// Used by hosts without a text engine, such as the CLI. The visible end of a
/// line excludes its terminator.
#[derive(Debug, Clone)]
pub struct PlainLineLayout {
    text: Utf16Text,
}

impl PlainLineLayout {
    pub fn new(text: &str) -> Self {
        Self {
            text: Utf16Text::new(text),
        }
    }

    pub fn for_text(styled: &StyledText) -> Self {
        Self::new(styled.text())
    }

    /// Number of lines, counting an empty line after a trailing break.
    pub fn line_count(&self) -> usize {
        self.text.rope().len_lines()
    }

    /// Zero-based line containing a UTF-16 offset. Offsets past the end map to
    /// the last line.
    pub fn line_of(&self, offset: usize) -> usize {
        let offset = offset.min(self.text.len());
        self.text
            .rope()
            .char_to_line(self.text.char_index(offset))
    }

    /// UTF-16 offset of the first character of `line`.
    pub fn line_start(&self, line: usize) -> usize {
        let rope = self.text.rope();
        let line = line.min(rope.len_lines().saturating_sub(1));
        self.text.utf16_offset(rope.line_to_char(line))
    }

    /// UTF-16 offset just past the last non-terminator character of `line`.
    pub fn line_visible_end(&self, line: usize) -> usize {
        let rope = self.text.rope();
        let line = line.min(rope.len_lines().saturating_sub(1));
        let slice = rope.line(line);
        let mut visible = slice.len_chars();
        while visible > 0 && is_line_break(slice.char(visible - 1)) {
            visible -= 1;
        }
        self.text.utf16_offset(rope.line_to_char(line) + visible)
    }
}

impl LineLayout for PlainLineLayout {
    fn line_range(&self, start: usize, end: usize) -> Option<(usize, usize)> {
        let first = self.line_of(start);
        let last = self.line_of(end);
        Some((self.line_start(first), self.line_visible_end(last)))
    }
}

const fn is_line_break(ch: char) -> bool {
    matches!(
        ch,
        '\n' | '\r' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line_covers_whole_text() {
        let layout = PlainLineLayout::new("hello");
        assert_eq!(layout.line_range(1, 3), Some((0, 5)));
    }

    #[test]
    fn test_selection_spanning_lines() {
        let layout = PlainLineLayout::new("one\ntwo\nthree");
        assert_eq!(layout.line_range(1, 1), Some((0, 3)));
        assert_eq!(layout.line_range(5, 9), Some((4, 13)));
        assert_eq!(layout.line_range(2, 6), Some((0, 7)));
    }

    #[test]
    fn test_visible_end_excludes_crlf() {
        let layout = PlainLineLayout::new("ab\r\ncd");
        assert_eq!(layout.line_count(), 2);
        assert_eq!(layout.line_visible_end(0), 2);
        assert_eq!(layout.line_start(1), 4);
    }

    #[test]
    fn test_offset_at_trailing_break_is_empty_last_line() {
        let layout = PlainLineLayout::new("ab\n");
        assert_eq!(layout.line_of(3), 1);
        assert_eq!(layout.line_range(3, 3), Some((3, 3)));
    }

    #[test]
    fn test_offsets_are_utf16() {
        let layout = PlainLineLayout::new("😀a\nb");
        assert_eq!(layout.line_visible_end(0), 3);
        assert_eq!(layout.line_start(1), 4);
    }

    #[test]
    fn test_no_selection_and_closure_layouts() {
        assert_eq!(NoSelection.line_range(0, 4), None);
        let fixed = |_: usize, _: usize| Some((2, 7));
        assert_eq!(fixed.line_range(0, 0), Some((2, 7)));
    }
}
