//! Range-scoped edit operations.
//!
//! Every operation validates its range up front and fails fast; offsets are
//! never clamped.

use super::layout::LineLayout;
use super::offsets::Utf16Text;
use super::types::{Alignment, Color, PLACEHOLDER, Span, SpanCategory, SpanKind, StyledText};

/// Contract violations reported by edit operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("invalid range {start}..{end}: start > end")]
    InvertedRange { start: usize, end: usize },
    #[error("range {start}..{end} out of bounds for len {len}")]
    OutOfBounds { start: usize, end: usize, len: usize },
    #[error("offset {offset} falls inside a surrogate pair")]
    SplitsSurrogatePair { offset: usize },
    #[error("no image placeholder at offset {offset}")]
    MissingPlaceholder { offset: usize },
}

/// What a toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    /// A new span covering the selection was added.
    Added,
    /// This many fully contained spans were removed; nothing was added.
    Removed(usize),
}

impl StyledText {
    /// Toggle bold over `[start, end)`.
    ///
    /// Bold spans fully inside the selection are removed. Only when there
    /// were none is a new span added over the selection. Spans reaching
    /// outside the selection are left alone.
    ///
    /// # Errors
    /// Returns an [`EditError`] if the range is not valid for this text.
    pub fn toggle_bold(&mut self, start: usize, end: usize) -> Result<Toggle, EditError> {
        self.toggle(start, end, SpanKind::Bold)
    }

    /// Toggle italic over `[start, end)`, with the same rules as bold.
    ///
    /// # Errors
    /// Returns an [`EditError`] if the range is not valid for this text.
    pub fn toggle_italic(&mut self, start: usize, end: usize) -> Result<Toggle, EditError> {
        self.toggle(start, end, SpanKind::Italic)
    }

    /// Toggle underline over `[start, end)`, with the same rules as bold.
    ///
    /// # Errors
    /// Returns an [`EditError`] if the range is not valid for this text.
    pub fn toggle_underline(&mut self, start: usize, end: usize) -> Result<Toggle, EditError> {
        self.toggle(start, end, SpanKind::Underline)
    }

    /// Set the foreground color of `[start, end)`.
    ///
    /// `None` means "clear to default": a [`Color::WHITE`] span is still added.
    ///
    /// # Errors
    /// Returns an [`EditError`] if the range is not valid for this text.
    pub fn set_foreground_color(
        &mut self,
        start: usize,
        end: usize,
        color: Option<Color>,
    ) -> Result<(), EditError> {
        Utf16Text::new(self.text()).check_range(start, end)?;
        self.replace_contained(start, end, SpanKind::Foreground(color.unwrap_or(Color::WHITE)));
        Ok(())
    }

    /// Set the background color of `[start, end)`.
    ///
    /// `None` adds a [`Color::TRANSPARENT`] span.
    ///
    /// # Errors
    /// Returns an [`EditError`] if the range is not valid for this text.
    pub fn set_background_color(
        &mut self,
        start: usize,
        end: usize,
        color: Option<Color>,
    ) -> Result<(), EditError> {
        Utf16Text::new(self.text()).check_range(start, end)?;
        self.replace_contained(
            start,
            end,
            SpanKind::Background(color.unwrap_or(Color::TRANSPARENT)),
        );
        Ok(())
    }

    /// Align the lines touched by `[start, end)`.
    ///
    /// The selection is widened through `layout`; when the layout reports no
    /// selection nothing changes and `Ok(false)` is returned.
    ///
    /// # Errors
    /// Returns an [`EditError`] if the selection, or the line range the layout
    /// resolved it to, is not valid for this text.
    pub fn set_alignment<L: LineLayout + ?Sized>(
        &mut self,
        start: usize,
        end: usize,
        alignment: Alignment,
        layout: &L,
    ) -> Result<bool, EditError> {
        let offsets = Utf16Text::new(self.text());
        offsets.check_range(start, end)?;
        let Some((line_start, line_end)) = layout.line_range(start, end) else {
            tracing::trace!(start, end, "no selection, alignment unchanged");
            return Ok(false);
        };
        offsets.check_range(line_start, line_end)?;
        self.replace_contained(line_start, line_end, SpanKind::Alignment(alignment));
        Ok(true)
    }

    /// Replace `[start, end)` with an image placeholder carrying `source`.
    ///
    /// Spans after the replaced text move by `1 - (end - start)`; spans whose
    /// whole text was replaced are dropped.
    ///
    /// # Errors
    /// Returns an [`EditError`] if the range is not valid for this text.
    pub fn insert_image(
        &mut self,
        start: usize,
        end: usize,
        source: impl Into<String>,
    ) -> Result<(), EditError> {
        let mut offsets = Utf16Text::new(self.text());
        offsets.check_range(start, end)?;
        offsets.replace_with_char(start, end, PLACEHOLDER);
        *self.text_mut() = offsets.into_string();

        let before = self.spans().len();
        self.spans_mut()
            .retain_mut(|span| remap_across_replacement(span, start, end));
        let dropped = before - self.spans().len();
        if dropped > 0 {
            tracing::debug!(start, end, dropped, "spans replaced by image");
        }

        self.push_span_unchecked(Span::new(
            start,
            start + 1,
            SpanKind::Image {
                source: source.into(),
            },
        ));
        Ok(())
    }

    fn toggle(&mut self, start: usize, end: usize, kind: SpanKind) -> Result<Toggle, EditError> {
        Utf16Text::new(self.text()).check_range(start, end)?;
        let removed = self.remove_contained(kind.category(), start, end);
        if removed > 0 {
            tracing::trace!(start, end, removed, category = kind.category().name(), "toggled off");
            return Ok(Toggle::Removed(removed));
        }
        self.push_span_unchecked(Span::new(start, end, kind));
        Ok(Toggle::Added)
    }

    fn replace_contained(&mut self, start: usize, end: usize, kind: SpanKind) {
        self.remove_contained(kind.category(), start, end);
        self.push_span_unchecked(Span::new(start, end, kind));
    }

    fn remove_contained(&mut self, category: SpanCategory, start: usize, end: usize) -> usize {
        let before = self.spans().len();
        self.spans_mut()
            .retain(|span| span.category() != category || !span.is_contained_in(start, end));
        before - self.spans().len()
    }
}

/// Move `span` across the replacement of `[start, end)` by one character.
///
/// Returns `false` when the span had positive width and all of its text was
/// replaced.
fn remap_across_replacement(span: &mut Span, start: usize, end: usize) -> bool {
    let removed = end - start;
    // p >= end >= removed, so this never underflows
    let shift = |p: usize| p - removed + 1;

    let new_start = if span.start >= start {
        shift(span.start.max(end))
    } else {
        span.start
    };
    let new_end = if span.end > end {
        shift(span.end)
    } else if span.end > start {
        start
    } else {
        span.end
    };

    if new_start <= new_end {
        span.start = new_start;
        span.end = new_end;
        true
    } else if span.is_empty() {
        span.start = new_start;
        span.end = new_start;
        true
    } else {
        false
    }
}
