//! Core styled text types.

use std::fmt;
use std::str::FromStr;

use super::edit::EditError;
use super::offsets::Utf16Text;

/// Reserved character standing in for an inline image in the plain text.
pub const PLACEHOLDER: char = '\u{FFFC}';

/// Image placeholder written by older builds. Still accepted under an image
/// span; never written.
pub const LEGACY_PLACEHOLDER: char = '?';

/// True for either placeholder character.
pub const fn is_placeholder(ch: char) -> bool {
    matches!(ch, PLACEHOLDER | LEGACY_PLACEHOLDER)
}

/// 32-bit ARGB color, alpha in the high byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    /// Opaque white, the "no color" foreground.
    pub const WHITE: Self = Self(0xFFFF_FFFF);
    /// Opaque black.
    pub const BLACK: Self = Self(0xFF00_0000);
    /// Fully transparent, the "no color" background.
    pub const TRANSPARENT: Self = Self(0);

    /// Build a color from its four channels.
    pub const fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    /// The raw ARGB value.
    pub const fn argb(self) -> u32 {
        self.0
    }

    /// The signed integer form persisted in notes (white is `-1`).
    pub const fn to_wire(self) -> i32 {
        self.0 as i32
    }

    /// Accept either the signed or the unsigned rendition of an ARGB value.
    pub fn from_wire(value: i64) -> Option<Self> {
        if let Ok(signed) = i32::try_from(value) {
            return Some(Self(signed as u32));
        }
        u32::try_from(value).ok().map(Self)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08X}", self.0)
    }
}

/// Error returned when a color string is not `#AARRGGBB` or `#RRGGBB`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid color {0:?}: expected #AARRGGBB or #RRGGBB")]
pub struct ColorParseError(pub String);

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        let err = || ColorParseError(s.to_string());
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(err());
        }
        match hex.len() {
            8 => u32::from_str_radix(hex, 16).map(Self).map_err(|_| err()),
            6 => u32::from_str_radix(hex, 16)
                .map(|rgb| Self(0xFF00_0000 | rgb))
                .map_err(|_| err()),
            _ => Err(err()),
        }
    }
}

/// Horizontal paragraph alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Alignment {
    #[default]
    Start,
    Center,
    End,
}

impl Alignment {
    /// Gravity code written for [`Alignment::Start`].
    pub const GRAVITY_START: i64 = 0x03;
    /// Gravity code written for [`Alignment::Center`].
    pub const GRAVITY_CENTER: i64 = 0x11;
    /// Gravity code written for [`Alignment::End`].
    pub const GRAVITY_END: i64 = 0x05;
    /// Layout-direction relative START, found in notes saved by older builds.
    pub const GRAVITY_RELATIVE_START: i64 = 0x0080_0003;
    /// Layout-direction relative END, found in notes saved by older builds.
    pub const GRAVITY_RELATIVE_END: i64 = 0x0080_0005;

    /// The gravity code persisted for this alignment.
    pub const fn gravity(self) -> i64 {
        match self {
            Self::Start => Self::GRAVITY_START,
            Self::Center => Self::GRAVITY_CENTER,
            Self::End => Self::GRAVITY_END,
        }
    }

    /// Map a persisted gravity code back to an alignment.
    ///
    /// Unknown codes fall back to [`Alignment::Start`].
    pub const fn from_gravity(code: i64) -> Self {
        match code {
            Self::GRAVITY_CENTER => Self::Center,
            Self::GRAVITY_END | Self::GRAVITY_RELATIVE_END => Self::End,
            _ => Self::Start,
        }
    }
}

impl FromStr for Alignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" | "left" => Ok(Self::Start),
            "center" => Ok(Self::Center),
            "end" | "right" => Ok(Self::End),
            other => Err(format!("unknown alignment {other:?}")),
        }
    }
}

/// What a span does to the text it covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SpanKind {
    Foreground(Color),
    Background(Color),
    Alignment(Alignment),
    /// Inline image; `source` is a URI or storage key.
    Image { source: String },
    Bold,
    Italic,
    Underline,
}

impl SpanKind {
    /// The category this kind belongs to, ignoring its payload.
    pub const fn category(&self) -> SpanCategory {
        match self {
            Self::Foreground(_) => SpanCategory::Foreground,
            Self::Background(_) => SpanCategory::Background,
            Self::Alignment(_) => SpanCategory::Alignment,
            Self::Image { .. } => SpanCategory::Image,
            Self::Bold => SpanCategory::Bold,
            Self::Italic => SpanCategory::Italic,
            Self::Underline => SpanCategory::Underline,
        }
    }
}

/// Payload-free discriminant of [`SpanKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpanCategory {
    Foreground,
    Background,
    Alignment,
    Image,
    Bold,
    Italic,
    Underline,
}

impl SpanCategory {
    /// Every category, in wire order.
    pub const ALL: [Self; 7] = [
        Self::Foreground,
        Self::Background,
        Self::Alignment,
        Self::Image,
        Self::Bold,
        Self::Italic,
        Self::Underline,
    ];

    /// Human-readable name, used in logs and CLI summaries.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Foreground => "foreground",
            Self::Background => "background",
            Self::Alignment => "alignment",
            Self::Image => "image",
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Underline => "underline",
        }
    }
}

/// A style annotation over the half-open UTF-16 range `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub kind: SpanKind,
}

impl Span {
    pub const fn new(start: usize, end: usize, kind: SpanKind) -> Self {
        Self { start, end, kind }
    }

    pub const fn category(&self) -> SpanCategory {
        self.kind.category()
    }

    /// Width in UTF-16 code units.
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub const fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// True when the span lies entirely within `[start, end)`.
    pub const fn is_contained_in(&self, start: usize, end: usize) -> bool {
        start <= self.start && self.end <= end
    }

    /// True when the span shares at least one position with `[start, end)`.
    pub const fn intersects(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end
    }
}

/// Plain text plus an ordered collection of possibly-overlapping spans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyledText {
    text: String,
    spans: Vec<Span>,
}

impl StyledText {
    /// Create an empty styled text.
    pub const fn new() -> Self {
        Self {
            text: String::new(),
            spans: Vec::new(),
        }
    }

    /// Create a styled text with no spans.
    pub fn from_plain_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            spans: Vec::new(),
        }
    }

    /// Get the plain text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Get all spans in insertion order.
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Length of the text in UTF-16 code units, the unit of every span offset.
    pub fn len_utf16(&self) -> usize {
        self.text.encode_utf16().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Spans of one category, in insertion order.
    pub fn spans_of(&self, category: SpanCategory) -> impl Iterator<Item = &Span> {
        self.spans.iter().filter(move |s| s.category() == category)
    }

    /// Number of spans of one category.
    pub fn count_of(&self, category: SpanCategory) -> usize {
        self.spans_of(category).count()
    }

    /// Append a span after checking its bounds against the text.
    ///
    /// # Errors
    /// Returns an [`EditError`] if the range is inverted, out of bounds,
    /// splits a surrogate pair, or describes an image that does not sit on
    /// a single placeholder character.
    pub fn push_span(&mut self, span: Span) -> Result<(), EditError> {
        let offsets = Utf16Text::new(&self.text);
        offsets.check_range(span.start, span.end)?;
        if span.category() == SpanCategory::Image && !offsets.is_placeholder_at(span.start, span.end)
        {
            return Err(EditError::MissingPlaceholder { offset: span.start });
        }
        self.spans.push(span);
        Ok(())
    }

    /// Compare text and spans, ignoring the relative order of different kinds.
    ///
    /// Spans of the same category must appear in the same order on both sides.
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.text == other.text
            && SpanCategory::ALL
                .iter()
                .all(|&category| self.spans_of(category).eq(other.spans_of(category)))
    }

    pub(crate) const fn from_parts(text: String, spans: Vec<Span>) -> Self {
        Self { text, spans }
    }

    pub(crate) fn push_span_unchecked(&mut self, span: Span) {
        self.spans.push(span);
    }

    pub(crate) fn spans_mut(&mut self) -> &mut Vec<Span> {
        &mut self.spans
    }

    pub(crate) const fn text_mut(&mut self) -> &mut String {
        &mut self.text
    }
}

impl From<&str> for StyledText {
    fn from(text: &str) -> Self {
        Self::from_plain_text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_wire_form_is_signed() {
        assert_eq!(Color::WHITE.to_wire(), -1);
        assert_eq!(Color::TRANSPARENT.to_wire(), 0);
        assert_eq!(Color::BLACK.to_wire(), -16_777_216);
    }

    #[test]
    fn test_color_from_wire_accepts_both_signs() {
        assert_eq!(Color::from_wire(-1), Some(Color::WHITE));
        assert_eq!(Color::from_wire(0xFFFF_FFFF), Some(Color::WHITE));
        assert_eq!(Color::from_wire(0x1_0000_0000), None);
        assert_eq!(Color::from_wire(i64::from(i32::MIN) - 1), None);
    }

    #[test]
    fn test_color_parse_and_display() {
        assert_eq!("#FF112233".parse::<Color>(), Ok(Color(0xFF11_2233)));
        assert_eq!("112233".parse::<Color>(), Ok(Color(0xFF11_2233)));
        assert!("#12".parse::<Color>().is_err());
        assert!("#GG112233".parse::<Color>().is_err());
        assert_eq!(Color::from_argb(0x80, 1, 2, 3).to_string(), "#80010203");
    }

    #[test]
    fn test_alignment_gravity_codes() {
        for alignment in [Alignment::Start, Alignment::Center, Alignment::End] {
            assert_eq!(Alignment::from_gravity(alignment.gravity()), alignment);
        }
        assert_eq!(Alignment::from_gravity(0x0080_0005), Alignment::End);
        assert_eq!(Alignment::from_gravity(0x0080_0003), Alignment::Start);
        assert_eq!(Alignment::from_gravity(42), Alignment::Start);
    }

    #[test]
    fn test_span_containment() {
        let span = Span::new(2, 4, SpanKind::Bold);
        assert!(span.is_contained_in(0, 5));
        assert!(span.is_contained_in(2, 4));
        assert!(!span.is_contained_in(3, 5));
        assert!(span.intersects(3, 5));
        assert!(!span.intersects(4, 6));
    }

    #[test]
    fn test_push_span_rejects_out_of_bounds() {
        let mut text = StyledText::from_plain_text("hi");
        assert!(text.push_span(Span::new(0, 3, SpanKind::Bold)).is_err());
        assert!(text.push_span(Span::new(0, 2, SpanKind::Bold)).is_ok());
        assert_eq!(text.count_of(SpanCategory::Bold), 1);
    }

    #[test]
    fn test_push_image_span_requires_placeholder() {
        let mut text = StyledText::from_plain_text(format!("a{PLACEHOLDER}b"));
        let image = |start| {
            Span::new(
                start,
                start + 1,
                SpanKind::Image {
                    source: "img://x".to_string(),
                },
            )
        };
        assert_eq!(
            text.push_span(image(0)),
            Err(EditError::MissingPlaceholder { offset: 0 })
        );
        assert!(text.push_span(image(1)).is_ok());
    }

    #[test]
    fn test_push_image_span_accepts_legacy_placeholder() {
        let mut text = StyledText::from_plain_text(format!("a{LEGACY_PLACEHOLDER}b"));
        let image = Span::new(
            1,
            2,
            SpanKind::Image {
                source: "content://media/7".to_string(),
            },
        );
        assert!(text.push_span(image).is_ok());
        assert!(is_placeholder(PLACEHOLDER));
        assert!(!is_placeholder('a'));
    }

    #[test]
    fn test_len_utf16_counts_surrogates() {
        let text = StyledText::from_plain_text("a😀");
        assert_eq!(text.len_utf16(), 3);
    }

    #[test]
    fn test_equivalence_ignores_cross_kind_order() {
        let mut a = StyledText::from_plain_text("hello");
        a.push_span_unchecked(Span::new(0, 1, SpanKind::Bold));
        a.push_span_unchecked(Span::new(0, 2, SpanKind::Italic));
        let mut b = StyledText::from_plain_text("hello");
        b.push_span_unchecked(Span::new(0, 2, SpanKind::Italic));
        b.push_span_unchecked(Span::new(0, 1, SpanKind::Bold));
        assert!(a.is_equivalent(&b));
        assert_ne!(a, b);

        let mut c = StyledText::from_plain_text("hello");
        c.push_span_unchecked(Span::new(0, 1, SpanKind::Bold));
        c.push_span_unchecked(Span::new(1, 2, SpanKind::Bold));
        let mut d = StyledText::from_plain_text("hello");
        d.push_span_unchecked(Span::new(1, 2, SpanKind::Bold));
        d.push_span_unchecked(Span::new(0, 1, SpanKind::Bold));
        assert!(!c.is_equivalent(&d));
    }
}
