//! Persisted note schema.
//!
//! Field names are the current spelling; the `alias`es accept notes written
//! by older builds, which prefixed every field with its category.

use serde::Deserialize;

pub const TEXT: &str = "text";
pub const FOREGROUND_SPANS: &str = "foregroundSpans";
pub const BACKGROUND_SPANS: &str = "backgroundSpans";
pub const ALIGNMENT_SPANS: &str = "alignmentSpans";
pub const IMAGE_SPANS: &str = "imageSpans";
pub const BOLD_SPANS: &str = "boldSpans";
pub const ITALIC_SPANS: &str = "italicSpans";
pub const UNDERLINE_SPANS: &str = "underlineSpans";

/// Anything stored with a `[start, end)` range.
pub(super) trait WireRange {
    fn bounds(&self) -> (usize, usize);
}

#[derive(Debug, Deserialize)]
pub(super) struct ColorEntry {
    #[serde(alias = "foregroundColor", alias = "backgroundColor")]
    pub color: i64,
    #[serde(alias = "foregroundStart", alias = "backgroundStart")]
    pub start: usize,
    #[serde(alias = "foregroundEnd", alias = "backgroundEnd")]
    pub end: usize,
}

#[derive(Debug, Deserialize)]
pub(super) struct AlignmentEntry {
    pub alignment: i64,
    #[serde(alias = "alignmentStart")]
    pub start: usize,
    #[serde(alias = "alignmentEnd")]
    pub end: usize,
}

#[derive(Debug, Deserialize)]
pub(super) struct ImageEntry {
    pub uri: String,
    #[serde(alias = "imageStart")]
    pub start: usize,
    #[serde(alias = "imageEnd")]
    pub end: usize,
}

#[derive(Debug, Deserialize)]
pub(super) struct RangeEntry {
    #[serde(alias = "boldStart", alias = "italicStart", alias = "underlineStart")]
    pub start: usize,
    #[serde(alias = "boldEnd", alias = "italicEnd", alias = "underlineEnd")]
    pub end: usize,
}

macro_rules! impl_wire_range {
    ($($ty:ty),+) => {
        $(impl WireRange for $ty {
            fn bounds(&self) -> (usize, usize) {
                (self.start, self.end)
            }
        })+
    };
}

impl_wire_range!(ColorEntry, AlignmentEntry, ImageEntry, RangeEntry);
