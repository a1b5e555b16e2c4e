//! Styled text model and the edit operations that act on it.
//!
//! This module handles:
//! - The flat, overlapping span model ([`StyledText`], [`Span`])
//! - Selection-scoped edits (bold/italic/underline toggles, colors,
//!   alignment, image insertion)
//! - UTF-16 offset bookkeeping for the persisted notes

mod edit;
mod layout;
mod offsets;
mod types;

pub use edit::{EditError, Toggle};
pub use layout::{LineLayout, NoSelection, PlainLineLayout};
pub use types::{
    Alignment, Color, ColorParseError, LEGACY_PLACEHOLDER, PLACEHOLDER, Span, SpanCategory,
    SpanKind, StyledText, is_placeholder,
};

pub(crate) use offsets::Utf16Text;
