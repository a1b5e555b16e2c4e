// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. image::ImageLoadError)
    clippy::module_name_repetitions
)]

//! # noteui
//!
//! Rich-text notes stored as plain text plus style spans.
//!
//! A note is a string and a flat list of possibly-overlapping spans:
//! - Foreground and background colors
//! - Paragraph alignment
//! - Inline images, each sitting on a placeholder character
//! - Bold, italic and underline
//!
//! ## Architecture
//!
//! Everything is a value: edits take `&mut StyledText`, the codec turns it
//! into JSON and back, and the only outside collaborators are injected:
//! - **[`ImageLoader`](image::ImageLoader)**: opens image sources during decode
//! - **[`LineLayout`](styled::LineLayout)**: maps a selection to whole lines
//!   for alignment edits
//!
//! Span offsets are UTF-16 code units throughout.
//!
//! ## Modules
//!
//! - [`styled`]: Styled text model and range edits
//! - [`codec`]: JSON encode/decode
//! - [`image`]: Image loading and display bounds
//! - [`config`]: Saved CLI defaults

pub mod codec;
pub mod config;
pub mod image;
pub mod styled;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::codec::{DecodeError, DecodedNote, PlacedImage, decode, encode};
    pub use crate::image::{DisplayTarget, FileImageLoader, ImageHandle, ImageLoader};
    pub use crate::styled::{
        Alignment, Color, EditError, PLACEHOLDER, Span, SpanCategory, SpanKind, StyledText,
    };
}
