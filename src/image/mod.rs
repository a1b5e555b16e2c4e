//! Image collaborators for inline image spans.
//!
//! Decoding a note resolves every image span through an [`ImageLoader`]. The
//! core only needs to know whether the source opens and how large it is; the
//! pixels stay with the host.

mod loader;

pub use loader::{FileImageLoader, ImageCache};

use std::path::PathBuf;

/// A resolved image, as far as the core cares about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageHandle {
    /// Intrinsic width in pixels
    pub width: u32,
    /// Intrinsic height in pixels
    pub height: u32,
}

impl ImageHandle {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Why an image source could not be resolved.
#[derive(Debug, thiserror::Error)]
pub enum ImageLoadError {
    #[error("images are disabled")]
    Disabled,
    #[error("unsupported image source {0:?}")]
    UnsupportedSource(String),
    #[error("invalid data URI: {0}")]
    InvalidDataUri(String),
    #[error("failed to read image {}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: ::image::ImageError,
    },
    #[error("failed to decode image data")]
    Undecodable(#[source] ::image::ImageError),
    #[error("{0}")]
    Other(String),
}

/// Resolves an image span's source reference.
pub trait ImageLoader {
    /// Open `source` and report its size.
    ///
    /// # Errors
    /// Returns an [`ImageLoadError`] when the source cannot be opened; decode
    /// then drops the span.
    fn load(&self, source: &str) -> Result<ImageHandle, ImageLoadError>;
}

impl<F> ImageLoader for F
where
    F: Fn(&str) -> Result<ImageHandle, ImageLoadError>,
{
    fn load(&self, source: &str) -> Result<ImageHandle, ImageLoadError> {
        self(source)
    }
}

/// Loader for hosts with images turned off. Every image span is dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RejectAllImages;

impl ImageLoader for RejectAllImages {
    fn load(&self, _source: &str) -> Result<ImageHandle, ImageLoadError> {
        Err(ImageLoadError::Disabled)
    }
}

/// Where a decoded note is going to be shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisplayTarget {
    /// Editable view: images keep their intrinsic size.
    #[default]
    Editor,
    /// Read-only list preview: images are shrunk to fit `max_edge`.
    Preview { max_edge: u32 },
}

impl DisplayTarget {
    /// Default bounding edge for previews, in pixels.
    pub const PREVIEW_MAX_EDGE: u32 = 75;

    pub const fn preview() -> Self {
        Self::Preview {
            max_edge: Self::PREVIEW_MAX_EDGE,
        }
    }

    /// Display size for an image on this target, as `(width, height)`.
    ///
    /// Landscape images are limited by width, portrait and square ones by
    /// height; the aspect ratio is kept. Degenerate sizes pass through.
    pub fn bounds(self, image: ImageHandle) -> (u32, u32) {
        let ImageHandle { width, height } = image;
        let Self::Preview { max_edge } = self else {
            return (width, height);
        };
        if width == 0 || height == 0 {
            return (width, height);
        }
        if width > height {
            if width > max_edge {
                let scaled = u64::from(max_edge) * u64::from(height) / u64::from(width);
                return (max_edge, scaled as u32);
            }
        } else if height > max_edge {
            let scaled = u64::from(max_edge) * u64::from(width) / u64::from(height);
            return (scaled as u32, max_edge);
        }
        (width, height)
    }
}
