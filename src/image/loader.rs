//! File-backed image loading and caching.

use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use base64::Engine;
use image::ImageReader;

use super::{ImageHandle, ImageLoadError, ImageLoader};

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<String, ImageHandle>,
    order: VecDeque<String>,
}

/// Cache of resolved image sizes, keyed by source reference.
///
/// Evicts the oldest insertion once `max_size` entries are held.
#[derive(Debug, Default, Clone)]
pub struct ImageCache {
    inner: Arc<Mutex<CacheInner>>,
    max_size: usize,
}

impl ImageCache {
    /// Create a new image cache with the given maximum number of entries.
    pub fn new(max_size: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheInner::default())),
            max_size,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Get a cached handle.
    pub fn get(&self, source: &str) -> Option<ImageHandle> {
        self.lock().entries.get(source).copied()
    }

    /// Insert a handle into the cache.
    pub fn insert(&self, source: String, handle: ImageHandle) {
        let mut guard = self.lock();

        if guard.entries.contains_key(&source) {
            guard.entries.insert(source, handle);
            return;
        }

        guard.order.push_back(source.clone());
        guard.entries.insert(source, handle);

        while guard.entries.len() > self.max_size {
            if let Some(oldest) = guard.order.pop_front() {
                guard.entries.remove(&oldest);
            } else {
                break;
            }
        }
    }

    /// Check if a source is in the cache.
    pub fn contains(&self, source: &str) -> bool {
        self.lock().entries.contains_key(source)
    }

    /// Clear the cache.
    pub fn clear(&self) {
        let mut guard = self.lock();
        guard.entries.clear();
        guard.order.clear();
    }

    /// Get the number of cached images.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Loads images from the local file system and from `data:` URIs.
///
/// Accepted sources:
/// - `file://` URIs and absolute paths
/// - paths relative to the loader's base directory
/// - `data:<mime>;base64,<payload>` URIs
///
/// Other schemes (`content://`, `http://`) belong to the host platform and are
/// reported as unsupported.
#[derive(Debug, Clone)]
pub struct FileImageLoader {
    cache: ImageCache,
    base_path: PathBuf,
}

impl FileImageLoader {
    /// Number of image sizes kept by default.
    pub const DEFAULT_CACHE_SIZE: usize = 50;

    /// Create a new image loader with the given base path for relative images.
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            cache: ImageCache::new(Self::DEFAULT_CACHE_SIZE),
            base_path,
        }
    }

    /// Get the base path.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Clear the image cache.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    fn probe(&self, source: &str) -> Result<ImageHandle, ImageLoadError> {
        if let Some(rest) = source.strip_prefix("data:") {
            return probe_data_uri(rest);
        }
        let path = self.resolve_path(source)?;
        let (width, height) = image::image_dimensions(&path)
            .map_err(|source| ImageLoadError::Unreadable { path, source })?;
        Ok(ImageHandle::new(width, height))
    }

    /// Resolve a source reference to a file path.
    fn resolve_path(&self, source: &str) -> Result<PathBuf, ImageLoadError> {
        if let Some(rest) = source.strip_prefix("file://") {
            // file:///abs/path and file://localhost/abs/path
            let rest = rest.strip_prefix("localhost").unwrap_or(rest);
            return Ok(PathBuf::from(rest));
        }
        if has_scheme(source) {
            return Err(ImageLoadError::UnsupportedSource(source.to_string()));
        }
        let path = Path::new(source);
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            Ok(self.base_path.join(path))
        }
    }
}

impl ImageLoader for FileImageLoader {
    fn load(&self, source: &str) -> Result<ImageHandle, ImageLoadError> {
        if let Some(handle) = self.cache.get(source) {
            return Ok(handle);
        }
        let handle = self.probe(source)?;
        self.cache.insert(source.to_string(), handle);
        Ok(handle)
    }
}

fn probe_data_uri(rest: &str) -> Result<ImageHandle, ImageLoadError> {
    let Some((meta, payload)) = rest.split_once(',') else {
        return Err(ImageLoadError::InvalidDataUri("missing ','".to_string()));
    };
    if !meta.ends_with(";base64") {
        return Err(ImageLoadError::InvalidDataUri(format!(
            "only base64 payloads are supported, got {meta:?}"
        )));
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|err| ImageLoadError::InvalidDataUri(err.to_string()))?;
    let (width, height) = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|err| ImageLoadError::Undecodable(image::ImageError::IoError(err)))?
        .into_dimensions()
        .map_err(ImageLoadError::Undecodable)?;
    Ok(ImageHandle::new(width, height))
}

/// True for `scheme:` prefixes of two or more characters, so Windows drive
/// letters (`C:\`) are still treated as paths.
fn has_scheme(source: &str) -> bool {
    source.split_once(':').is_some_and(|(scheme, _)| {
        scheme.len() > 1
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}
