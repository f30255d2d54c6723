//! Thumbnail cache keyed by page identifier.
//!
//! Previews are rendered lazily on first request and cached under the page's
//! [`PageId`], so they stay attached to their page however the collection is
//! reordered. A slot exists only while its page is in the collection:
//! - [`ThumbnailCache::register`] creates slots when pages are appended
//! - [`ThumbnailCache::invalidate`] drops the slot when a page is removed
//! - A render that finishes after its page was removed is discarded
//!
//! There is no size or time based eviction.
//!
//! # Examples
//!
//! ```no_run
//! use pagebind::thumbnail::ThumbnailCache;
//! use pagebind::config::ThumbnailSize;
//! # use pagebind::page::PageEntry;
//!
//! # fn example(entries: Vec<PageEntry>) -> Result<(), Box<dyn std::error::Error>> {
//! let cache = ThumbnailCache::new(ThumbnailSize::default());
//! cache.register(&entries);
//! let thumb = cache.get(entries[0].id())?;
//! thumb.write_png("first.png")?;
//! # Ok(())
//! # }
//! ```

pub mod render;

pub use render::{BasicPreviewRenderer, PreviewRenderer};

use futures::stream::{self, StreamExt};
use image::RgbaImage;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokio::task;

use crate::config::ThumbnailSize;
use crate::error::{PageBindError, Result};
use crate::page::{PageEntry, PageId, PageSource};

/// A rendered preview.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    id: PageId,
    image: RgbaImage,
    placeholder: bool,
}

impl Thumbnail {
    /// Light-grey stand-in for a preview that could not be rendered.
    pub fn placeholder(id: PageId, size: ThumbnailSize) -> Self {
        Self {
            id,
            image: render::placeholder(size),
            placeholder: true,
        }
    }

    /// Page this preview belongs to.
    pub fn id(&self) -> PageId {
        self.id
    }

    /// Preview bitmap.
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Whether this is a stand-in for a preview that failed to render.
    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    /// Save the preview as a PNG file.
    ///
    /// # Errors
    ///
    /// Returns [`PageBindError::FailedToWrite`] if encoding or writing fails.
    pub fn write_png(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.image
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| PageBindError::FailedToWrite {
                path: path.to_path_buf(),
                source: std::io::Error::other(e),
            })
    }
}

#[derive(Debug)]
struct Slot {
    source: PageSource,
    preview: Option<Arc<Thumbnail>>,
}

/// Lazily rendered previews, one slot per page in the collection.
pub struct ThumbnailCache {
    renderer: Arc<dyn PreviewRenderer>,
    size: ThumbnailSize,
    slots: Mutex<HashMap<PageId, Slot>>,
}

impl fmt::Debug for ThumbnailCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThumbnailCache")
            .field("size", &self.size)
            .field("slots", &self.len())
            .finish_non_exhaustive()
    }
}

impl Default for ThumbnailCache {
    fn default() -> Self {
        Self::new(ThumbnailSize::default())
    }
}

impl ThumbnailCache {
    /// Create a cache using [`BasicPreviewRenderer`].
    pub fn new(size: ThumbnailSize) -> Self {
        Self::with_renderer(Arc::new(BasicPreviewRenderer::new()), size)
    }

    /// Create a cache with a custom renderer.
    pub fn with_renderer(renderer: Arc<dyn PreviewRenderer>, size: ThumbnailSize) -> Self {
        Self {
            renderer,
            size,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Box previews are fitted into.
    pub fn size(&self) -> ThumbnailSize {
        self.size
    }

    /// Create empty slots for newly added pages.
    pub fn register(&self, entries: &[PageEntry]) {
        let mut slots = self.slots.lock();
        for entry in entries {
            slots.entry(entry.id()).or_insert_with(|| Slot {
                source: entry.source().clone(),
                preview: None,
            });
        }
    }

    /// Drop the slot for `id` and any cached preview.
    ///
    /// Returns whether a slot existed.
    pub fn invalidate(&self, id: PageId) -> bool {
        let removed = self.slots.lock().remove(&id).is_some();
        if removed {
            tracing::debug!(page = %id, "thumbnail slot released");
        }
        removed
    }

    /// Drop every slot.
    pub fn clear(&self) {
        self.slots.lock().clear();
    }

    /// Whether a slot exists for `id`.
    pub fn contains(&self, id: PageId) -> bool {
        self.slots.lock().contains_key(&id)
    }

    /// Whether a preview for `id` is already rendered.
    pub fn is_rendered(&self, id: PageId) -> bool {
        self.slots
            .lock()
            .get(&id)
            .is_some_and(|slot| slot.preview.is_some())
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// Whether there are no slots.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the preview for `id`, rendering it on a miss.
    ///
    /// The lock is released while rendering, so distinct pages render in
    /// parallel.
    ///
    /// # Errors
    ///
    /// - [`PageBindError::UnknownPageId`] if the page is not in the collection,
    ///   including when it was removed while rendering
    /// - [`PageBindError::PreviewUnavailable`] if rendering failed
    pub fn get(&self, id: PageId) -> Result<Arc<Thumbnail>> {
        let source = {
            let slots = self.slots.lock();
            let slot = slots.get(&id).ok_or_else(|| PageBindError::unknown_page(id))?;
            if let Some(preview) = &slot.preview {
                return Ok(Arc::clone(preview));
            }
            slot.source.clone()
        };

        let image = self.renderer.render(&source, self.size).map_err(|err| {
            tracing::debug!(page = %id, error = %err, "preview render failed");
            match err {
                PageBindError::PreviewUnavailable { .. } => err,
                other => PageBindError::preview_unavailable(id, other.to_string()),
            }
        })?;

        let rendered = Arc::new(Thumbnail {
            id,
            image,
            placeholder: false,
        });

        let mut slots = self.slots.lock();
        match slots.get_mut(&id) {
            Some(slot) => {
                let preview = slot.preview.get_or_insert(rendered);
                Ok(Arc::clone(preview))
            }
            None => {
                tracing::debug!(page = %id, "discarding preview of removed page");
                Err(PageBindError::unknown_page(id))
            }
        }
    }

    /// Get the preview for `id`, substituting a light-grey placeholder when
    /// rendering fails. Placeholders are not cached.
    ///
    /// # Errors
    ///
    /// Returns [`PageBindError::UnknownPageId`] if the page is not in the
    /// collection.
    pub fn get_or_placeholder(&self, id: PageId) -> Result<Arc<Thumbnail>> {
        match self.get(id) {
            Err(PageBindError::PreviewUnavailable { .. }) => {
                Ok(Arc::new(Thumbnail::placeholder(id, self.size)))
            }
            other => other,
        }
    }

    /// Get the preview for `id` on the blocking thread pool.
    ///
    /// # Errors
    ///
    /// Same as [`ThumbnailCache::get`].
    pub async fn get_async(self: &Arc<Self>, id: PageId) -> Result<Arc<Thumbnail>> {
        let cache = Arc::clone(self);

        task::spawn_blocking(move || cache.get(id))
            .await
            .map_err(|e| PageBindError::other(format!("Render task failed: {e}")))?
    }

    /// Render many previews with at most `workers` renders in flight.
    ///
    /// Results come back in the order of `ids`; a failure only affects its
    /// own page.
    pub async fn render_all(
        self: &Arc<Self>,
        ids: &[PageId],
        workers: usize,
    ) -> Vec<(PageId, Result<Arc<Thumbnail>>)> {
        let workers = workers.max(1);

        let tasks = ids.iter().copied().enumerate().map(|(idx, id)| {
            let cache = Arc::clone(self);
            async move { (idx, id, cache.get_async(id).await) }
        });

        let mut indexed_results: Vec<_> = stream::iter(tasks)
            .buffer_unordered(workers)
            .collect()
            .await;

        indexed_results.sort_by_key(|(idx, _, _)| *idx);

        indexed_results
            .into_iter()
            .map(|(_, id, result)| (id, result))
            .collect()
    }
}
