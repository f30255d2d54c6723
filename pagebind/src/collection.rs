//! The ordered, mutable page sequence.
//!
//! Order in the collection is output order. Mutations keep three invariants:
//! identifiers are unique, the sequence is dense, and every entry has a
//! thumbnail slot while it is present (when a cache is attached).
//!
//! # Examples
//!
//! ```no_run
//! use pagebind::collection::PageCollection;
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut collection = PageCollection::new();
//! let adapter = collection.source_adapter();
//!
//! collection.append(adapter.ingest(Path::new("cover.png"))?)?;
//! collection.append(adapter.ingest(Path::new("report.pdf"))?)?;
//!
//! let cover = collection.ids()[0];
//! collection.move_to(cover, collection.len() - 1)?;
//!
//! let snapshot = collection.snapshot();
//! assert_eq!(snapshot.len(), collection.len());
//! # Ok(())
//! # }
//! ```

use serde::Serialize;
use std::collections::HashSet;
use std::ops::Deref;
use std::sync::Arc;

use crate::error::{PageBindError, Result};
use crate::page::{PageEntry, PageId, PageIdAllocator, SourceKind};
use crate::source::SourceAdapter;
use crate::thumbnail::ThumbnailCache;

/// Immutable, ordered copy of the collection at a point in time.
///
/// Cloning is cheap; long-running work (rendering, export) holds a snapshot
/// instead of borrowing the collection.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct Snapshot {
    entries: Arc<[PageEntry]>,
}

impl Snapshot {
    /// Entries in output order.
    pub fn entries(&self) -> &[PageEntry] {
        &self.entries
    }

    /// Identifiers in output order.
    pub fn ids(&self) -> Vec<PageId> {
        self.entries.iter().map(PageEntry::id).collect()
    }

    /// Number of entries of the given kind.
    pub fn count_kind(&self, kind: SourceKind) -> usize {
        self.entries.iter().filter(|e| e.kind() == kind).count()
    }
}

impl Deref for Snapshot {
    type Target = [PageEntry];

    fn deref(&self) -> &Self::Target {
        &self.entries
    }
}

impl From<Vec<PageEntry>> for Snapshot {
    fn from(entries: Vec<PageEntry>) -> Self {
        Self {
            entries: entries.into(),
        }
    }
}

/// Ordered sequence of page entries.
#[derive(Debug, Default)]
pub struct PageCollection {
    entries: Vec<PageEntry>,
    ids: PageIdAllocator,
    thumbnails: Option<Arc<ThumbnailCache>>,
}

impl PageCollection {
    /// Create an empty collection without a thumbnail cache.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            ids: PageIdAllocator::new(),
            thumbnails: None,
        }
    }

    /// Create an empty collection that keeps `cache` in sync with its pages.
    pub fn with_thumbnails(cache: Arc<ThumbnailCache>) -> Self {
        Self {
            thumbnails: Some(cache),
            ..Self::new()
        }
    }

    /// Adapter that draws identifiers from this collection's space.
    pub fn source_adapter(&self) -> SourceAdapter {
        SourceAdapter::new(self.ids.clone())
    }

    /// Attached thumbnail cache, if any.
    pub fn thumbnails(&self) -> Option<&Arc<ThumbnailCache>> {
        self.thumbnails.as_ref()
    }

    /// Append a batch at the end, preserving its order.
    ///
    /// # Errors
    ///
    /// Returns [`PageBindError::DuplicatePageId`] if an identifier is already
    /// present or repeated within the batch. Nothing is appended in that case.
    pub fn append(&mut self, batch: Vec<PageEntry>) -> Result<()> {
        let mut seen: HashSet<PageId> = self.entries.iter().map(PageEntry::id).collect();
        if let Some(dup) = batch.iter().find(|entry| !seen.insert(entry.id())) {
            return Err(PageBindError::DuplicatePageId { id: dup.id() });
        }

        if let Some(cache) = &self.thumbnails {
            cache.register(&batch);
        }

        tracing::debug!(count = batch.len(), total = self.entries.len() + batch.len(), "pages appended");
        self.entries.extend(batch);
        Ok(())
    }

    /// Move a page to `new_position` (zero-based, clamped to the last slot).
    ///
    /// Other entries shift to fill the gap. Moving to the current position is
    /// a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`PageBindError::UnknownPageId`] if `id` is not present.
    pub fn move_to(&mut self, id: PageId, new_position: usize) -> Result<()> {
        let from = self.position_or_err(id)?;
        let to = new_position.min(self.entries.len() - 1);

        if from == to {
            return Ok(());
        }

        let entry = self.entries.remove(from);
        self.entries.insert(to, entry);

        tracing::debug!(page = %id, from, to, "page moved");
        Ok(())
    }

    /// Remove a page and release its thumbnail slot.
    ///
    /// # Errors
    ///
    /// Returns [`PageBindError::UnknownPageId`] if `id` is not present.
    pub fn remove(&mut self, id: PageId) -> Result<PageEntry> {
        let position = self.position_or_err(id)?;
        let entry = self.entries.remove(position);

        if let Some(cache) = &self.thumbnails {
            cache.invalidate(id);
        }

        tracing::debug!(page = %id, position, remaining = self.entries.len(), "page removed");
        Ok(entry)
    }

    /// Read-only ordered copy reflecting every prior mutation.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from(self.entries.clone())
    }

    /// Remove every page and every thumbnail slot.
    pub fn clear(&mut self) {
        self.entries.clear();
        if let Some(cache) = &self.thumbnails {
            cache.clear();
        }
    }

    /// Entry with the given identifier.
    pub fn get(&self, id: PageId) -> Option<&PageEntry> {
        self.entries.iter().find(|entry| entry.id() == id)
    }

    /// Current zero-based position of a page.
    pub fn position(&self, id: PageId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id() == id)
    }

    /// Identifiers in output order.
    pub fn ids(&self) -> Vec<PageId> {
        self.entries.iter().map(PageEntry::id).collect()
    }

    /// Entries in output order.
    pub fn entries(&self) -> &[PageEntry] {
        &self.entries
    }

    /// Number of pages.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the collection has no pages.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position_or_err(&self, id: PageId) -> Result<usize> {
        self.position(id)
            .ok_or_else(|| PageBindError::unknown_page(id))
    }
}
