//! Page entries and their sources.
//!
//! A [`PageEntry`] is one logical page of the assembly. Its [`PageSource`] is a
//! tagged union describing where full-fidelity content comes from: a page of a
//! PDF document, or a standalone image.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Stable page identifier.
///
/// Assigned once at ingestion and never reused or recomputed on reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PageId(u64);

impl PageId {
    /// Wrap a raw identifier value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw identifier value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Allocator for [`PageId`] values.
///
/// Clones share the same counter, so the collection and the source adapter
/// draw from one identifier space.
#[derive(Debug, Clone)]
pub struct PageIdAllocator {
    next: Arc<AtomicU64>,
}

impl PageIdAllocator {
    /// Create an allocator whose first identifier is 1.
    pub fn new() -> Self {
        Self {
            next: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Allocate one fresh identifier.
    pub fn allocate(&self) -> PageId {
        PageId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Allocate `count` consecutive identifiers.
    pub fn allocate_many(&self, count: usize) -> Vec<PageId> {
        let start = self.next.fetch_add(count as u64, Ordering::Relaxed);
        (start..start + count as u64).map(PageId).collect()
    }
}

impl Default for PageIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Kind tag of a page source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// A page copied from a native multi-page document (PDF).
    DocumentPage,
    /// A page synthesized from a standalone image.
    ImagePage,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DocumentPage => write!(f, "document page"),
            Self::ImagePage => write!(f, "image page"),
        }
    }
}

/// Image container formats accepted as page sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// Portable Network Graphics.
    Png,
    /// JPEG / JFIF.
    Jpeg,
    /// Windows bitmap.
    Bmp,
    /// Tagged Image File Format.
    Tiff,
    /// WebP.
    WebP,
}

impl ImageFormat {
    /// Matching decoder format in the `image` crate.
    pub fn to_image_crate(self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Bmp => image::ImageFormat::Bmp,
            Self::Tiff => image::ImageFormat::Tiff,
            Self::WebP => image::ImageFormat::WebP,
        }
    }
}

/// Where a page's content comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageSource {
    /// Page `index` (zero-based) of a PDF file.
    Document {
        /// Path to the PDF file.
        path: Arc<PathBuf>,
        /// Zero-based page index within the document.
        index: usize,
    },
    /// A standalone image file.
    Image {
        /// Path to the image file.
        path: Arc<PathBuf>,
        /// Detected image format.
        format: ImageFormat,
    },
}

impl PageSource {
    /// Source kind tag.
    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Document { .. } => SourceKind::DocumentPage,
            Self::Image { .. } => SourceKind::ImagePage,
        }
    }

    /// Path of the originating file.
    pub fn path(&self) -> &Path {
        match self {
            Self::Document { path, .. } | Self::Image { path, .. } => path,
        }
    }

    /// Zero-based index of the page within its source (0 for images).
    pub fn page_index(&self) -> usize {
        match self {
            Self::Document { index, .. } => *index,
            Self::Image { .. } => 0,
        }
    }
}

/// One logical page of the assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageEntry {
    id: PageId,
    source: PageSource,
    label: String,
}

impl PageEntry {
    /// Create an entry, deriving its display label from the source.
    pub fn new(id: PageId, source: PageSource) -> Self {
        let label = make_label(&source);
        Self { id, source, label }
    }

    /// Stable identifier.
    pub fn id(&self) -> PageId {
        self.id
    }

    /// Content source.
    pub fn source(&self) -> &PageSource {
        &self.source
    }

    /// Source kind tag.
    pub fn kind(&self) -> SourceKind {
        self.source.kind()
    }

    /// Display label, e.g. `report.pdf • p3` or `photo.jpg`.
    pub fn label(&self) -> &str {
        &self.label
    }
}

fn make_label(source: &PageSource) -> String {
    let base = source
        .path()
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.path().display().to_string());

    match source {
        PageSource::Document { index, .. } => format!("{base} • p{}", index + 1),
        PageSource::Image { .. } => base,
    }
}
