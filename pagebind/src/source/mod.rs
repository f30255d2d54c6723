//! Source adapter: turns an input file into page entries.
//!
//! A PDF contributes one [`PageEntry`] per page in document order; an image
//! contributes exactly one. Ingestion is all-or-nothing: identifiers are only
//! allocated once the whole source has been validated.
//!
//! # Examples
//!
//! ```no_run
//! use pagebind::page::PageIdAllocator;
//! use pagebind::source::SourceAdapter;
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let adapter = SourceAdapter::new(PageIdAllocator::new());
//! let entries = adapter.ingest(Path::new("report.pdf"))?;
//! for entry in &entries {
//!     println!("{} {}", entry.id(), entry.label());
//! }
//! # Ok(())
//! # }
//! ```

pub mod detect;

pub use detect::{ImageInfo, detect_kind, is_supported_path, probe_image};

use std::path::Path;
use std::sync::Arc;
use tokio::task;

use crate::error::{PageBindError, Result};
use crate::io::PdfReader;
use crate::page::{PageEntry, PageIdAllocator, PageSource, SourceKind};

/// Produces page entries from source files.
#[derive(Debug, Clone)]
pub struct SourceAdapter {
    ids: PageIdAllocator,
    reader: PdfReader,
}

impl SourceAdapter {
    /// Create an adapter drawing identifiers from `ids`.
    pub fn new(ids: PageIdAllocator) -> Self {
        Self {
            ids,
            reader: PdfReader::new(),
        }
    }

    /// Ingest one source file.
    ///
    /// # Errors
    ///
    /// - [`PageBindError::UnreadableSource`] if the file is missing, has an
    ///   unsupported extension, cannot be parsed, or is a PDF without pages
    /// - [`PageBindError::UnsupportedFeature`] if the PDF is encrypted
    ///
    /// On error no identifiers are consumed.
    pub fn ingest(&self, path: &Path) -> Result<Vec<PageEntry>> {
        PdfReader::check_path_exists(path)?;

        let kind = detect_kind(path).ok_or_else(|| {
            PageBindError::unreadable_source(path, "unsupported file type")
        })?;

        let shared_path = Arc::new(path.to_path_buf());

        let sources: Vec<PageSource> = match kind {
            SourceKind::DocumentPage => {
                let loaded = self.reader.load(path)?;
                (0..loaded.page_count)
                    .map(|index| PageSource::Document {
                        path: Arc::clone(&shared_path),
                        index,
                    })
                    .collect()
            }
            SourceKind::ImagePage => {
                let info = probe_image(path)?;
                vec![PageSource::Image {
                    path: Arc::clone(&shared_path),
                    format: info.format,
                }]
            }
        };

        let entries: Vec<PageEntry> = self
            .ids
            .allocate_many(sources.len())
            .into_iter()
            .zip(sources)
            .map(|(id, source)| PageEntry::new(id, source))
            .collect();

        tracing::debug!(
            path = %path.display(),
            kind = %kind,
            pages = entries.len(),
            "ingested source"
        );

        Ok(entries)
    }

    /// Ingest one source file on the blocking thread pool.
    ///
    /// # Errors
    ///
    /// Same as [`SourceAdapter::ingest`].
    pub async fn ingest_async(&self, path: &Path) -> Result<Vec<PageEntry>> {
        let adapter = self.clone();
        let path = path.to_path_buf();

        task::spawn_blocking(move || adapter.ingest(&path))
            .await
            .map_err(|e| PageBindError::other(format!("Ingest task failed: {e}")))?
    }
}
