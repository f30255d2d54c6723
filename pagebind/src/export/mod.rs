//! Export engine: flattens a snapshot into one PDF.
//!
//! The snapshot is walked in order. Document pages are copied from their
//! source PDF without re-rendering; image pages are synthesized. Previews
//! are never used. Export is all-or-nothing: any failing page aborts the
//! whole export and nothing is written.
//!
//! # Examples
//!
//! ```no_run
//! use pagebind::collection::PageCollection;
//! use pagebind::export::{CancelToken, ExportOptions, Exporter};
//! use std::path::Path;
//!
//! # async fn example(collection: &PageCollection) -> Result<(), Box<dyn std::error::Error>> {
//! let exporter = Exporter::new(ExportOptions::default());
//! let stats = exporter
//!     .export_to(collection.snapshot(), Path::new("combined.pdf"), CancelToken::new())
//!     .await?;
//! println!("{} pages, {}", stats.pages_written, stats.format_output_size());
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod image;
pub mod native;

pub use self::builder::OutputBuilder;
pub use self::image::{ImagePageEncoder, Placement};
pub use self::native::NativePageCopier;

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task;

use crate::collection::Snapshot;
use crate::config::{CompressionLevel, Config, ImageLayout, Metadata};
use crate::error::{PageBindError, Result};
use crate::io::PdfWriter;
use crate::page::{PageId, PageSource, SourceKind};
use crate::utils::format_file_size;

/// Options controlling the exported document.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Stream compression applied to the output.
    pub compression: CompressionLevel,

    /// Info dictionary fields.
    pub metadata: Metadata,

    /// Page layout for image pages.
    pub image_layout: ImageLayout,
}

impl From<&Config> for ExportOptions {
    fn from(config: &Config) -> Self {
        Self {
            compression: config.compression,
            metadata: config.metadata.clone(),
            image_layout: config.image_layout,
        }
    }
}

/// Statistics about an export.
#[derive(Debug, Clone, Default)]
pub struct ExportStatistics {
    /// Pages in the output document.
    pub pages_written: usize,

    /// Pages copied from PDF sources.
    pub document_pages: usize,

    /// Pages synthesized from images.
    pub image_pages: usize,

    /// Distinct source files read.
    pub sources_read: usize,

    /// Time taken to build and write the document.
    pub export_time: Duration,

    /// Size of the output in bytes.
    pub output_size: u64,
}

impl ExportStatistics {
    /// Format output size as human-readable string.
    pub fn format_output_size(&self) -> String {
        format_file_size(self.output_size)
    }
}

/// Progress of an export, reported after each page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportProgress {
    /// Number of pages done so far (1-based).
    pub done: usize,

    /// Total number of pages.
    pub total: usize,

    /// Page that was just written.
    pub id: PageId,
}

/// Callback invoked with per-page progress.
pub type ProgressCallback = Arc<dyn Fn(ExportProgress) + Send + Sync>;

/// Cooperative cancellation flag for an export.
///
/// Clones share the flag. The exporter checks it between pages and before
/// publishing the output.
#[derive(Debug, Clone)]
pub struct CancelToken {
    sender: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolve once cancellation is requested.
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }

    pub(crate) fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(PageBindError::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the output document from a snapshot.
#[derive(Clone, Default)]
pub struct Exporter {
    options: ExportOptions,
    progress: Option<ProgressCallback>,
    writer: PdfWriter,
}

impl fmt::Debug for Exporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exporter")
            .field("options", &self.options)
            .field("progress", &self.progress.is_some())
            .finish_non_exhaustive()
    }
}

impl Exporter {
    /// Create an exporter with the given options.
    pub fn new(options: ExportOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Report progress after every page.
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Options in effect.
    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Export a snapshot to PDF bytes.
    ///
    /// # Errors
    ///
    /// - [`PageBindError::EmptyCollection`] if the snapshot has no pages
    /// - [`PageBindError::SourceUnavailable`] if any referenced source can no
    ///   longer be read
    pub fn export(&self, snapshot: &Snapshot) -> Result<Vec<u8>> {
        self.build(snapshot, &CancelToken::new())
            .map(|(bytes, _)| bytes)
    }

    /// Export a snapshot to PDF bytes, checking `cancel` between pages.
    ///
    /// # Errors
    ///
    /// Same as [`Exporter::export`], plus [`PageBindError::Cancelled`].
    pub fn build(
        &self,
        snapshot: &Snapshot,
        cancel: &CancelToken,
    ) -> Result<(Vec<u8>, ExportStatistics)> {
        if snapshot.is_empty() {
            return Err(PageBindError::EmptyCollection);
        }

        let start = Instant::now();
        let total = snapshot.len();
        let mut builder = OutputBuilder::new();
        let mut copier = NativePageCopier::new();
        let encoder = ImagePageEncoder::new(self.options.image_layout);

        tracing::info!(pages = total, "export started");

        for (position, entry) in snapshot.iter().enumerate() {
            cancel.check()?;

            let result = match entry.source() {
                PageSource::Document { path, index } => copier.copy_page(&mut builder, path, *index),
                PageSource::Image { path, format } => encoder.encode(&mut builder, path, *format),
            };

            if let Err(err) = result {
                tracing::debug!(page = %entry.id(), label = entry.label(), error = %err, "export aborted");
                return Err(err);
            }

            if let Some(callback) = &self.progress {
                callback(ExportProgress {
                    done: position + 1,
                    total,
                    id: entry.id(),
                });
            }
        }

        cancel.check()?;

        tracing::debug!(
            pages = builder.page_count(),
            pdf_sources = copier.sources_loaded(),
            "all pages assembled"
        );
        builder.set_metadata(&self.options.metadata);
        let bytes = builder.finalize(self.options.compression)?;

        let sources_read = snapshot
            .iter()
            .map(|entry| entry.source().path())
            .collect::<HashSet<_>>()
            .len();

        let statistics = ExportStatistics {
            pages_written: total,
            document_pages: snapshot.count_kind(SourceKind::DocumentPage),
            image_pages: snapshot.count_kind(SourceKind::ImagePage),
            sources_read,
            export_time: start.elapsed(),
            output_size: bytes.len() as u64,
        };

        Ok((bytes, statistics))
    }

    /// Export a snapshot and publish it atomically at `destination`.
    ///
    /// The document is built on the blocking thread pool. Nothing appears at
    /// `destination` unless the whole export succeeds; a cancelled or failed
    /// export leaves any existing file there untouched.
    ///
    /// # Errors
    ///
    /// Same as [`Exporter::build`], plus write errors from the output file.
    pub async fn export_to(
        &self,
        snapshot: Snapshot,
        destination: &Path,
        cancel: CancelToken,
    ) -> Result<ExportStatistics> {
        let exporter = self.clone();
        let build_cancel = cancel.clone();

        let (bytes, mut statistics) =
            task::spawn_blocking(move || exporter.build(&snapshot, &build_cancel))
                .await
                .map_err(|e| PageBindError::other(format!("Export task failed: {e}")))??;

        cancel.check()?;

        let write_stats = self.writer.write(bytes, destination, cancel).await?;
        statistics.output_size = write_stats.file_size;
        statistics.export_time += write_stats.write_time;

        tracing::info!(
            path = %destination.display(),
            pages = statistics.pages_written,
            size = statistics.output_size,
            "export finished"
        );

        Ok(statistics)
    }
}
