//! Session: the single owner of an assembly.
//!
//! A [`Session`] wires the source adapter, page collection, thumbnail cache
//! and exporter together. Mutations go through `&mut self` and are applied in
//! order; long-running work (rendering, export) runs on a snapshot taken when
//! it starts, so the collection stays editable meanwhile.
//!
//! # Examples
//!
//! ```no_run
//! use pagebind::session::Session;
//! use pagebind::export::ExportOptions;
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = Session::default();
//! let inputs = [PathBuf::from("cover.png"), PathBuf::from("report.pdf")];
//! let report = session.add_files(&inputs, 4, false).await?;
//! println!("{} pages added", report.pages_added());
//!
//! let first = session.collection().ids()[0];
//! session.move_page(first, session.collection().len() - 1)?;
//!
//! let handle = session.spawn_export(PathBuf::from("combined.pdf"), ExportOptions::default(), None);
//! let stats = handle.wait().await?;
//! println!("Wrote {} pages", stats.pages_written);
//! # Ok(())
//! # }
//! ```

use futures::stream::{self, StreamExt};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::collection::{PageCollection, Snapshot};
use crate::config::{PageEdit, ThumbnailSize};
use crate::error::{PageBindError, Result};
use crate::export::{CancelToken, ExportOptions, ExportStatistics, Exporter, ProgressCallback};
use crate::page::{PageEntry, PageId};
use crate::source::SourceAdapter;
use crate::thumbnail::{PreviewRenderer, Thumbnail, ThumbnailCache};

/// Outcome of adding a batch of files.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Files added, with the number of pages each contributed, in order.
    pub added: Vec<(PathBuf, usize)>,

    /// Files skipped because they could not be ingested.
    pub skipped: Vec<PageBindError>,
}

impl IngestReport {
    /// Total pages added.
    pub fn pages_added(&self) -> usize {
        self.added.iter().map(|(_, pages)| pages).sum()
    }

    /// Whether any file was skipped.
    pub fn has_skipped(&self) -> bool {
        !self.skipped.is_empty()
    }
}

/// Outcome of writing previews to disk.
#[derive(Debug, Default)]
pub struct ThumbnailReport {
    /// Files written, in page order.
    pub written: Vec<PathBuf>,

    /// Pages whose preview failed and were written as placeholders.
    pub placeholders: Vec<PageBindError>,
}

/// Handle to an export running in the background.
#[derive(Debug)]
pub struct ExportHandle {
    cancel: CancelToken,
    task: JoinHandle<Result<ExportStatistics>>,
}

impl ExportHandle {
    /// Request cancellation. The destination is left untouched.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token shared with the running export.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Whether the export task has finished.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the export to finish.
    ///
    /// # Errors
    ///
    /// Returns the export's error, [`PageBindError::Cancelled`] if it was
    /// cancelled, or [`PageBindError::Other`] if the task panicked.
    pub async fn wait(self) -> Result<ExportStatistics> {
        self.task
            .await
            .map_err(|e| PageBindError::other(format!("Export task failed: {e}")))?
    }
}

/// Owner of one assembly.
#[derive(Debug)]
pub struct Session {
    collection: PageCollection,
    thumbnails: Arc<ThumbnailCache>,
    adapter: SourceAdapter,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(ThumbnailSize::default())
    }
}

impl Session {
    /// Create an empty session with the built-in preview renderer.
    pub fn new(thumbnail_size: ThumbnailSize) -> Self {
        Self::with_cache(Arc::new(ThumbnailCache::new(thumbnail_size)))
    }

    /// Create an empty session with a custom preview renderer.
    pub fn with_renderer(renderer: Arc<dyn PreviewRenderer>, thumbnail_size: ThumbnailSize) -> Self {
        Self::with_cache(Arc::new(ThumbnailCache::with_renderer(
            renderer,
            thumbnail_size,
        )))
    }

    fn with_cache(thumbnails: Arc<ThumbnailCache>) -> Self {
        let collection = PageCollection::with_thumbnails(Arc::clone(&thumbnails));
        let adapter = collection.source_adapter();
        Self {
            collection,
            thumbnails,
            adapter,
        }
    }

    /// The page collection.
    pub fn collection(&self) -> &PageCollection {
        &self.collection
    }

    /// The thumbnail cache.
    pub fn thumbnails(&self) -> &Arc<ThumbnailCache> {
        &self.thumbnails
    }

    /// Snapshot of the current arrangement.
    pub fn snapshot(&self) -> Snapshot {
        self.collection.snapshot()
    }

    /// Ingest one file and append its pages.
    ///
    /// # Errors
    ///
    /// Returns the ingestion error; the collection is unchanged.
    pub fn add_file(&mut self, path: &Path) -> Result<Vec<PageId>> {
        let entries = self.adapter.ingest(path)?;
        let ids = entries.iter().map(PageEntry::id).collect();
        self.collection.append(entries)?;
        Ok(ids)
    }

    /// Ingest files with up to `workers` in flight and append their pages in
    /// the order the files were given.
    ///
    /// With `continue_on_error`, unreadable files are skipped and reported.
    /// Otherwise the first failure is returned and nothing is appended.
    ///
    /// # Errors
    ///
    /// Returns the first ingestion error when `continue_on_error` is off.
    pub async fn add_files(
        &mut self,
        paths: &[PathBuf],
        workers: usize,
        continue_on_error: bool,
    ) -> Result<IngestReport> {
        let tasks = paths.iter().enumerate().map(|(idx, path)| {
            let adapter = self.adapter.clone();
            async move { (idx, adapter.ingest_async(path).await) }
        });

        let mut indexed_results: Vec<_> = stream::iter(tasks)
            .buffer_unordered(workers.max(1))
            .collect()
            .await;
        indexed_results.sort_by_key(|(idx, _)| *idx);

        let mut report = IngestReport::default();
        let mut batches = Vec::with_capacity(paths.len());

        for (idx, result) in indexed_results {
            match result {
                Ok(entries) => batches.push((idx, entries)),
                Err(err) if continue_on_error && err.is_recoverable() => {
                    tracing::warn!(error = %err, "skipping source");
                    report.skipped.push(err);
                }
                Err(err) => return Err(err),
            }
        }

        for (idx, entries) in batches {
            let pages = entries.len();
            self.collection.append(entries)?;
            report.added.push((paths[idx].clone(), pages));
        }

        tracing::info!(
            files = report.added.len(),
            pages = report.pages_added(),
            skipped = report.skipped.len(),
            "sources added"
        );

        Ok(report)
    }

    /// Move a page to a zero-based position.
    ///
    /// # Errors
    ///
    /// Returns [`PageBindError::UnknownPageId`] if the page is not present.
    pub fn move_page(&mut self, id: PageId, position: usize) -> Result<()> {
        self.collection.move_to(id, position)
    }

    /// Remove a page.
    ///
    /// # Errors
    ///
    /// Returns [`PageBindError::UnknownPageId`] if the page is not present.
    pub fn remove_page(&mut self, id: PageId) -> Result<PageEntry> {
        self.collection.remove(id)
    }

    /// Remove every page.
    pub fn clear(&mut self) {
        self.collection.clear();
    }

    /// Apply page-number based edits.
    ///
    /// Moves are applied first, in order, each against the arrangement left
    /// by the previous one. Removals are then applied from the highest page
    /// number down, numbered against the arrangement after all moves.
    /// Edits are validated up front; on error nothing is changed.
    ///
    /// # Errors
    ///
    /// Returns [`PageBindError::InvalidConfig`] if an edit names a page number
    /// that does not exist when it is applied.
    pub fn apply_edits(&mut self, edits: &[PageEdit]) -> Result<()> {
        let mut order = self.collection.ids();
        let mut moves = Vec::new();
        let mut removals = BTreeSet::new();

        for edit in edits {
            match *edit {
                PageEdit::Move { page, position } => {
                    let id = page_at(&order, page)?;
                    let target = position.saturating_sub(1).min(order.len() - 1);
                    order.retain(|other| *other != id);
                    order.insert(target, id);
                    moves.push((id, target));
                }
                PageEdit::Remove { page } => {
                    removals.insert(page);
                }
            }
        }

        let removals = removals
            .into_iter()
            .rev()
            .map(|page| page_at(&order, page))
            .collect::<Result<Vec<_>>>()?;

        for (id, target) in moves {
            self.collection.move_to(id, target)?;
        }
        for id in removals {
            self.collection.remove(id)?;
        }

        Ok(())
    }

    /// Start exporting the current arrangement in the background.
    ///
    /// The arrangement is snapshotted now; later edits do not affect this
    /// export. Must be called from within a tokio runtime.
    pub fn spawn_export(
        &self,
        destination: PathBuf,
        options: ExportOptions,
        progress: Option<ProgressCallback>,
    ) -> ExportHandle {
        let snapshot = self.snapshot();
        let cancel = CancelToken::new();

        let mut exporter = Exporter::new(options);
        if let Some(progress) = progress {
            exporter = exporter.with_progress(progress);
        }

        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            exporter
                .export_to(snapshot, &destination, task_cancel)
                .await
        });

        ExportHandle { cancel, task }
    }

    /// Write one PNG preview per page into `dir`, named by position
    /// (`page-001.png`, ...). Pages whose preview fails get a placeholder.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or a file cannot
    /// be written.
    pub async fn write_thumbnails(&self, dir: &Path, workers: usize) -> Result<ThumbnailReport> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| PageBindError::FailedToCreateOutput {
                path: dir.to_path_buf(),
                source: e,
            })?;

        let ids = self.snapshot().ids();
        let results = self.thumbnails.render_all(&ids, workers).await;

        let mut report = ThumbnailReport::default();
        let mut pending = Vec::with_capacity(results.len());

        for (position, (id, result)) in results.into_iter().enumerate() {
            let thumbnail = match result {
                Ok(thumbnail) => thumbnail,
                Err(err @ PageBindError::PreviewUnavailable { .. }) => {
                    report.placeholders.push(err);
                    Arc::new(Thumbnail::placeholder(id, self.thumbnails.size()))
                }
                Err(err) => return Err(err),
            };
            let path = dir.join(format!("page-{:03}.png", position + 1));
            pending.push((thumbnail, path));
        }

        let written = tokio::task::spawn_blocking(move || {
            pending
                .into_iter()
                .map(|(thumbnail, path)| thumbnail.write_png(&path).map(|()| path))
                .collect::<Result<Vec<_>>>()
        })
        .await
        .map_err(|e| PageBindError::other(format!("Thumbnail task failed: {e}")))??;

        report.written = written;
        Ok(report)
    }
}

/// Identifier at 1-based page number `page` of `order`.
fn page_at(order: &[PageId], page: usize) -> Result<PageId> {
    page.checked_sub(1)
        .and_then(|idx| order.get(idx))
        .copied()
        .ok_or_else(|| {
            PageBindError::invalid_config(format!(
                "Page {page} does not exist (arrangement has {} pages)",
                order.len()
            ))
        })
}
