//! User-facing output for pagebind.
//!
//! Formatted messages plus summaries of the arrangement, ingestion and
//! export.
//!
//! # Examples
//!
//! ```no_run
//! use pagebind::output::{OutputFormatter, display_plan};
//! use pagebind::session::Session;
//!
//! # fn example(session: &Session) {
//! let formatter = OutputFormatter::new(false, false);
//! display_plan(&formatter, &session.snapshot());
//! # }
//! ```

pub mod formatter;

pub use formatter::{MessageLevel, OutputFormatter};

use crate::collection::Snapshot;
use crate::error::{PageBindError, Result};
use crate::export::ExportStatistics;
use crate::page::SourceKind;
use crate::session::{IngestReport, ThumbnailReport};

/// Print the arrangement, one numbered line per page.
pub fn display_plan(formatter: &OutputFormatter, snapshot: &Snapshot) {
    formatter.section(&format!(
        "Arrangement ({} pages: {} document, {} image)",
        snapshot.len(),
        snapshot.count_kind(SourceKind::DocumentPage),
        snapshot.count_kind(SourceKind::ImagePage)
    ));

    for (position, entry) in snapshot.iter().enumerate() {
        formatter.list_item(position + 1, entry.label());
        formatter.detail("source", &entry.source().path().display().to_string());
    }
}

/// Arrangement as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`PageBindError::Other`] if serialization fails.
pub fn plan_json(snapshot: &Snapshot) -> Result<String> {
    serde_json::to_string_pretty(snapshot)
        .map_err(|e| PageBindError::other(format!("Failed to serialize arrangement: {e}")))
}

/// Print what was added and warn about skipped files.
pub fn display_ingest_report(formatter: &OutputFormatter, report: &IngestReport) {
    for err in &report.skipped {
        formatter.warning(&format!("Skipped: {err}"));
    }

    for (path, pages) in &report.added {
        formatter.debug(&format!("{} ({pages} pages)", path.display()));
    }

    formatter.info(&format!(
        "Added {} file(s): {} pages",
        report.added.len(),
        report.pages_added()
    ));
}

/// Print where previews went and warn about placeholders.
pub fn display_thumbnail_report(formatter: &OutputFormatter, report: &ThumbnailReport) {
    for err in &report.placeholders {
        formatter.warning(&format!("Placeholder preview: {err}"));
    }
    formatter.info(&format!("Wrote {} preview(s)", report.written.len()));
}

/// Print export statistics.
pub fn display_export_statistics(formatter: &OutputFormatter, stats: &ExportStatistics) {
    formatter.success(&format!(
        "Exported {} pages ({} document, {} image) in {:.2}s, {}",
        stats.pages_written,
        stats.document_pages,
        stats.image_pages,
        stats.export_time.as_secs_f64(),
        stats.format_output_size()
    ));
    formatter.detail("Sources read", &stats.sources_read.to_string());
}
