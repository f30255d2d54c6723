//! pagebind - Assemble PDFs and images into a single PDF, page by page.
//!
//! Every input page becomes an independently orderable, removable unit with
//! a stable identifier. The library provides:
//!
//! - Ingestion of PDF documents and standalone images
//! - An ordered page collection with append, move and remove
//! - Lazily rendered, cached page previews keyed by page identifier
//! - Export of the final arrangement into one PDF, copying document pages
//!   natively and synthesizing pages for images
//!
//! # Examples
//!
//! ## Assemble and export
//!
//! ```no_run
//! use pagebind::session::Session;
//! use pagebind::export::ExportOptions;
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = Session::default();
//! session
//!     .add_files(&[PathBuf::from("scan.jpg"), PathBuf::from("report.pdf")], 4, false)
//!     .await?;
//!
//! // Put the scan last.
//! let scan = session.collection().ids()[0];
//! session.move_page(scan, usize::MAX)?;
//!
//! let stats = session
//!     .spawn_export(PathBuf::from("combined.pdf"), ExportOptions::default(), None)
//!     .wait()
//!     .await?;
//! println!("Wrote {} pages", stats.pages_written);
//! # Ok(())
//! # }
//! ```
//!
//! ## Using individual components
//!
//! ```no_run
//! use pagebind::collection::PageCollection;
//! use pagebind::export::Exporter;
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut collection = PageCollection::new();
//! let entries = collection.source_adapter().ingest(Path::new("report.pdf"))?;
//! collection.append(entries)?;
//!
//! let last = collection.ids()[collection.len() - 1];
//! collection.remove(last)?;
//!
//! let bytes = Exporter::default().export(&collection.snapshot())?;
//! std::fs::write("trimmed.pdf", bytes)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collection;
pub mod config;
pub mod error;
pub mod export;
pub mod io;
pub mod output;
pub mod page;
pub mod session;
pub mod source;
pub mod thumbnail;
pub mod utils;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use collection::{PageCollection, Snapshot};
pub use config::Config;
pub use error::{PageBindError, Result};
pub use page::{PageEntry, PageId, PageSource, SourceKind};
pub use session::Session;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
