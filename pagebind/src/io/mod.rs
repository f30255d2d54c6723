//! I/O operations for pagebind.
//!
//! This module handles file I/O around the engine:
//! - Loading source PDFs from disk
//! - Publishing the exported document atomically
//!
//! # Examples
//!
//! ```no_run
//! use pagebind::export::CancelToken;
//! use pagebind::io::{PdfReader, PdfWriter};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let reader = PdfReader::new();
//! let loaded = reader.load(Path::new("input.pdf"))?;
//! println!("{} pages", loaded.page_count);
//!
//! let writer = PdfWriter::new();
//! writer
//!     .write(std::fs::read("input.pdf")?, Path::new("copy.pdf"), CancelToken::new())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod reader;
pub mod writer;

pub use reader::{LoadedPdf, PdfReader};
pub use writer::{PdfWriter, WriteStatistics};
