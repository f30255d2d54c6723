//! PDF reading and loading operations.
//!
//! This module loads source PDFs for ingestion and export with:
//! - Existence checks that distinguish missing files from bad content
//! - Encryption detection (encrypted sources are rejected, never skipped)
//! - Page count verification
//!
//! # Examples
//!
//! ```no_run
//! use pagebind::io::reader::PdfReader;
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let reader = PdfReader::new();
//! let loaded = reader.load(Path::new("scan.pdf"))?;
//! println!("{} pages", loaded.page_count);
//! # Ok(())
//! # }
//! ```

use lopdf::{Document, ObjectId};
use std::path::Path;

use crate::error::{PageBindError, Result};

/// A loaded PDF document.
#[derive(Debug)]
pub struct LoadedPdf {
    /// The PDF document.
    pub document: Document,

    /// Number of pages in the document.
    pub page_count: usize,
}

impl LoadedPdf {
    /// Object ids of the pages in document order.
    pub fn page_ids(&self) -> Vec<ObjectId> {
        self.document.get_pages().into_values().collect()
    }
}

/// Loads source PDFs and rejects the ones that cannot be assembled.
#[derive(Debug, Clone, Default)]
pub struct PdfReader;

impl PdfReader {
    /// Create a new PDF reader.
    pub fn new() -> Self {
        Self
    }

    /// Check that a path exists and is a regular file.
    ///
    /// # Errors
    ///
    /// Returns [`PageBindError::UnreadableSource`] if the path is missing or
    /// is a directory.
    pub fn check_path_exists(path: &Path) -> Result<()> {
        let exists = path
            .try_exists()
            .map_err(|e| PageBindError::unreadable_source(path, e.to_string()))?;

        if !exists {
            return Err(PageBindError::unreadable_source(path, "file not found"));
        }

        if !path.is_file() {
            return Err(PageBindError::unreadable_source(path, "not a file"));
        }

        Ok(())
    }

    /// Load a single PDF document.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - File cannot be read or is not a valid PDF ([`PageBindError::UnreadableSource`])
    /// - PDF is encrypted ([`PageBindError::UnsupportedFeature`])
    /// - PDF has no pages ([`PageBindError::UnreadableSource`])
    pub fn load(&self, path: &Path) -> Result<LoadedPdf> {
        Self::check_path_exists(path)?;

        let bytes =
            std::fs::read(path).map_err(|e| PageBindError::unreadable_source(path, e.to_string()))?;
        let file_size = bytes.len();

        let document = Document::load_mem(&bytes).map_err(|e| match e {
            lopdf::Error::Decryption(_) | lopdf::Error::UnsupportedSecurityHandler(_) => {
                PageBindError::unsupported_feature(path, "encryption")
            }
            other => PageBindError::unreadable_source(path, other.to_string()),
        })?;

        // An empty user password lets lopdf decrypt on load; the trailer keeps
        // its Encrypt entry either way.
        if is_encrypted(&document) {
            return Err(PageBindError::unsupported_feature(path, "encryption"));
        }

        let page_count = document.get_pages().len();
        if page_count == 0 {
            return Err(PageBindError::unreadable_source(path, "PDF has no pages"));
        }

        tracing::debug!(path = %path.display(), page_count, file_size, "loaded pdf");

        Ok(LoadedPdf {
            document,
            page_count,
        })
    }
}

fn is_encrypted(document: &Document) -> bool {
    document.encryption_state.is_some() || document.trailer.has(b"Encrypt")
}
