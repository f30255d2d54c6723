//! Output writing operations.
//!
//! The final document is only ever published complete:
//! - Bytes go to a temporary sibling file first
//! - The temporary file is flushed and renamed over the destination
//! - On any failure the temporary file is removed
//!
//! # Examples
//!
//! ```no_run
//! use pagebind::export::CancelToken;
//! use pagebind::io::writer::PdfWriter;
//! use std::path::Path;
//!
//! # async fn example(bytes: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let writer = PdfWriter::new();
//! let stats = writer
//!     .write(bytes, Path::new("combined.pdf"), CancelToken::new())
//!     .await?;
//! println!("Wrote {} bytes", stats.file_size);
//! # Ok(())
//! # }
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task;

use crate::error::{PageBindError, Result};
use crate::export::CancelToken;

/// Buffer size for writing (in bytes).
const BUFFER_SIZE: usize = 64 * 1024;

/// Statistics about a write operation.
#[derive(Debug, Clone)]
pub struct WriteStatistics {
    /// Time taken to write the file.
    pub write_time: Duration,

    /// Size of the written file in bytes.
    pub file_size: u64,

    /// Path where the file was written.
    pub output_path: PathBuf,
}

/// Writer that publishes output files atomically.
#[derive(Debug, Clone, Default)]
pub struct PdfWriter;

impl PdfWriter {
    /// Create a new writer.
    pub fn new() -> Self {
        Self
    }

    /// Temporary sibling path the bytes are written to before the rename.
    pub fn partial_path(path: &Path) -> PathBuf {
        let mut name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "output".into());
        name.push(format!(".{}.partial", std::process::id()));
        path.with_file_name(name)
    }

    /// Write bytes to `path` on the calling thread.
    ///
    /// `cancel` is checked once more after the temporary file is complete;
    /// a cancelled write never reaches the rename.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be created
    /// - Writing, flushing or renaming fails
    /// - The write was cancelled ([`PageBindError::Cancelled`])
    ///
    /// No partial file is left behind on failure.
    pub fn write_blocking(
        &self,
        bytes: &[u8],
        path: &Path,
        cancel: &CancelToken,
    ) -> Result<WriteStatistics> {
        let start = Instant::now();
        let write_path = Self::partial_path(path);

        let result = self
            .write_file(bytes, &write_path)
            .and_then(|()| cancel.check())
            .and_then(|()| {
                std::fs::rename(&write_path, path).map_err(|e| PageBindError::FailedToWrite {
                    path: path.to_path_buf(),
                    source: e,
                })
            });

        if let Err(err) = result {
            let _ = std::fs::remove_file(&write_path);
            return Err(err);
        }

        let file_size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        tracing::debug!(path = %path.display(), file_size, "output written");

        Ok(WriteStatistics {
            write_time: start.elapsed(),
            file_size,
            output_path: path.to_path_buf(),
        })
    }

    fn write_file(&self, bytes: &[u8], write_path: &Path) -> Result<()> {
        let file =
            std::fs::File::create(write_path).map_err(|e| PageBindError::FailedToCreateOutput {
                path: write_path.to_path_buf(),
                source: e,
            })?;

        let mut writer = std::io::BufWriter::with_capacity(BUFFER_SIZE, file);

        writer
            .write_all(bytes)
            .and_then(|()| writer.flush())
            .map_err(|e| PageBindError::FailedToWrite {
                path: write_path.to_path_buf(),
                source: e,
            })?;

        writer
            .get_ref()
            .sync_all()
            .map_err(|e| PageBindError::FailedToWrite {
                path: write_path.to_path_buf(),
                source: e,
            })
    }

    /// Write bytes to `path` on the blocking thread pool.
    ///
    /// # Errors
    ///
    /// Same as [`PdfWriter::write_blocking`].
    pub async fn write(
        &self,
        bytes: Vec<u8>,
        path: &Path,
        cancel: CancelToken,
    ) -> Result<WriteStatistics> {
        let writer = self.clone();
        let path = path.to_path_buf();

        task::spawn_blocking(move || writer.write_blocking(&bytes, &path, &cancel))
            .await
            .map_err(|e| PageBindError::other(format!("Write task failed: {e}")))?
    }
}
