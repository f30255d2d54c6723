//! Error types for pagebind.
//!
//! Every failure carries enough context (a page identifier or a source path)
//! for the caller to report which page or file caused it.
//!
//! # Error Categories
//!
//! - **Ingestion Errors**: unreadable or encrypted sources
//! - **Collection Errors**: unknown or duplicate page identifiers
//! - **Preview Errors**: a single page could not be rendered
//! - **Export Errors**: empty arrangement, sources gone missing, write failures

use std::io;
use std::path::PathBuf;

use crate::page::PageId;

/// Result type alias for pagebind operations.
pub type Result<T> = std::result::Result<T, PageBindError>;

/// Main error type for pagebind operations.
#[derive(Debug, thiserror::Error)]
pub enum PageBindError {
    /// Source file cannot be parsed as any supported kind.
    #[error("Cannot read source: {}\n  Reason: {reason}", path.display())]
    UnreadableSource {
        /// Path to the source file.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// Source uses a feature that is not supported (encryption, access control).
    #[error(
        "Unsupported feature in source: {}\n  Feature: {feature}\n  \
         Hint: Decrypt the PDF first using 'qpdf --decrypt' or similar tools",
        path.display()
    )]
    UnsupportedFeature {
        /// Path to the source file.
        path: PathBuf,
        /// Name of the unsupported feature.
        feature: String,
    },

    /// No page with this identifier exists in the collection.
    #[error("Unknown page id: {id}")]
    UnknownPageId {
        /// Identifier that was looked up.
        id: PageId,
    },

    /// A page with this identifier is already part of the collection.
    #[error("Duplicate page id: {id}")]
    DuplicatePageId {
        /// Identifier that was appended twice.
        id: PageId,
    },

    /// Preview rendering failed for one page.
    #[error("Preview unavailable for page {id}: {reason}")]
    PreviewUnavailable {
        /// Page whose preview failed.
        id: PageId,
        /// Reason for the failure.
        reason: String,
    },

    /// Export was requested for a collection without pages.
    #[error("Nothing to export: the page collection is empty")]
    EmptyCollection,

    /// A referenced source could not be read during export.
    #[error("Source no longer available: {}\n  Reason: {reason}", path.display())]
    SourceUnavailable {
        /// Path to the source file.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// Output file already exists and overwrite is not allowed.
    #[error(
        "Output file already exists: {}\n  \
         Use --force to overwrite or choose a different output path",
        path.display()
    )]
    OutputExists {
        /// Path to the existing output file.
        path: PathBuf,
    },

    /// Failed to create output file.
    #[error("Failed to create output file: {}\n  Reason: {source}", path.display())]
    FailedToCreateOutput {
        /// Path where output should be created.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to write to output file.
    #[error("Failed to write to output file: {}\n  Reason: {source}", path.display())]
    FailedToWrite {
        /// Path being written to.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to read input list file.
    #[error("Failed to read input list file: {}\n  Reason: {source}", path.display())]
    FailedToReadInputList {
        /// Path to the input list file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Input list file contains an invalid entry.
    #[error(
        "Invalid entry in input list file: {} at line {line_number}\n  Details: {details}",
        path.display()
    )]
    InvalidInputList {
        /// Path to the input list file.
        path: PathBuf,
        /// Line number with the error.
        line_number: usize,
        /// Details about what's invalid.
        details: String,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },

    /// Operation was cancelled by the caller or user.
    #[error("Operation cancelled")]
    Cancelled,

    /// Generic I/O error.
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error.
        #[from]
        source: io::Error,
    },

    /// Generic error with a custom message.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

impl From<anyhow::Error> for PageBindError {
    fn from(err: anyhow::Error) -> Self {
        Self::other(err.to_string())
    }
}

impl PageBindError {
    /// Create an UnreadableSource error.
    pub fn unreadable_source(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::UnreadableSource {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an UnsupportedFeature error.
    pub fn unsupported_feature(path: impl Into<PathBuf>, feature: impl Into<String>) -> Self {
        Self::UnsupportedFeature {
            path: path.into(),
            feature: feature.into(),
        }
    }

    /// Create an UnknownPageId error.
    pub fn unknown_page(id: PageId) -> Self {
        Self::UnknownPageId { id }
    }

    /// Create a PreviewUnavailable error.
    pub fn preview_unavailable(id: PageId, reason: impl Into<String>) -> Self {
        Self::PreviewUnavailable {
            id,
            reason: reason.into(),
        }
    }

    /// Create a SourceUnavailable error.
    pub fn source_unavailable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an OutputExists error.
    pub fn output_exists(path: PathBuf) -> Self {
        Self::OutputExists { path }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an Other error with a custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Turn an ingestion failure into its export-time counterpart.
    ///
    /// A source that was readable at ingestion but fails now is reported as
    /// [`PageBindError::SourceUnavailable`] so the caller can name the file.
    pub fn into_source_unavailable(self) -> Self {
        match self {
            Self::UnreadableSource { path, reason } => Self::SourceUnavailable { path, reason },
            Self::UnsupportedFeature { path, feature } => Self::SourceUnavailable {
                path,
                reason: format!("unsupported feature: {feature}"),
            },
            other => other,
        }
    }

    /// Path of the source file this error concerns, if any.
    pub fn source_path(&self) -> Option<&std::path::Path> {
        match self {
            Self::UnreadableSource { path, .. }
            | Self::UnsupportedFeature { path, .. }
            | Self::SourceUnavailable { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Check if this error only affects one source (skippable with continue-on-error).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnreadableSource { .. }
                | Self::UnsupportedFeature { .. }
                | Self::PreviewUnavailable { .. }
        )
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::UnreadableSource { .. } => 3,
            Self::UnsupportedFeature { .. } => 3,
            Self::UnknownPageId { .. } => 1,
            Self::DuplicatePageId { .. } => 1,
            Self::PreviewUnavailable { .. } => 3,
            Self::EmptyCollection => 1,
            Self::SourceUnavailable { .. } => 2,
            Self::OutputExists { .. } => 4,
            Self::FailedToCreateOutput { .. } => 5,
            Self::FailedToWrite { .. } => 5,
            Self::FailedToReadInputList { .. } => 2,
            Self::InvalidInputList { .. } => 1,
            Self::InvalidConfig { .. } => 1,
            Self::Cancelled => 130, // Standard exit code for SIGINT
            Self::Io { .. } => 5,
            Self::Other { .. } => 1,
        }
    }
}
