//! Configuration module for pagebind.
//!
//! This module holds the validated, normalized settings that drive a session:
//! - Export options (compression, metadata, image page layout)
//! - Preview settings (thumbnail box, output directory)
//! - Arrangement edits requested on the command line
//! - Output behavior (overwrite mode, verbosity)

use anyhow::{Context, Result, bail};

use crate::PageBindError;
use std::{path::PathBuf, str::FromStr};

/// Compression level for the output PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionLevel {
    /// No compression - streams are written as they are.
    None,
    /// Compress uncompressed streams.
    #[default]
    Standard,
    /// Compress streams and prune unreferenced objects.
    Maximum,
}

impl FromStr for CompressionLevel {
    type Err = PageBindError;

    /// Parse compression level from "none", "standard" or "maximum".
    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "standard" => Ok(Self::Standard),
            "maximum" => Ok(Self::Maximum),
            _ => Err(PageBindError::invalid_config(format!(
                "Invalid compression level: {s}. Must be one of: none, standard, maximum"
            ))),
        }
    }
}

/// Standard paper sizes for image pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaperSize {
    /// ISO A4, 595 x 842 pt.
    A4,
    /// US Letter, 612 x 792 pt.
    Letter,
}

impl PaperSize {
    /// Portrait dimensions in points (width, height).
    pub fn dimensions(&self) -> (f32, f32) {
        match self {
            Self::A4 => (595.0, 842.0),
            Self::Letter => (612.0, 792.0),
        }
    }
}

impl FromStr for PaperSize {
    type Err = PageBindError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "a4" => Ok(Self::A4),
            "letter" => Ok(Self::Letter),
            _ => Err(PageBindError::invalid_config(format!(
                "Invalid paper size: {s}. Must be one of: a4, letter"
            ))),
        }
    }
}

/// Default resolution used to size image pages.
pub const DEFAULT_IMAGE_DPI: f32 = 300.0;

/// How image pages are laid out in the output.
///
/// Both layouts fit the image to the page and preserve its aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImageLayout {
    /// The page takes the image's own size at the given resolution.
    Native {
        /// Pixels per inch used to convert pixels to points.
        dpi: f32,
    },
    /// Fixed paper size; the image is scaled to fit inside the margins and centered.
    Paper {
        /// Paper size. Orientation follows the image.
        size: PaperSize,
        /// Margin on every side, in points.
        margin: f32,
    },
}

impl Default for ImageLayout {
    fn default() -> Self {
        Self::Native {
            dpi: DEFAULT_IMAGE_DPI,
        }
    }
}

/// Box that previews are fitted into, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailSize {
    /// Maximum width.
    pub width: u32,
    /// Maximum height.
    pub height: u32,
}

impl ThumbnailSize {
    /// Create a thumbnail box.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Largest size with the given aspect ratio that fits inside this box.
    ///
    /// Never returns a zero dimension.
    pub fn fit(&self, width: f32, height: f32) -> (u32, u32) {
        let width = width.max(1.0);
        let height = height.max(1.0);
        let scale = (self.width as f32 / width).min(self.height as f32 / height);
        let fitted_w = (width * scale).round().max(1.0) as u32;
        let fitted_h = (height * scale).round().max(1.0) as u32;
        (fitted_w.min(self.width), fitted_h.min(self.height))
    }
}

impl Default for ThumbnailSize {
    fn default() -> Self {
        Self::new(180, 240)
    }
}

/// PDF metadata to set on the output document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    /// Document title.
    pub title: Option<String>,
    /// Document author.
    pub author: Option<String>,
    /// Document subject.
    pub subject: Option<String>,
    /// Document keywords (comma-separated).
    pub keywords: Option<String>,
}

impl Metadata {
    /// Check if any metadata fields are set.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.subject.is_none()
            && self.keywords.is_none()
    }

    /// Create metadata from optional strings, trimming whitespace.
    pub fn new(
        title: Option<String>,
        author: Option<String>,
        subject: Option<String>,
        keywords: Option<String>,
    ) -> Self {
        let to_string_opt = |opt: Option<String>| {
            opt.filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().to_string())
        };

        Self {
            title: to_string_opt(title),
            author: to_string_opt(author),
            subject: to_string_opt(subject),
            keywords: to_string_opt(keywords),
        }
    }
}

/// Output file overwrite behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwriteMode {
    /// Prompt the user before overwriting (default).
    #[default]
    Prompt,
    /// Always overwrite without prompting.
    Force,
    /// Never overwrite, error if file exists.
    NoClobber,
}

/// One arrangement edit, addressed by 1-based page numbers in the arrangement
/// as it stands when the edit is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEdit {
    /// Move page `page` so it ends up at position `position`.
    Move {
        /// Current 1-based page number.
        page: usize,
        /// Target 1-based position (clamped to the end).
        position: usize,
    },
    /// Remove page `page`.
    Remove {
        /// Current 1-based page number.
        page: usize,
    },
}

impl PageEdit {
    /// Parse a move edit written as `PAGE:POSITION`, e.g. `5:1`.
    pub fn parse_move(s: &str) -> Result<Self> {
        let (page, position) = s
            .split_once(':')
            .with_context(|| format!("Invalid move: {s}. Expected format like '5:1'"))?;

        let page = parse_page_number(page)?;
        let position = parse_page_number(position)?;

        Ok(Self::Move { page, position })
    }

    /// Parse a remove edit written as a page number.
    pub fn parse_remove(s: &str) -> Result<Self> {
        Ok(Self::Remove {
            page: parse_page_number(s)?,
        })
    }
}

fn parse_page_number(s: &str) -> Result<usize> {
    let page: usize = s
        .trim()
        .parse()
        .with_context(|| format!("Invalid page number: {s}"))?;

    if page == 0 {
        bail!("Page numbers must be positive (1-indexed)");
    }

    Ok(page)
}

/// Complete configuration for an assembly run.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Input files (PDFs and images), in ingestion order.
    pub inputs: Vec<PathBuf>,

    /// Output PDF file path.
    pub output: PathBuf,

    /// Dry run - ingest and arrange without writing output.
    pub dry_run: bool,

    /// Verbose output mode.
    pub verbose: bool,

    /// Quiet mode - suppress non-error output.
    pub quiet: bool,

    /// File overwrite behavior.
    pub overwrite_mode: OverwriteMode,

    /// Compression level for output.
    pub compression: CompressionLevel,

    /// Metadata to set on output document.
    pub metadata: Metadata,

    /// Layout used for image pages.
    pub image_layout: ImageLayout,

    /// Box previews are fitted into.
    pub thumbnail_size: ThumbnailSize,

    /// Directory to write page previews into, if any.
    pub thumbnail_dir: Option<PathBuf>,

    /// Arrangement edits, applied in order after ingestion.
    pub edits: Vec<PageEdit>,

    /// Skip unreadable sources instead of stopping.
    pub continue_on_error: bool,

    /// Number of parallel jobs (None = auto-detect).
    pub jobs: Option<usize>,
}

impl Config {
    /// Returns a reference to inputs.
    pub fn inputs(&self) -> &[PathBuf] {
        self.inputs.as_ref()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No input files are specified
    /// - Verbose and quiet modes are both enabled
    /// - Jobs count is zero
    /// - The output path is also an input
    /// - The image resolution or margin is not usable
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            bail!("No input files specified");
        }

        if self.verbose && self.quiet {
            bail!("Cannot use both --verbose and --quiet");
        }

        if let Some(jobs) = self.jobs
            && jobs == 0
        {
            bail!("Number of jobs must be at least 1");
        }

        for input in &self.inputs {
            if input == &self.output {
                bail!(
                    "Output file cannot be the same as an input file: {}",
                    self.output.display()
                );
            }
        }

        match self.image_layout {
            ImageLayout::Native { dpi } if !(dpi > 0.0 && dpi.is_finite()) => {
                bail!("Image resolution must be a positive number, got {dpi}");
            }
            ImageLayout::Paper { size, margin } => {
                let (width, height) = size.dimensions();
                if !(margin >= 0.0) || margin * 2.0 >= width.min(height) {
                    bail!("Margin {margin} does not leave room on the page");
                }
            }
            _ => {}
        }

        if self.thumbnail_size.width == 0 || self.thumbnail_size.height == 0 {
            bail!("Thumbnail size must be non-zero");
        }

        Ok(())
    }

    /// Output path with a `.pdf` extension appended when missing.
    pub fn normalized_output(&self) -> PathBuf {
        let has_pdf_ext = self
            .output
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if has_pdf_ext {
            self.output.clone()
        } else {
            let mut name = self.output.clone().into_os_string();
            name.push(".pdf");
            PathBuf::from(name)
        }
    }

    /// Get the effective number of parallel jobs.
    ///
    /// Returns the configured job count, or the number of CPU cores if auto-detect.
    pub fn effective_jobs(&self) -> usize {
        self.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}
