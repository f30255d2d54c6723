//! CLI argument parsing for pagebind.
//!
//! Defines the command-line interface with `clap` and turns parsed arguments
//! into a validated [`Config`].

use clap::Parser;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use pagebind::config::{
    CompressionLevel, Config, DEFAULT_IMAGE_DPI, ImageLayout, Metadata, OverwriteMode, PageEdit,
    PaperSize, ThumbnailSize,
};
use pagebind::error::{PageBindError, Result};
use pagebind::utils::{collect_paths_for_patterns, is_glob_pattern};

/// Assemble PDFs and images into a single PDF, page by page.
///
/// Every page of every input becomes its own unit: pages can be moved or
/// removed before the result is written. Images become pages of their own.
#[derive(Parser, Debug)]
#[command(name = "pagebind")]
#[command(version)]
#[command(about = "Assemble PDFs and images into a single PDF, page by page", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Input files, PDFs or images (in order)
    ///
    /// Glob patterns are expanded and sorted.
    ///
    /// Examples:
    ///   pagebind cover.png report.pdf -o bundle.pdf
    ///   pagebind scans/*.jpg -o scans.pdf
    #[arg(value_name = "FILE")]
    pub inputs: Vec<PathBuf>,

    /// Output PDF file path (".pdf" is appended when missing)
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Move a page: PAGE:POSITION, both 1-based (repeatable, applied in order)
    ///
    /// Page numbers refer to the arrangement as it stands when the move is
    /// applied. Positions past the end move the page to the end.
    #[arg(short = 'm', long = "move", value_name = "PAGE:POS")]
    pub moves: Vec<String>,

    /// Remove a page by its 1-based number (repeatable)
    ///
    /// Removals are applied after all moves, numbered against the
    /// arrangement the moves produced.
    #[arg(short = 'r', long = "remove", value_name = "PAGE")]
    pub removes: Vec<String>,

    /// Write a PNG preview of every page into DIR
    #[arg(short, long, value_name = "DIR")]
    pub thumbnails: Option<PathBuf>,

    /// Preview box for --thumbnails, as WIDTHxHEIGHT in pixels
    #[arg(long, value_name = "WxH", default_value = "180x240")]
    pub thumbnail_size: String,

    /// Dry run - print the final arrangement without writing output
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Print the arrangement as JSON (implies --dry-run)
    #[arg(long)]
    pub json: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Force overwrite of existing output file without confirmation
    #[arg(short, long)]
    pub force: bool,

    /// Never overwrite existing output file
    #[arg(long, conflicts_with = "force")]
    pub no_clobber: bool,

    /// Suppress all non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Compression level for output PDF
    ///
    /// - none: No compression
    /// - standard: Compress streams (default)
    /// - maximum: Compress streams and drop unreferenced objects
    #[arg(short, long, value_name = "LEVEL", default_value = "standard")]
    #[arg(value_parser = ["none", "standard", "maximum"])]
    pub compression: String,

    /// Lay image pages out on fixed paper instead of at their own size
    #[arg(long, value_name = "SIZE")]
    #[arg(value_parser = ["a4", "letter"])]
    pub paper: Option<String>,

    /// Margin around images on --paper pages, in points
    #[arg(long, value_name = "PT", default_value_t = 36.0, requires = "paper")]
    pub margin: f32,

    /// Resolution used to size image pages when --paper is not given
    #[arg(long, value_name = "N", default_value_t = DEFAULT_IMAGE_DPI, conflicts_with = "paper")]
    pub dpi: f32,

    /// Set title metadata for output PDF
    #[arg(long, value_name = "TEXT")]
    pub title: Option<String>,

    /// Set author metadata for output PDF
    #[arg(long, value_name = "TEXT")]
    pub author: Option<String>,

    /// Set subject metadata for output PDF
    #[arg(long, value_name = "TEXT")]
    pub subject: Option<String>,

    /// Set keywords metadata for output PDF (comma-separated)
    #[arg(long, value_name = "TEXT")]
    pub keywords: Option<String>,

    /// Skip inputs that cannot be read instead of stopping
    #[arg(long)]
    pub continue_on_error: bool,

    /// Read input file list from a file (one path per line, '#' comments)
    ///
    /// Listed files are added after the files given on the command line.
    #[arg(long, value_name = "FILE")]
    pub input_list: Option<PathBuf>,

    /// Number of files read in parallel (default: number of CPU cores)
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,
}

impl Cli {
    /// Convert CLI arguments into a validated Config.
    ///
    /// # Errors
    ///
    /// Returns [`PageBindError::InvalidConfig`] if an option cannot be parsed
    /// or the resulting configuration is invalid.
    pub fn to_config(&self) -> Result<Config> {
        let compression = CompressionLevel::from_str(&self.compression)?;

        let overwrite_mode = if self.force {
            OverwriteMode::Force
        } else if self.no_clobber {
            OverwriteMode::NoClobber
        } else {
            OverwriteMode::Prompt
        };

        let image_layout = match self.paper {
            Some(ref paper) => ImageLayout::Paper {
                size: PaperSize::from_str(paper)?,
                margin: self.margin,
            },
            None => ImageLayout::Native { dpi: self.dpi },
        };

        let mut edits = Vec::with_capacity(self.moves.len() + self.removes.len());
        for value in &self.moves {
            edits.push(
                PageEdit::parse_move(value)
                    .map_err(|e| PageBindError::invalid_config(e.to_string()))?,
            );
        }
        for value in &self.removes {
            edits.push(
                PageEdit::parse_remove(value)
                    .map_err(|e| PageBindError::invalid_config(e.to_string()))?,
            );
        }

        let metadata = Metadata::new(
            self.title.clone(),
            self.author.clone(),
            self.subject.clone(),
            self.keywords.clone(),
        );

        let mut config = Config {
            inputs: self.inputs.clone(),
            output: self.output.clone(),
            dry_run: self.dry_run || self.json,
            verbose: self.verbose,
            quiet: self.quiet,
            overwrite_mode,
            compression,
            metadata,
            image_layout,
            thumbnail_size: parse_thumbnail_size(&self.thumbnail_size)?,
            thumbnail_dir: self.thumbnails.clone(),
            edits,
            continue_on_error: self.continue_on_error,
            jobs: self.jobs,
        };
        config.output = config.normalized_output();

        config.validate().map_err(|e| {
            PageBindError::invalid_config(format!("Configuration validation failed: {e}"))
        })?;

        Ok(config)
    }

    /// All input paths: command-line inputs with globs expanded, followed by
    /// the entries of `--input-list`.
    ///
    /// # Errors
    ///
    /// Returns an error if a glob is invalid, the input list cannot be read,
    /// or no inputs remain.
    pub async fn get_all_inputs(&self) -> Result<Vec<PathBuf>> {
        let mut all_inputs = Vec::with_capacity(self.inputs.len());

        for input in &self.inputs {
            let text = input.to_string_lossy();
            if is_glob_pattern(&text) {
                let matched = collect_paths_for_patterns([text.as_ref()])?;
                if matched.is_empty() {
                    return Err(PageBindError::invalid_config(format!(
                        "Pattern matched no files: {text}"
                    )));
                }
                all_inputs.extend(matched);
            } else {
                all_inputs.push(input.clone());
            }
        }

        if let Some(ref input_list_path) = self.input_list {
            all_inputs.extend(read_input_list(input_list_path).await?);
        }

        if all_inputs.is_empty() {
            return Err(PageBindError::invalid_config("No input files specified"));
        }

        Ok(all_inputs)
    }
}

/// Parse `WIDTHxHEIGHT`.
fn parse_thumbnail_size(s: &str) -> Result<ThumbnailSize> {
    let invalid = || {
        PageBindError::invalid_config(format!(
            "Invalid thumbnail size: {s}. Expected format like '180x240'"
        ))
    };

    let (width, height) = s.split_once(['x', 'X']).ok_or_else(invalid)?;
    let width: u32 = width.trim().parse().map_err(|_| invalid())?;
    let height: u32 = height.trim().parse().map_err(|_| invalid())?;

    Ok(ThumbnailSize::new(width, height))
}

/// Read input paths from a file, one per line. Blank lines and lines
/// starting with `#` are skipped.
async fn read_input_list(path: &Path) -> Result<Vec<PathBuf>> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        PageBindError::FailedToReadInputList {
            path: path.to_path_buf(),
            source: e,
        }
    })?;

    let mut paths = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.contains('\0') {
            return Err(PageBindError::InvalidInputList {
                path: path.to_path_buf(),
                line_number: idx + 1,
                details: "Path contains a NUL byte".to_string(),
            });
        }

        paths.push(PathBuf::from(line));
    }

    Ok(paths)
}
