//! Source kind detection and image probing.

use image::ImageReader;
use std::path::Path;

use crate::error::{PageBindError, Result};
use crate::page::{ImageFormat, SourceKind};

/// Extensions of native multi-page documents.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["pdf"];

/// Extensions of standalone images.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff", "webp"];

/// Determine the source kind from the file extension (case-insensitive).
///
/// Returns `None` for unsupported or missing extensions.
///
/// # Examples
///
/// ```
/// use pagebind::page::SourceKind;
/// use pagebind::source::detect_kind;
/// use std::path::Path;
///
/// assert_eq!(detect_kind(Path::new("scan.PDF")), Some(SourceKind::DocumentPage));
/// assert_eq!(detect_kind(Path::new("photo.jpeg")), Some(SourceKind::ImagePage));
/// assert_eq!(detect_kind(Path::new("notes.txt")), None);
/// ```
pub fn detect_kind(path: &Path) -> Option<SourceKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();

    if DOCUMENT_EXTENSIONS.contains(&ext.as_str()) {
        Some(SourceKind::DocumentPage)
    } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(SourceKind::ImagePage)
    } else {
        None
    }
}

/// Whether the path has an extension the adapter accepts.
pub fn is_supported_path(path: &Path) -> bool {
    detect_kind(path).is_some()
}

/// Image format implied by a file extension.
pub fn format_from_extension(path: &Path) -> Option<ImageFormat> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some(ImageFormat::Png),
        "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
        "bmp" => Some(ImageFormat::Bmp),
        "tif" | "tiff" => Some(ImageFormat::Tiff),
        "webp" => Some(ImageFormat::WebP),
        _ => None,
    }
}

fn from_image_crate(format: image::ImageFormat) -> Option<ImageFormat> {
    match format {
        image::ImageFormat::Png => Some(ImageFormat::Png),
        image::ImageFormat::Jpeg => Some(ImageFormat::Jpeg),
        image::ImageFormat::Bmp => Some(ImageFormat::Bmp),
        image::ImageFormat::Tiff => Some(ImageFormat::Tiff),
        image::ImageFormat::WebP => Some(ImageFormat::WebP),
        _ => None,
    }
}

/// Header information of an image source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    /// Container format, taken from the file content when recognizable.
    pub format: ImageFormat,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Read an image header without decoding the pixel data.
///
/// The format is sniffed from the content first, so a JPEG saved with a
/// `.png` extension is still handled as JPEG.
///
/// # Errors
///
/// Returns [`PageBindError::UnreadableSource`] if the file cannot be opened,
/// the format is not supported, or the header is invalid.
pub fn probe_image(path: &Path) -> Result<ImageInfo> {
    let mut reader = ImageReader::open(path)
        .map_err(|e| PageBindError::unreadable_source(path, e.to_string()))?
        .with_guessed_format()
        .map_err(|e| PageBindError::unreadable_source(path, e.to_string()))?;

    let format = reader
        .format()
        .and_then(from_image_crate)
        .or_else(|| format_from_extension(path))
        .ok_or_else(|| PageBindError::unreadable_source(path, "unsupported image format"))?;

    reader.set_format(format.to_image_crate());
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| PageBindError::unreadable_source(path, e.to_string()))?;

    if width == 0 || height == 0 {
        return Err(PageBindError::unreadable_source(path, "image has no pixels"));
    }

    Ok(ImageInfo {
        format,
        width,
        height,
    })
}
