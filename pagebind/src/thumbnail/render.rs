//! Preview rendering.
//!
//! [`PreviewRenderer`] is the seam to a rasterizer. The built-in
//! [`BasicPreviewRenderer`] decodes and downscales images, and draws PDF pages
//! as blank page-shaped cards with the page's aspect ratio.

use image::{ImageReader, Rgba, RgbaImage};
use lopdf::Object;

use crate::config::ThumbnailSize;
use crate::error::{PageBindError, Result};
use crate::io::PdfReader;
use crate::page::PageSource;
use crate::utils::find_inherited;

/// Fill colour of page cards.
const CARD_FILL: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Border colour of page cards.
const CARD_BORDER: Rgba<u8> = Rgba([160, 160, 160, 255]);

/// Fill colour of placeholder previews.
pub const PLACEHOLDER_FILL: Rgba<u8> = Rgba([211, 211, 211, 255]);

/// US Letter, used when a page has no usable MediaBox.
const FALLBACK_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

/// Produces a low-fidelity bitmap for a page source.
///
/// Implementations must return an image that fits inside `target`.
pub trait PreviewRenderer: Send + Sync {
    /// Render a preview of `source` fitted inside `target`.
    ///
    /// # Errors
    ///
    /// Any error; the cache reports it as
    /// [`PageBindError::PreviewUnavailable`] for the page concerned.
    fn render(&self, source: &PageSource, target: ThumbnailSize) -> Result<RgbaImage>;
}

/// Default renderer with no rasterizer dependency.
#[derive(Debug, Clone, Default)]
pub struct BasicPreviewRenderer {
    reader: PdfReader,
}

impl BasicPreviewRenderer {
    /// Create the default renderer.
    pub fn new() -> Self {
        Self::default()
    }

    fn render_image(&self, source: &PageSource, target: ThumbnailSize) -> Result<RgbaImage> {
        let path = source.path();
        let decoded = ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|e| PageBindError::unreadable_source(path, e.to_string()))?
            .decode()
            .map_err(|e| PageBindError::unreadable_source(path, e.to_string()))?;

        let (width, height) = target.fit(decoded.width() as f32, decoded.height() as f32);
        Ok(decoded.thumbnail_exact(width, height).to_rgba8())
    }

    fn render_document_page(
        &self,
        source: &PageSource,
        target: ThumbnailSize,
    ) -> Result<RgbaImage> {
        let (page_width, page_height) = self.page_size(source)?;
        let (width, height) = target.fit(page_width, page_height);
        Ok(draw_card(width, height))
    }

    /// Displayed page size in points, rotation applied.
    fn page_size(&self, source: &PageSource) -> Result<(f32, f32)> {
        let path = source.path();
        let loaded = self.reader.load(path)?;
        let page_id = loaded
            .page_ids()
            .get(source.page_index())
            .copied()
            .ok_or_else(|| {
                PageBindError::unreadable_source(
                    path,
                    format!("page {} not found", source.page_index() + 1),
                )
            })?;

        let doc = &loaded.document;
        let (width, height) = find_inherited(doc, page_id, b"MediaBox")
            .and_then(|media_box| box_size(doc, &media_box))
            .unwrap_or(FALLBACK_PAGE_SIZE);

        let rotate = find_inherited(doc, page_id, b"Rotate")
            .and_then(|obj| obj.as_i64().ok())
            .unwrap_or(0);

        if rotate.rem_euclid(180) == 90 {
            Ok((height, width))
        } else {
            Ok((width, height))
        }
    }
}

impl PreviewRenderer for BasicPreviewRenderer {
    fn render(&self, source: &PageSource, target: ThumbnailSize) -> Result<RgbaImage> {
        match source {
            PageSource::Document { .. } => self.render_document_page(source, target),
            PageSource::Image { .. } => self.render_image(source, target),
        }
    }
}

/// Width and height of a `[llx lly urx ury]` rectangle.
fn box_size(doc: &lopdf::Document, rect: &Object) -> Option<(f32, f32)> {
    let rect = match rect {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    let values: Vec<f32> = rect
        .as_array()
        .ok()?
        .iter()
        .filter_map(number)
        .collect();

    match values.as_slice() {
        [llx, lly, urx, ury] => {
            let width = (urx - llx).abs();
            let height = (ury - lly).abs();
            (width > 0.0 && height > 0.0).then_some((width, height))
        }
        _ => None,
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value),
        _ => None,
    }
}

/// White page card with a one pixel border.
fn draw_card(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        if x == 0 || y == 0 || x + 1 == width || y + 1 == height {
            CARD_BORDER
        } else {
            CARD_FILL
        }
    })
}

/// Solid light-grey placeholder filling the whole target box.
pub fn placeholder(target: ThumbnailSize) -> RgbaImage {
    RgbaImage::from_pixel(target.width.max(1), target.height.max(1), PLACEHOLDER_FILL)
}
