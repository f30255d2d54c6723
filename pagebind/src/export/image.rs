//! Synthesizing PDF pages from images.
//!
//! Each image becomes one page carrying the image as an XObject, fitted to
//! the page with its aspect ratio preserved. Baseline 8-bit JPEGs are
//! embedded unchanged (`DCTDecode`); everything else is decoded to 8-bit RGB
//! or grayscale samples and deflated, with alpha carried as a soft mask.

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::{DynamicImage, GenericImageView};
use lopdf::{Dictionary, Object, ObjectId, Stream, dictionary};
use std::io::Write;
use std::path::Path;

use crate::config::ImageLayout;
use crate::error::{PageBindError, Result};
use crate::export::builder::OutputBuilder;
use crate::page::ImageFormat;

/// Points per inch in PDF user space.
const POINTS_PER_INCH: f32 = 72.0;

/// Where the image lands on its page, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Page width.
    pub page_width: f32,
    /// Page height.
    pub page_height: f32,
    /// Left edge of the image.
    pub x: f32,
    /// Bottom edge of the image.
    pub y: f32,
    /// Drawn image width.
    pub width: f32,
    /// Drawn image height.
    pub height: f32,
}

impl Placement {
    /// Compute page size and image rectangle for a `width_px` x `height_px`
    /// image.
    pub fn compute(layout: ImageLayout, width_px: u32, height_px: u32) -> Self {
        let (w, h) = (width_px.max(1) as f32, height_px.max(1) as f32);

        match layout {
            ImageLayout::Native { dpi } => {
                let (width, height) = (w * POINTS_PER_INCH / dpi, h * POINTS_PER_INCH / dpi);
                Self {
                    page_width: width,
                    page_height: height,
                    x: 0.0,
                    y: 0.0,
                    width,
                    height,
                }
            }
            ImageLayout::Paper { size, margin } => {
                let (short, long) = size.dimensions();
                let (page_width, page_height) = if w > h { (long, short) } else { (short, long) };

                let mut avail_w = page_width - 2.0 * margin;
                let mut avail_h = page_height - 2.0 * margin;
                if avail_w <= 0.0 || avail_h <= 0.0 {
                    (avail_w, avail_h) = (page_width, page_height);
                }

                let scale = (avail_w / w).min(avail_h / h);
                let (width, height) = (w * scale, h * scale);
                Self {
                    page_width,
                    page_height,
                    x: (page_width - width) / 2.0,
                    y: (page_height - height) / 2.0,
                    width,
                    height,
                }
            }
        }
    }

    /// Content stream drawing `/Im0` into the placement rectangle.
    fn content(&self) -> Vec<u8> {
        format!(
            "q {:.4} 0 0 {:.4} {:.4} {:.4} cm /Im0 Do Q",
            self.width, self.height, self.x, self.y
        )
        .into_bytes()
    }
}

/// Header fields of a JPEG frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct JpegFrame {
    precision: u8,
    height: u16,
    width: u16,
    components: u8,
}

impl JpegFrame {
    /// Whether PDF viewers can take the stream as-is with a device colour
    /// space matching its component count.
    fn is_passthrough(&self) -> bool {
        self.precision == 8 && matches!(self.components, 1 | 3) && self.width > 0 && self.height > 0
    }
}

/// Read the first start-of-frame header of a JPEG stream.
fn jpeg_frame(bytes: &[u8]) -> Option<JpegFrame> {
    if bytes.get(..2)? != [0xFF, 0xD8] {
        return None;
    }

    let mut pos = 2;
    while pos + 4 <= bytes.len() {
        if bytes[pos] != 0xFF {
            return None;
        }
        let marker = bytes[pos + 1];
        match marker {
            0xFF => {
                pos += 1;
                continue;
            }
            0x01 | 0xD0..=0xD7 => {
                pos += 2;
                continue;
            }
            0xD9 | 0xDA => return None,
            _ => {}
        }

        let length = u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]) as usize;
        let is_frame = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_frame {
            let header = bytes.get(pos + 4..pos + 10)?;
            return Some(JpegFrame {
                precision: header[0],
                height: u16::from_be_bytes([header[1], header[2]]),
                width: u16::from_be_bytes([header[3], header[4]]),
                components: header[5],
            });
        }

        pos += 2 + length;
    }

    None
}

fn deflate(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Builds image pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImagePageEncoder {
    layout: ImageLayout,
}

impl ImagePageEncoder {
    /// Create an encoder for the given layout.
    pub fn new(layout: ImageLayout) -> Self {
        Self { layout }
    }

    /// Read the image at `path` and append it as a page.
    ///
    /// # Errors
    ///
    /// Returns [`PageBindError::SourceUnavailable`] if the file can no longer
    /// be read or decoded.
    pub fn encode(
        &self,
        builder: &mut OutputBuilder,
        path: &Path,
        format: ImageFormat,
    ) -> Result<ObjectId> {
        let bytes = std::fs::read(path)
            .map_err(|e| PageBindError::source_unavailable(path, e.to_string()))?;

        let (xobject_id, width_px, height_px) = match jpeg_frame(&bytes) {
            Some(frame) if format == ImageFormat::Jpeg && frame.is_passthrough() => {
                let id = builder.add_object(jpeg_xobject(&frame, bytes));
                (id, u32::from(frame.width), u32::from(frame.height))
            }
            _ => {
                let decoded = image::load_from_memory(&bytes)
                    .map_err(|e| PageBindError::source_unavailable(path, e.to_string()))?;
                let (w, h) = decoded.dimensions();
                let id = embed_samples(builder, &decoded)
                    .map_err(|e| PageBindError::source_unavailable(path, e.to_string()))?;
                (id, w, h)
            }
        };

        let placement = Placement::compute(self.layout, width_px, height_px);
        let content_id = builder.add_object(Stream::new(Dictionary::new(), placement.content()));

        let page = dictionary! {
            "MediaBox" => vec![
                0.into(),
                0.into(),
                Object::Real(placement.page_width),
                Object::Real(placement.page_height),
            ],
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => xobject_id },
            },
            "Contents" => content_id,
        };

        tracing::debug!(
            path = %path.display(),
            width_px,
            height_px,
            page_width = placement.page_width,
            page_height = placement.page_height,
            "image page synthesized"
        );

        Ok(builder.append_page(page))
    }
}

fn jpeg_xobject(frame: &JpegFrame, bytes: Vec<u8>) -> Stream {
    let color_space = if frame.components == 1 {
        "DeviceGray"
    } else {
        "DeviceRGB"
    };

    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(frame.width),
            "Height" => i64::from(frame.height),
            "ColorSpace" => color_space,
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        bytes,
    )
    .with_compression(false)
}

fn sample_stream(width: u32, height: u32, color_space: &str, samples: &[u8]) -> std::io::Result<Stream> {
    Ok(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width),
            "Height" => i64::from(height),
            "ColorSpace" => color_space,
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        },
        deflate(samples)?,
    )
    .with_compression(false))
}

/// Embed decoded pixels, returning the image XObject id.
fn embed_samples(builder: &mut OutputBuilder, img: &DynamicImage) -> std::io::Result<ObjectId> {
    let (width, height) = img.dimensions();
    let color = img.color();
    let gray = color.channel_count() <= 2;

    let smask_id = if color.has_alpha() {
        let alpha: Vec<u8> = img.to_rgba8().pixels().map(|p| p[3]).collect();
        if alpha.iter().all(|&a| a == u8::MAX) {
            None
        } else {
            Some(builder.add_object(sample_stream(width, height, "DeviceGray", &alpha)?))
        }
    } else {
        None
    };

    let mut stream = if gray {
        sample_stream(width, height, "DeviceGray", img.to_luma8().as_raw())?
    } else {
        sample_stream(width, height, "DeviceRGB", img.to_rgb8().as_raw())?
    };

    if let Some(smask_id) = smask_id {
        stream.dict.set("SMask", smask_id);
    }

    Ok(builder.add_object(stream))
}
