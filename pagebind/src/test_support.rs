//! Fixture builders shared by unit tests.

use lopdf::{Document, Object, Stream, StringFormat, dictionary};
use std::path::{Path, PathBuf};

/// Build an in-memory document whose pages each draw `"{label} page N"`.
///
/// `Resources` and `MediaBox` live on the page tree node, not on the pages,
/// so copying a page exercises attribute inheritance.
pub(crate) fn build_test_document(label: &str, pages: usize) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::with_capacity(pages);
    for n in 1..=pages {
        let content = format!("BT /F1 24 Tf 72 720 Td ({label} page {n}) Tj ET");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc
}

/// Write a test PDF with `pages` pages into `dir`.
pub(crate) fn write_test_pdf(dir: &Path, name: &str, pages: usize) -> PathBuf {
    let label = name.trim_end_matches(".pdf");
    let mut doc = build_test_document(label, pages);
    let path = dir.join(name);
    doc.save(&path).unwrap();
    path
}

/// Write a one-page PDF whose page draws `text`, stored uncompressed.
pub(crate) fn write_text_pdf(dir: &Path, name: &str, text: &str) -> PathBuf {
    let mut doc = build_test_document(text, 1);
    let path = dir.join(name);
    doc.save(&path).unwrap();
    path
}

/// Write a PDF whose trailer references a standard security handler.
pub(crate) fn write_encrypted_marker_pdf(dir: &Path, name: &str) -> PathBuf {
    let mut doc = build_test_document("locked", 1);
    let encrypt_id = doc.add_object(dictionary! {
        "Filter" => "Standard",
        "V" => 1,
        "R" => 2,
        "O" => Object::String(vec![0x41; 32], StringFormat::Literal),
        "U" => Object::String(vec![0x42; 32], StringFormat::Literal),
        "P" => -4,
    });
    doc.trailer.set("Encrypt", encrypt_id);

    let path = dir.join(name);
    doc.save(&path).unwrap();
    path
}

/// Write a gradient RGB image; the format follows the file extension.
pub(crate) fn write_test_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let path = dir.join(name);
    img.save(&path).unwrap();
    path
}

/// Write a half-transparent RGBA PNG.
pub(crate) fn write_test_rgba_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let img = image::RgbaImage::from_fn(width, height, |x, _| {
        image::Rgba([200, 40, 40, if x < width / 2 { 255 } else { 0 }])
    });
    let path = dir.join(name);
    img.save(&path).unwrap();
    path
}

/// Decoded content of a page as text.
pub(crate) fn page_text(doc: &Document, page_id: lopdf::ObjectId) -> String {
    String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).into_owned()
}
