//! Fixtures for the integration tests.
//!
//! PDFs and images are generated into a temporary directory so the tests
//! need no checked-in binaries.

#![allow(dead_code)]

use lopdf::{Document, Object, ObjectId, Stream, StringFormat, dictionary};
use std::path::{Path, PathBuf};

/// Write a PDF with `pages` US Letter pages; page `n` shows
/// `"{stem} page {n}"` where `stem` is `name` without `.pdf`.
pub fn write_pdf(dir: &Path, name: &str, pages: usize) -> PathBuf {
    let stem = name.trim_end_matches(".pdf");
    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let kids: Vec<Object> = (1..=pages)
        .map(|n| {
            let text = format!("BT /F1 12 Tf 100 700 Td ({stem} page {n}) Tj ET");
            let content_id = doc.add_object(Stream::new(dictionary! {}, text.into_bytes()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                },
                "Contents" => content_id,
            });
            Object::Reference(page_id)
        })
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let path = dir.join(name);
    doc.save(&path).unwrap();
    path
}

/// Write a three-page PDF whose pages link to each other. Page 1 has a link
/// annotation to page 2 and page 3 a GoTo action to page 1. Page `n` shows
/// `"hidden {n}"`.
pub fn write_linked_pdf(dir: &Path, name: &str) -> PathBuf {
    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();
    let page_ids: Vec<ObjectId> = (0..3).map(|_| doc.new_object_id()).collect();

    let to_second = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Link",
        "Rect" => vec![0.into(), 0.into(), 100.into(), 20.into()],
        "Dest" => vec![page_ids[1].into(), "Fit".into()],
    });
    let to_first = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Link",
        "Rect" => vec![0.into(), 0.into(), 100.into(), 20.into()],
        "A" => dictionary! {
            "S" => "GoTo",
            "D" => vec![page_ids[0].into(), "Fit".into()],
        },
    });
    let annots: [Vec<Object>; 3] = [vec![to_second.into()], Vec::new(), vec![to_first.into()]];

    for (n, (page_id, annots)) in page_ids.iter().zip(annots).enumerate() {
        let text = format!("BT /F1 12 Tf 100 700 Td (hidden {}) Tj ET", n + 1);
        let content_id = doc.add_object(Stream::new(dictionary! {}, text.into_bytes()));
        doc.objects.insert(
            *page_id,
            Object::Dictionary(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Contents" => content_id,
                "Annots" => annots,
            }),
        );
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
            "Count" => 3,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let path = dir.join(name);
    doc.save(&path).unwrap();
    path
}

/// First element of the destination array behind annotation `index` of a
/// page, following either `Dest` or a GoTo action's `D`.
pub fn link_target(doc: &Document, page_id: ObjectId, index: usize) -> Object {
    let annots = doc
        .get_dictionary(page_id)
        .unwrap()
        .get(b"Annots")
        .unwrap()
        .as_array()
        .unwrap();
    let annot = match &annots[index] {
        Object::Reference(id) => doc.get_dictionary(*id).unwrap(),
        Object::Dictionary(dict) => dict,
        other => panic!("unexpected annotation {other:?}"),
    };
    let dest = match annot.get(b"Dest") {
        Ok(dest) => dest,
        Err(_) => annot.get(b"A").unwrap().as_dict().unwrap().get(b"D").unwrap(),
    };
    dest.as_array().unwrap()[0].clone()
}

/// Write a one-page PDF whose trailer declares encryption.
pub fn write_encrypted_pdf(dir: &Path, name: &str) -> PathBuf {
    let path = write_pdf(dir, name, 1);
    let mut doc = Document::load(&path).unwrap();
    let encrypt_id = doc.add_object(dictionary! {
        "Filter" => "Standard",
        "V" => 1,
        "R" => 2,
        "O" => Object::String(vec![0x11; 32], StringFormat::Literal),
        "U" => Object::String(vec![0x22; 32], StringFormat::Literal),
        "P" => -44,
    });
    doc.trailer.set("Encrypt", encrypt_id);
    doc.save(&path).unwrap();
    path
}

/// Write a solid-colour RGB image; the format follows the extension.
pub fn write_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([30, 120, 210]));
    let path = dir.join(name);
    img.save(&path).unwrap();
    path
}

/// Output document's pages in order.
pub fn pages(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}

/// Decoded content stream of a page.
pub fn page_text(doc: &Document, page_id: ObjectId) -> String {
    String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).into_owned()
}

/// Whether the page draws an image XObject.
pub fn is_image_page(doc: &Document, page_id: ObjectId) -> bool {
    let Ok(resources) = doc
        .get_dictionary(page_id)
        .and_then(|page| page.get(b"Resources"))
        .and_then(|res| match res {
            Object::Reference(id) => doc.get_dictionary(*id),
            other => other.as_dict(),
        })
    else {
        return false;
    };

    let Ok(xobjects) = resources.get(b"XObject").and_then(|x| match x {
        Object::Reference(id) => doc.get_dictionary(*id),
        other => other.as_dict(),
    }) else {
        return false;
    };

    xobjects.iter().any(|(_, obj)| {
        obj.as_reference()
            .and_then(|id| doc.get_object(id))
            .and_then(Object::as_stream)
            .is_ok_and(|stream| {
                stream
                    .dict
                    .get(b"Subtype")
                    .and_then(Object::as_name)
                    .is_ok_and(|name| name == b"Image")
            })
    })
}

/// Width and height of a page's MediaBox.
pub fn media_size(doc: &Document, page_id: ObjectId) -> (f32, f32) {
    let media_box = doc
        .get_dictionary(page_id)
        .unwrap()
        .get(b"MediaBox")
        .unwrap()
        .as_array()
        .unwrap();
    let value = |obj: &Object| match obj {
        Object::Integer(i) => *i as f32,
        Object::Real(r) => *r,
        other => panic!("unexpected MediaBox entry {other:?}"),
    };
    (
        value(&media_box[2]) - value(&media_box[0]),
        value(&media_box[3]) - value(&media_box[1]),
    )
}
