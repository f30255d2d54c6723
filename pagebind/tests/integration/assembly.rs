//! End-to-end assembly: ingest, rearrange, export, read back.

use lopdf::{Document, Object};
use pagebind::collection::PageCollection;
use pagebind::config::{CompressionLevel, ImageLayout, Metadata, PageEdit, PaperSize};
use pagebind::export::{ExportOptions, Exporter};
use pagebind::page::SourceKind;
use pagebind::session::Session;
use tempfile::TempDir;

use crate::common::{
    is_image_page, link_target, media_size, page_text, pages, write_image, write_linked_pdf,
    write_pdf,
};

#[test]
fn test_image_moved_after_document_pages() {
    let temp_dir = TempDir::new().unwrap();
    let a = write_image(temp_dir.path(), "a.png", 60, 40);
    let b = write_pdf(temp_dir.path(), "b.pdf", 2);

    let mut collection = PageCollection::new();
    let adapter = collection.source_adapter();
    collection.append(adapter.ingest(&a).unwrap()).unwrap();
    collection.append(adapter.ingest(&b).unwrap()).unwrap();

    let snapshot = collection.snapshot();
    let kinds: Vec<SourceKind> = snapshot.iter().map(|e| e.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            SourceKind::ImagePage,
            SourceKind::DocumentPage,
            SourceKind::DocumentPage
        ]
    );

    let [a_id, b0, b1] = snapshot.ids()[..] else {
        panic!("expected three pages");
    };
    collection.move_to(a_id, 2).unwrap();
    assert_eq!(collection.ids(), vec![b0, b1, a_id]);

    let bytes = Exporter::default().export(&collection.snapshot()).unwrap();
    let doc = Document::load_mem(&bytes).unwrap();
    let out = pages(&doc);

    assert_eq!(out.len(), 3);
    assert!(page_text(&doc, out[0]).contains("b page 1"));
    assert!(page_text(&doc, out[1]).contains("b page 2"));
    assert!(is_image_page(&doc, out[2]));
    assert!(!is_image_page(&doc, out[0]));
}

#[test]
fn test_removed_middle_page_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let c = write_pdf(temp_dir.path(), "c.pdf", 3);

    let mut collection = PageCollection::new();
    let entries = collection.source_adapter().ingest(&c).unwrap();
    collection.append(entries).unwrap();

    let ids = collection.ids();
    collection.remove(ids[1]).unwrap();
    assert_eq!(collection.ids(), vec![ids[0], ids[2]]);

    let bytes = Exporter::default().export(&collection.snapshot()).unwrap();
    let doc = Document::load_mem(&bytes).unwrap();
    let out = pages(&doc);

    assert_eq!(out.len(), 2);
    assert!(page_text(&doc, out[0]).contains("c page 1"));
    assert!(page_text(&doc, out[1]).contains("c page 3"));
}

#[test]
fn test_removed_page_is_not_reachable_through_links() {
    let temp_dir = TempDir::new().unwrap();
    let c = write_linked_pdf(temp_dir.path(), "linked.pdf");

    let mut collection = PageCollection::new();
    let entries = collection.source_adapter().ingest(&c).unwrap();
    collection.append(entries).unwrap();
    collection.remove(collection.ids()[1]).unwrap();

    let exporter = Exporter::new(ExportOptions {
        compression: CompressionLevel::None,
        ..ExportOptions::default()
    });
    let bytes = exporter.export(&collection.snapshot()).unwrap();
    assert!(!bytes.windows(8).any(|window| window == b"hidden 2"));

    let doc = Document::load_mem(&bytes).unwrap();
    let out = pages(&doc);
    assert_eq!(out.len(), 2);
    assert!(page_text(&doc, out[0]).contains("hidden 1"));
    assert!(page_text(&doc, out[1]).contains("hidden 3"));

    // The link to the removed page is cleared, the one to a kept page follows it.
    assert_eq!(link_target(&doc, out[0], 0), Object::Null);
    assert_eq!(link_target(&doc, out[1], 0), Object::Reference(out[0]));

    let page_objects = doc
        .objects
        .values()
        .filter(|obj| obj.as_dict().is_ok_and(|dict| dict.has_type(b"Page")))
        .count();
    assert_eq!(page_objects, 2);
}

#[test]
fn test_round_trip_preserves_pages() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_pdf(temp_dir.path(), "report.pdf", 6);

    let mut collection = PageCollection::new();
    let entries = collection.source_adapter().ingest(&source).unwrap();
    collection.append(entries).unwrap();

    for compression in [
        CompressionLevel::None,
        CompressionLevel::Standard,
        CompressionLevel::Maximum,
    ] {
        let exporter = Exporter::new(ExportOptions {
            compression,
            ..ExportOptions::default()
        });
        let bytes = exporter.export(&collection.snapshot()).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let out = pages(&doc);

        assert_eq!(out.len(), 6, "{compression:?}");
        for (n, page_id) in out.iter().enumerate() {
            assert!(page_text(&doc, *page_id).contains(&format!("report page {}", n + 1)));
            assert_eq!(media_size(&doc, *page_id), (612.0, 792.0));
        }
    }
}

#[tokio::test]
async fn test_session_edits_and_export() {
    let temp_dir = TempDir::new().unwrap();
    let inputs = vec![
        write_pdf(temp_dir.path(), "x.pdf", 3),
        write_image(temp_dir.path(), "photo.jpg", 300, 150),
        write_pdf(temp_dir.path(), "y.pdf", 1),
    ];

    let mut session = Session::default();
    let report = session.add_files(&inputs, 2, false).await.unwrap();
    assert_eq!(report.pages_added(), 5);

    // [x1, x2, x3, photo, y1] -> move y1 first -> [y1, x1, x2, x3, photo]
    // -> remove pages 3 and 5 -> [y1, x1, x3]
    session
        .apply_edits(&[
            PageEdit::Move {
                page: 5,
                position: 1,
            },
            PageEdit::Remove { page: 5 },
            PageEdit::Remove { page: 3 },
        ])
        .unwrap();

    let labels: Vec<&str> = session
        .collection()
        .entries()
        .iter()
        .map(|entry| entry.label())
        .collect();
    assert_eq!(labels, vec!["y.pdf • p1", "x.pdf • p1", "x.pdf • p3"]);

    let output = temp_dir.path().join("bundle.pdf");
    let stats = session
        .spawn_export(output.clone(), ExportOptions::default(), None)
        .wait()
        .await
        .unwrap();

    assert_eq!(stats.pages_written, 3);
    assert_eq!(stats.document_pages, 3);
    assert_eq!(stats.image_pages, 0);
    assert_eq!(stats.sources_read, 2);

    let doc = Document::load(&output).unwrap();
    let texts: Vec<String> = pages(&doc).iter().map(|id| page_text(&doc, *id)).collect();
    assert!(texts[0].contains("y page 1"));
    assert!(texts[1].contains("x page 1"));
    assert!(texts[2].contains("x page 3"));
}

#[tokio::test]
async fn test_image_layouts() {
    let temp_dir = TempDir::new().unwrap();
    let photo = write_image(temp_dir.path(), "wide.png", 600, 300);

    let mut session = Session::default();
    session.add_file(&photo).unwrap();

    let native = Exporter::default().export(&session.snapshot()).unwrap();
    let doc = Document::load_mem(&native).unwrap();
    let (w, h) = media_size(&doc, pages(&doc)[0]);
    // 600x300 px at 300 dpi is 2x1 inches.
    assert!((w - 144.0).abs() < 0.01 && (h - 72.0).abs() < 0.01);

    let paper = Exporter::new(ExportOptions {
        image_layout: ImageLayout::Paper {
            size: PaperSize::A4,
            margin: 36.0,
        },
        ..ExportOptions::default()
    })
    .export(&session.snapshot())
    .unwrap();
    let doc = Document::load_mem(&paper).unwrap();
    let (w, h) = media_size(&doc, pages(&doc)[0]);
    // A wide image gets a landscape sheet.
    assert!((w - 842.0).abs() < 0.01 && (h - 595.0).abs() < 0.01);
}

#[test]
fn test_metadata_is_written() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_pdf(temp_dir.path(), "doc.pdf", 1);

    let mut session = Session::default();
    session.add_file(&source).unwrap();

    let exporter = Exporter::new(ExportOptions {
        metadata: Metadata::new(
            Some("Quarterly".to_string()),
            None,
            Some("Numbers".to_string()),
            None,
        ),
        ..ExportOptions::default()
    });
    let bytes = exporter.export(&session.snapshot()).unwrap();
    let doc = Document::load_mem(&bytes).unwrap();

    let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
    let info = doc.get_dictionary(info_id).unwrap();
    assert_eq!(info.get(b"Title").unwrap().as_str().unwrap(), b"Quarterly");
    assert_eq!(info.get(b"Subject").unwrap().as_str().unwrap(), b"Numbers");
    assert!(info.get(b"Author").is_err());
}

#[test]
fn test_same_file_added_twice() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_pdf(temp_dir.path(), "twice.pdf", 2);

    let mut session = Session::default();
    let first = session.add_file(&source).unwrap();
    let second = session.add_file(&source).unwrap();
    assert!(first.iter().all(|id| !second.contains(id)));

    let bytes = Exporter::default().export(&session.snapshot()).unwrap();
    let doc = Document::load_mem(&bytes).unwrap();
    let texts: Vec<String> = pages(&doc).iter().map(|id| page_text(&doc, *id)).collect();

    assert_eq!(texts.len(), 4);
    assert!(texts[0].contains("twice page 1"));
    assert!(texts[3].contains("twice page 2"));
}
