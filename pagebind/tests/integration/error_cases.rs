//! Integration tests for error handling and edge cases.

use pagebind::collection::PageCollection;
use pagebind::config::Config;
use pagebind::error::PageBindError;
use pagebind::export::{CancelToken, ExportOptions, Exporter};
use pagebind::page::PageId;
use pagebind::session::Session;
use rstest::rstest;
use std::path::PathBuf;
use tempfile::TempDir;

use crate::common::{write_encrypted_pdf, write_image, write_pdf};

#[tokio::test]
async fn test_export_empty_collection_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out.pdf");

    let session = Session::default();
    let err = session
        .spawn_export(output.clone(), ExportOptions::default(), None)
        .wait()
        .await
        .unwrap_err();

    assert!(matches!(err, PageBindError::EmptyCollection));
    assert!(!output.exists());
    assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}

#[test]
fn test_missing_input() {
    let collection = PageCollection::new();
    let err = collection
        .source_adapter()
        .ingest(&PathBuf::from("/nonexistent/file.pdf"))
        .unwrap_err();

    assert!(matches!(err, PageBindError::UnreadableSource { .. }));
    assert_eq!(err.exit_code(), 3);
}

#[rstest]
#[case("notes.txt", b"plain text".as_slice())]
#[case("broken.pdf", b"%PDF-1.4 not really".as_slice())]
#[case("broken.png", b"\x89PNG but truncated".as_slice())]
#[case("empty.jpg", b"".as_slice())]
fn test_unreadable_inputs(#[case] name: &str, #[case] content: &[u8]) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(name);
    std::fs::write(&path, content).unwrap();

    let mut session = Session::default();
    let err = session.add_file(&path).unwrap_err();

    assert!(
        matches!(err, PageBindError::UnreadableSource { .. }),
        "{name}: {err:?}"
    );
    assert!(session.collection().is_empty());
}

#[test]
fn test_encrypted_input_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_encrypted_pdf(temp_dir.path(), "locked.pdf");

    let mut session = Session::default();
    let err = session.add_file(&path).unwrap_err();

    assert!(matches!(err, PageBindError::UnsupportedFeature { .. }));
    assert!(err.is_recoverable());
}

#[tokio::test]
async fn test_continue_on_error_skips_bad_sources() {
    let temp_dir = TempDir::new().unwrap();
    let good = write_pdf(temp_dir.path(), "good.pdf", 2);
    let locked = write_encrypted_pdf(temp_dir.path(), "locked.pdf");
    let missing = temp_dir.path().join("missing.png");

    let mut session = Session::default();
    let report = session
        .add_files(&[locked, good.clone(), missing], 3, true)
        .await
        .unwrap();

    assert_eq!(report.added, vec![(good, 2)]);
    assert_eq!(report.skipped.len(), 2);
    assert_eq!(session.collection().len(), 2);
}

#[tokio::test]
async fn test_source_deleted_before_export() {
    let temp_dir = TempDir::new().unwrap();
    let keep = write_pdf(temp_dir.path(), "keep.pdf", 1);
    let gone = write_image(temp_dir.path(), "gone.png", 10, 10);
    let output = temp_dir.path().join("out.pdf");

    let mut session = Session::default();
    session.add_file(&keep).unwrap();
    session.add_file(&gone).unwrap();
    std::fs::remove_file(&gone).unwrap();

    let err = Exporter::default()
        .export_to(session.snapshot(), &output, CancelToken::new())
        .await
        .unwrap_err();

    match err {
        PageBindError::SourceUnavailable { ref path, .. } => assert_eq!(path, &gone),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!output.exists());
    assert_eq!(session.collection().len(), 2);
}

#[tokio::test]
async fn test_failed_export_keeps_existing_output() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_pdf(temp_dir.path(), "src.pdf", 1);
    let output = temp_dir.path().join("out.pdf");
    std::fs::write(&output, b"previous contents").unwrap();

    let mut session = Session::default();
    session.add_file(&source).unwrap();
    std::fs::remove_file(&source).unwrap();

    let result = session
        .spawn_export(output.clone(), ExportOptions::default(), None)
        .wait()
        .await;

    assert!(matches!(result, Err(PageBindError::SourceUnavailable { .. })));
    assert_eq!(std::fs::read(&output).unwrap(), b"previous contents");
}

#[test]
fn test_unknown_ids() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_pdf(temp_dir.path(), "doc.pdf", 2);

    let mut session = Session::default();
    session.add_file(&source).unwrap();
    let before = session.collection().ids();

    let stranger = PageId::new(999);
    assert!(matches!(
        session.move_page(stranger, 0),
        Err(PageBindError::UnknownPageId { .. })
    ));
    assert!(matches!(
        session.remove_page(stranger),
        Err(PageBindError::UnknownPageId { .. })
    ));
    assert!(matches!(
        session.thumbnails().get(stranger),
        Err(PageBindError::UnknownPageId { .. })
    ));
    assert_eq!(session.collection().ids(), before);
}

#[test]
fn test_config_validation() {
    let config = Config {
        inputs: vec![],
        output: PathBuf::from("out.pdf"),
        ..Config::default()
    };
    assert!(config.validate().is_err());

    let config = Config {
        inputs: vec![PathBuf::from("out.pdf")],
        output: PathBuf::from("out.pdf"),
        ..Config::default()
    };
    assert!(config.validate().is_err());

    let config = Config {
        inputs: vec![PathBuf::from("a.pdf")],
        output: PathBuf::from("out.pdf"),
        jobs: Some(0),
        ..Config::default()
    };
    assert!(config.validate().is_err());
}
