//! Cancelling exports and editing while an export runs.

use pagebind::error::PageBindError;
use pagebind::export::{CancelToken, ExportOptions, ExportProgress, Exporter};
use pagebind::session::Session;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use crate::common::write_pdf;

#[tokio::test]
async fn test_cancelled_before_start() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_pdf(temp_dir.path(), "doc.pdf", 4);
    let output = temp_dir.path().join("out.pdf");

    let mut session = Session::default();
    session.add_file(&source).unwrap();

    let cancel = CancelToken::new();
    cancel.cancel();

    let err = Exporter::default()
        .export_to(session.snapshot(), &output, cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, PageBindError::Cancelled));
    assert!(!output.exists());
    assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    assert_eq!(session.collection().len(), 4);
}

#[tokio::test]
async fn test_cancel_from_progress_callback() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_pdf(temp_dir.path(), "doc.pdf", 5);
    let output = temp_dir.path().join("out.pdf");

    let mut session = Session::default();
    session.add_file(&source).unwrap();

    let cancel = CancelToken::new();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let callback_cancel = cancel.clone();
    let callback_seen = Arc::clone(&seen);
    let exporter = Exporter::new(ExportOptions::default()).with_progress(Arc::new(
        move |progress: ExportProgress| {
            callback_seen.lock().unwrap().push(progress.done);
            if progress.done == 2 {
                callback_cancel.cancel();
            }
        },
    ));

    let err = exporter
        .export_to(session.snapshot(), &output, cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, PageBindError::Cancelled));
    assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    assert!(!output.exists());
}

#[tokio::test]
async fn test_edits_during_export_do_not_leak_in() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_pdf(temp_dir.path(), "doc.pdf", 3);
    let output = temp_dir.path().join("out.pdf");

    let mut session = Session::default();
    session.add_file(&source).unwrap();

    let handle = session.spawn_export(output.clone(), ExportOptions::default(), None);
    let token = handle.cancel_token();

    session.clear();
    session.add_file(&source).unwrap();
    session.add_file(&source).unwrap();

    let stats = handle.wait().await.unwrap();
    assert_eq!(stats.pages_written, 3);
    assert!(!token.is_cancelled());
    assert_eq!(session.collection().len(), 6);
    assert!(output.exists());
}
