//! Preview cache behaviour through a session.

use pagebind::config::ThumbnailSize;
use pagebind::error::PageBindError;
use pagebind::session::Session;
use std::sync::Arc;
use tempfile::TempDir;

use crate::common::{write_image, write_pdf};

#[tokio::test]
async fn test_previews_follow_pages_across_moves() {
    let temp_dir = TempDir::new().unwrap();
    let wide = write_image(temp_dir.path(), "wide.png", 400, 100);
    let doc = write_pdf(temp_dir.path(), "doc.pdf", 2);

    let mut session = Session::default();
    session.add_file(&wide).unwrap();
    session.add_file(&doc).unwrap();

    let ids = session.collection().ids();
    let before = session.thumbnails().get_async(ids[0]).await.unwrap();
    assert_eq!((before.width(), before.height()), (180, 45));

    session.move_page(ids[0], 2).unwrap();
    let after = session.thumbnails().get(ids[0]).unwrap();

    // Same cached preview, now at the last position.
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(session.collection().position(ids[0]), Some(2));
}

#[tokio::test]
async fn test_removal_evicts_preview() {
    let temp_dir = TempDir::new().unwrap();
    let doc = write_pdf(temp_dir.path(), "doc.pdf", 3);

    let mut session = Session::default();
    session.add_file(&doc).unwrap();
    let ids = session.collection().ids();

    let results = session.thumbnails().render_all(&ids, 3).await;
    assert!(results.iter().all(|(_, result)| result.is_ok()));
    assert!(ids.iter().all(|id| session.thumbnails().is_rendered(*id)));

    session.remove_page(ids[1]).unwrap();

    assert_eq!(session.thumbnails().len(), 2);
    assert!(matches!(
        session.thumbnails().get(ids[1]),
        Err(PageBindError::UnknownPageId { .. })
    ));
    assert!(session.thumbnails().get(ids[0]).is_ok());
}

#[tokio::test]
async fn test_preview_of_vanished_image() {
    let temp_dir = TempDir::new().unwrap();
    let photo = write_image(temp_dir.path(), "photo.png", 20, 20);

    let mut session = Session::new(ThumbnailSize::new(32, 32));
    session.add_file(&photo).unwrap();
    std::fs::remove_file(&photo).unwrap();

    let id = session.collection().ids()[0];
    assert!(matches!(
        session.thumbnails().get(id),
        Err(PageBindError::PreviewUnavailable { .. })
    ));

    let placeholder = session.thumbnails().get_or_placeholder(id).unwrap();
    assert!(placeholder.is_placeholder());
    assert_eq!((placeholder.width(), placeholder.height()), (32, 32));
}

#[tokio::test]
async fn test_write_thumbnails_by_position() {
    let temp_dir = TempDir::new().unwrap();
    let doc = write_pdf(temp_dir.path(), "doc.pdf", 2);
    let photo = write_image(temp_dir.path(), "photo.jpg", 90, 120);

    let mut session = Session::default();
    session.add_file(&doc).unwrap();
    session.add_file(&photo).unwrap();

    let out_dir = temp_dir.path().join("previews");
    let report = session.write_thumbnails(&out_dir, 2).await.unwrap();

    assert!(report.placeholders.is_empty());
    assert_eq!(report.written.len(), 3);

    let third = image::open(out_dir.join("page-003.png")).unwrap();
    assert_eq!((third.width(), third.height()), (180, 240));
    let first = image::open(out_dir.join("page-001.png")).unwrap();
    assert_eq!((first.width(), first.height()), (180, 233));
}
