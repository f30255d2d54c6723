#![no_main]

use libfuzzer_sys::fuzz_target;
use pagebind::collection::PageCollection;
use pagebind::page::{PageEntry, PageId, PageIdAllocator, PageSource};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

fn batch(ids: &PageIdAllocator, pages: usize) -> Vec<PageEntry> {
    let path = Arc::new(PathBuf::from("fuzz.pdf"));
    ids.allocate_many(pages)
        .into_iter()
        .enumerate()
        .map(|(index, id)| {
            PageEntry::new(
                id,
                PageSource::Document {
                    path: Arc::clone(&path),
                    index,
                },
            )
        })
        .collect()
}

fuzz_target!(|data: &[u8]| {
    let ids = PageIdAllocator::new();
    let mut collection = PageCollection::new();
    let mut expected_len = 0usize;

    for op in data.chunks(3) {
        let [kind, a, b] = [op[0], *op.get(1).unwrap_or(&0), *op.get(2).unwrap_or(&0)];
        let current = collection.ids();

        match kind % 4 {
            0 => {
                let pages = usize::from(a % 8);
                collection.append(batch(&ids, pages)).unwrap();
                expected_len += pages;
            }
            1 if !current.is_empty() => {
                let id = current[usize::from(a) % current.len()];
                collection.move_to(id, usize::from(b)).unwrap();
            }
            2 if !current.is_empty() => {
                let id = current[usize::from(a) % current.len()];
                let removed = collection.remove(id).unwrap();
                assert_eq!(removed.id(), id);
                expected_len -= 1;
            }
            3 => {
                // Ids that were never allocated are always rejected.
                let stranger = PageId::new(u64::MAX - u64::from(a));
                assert!(collection.move_to(stranger, 0).is_err());
                assert!(collection.remove(stranger).is_err());
            }
            _ => {}
        }

        let snapshot = collection.snapshot();
        assert_eq!(snapshot.len(), expected_len);
        let unique: HashSet<PageId> = snapshot.iter().map(PageEntry::id).collect();
        assert_eq!(unique.len(), snapshot.len());
    }
});
