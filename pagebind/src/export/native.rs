//! Copying native PDF pages into the output.
//!
//! Pages are copied object-for-object with no re-rendering. Each source PDF
//! is loaded once per export and renumbered above everything already in the
//! output, so objects shared by several pages (fonts, images) are copied
//! once and keep their identity.

use lopdf::{Document, Object, ObjectId};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{PageBindError, Result};
use crate::export::builder::OutputBuilder;
use crate::io::PdfReader;
use crate::utils::{copy_references, find_inherited};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

#[derive(Debug)]
struct SourceDocument {
    document: Document,
    page_ids: Vec<ObjectId>,
}

/// Copies pages of source PDFs into an [`OutputBuilder`].
#[derive(Debug, Default)]
pub struct NativePageCopier {
    reader: PdfReader,
    sources: HashMap<PathBuf, SourceDocument>,
}

impl NativePageCopier {
    /// Create a copier with no sources loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct source PDFs loaded so far.
    pub fn sources_loaded(&self) -> usize {
        self.sources.len()
    }

    /// Copy page `index` (zero-based) of the PDF at `path` to the end of the
    /// output.
    ///
    /// # Errors
    ///
    /// Returns [`PageBindError::SourceUnavailable`] if the file can no longer
    /// be read or parsed, is encrypted, or no longer has page `index`.
    pub fn copy_page(
        &mut self,
        builder: &mut OutputBuilder,
        path: &Path,
        index: usize,
    ) -> Result<ObjectId> {
        let source = self.source(builder, path)?;

        let page_id = source.page_ids.get(index).copied().ok_or_else(|| {
            PageBindError::source_unavailable(
                path,
                format!(
                    "page {} no longer present ({} pages)",
                    index + 1,
                    source.page_ids.len()
                ),
            )
        })?;

        let page = resolve_page(&source.document, page_id)
            .map_err(|e| PageBindError::source_unavailable(path, e.to_string()))?;

        copy_references(
            builder.document_mut(),
            &source.document,
            &Object::Dictionary(page.clone()),
        );

        let output_id = builder.append_page(page);
        builder.link_page(page_id, output_id);
        Ok(output_id)
    }

    /// Loaded source for `path`, loading and renumbering it on first use.
    fn source(&mut self, builder: &mut OutputBuilder, path: &Path) -> Result<&SourceDocument> {
        if !self.sources.contains_key(path) {
            let loaded = self
                .reader
                .load(path)
                .map_err(PageBindError::into_source_unavailable)?;

            let mut document = loaded.document;
            document.renumber_objects_with(builder.max_id() + 1);
            builder.reserve_ids(document.max_id);

            let page_ids = document.get_pages().into_values().collect();
            tracing::debug!(path = %path.display(), pages = loaded.page_count, "source loaded for export");

            self.sources.insert(
                path.to_path_buf(),
                SourceDocument { document, page_ids },
            );
        }

        self.sources
            .get(path)
            .ok_or_else(|| PageBindError::source_unavailable(path, "source not loaded"))
    }
}

/// Standalone copy of a page dictionary with inherited attributes resolved
/// onto it and its tree link removed.
fn resolve_page(doc: &Document, page_id: ObjectId) -> lopdf::Result<lopdf::Dictionary> {
    let mut page = doc.get_dictionary(page_id)?.clone();

    for key in INHERITABLE_KEYS {
        if !page.has(key)
            && let Some(value) = find_inherited(doc, page_id, key)
        {
            page.set(key.to_vec(), value);
        }
    }

    page.remove(b"Parent");
    Ok(page)
}
