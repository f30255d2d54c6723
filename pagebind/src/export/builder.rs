//! Output document under construction.
//!
//! [`OutputBuilder`] owns the document being assembled, appends pages to a
//! single flat page tree, and serializes the result.

use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat, dictionary};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::{CompressionLevel, Metadata};
use crate::error::{PageBindError, Result};
use crate::utils::relink_references;

/// Value written to the Info dictionary's `Producer` and `Creator` keys.
const PRODUCER: &str = concat!("pagebind ", env!("CARGO_PKG_VERSION"));

/// PDF header version of exported documents.
const OUTPUT_VERSION: &str = "1.7";

/// Accumulates pages into one output document.
#[derive(Debug)]
pub struct OutputBuilder {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
    /// Source page id to the output page copied from it.
    links: HashMap<ObjectId, ObjectId>,
}

impl OutputBuilder {
    /// Start an empty document with a catalog and an empty page tree.
    pub fn new() -> Self {
        let mut doc = Document::with_version(OUTPUT_VERSION);
        let pages_id = doc.new_object_id();

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        Self {
            doc,
            pages_id,
            kids: Vec::new(),
            links: HashMap::new(),
        }
    }

    /// Highest object number in use.
    pub fn max_id(&self) -> u32 {
        self.doc.max_id
    }

    /// Mark every object number up to `max_id` as used.
    ///
    /// Needed after importing objects that were numbered elsewhere.
    pub fn reserve_ids(&mut self, max_id: u32) {
        self.doc.max_id = self.doc.max_id.max(max_id);
    }

    pub(crate) fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// Add an object under a fresh id.
    pub fn add_object<T: Into<Object>>(&mut self, object: T) -> ObjectId {
        self.doc.add_object(object)
    }

    /// Append a page dictionary at the end of the page tree.
    ///
    /// Any existing `Parent` is replaced with the output tree root.
    pub fn append_page(&mut self, mut page: Dictionary) -> ObjectId {
        page.set("Type", "Page");
        page.set("Parent", self.pages_id);

        let page_id = self.doc.add_object(page);
        self.kids.push(Object::Reference(page_id));
        page_id
    }

    /// Record that output page `output` was copied from `source`.
    ///
    /// Links and actions that target `source` are pointed at `output` when
    /// the document is finalized. The first copy of a page wins.
    pub fn link_page(&mut self, source: ObjectId, output: ObjectId) {
        self.links.entry(source).or_insert(output);
    }

    /// Number of pages appended so far.
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Write the Info dictionary.
    ///
    /// Set fields of `metadata` are written alongside `Creator`, `Producer`
    /// and `CreationDate`.
    pub fn set_metadata(&mut self, metadata: &Metadata) {
        let mut info = Dictionary::new();

        let fields = [
            ("Title", &metadata.title),
            ("Author", &metadata.author),
            ("Subject", &metadata.subject),
            ("Keywords", &metadata.keywords),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                info.set(key, pdf_text(value));
            }
        }

        info.set("Creator", pdf_text("pagebind"));
        info.set("Producer", pdf_text(PRODUCER));
        info.set("CreationDate", pdf_text(&format_pdf_date(SystemTime::now())));

        let info_id = self.doc.add_object(info);
        self.doc.trailer.set("Info", info_id);
    }

    /// Close the page tree, apply compression and serialize.
    ///
    /// References to source pages are resolved through [`link_page`]; those
    /// to pages that were not exported become `null`.
    ///
    /// [`link_page`]: OutputBuilder::link_page
    ///
    /// # Errors
    ///
    /// Returns [`PageBindError::EmptyCollection`] if no page was appended, or
    /// [`PageBindError::Other`] if serialization fails.
    pub fn finalize(mut self, compression: CompressionLevel) -> Result<Vec<u8>> {
        if self.kids.is_empty() {
            return Err(PageBindError::EmptyCollection);
        }

        let count = self.kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => count,
            }),
        );

        let dropped = relink_references(&mut self.doc, &self.links);
        if dropped > 0 {
            tracing::debug!(dropped, "references to pages outside the export cleared");
        }

        match compression {
            CompressionLevel::None => {}
            CompressionLevel::Standard => {
                self.doc.compress();
            }
            CompressionLevel::Maximum => {
                self.doc.compress();
                self.doc.prune_objects();
            }
        }

        self.doc.renumber_objects();

        let mut bytes = Vec::new();
        self.doc
            .save_to(&mut bytes)
            .map_err(|e| PageBindError::other(format!("Failed to serialize PDF: {e}")))?;

        tracing::debug!(pages = count, bytes = bytes.len(), ?compression, "document finalized");
        Ok(bytes)
    }
}

impl Default for OutputBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Text string for the Info dictionary: PDFDocEncoding-compatible ASCII as a
/// literal, anything else as UTF-16BE with a byte order mark.
fn pdf_text(value: &str) -> Object {
    if value.is_ascii() {
        Object::String(value.as_bytes().to_vec(), StringFormat::Literal)
    } else {
        let mut bytes = vec![0xFE, 0xFF];
        bytes.extend(value.encode_utf16().flat_map(u16::to_be_bytes));
        Object::String(bytes, StringFormat::Hexadecimal)
    }
}

/// Format a time as a PDF date string (`D:YYYYMMDDHHmmSSZ`, UTC).
fn format_pdf_date(time: SystemTime) -> String {
    let secs = time
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let days = (secs / 86_400) as i64;
    let time_of_day = secs % 86_400;
    let (year, month, day) = civil_from_days(days);

    format!(
        "D:{:04}{:02}{:02}{:02}{:02}{:02}Z",
        year,
        month,
        day,
        time_of_day / 3_600,
        (time_of_day % 3_600) / 60,
        time_of_day % 60
    )
}

/// Gregorian date from days since 1970-01-01.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}
