//! Utilities for path collection, object copying and size formatting.

use crate::{Result, error::PageBindError};
use lopdf::{Document, Object, ObjectId};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

/// Page tree nesting deeper than this is treated as malformed.
const MAX_TREE_DEPTH: usize = 64;

/// Dictionary keys that point back up a page tree or into an annotation's
/// owning page. Following them would drag the whole source tree along.
const BACK_REFERENCE_KEYS: [&[u8]; 2] = [b"Parent", b"P"];

/// Expand multiple glob patterns into filesystem paths.
///
/// Accepts anything iterable with items that convert to `&str`, e.g.:
/// `&[&str]`, `Vec<String>`, or `Vec<&str>`.
///
/// Matches of each pattern are returned in sorted order; patterns keep the
/// order they were given in.
///
/// # Errors
///
/// - Propagates `glob` parse errors.
/// - Propagates filesystem errors from glob iterator.
pub fn collect_paths_for_patterns<T>(patterns: T) -> Result<Vec<PathBuf>>
where
    T: IntoIterator,
    T::Item: AsRef<str>,
{
    let mut resolved_paths = Vec::new();

    for pattern in patterns {
        let paths = collect_paths_for_pattern(pattern)?;
        resolved_paths.extend(paths);
    }

    Ok(resolved_paths)
}

fn collect_paths_for_pattern<P: AsRef<str>>(pattern: P) -> Result<Vec<PathBuf>> {
    let paths = glob::glob(pattern.as_ref())
        .map_err(|err| PageBindError::invalid_config(format!("Invalid glob pattern: {err}")))?;

    let mut resolved_paths = paths
        .map(|entry| entry.map_err(|err| PageBindError::other(err.to_string())))
        .collect::<Result<Vec<_>>>()?;
    resolved_paths.sort();

    Ok(resolved_paths)
}

/// Whether an input argument should be treated as a glob pattern.
pub fn is_glob_pattern(input: &str) -> bool {
    input.contains(['*', '?', '['])
}

/// Copy objects reachable from `obj` out of `source` into `target`.
///
/// References are followed recursively and each referenced object is
/// inserted under its existing id, so `source` must already be renumbered
/// above everything in `target`. `Parent` and `P` entries are not followed,
/// and neither are references to page tree nodes: other pages only reach
/// the output when they are exported themselves. Such references are left
/// for [`relink_references`].
pub fn copy_references(target: &mut Document, source: &Document, obj: &Object) {
    match obj {
        Object::Reference(ref_id) => {
            if target.objects.contains_key(ref_id) {
                return;
            }
            let Ok(referenced_obj) = source.get_object(*ref_id) else {
                return;
            };
            if is_page_node(referenced_obj) {
                return;
            }
            target.objects.insert(*ref_id, referenced_obj.clone());
            copy_references(target, source, referenced_obj);
        }
        Object::Dictionary(dict) => {
            for (key, value) in dict.iter() {
                if BACK_REFERENCE_KEYS.contains(&key.as_slice()) {
                    continue;
                }
                copy_references(target, source, value);
            }
        }
        Object::Array(arr) => {
            for item in arr {
                copy_references(target, source, item);
            }
        }
        Object::Stream(stream) => {
            for (key, value) in stream.dict.iter() {
                if BACK_REFERENCE_KEYS.contains(&key.as_slice()) {
                    continue;
                }
                copy_references(target, source, value);
            }
        }
        _ => {}
    }
}

fn is_page_node(obj: &Object) -> bool {
    obj.as_dict()
        .is_ok_and(|dict| dict.has_type(b"Page") || dict.has_type(b"Pages"))
}

/// Rewrite every reference in `doc`: ids found in `links` are replaced by
/// their target, and references to objects `doc` does not contain become
/// `null`.
///
/// Returns the number of references replaced with `null`.
pub fn relink_references(doc: &mut Document, links: &HashMap<ObjectId, ObjectId>) -> usize {
    let present: HashSet<ObjectId> = doc.objects.keys().copied().collect();
    let mut dropped = 0;

    for object in doc.objects.values_mut() {
        relink(object, &present, links, &mut dropped);
    }
    for (_, value) in doc.trailer.iter_mut() {
        relink(value, &present, links, &mut dropped);
    }

    dropped
}

fn relink(
    obj: &mut Object,
    present: &HashSet<ObjectId>,
    links: &HashMap<ObjectId, ObjectId>,
    dropped: &mut usize,
) {
    match obj {
        Object::Reference(id) => {
            if let Some(target) = links.get(id) {
                *id = *target;
            } else if !present.contains(id) {
                *obj = Object::Null;
                *dropped += 1;
            }
        }
        Object::Dictionary(dict) => {
            for (_, value) in dict.iter_mut() {
                relink(value, present, links, dropped);
            }
        }
        Object::Array(arr) => {
            for item in arr.iter_mut() {
                relink(item, present, links, dropped);
            }
        }
        Object::Stream(stream) => {
            for (_, value) in stream.dict.iter_mut() {
                relink(value, present, links, dropped);
            }
        }
        _ => {}
    }
}

/// Look up a page attribute, walking up the page tree when the page itself
/// does not carry it.
///
/// Returns the value as stored, which may be a reference into `doc`.
pub fn find_inherited(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;

    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = current.get(key) {
            return Some(value.clone());
        }
        let parent_id = current.get(b"Parent").and_then(Object::as_reference).ok()?;
        current = doc.get_dictionary(parent_id).ok()?;
    }

    None
}

/// Format a byte count as a human-readable string.
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} bytes")
    }
}
