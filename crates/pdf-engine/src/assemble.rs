//! Page-tree assembly for the lopdf backend.
//!
//! A new document is produced from a clone of the source: every requested page gets a fresh
//! page object under a single new `Pages` node, the old page tree is dropped and unreachable
//! objects are pruned.

use crate::{EngineOptions, PdfEngineError};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::BTreeSet;

/// Attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guards against cyclic `Parent` chains in malformed files.
const MAX_TREE_DEPTH: usize = 64;

pub(crate) fn assemble_pages(
    source: &Document,
    page_numbers: &[u32],
    options: &EngineOptions,
) -> Result<Vec<u8>, PdfEngineError> {
    if page_numbers.is_empty() {
        return Err(PdfEngineError::EmptyPageList);
    }

    let page_ids = source.get_pages();
    let page_count = page_ids.len() as u32;
    let old_pages_root = pages_root(source)?;

    let mut doc = source.clone();
    let pages_id = doc.new_object_id();
    let mut kids = Vec::with_capacity(page_numbers.len());

    for &page in page_numbers {
        let page_id =
            *page_ids.get(&page).ok_or(PdfEngineError::PageOutOfRange { page, page_count })?;
        let mut page_dict = source.get_dictionary(page_id)?.clone();

        for key in INHERITABLE_KEYS {
            if page_dict.has(key) {
                continue;
            }
            if let Some(value) = inherited_attribute(source, page_id, key) {
                page_dict.set(key, value);
            }
        }
        page_dict.set("Parent", Object::Reference(pages_id));

        kids.push(Object::Reference(doc.add_object(page_dict)));
    }

    for node in page_tree_nodes(source, old_pages_root) {
        doc.objects.remove(&node);
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(count)),
        ])),
    );

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    doc.prune_objects();
    doc.renumber_objects();
    if options.compress_streams {
        doc.compress();
    }

    let mut buffer = Vec::new();
    let estimate = estimated_output_len(&doc);
    buffer
        .try_reserve(estimate)
        .map_err(|_| PdfEngineError::OutputAllocation { requested: estimate as u64 })?;
    doc.save_to(&mut buffer)?;

    tracing::debug!(pages = page_numbers.len(), bytes = buffer.len(), "assembled document");
    Ok(buffer)
}

fn pages_root(doc: &Document) -> Result<ObjectId, PdfEngineError> {
    let catalog_id = doc.trailer.get(b"Root")?.as_reference()?;
    Ok(doc.get_dictionary(catalog_id)?.get(b"Pages")?.as_reference()?)
}

pub(crate) fn inherited_attribute(
    doc: &Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;

    for _ in 0..MAX_TREE_DEPTH {
        let parent_id = node.get(b"Parent").ok()?.as_reference().ok()?;
        let parent = doc.get_dictionary(parent_id).ok()?;
        if let Ok(value) = parent.get(key) {
            return Some(value.clone());
        }
        node = parent;
    }

    None
}

fn page_tree_nodes(doc: &Document, root: ObjectId) -> Vec<ObjectId> {
    let mut nodes = Vec::new();
    let mut seen = BTreeSet::new();
    let mut stack = vec![root];

    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        nodes.push(id);

        if let Ok(kids) = doc.get_dictionary(id).and_then(|dict| dict.get(b"Kids")) {
            if let Ok(kids) = kids.as_array() {
                stack.extend(kids.iter().filter_map(|kid| kid.as_reference().ok()));
            }
        }
    }

    nodes
}

fn estimated_output_len(doc: &Document) -> usize {
    doc.objects
        .values()
        .map(|object| match object {
            Object::Stream(stream) => stream.content.len() + 64,
            _ => 64,
        })
        .sum()
}
