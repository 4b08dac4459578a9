pub mod chunking;

use chunking::config::PdfEngine;
use lopdf::{Object, ObjectId, dictionary};
use std::collections::HashSet;
use std::ops::Range;

/// Page attributes a page may inherit from its ancestors in the page tree
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];
const MAX_PAGE_TREE_DEPTH: usize = 64;

/// Uploaded PDF as handed over by the upload flow
#[derive(Clone, PartialEq, Eq)]
pub struct SourceDocument {
    file_name: String,
    bytes: Vec<u8>,
    declared_size: u64,
}

impl SourceDocument {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let declared_size = bytes.len() as u64;
        Self {
            file_name: file_name.into(),
            bytes,
            declared_size,
        }
    }

    /// Document whose size was declared by the uploader instead of measured
    pub fn with_declared_size(file_name: impl Into<String>, bytes: Vec<u8>, size: u64) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            declared_size: size,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn declared_size(&self) -> u64 {
        self.declared_size
    }

    /// Size of the blob actually held
    pub fn actual_size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

impl std::fmt::Debug for SourceDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceDocument")
            .field("file_name", &self.file_name)
            .field("declared_size", &self.declared_size)
            .field("actual_size", &self.bytes.len())
            .finish()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PdfEngineError {
    #[error("pdf error: {0}")]
    Lopdf(#[from] lopdf::Error),

    #[error("write error: {0}")]
    Io(#[from] std::io::Error),

    #[error("page range {start}..{end} is outside a {total} page document")]
    PageRange {
        start: usize,
        end: usize,
        total: usize,
    },
}

/// PDF engine built on lopdf
///
/// A sub-document is assembled from the objects reachable from the kept page
/// dictionaries only, under a fresh catalog and a flat page tree. `/Parent`
/// links are not followed and references to pages outside the range become
/// null, so document-level structures (structure tree, named destinations,
/// forms, outlines) never pull dropped pages in. Link annotations pointing at
/// dropped pages are removed. Attributes inherited from intermediate page tree
/// nodes are copied onto the kept pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfEngine;

impl PdfEngine for LopdfEngine {
    type Document = lopdf::Document;
    type SubDocument = lopdf::Document;
    type Error = PdfEngineError;

    fn open(&self, bytes: &[u8]) -> Result<lopdf::Document, PdfEngineError> {
        Ok(lopdf::Document::load_mem(bytes)?)
    }

    fn page_count(&self, document: &lopdf::Document) -> usize {
        document.get_pages().len()
    }

    fn copy_pages(
        &self,
        document: &lopdf::Document,
        pages: Range<usize>,
    ) -> Result<lopdf::Document, PdfEngineError> {
        let all_pages = document.get_pages();
        let total = all_pages.len();
        if pages.start >= pages.end || pages.end > total {
            return Err(PdfEngineError::PageRange {
                start: pages.start,
                end: pages.end,
                total,
            });
        }

        let page_ids: Vec<ObjectId> = all_pages
            .values()
            .copied()
            .skip(pages.start)
            .take(pages.end - pages.start)
            .collect();

        let kept: HashSet<ObjectId> = page_ids.iter().copied().collect();

        // everything that must not be reached from the kept pages
        let mut excluded: HashSet<ObjectId> = all_pages
            .values()
            .copied()
            .filter(|id| !kept.contains(id))
            .collect();
        excluded.extend(page_tree_nodes(document, all_pages.values().copied()));
        if let Ok(catalog_id) = document.trailer.get(b"Root").and_then(Object::as_reference) {
            excluded.insert(catalog_id);
        }

        let mut sub_document = lopdf::Document::with_version(document.version.clone());
        sub_document.max_id = document.max_id;
        let root_pages_id = sub_document.new_object_id();
        let catalog_id = sub_document.new_object_id();

        let mut pending: Vec<ObjectId> = Vec::new();
        for &page_id in &page_ids {
            let mut page = document.get_dictionary(page_id)?.clone();
            for (key, value) in inherited_attributes(document, page_id) {
                if !page.has(key) {
                    page.set(key, value);
                }
            }
            retain_annotations(document, &mut page, &excluded);

            let mut page = Object::Dictionary(page);
            detach_references(&mut page, &excluded, &mut pending);
            if let Object::Dictionary(page) = &mut page {
                page.set("Parent", root_pages_id);
            }
            sub_document.objects.insert(page_id, page);
        }

        while let Some(id) = pending.pop() {
            if sub_document.objects.contains_key(&id) {
                continue;
            }
            let Ok(object) = document.get_object(id) else {
                continue;
            };
            let mut object = object.clone();
            if let Object::Dictionary(dict) = &mut object {
                dict.remove(b"Parent");
            }
            detach_references(&mut object, &excluded, &mut pending);
            sub_document.objects.insert(id, object);
        }

        sub_document.objects.insert(
            root_pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => page_ids.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
                "Count" => page_ids.len() as i64,
            }),
        );
        sub_document.objects.insert(
            catalog_id,
            Object::Dictionary(dictionary! {
                "Type" => "Catalog",
                "Pages" => root_pages_id,
            }),
        );
        sub_document.renumber_objects();
        let catalog_id = sub_document
            .objects
            .iter()
            .find(|(_, object)| {
                object
                    .as_dict()
                    .and_then(|dict| dict.get(b"Type"))
                    .and_then(Object::as_name)
                    .is_ok_and(|name| name == b"Catalog")
            })
            .map(|(id, _)| *id)
            .unwrap_or(catalog_id);
        sub_document.trailer.set("Root", catalog_id);
        Ok(sub_document)
    }

    fn serialize(&self, mut sub_document: lopdf::Document) -> Result<Vec<u8>, PdfEngineError> {
        let mut buf = Vec::new();
        sub_document.save_to(&mut buf)?;
        Ok(buf)
    }
}

fn parent_of(document: &lopdf::Document, id: ObjectId) -> Option<ObjectId> {
    document
        .get_dictionary(id)
        .and_then(|node| node.get(b"Parent"))
        .and_then(Object::as_reference)
        .ok()
}

/// Intermediate and root nodes of the page tree above the given pages
fn page_tree_nodes(
    document: &lopdf::Document,
    page_ids: impl Iterator<Item = ObjectId>,
) -> HashSet<ObjectId> {
    let mut nodes = HashSet::new();
    for page_id in page_ids {
        let mut parent = parent_of(document, page_id);
        for _ in 0..MAX_PAGE_TREE_DEPTH {
            let Some(node_id) = parent else { break };
            if !nodes.insert(node_id) {
                break;
            }
            parent = parent_of(document, node_id);
        }
    }
    nodes
}

/// Inheritable attributes of a page, nearest ancestor first
fn inherited_attributes(
    document: &lopdf::Document,
    page_id: ObjectId,
) -> Vec<(&'static [u8], Object)> {
    let mut found: Vec<(&'static [u8], Object)> = Vec::new();
    let mut parent = parent_of(document, page_id);

    for _ in 0..MAX_PAGE_TREE_DEPTH {
        let Some(node_id) = parent else { break };
        let Ok(node) = document.get_dictionary(node_id) else {
            break;
        };
        for key in INHERITABLE_KEYS {
            if found.iter().all(|(k, _)| *k != key) {
                if let Ok(value) = node.get(key) {
                    found.push((key, value.clone()));
                }
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    found
}

/// Null out references to excluded objects and queue every other reference
fn detach_references(
    object: &mut Object,
    excluded: &HashSet<ObjectId>,
    pending: &mut Vec<ObjectId>,
) {
    match object {
        Object::Reference(id) => {
            let id = *id;
            if excluded.contains(&id) {
                *object = Object::Null;
            } else {
                pending.push(id);
            }
        }
        Object::Array(items) => {
            for item in items.iter_mut() {
                detach_references(item, excluded, pending);
            }
        }
        Object::Dictionary(dict) => {
            for (_, value) in dict.iter_mut() {
                detach_references(value, excluded, pending);
            }
        }
        Object::Stream(stream) => {
            for (_, value) in stream.dict.iter_mut() {
                detach_references(value, excluded, pending);
            }
        }
        _ => {}
    }
}

fn resolve<'a>(document: &'a lopdf::Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => document.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Drop annotations whose explicit destination is an excluded page
fn retain_annotations(
    document: &lopdf::Document,
    page: &mut lopdf::Dictionary,
    excluded: &HashSet<ObjectId>,
) {
    let Some(Object::Array(annotations)) = page.get(b"Annots").ok().and_then(|a| resolve(document, a))
    else {
        return;
    };
    let kept: Vec<Object> = annotations
        .iter()
        .filter(|annotation| {
            destination_page(document, annotation).is_none_or(|page_id| !excluded.contains(&page_id))
        })
        .cloned()
        .collect();
    page.set("Annots", kept);
}

/// Target page of a link annotation with a `/Dest` or `/A << /D >>` array
fn destination_page(document: &lopdf::Document, annotation: &Object) -> Option<ObjectId> {
    let annotation = resolve(document, annotation)?.as_dict().ok()?;
    let destination = match annotation.get(b"Dest") {
        Ok(destination) => destination,
        Err(_) => {
            let action = resolve(document, annotation.get(b"A").ok()?)?.as_dict().ok()?;
            action.get(b"D").ok()?
        }
    };
    resolve(document, destination)?
        .as_array()
        .ok()?
        .first()?
        .as_reference()
        .ok()
}
