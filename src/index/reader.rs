//! Point-in-time index reader.

use std::io::Read;

use ahash::AHashMap;

use crate::document::Document;
use crate::error::{Result, TabulaError};
use crate::index::{IndexMeta, META_FILE, PostingList, postings_file, stored_file};
use crate::storage::{Storage, StructReader};

/// A snapshot of the last committed generation of an index.
///
/// The reader loads the commit point and both data files eagerly, so it
/// never observes writes that happen after [`IndexReader::open`] returns.
/// Opening an index that was never committed yields an empty reader.
#[derive(Debug)]
pub struct IndexReader {
    meta: IndexMeta,
    postings: AHashMap<String, AHashMap<String, PostingList>>,
    stored: AHashMap<u64, Document>,
}

impl IndexReader {
    /// Open a reader on the latest committed generation.
    pub fn open(storage: &dyn Storage) -> Result<Self> {
        let Some(meta) = read_meta(storage)? else {
            log::debug!("no commit point found, opening empty reader");
            return Ok(IndexReader {
                meta: IndexMeta::empty(),
                postings: AHashMap::new(),
                stored: AHashMap::new(),
            });
        };
        let postings = read_postings(storage, meta.generation)?;
        let stored = read_stored(storage, meta.generation)?;
        log::debug!(
            "opened reader at generation {} with {} documents",
            meta.generation,
            meta.doc_count
        );
        Ok(IndexReader {
            meta,
            postings,
            stored,
        })
    }

    /// Posting list for a term in a field.
    pub fn postings(&self, field: &str, term: &str) -> Option<&PostingList> {
        self.postings.get(field)?.get(term)
    }

    /// Number of documents containing the term in the field.
    pub fn doc_frequency(&self, field: &str, term: &str) -> u64 {
        self.postings(field, term)
            .map(|list| list.doc_frequency())
            .unwrap_or(0)
    }

    /// Number of committed documents.
    pub fn doc_count(&self) -> u64 {
        self.meta.doc_count
    }

    /// Commit generation this reader observes.
    pub fn generation(&self) -> u64 {
        self.meta.generation
    }

    /// Stored field values of a document.
    pub fn document(&self, doc_id: u64) -> Option<&Document> {
        self.stored.get(&doc_id)
    }

    /// Fields that have at least one indexed term.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.postings.keys().map(String::as_str)
    }
}

/// Read the commit point, or `None` when the index was never committed.
pub(crate) fn read_meta(storage: &dyn Storage) -> Result<Option<IndexMeta>> {
    if !storage.file_exists(META_FILE) {
        return Ok(None);
    }
    let mut input = storage.open_input(META_FILE)?;
    let mut content = String::new();
    input.read_to_string(&mut content)?;
    let meta: IndexMeta = serde_json::from_str(&content)?;
    if meta.version != crate::index::FORMAT_VERSION {
        return Err(TabulaError::index(format!(
            "unsupported index format version {}",
            meta.version
        )));
    }
    Ok(Some(meta))
}

/// Read a generation's inverted index file into field and term maps.
pub(crate) fn read_postings(
    storage: &dyn Storage,
    generation: u64,
) -> Result<AHashMap<String, AHashMap<String, PostingList>>> {
    let mut reader = StructReader::new(storage.open_input(&postings_file(generation))?);
    let field_count = reader.read_varint_u64()? as usize;
    let mut postings = AHashMap::with_capacity(field_count);
    for _ in 0..field_count {
        let field = reader.read_string()?;
        let term_count = reader.read_varint_u64()? as usize;
        let mut terms = AHashMap::with_capacity(term_count);
        for _ in 0..term_count {
            let term = reader.read_string()?;
            let list = PostingList::decode(&mut reader)?;
            terms.insert(term, list);
        }
        postings.insert(field, terms);
    }
    reader.finish()?;
    Ok(postings)
}

/// Read a generation's stored fields file into a doc id map.
pub(crate) fn read_stored(storage: &dyn Storage, generation: u64) -> Result<AHashMap<u64, Document>> {
    let mut reader = StructReader::new(storage.open_input(&stored_file(generation))?);
    let doc_count = reader.read_varint_u64()? as usize;
    let mut stored = AHashMap::with_capacity(doc_count);
    for _ in 0..doc_count {
        let doc_id = reader.read_varint_u64()?;
        let field_count = reader.read_varint_u64()? as usize;
        let mut document = Document::new();
        for _ in 0..field_count {
            let name = reader.read_string()?;
            let value = reader.read_string()?;
            document.add_field(name, value);
        }
        stored.insert(doc_id, document);
    }
    reader.finish()?;
    Ok(stored)
}

/// Shared alias so the writer can reuse the reader's load path.
pub(crate) type FieldPostings = AHashMap<String, AHashMap<String, PostingList>>;
