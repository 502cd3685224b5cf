//! Single-writer index builder.

use std::sync::Arc;

use ahash::AHashMap;

use crate::document::Document;
use crate::error::{Result, TabulaError};
use crate::index::reader::{FieldPostings, read_meta, read_postings, read_stored};
use crate::index::{
    FORMAT_VERSION, IndexMeta, META_FILE, META_TMP_FILE, WRITE_LOCK, postings_file, stored_file,
};
use crate::schema::FieldSchema;
use crate::storage::{Storage, StorageLock, StructWriter};

/// Configuration for an [`IndexWriter`].
#[derive(Debug, Clone)]
pub struct IndexWriterConfig {
    /// Per-field analyzers and boosts.
    pub schema: Arc<FieldSchema>,
}

impl IndexWriterConfig {
    /// Create a config with the given schema.
    pub fn new(schema: Arc<FieldSchema>) -> Self {
        IndexWriterConfig { schema }
    }
}

/// The single writer of an index.
///
/// Opening a writer acquires `write.lock` exclusively; a second writer on
/// the same storage fails until the first one is closed or dropped. The
/// writer buffers documents in memory and publishes them with
/// [`commit`](IndexWriter::commit), which rewrites the data files and then
/// installs a fresh commit point. Opening a writer on an already committed
/// index resumes from its committed state, so sessions can append.
pub struct IndexWriter {
    storage: Arc<dyn Storage>,
    config: IndexWriterConfig,
    lock: Option<Box<dyn StorageLock>>,
    postings: FieldPostings,
    stored: AHashMap<u64, Document>,
    next_doc_id: u64,
    generation: u64,
    dirty: bool,
    closed: bool,
}

impl IndexWriter {
    /// Open a writer on the storage, acquiring the exclusive write lock.
    pub fn new(storage: Arc<dyn Storage>, config: IndexWriterConfig) -> Result<Self> {
        let lock = storage
            .try_acquire_lock(WRITE_LOCK)?
            .ok_or_else(|| TabulaError::index("index is locked by another writer"))?;

        let (postings, stored, next_doc_id, generation) = match read_meta(storage.as_ref())? {
            Some(meta) => {
                let postings = read_postings(storage.as_ref(), meta.generation)?;
                let stored = read_stored(storage.as_ref(), meta.generation)?;
                log::debug!(
                    "writer resumed at generation {} with {} documents",
                    meta.generation,
                    meta.doc_count
                );
                (postings, stored, meta.next_doc_id, meta.generation)
            }
            None => (AHashMap::new(), AHashMap::new(), 0, 0),
        };

        Ok(IndexWriter {
            storage,
            config,
            lock: Some(lock),
            postings,
            stored,
            next_doc_id,
            generation,
            dirty: false,
            closed: false,
        })
    }

    /// Analyze and buffer a document, returning its assigned doc id.
    ///
    /// Doc ids are assigned in insertion order. The document becomes
    /// visible to readers only after the next [`commit`](IndexWriter::commit).
    /// A document with no fields, or whose text analyzes to nothing, still
    /// gets a stored entry; it just produces no postings.
    pub fn add_document(&mut self, document: Document) -> Result<u64> {
        self.ensure_open()?;

        let doc_id = self.next_doc_id;
        self.next_doc_id += 1;

        for (field, value) in document.fields() {
            let analyzer = self.config.schema.analyzer(field);
            let field_postings = self.postings.entry(field.to_string()).or_default();
            for token in analyzer.analyze(value)? {
                if token.is_stopped() {
                    continue;
                }
                field_postings
                    .entry(token.text.clone())
                    .or_default()
                    .add_occurrence(doc_id, token.position as u32)?;
            }
        }

        self.stored.insert(doc_id, document);
        self.dirty = true;
        log::debug!("added document {doc_id}");
        Ok(doc_id)
    }

    /// Remove every document from the index.
    ///
    /// Idempotent; calling it on an empty index is a no-op apart from
    /// marking the writer dirty. Doc id assignment restarts from zero.
    pub fn delete_all(&mut self) -> Result<()> {
        self.ensure_open()?;
        let removed = self.stored.len();
        self.postings.clear();
        self.stored.clear();
        self.next_doc_id = 0;
        self.dirty = true;
        log::debug!("deleted all documents ({removed} removed)");
        Ok(())
    }

    /// Number of documents the writer currently holds, committed or not.
    pub fn doc_count(&self) -> u64 {
        self.stored.len() as u64
    }

    /// Generation of the last commit this writer produced or resumed from.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Durably publish the buffered state as a new generation.
    ///
    /// The new generation's data files are written under fresh names and
    /// the commit point is renamed into place last, so a reader opened
    /// concurrently sees either the previous generation or the new one,
    /// never a mix. A commit that fails partway leaves the previous
    /// generation's files and commit point untouched.
    pub fn commit(&mut self) -> Result<()> {
        self.ensure_open()?;
        if !self.dirty {
            log::debug!("commit skipped, no pending changes");
            return Ok(());
        }

        let next_generation = self.generation + 1;
        self.write_postings(next_generation)?;
        self.write_stored(next_generation)?;

        let meta = IndexMeta {
            version: FORMAT_VERSION,
            generation: next_generation,
            next_doc_id: self.next_doc_id,
            doc_count: self.stored.len() as u64,
        };
        self.write_meta(&meta)?;
        self.storage.sync()?;

        // The new commit point is live; the old generation's files are now
        // garbage. Removal failures leave harmless leftovers.
        if self.generation > 0 {
            for name in [postings_file(self.generation), stored_file(self.generation)] {
                if let Err(err) = self.storage.delete_file(&name) {
                    log::warn!("failed to remove stale index file {name}: {err}");
                }
            }
        }

        self.generation = next_generation;
        self.dirty = false;
        log::info!(
            "committed generation {} with {} documents",
            meta.generation,
            meta.doc_count
        );
        Ok(())
    }

    /// Commit pending changes and release the write lock.
    ///
    /// Any further operation on the writer fails. Closing twice is an
    /// error, matching the fail-fast behavior of the other operations.
    pub fn close(&mut self) -> Result<()> {
        self.ensure_open()?;
        if self.dirty {
            self.commit()?;
        }
        self.closed = true;
        if let Some(mut lock) = self.lock.take() {
            lock.release()?;
        }
        log::debug!("writer closed at generation {}", self.generation);
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(TabulaError::index("index writer is closed"));
        }
        Ok(())
    }

    fn write_postings(&self, generation: u64) -> Result<()> {
        let mut writer = StructWriter::new(self.storage.create_output(&postings_file(generation))?);
        writer.write_varint_u64(self.postings.len() as u64)?;

        // Deterministic file layout for identical logical state.
        let mut fields: Vec<&String> = self.postings.keys().collect();
        fields.sort();
        for field in fields {
            let terms_map = &self.postings[field];
            writer.write_string(field)?;
            writer.write_varint_u64(terms_map.len() as u64)?;
            let mut terms: Vec<&String> = terms_map.keys().collect();
            terms.sort();
            for term in terms {
                writer.write_string(term)?;
                terms_map[term].encode(&mut writer)?;
            }
        }
        writer.close()
    }

    fn write_stored(&self, generation: u64) -> Result<()> {
        let mut writer = StructWriter::new(self.storage.create_output(&stored_file(generation))?);
        writer.write_varint_u64(self.stored.len() as u64)?;

        let mut doc_ids: Vec<u64> = self.stored.keys().copied().collect();
        doc_ids.sort_unstable();
        for doc_id in doc_ids {
            let document = &self.stored[&doc_id];
            writer.write_varint_u64(doc_id)?;
            writer.write_varint_u64(document.len() as u64)?;
            for (name, value) in document.fields() {
                writer.write_string(name)?;
                writer.write_string(value)?;
            }
        }
        writer.close()
    }

    fn write_meta(&self, meta: &IndexMeta) -> Result<()> {
        let json = serde_json::to_string_pretty(meta)?;
        {
            let mut output = self.storage.create_output(META_TMP_FILE)?;
            std::io::Write::write_all(&mut output, json.as_bytes())?;
            output.flush_and_sync()?;
        }
        self.storage.rename_file(META_TMP_FILE, META_FILE)
    }
}

impl Drop for IndexWriter {
    fn drop(&mut self) {
        if let Some(mut lock) = self.lock.take() {
            let _ = lock.release();
        }
    }
}

impl std::fmt::Debug for IndexWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexWriter")
            .field("doc_count", &self.stored.len())
            .field("generation", &self.generation)
            .field("dirty", &self.dirty)
            .field("closed", &self.closed)
            .finish()
    }
}
