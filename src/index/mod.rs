//! Inverted index with a single writer and snapshot readers.
//!
//! An index lives in a [`Storage`](crate::storage::Storage) as three files:
//! a generation-named postings file (the inverted index with positions), a
//! generation-named stored fields file, and `meta.json` (the commit point).
//! A commit writes a fresh pair of data files and then publishes `meta.json`
//! atomically, so a reader opened at any moment sees a complete committed
//! generation and a failed commit leaves the previous one untouched.

use serde::{Deserialize, Serialize};

pub mod posting;
pub mod reader;
pub mod writer;

pub use posting::{Posting, PostingList};
pub use reader::IndexReader;
pub use writer::{IndexWriter, IndexWriterConfig};

/// Name of the inverted index file for a generation.
///
/// Data files carry the generation in their name so a commit writes a
/// fresh pair instead of overwriting the files the current commit point
/// describes. The old pair is removed only after the new commit point is
/// in place.
pub fn postings_file(generation: u64) -> String {
    format!("postings.{generation}.bin")
}

/// Name of the stored fields file for a generation.
pub fn stored_file(generation: u64) -> String {
    format!("stored.{generation}.bin")
}

/// Commit point. Its presence marks a committed index.
pub const META_FILE: &str = "meta.json";

/// Scratch name the commit point is written under before the rename.
pub const META_TMP_FILE: &str = "meta.json.tmp";

/// Exclusive writer lock.
pub const WRITE_LOCK: &str = "write.lock";

/// On-disk format version.
pub const FORMAT_VERSION: u32 = 1;

/// Commit point metadata, serialized as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMeta {
    /// On-disk format version.
    pub version: u32,

    /// Commit generation, incremented on every commit.
    pub generation: u64,

    /// Next doc id the writer will assign.
    pub next_doc_id: u64,

    /// Number of committed documents.
    pub doc_count: u64,
}

impl IndexMeta {
    /// Metadata of an empty, never-committed index.
    pub fn empty() -> Self {
        IndexMeta {
            version: FORMAT_VERSION,
            generation: 0,
            next_doc_id: 0,
            doc_count: 0,
        }
    }
}
