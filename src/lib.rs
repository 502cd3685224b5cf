//! Tabula is a compact full-text search engine for scientific-paper
//! tables and papers.
//!
//! It covers the whole retrieval path: per-field analysis pipelines,
//! an inverted index with positions persisted through a pluggable
//! storage layer, a small query language with mandatory, prohibited
//! and phrase clauses, and TF-IDF ranked search.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use tabula::prelude::*;
//!
//! # fn main() -> tabula::Result<()> {
//! let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::default());
//! let schema = Arc::new(FieldSchema::paper_tables());
//!
//! let mut writer = IndexWriter::new(
//!     Arc::clone(&storage),
//!     IndexWriterConfig::new(Arc::clone(&schema)),
//! )?;
//! writer.add_document(
//!     Document::builder()
//!         .add_text("caption", "Accuracy of the baseline model")
//!         .add_text("table", "model accuracy f1")
//!         .build(),
//! )?;
//! writer.commit()?;
//!
//! let searcher = Searcher::new(IndexReader::open(storage.as_ref())?);
//! let parser = QueryParser::new(schema);
//! let query = parser.parse(&["caption", "table"], "+accuracy")?;
//! let results = searcher.search(&query, DEFAULT_TOP_K)?;
//! assert_eq!(results.total_hits, 1);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod document;
pub mod error;
pub mod index;
pub mod query;
pub mod schema;
pub mod search;
pub mod storage;
pub mod util;

pub use error::{Result, TabulaError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Commonly used types.
pub mod prelude {
    pub use crate::analysis::{Analyzer, PerFieldAnalyzer, PipelineAnalyzer, StandardAnalyzer};
    pub use crate::document::{Document, DocumentBuilder};
    pub use crate::error::{Result, TabulaError};
    pub use crate::index::{IndexReader, IndexWriter, IndexWriterConfig};
    pub use crate::query::{Query, QueryParser};
    pub use crate::schema::FieldSchema;
    pub use crate::search::{DEFAULT_TOP_K, SearchHit, SearchResults, Searcher};
    pub use crate::storage::{FileStorage, MemoryStorage, Storage, StorageConfig};
}
