//! Search execution over a committed index.

pub mod scorer;
pub mod searcher;

pub use scorer::TfIdfScorer;
pub use searcher::Searcher;

use crate::document::Document;

/// Number of hits returned when the caller does not pick a top-k.
pub const DEFAULT_TOP_K: usize = 5;

/// One matching document with its score and stored fields.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// Document identifier.
    pub doc_id: u64,

    /// Relevance score, higher is better.
    pub score: f32,

    /// Stored field values of the document.
    pub document: Document,
}

/// The ranked result of a search.
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    /// Top hits in descending score order, ties broken by ascending doc id.
    pub hits: Vec<SearchHit>,

    /// Total number of matching documents before top-k truncation.
    pub total_hits: u64,
}

impl SearchResults {
    /// Whether the search matched nothing.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Number of returned hits, at most the requested top-k.
    pub fn len(&self) -> usize {
        self.hits.len()
    }
}
