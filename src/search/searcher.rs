//! Query evaluation and top-k ranking.

use ahash::AHashMap;

use crate::error::{Result, TabulaError};
use crate::index::IndexReader;
use crate::query::{BooleanQuery, Occur, PhraseQuery, Query, TermQuery};
use crate::search::scorer::{TfIdfScorer, idf};
use crate::search::{SearchHit, SearchResults};

/// Executes queries against one reader snapshot.
///
/// The searcher walks the query tree once per search, producing a score
/// map of matching documents, then ranks and hydrates the top-k.
#[derive(Debug)]
pub struct Searcher {
    reader: IndexReader,
}

impl Searcher {
    /// Create a searcher over a reader snapshot.
    pub fn new(reader: IndexReader) -> Self {
        Searcher { reader }
    }

    /// The underlying reader.
    pub fn reader(&self) -> &IndexReader {
        &self.reader
    }

    /// Run a query and return the `top_k` best hits.
    ///
    /// Hits are ordered by descending score with ascending doc id as the
    /// tie breaker. Requesting zero hits is an error.
    pub fn search(&self, query: &Query, top_k: usize) -> Result<SearchResults> {
        if top_k == 0 {
            return Err(TabulaError::invalid_argument("top_k must be positive"));
        }

        let matches = self.evaluate(query);
        let total_hits = matches.len() as u64;

        let mut ranked: Vec<(u64, f32)> = matches.into_iter().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked.truncate(top_k);

        let mut hits = Vec::with_capacity(ranked.len());
        for (doc_id, score) in ranked {
            let document = self
                .reader
                .document(doc_id)
                .cloned()
                .ok_or_else(|| TabulaError::index(format!("missing stored document {doc_id}")))?;
            hits.push(SearchHit {
                doc_id,
                score,
                document,
            });
        }

        log::debug!(
            "query {} matched {total_hits} documents, returning {}",
            query.description(),
            hits.len()
        );
        Ok(SearchResults { hits, total_hits })
    }

    /// Number of documents matching the query, without ranking.
    pub fn count(&self, query: &Query) -> u64 {
        self.evaluate(query).len() as u64
    }

    /// Produce the score map of all documents matching the query.
    fn evaluate(&self, query: &Query) -> AHashMap<u64, f32> {
        match query {
            Query::Term(term) => self.evaluate_term(term),
            Query::Phrase(phrase) => self.evaluate_phrase(phrase),
            Query::Boolean(boolean) => self.evaluate_boolean(boolean),
        }
    }

    fn evaluate_term(&self, query: &TermQuery) -> AHashMap<u64, f32> {
        let Some(list) = self.reader.postings(&query.field, &query.term) else {
            return AHashMap::new();
        };
        let scorer = TfIdfScorer::new(list.doc_frequency(), self.reader.doc_count(), query.boost);
        list.iter()
            .map(|posting| (posting.doc_id, scorer.score(posting.frequency)))
            .collect()
    }

    /// Score documents where the phrase terms appear contiguously in order.
    ///
    /// A document matches when some position `p` has term `i` at `p + i`
    /// for every term. The phrase frequency is the number of such start
    /// positions, scored as `sqrt(freq)` times the summed idf of the terms.
    fn evaluate_phrase(&self, query: &PhraseQuery) -> AHashMap<u64, f32> {
        if query.terms.is_empty() {
            return AHashMap::new();
        }

        let mut lists = Vec::with_capacity(query.terms.len());
        for term in &query.terms {
            match self.reader.postings(&query.field, term) {
                Some(list) => lists.push(list),
                None => return AHashMap::new(),
            }
        }

        let total_docs = self.reader.doc_count();
        let summed_idf: f32 = lists
            .iter()
            .map(|list| idf(list.doc_frequency(), total_docs))
            .sum();

        let mut matches = AHashMap::new();
        // The first list drives; it is usually the shortest path to a miss.
        for first in lists[0].iter() {
            let rest: Option<Vec<_>> = lists[1..]
                .iter()
                .map(|list| list.get(first.doc_id))
                .collect();
            let Some(rest) = rest else { continue };

            let phrase_freq = first
                .positions
                .iter()
                .filter(|&&start| {
                    rest.iter().enumerate().all(|(offset, posting)| {
                        let wanted = start + offset as u32 + 1;
                        posting.positions.binary_search(&wanted).is_ok()
                    })
                })
                .count() as u32;

            if phrase_freq > 0 {
                let score = (phrase_freq as f32).sqrt() * summed_idf * query.boost;
                matches.insert(first.doc_id, score);
            }
        }
        matches
    }

    fn evaluate_boolean(&self, query: &BooleanQuery) -> AHashMap<u64, f32> {
        if !query.has_positive_clause() {
            // Purely negative queries match nothing.
            return AHashMap::new();
        }

        let mut must_maps = Vec::new();
        let mut should_maps = Vec::new();
        let mut excluded: ahash::AHashSet<u64> = ahash::AHashSet::new();
        for clause in &query.clauses {
            match clause.occur {
                Occur::Must => must_maps.push(self.evaluate(&clause.query)),
                Occur::Should => should_maps.push(self.evaluate(&clause.query)),
                Occur::MustNot => {
                    excluded.extend(self.evaluate(&clause.query).into_iter().map(|(id, _)| id))
                }
            }
        }

        let mut combined: AHashMap<u64, f32> = AHashMap::new();
        if let Some((first, rest)) = must_maps.split_first() {
            // Documents must appear in every must clause.
            for (&doc_id, &score) in first {
                let mut total = score;
                let mut in_all = true;
                for map in rest {
                    match map.get(&doc_id) {
                        Some(&clause_score) => total += clause_score,
                        None => {
                            in_all = false;
                            break;
                        }
                    }
                }
                if in_all {
                    combined.insert(doc_id, total);
                }
            }
            // Should clauses only add to already matching documents.
            for map in &should_maps {
                for (doc_id, score) in map {
                    if let Some(total) = combined.get_mut(doc_id) {
                        *total += score;
                    }
                }
            }
        } else {
            // No must clauses: any should match qualifies.
            for map in should_maps {
                for (doc_id, score) in map {
                    *combined.entry(doc_id).or_insert(0.0) += score;
                }
            }
        }

        combined.retain(|doc_id, _| !excluded.contains(doc_id));
        if query.boost != 1.0 {
            for score in combined.values_mut() {
                *score *= query.boost;
            }
        }
        combined
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::document::Document;
    use crate::index::{IndexWriter, IndexWriterConfig};
    use crate::schema::FieldSchema;
    use crate::storage::{MemoryStorage, Storage};

    fn build_searcher(docs: &[(&str, &str)]) -> Searcher {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::default());
        let config = IndexWriterConfig::new(Arc::new(FieldSchema::paper_tables()));
        let mut writer = IndexWriter::new(Arc::clone(&storage), config).unwrap();
        for (caption, table) in docs {
            let document = Document::builder()
                .add_text("caption", *caption)
                .add_text("table", *table)
                .build();
            writer.add_document(document).unwrap();
        }
        writer.commit().unwrap();
        Searcher::new(IndexReader::open(storage.as_ref()).unwrap())
    }

    #[test]
    fn test_term_query_matches_and_ranks() {
        let searcher = build_searcher(&[
            ("accuracy results", "model accuracy accuracy"),
            ("training setup", "epochs and hardware"),
        ]);

        let query = Query::Term(TermQuery::new("table", "accuracy"));
        let results = searcher.search(&query, 10).unwrap();

        assert_eq!(results.total_hits, 1);
        assert_eq!(results.hits[0].doc_id, 0);
        assert!(results.hits[0].score > 0.0);
    }

    #[test]
    fn test_missing_term_matches_nothing() {
        let searcher = build_searcher(&[("accuracy results", "model outputs")]);

        let query = Query::Term(TermQuery::new("caption", "nonexistent"));
        let results = searcher.search(&query, 5).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let searcher = build_searcher(&[("a", "b")]);
        let query = Query::Term(TermQuery::new("caption", "a"));

        assert!(searcher.search(&query, 0).is_err());
    }

    #[test]
    fn test_phrase_requires_contiguity() {
        let searcher = build_searcher(&[
            ("data engineer position", ""),
            ("data scientist engineer", ""),
        ]);

        let query = Query::Phrase(PhraseQuery::new(
            "caption",
            vec!["data".to_string(), "engineer".to_string()],
        ));
        let results = searcher.search(&query, 5).unwrap();

        assert_eq!(results.total_hits, 1);
        assert_eq!(results.hits[0].doc_id, 0);
    }

    #[test]
    fn test_must_not_only_matches_nothing() {
        let searcher = build_searcher(&[("alpha", ""), ("beta", "")]);

        let query = Query::Boolean(
            BooleanQuery::new().add_must_not(TermQuery::new("caption", "alpha").into()),
        );
        assert_eq!(searcher.count(&query), 0);
    }

    #[test]
    fn test_must_and_must_not_combination() {
        let searcher = build_searcher(&[
            ("data engineering basics", ""),
            ("data learning systems", ""),
            ("pure learning theory", ""),
        ]);

        let query = Query::Boolean(
            BooleanQuery::new()
                .add_must(TermQuery::new("caption", "data").into())
                .add_must_not(TermQuery::new("caption", "learning").into()),
        );
        let results = searcher.search(&query, 5).unwrap();

        assert_eq!(results.total_hits, 1);
        assert_eq!(results.hits[0].doc_id, 0);
    }

    #[test]
    fn test_should_clauses_accumulate_score() {
        let searcher = build_searcher(&[
            ("neural networks", ""),
            ("neural architecture search", ""),
        ]);

        let both = Query::Boolean(
            BooleanQuery::new()
                .add_should(TermQuery::new("caption", "neural").into())
                .add_should(TermQuery::new("caption", "architecture").into()),
        );
        let results = searcher.search(&both, 5).unwrap();

        assert_eq!(results.total_hits, 2);
        // Doc 1 matches both shoulds, so it ranks first.
        assert_eq!(results.hits[0].doc_id, 1);
        assert!(results.hits[0].score > results.hits[1].score);
    }

    #[test]
    fn test_boost_orders_fields() {
        let searcher = build_searcher(&[
            ("margin note", "profit margin table"),
            ("margin analysis", "unrelated numbers"),
        ]);

        // caption boost 1.0 outweighs table boost 0.8 at equal tf and df.
        let query = Query::Boolean(
            BooleanQuery::new()
                .add_should(TermQuery::new("caption", "margin").with_boost(1.0).into())
                .add_should(TermQuery::new("table", "margin").with_boost(0.8).into()),
        );
        let results = searcher.search(&query, 5).unwrap();
        assert_eq!(results.total_hits, 2);

        // Doc 0 matches in both fields, doc 1 in caption only.
        assert_eq!(results.hits[0].doc_id, 0);
    }

    #[test]
    fn test_tie_breaks_by_doc_id() {
        let searcher = build_searcher(&[("same text", ""), ("same text", "")]);

        let query = Query::Term(TermQuery::new("caption", "same"));
        let results = searcher.search(&query, 5).unwrap();

        assert_eq!(results.hits.len(), 2);
        assert_eq!(results.hits[0].doc_id, 0);
        assert_eq!(results.hits[1].doc_id, 1);
    }

    #[test]
    fn test_top_k_truncation() {
        let searcher = build_searcher(&[
            ("shared term", ""),
            ("shared term", ""),
            ("shared term", ""),
        ]);

        let query = Query::Term(TermQuery::new("caption", "shared"));
        let results = searcher.search(&query, 2).unwrap();

        assert_eq!(results.total_hits, 3);
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_empty_index_returns_empty() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::default());
        let searcher = Searcher::new(IndexReader::open(storage.as_ref()).unwrap());

        let query = Query::Term(TermQuery::new("caption", "anything"));
        let results = searcher.search(&query, 5).unwrap();
        assert!(results.is_empty());
    }
}
