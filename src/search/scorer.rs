//! TF-IDF scoring.

/// Inverse document frequency of a term.
///
/// Uses the smoothed form `1 + ln((N + 1) / (df + 1))`, which stays
/// positive for every df and never divides by zero, even when the term
/// misses the index entirely.
pub fn idf(doc_frequency: u64, total_docs: u64) -> f32 {
    let n = (total_docs + 1) as f32;
    let df = (doc_frequency + 1) as f32;
    1.0 + (n / df).ln()
}

/// Per-term TF-IDF scorer.
///
/// A document's score for the term is `sqrt(tf) * idf * boost`.
#[derive(Debug, Clone, Copy)]
pub struct TfIdfScorer {
    idf: f32,
    boost: f32,
}

impl TfIdfScorer {
    /// Create a scorer from the term's document frequency.
    pub fn new(doc_frequency: u64, total_docs: u64, boost: f32) -> Self {
        TfIdfScorer {
            idf: idf(doc_frequency, total_docs),
            boost,
        }
    }

    /// Score a document given the term frequency within it.
    pub fn score(&self, term_frequency: u32) -> f32 {
        (term_frequency as f32).sqrt() * self.idf * self.boost
    }

    /// The scorer's idf component.
    pub fn idf_value(&self) -> f32 {
        self.idf
    }
}
