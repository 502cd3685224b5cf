//! Per-field analyzer.
//!
//! Applies different analyzers to different fields, with a default analyzer
//! for fields not explicitly configured. This is a plain field-name-keyed
//! lookup table; the same analyzer instance can back multiple fields via
//! `Arc::clone`.

use std::sync::Arc;

use ahash::AHashMap;

use crate::analysis::analyzer::Analyzer;
use crate::analysis::token::TokenStream;
use crate::error::Result;

/// A per-field analyzer that applies different analyzers to different fields.
///
/// # Example
///
/// ```
/// use tabula::analysis::analyzer::{Analyzer, PerFieldAnalyzer, StandardAnalyzer};
/// use std::sync::Arc;
///
/// let mut analyzer = PerFieldAnalyzer::new(Arc::new(StandardAnalyzer::new()));
/// analyzer.add_analyzer("caption", Arc::new(StandardAnalyzer::without_stop_words()));
/// // "caption" uses its own analyzer; every other field uses the default.
/// ```
#[derive(Clone)]
pub struct PerFieldAnalyzer {
    /// Default analyzer for fields not in the map.
    default_analyzer: Arc<dyn Analyzer>,

    /// Map of field names to their specific analyzers.
    field_analyzers: AHashMap<String, Arc<dyn Analyzer>>,
}

impl PerFieldAnalyzer {
    /// Create a new per-field analyzer with a default analyzer.
    pub fn new(default_analyzer: Arc<dyn Analyzer>) -> Self {
        Self {
            default_analyzer,
            field_analyzers: AHashMap::new(),
        }
    }

    /// Add a field-specific analyzer.
    pub fn add_analyzer(&mut self, field: impl Into<String>, analyzer: Arc<dyn Analyzer>) {
        self.field_analyzers.insert(field.into(), analyzer);
    }

    /// Get the analyzer for a specific field, falling back to the default.
    pub fn get_analyzer(&self, field: &str) -> &Arc<dyn Analyzer> {
        self.field_analyzers
            .get(field)
            .unwrap_or(&self.default_analyzer)
    }

    /// Get the default analyzer.
    pub fn default_analyzer(&self) -> &Arc<dyn Analyzer> {
        &self.default_analyzer
    }

    /// Analyze text with the analyzer for the given field.
    pub fn analyze_field(&self, field: &str, text: &str) -> Result<TokenStream> {
        self.get_analyzer(field).analyze(text)
    }
}

impl Analyzer for PerFieldAnalyzer {
    fn analyze(&self, text: &str) -> Result<TokenStream> {
        // When used as a regular Analyzer, use the default analyzer
        self.default_analyzer.analyze(text)
    }

    fn name(&self) -> &'static str {
        "per_field"
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyzer::StandardAnalyzer;
    use crate::analysis::token::Token;

    #[test]
    fn test_per_field_analyzer() {
        let mut analyzer = PerFieldAnalyzer::new(Arc::new(StandardAnalyzer::new()));
        analyzer.add_analyzer(
            "caption",
            Arc::new(StandardAnalyzer::without_stop_words()),
        );

        let text = "The Results";

        // Default analyzer removes "the"
        let tokens: Vec<Token> = analyzer.analyze_field("abstract", text).unwrap().collect();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "results");

        // Field-specific analyzer keeps it
        let tokens: Vec<Token> = analyzer.analyze_field("caption", text).unwrap().collect();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].text, "the");
    }

    #[test]
    fn test_default_analyzer_when_field_not_configured() {
        let analyzer = PerFieldAnalyzer::new(Arc::new(StandardAnalyzer::new()));

        let tokens: Vec<Token> = analyzer
            .analyze_field("unknown_field", "Hello World")
            .unwrap()
            .collect();

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].text, "hello");
        assert_eq!(tokens[1].text, "world");
    }

    #[test]
    fn test_as_analyzer_trait() {
        let analyzer = PerFieldAnalyzer::new(Arc::new(StandardAnalyzer::new()));

        let tokens: Vec<Token> = analyzer.analyze("Hello World").unwrap().collect();

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].text, "hello");
    }
}
