//! Field schema: per-field analyzer configuration and query-time boosts.
//!
//! The schema is a field-name-keyed table resolved by exact match with a
//! default fallback. Every field is guaranteed a resolvable analyzer: fields
//! with no entry use the shared default analyzer and a boost of 1.0.

use std::sync::Arc;

use ahash::AHashMap;

use crate::analysis::analyzer::{Analyzer, PerFieldAnalyzer, PipelineAnalyzer, StandardAnalyzer};
use crate::analysis::token_filter::lowercase::LowercaseFilter;
use crate::analysis::token_filter::stop::StopFilter;
use crate::analysis::token_filter::word_delimiter::WordDelimiterFilter;
use crate::analysis::tokenizer::whitespace::WhitespaceTokenizer;

/// Default query-time boost for fields without an explicit entry.
pub const DEFAULT_BOOST: f32 = 1.0;

/// Configuration for a single field: how its text is analyzed and how much
/// a match in it is worth at query time.
#[derive(Clone)]
pub struct FieldEntry {
    /// The analyzer used at both index time and query time.
    pub analyzer: Arc<dyn Analyzer>,
    /// Query-time boost weight. Must be positive.
    pub boost: f32,
}

impl std::fmt::Debug for FieldEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldEntry")
            .field("analyzer", &self.analyzer.name())
            .field("boost", &self.boost)
            .finish()
    }
}

/// A mapping from field name to analyzer configuration and boost weight.
#[derive(Clone)]
pub struct FieldSchema {
    entries: AHashMap<String, FieldEntry>,
    default_analyzer: Arc<dyn Analyzer>,
}

impl FieldSchema {
    /// Create an empty schema: every field resolves to the standard
    /// analyzer with boost 1.0.
    pub fn new() -> Self {
        FieldSchema {
            entries: AHashMap::new(),
            default_analyzer: Arc::new(StandardAnalyzer::new()),
        }
    }

    /// Create an empty schema with a custom default analyzer.
    pub fn with_default_analyzer(default_analyzer: Arc<dyn Analyzer>) -> Self {
        FieldSchema {
            entries: AHashMap::new(),
            default_analyzer,
        }
    }

    /// The analyzer pipeline used for paper-table and paper-body fields:
    /// whitespace tokenize, lowercase, word-delimiter split (numerics kept
    /// joined, possessives stripped), stop word removal.
    pub fn table_text_analyzer() -> Arc<dyn Analyzer> {
        Arc::new(
            PipelineAnalyzer::new(Arc::new(WhitespaceTokenizer::new()))
                .add_filter(Arc::new(LowercaseFilter::new()))
                .add_filter(Arc::new(WordDelimiterFilter::new()))
                .add_filter(Arc::new(StopFilter::new()))
                .with_name("table_text"),
        )
    }

    /// Schema preset for scientific-paper table records: `caption`, `table`,
    /// `references` and `footnotes` share the table-text analyzer with the
    /// boost profile caption 1.0, table 0.8, references 0.6, footnotes 0.4.
    pub fn paper_tables() -> Self {
        let analyzer = Self::table_text_analyzer();
        let mut schema = Self::new();
        for (field, boost) in [
            ("caption", 1.0),
            ("table", 0.8),
            ("references", 0.6),
            ("footnotes", 0.4),
        ] {
            schema.add_field(field, Arc::clone(&analyzer), boost);
        }
        schema
    }

    /// Schema preset for HTML-paper records: `title`, `authors`, `abstract`
    /// and `full_paper`, title weighted highest.
    pub fn html_papers() -> Self {
        let analyzer = Self::table_text_analyzer();
        let mut schema = Self::new();
        for (field, boost) in [
            ("title", 1.0),
            ("authors", 0.8),
            ("abstract", 0.6),
            ("full_paper", 0.4),
        ] {
            schema.add_field(field, Arc::clone(&analyzer), boost);
        }
        schema
    }

    /// Add or replace a field entry.
    pub fn add_field(
        &mut self,
        name: impl Into<String>,
        analyzer: Arc<dyn Analyzer>,
        boost: f32,
    ) {
        debug_assert!(boost > 0.0, "field boost must be positive");
        self.entries
            .insert(name.into(), FieldEntry { analyzer, boost });
    }

    /// Get the entry for a field, if explicitly configured.
    pub fn get(&self, field: &str) -> Option<&FieldEntry> {
        self.entries.get(field)
    }

    /// Resolve the analyzer for a field, falling back to the default.
    pub fn analyzer(&self, field: &str) -> &Arc<dyn Analyzer> {
        self.entries
            .get(field)
            .map(|e| &e.analyzer)
            .unwrap_or(&self.default_analyzer)
    }

    /// Resolve the boost for a field, falling back to 1.0.
    pub fn boost(&self, field: &str) -> f32 {
        self.entries.get(field).map(|e| e.boost).unwrap_or(DEFAULT_BOOST)
    }

    /// Get the default analyzer.
    pub fn default_analyzer(&self) -> &Arc<dyn Analyzer> {
        &self.default_analyzer
    }

    /// All explicitly configured field names.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    /// Build a [`PerFieldAnalyzer`] view of this schema, for callers that
    /// want a single analyzer value.
    pub fn to_per_field_analyzer(&self) -> PerFieldAnalyzer {
        let mut per_field = PerFieldAnalyzer::new(Arc::clone(&self.default_analyzer));
        for (name, entry) in &self.entries {
            per_field.add_analyzer(name.clone(), Arc::clone(&entry.analyzer));
        }
        per_field
    }
}

impl Default for FieldSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FieldSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldSchema")
            .field("entries", &self.entries)
            .field("default_analyzer", &self.default_analyzer.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::token::Token;

    #[test]
    fn test_default_fallback() {
        let schema = FieldSchema::new();
        assert_eq!(schema.boost("anything"), 1.0);
        assert_eq!(schema.analyzer("anything").name(), "standard");
    }

    #[test]
    fn test_paper_tables_preset() {
        let schema = FieldSchema::paper_tables();

        assert_eq!(schema.boost("caption"), 1.0);
        assert_eq!(schema.boost("table"), 0.8);
        assert_eq!(schema.boost("references"), 0.6);
        assert_eq!(schema.boost("footnotes"), 0.4);
        // Unmapped fields fall back.
        assert_eq!(schema.boost("other"), 1.0);
    }

    #[test]
    fn test_table_text_analyzer_behavior() {
        let schema = FieldSchema::paper_tables();
        let analyzer = schema.analyzer("caption");

        let tokens: Vec<Token> = analyzer
            .analyze("The F1 score of the model")
            .unwrap()
            .collect();
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();

        assert_eq!(texts, vec!["f1", "score", "model"]);
    }

    #[test]
    fn test_camel_case_stays_joined() {
        // Lowercasing runs before the word-delimiter filter, so a case
        // change inside a token never triggers a split.
        let schema = FieldSchema::paper_tables();
        let analyzer = schema.analyzer("caption");

        let tokens: Vec<Token> = analyzer.analyze("PowerShot").unwrap().collect();
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();

        assert_eq!(texts, vec!["powershot"]);
    }

    #[test]
    fn test_per_field_analyzer_view() {
        let schema = FieldSchema::paper_tables();
        let per_field = schema.to_per_field_analyzer();

        assert_eq!(per_field.get_analyzer("caption").name(), "pipeline");
        assert_eq!(per_field.get_analyzer("unmapped").name(), "standard");
    }
}
