//! Text analysis: tokenizers, token filters, and analyzers.
//!
//! The analysis pipeline turns raw field text into a sequence of normalized
//! terms: tokenize, lowercase, split on intra-word delimiters, remove stop
//! words. Which pipeline runs is decided per field by
//! [`PerFieldAnalyzer`](analyzer::PerFieldAnalyzer).

pub mod analyzer;
pub mod token;
pub mod token_filter;
pub mod tokenizer;

pub use analyzer::{Analyzer, PerFieldAnalyzer, PipelineAnalyzer, StandardAnalyzer};
pub use token::{Token, TokenStream};
