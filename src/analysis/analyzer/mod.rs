//! Analyzer implementations combining tokenizers and filters.
//!
//! Analyzers are the complete text processing pipeline:
//!
//! ```text
//! Raw Text → Tokenizer → Filter 1 → ... → Filter N → Token Stream
//! ```
//!
//! - [`PipelineAnalyzer`] - custom tokenizer + filter chains
//! - [`StandardAnalyzer`] - good defaults for unmapped fields
//! - [`PerFieldAnalyzer`] - different analyzers per field

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for analyzers that convert text into processed tokens.
///
/// Requires `Send + Sync` so analyzers can be shared across writer and
/// searcher without copying.
pub trait Analyzer: Send + Sync {
    /// Analyze the given text and return a stream of tokens.
    ///
    /// Empty input yields an empty stream, never an error.
    fn analyze(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this analyzer (for debugging and configuration).
    fn name(&self) -> &'static str;

    /// Provide access to the concrete type for downcasting.
    fn as_any(&self) -> &dyn std::any::Any;
}

// Individual analyzer modules
pub mod per_field;
pub mod pipeline;
pub mod standard;

// Re-export all analyzers for convenient access
pub use per_field::PerFieldAnalyzer;
pub use pipeline::PipelineAnalyzer;
pub use standard::StandardAnalyzer;
