//! Unicode word tokenizer implementation.
//!
//! Splits text using Unicode word boundary rules (UAX #29) and keeps only
//! word-like segments, dropping punctuation and whitespace. This is the
//! tokenizer behind the default analyzer, playing the role Lucene's standard
//! tokenizer plays for fields with no explicit analyzer mapping.

use unicode_segmentation::UnicodeSegmentation;

use crate::analysis::token::{Token, TokenStream};
use crate::analysis::tokenizer::Tokenizer;
use crate::error::Result;

/// A tokenizer that splits text on Unicode word boundaries.
///
/// # Examples
///
/// ```
/// use tabula::analysis::tokenizer::Tokenizer;
/// use tabula::analysis::tokenizer::unicode_word::UnicodeWordTokenizer;
///
/// let tokenizer = UnicodeWordTokenizer::new();
/// let tokens: Vec<_> = tokenizer.tokenize("Hello, world!").unwrap().collect();
///
/// assert_eq!(tokens.len(), 2);
/// assert_eq!(tokens[0].text, "Hello");
/// assert_eq!(tokens[1].text, "world");
/// ```
#[derive(Clone, Debug, Default)]
pub struct UnicodeWordTokenizer;

impl UnicodeWordTokenizer {
    /// Create a new Unicode word tokenizer.
    pub fn new() -> Self {
        UnicodeWordTokenizer
    }

    /// Check if a segment contains word content (alphanumeric characters).
    fn is_word(segment: &str) -> bool {
        segment.chars().any(|c| c.is_alphanumeric())
    }
}

impl Tokenizer for UnicodeWordTokenizer {
    fn tokenize(&self, text: &str) -> Result<TokenStream> {
        let tokens: Vec<Token> = text
            .split_word_bound_indices()
            .filter(|(_, segment)| Self::is_word(segment))
            .enumerate()
            .map(|(position, (offset, segment))| {
                Token::with_offsets(segment, position, offset, offset + segment.len())
            })
            .collect();

        Ok(Box::new(tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "unicode_word"
    }
}
