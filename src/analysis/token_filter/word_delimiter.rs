//! Word delimiter filter implementation.
//!
//! Splits tokens at intra-word delimiters: punctuation and other
//! non-alphanumeric characters, case changes ("PowerShot" → "Power",
//! "Shot"), and optionally letter/digit boundaries. It can also rejoin the
//! split parts (catenation), keep the original token alongside the parts,
//! and strip a trailing English possessive marker.
//!
//! The policy flags mirror the Lucene word-delimiter options the
//! paper-search configuration tunes. In particular `split_on_numerics` is
//! off by default so a metric name like "f1" is indexed as one term.
//!
//! # Examples
//!
//! ```
//! use tabula::analysis::token_filter::Filter;
//! use tabula::analysis::token_filter::word_delimiter::WordDelimiterFilter;
//! use tabula::analysis::token::Token;
//!
//! let filter = WordDelimiterFilter::new();
//! let tokens = vec![Token::new("wi-fi", 0)];
//! let result: Vec<_> = filter.filter(Box::new(tokens.into_iter()))
//!     .unwrap()
//!     .collect();
//!
//! assert_eq!(result.len(), 2);
//! assert_eq!(result[0].text, "wi");
//! assert_eq!(result[1].text, "fi");
//! ```

use crate::analysis::token::{Token, TokenStream};
use crate::analysis::token_filter::Filter;
use crate::error::Result;

/// Policy flags controlling how tokens are split and recombined.
#[derive(Clone, Debug)]
pub struct WordDelimiterConfig {
    /// Emit sub-parts consisting of letters.
    pub generate_word_parts: bool,
    /// Emit sub-parts consisting of digits.
    pub generate_number_parts: bool,
    /// Split at lower-to-upper case transitions.
    pub split_on_case_change: bool,
    /// Split at letter/digit boundaries. Off by default so alphanumeric
    /// runs like "f1" stay joined.
    pub split_on_numerics: bool,
    /// Emit the concatenation of adjacent word parts.
    pub catenate_words: bool,
    /// Emit the concatenation of adjacent number parts.
    pub catenate_numbers: bool,
    /// Emit the concatenation of all parts.
    pub catenate_all: bool,
    /// Emit the original token in addition to its parts.
    pub preserve_original: bool,
    /// Strip a trailing "'s" possessive marker before splitting.
    pub stem_english_possessive: bool,
}

impl Default for WordDelimiterConfig {
    fn default() -> Self {
        WordDelimiterConfig {
            generate_word_parts: true,
            generate_number_parts: true,
            split_on_case_change: true,
            split_on_numerics: false,
            catenate_words: false,
            catenate_numbers: false,
            catenate_all: false,
            preserve_original: false,
            stem_english_possessive: true,
        }
    }
}

/// Character class of a sub-part, used for generate/catenate decisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PartKind {
    Word,
    Number,
    Mixed,
}

/// One split part of a token, with byte offsets into the token text.
#[derive(Debug)]
struct Part {
    start: usize,
    end: usize,
    kind: PartKind,
}

/// A filter that splits tokens on intra-word delimiters.
#[derive(Clone, Debug, Default)]
pub struct WordDelimiterFilter {
    config: WordDelimiterConfig,
}

impl WordDelimiterFilter {
    /// Create a new word delimiter filter with default settings.
    pub fn new() -> Self {
        WordDelimiterFilter {
            config: WordDelimiterConfig::default(),
        }
    }

    /// Create a new word delimiter filter with the given configuration.
    pub fn with_config(config: WordDelimiterConfig) -> Self {
        WordDelimiterFilter { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &WordDelimiterConfig {
        &self.config
    }

    /// Strip a trailing English possessive marker ("'s") if present.
    fn strip_possessive<'a>(&self, text: &'a str) -> &'a str {
        if !self.config.stem_english_possessive {
            return text;
        }
        for suffix in ["'s", "'S", "\u{2019}s", "\u{2019}S"] {
            if let Some(stripped) = text.strip_suffix(suffix) {
                return stripped;
            }
        }
        text
    }

    /// Split token text into parts at delimiter characters, case changes,
    /// and (optionally) letter/digit boundaries.
    fn split_parts(&self, text: &str) -> Vec<Part> {
        let mut parts = Vec::new();
        let mut start: Option<usize> = None;
        let mut prev_char: Option<char> = None;

        let char_kind = |c: char| {
            if c.is_numeric() {
                PartKind::Number
            } else {
                PartKind::Word
            }
        };

        let mut end_part = |start: &mut Option<usize>, end: usize, text: &str| {
            if let Some(s) = start.take() {
                let slice = &text[s..end];
                let kind = if slice.chars().all(|c| c.is_numeric()) {
                    PartKind::Number
                } else if slice.chars().all(|c| !c.is_numeric()) {
                    PartKind::Word
                } else {
                    PartKind::Mixed
                };
                parts.push(Part { start: s, end, kind });
            }
        };

        for (idx, ch) in text.char_indices() {
            if !ch.is_alphanumeric() {
                // Delimiter character always ends the current part.
                end_part(&mut start, idx, text);
                prev_char = None;
                continue;
            }

            if let Some(prev) = prev_char {
                let case_break = self.config.split_on_case_change
                    && prev.is_lowercase()
                    && ch.is_uppercase();
                let numeric_break = self.config.split_on_numerics
                    && prev.is_alphanumeric()
                    && char_kind(prev) != char_kind(ch);
                if case_break || numeric_break {
                    end_part(&mut start, idx, text);
                }
            }

            if start.is_none() {
                start = Some(idx);
            }
            prev_char = Some(ch);
        }
        end_part(&mut start, text.len(), text);

        parts
    }

    /// Whether a part survives the generate flags.
    fn keep_part(&self, kind: PartKind) -> bool {
        match kind {
            PartKind::Word => self.config.generate_word_parts,
            PartKind::Number => self.config.generate_number_parts,
            // Mixed parts (letters+digits, split_on_numerics off) survive if
            // either flag is set.
            PartKind::Mixed => self.config.generate_word_parts || self.config.generate_number_parts,
        }
    }

    /// Emit catenated variants of the parts, sharing the first position.
    fn catenations(&self, text: &str, parts: &[Part]) -> Vec<String> {
        let mut out = Vec::new();

        if self.config.catenate_all && parts.len() > 1 {
            let joined: String = parts.iter().map(|p| &text[p.start..p.end]).collect();
            out.push(joined);
        }

        for (flag, kind) in [
            (self.config.catenate_words, PartKind::Word),
            (self.config.catenate_numbers, PartKind::Number),
        ] {
            if !flag {
                continue;
            }
            let mut run = String::new();
            let mut run_len = 0;
            for part in parts {
                if part.kind == kind {
                    run.push_str(&text[part.start..part.end]);
                    run_len += 1;
                } else {
                    if run_len > 1 {
                        out.push(std::mem::take(&mut run));
                    } else {
                        run.clear();
                    }
                    run_len = 0;
                }
            }
            if run_len > 1 {
                out.push(run);
            }
        }

        out
    }
}

impl Filter for WordDelimiterFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let mut output: Vec<Token> = Vec::new();
        // Tokens that split into several parts shift the positions of
        // everything after them so phrase adjacency stays meaningful.
        let mut shift = 0usize;

        for token in tokens {
            let position = token.position + shift;

            if token.is_stopped() {
                output.push(token.with_position(position));
                continue;
            }

            let text = self.strip_possessive(&token.text);
            let parts = self.split_parts(text);

            // Fast path: nothing to split, keep the (possibly de-possessived)
            // token as-is.
            if parts.len() == 1 && parts[0].start == 0 && parts[0].end == text.len() {
                if self.keep_part(parts[0].kind) {
                    let mut out = token.with_position(position);
                    if text.len() != token.text.len() {
                        out.text = text.to_string();
                    }
                    output.push(out);
                }
                continue;
            }

            if parts.is_empty() {
                // All-delimiter token ("--"): drop it, leaving a position gap.
                continue;
            }

            if self.config.preserve_original {
                let mut original = token.with_position(position);
                original.text = text.to_string();
                output.push(original);
            }

            let mut emitted = 0;
            for part in &parts {
                if !self.keep_part(part.kind) {
                    continue;
                }
                let mut sub = Token::with_offsets(
                    &text[part.start..part.end],
                    position + emitted,
                    token.start_offset + part.start,
                    token.start_offset + part.end,
                );
                sub.stopped = token.stopped;
                output.push(sub);
                emitted += 1;
            }

            for catenated in self.catenations(text, &parts) {
                let mut cat = Token::with_offsets(
                    catenated,
                    position,
                    token.start_offset,
                    token.end_offset,
                );
                cat.stopped = token.stopped;
                output.push(cat);
            }

            if emitted > 1 {
                shift += emitted - 1;
            }
        }

        Ok(Box::new(output.into_iter()))
    }

    fn name(&self) -> &'static str {
        "word_delimiter"
    }
}
