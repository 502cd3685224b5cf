//! Text query parser.
//!
//! Syntax:
//!
//! - bare tokens match any of the target fields (`accuracy table`)
//! - `+token` marks a mandatory clause, `-token` a prohibited one
//! - `"quoted text"` matches an exact contiguous phrase
//! - `field:token` and `field:"quoted text"` target a single field
//!
//! Every clause's text runs through the analyzer of the field it targets,
//! so queries and indexed text agree on tokenization.

use std::sync::Arc;

use crate::error::{Result, TabulaError};
use crate::query::{BooleanQuery, Occur, PhraseQuery, Query, TermQuery};
use crate::schema::FieldSchema;

/// Parser turning query text into a [`Query`] tree.
#[derive(Debug, Clone)]
pub struct QueryParser {
    schema: Arc<FieldSchema>,
}

/// One lexed clause before analysis.
#[derive(Debug)]
struct RawClause {
    occur: Occur,
    text: String,
    is_phrase: bool,
    field: Option<String>,
}

impl QueryParser {
    /// Create a parser over the given schema.
    pub fn new(schema: Arc<FieldSchema>) -> Self {
        QueryParser { schema }
    }

    /// Parse query text against the given default fields.
    ///
    /// A multi-field clause becomes a should-group over the per-field
    /// queries, each carrying its field's boost from the schema. Clauses
    /// whose text analyzes to nothing (for example, all stop words) are
    /// dropped; a query of only such clauses matches no documents.
    pub fn parse(&self, fields: &[&str], query_text: &str) -> Result<Query> {
        if fields.is_empty() {
            return Err(TabulaError::invalid_argument(
                "at least one default field is required",
            ));
        }

        let raw_clauses = lex(query_text)?;
        let mut query = BooleanQuery::new();
        for raw in raw_clauses {
            if let Some(subquery) = self.build_clause(fields, &raw)? {
                query.clauses.push(crate::query::BooleanClause::new(subquery, raw.occur));
            }
        }
        log::debug!("parsed {query_text:?} into {}", Query::Boolean(query.clone()).description());
        Ok(Query::Boolean(query))
    }

    /// Build the query for one clause, or `None` when it analyzes away.
    fn build_clause(&self, fields: &[&str], raw: &RawClause) -> Result<Option<Query>> {
        let targets: Vec<&str> = match &raw.field {
            Some(field) => vec![field.as_str()],
            None => fields.to_vec(),
        };

        let mut per_field = Vec::new();
        for field in targets {
            if let Some(subquery) = self.build_field_clause(field, raw)? {
                per_field.push(subquery);
            }
        }

        Ok(match per_field.len() {
            0 => None,
            1 => per_field.pop(),
            _ => {
                let mut group = BooleanQuery::new();
                for subquery in per_field {
                    group = group.add_should(subquery);
                }
                Some(Query::Boolean(group))
            }
        })
    }

    fn build_field_clause(&self, field: &str, raw: &RawClause) -> Result<Option<Query>> {
        let analyzer = self.schema.analyzer(field);
        let boost = self.schema.boost(field);

        let terms: Vec<String> = analyzer
            .analyze(&raw.text)?
            .filter(|token| !token.is_stopped())
            .map(|token| token.text)
            .collect();

        Ok(match (terms.len(), raw.is_phrase) {
            (0, _) => None,
            (1, _) => {
                let mut terms = terms;
                let term = terms.pop().unwrap_or_default();
                Some(Query::Term(TermQuery::new(field, term).with_boost(boost)))
            }
            (_, true) => Some(Query::Phrase(PhraseQuery::new(field, terms).with_boost(boost))),
            (_, false) => {
                // A single token that splits into several terms becomes a
                // should-group, so "wi-fi" still matches "wi" or "fi".
                let mut group = BooleanQuery::new().with_boost(boost);
                for term in terms {
                    group = group.add_should(Query::Term(TermQuery::new(field, term)));
                }
                Some(Query::Boolean(group))
            }
        })
    }
}

/// Split query text into raw clauses.
fn lex(query_text: &str) -> Result<Vec<RawClause>> {
    let mut clauses = Vec::new();
    let mut chars = query_text.chars().peekable();

    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        let occur = match ch {
            '+' => {
                chars.next();
                Occur::Must
            }
            '-' => {
                chars.next();
                Occur::MustNot
            }
            _ => Occur::Should,
        };

        match chars.peek() {
            Some('"') => {
                chars.next();
                clauses.push(RawClause {
                    occur,
                    text: read_phrase(&mut chars)?,
                    is_phrase: true,
                    field: None,
                });
            }
            Some(_) => {
                let word = read_word(&mut chars);
                if word.is_empty() {
                    // A lone + or - before whitespace or end of input.
                    continue;
                }
                match word.split_once(':') {
                    Some((field, rest)) if !field.is_empty() => {
                        if rest.is_empty() && chars.peek() == Some(&'"') {
                            chars.next();
                            clauses.push(RawClause {
                                occur,
                                text: read_phrase(&mut chars)?,
                                is_phrase: true,
                                field: Some(field.to_string()),
                            });
                        } else if !rest.is_empty() {
                            clauses.push(RawClause {
                                occur,
                                text: rest.to_string(),
                                is_phrase: false,
                                field: Some(field.to_string()),
                            });
                        } else {
                            return Err(TabulaError::query(format!(
                                "missing term after field prefix '{field}:'"
                            )));
                        }
                    }
                    _ => clauses.push(RawClause {
                        occur,
                        text: word,
                        is_phrase: false,
                        field: None,
                    }),
                }
            }
            None => {}
        }
    }

    Ok(clauses)
}

/// Read up to the closing quote, which must be present.
fn read_phrase(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Result<String> {
    let mut text = String::new();
    for ch in chars.by_ref() {
        if ch == '"' {
            return Ok(text);
        }
        text.push(ch);
    }
    Err(TabulaError::query("unbalanced quotes in query"))
}

/// Read a bare word up to whitespace or an opening quote.
fn read_word(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut word = String::new();
    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            break;
        }
        if ch == '"' {
            break;
        }
        word.push(ch);
        chars.next();
    }
    word
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> QueryParser {
        QueryParser::new(Arc::new(FieldSchema::paper_tables()))
    }

    fn clauses(query: &Query) -> &[crate::query::BooleanClause] {
        match query {
            Query::Boolean(boolean) => &boolean.clauses,
            other => panic!("expected boolean query, got {other:?}"),
        }
    }

    #[test]
    fn test_single_term_single_field() {
        let query = parser().parse(&["caption"], "accuracy").unwrap();

        let clauses = clauses(&query);
        assert_eq!(clauses.len(), 1);
        assert_eq!(clauses[0].occur, Occur::Should);
        match &clauses[0].query {
            Query::Term(term) => {
                assert_eq!(term.field, "caption");
                assert_eq!(term.term, "accuracy");
                assert_eq!(term.boost, 1.0);
            }
            other => panic!("expected term query, got {other:?}"),
        }
    }

    #[test]
    fn test_must_and_must_not_prefixes() {
        let query = parser().parse(&["caption"], "+data -learning model").unwrap();

        let clauses = clauses(&query);
        assert_eq!(clauses.len(), 3);
        assert_eq!(clauses[0].occur, Occur::Must);
        assert_eq!(clauses[1].occur, Occur::MustNot);
        assert_eq!(clauses[2].occur, Occur::Should);
    }

    #[test]
    fn test_phrase_clause() {
        let query = parser().parse(&["caption"], "\"machine learning\"").unwrap();

        let clauses = clauses(&query);
        assert_eq!(clauses.len(), 1);
        match &clauses[0].query {
            Query::Phrase(phrase) => {
                assert_eq!(phrase.field, "caption");
                assert_eq!(phrase.terms, vec!["machine", "learning"]);
            }
            other => panic!("expected phrase query, got {other:?}"),
        }
    }

    #[test]
    fn test_unbalanced_quote_is_error() {
        assert!(parser().parse(&["caption"], "\"machine learning").is_err());
    }

    #[test]
    fn test_field_prefix_without_term_is_error() {
        assert!(parser().parse(&["caption"], "table:").is_err());
        assert!(parser().parse(&["caption"], "accuracy +table:").is_err());
    }

    #[test]
    fn test_single_term_phrase_collapses_to_term() {
        let query = parser().parse(&["caption"], "\"accuracy\"").unwrap();

        match &clauses(&query)[0].query {
            Query::Term(term) => assert_eq!(term.term, "accuracy"),
            other => panic!("expected term query, got {other:?}"),
        }
    }

    #[test]
    fn test_field_targeted_term() {
        let query = parser().parse(&["caption", "table"], "references:smith").unwrap();

        let clauses = clauses(&query);
        assert_eq!(clauses.len(), 1);
        match &clauses[0].query {
            Query::Term(term) => {
                assert_eq!(term.field, "references");
                assert_eq!(term.term, "smith");
                assert_eq!(term.boost, 0.6);
            }
            other => panic!("expected term query, got {other:?}"),
        }
    }

    #[test]
    fn test_field_targeted_phrase() {
        let query = parser()
            .parse(&["caption"], "table:\"error rate\"")
            .unwrap();

        match &clauses(&query)[0].query {
            Query::Phrase(phrase) => {
                assert_eq!(phrase.field, "table");
                assert_eq!(phrase.terms, vec!["error", "rate"]);
                assert_eq!(phrase.boost, 0.8);
            }
            other => panic!("expected phrase query, got {other:?}"),
        }
    }

    #[test]
    fn test_multi_field_expands_to_should_group() {
        let query = parser().parse(&["caption", "table"], "accuracy").unwrap();

        let clauses = clauses(&query);
        assert_eq!(clauses.len(), 1);
        match &clauses[0].query {
            Query::Boolean(group) => {
                assert_eq!(group.clauses.len(), 2);
                let boosts: Vec<f32> = group
                    .clauses
                    .iter()
                    .map(|clause| clause.query.boost())
                    .collect();
                assert_eq!(boosts, vec![1.0, 0.8]);
            }
            other => panic!("expected boolean group, got {other:?}"),
        }
    }

    #[test]
    fn test_stopword_only_clause_dropped() {
        let query = parser().parse(&["caption"], "the of").unwrap();

        assert!(clauses(&query).is_empty());
    }

    #[test]
    fn test_tokenization_matches_index_analyzer() {
        // The caption analyzer splits on case change and delimiters.
        let query = parser().parse(&["caption"], "Wi-Fi").unwrap();

        match &clauses(&query)[0].query {
            Query::Boolean(group) => {
                let terms: Vec<&str> = group
                    .clauses
                    .iter()
                    .map(|clause| match &clause.query {
                        Query::Term(term) => term.term.as_str(),
                        other => panic!("expected term query, got {other:?}"),
                    })
                    .collect();
                assert_eq!(terms, vec!["wi", "fi"]);
            }
            other => panic!("expected should group, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_query_text() {
        let query = parser().parse(&["caption"], "   ").unwrap();
        assert!(clauses(&query).is_empty());
    }

    #[test]
    fn test_no_fields_is_invalid() {
        assert!(parser().parse(&[], "accuracy").is_err());
    }
}
