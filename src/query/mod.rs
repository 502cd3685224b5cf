//! Query model and parser.
//!
//! Queries are a small sum type rather than a trait hierarchy: a query is
//! a term, a phrase, or a boolean combination of other queries, and the
//! searcher evaluates the whole tree with one recursive function.

pub mod parser;

pub use parser::QueryParser;

/// How a clause participates in a boolean query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occur {
    /// Clause must match. Non-matching documents are excluded.
    Must,

    /// Clause may match and contributes to the score.
    Should,

    /// Clause must not match. Matching documents are excluded and the
    /// clause never contributes to scores.
    MustNot,
}

impl std::fmt::Display for Occur {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Occur::Must => write!(f, "+"),
            Occur::Should => write!(f, ""),
            Occur::MustNot => write!(f, "-"),
        }
    }
}

/// A query matching documents that contain a single term in a field.
#[derive(Debug, Clone, PartialEq)]
pub struct TermQuery {
    /// Field to search in.
    pub field: String,

    /// Analyzed term to look up.
    pub term: String,

    /// Score multiplier.
    pub boost: f32,
}

impl TermQuery {
    /// Create a term query with a boost of 1.
    pub fn new<F: Into<String>, T: Into<String>>(field: F, term: T) -> Self {
        TermQuery {
            field: field.into(),
            term: term.into(),
            boost: 1.0,
        }
    }

    /// Set the score multiplier.
    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }
}

/// A query matching documents where the terms appear contiguously in order.
#[derive(Debug, Clone, PartialEq)]
pub struct PhraseQuery {
    /// Field to search in.
    pub field: String,

    /// Analyzed terms, in phrase order.
    pub terms: Vec<String>,

    /// Score multiplier.
    pub boost: f32,
}

impl PhraseQuery {
    /// Create a phrase query with a boost of 1.
    pub fn new<F: Into<String>>(field: F, terms: Vec<String>) -> Self {
        PhraseQuery {
            field: field.into(),
            terms,
            boost: 1.0,
        }
    }

    /// Set the score multiplier.
    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }
}

/// A child query together with its occurrence requirement.
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanClause {
    /// The child query.
    pub query: Query,

    /// How the clause participates.
    pub occur: Occur,
}

impl BooleanClause {
    /// Create a clause.
    pub fn new(query: Query, occur: Occur) -> Self {
        BooleanClause { query, occur }
    }
}

/// A boolean combination of child queries.
///
/// A boolean query with no positive (must or should) clause matches no
/// documents, even when it has must-not clauses.
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanQuery {
    /// The child clauses.
    pub clauses: Vec<BooleanClause>,

    /// Score multiplier applied to the combined score.
    pub boost: f32,
}

impl Default for BooleanQuery {
    fn default() -> Self {
        BooleanQuery::new()
    }
}

impl BooleanQuery {
    /// Create an empty boolean query with a boost of 1.
    pub fn new() -> Self {
        BooleanQuery {
            clauses: Vec::new(),
            boost: 1.0,
        }
    }

    /// Add a clause that must match.
    pub fn add_must(mut self, query: Query) -> Self {
        self.clauses.push(BooleanClause::new(query, Occur::Must));
        self
    }

    /// Add a clause that may match.
    pub fn add_should(mut self, query: Query) -> Self {
        self.clauses.push(BooleanClause::new(query, Occur::Should));
        self
    }

    /// Add a clause that must not match.
    pub fn add_must_not(mut self, query: Query) -> Self {
        self.clauses.push(BooleanClause::new(query, Occur::MustNot));
        self
    }

    /// Set the score multiplier.
    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    /// Whether the query has no clauses at all.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Whether the query has at least one must or should clause.
    pub fn has_positive_clause(&self) -> bool {
        self.clauses
            .iter()
            .any(|clause| clause.occur != Occur::MustNot)
    }
}

/// A parsed query tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Single-term lookup.
    Term(TermQuery),

    /// Exact contiguous phrase.
    Phrase(PhraseQuery),

    /// Boolean combination.
    Boolean(BooleanQuery),
}

impl Query {
    /// Score multiplier of the query node.
    pub fn boost(&self) -> f32 {
        match self {
            Query::Term(q) => q.boost,
            Query::Phrase(q) => q.boost,
            Query::Boolean(q) => q.boost,
        }
    }

    /// Human-readable description for logs and tests.
    pub fn description(&self) -> String {
        match self {
            Query::Term(q) => format!("{}:{}", q.field, q.term),
            Query::Phrase(q) => format!("{}:\"{}\"", q.field, q.terms.join(" ")),
            Query::Boolean(q) => {
                let parts: Vec<String> = q
                    .clauses
                    .iter()
                    .map(|clause| format!("{}({})", clause.occur, clause.query.description()))
                    .collect();
                parts.join(" ")
            }
        }
    }
}

impl From<TermQuery> for Query {
    fn from(query: TermQuery) -> Self {
        Query::Term(query)
    }
}

impl From<PhraseQuery> for Query {
    fn from(query: PhraseQuery) -> Self {
        Query::Phrase(query)
    }
}

impl From<BooleanQuery> for Query {
    fn from(query: BooleanQuery) -> Self {
        Query::Boolean(query)
    }
}
