//! Search-string grammar for everdex.
//!
//! A search string is a `|`-separated list of terms; a file name matches the
//! query when it matches any term. Each term is one of:
//!
//! - **`include!exclude`** - name contains `include` and does not contain
//!   `exclude`. Only the first `!` splits; both halves are literal text.
//! - **wildcard** - any term with `*` or `?`, matched against the whole name.
//! - **substring** - everything else.
//!
//! All comparisons fold ASCII case only.
//!
//! ```rust
//! use everdex_query::Query;
//!
//! let query = Query::parse("photo!jpg | *.txt").unwrap();
//! assert!(query.matches("photo2.png"));
//! assert!(query.matches("README.TXT"));
//! assert!(!query.matches("photo1.jpg"));
//! ```

mod term;

use std::str::FromStr;

use thiserror::Error;

pub use term::Term;

/// Errors raised while compiling a search string.
#[derive(Debug, Error)]
pub enum QueryError {
    /// A wildcard term could not be compiled.
    #[error("Invalid wildcard pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A parsed search string: the OR of its terms.
#[derive(Debug, Clone, Default)]
pub struct Query {
    terms: Vec<Term>,
}

impl Query {
    /// Parse a search string.
    ///
    /// A string that is blank after trimming is the empty query. Otherwise
    /// every `|`-separated piece is a term, so a blank piece (`"a||b"`, a
    /// trailing `|`) is an empty substring that matches every name.
    pub fn parse(input: &str) -> Result<Self, QueryError> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(Self::default());
        }
        let terms = input
            .split('|')
            .map(str::trim)
            .map(Term::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { terms })
    }

    /// True when the query has no terms and should list everything.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// The OR-terms in input order.
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Check if a file name matches any term.
    pub fn matches(&self, name: &str) -> bool {
        let folded = name.to_ascii_lowercase();
        self.terms.iter().any(|term| term.matches_folded(&folded))
    }
}

impl FromStr for Query {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
