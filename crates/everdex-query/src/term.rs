//! Single search terms.

use regex::Regex;

use crate::QueryError;

/// One OR-branch of a query. Text is stored ASCII-lowercased.
#[derive(Debug, Clone)]
pub enum Term {
    /// `include!exclude`; an empty `include` only rules names out.
    Except { include: String, exclude: String },
    /// Whole-name wildcard match (`*` any run, `?` one character).
    Wildcard { pattern: String, matcher: Regex },
    /// Name contains the text.
    Contains(String),
}

impl Term {
    /// Parse a trimmed term. An empty term is an empty substring.
    pub fn parse(term: &str) -> Result<Self, QueryError> {
        if let Some((include, exclude)) = term.split_once('!') {
            return Ok(Self::Except {
                include: include.trim().to_ascii_lowercase(),
                exclude: exclude.trim().to_ascii_lowercase(),
            });
        }

        let term = term.to_ascii_lowercase();
        if term.contains(['*', '?']) {
            let matcher = Regex::new(&wildcard_source(&term)).map_err(|source| {
                QueryError::InvalidPattern {
                    pattern: term.clone(),
                    source,
                }
            })?;
            return Ok(Self::Wildcard {
                pattern: term,
                matcher,
            });
        }

        Ok(Self::Contains(term))
    }

    /// Check if a file name matches this term.
    pub fn matches(&self, name: &str) -> bool {
        self.matches_folded(&name.to_ascii_lowercase())
    }

    /// Match against a name that is already ASCII-lowercased.
    pub(crate) fn matches_folded(&self, name: &str) -> bool {
        match self {
            Self::Except { include, exclude } => {
                (include.is_empty() || name.contains(include.as_str()))
                    && !name.contains(exclude.as_str())
            }
            Self::Wildcard { matcher, .. } => matcher.is_match(name),
            Self::Contains(text) => name.contains(text.as_str()),
        }
    }
}

/// Anchored regex source where only `*` and `?` are special.
///
/// `?` is one Unicode scalar and `*` any run of them, newlines included.
/// No case flag is set; both sides are ASCII-lowercased before matching.
fn wildcard_source(term: &str) -> String {
    let mut source = String::with_capacity(term.len() * 2 + 6);
    source.push_str("(?s)^");
    let mut literal = String::new();
    for c in term.chars() {
        if c == '*' || c == '?' {
            source.push_str(&regex::escape(&literal));
            literal.clear();
            source.push_str(if c == '*' { ".*" } else { "." });
        } else {
            literal.push(c);
        }
    }
    source.push_str(&regex::escape(&literal));
    source.push('$');
    source
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(text: &str) -> Term {
        Term::parse(text).unwrap()
    }

    #[test]
    fn test_term_kinds() {
        assert!(matches!(term("photo"), Term::Contains(_)));
        assert!(matches!(term("*.txt"), Term::Wildcard { .. }));
        assert!(matches!(term("a?c"), Term::Wildcard { .. }));
        assert!(matches!(term("a!b"), Term::Except { .. }));
    }

    #[test]
    fn test_case_insensitive() {
        assert!(term("PHOTO").matches("photo1.jpg"));
        assert!(term("photo").matches("PHOTO1.JPG"));
        assert!(term("*.TXT").matches("readme.txt"));
        assert!(term("readme!JPG").matches("README.txt"));
    }

    #[test]
    fn test_wildcard_is_anchored() {
        assert!(term("*.txt").matches("readme.txt"));
        assert!(!term("*.txt").matches("readme.txt.bak"));
        assert!(!term("read*").matches("unreadable"));
        assert!(term("*read*").matches("unreadable"));
    }

    #[test]
    fn test_question_mark_is_exactly_one_char() {
        assert!(term("photo?.jpg").matches("photo1.jpg"));
        assert!(!term("photo?.jpg").matches("photo.jpg"));
        assert!(!term("photo?.jpg").matches("photo12.jpg"));
    }

    #[test]
    fn test_question_mark_matches_one_unicode_char() {
        assert!(term("?.txt").matches("a.txt"));
        assert!(term("?.txt").matches("é.txt"));
        assert!(term("caf?.txt").matches("café.txt"));
        assert!(term("caf?.txt").matches("Café.TXT"));
        assert!(!term("caf??.txt").matches("café.txt"));
        assert!(term("*é*").matches("résumé.pdf"));
    }

    #[test]
    fn test_empty_term_matches_every_name() {
        let t = term("");
        assert!(matches!(t, Term::Contains(ref text) if text.is_empty()));
        assert!(t.matches("readme.txt"));
    }

    #[test]
    fn test_star_matches_empty_run() {
        assert!(term("photo*.jpg").matches("photo.jpg"));
        assert!(term("*").matches("anything"));
        assert!(term("a**b").matches("ab"));
    }

    #[test]
    fn test_pattern_metacharacters_are_literal() {
        assert!(term("[draft]*").matches("[draft] notes.md"));
        assert!(!term("[draft]*").matches("d notes.md"));
        assert!(term("{a,b}*").matches("{a,b}.txt"));
        assert!(term("*\\*").matches("dir\\file"));
        assert!(term("a.b*").matches("a.bc"));
        assert!(!term("a.b*").matches("axbc"));
        assert!(term("(1)?").matches("(1)x"));
    }

    #[test]
    fn test_split_on_first_bang_only() {
        // include "photo", exclude "jpg!png" as one literal string
        let t = term("photo!jpg!png");
        assert!(t.matches("photo.jpg"));
        assert!(!t.matches("photo.jpg!png"));
    }

    #[test]
    fn test_empty_include_only_excludes() {
        let t = term("!jpg");
        assert!(t.matches("readme.txt"));
        assert!(!t.matches("photo1.jpg"));
    }

    #[test]
    fn test_empty_exclude_matches_nothing() {
        assert!(!term("photo!").matches("photo1.jpg"));
    }

    #[test]
    fn test_wildcards_are_literal_inside_except() {
        // `!` splits first, so `a*` is a literal substring here
        let t = term("a*!b");
        assert!(!t.matches("abc"));
        assert!(!t.matches("axc"));
        assert!(t.matches("a*c"));
        assert!(!t.matches("a*b"));
    }
}
