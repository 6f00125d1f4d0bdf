//! Directory exclusion rules applied while crawling.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Why a directory was left out of a crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exclusion {
    /// The directory is, or lies under, a wholly-excluded folder.
    Wholly(PathBuf),
    /// The directory matches one of the crawled folder's relative patterns.
    Pattern(PathBuf),
}

/// Exclusion rules for one crawl of one folder.
///
/// Both kinds of rule compare whole path components, so excluding `cache`
/// never hides `cached`.
#[derive(Debug, Clone, Default)]
pub struct ExclusionRules {
    root: PathBuf,
    wholly: Vec<PathBuf>,
    patterns: Vec<PathBuf>,
}

impl ExclusionRules {
    /// Build the rules for crawling `root`.
    pub fn new(
        root: impl Into<PathBuf>,
        wholly: HashSet<String>,
        patterns: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            root: root.into(),
            wholly: wholly.into_iter().map(PathBuf::from).collect(),
            patterns: patterns
                .into_iter()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from)
                .collect(),
        }
    }

    /// The folder these rules were built for.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check whether a directory (and so its subtree) must be skipped.
    pub fn check(&self, dir: &Path) -> Option<Exclusion> {
        if let Some(folder) = self.wholly.iter().find(|folder| dir.starts_with(folder)) {
            return Some(Exclusion::Wholly(folder.clone()));
        }

        let relative = dir.strip_prefix(&self.root).ok()?;
        if relative.as_os_str().is_empty() {
            return None;
        }
        self.patterns
            .iter()
            .find(|pattern| relative.starts_with(pattern))
            .map(|pattern| Exclusion::Pattern(pattern.clone()))
    }

    /// Check if the crawl root itself falls under a wholly-excluded folder.
    pub fn root_excluded(&self) -> bool {
        self.check(&self.root).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(wholly: &[&str], patterns: &[&str]) -> ExclusionRules {
        ExclusionRules::new(
            "/data",
            wholly.iter().map(|s| s.to_string()).collect(),
            patterns.iter().map(|s| s.to_string()),
        )
    }

    #[test]
    fn test_wholly_excluded_subtree() {
        let rules = rules(&["/data/private"], &[]);
        assert!(matches!(
            rules.check(Path::new("/data/private")),
            Some(Exclusion::Wholly(_))
        ));
        assert!(rules.check(Path::new("/data/private/deep/er")).is_some());
        assert!(rules.check(Path::new("/data/privateer")).is_none());
        assert!(!rules.root_excluded());
    }

    #[test]
    fn test_root_under_excluded_ancestor() {
        assert!(rules(&["/"], &[]).root_excluded());
        assert!(rules(&["/data"], &[]).root_excluded());
        assert!(!rules(&["/dat"], &[]).root_excluded());
    }

    #[test]
    fn test_relative_patterns() {
        let rules = rules(&[], &["cache", "tmp/logs"]);
        assert_eq!(
            rules.check(Path::new("/data/cache")),
            Some(Exclusion::Pattern(PathBuf::from("cache")))
        );
        assert!(rules.check(Path::new("/data/cache/inner")).is_some());
        assert!(rules.check(Path::new("/data/tmp/logs/2024")).is_some());
        assert!(rules.check(Path::new("/data/cached")).is_none());
        assert!(rules.check(Path::new("/data/tmp")).is_none());
        assert!(rules.check(Path::new("/data/src/cache")).is_none());
    }

    #[test]
    fn test_patterns_never_exclude_root() {
        let rules = rules(&[], &["", "  "]);
        assert!(rules.check(Path::new("/data")).is_none());
        assert!(rules.check(Path::new("/data/anything")).is_none());
    }
}
