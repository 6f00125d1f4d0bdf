//! Error types for crawling.

use std::path::PathBuf;

use thiserror::Error;

use everdex_catalog::CatalogError;

/// Errors that abort an index or rescan.
///
/// Per-file failures during a walk never surface here; they are counted in
/// the outcome instead.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The argument is not an existing directory.
    #[error("Not a directory: {path}")]
    InvalidPath { path: PathBuf },

    /// No indexed, non-excluded folder lies under the rescan root.
    #[error("No indexed folders found under {root}")]
    NotFound { root: PathBuf },

    /// The catalog failed underneath the crawl.
    #[error(transparent)]
    Store(#[from] CatalogError),
}

impl IndexError {
    pub fn invalid_path(path: impl Into<PathBuf>) -> Self {
        Self::InvalidPath { path: path.into() }
    }
}
