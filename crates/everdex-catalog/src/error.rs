//! Error types for catalog operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the catalog store.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The database rejected an operation (locked, corrupt, disk full...).
    #[error("Catalog database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A catalog or sidecar file could not be read or written.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stored value or the preferences sidecar is not valid JSON.
    #[error("Malformed catalog data: {0}")]
    Json(#[from] serde_json::Error),

    /// The preferences sidecar is valid JSON but not an object.
    #[error("Preferences file {path} does not contain a JSON object")]
    PrefsNotObject { path: PathBuf },

    /// The search string could not be compiled.
    #[error(transparent)]
    Query(#[from] everdex_query::QueryError),

    /// An exclusion pattern was blank.
    #[error("Exclusion pattern cannot be empty")]
    EmptyPattern,
}

impl CatalogError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_mentions_path() {
        let err = CatalogError::io(
            "/data/everdex.db",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/data/everdex.db"));
    }
}
