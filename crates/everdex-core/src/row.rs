//! Search requests and result rows.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::drive::drive_label;

/// One row of a search result, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    /// File name.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Lowercase extension including the dot.
    #[serde(rename = "type")]
    pub file_type: String,
    /// Heuristic volume label.
    pub drive: String,
    /// Absolute path.
    pub path: String,
}

impl ResultRow {
    /// Build a row and label it with its drive.
    pub fn new(name: String, size: u64, file_type: String, path: String) -> Self {
        let drive = drive_label(&path).into_owned();
        Self {
            name,
            size,
            file_type,
            drive,
            path,
        }
    }
}

/// Column a result list can be ordered by.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,
    Size,
    Type,
    Drive,
    Path,
}

/// Explicit ordering requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: SortKey,
    pub descending: bool,
}

impl SortSpec {
    pub fn new(key: SortKey, descending: bool) -> Self {
        Self { key, descending }
    }
}

/// A search as issued by the UI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Raw search string; empty lists the most recently indexed files.
    pub term: String,
    /// Maximum number of rows (None = unlimited).
    pub limit: Option<usize>,
    /// Re-order the rows after matching.
    pub sort: Option<SortSpec>,
}

impl SearchRequest {
    /// Create an unlimited, catalog-ordered search.
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            limit: None,
            sort: None,
        }
    }

    /// Cap the number of rows.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Request an explicit ordering.
    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }
}

/// Stable-sort rows by one column.
///
/// Names compare with ASCII case folded and fall back to the path, the same
/// order the catalog returns matches in.
pub fn sort_rows(rows: &mut [ResultRow], sort: SortSpec) {
    rows.sort_by(|a, b| {
        let ordering = match sort.key {
            SortKey::Name => a
                .name
                .to_ascii_lowercase()
                .cmp(&b.name.to_ascii_lowercase())
                .then_with(|| a.path.cmp(&b.path)),
            SortKey::Size => a.size.cmp(&b.size),
            SortKey::Type => a.file_type.cmp(&b.file_type),
            SortKey::Drive => a.drive.cmp(&b.drive),
            SortKey::Path => a.path.cmp(&b.path),
        };
        if sort.descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}
