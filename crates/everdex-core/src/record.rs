//! Folder and file record types.

use std::path::{MAIN_SEPARATOR, Path};

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Identity of a folder row in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FolderId(pub i64);

impl FolderId {
    /// Create a new FolderId from a raw row id.
    pub fn new(id: i64) -> Self {
        Self(id)
    }
}

/// Exclusion state attached to a folder.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExclusionState {
    /// Nothing under the folder is excluded.
    #[default]
    Included,
    /// Relative sub-paths skipped while crawling the folder, in insertion order.
    Patterns(Vec<String>),
    /// The folder and its whole subtree are never crawled.
    Wholly,
}

impl ExclusionState {
    /// Build the state from the two persisted columns.
    pub fn from_parts(wholly: bool, patterns: Vec<String>) -> Self {
        if wholly {
            Self::Wholly
        } else if patterns.is_empty() {
            Self::Included
        } else {
            Self::Patterns(patterns)
        }
    }

    /// Check if this is the wholly-excluded sentinel.
    pub fn is_wholly(&self) -> bool {
        matches!(self, Self::Wholly)
    }

    /// Relative patterns, empty unless the state is `Patterns`.
    pub fn patterns(&self) -> &[String] {
        match self {
            Self::Patterns(patterns) => patterns,
            _ => &[],
        }
    }
}

/// A folder that was indexed or excluded at least once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    /// Row identity.
    pub id: FolderId,
    /// Absolute folder path (unique).
    pub path: String,
    /// Current exclusion state.
    pub exclusion: ExclusionState,
}

/// A catalogued file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Absolute path, unique across the catalog.
    pub path: String,
    /// Folder whose crawl last observed this file.
    pub folder: FolderId,
    /// File name (last path component).
    pub name: CompactString,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub modified: DateTime<Utc>,
    /// Lowercase extension including the leading dot, or empty.
    pub file_type: CompactString,
    /// When the record was last written by a crawl.
    pub indexed_at: DateTime<Utc>,
}

impl FileRecord {
    /// Create a record, deriving name and type from the path.
    pub fn new(
        path: impl Into<String>,
        folder: FolderId,
        size: u64,
        modified: DateTime<Utc>,
        indexed_at: DateTime<Utc>,
    ) -> Self {
        let path = path.into();
        let name = display_name(&path);
        let file_type = extension_of(&name);
        Self {
            path,
            folder,
            name,
            size,
            modified,
            file_type,
            indexed_at,
        }
    }
}

/// Catalog key for a path: lossy UTF-8 without trailing separators.
///
/// Roots such as `/` or `C:\` keep their separator.
pub fn path_key(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let trimmed = raw.trim_end_matches(['/', MAIN_SEPARATOR]);
    if trimmed.is_empty() || trimmed.ends_with(':') {
        raw.into_owned()
    } else {
        trimmed.to_string()
    }
}

/// Last component of a catalog path.
pub fn display_name(path: &str) -> CompactString {
    let name = path
        .rsplit(['/', MAIN_SEPARATOR])
        .find(|part| !part.is_empty())
        .unwrap_or(path);
    CompactString::new(name)
}

/// Lowercase extension of a file name, including the leading dot.
///
/// Leading dots do not start an extension, so `.bashrc` has none while
/// `archive.tar.GZ` yields `.gz`.
pub fn extension_of(name: &str) -> CompactString {
    let stem_start = name.len() - name.trim_start_matches('.').len();
    match name[stem_start..].rfind('.') {
        Some(dot) => CompactString::new(name[stem_start + dot..].to_lowercase()),
        None => CompactString::default(),
    }
}
