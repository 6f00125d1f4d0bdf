//! Crawl results and progress events.

use std::path::{Path, PathBuf};

use crate::IndexError;

/// Event sent from a background crawl.
#[derive(Debug)]
pub enum IndexEvent {
    /// Running count of files indexed in `folder` during this crawl.
    Progress { folder: PathBuf, files: u64 },
    /// A single-folder index finished.
    Indexed(IndexOutcome),
    /// A rescan finished.
    Rescanned(RescanOutcome),
    /// The crawl stopped with an error.
    Failed(IndexError),
}

/// Result of indexing one folder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexOutcome {
    /// Catalog key of the folder that was indexed.
    pub folder: PathBuf,
    /// Files written to the catalog.
    pub indexed: u64,
    /// Stale records deleted by reconciliation.
    pub removed: u64,
    /// Entries skipped because they could not be read.
    pub failed: u64,
    /// Directories whose listing was read.
    pub dirs_visited: u64,
    /// Directories pruned by exclusion rules.
    pub excluded: u64,
    /// The folder itself is wholly excluded and was not crawled.
    pub folder_excluded: bool,
    /// Human-readable summary.
    pub message: String,
}

impl IndexOutcome {
    pub(crate) fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            ..Self::default()
        }
    }

    /// Summary for a completed crawl.
    pub(crate) fn summarize(&mut self, reconcile: bool) {
        let mut message = format!("Indexed {} files from {}", self.indexed, base_name(&self.folder));
        if reconcile && self.removed > 0 {
            message.push_str(&format!(", removed {} missing files.", self.removed));
        }
        self.message = message;
    }

    /// Summary for a folder that was skipped as excluded.
    pub(crate) fn skip_excluded(&mut self) {
        self.folder_excluded = true;
        self.message = format!("Folder '{}' is excluded (skipped).", base_name(&self.folder));
    }
}

/// Aggregate result of a rescan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RescanOutcome {
    /// Root the rescan was asked for.
    pub root: PathBuf,
    /// Folders found under the root.
    pub folders: usize,
    /// Folders whose index failed.
    pub failed: usize,
    /// Files indexed across all folders.
    pub indexed: u64,
    /// Stale records removed across all folders.
    pub removed: u64,
    /// Human-readable summary.
    pub message: String,
}

impl RescanOutcome {
    pub(crate) fn new(root: impl Into<PathBuf>, folders: usize) -> Self {
        Self {
            root: root.into(),
            folders,
            ..Self::default()
        }
    }

    /// Fold one folder's result into the totals.
    pub(crate) fn absorb(&mut self, folder: &IndexOutcome) {
        self.indexed += folder.indexed;
        self.removed += folder.removed;
    }

    pub(crate) fn summarize(&mut self) {
        let mut message = format!(
            "Rescanned {} folders on {}: {} files processed",
            self.folders,
            base_name(&self.root),
            self.indexed
        );
        if self.removed > 0 {
            message.push_str(&format!(", {} removed", self.removed));
        }
        if self.failed > 0 {
            message.push_str(&format!(", {} failed", self.failed));
        }
        self.message = message;
    }
}

/// Last component for messages; roots are shown whole.
fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
