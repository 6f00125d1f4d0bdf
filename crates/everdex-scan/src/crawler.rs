//! JWalk-based folder crawler.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use jwalk::{Parallelism, WalkDir};

use everdex_catalog::Catalog;
use everdex_core::{CrawlConfig, FileRecord, path_key};

use crate::exclusion::ExclusionRules;
use crate::progress::{IndexOutcome, RescanOutcome};
use crate::IndexError;

/// Directory counters shared with the walker threads.
#[derive(Debug, Default)]
struct WalkCounters {
    visited: AtomicU64,
    excluded: AtomicU64,
}

/// Crawls folders into a catalog.
#[derive(Debug, Clone)]
pub struct Crawler {
    catalog: Catalog,
    config: CrawlConfig,
}

impl Crawler {
    /// Create a crawler with default tuning.
    pub fn new(catalog: Catalog) -> Self {
        Self::with_config(catalog, CrawlConfig::default())
    }

    pub fn with_config(catalog: Catalog, config: CrawlConfig) -> Self {
        Self { catalog, config }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Index one folder.
    ///
    /// Every readable file under `folder` is upserted unless an exclusion
    /// rule prunes its directory. Unreadable entries are counted and skipped.
    /// With `reconcile`, records the folder owned before the crawl that were
    /// not seen again are deleted.
    pub fn index(
        &self,
        folder: &Path,
        reconcile: bool,
        mut on_progress: Option<&mut dyn FnMut(u64)>,
    ) -> Result<IndexOutcome, IndexError> {
        if !folder.is_dir() {
            return Err(IndexError::invalid_path(folder));
        }

        let key = path_key(folder);
        let folder_id = self.catalog.get_or_create_folder(&key)?;
        let patterns = self.catalog.exclusion_patterns(folder_id)?;
        let wholly = self.catalog.wholly_excluded_folders()?;
        let mut outcome = IndexOutcome::new(&key);

        if wholly.contains(&key) {
            outcome.skip_excluded();
            tracing::info!(folder = %key, "folder is wholly excluded, skipping");
            return Ok(outcome);
        }

        let root = PathBuf::from(&key);
        let rules = Arc::new(ExclusionRules::new(&root, wholly, patterns));
        let known = if reconcile {
            self.catalog.files_under_folder(folder_id)?
        } else {
            HashSet::new()
        };
        let indexed_at = Utc::now();
        let batch_size = self.config.batch_size.max(1);
        let interval = self.config.progress_interval.max(1);
        let mut seen = HashSet::new();
        let mut batch = Vec::with_capacity(batch_size);

        if rules.root_excluded() {
            tracing::debug!(folder = %key, "folder lies under a wholly excluded folder");
        } else {
            let counters = Arc::new(WalkCounters::default());
            let walker = self.walker(&root, Arc::clone(&rules), Arc::clone(&counters));

            for entry_result in walker {
                let entry = match entry_result {
                    Ok(e) => e,
                    Err(err) => {
                        tracing::debug!(error = %err, "skipping unreadable entry");
                        outcome.failed += 1;
                        continue;
                    }
                };
                if entry.file_type().is_dir() {
                    continue;
                }

                let path = entry.path();
                let (size, modified) = match file_stat(&path) {
                    Ok(Some(stat)) => stat,
                    // symlink to a directory; not followed
                    Ok(None) => continue,
                    Err(err) => {
                        tracing::debug!(path = %path.display(), error = %err, "skipping unreadable file");
                        outcome.failed += 1;
                        continue;
                    }
                };

                let record = FileRecord::new(path_key(&path), folder_id, size, modified, indexed_at);
                seen.insert(record.path.clone());
                batch.push(record);
                outcome.indexed += 1;

                if batch.len() >= batch_size {
                    self.catalog.upsert_files(&batch)?;
                    batch.clear();
                }
                if outcome.indexed % interval == 0 {
                    if let Some(callback) = on_progress.as_deref_mut() {
                        callback(outcome.indexed);
                    }
                }
            }
            self.catalog.upsert_files(&batch)?;

            outcome.dirs_visited = counters.visited.load(Ordering::Relaxed);
            outcome.excluded = counters.excluded.load(Ordering::Relaxed);
        }

        if reconcile {
            let stale = known
                .iter()
                .filter(|path| !seen.contains(*path))
                .map(String::as_str);
            outcome.removed = self.catalog.delete_files(stale)? as u64;
        }

        outcome.summarize(reconcile);
        tracing::info!(
            folder = %key,
            indexed = outcome.indexed,
            removed = outcome.removed,
            failed = outcome.failed,
            excluded = outcome.excluded,
            "folder indexed"
        );
        Ok(outcome)
    }

    /// Re-index every non-excluded folder whose path starts with `root`.
    ///
    /// Folders are indexed one after another; a folder that fails is logged
    /// and counted but does not stop the others.
    pub fn rescan_under_root(
        &self,
        root: &Path,
        reconcile: bool,
        mut on_progress: Option<&mut dyn FnMut(&Path, u64)>,
    ) -> Result<RescanOutcome, IndexError> {
        if !root.is_dir() {
            return Err(IndexError::invalid_path(root));
        }

        let root_key = path_key(root);
        let folders = self.catalog.folders_under(&root_key)?;
        if folders.is_empty() {
            return Err(IndexError::NotFound {
                root: root.to_path_buf(),
            });
        }

        let mut outcome = RescanOutcome::new(&root_key, folders.len());
        for folder in &folders {
            let path = Path::new(folder);
            let forward: &mut dyn FnMut(u64) = &mut |files| {
                if let Some(callback) = on_progress.as_deref_mut() {
                    callback(path, files);
                }
            };
            match self.index(path, reconcile, Some(forward)) {
                Ok(done) => outcome.absorb(&done),
                Err(err) => {
                    tracing::warn!(folder = %folder, error = %err, "failed to rescan folder");
                    outcome.failed += 1;
                }
            }
        }

        outcome.summarize();
        tracing::info!(
            root = %root_key,
            folders = outcome.folders,
            failed = outcome.failed,
            indexed = outcome.indexed,
            removed = outcome.removed,
            "rescan finished"
        );
        Ok(outcome)
    }

    /// Build the walker, pruning excluded directories before they are read.
    fn walker(
        &self,
        root: &Path,
        rules: Arc<ExclusionRules>,
        counters: Arc<WalkCounters>,
    ) -> WalkDir {
        let parallelism = match self.config.threads {
            0 => Parallelism::RayonDefaultPool {
                busy_timeout: Duration::from_millis(100),
            },
            1 => Parallelism::Serial,
            n => Parallelism::RayonNewPool(n),
        };

        WalkDir::new(root)
            .parallelism(parallelism)
            .skip_hidden(false)
            .follow_links(false)
            .sort(false)
            .process_read_dir(move |depth, _dir, _state, children| {
                // `None` is the synthetic listing that holds the root itself
                if depth.is_some() {
                    counters.visited.fetch_add(1, Ordering::Relaxed);
                }
                children.retain(|child| {
                    let Ok(entry) = child else { return true };
                    if !entry.file_type().is_dir() {
                        return true;
                    }
                    let path = entry.path();
                    match rules.check(&path) {
                        Some(reason) => {
                            counters.excluded.fetch_add(1, Ordering::Relaxed);
                            tracing::debug!(dir = %path.display(), ?reason, "directory excluded");
                            false
                        }
                        None => true,
                    }
                });
            })
    }
}

/// Size and modification time of a non-directory entry, following symlinks.
///
/// FIFOs, sockets and device nodes are recorded like regular files. Returns
/// `None` when the entry resolves to a directory.
fn file_stat(path: &Path) -> std::io::Result<Option<(u64, DateTime<Utc>)>> {
    let metadata = fs::metadata(path)?;
    if metadata.is_dir() {
        return Ok(None);
    }
    let modified = metadata.modified()?;
    Ok(Some((metadata.len(), DateTime::<Utc>::from(modified))))
}
