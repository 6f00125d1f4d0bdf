//! Catalog and crawl configuration types.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// File name of the preferences sidecar when none is configured.
const DEFAULT_PREFS_FILE: &str = "ui-prefs.json";

/// Where and how the catalog is stored.
///
/// The host application resolves platform defaults; nothing in here looks at
/// the environment.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct CatalogConfig {
    /// SQLite database file.
    pub db_path: PathBuf,

    /// Opaque UI preferences sidecar (defaults next to the database).
    #[builder(default)]
    #[serde(default)]
    pub prefs_path: Option<PathBuf>,

    /// How long a connection waits on a locked database, in milliseconds.
    #[builder(default = "3000")]
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_busy_timeout_ms() -> u64 {
    3000
}

impl CatalogConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.db_path {
            Some(ref path) if path.as_os_str().is_empty() => {
                Err("Database path cannot be empty".to_string())
            }
            Some(_) => Ok(()),
            None => Err("Database path is required".to_string()),
        }
    }
}

impl CatalogConfig {
    /// Create a new catalog config builder.
    pub fn builder() -> CatalogConfigBuilder {
        CatalogConfigBuilder::default()
    }

    /// Create a config with defaults for everything but the database path.
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            prefs_path: None,
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }

    /// Resolved location of the preferences sidecar.
    pub fn prefs_file(&self) -> PathBuf {
        match &self.prefs_path {
            Some(path) => path.clone(),
            None => self
                .db_path
                .parent()
                .map(|dir| dir.join(DEFAULT_PREFS_FILE))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PREFS_FILE)),
        }
    }
}

/// Tuning for a single crawl.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
pub struct CrawlConfig {
    /// Number of walker threads (0 = rayon default pool, 1 = serial).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,

    /// Records written per store transaction.
    #[builder(default = "500")]
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Files between two progress callbacks.
    #[builder(default = "100")]
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,
}

fn default_batch_size() -> usize {
    500
}

fn default_progress_interval() -> u64 {
    100
}

impl CrawlConfig {
    /// Create a new crawl config builder.
    pub fn builder() -> CrawlConfigBuilder {
        CrawlConfigBuilder::default()
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            batch_size: default_batch_size(),
            progress_interval: default_progress_interval(),
        }
    }
}
