//! Core types for everdex.
//!
//! This crate provides the data model shared by the catalog, the crawler and
//! the query engine: folders and their exclusion state, file records, result
//! rows, configuration and the drive-label heuristic.

mod config;
mod drive;
mod record;
mod row;

pub use config::{CatalogConfig, CatalogConfigBuilder, CrawlConfig, CrawlConfigBuilder};
pub use drive::{UNKNOWN_DRIVE, drive_label};
pub use record::{
    ExclusionState, FileRecord, Folder, FolderId, display_name, extension_of, path_key,
};
pub use row::{ResultRow, SearchRequest, SortKey, SortSpec, sort_rows};
