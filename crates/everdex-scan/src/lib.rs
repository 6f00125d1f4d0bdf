//! Folder crawling for everdex.
//!
//! This crate walks directory trees with jwalk and writes what it finds into
//! an [`everdex_catalog::Catalog`].
//!
//! # Overview
//!
//! - **Index** one folder, optionally reconciling away records for files
//!   that disappeared since the last crawl
//! - **Rescan** every indexed folder under a root, one folder at a time
//! - **Exclusion rules** prune wholly-excluded folders and per-folder
//!   relative sub-paths before they are read
//! - **Background crawls** report progress over a tokio channel
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use everdex_catalog::Catalog;
//! use everdex_core::CatalogConfig;
//! use everdex_scan::Crawler;
//!
//! let catalog = Catalog::open(CatalogConfig::new("/tmp/everdex.db")).unwrap();
//! let crawler = Crawler::new(catalog);
//! let outcome = crawler.index(Path::new("/home/user/Documents"), true, None).unwrap();
//! println!("{}", outcome.message);
//! ```
//!
//! # Background crawls
//!
//! ```rust,no_run
//! use everdex_catalog::Catalog;
//! use everdex_core::CatalogConfig;
//! use everdex_scan::{Crawler, IndexEvent, start_index};
//!
//! # async fn run() {
//! let catalog = Catalog::open(CatalogConfig::new("/tmp/everdex.db")).unwrap();
//! let mut events = start_index(Crawler::new(catalog), "/home/user".into(), false);
//! while let Some(event) = events.recv().await {
//!     match event {
//!         IndexEvent::Progress { files, .. } => println!("{files} files"),
//!         IndexEvent::Indexed(outcome) => println!("{}", outcome.message),
//!         IndexEvent::Failed(err) => eprintln!("{err}"),
//!         IndexEvent::Rescanned(_) => {}
//!     }
//! }
//! # }
//! ```

mod crawler;
mod error;
mod exclusion;
mod progress;
mod task;

pub use crawler::Crawler;
pub use error::IndexError;
pub use exclusion::{Exclusion, ExclusionRules};
pub use progress::{IndexEvent, IndexOutcome, RescanOutcome};
pub use task::{EVENT_CHANNEL_SIZE, start_index, start_rescan};
