//! Persistent file catalog for everdex.
//!
//! The catalog is a single SQLite database holding two kinds of rows:
//!
//! - **folders** - every folder that was indexed or excluded, with its
//!   exclusion state
//! - **files** - one record per catalogued file, keyed by absolute path
//!
//! Every operation opens its own connection, so a [`Catalog`] can be cloned
//! freely into background tasks. Concurrent writers serialize on SQLite's
//! lock and wait up to the configured busy timeout.
//!
//! # Example
//!
//! ```rust,no_run
//! use everdex_catalog::Catalog;
//! use everdex_core::{CatalogConfig, SearchRequest};
//!
//! let catalog = Catalog::open(CatalogConfig::new("/tmp/everdex.db")).unwrap();
//! for row in catalog.search(&SearchRequest::new("*.txt").with_limit(20)).unwrap() {
//!     println!("{} ({} bytes) on {}", row.path, row.size, row.drive);
//! }
//! ```

mod error;
mod prefs;
mod schema;
mod search;
mod store;

pub use error::CatalogError;
pub use prefs::Preferences;
pub use store::Catalog;

pub use everdex_query::{Query, QueryError};
