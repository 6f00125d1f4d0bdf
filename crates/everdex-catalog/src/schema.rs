//! Schema creation and connection setup.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use everdex_core::CatalogConfig;

use crate::CatalogError;

/// Bumped whenever the table layout changes.
pub(crate) const SCHEMA_VERSION: i32 = 1;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS folders (
    id INTEGER PRIMARY KEY,
    path TEXT NOT NULL UNIQUE,
    wholly_excluded INTEGER NOT NULL DEFAULT 0,
    patterns TEXT NOT NULL DEFAULT '[]'
);

CREATE TABLE IF NOT EXISTS files (
    id INTEGER PRIMARY KEY,
    folder_id INTEGER NOT NULL REFERENCES folders (id) ON DELETE CASCADE,
    path TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    size INTEGER NOT NULL,
    modified INTEGER NOT NULL,
    type TEXT NOT NULL,
    indexed_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_files_folder ON files (folder_id);
CREATE INDEX IF NOT EXISTS idx_files_name ON files (name COLLATE NOCASE);
CREATE INDEX IF NOT EXISTS idx_files_type ON files (type COLLATE NOCASE);
CREATE INDEX IF NOT EXISTS idx_files_indexed ON files (indexed_at);
"#;

/// Open a fresh connection with the catalog's pragmas applied.
pub(crate) fn connect(config: &CatalogConfig) -> Result<Connection, CatalogError> {
    let conn = Connection::open(&config.db_path)?;
    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "foreign_keys", true)?;
    Ok(conn)
}

/// Create tables and indexes if they do not exist.
///
/// A database written with a different layout version is rebuilt from
/// scratch; the catalog is derived data and can always be re-crawled.
pub(crate) fn init(conn: &Connection) -> Result<(), CatalogError> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version != 0 && version != SCHEMA_VERSION {
        tracing::warn!(found = version, expected = SCHEMA_VERSION, "rebuilding catalog schema");
        conn.execute_batch("DROP TABLE IF EXISTS files; DROP TABLE IF EXISTS folders;")?;
    }
    conn.execute_batch(SCHEMA)?;
    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    Ok(())
}

/// Timestamps are stored as Unix microseconds.
pub(crate) fn to_epoch_micros(time: DateTime<Utc>) -> i64 {
    time.timestamp_micros()
}

pub(crate) fn from_epoch_micros(micros: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(micros).unwrap_or_default()
}

/// Sizes are stored as SQLite integers.
pub(crate) fn to_db_size(size: u64) -> i64 {
    i64::try_from(size).unwrap_or(i64::MAX)
}

pub(crate) fn from_db_size(size: i64) -> u64 {
    u64::try_from(size).unwrap_or(0)
}
