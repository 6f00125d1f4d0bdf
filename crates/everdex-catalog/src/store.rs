//! Folder and file records.
//!
//! Every method opens its own connection and commits before returning, so
//! each call is atomic on its own and nothing is cached between calls.
//! Sequences of calls (a crawl's snapshot, walk and cleanup) are not.

use std::collections::HashSet;
use std::fs;
use std::path::{MAIN_SEPARATOR, Path};

use rusqlite::{Connection, OptionalExtension, Row, params};

use everdex_core::{CatalogConfig, ExclusionState, FileRecord, Folder, FolderId};

use crate::prefs::Preferences;
use crate::schema::{self, from_db_size, from_epoch_micros, to_db_size, to_epoch_micros};
use crate::CatalogError;

const UPSERT_FILE: &str = r#"
INSERT INTO files (folder_id, path, name, size, modified, type, indexed_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
ON CONFLICT (path) DO UPDATE SET
    folder_id = excluded.folder_id,
    name = excluded.name,
    size = excluded.size,
    modified = excluded.modified,
    type = excluded.type,
    indexed_at = excluded.indexed_at
"#;

/// Handle to the on-disk catalog.
///
/// Cheap to clone; clones share nothing but the configuration.
#[derive(Debug, Clone)]
pub struct Catalog {
    config: CatalogConfig,
}

impl Catalog {
    /// Open (creating if needed) the catalog described by `config`.
    pub fn open(config: CatalogConfig) -> Result<Self, CatalogError> {
        if let Some(dir) = config.db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| CatalogError::io(dir, e))?;
        }
        let catalog = Self { config };
        schema::init(&catalog.connect()?)?;
        Ok(catalog)
    }

    /// Configuration this catalog was opened with.
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Database file backing the catalog.
    pub fn db_path(&self) -> &Path {
        &self.config.db_path
    }

    /// The UI preferences sidecar that belongs to this catalog.
    pub fn preferences(&self) -> Preferences {
        Preferences::new(self.config.prefs_file())
    }

    pub(crate) fn connect(&self) -> Result<Connection, CatalogError> {
        schema::connect(&self.config)
    }

    // ==================== FOLDERS ====================

    /// Return the id of the folder at `path`, inserting it if absent.
    pub fn get_or_create_folder(&self, path: &str) -> Result<FolderId, CatalogError> {
        let conn = self.connect()?;
        folder_id_or_insert(&conn, path)
    }

    /// Look up a folder by path.
    pub fn folder(&self, path: &str) -> Result<Option<Folder>, CatalogError> {
        let conn = self.connect()?;
        let folder = conn
            .query_row(
                "SELECT id, path, wholly_excluded, patterns FROM folders WHERE path = ?1",
                params![path],
                raw_folder,
            )
            .optional()?;
        folder.map(RawFolder::into_folder).transpose()
    }

    /// Every known folder, ordered by path.
    pub fn folders(&self) -> Result<Vec<Folder>, CatalogError> {
        let conn = self.connect()?;
        let mut stmt =
            conn.prepare("SELECT id, path, wholly_excluded, patterns FROM folders ORDER BY path")?;
        let raw = stmt
            .query_map([], raw_folder)?
            .collect::<Result<Vec<_>, _>>()?;
        raw.into_iter().map(RawFolder::into_folder).collect()
    }

    /// Relative sub-path patterns of a folder, in insertion order.
    ///
    /// Wholly-excluded folders report no patterns.
    pub fn exclusion_patterns(&self, folder: FolderId) -> Result<Vec<String>, CatalogError> {
        let conn = self.connect()?;
        let row: Option<(bool, String)> = conn
            .query_row(
                "SELECT wholly_excluded, patterns FROM folders WHERE id = ?1",
                params![folder.0],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        match row {
            Some((false, patterns)) => Ok(serde_json::from_str(&patterns)?),
            _ => Ok(Vec::new()),
        }
    }

    /// Append a relative sub-path pattern to a folder's exclusion list.
    ///
    /// The folder is created if needed. Duplicates are kept. A wholly-excluded
    /// folder stays wholly excluded and the pattern is not recorded.
    pub fn add_exclusion_pattern(&self, path: &str, pattern: &str) -> Result<(), CatalogError> {
        let pattern = pattern.trim().trim_end_matches(['/', MAIN_SEPARATOR]);
        if pattern.is_empty() {
            return Err(CatalogError::EmptyPattern);
        }

        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let folder = folder_id_or_insert(&tx, path)?;
        let (wholly, stored): (bool, String) = tx.query_row(
            "SELECT wholly_excluded, patterns FROM folders WHERE id = ?1",
            params![folder.0],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        if wholly {
            tracing::debug!(folder = path, pattern, "folder already wholly excluded");
            return Ok(());
        }

        let mut patterns: Vec<String> = serde_json::from_str(&stored)?;
        patterns.push(pattern.to_string());
        tx.execute(
            "UPDATE folders SET patterns = ?1 WHERE id = ?2",
            params![serde_json::to_string(&patterns)?, folder.0],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Paths of every wholly-excluded folder.
    pub fn wholly_excluded_folders(&self) -> Result<HashSet<String>, CatalogError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT path FROM folders WHERE wholly_excluded = 1")?;
        let paths = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<HashSet<String>, _>>()?;
        Ok(paths)
    }

    /// Exclude a folder and its whole subtree; returns the number of records deleted.
    ///
    /// Removes the records the folder owns as well as records beneath it that
    /// an ancestor folder's crawl picked up.
    pub fn mark_wholly_excluded(&self, path: &str) -> Result<usize, CatalogError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let folder = folder_id_or_insert(&tx, path)?;
        tx.execute(
            "UPDATE folders SET wholly_excluded = 1, patterns = '[]' WHERE id = ?1",
            params![folder.0],
        )?;
        let removed = tx.execute(
            "DELETE FROM files WHERE folder_id = ?1 OR substr(path, 1, length(?2)) = ?2",
            params![folder.0, subtree_prefix(path)],
        )?;
        tx.commit()?;

        tracing::info!(folder = path, removed, "folder wholly excluded");
        Ok(removed)
    }

    /// Reset a folder to "not excluded"; returns false if the folder is unknown.
    ///
    /// Records deleted by an earlier exclusion are not restored.
    pub fn clear_exclusion(&self, path: &str) -> Result<bool, CatalogError> {
        let conn = self.connect()?;
        let updated = conn.execute(
            "UPDATE folders SET wholly_excluded = 0, patterns = '[]' WHERE path = ?1",
            params![path],
        )?;
        Ok(updated > 0)
    }

    /// Paths of non-excluded folders whose path starts with `root` as a string.
    pub fn folders_under(&self, root: &str) -> Result<Vec<String>, CatalogError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT path FROM folders
             WHERE wholly_excluded = 0 AND substr(path, 1, length(?1)) = ?1
             ORDER BY path",
        )?;
        let paths = stmt
            .query_map(params![root], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(paths)
    }

    /// Number of folders that are not wholly excluded.
    pub fn count_active_folders(&self) -> Result<u64, CatalogError> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM folders WHERE wholly_excluded = 0",
            [],
            |row| row.get(0),
        )?;
        Ok(from_db_size(count))
    }

    // ==================== FILES ====================

    /// Insert or replace a record keyed by its path.
    pub fn upsert_file(&self, record: &FileRecord) -> Result<(), CatalogError> {
        self.upsert_files(std::slice::from_ref(record)).map(|_| ())
    }

    /// Insert or replace a batch of records in one transaction.
    pub fn upsert_files(&self, records: &[FileRecord]) -> Result<usize, CatalogError> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(UPSERT_FILE)?;
            for record in records {
                stmt.execute(params![
                    record.folder.0,
                    record.path,
                    record.name.as_str(),
                    to_db_size(record.size),
                    to_epoch_micros(record.modified),
                    record.file_type.as_str(),
                    to_epoch_micros(record.indexed_at),
                ])?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }

    /// Look up a record by path.
    pub fn file(&self, path: &str) -> Result<Option<FileRecord>, CatalogError> {
        let conn = self.connect()?;
        let record = conn
            .query_row(
                "SELECT path, folder_id, name, size, modified, type, indexed_at
                 FROM files WHERE path = ?1",
                params![path],
                file_record,
            )
            .optional()?;
        Ok(record)
    }

    /// Remove one record; returns false if it was not catalogued.
    pub fn delete_file(&self, path: &str) -> Result<bool, CatalogError> {
        let conn = self.connect()?;
        Ok(conn.execute("DELETE FROM files WHERE path = ?1", params![path])? > 0)
    }

    /// Remove many records in one transaction; returns how many existed.
    pub fn delete_files<'a, I>(&self, paths: I) -> Result<usize, CatalogError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let mut removed = 0;
        {
            let mut stmt = tx.prepare_cached("DELETE FROM files WHERE path = ?1")?;
            for path in paths {
                removed += stmt.execute(params![path])?;
            }
        }
        tx.commit()?;
        Ok(removed)
    }

    /// Remove every record owned by a folder.
    pub fn delete_files_under_folder(&self, folder: FolderId) -> Result<usize, CatalogError> {
        let conn = self.connect()?;
        Ok(conn.execute("DELETE FROM files WHERE folder_id = ?1", params![folder.0])?)
    }

    /// Paths of every record owned by a folder.
    pub fn files_under_folder(&self, folder: FolderId) -> Result<HashSet<String>, CatalogError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT path FROM files WHERE folder_id = ?1")?;
        let paths = stmt
            .query_map(params![folder.0], |row| row.get(0))?
            .collect::<Result<HashSet<String>, _>>()?;
        Ok(paths)
    }

    /// Replace the record at `old_path` with `record` after an external rename.
    pub fn rename_file(&self, old_path: &str, record: &FileRecord) -> Result<(), CatalogError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM files WHERE path = ?1", params![old_path])?;
        tx.execute(
            UPSERT_FILE,
            params![
                record.folder.0,
                record.path,
                record.name.as_str(),
                to_db_size(record.size),
                to_epoch_micros(record.modified),
                record.file_type.as_str(),
                to_epoch_micros(record.indexed_at),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Total number of catalogued files.
    pub fn file_count(&self) -> Result<u64, CatalogError> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))?;
        Ok(from_db_size(count))
    }

    // ==================== RESET ====================

    /// Delete every folder, every record and the preferences sidecar.
    pub fn reset(&self) -> Result<(), CatalogError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        tx.execute_batch("DELETE FROM files; DELETE FROM folders;")?;
        tx.commit()?;
        self.preferences().clear()?;
        tracing::info!(db = %self.config.db_path.display(), "catalog reset");
        Ok(())
    }
}

/// Prefix that every path strictly beneath `folder` starts with.
fn subtree_prefix(folder: &str) -> String {
    if folder.ends_with(['/', MAIN_SEPARATOR]) {
        folder.to_string()
    } else {
        format!("{folder}{MAIN_SEPARATOR}")
    }
}

fn folder_id_or_insert(conn: &Connection, path: &str) -> Result<FolderId, CatalogError> {
    conn.execute("INSERT OR IGNORE INTO folders (path) VALUES (?1)", params![path])?;
    let id = conn.query_row(
        "SELECT id FROM folders WHERE path = ?1",
        params![path],
        |row| row.get(0),
    )?;
    Ok(FolderId::new(id))
}

/// Folder row before its pattern list is decoded.
struct RawFolder {
    id: i64,
    path: String,
    wholly: bool,
    patterns: String,
}

impl RawFolder {
    fn into_folder(self) -> Result<Folder, CatalogError> {
        let patterns = if self.wholly {
            Vec::new()
        } else {
            serde_json::from_str(&self.patterns)?
        };
        Ok(Folder {
            id: FolderId::new(self.id),
            path: self.path,
            exclusion: ExclusionState::from_parts(self.wholly, patterns),
        })
    }
}

fn raw_folder(row: &Row<'_>) -> rusqlite::Result<RawFolder> {
    Ok(RawFolder {
        id: row.get(0)?,
        path: row.get(1)?,
        wholly: row.get(2)?,
        patterns: row.get(3)?,
    })
}

fn file_record(row: &Row<'_>) -> rusqlite::Result<FileRecord> {
    Ok(FileRecord {
        path: row.get(0)?,
        folder: FolderId::new(row.get(1)?),
        name: row.get::<_, String>(2)?.into(),
        size: from_db_size(row.get(3)?),
        modified: from_epoch_micros(row.get(4)?),
        file_type: row.get::<_, String>(5)?.into(),
        indexed_at: from_epoch_micros(row.get(6)?),
    })
}
