//! Name search over the catalog.

use rusqlite::params;

use everdex_core::{ResultRow, SearchRequest, sort_rows};
use everdex_query::Query;

use crate::schema::from_db_size;
use crate::store::Catalog;
use crate::CatalogError;

const ROWS_BY_NAME: &str = "SELECT f.name, f.size, f.type, f.path
     FROM files f JOIN folders fo ON f.folder_id = fo.id
     ORDER BY f.name COLLATE NOCASE, f.path";

const ROWS_BY_RECENCY: &str = "SELECT f.name, f.size, f.type, f.path
     FROM files f JOIN folders fo ON f.folder_id = fo.id
     ORDER BY f.indexed_at DESC, f.path";

impl Catalog {
    /// Run a search request.
    ///
    /// An empty term lists everything, most recently indexed first. Otherwise
    /// matches are taken in case-insensitive name order up to the limit. An
    /// explicit sort then reorders just that page.
    pub fn search(&self, request: &SearchRequest) -> Result<Vec<ResultRow>, CatalogError> {
        let query = Query::parse(&request.term)?;
        let mut rows = if query.is_empty() {
            self.list_all(request.limit)?
        } else {
            self.matching(&query, request.limit)?
        };

        if let Some(sort) = request.sort {
            sort_rows(&mut rows, sort);
        }
        tracing::debug!(term = %request.term, rows = rows.len(), "search finished");
        Ok(rows)
    }

    /// Every record, most recently indexed first, optionally capped.
    pub fn list_all(&self, limit: Option<usize>) -> Result<Vec<ResultRow>, CatalogError> {
        // SQLite reads a negative LIMIT as no limit
        let limit = limit.map_or(-1, |limit| i64::try_from(limit).unwrap_or(i64::MAX));
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!("{ROWS_BY_RECENCY} LIMIT ?1"))?;
        let rows = stmt
            .query_map(params![limit], result_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn matching(&self, query: &Query, limit: Option<usize>) -> Result<Vec<ResultRow>, CatalogError> {
        let limit = limit.unwrap_or(usize::MAX);
        let mut rows = Vec::new();
        if limit == 0 {
            return Ok(rows);
        }

        let conn = self.connect()?;
        let mut stmt = conn.prepare(ROWS_BY_NAME)?;
        let mut cursor = stmt.query([])?;
        while let Some(row) = cursor.next()? {
            let name: String = row.get(0)?;
            if !query.matches(&name) {
                continue;
            }
            rows.push(ResultRow::new(
                name,
                from_db_size(row.get(1)?),
                row.get(2)?,
                row.get(3)?,
            ));
            if rows.len() >= limit {
                break;
            }
        }
        Ok(rows)
    }
}

fn result_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ResultRow> {
    Ok(ResultRow::new(
        row.get(0)?,
        from_db_size(row.get(1)?),
        row.get(2)?,
        row.get(3)?,
    ))
}
