//! Index repository.

use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::error::Result;
use crate::models::IndexEntry;

const INDEX_COLUMNS: &str = "id, page_id, lemma_id, rank";

fn index_from_row(row: &Row<'_>) -> rusqlite::Result<IndexEntry> {
    Ok(IndexEntry {
        id: row.get(0)?,
        page_id: row.get(1)?,
        lemma_id: row.get(2)?,
        rank: row.get(3)?,
    })
}

/// Persistence operations for [`IndexEntry`] rows.
pub trait IndexStore {
    fn find_index(&self, page_id: i64, lemma_id: i64) -> Result<Option<IndexEntry>>;

    fn find_all_by_page(&self, page_id: i64) -> Result<Vec<IndexEntry>>;

    /// Relative update `rank = rank + delta`.
    fn increment_rank(&self, id: i64, delta: f64) -> Result<()>;

    fn save_index(&self, entry: &mut IndexEntry) -> Result<()>;

    fn delete_index(&self, id: i64) -> Result<()>;

    fn delete_all_indexes(&self) -> Result<usize>;
}

impl IndexStore for Connection {
    fn find_index(&self, page_id: i64, lemma_id: i64) -> Result<Option<IndexEntry>> {
        let sql =
            format!("SELECT {INDEX_COLUMNS} FROM search_index WHERE page_id = ?1 AND lemma_id = ?2");
        Ok(self
            .query_row(&sql, params![page_id, lemma_id], index_from_row)
            .optional()?)
    }

    fn find_all_by_page(&self, page_id: i64) -> Result<Vec<IndexEntry>> {
        let sql = format!("SELECT {INDEX_COLUMNS} FROM search_index WHERE page_id = ?1 ORDER BY id");
        let mut stmt = self.prepare(&sql)?;
        let entries = stmt
            .query_map([page_id], index_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    fn increment_rank(&self, id: i64, delta: f64) -> Result<()> {
        self.execute(
            "UPDATE search_index SET rank = rank + ?2 WHERE id = ?1",
            params![id, delta],
        )?;
        Ok(())
    }

    fn save_index(&self, entry: &mut IndexEntry) -> Result<()> {
        self.execute(
            "INSERT INTO search_index (page_id, lemma_id, rank) VALUES (?1, ?2, ?3)",
            params![entry.page_id, entry.lemma_id, entry.rank],
        )?;
        entry.id = self.last_insert_rowid();
        Ok(())
    }

    fn delete_index(&self, id: i64) -> Result<()> {
        self.execute("DELETE FROM search_index WHERE id = ?1", [id])?;
        Ok(())
    }

    fn delete_all_indexes(&self) -> Result<usize> {
        Ok(self.execute("DELETE FROM search_index", [])?)
    }
}
