//! Page repository.

use std::collections::HashSet;

use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::error::Result;
use crate::models::Page;

const PAGE_COLUMNS: &str = "p.id, p.site_id, p.path, p.code, p.content";

fn page_from_row(row: &Row<'_>) -> rusqlite::Result<Page> {
    Ok(Page {
        id: row.get(0)?,
        site_id: row.get(1)?,
        path: row.get(2)?,
        code: row.get(3)?,
        content: row.get(4)?,
    })
}

/// Persistence operations for [`Page`] rows.
pub trait PageStore {
    fn find_page_by_site_and_path(&self, site_id: i64, path: &str) -> Result<Option<Page>>;

    fn find_page_by_id(&self, id: i64) -> Result<Option<Page>>;

    /// Upsert by `(site_id, path)`. Assigns `page.id`.
    fn save_page(&self, page: &mut Page) -> Result<()>;

    fn count_pages_by_site_url(&self, url: &str) -> Result<usize>;

    /// Pages holding an index row for `lemma`, optionally within one site.
    fn find_pages_containing_lemma(&self, lemma: &str, site_id: Option<i64>) -> Result<Vec<Page>>;

    fn page_ids_containing_lemma(&self, lemma: &str, site_id: Option<i64>) -> Result<HashSet<i64>>;

    /// Sum of `rank` over every index row of the page.
    fn rank_sum_for_page(&self, page_id: i64) -> Result<f64>;

    fn delete_all_pages(&self) -> Result<usize>;
}

impl PageStore for Connection {
    fn find_page_by_site_and_path(&self, site_id: i64, path: &str) -> Result<Option<Page>> {
        let sql = format!("SELECT {PAGE_COLUMNS} FROM page p WHERE p.site_id = ?1 AND p.path = ?2");
        Ok(self
            .query_row(&sql, params![site_id, path], page_from_row)
            .optional()?)
    }

    fn find_page_by_id(&self, id: i64) -> Result<Option<Page>> {
        let sql = format!("SELECT {PAGE_COLUMNS} FROM page p WHERE p.id = ?1");
        Ok(self.query_row(&sql, [id], page_from_row).optional()?)
    }

    fn save_page(&self, page: &mut Page) -> Result<()> {
        self.execute(
            "INSERT INTO page (site_id, path, code, content) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(site_id, path) DO UPDATE SET
               code = excluded.code,
               content = excluded.content",
            params![page.site_id, page.path, page.code, page.content],
        )?;

        page.id = self.query_row(
            "SELECT id FROM page WHERE site_id = ?1 AND path = ?2",
            params![page.site_id, page.path],
            |r| r.get(0),
        )?;
        Ok(())
    }

    fn count_pages_by_site_url(&self, url: &str) -> Result<usize> {
        let count: i64 = self.query_row(
            "SELECT COUNT(*) FROM page p JOIN site s ON s.id = p.site_id WHERE s.url = ?1",
            [url],
            |r| r.get(0),
        )?;
        Ok(count as usize)
    }

    fn find_pages_containing_lemma(&self, lemma: &str, site_id: Option<i64>) -> Result<Vec<Page>> {
        let sql = format!(
            "SELECT DISTINCT {PAGE_COLUMNS} FROM page p
             JOIN search_index i ON i.page_id = p.id
             JOIN lemma l ON l.id = i.lemma_id
             WHERE l.lemma = ?1 AND (?2 IS NULL OR l.site_id = ?2)
             ORDER BY p.id"
        );
        let mut stmt = self.prepare(&sql)?;
        let pages = stmt
            .query_map(params![lemma, site_id], page_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(pages)
    }

    fn page_ids_containing_lemma(&self, lemma: &str, site_id: Option<i64>) -> Result<HashSet<i64>> {
        let mut stmt = self.prepare(
            "SELECT i.page_id FROM search_index i
             JOIN lemma l ON l.id = i.lemma_id
             WHERE l.lemma = ?1 AND (?2 IS NULL OR l.site_id = ?2)",
        )?;
        let ids = stmt
            .query_map(params![lemma, site_id], |r| r.get(0))?
            .collect::<rusqlite::Result<HashSet<i64>>>()?;
        Ok(ids)
    }

    fn rank_sum_for_page(&self, page_id: i64) -> Result<f64> {
        let sum: f64 = self.query_row(
            "SELECT COALESCE(SUM(rank), 0.0) FROM search_index WHERE page_id = ?1",
            [page_id],
            |r| r.get(0),
        )?;
        Ok(sum)
    }

    fn delete_all_pages(&self) -> Result<usize> {
        Ok(self.execute("DELETE FROM page", [])?)
    }
}
