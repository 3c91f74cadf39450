//! Lemma repository.

use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::error::Result;
use crate::models::Lemma;

const LEMMA_COLUMNS: &str = "id, site_id, lemma, frequency";

fn lemma_from_row(row: &Row<'_>) -> rusqlite::Result<Lemma> {
    Ok(Lemma {
        id: row.get(0)?,
        site_id: row.get(1)?,
        lemma: row.get(2)?,
        frequency: row.get(3)?,
    })
}

/// Persistence operations for [`Lemma`] rows.
pub trait LemmaStore {
    fn find_lemma(&self, lemma: &str, site_id: i64) -> Result<Option<Lemma>>;

    /// Every site's row for `lemma`.
    fn find_lemmas_by_text(&self, lemma: &str) -> Result<Vec<Lemma>>;

    fn lemma_exists(&self, lemma: &str, site_id: i64) -> Result<bool>;

    /// Highest frequency within a site, or of any lemma string summed across
    /// sites when `site_id` is `None`.
    fn max_frequency(&self, site_id: Option<i64>) -> Result<Option<i64>>;

    /// Relative update `frequency = frequency + delta`; returns the new value.
    fn increment_frequency(&self, id: i64, delta: i64) -> Result<i64>;

    fn save_lemma(&self, lemma: &mut Lemma) -> Result<()>;

    fn delete_lemma(&self, id: i64) -> Result<()>;

    fn count_lemmas_by_site_url(&self, url: &str) -> Result<usize>;

    fn delete_all_lemmas(&self) -> Result<usize>;
}

impl LemmaStore for Connection {
    fn find_lemma(&self, lemma: &str, site_id: i64) -> Result<Option<Lemma>> {
        let sql = format!("SELECT {LEMMA_COLUMNS} FROM lemma WHERE lemma = ?1 AND site_id = ?2");
        Ok(self
            .query_row(&sql, params![lemma, site_id], lemma_from_row)
            .optional()?)
    }

    fn find_lemmas_by_text(&self, lemma: &str) -> Result<Vec<Lemma>> {
        let sql = format!("SELECT {LEMMA_COLUMNS} FROM lemma WHERE lemma = ?1 ORDER BY site_id");
        let mut stmt = self.prepare(&sql)?;
        let lemmas = stmt
            .query_map([lemma], lemma_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(lemmas)
    }

    fn lemma_exists(&self, lemma: &str, site_id: i64) -> Result<bool> {
        let exists: i64 = self.query_row(
            "SELECT EXISTS(SELECT 1 FROM lemma WHERE lemma = ?1 AND site_id = ?2)",
            params![lemma, site_id],
            |r| r.get(0),
        )?;
        Ok(exists != 0)
    }

    fn max_frequency(&self, site_id: Option<i64>) -> Result<Option<i64>> {
        let max: Option<i64> = match site_id {
            Some(site_id) => self.query_row(
                "SELECT MAX(frequency) FROM lemma WHERE site_id = ?1",
                [site_id],
                |r| r.get(0),
            )?,
            None => self.query_row(
                "SELECT MAX(total) FROM (SELECT SUM(frequency) AS total FROM lemma GROUP BY lemma)",
                [],
                |r| r.get(0),
            )?,
        };
        Ok(max)
    }

    fn increment_frequency(&self, id: i64, delta: i64) -> Result<i64> {
        self.execute(
            "UPDATE lemma SET frequency = frequency + ?2 WHERE id = ?1",
            params![id, delta],
        )?;
        let frequency = self.query_row("SELECT frequency FROM lemma WHERE id = ?1", [id], |r| {
            r.get(0)
        })?;
        Ok(frequency)
    }

    fn save_lemma(&self, lemma: &mut Lemma) -> Result<()> {
        self.execute(
            "INSERT INTO lemma (site_id, lemma, frequency) VALUES (?1, ?2, ?3)",
            params![lemma.site_id, lemma.lemma, lemma.frequency],
        )?;
        lemma.id = self.last_insert_rowid();
        Ok(())
    }

    fn delete_lemma(&self, id: i64) -> Result<()> {
        self.execute("DELETE FROM lemma WHERE id = ?1", [id])?;
        Ok(())
    }

    fn count_lemmas_by_site_url(&self, url: &str) -> Result<usize> {
        let count: i64 = self.query_row(
            "SELECT COUNT(*) FROM lemma l JOIN site s ON s.id = l.site_id WHERE s.url = ?1",
            [url],
            |r| r.get(0),
        )?;
        Ok(count as usize)
    }

    fn delete_all_lemmas(&self) -> Result<usize> {
        Ok(self.execute("DELETE FROM lemma", [])?)
    }
}
