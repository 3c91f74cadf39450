//! Site repository.

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::error::Result;
use crate::models::{Site, SiteStatus};

impl ToSql for SiteStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for SiteStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

const SITE_COLUMNS: &str = "id, url, name, status, status_time, last_error";

fn site_from_row(row: &Row<'_>) -> rusqlite::Result<Site> {
    Ok(Site {
        id: row.get(0)?,
        url: row.get(1)?,
        name: row.get(2)?,
        status: row.get(3)?,
        status_time: row.get(4)?,
        last_error: row.get(5)?,
    })
}

/// Persistence operations for [`Site`] rows.
pub trait SiteStore {
    fn find_site_by_url(&self, url: &str) -> Result<Option<Site>>;

    fn find_site_by_id(&self, id: i64) -> Result<Option<Site>>;

    fn find_all_sites(&self) -> Result<Vec<Site>>;

    /// Insert the site, or update it when `site.id` is set. Assigns `site.id`.
    fn save_site(&self, site: &mut Site) -> Result<()>;

    /// Move every site in `old` to `new` with the given error text.
    fn update_status_and_error_by_status(
        &self,
        old: SiteStatus,
        new: SiteStatus,
        error: &str,
    ) -> Result<usize>;

    /// Move one site to `new`, but only while it is still in `expected`.
    fn update_status_by_id(
        &self,
        id: i64,
        expected: SiteStatus,
        new: SiteStatus,
        error: &str,
    ) -> Result<bool>;

    fn update_status_time_by_id(&self, id: i64, time: DateTime<Utc>) -> Result<()>;

    fn delete_all_sites(&self) -> Result<usize>;
}

impl SiteStore for Connection {
    fn find_site_by_url(&self, url: &str) -> Result<Option<Site>> {
        let sql = format!("SELECT {SITE_COLUMNS} FROM site WHERE url = ?1");
        Ok(self.query_row(&sql, [url], site_from_row).optional()?)
    }

    fn find_site_by_id(&self, id: i64) -> Result<Option<Site>> {
        let sql = format!("SELECT {SITE_COLUMNS} FROM site WHERE id = ?1");
        Ok(self.query_row(&sql, [id], site_from_row).optional()?)
    }

    fn find_all_sites(&self) -> Result<Vec<Site>> {
        let sql = format!("SELECT {SITE_COLUMNS} FROM site ORDER BY id");
        let mut stmt = self.prepare(&sql)?;
        let sites = stmt
            .query_map([], site_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sites)
    }

    fn save_site(&self, site: &mut Site) -> Result<()> {
        if site.id == 0 {
            self.execute(
                "INSERT INTO site (url, name, status, status_time, last_error)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    site.url,
                    site.name,
                    site.status,
                    site.status_time,
                    site.last_error
                ],
            )?;
            site.id = self.last_insert_rowid();
        } else {
            self.execute(
                "UPDATE site SET url = ?2, name = ?3, status = ?4, status_time = ?5, last_error = ?6
                 WHERE id = ?1",
                params![
                    site.id,
                    site.url,
                    site.name,
                    site.status,
                    site.status_time,
                    site.last_error
                ],
            )?;
        }
        Ok(())
    }

    fn update_status_and_error_by_status(
        &self,
        old: SiteStatus,
        new: SiteStatus,
        error: &str,
    ) -> Result<usize> {
        let changed = self.execute(
            "UPDATE site SET status = ?2, last_error = ?3, status_time = ?4 WHERE status = ?1",
            params![old, new, error, Utc::now()],
        )?;
        Ok(changed)
    }

    fn update_status_by_id(
        &self,
        id: i64,
        expected: SiteStatus,
        new: SiteStatus,
        error: &str,
    ) -> Result<bool> {
        let changed = self.execute(
            "UPDATE site SET status = ?3, last_error = ?4, status_time = ?5
             WHERE id = ?1 AND status = ?2",
            params![id, expected, new, error, Utc::now()],
        )?;
        Ok(changed == 1)
    }

    fn update_status_time_by_id(&self, id: i64, time: DateTime<Utc>) -> Result<()> {
        self.execute(
            "UPDATE site SET status_time = ?2 WHERE id = ?1",
            params![id, time],
        )?;
        Ok(())
    }

    fn delete_all_sites(&self) -> Result<usize> {
        Ok(self.execute("DELETE FROM site", [])?)
    }
}
