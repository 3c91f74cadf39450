//! SQLite persistence for sites, pages, lemmas and index rows.
//!
//! Every repository is an extension trait on [`rusqlite::Connection`], so the
//! same calls work on a plain connection and inside a [`Transaction`]:
//!
//! ```text
//! site ─┬─< page ─┐
//!       └─< lemma ┴─< search_index
//! ```
//!
//! Deleting a site cascades to its pages and lemmas, and from there to the
//! index rows.

pub mod indexes;
pub mod lemmas;
pub mod pages;
pub mod schema;
pub mod sites;

use std::fs;
use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::error::Result;
use crate::models::DatabaseConfig;

pub use indexes::IndexStore;
pub use lemmas::LemmaStore;
pub use pages::PageStore;
pub use sites::SiteStore;

/// Shared handle to the search database.
///
/// Writers are serialized by the connection mutex; each [`Database::transaction`]
/// call is atomic.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a database file and apply the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        log::debug!("Opening database at {}", path.display());
        Self::from_connection(Connection::open(path)?)
    }

    /// Private in-memory database, used by tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_config(config: &DatabaseConfig) -> Result<Self> {
        if config.path == ":memory:" {
            Self::open_in_memory()
        } else {
            Self::open(&config.path)
        }
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        schema::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run `f` inside one write transaction. Any error rolls everything back.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let mut conn = self.conn.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Run read-only statements against the connection.
    pub fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    /// Remove every row from every table, children first.
    pub fn clear(&self) -> Result<()> {
        self.transaction(|tx| {
            tx.delete_all_indexes()?;
            tx.delete_all_lemmas()?;
            tx.delete_all_pages()?;
            tx.delete_all_sites()?;
            Ok(())
        })
    }
}
