//! Database schema.

use rusqlite::Connection;

use crate::error::Result;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS site (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    url         TEXT    NOT NULL UNIQUE,
    name        TEXT    NOT NULL,
    status      TEXT    NOT NULL CHECK (status IN ('INDEXING', 'INDEXED', 'FAILED')),
    status_time TEXT    NOT NULL,
    last_error  TEXT    NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS page (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    site_id INTEGER NOT NULL REFERENCES site(id) ON DELETE CASCADE,
    path    TEXT    NOT NULL,
    code    INTEGER NOT NULL,
    content TEXT    NOT NULL,
    UNIQUE (site_id, path)
);

CREATE TABLE IF NOT EXISTS lemma (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    site_id   INTEGER NOT NULL REFERENCES site(id) ON DELETE CASCADE,
    lemma     TEXT    NOT NULL,
    frequency INTEGER NOT NULL CHECK (frequency >= 0),
    UNIQUE (site_id, lemma)
);

CREATE TABLE IF NOT EXISTS search_index (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    page_id  INTEGER NOT NULL REFERENCES page(id) ON DELETE CASCADE,
    lemma_id INTEGER NOT NULL REFERENCES lemma(id) ON DELETE CASCADE,
    rank     REAL    NOT NULL CHECK (rank >= 0),
    UNIQUE (page_id, lemma_id)
);

CREATE INDEX IF NOT EXISTS lemma_by_text ON lemma(lemma);
CREATE INDEX IF NOT EXISTS search_index_by_lemma ON search_index(lemma_id);
"#;

/// Create tables and indexes if they do not exist yet.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute_batch(SCHEMA)?;
    Ok(())
}
