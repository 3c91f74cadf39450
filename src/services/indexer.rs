//! Incremental maintenance of the lemma index.

use std::sync::Arc;

use rusqlite::Connection;

use crate::error::{AppError, Result};
use crate::models::{IndexEntry, Lemma, Page};
use crate::services::lemmatizer::Lemmatizer;
use crate::storage::{Database, IndexStore, LemmaStore};

/// Replaces a page's index rows with the lemmas of its current content.
pub struct IndexMaintainer {
    db: Arc<Database>,
    lemmatizer: Arc<Lemmatizer>,
    retry_attempts: u32,
}

impl IndexMaintainer {
    pub fn new(db: Arc<Database>, lemmatizer: Arc<Lemmatizer>, retry_attempts: u32) -> Self {
        Self {
            db,
            lemmatizer,
            retry_attempts: retry_attempts.max(1),
        }
    }

    /// Revoke the page's previous index and rebuild it from `page.content`.
    ///
    /// Both steps share one transaction, so a failure leaves the old index
    /// in place. The whole unit is retried up to `retry_attempts` times.
    pub fn index(&self, page: &Page) -> Result<()> {
        let lemmas = self.lemmatizer.collect_html_lemmas(&page.content);
        let mut lemmas: Vec<(String, u32)> = lemmas.into_iter().collect();
        lemmas.sort();

        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = self.db.transaction(|tx| {
                let revoked = revoke(tx, page.id)?;
                apply(tx, page, &lemmas)?;
                Ok(revoked)
            });

            match result {
                Ok(revoked) => {
                    log::debug!(
                        "Indexed page {} ({}): {} lemmas, {} stale rows revoked",
                        page.id,
                        page.path,
                        lemmas.len(),
                        revoked
                    );
                    return Ok(());
                }
                Err(e) if attempt < self.retry_attempts => {
                    log::warn!(
                        "Index update for page {} failed (attempt {}/{}): {}",
                        page.id,
                        attempt,
                        self.retry_attempts,
                        e
                    );
                }
                Err(e) => return Err(AppError::index(page.id, e)),
            }
        }
    }
}

/// Drop every index row of the page, decrementing the linked lemmas and
/// deleting those no other page references.
fn revoke(conn: &Connection, page_id: i64) -> Result<usize> {
    let entries = conn.find_all_by_page(page_id)?;
    for entry in &entries {
        let remaining = conn.increment_frequency(entry.lemma_id, -1)?;
        conn.delete_index(entry.id)?;
        if remaining <= 0 {
            conn.delete_lemma(entry.lemma_id)?;
        }
    }
    Ok(entries.len())
}

fn apply(conn: &Connection, page: &Page, lemmas: &[(String, u32)]) -> Result<()> {
    for (text, count) in lemmas {
        let lemma_id = match conn.find_lemma(text, page.site_id)? {
            Some(existing) => {
                conn.increment_frequency(existing.id, 1)?;
                existing.id
            }
            None => {
                let mut lemma = Lemma {
                    id: 0,
                    site_id: page.site_id,
                    lemma: text.clone(),
                    frequency: 1,
                };
                conn.save_lemma(&mut lemma)?;
                lemma.id
            }
        };

        let rank = f64::from(*count);
        match conn.find_index(page.id, lemma_id)? {
            Some(existing) => conn.increment_rank(existing.id, rank)?,
            None => {
                let mut entry = IndexEntry {
                    id: 0,
                    page_id: page.id,
                    lemma_id,
                    rank,
                };
                conn.save_index(&mut entry)?;
            }
        }
    }
    Ok(())
}
