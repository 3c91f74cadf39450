//! Lemma and index entities.

use serde::{Deserialize, Serialize};

/// A normalized word stem scoped to one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lemma {
    pub id: i64,
    pub site_id: i64,
    pub lemma: String,
    /// Number of pages of the site containing the lemma
    pub frequency: i64,
}

/// Join row between a page and a lemma.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: i64,
    pub page_id: i64,
    pub lemma_id: i64,
    /// Occurrences of the lemma on the page
    pub rank: f64,
}
