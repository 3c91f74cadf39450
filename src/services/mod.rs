//! Service layer.
//!
//! - `Lemmatizer` / `Morphology`: text to lemma counts
//! - `IndexMaintainer`: per-page lemma index maintenance
//! - `CrawlTask`: recursive same-site crawling
//! - `SearchRanker`: query ranking and snippets

pub mod crawler;
pub mod indexer;
pub mod lemmatizer;
pub mod search;

pub use crawler::{CrawlContext, CrawlTask};
pub use indexer::IndexMaintainer;
pub use lemmatizer::{Lemmatizer, Morphology, PartOfSpeech, RussianMorphology, WordForm};
pub use search::SearchRanker;
