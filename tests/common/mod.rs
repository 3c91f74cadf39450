//! Shared fixtures: an in-memory site graph served through `Fetcher`.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use site_search::error::{AppError, Result};
use site_search::models::{Config, SiteConfig};
use site_search::pipeline::IndexingService;
use site_search::storage::Database;
use site_search::utils::{FetchedPage, Fetcher};

#[derive(Default)]
pub struct StaticFetcher {
    pages: Mutex<HashMap<String, FetchedPage>>,
    failing: Mutex<Vec<String>>,
    hits: Mutex<HashMap<String, usize>>,
    latency: Duration,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    pub fn page(&self, url: &str, code: u16, body: impl Into<String>) {
        self.pages.lock().insert(
            url.to_string(),
            FetchedPage {
                code,
                body: body.into(),
            },
        );
    }

    /// Fetching `url` fails like a network error.
    pub fn fail(&self, url: &str) {
        self.failing.lock().push(url.to_string());
    }

    pub fn hits(&self, url: &str) -> usize {
        self.hits.lock().get(url).copied().unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.hits.lock().values().sum()
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        *self.hits.lock().entry(url.to_string()).or_insert(0) += 1;
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.failing.lock().iter().any(|u| u == url) {
            return Err(AppError::fetch(url, "connection refused"));
        }
        let page = self.pages.lock().get(url).cloned();
        Ok(page.unwrap_or_else(|| FetchedPage {
            code: 404,
            body: "<html><head><title>Not found</title></head><body></body></html>".into(),
        }))
    }
}

/// HTML document with a Latin title, the given body text and links.
pub fn html(title: &str, text: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!("<a href=\"{href}\">link</a>"))
        .collect();
    format!(
        "<html><head><title>{title}</title></head><body><p>{text}</p>{anchors}</body></html>"
    )
}

pub fn config(sites: &[(&str, &str)]) -> Config {
    let mut config = Config::default();
    config.sites = sites
        .iter()
        .map(|(url, name)| SiteConfig::new(*url, *name))
        .collect();
    config.crawler.politeness_delay_ms = 0;
    config.pool.crawl_threads = 4;
    config.pool.worker_core_threads = 1;
    config.pool.worker_max_threads = 4;
    config
}

pub fn service(config: Config, fetcher: Arc<StaticFetcher>) -> (IndexingService, Arc<Database>) {
    let db = Arc::new(Database::open_in_memory().expect("in-memory database"));
    let service = IndexingService::with_parts(config, Arc::clone(&db), fetcher)
        .expect("indexing service");
    (service, db)
}

/// Assert that every lemma's frequency equals the number of pages indexed under it.
pub fn assert_frequencies_consistent(db: &Database) {
    let mismatches: i64 = db
        .read(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM lemma l
                 WHERE l.frequency != (SELECT COUNT(DISTINCT i.page_id)
                                       FROM search_index i WHERE i.lemma_id = l.id)",
                [],
                |r| r.get(0),
            )?)
        })
        .expect("frequency query");
    assert_eq!(mismatches, 0, "lemma frequencies out of sync with index rows");

    let orphans: i64 = db
        .read(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM lemma l
                 WHERE NOT EXISTS (SELECT 1 FROM search_index i WHERE i.lemma_id = l.id)",
                [],
                |r| r.get(0),
            )?)
        })
        .expect("orphan query");
    assert_eq!(orphans, 0, "lemmas without index rows survived");
}
