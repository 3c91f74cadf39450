// src/pipeline/indexing.rs

//! Indexing control surface: start/stop crawls, single-page indexing,
//! search and statistics.
//!
//! Every operation answers with an [`ApiResponse`]; internal errors are
//! logged and turned into a short message.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use chrono::Utc;

use crate::concurrency::{ParallelTaskPool, WorkerPool};
use crate::error::{AppError, Result};
use crate::models::{
    ApiResponse, Config, Page, SearchPage, Site, SiteConfig, SiteStatistics, SiteStatus,
    Statistics, TotalStatistics,
};
use crate::services::crawler::{self, CrawlContext};
use crate::services::{IndexMaintainer, Lemmatizer, SearchRanker};
use crate::storage::{Database, LemmaStore, PageStore, SiteStore};
use crate::utils::log::summary;
use crate::utils::{Fetcher, HttpFetcher, url};

pub const ALREADY_RUNNING: &str = "Indexing is already running";
pub const NOT_RUNNING: &str = "Indexing is not running";
pub const STOPPED_BY_USER: &str = "Indexing stopped by user";
pub const OUTSIDE_CONFIGURED_SITES: &str =
    "This page is outside the sites listed in the configuration file";
pub const EMPTY_QUERY: &str = "Empty search query";
pub const NOT_INDEXED: &str = "NOT INDEXED";

/// Owns the pools and collaborators behind every user-facing operation.
///
/// Blocking methods must be called from outside any tokio runtime.
pub struct IndexingService {
    config: Arc<Config>,
    db: Arc<Database>,
    pool: ParallelTaskPool,
    context: Arc<CrawlContext>,
    ranker: SearchRanker,
    running: AtomicBool,
}

impl IndexingService {
    /// Service with an HTTP fetcher and the configured database.
    pub fn new(config: Config) -> Result<Self> {
        let db = Arc::new(Database::from_config(&config.database)?);
        let fetcher = Arc::new(HttpFetcher::new(&config.crawler)?);
        Self::with_parts(config, db, fetcher)
    }

    /// Service over explicit storage and page source.
    pub fn with_parts(config: Config, db: Arc<Database>, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        let pool = ParallelTaskPool::new(config.pool.crawl_threads())?;
        let workers = WorkerPool::new(
            config.pool.worker_core_threads(),
            config.pool.worker_max_threads(),
            Duration::from_secs(config.pool.worker_idle_secs),
        )?;

        let lemmatizer = Arc::new(Lemmatizer::russian());
        let indexer = Arc::new(IndexMaintainer::new(
            Arc::clone(&db),
            Arc::clone(&lemmatizer),
            config.indexing.retry_attempts,
        ));
        let context = Arc::new(CrawlContext {
            db: Arc::clone(&db),
            fetcher,
            indexer,
            workers: Arc::new(workers),
            politeness_delay_ms: config.crawler.politeness_delay_ms,
        });
        let ranker = SearchRanker::new(Arc::clone(&db), lemmatizer, config.search.clone());

        Ok(Self {
            config: Arc::new(config),
            db,
            pool,
            context,
            ranker,
            running: AtomicBool::new(false),
        })
    }

    pub fn is_indexing(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Recreate every configured site and crawl them all, blocking until done.
    pub fn start_indexing(&self) -> ApiResponse<()> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return ApiResponse::error(ALREADY_RUNNING);
        }
        crawler::reset();

        let result = self.run_indexing();
        self.running.store(false, Ordering::SeqCst);

        match result {
            Ok(0) => ApiResponse::ok(()),
            Ok(failed) => ApiResponse::error(format!("Indexing finished with errors on {failed} sites")),
            Err(e) => {
                log::error!("Indexing aborted: {}", e);
                ApiResponse::error(format!("Indexing aborted: {e}"))
            }
        }
    }

    fn run_indexing(&self) -> Result<usize> {
        let started = Instant::now();
        self.db.clear()?;

        let sites = self.db.transaction(|tx| {
            let mut sites = Vec::with_capacity(self.config.sites.len());
            for site_config in &self.config.sites {
                let mut site = Site::indexing(&site_config.url, &site_config.name);
                tx.save_site(&mut site)?;
                sites.push(site);
            }
            Ok(sites)
        })?;

        log::info!(
            "Indexing {} sites on {} crawl threads",
            sites.len(),
            self.pool.threads()
        );

        let failed = Arc::new(AtomicUsize::new(0));
        let visited = Arc::new(AtomicUsize::new(0));
        let tasks = sites.into_iter().map(|site| {
            let context = Arc::clone(&self.context);
            let db = Arc::clone(&self.db);
            let failed = Arc::clone(&failed);
            let visited = Arc::clone(&visited);
            async move {
                let outcome = crawler::crawl_site(&site, context).await;
                let (status, error) = match &outcome {
                    Ok(count) => {
                        visited.fetch_add(*count, Ordering::SeqCst);
                        if crawler::is_stopped() {
                            log::warn!("Crawl of {} stopped after {} paths", site.url, count);
                            (SiteStatus::Failed, STOPPED_BY_USER.to_string())
                        } else {
                            log::info!("Finished {} ({} paths)", site.url, count);
                            (SiteStatus::Indexed, String::new())
                        }
                    }
                    Err(e) => {
                        failed.fetch_add(1, Ordering::SeqCst);
                        log::error!("Indexing of {} failed: {}", site.url, e);
                        (SiteStatus::Failed, e.to_string())
                    }
                };
                // a stop request may already have failed the site
                if let Err(e) = db.transaction(|tx| {
                    tx.update_status_by_id(site.id, SiteStatus::Indexing, status, &error)
                }) {
                    log::error!("Cannot update status of {}: {}", site.url, e);
                }
            }
        });
        self.pool.execute_await(tasks);

        let failed = failed.load(Ordering::SeqCst);
        summary(
            "Indexing",
            &[
                ("sites", self.config.sites.len().to_string()),
                ("failed", failed.to_string()),
                ("paths", visited.load(Ordering::SeqCst).to_string()),
                ("stopped", crawler::is_stopped().to_string()),
                ("elapsed", format!("{:.1}s", started.elapsed().as_secs_f64())),
            ],
        );
        Ok(failed)
    }

    /// Stop every running crawl and fail the sites still being indexed.
    pub fn stop_indexing(&self) -> ApiResponse<()> {
        if !self.is_indexing() {
            return ApiResponse::error(NOT_RUNNING);
        }

        crawler::stop();
        match self.db.transaction(|tx| {
            tx.update_status_and_error_by_status(SiteStatus::Indexing, SiteStatus::Failed, STOPPED_BY_USER)
        }) {
            Ok(changed) => {
                log::warn!("Indexing stopped by user, {} sites failed", changed);
                ApiResponse::ok(())
            }
            Err(e) => {
                log::error!("Cannot fail running sites: {}", e);
                ApiResponse::error(format!("Stop failed: {e}"))
            }
        }
    }

    /// Stop indexing when the process receives Ctrl-C.
    pub fn stop_on_ctrl_c(self: &Arc<Self>) {
        let service: Weak<Self> = Arc::downgrade(self);
        self.pool.execute(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::warn!("Cannot listen for Ctrl-C: {}", e);
                return;
            }
            log::warn!("Ctrl-C received, stopping");
            if let Some(service) = service.upgrade() {
                service.stop_indexing();
            }
        });
    }

    /// Fetch and (re)index one page of a configured site.
    pub fn index_page(&self, page_url: &str) -> ApiResponse<()> {
        let page_url = page_url.trim();
        let Some(site_config) = self.config.site_for_url(page_url) else {
            return ApiResponse::error(OUTSIDE_CONFIGURED_SITES);
        };
        let Some(path) = url::relative_path(&site_config.url, page_url) else {
            return ApiResponse::error(OUTSIDE_CONFIGURED_SITES);
        };

        match self.index_single_page(site_config, &path) {
            Ok(()) => ApiResponse::ok(()),
            Err(e) => {
                log::error!("Indexing of {} failed: {}", page_url, e);
                ApiResponse::error(format!("Page indexing failed: {e}"))
            }
        }
    }

    fn index_single_page(&self, site_config: &SiteConfig, path: &str) -> Result<()> {
        let site = self.db.transaction(|tx| {
            let mut site = tx
                .find_site_by_url(&site_config.url)?
                .unwrap_or_else(|| Site::indexing(&site_config.url, &site_config.name));
            site.status = SiteStatus::Indexing;
            site.status_time = Utc::now();
            site.last_error.clear();
            tx.save_site(&mut site)?;
            Ok(site)
        })?;

        let result = self.fetch_and_index(&site, path);
        if self.is_indexing() {
            // the running crawl settles the site status
            return result;
        }

        let (status, error) = match &result {
            Ok(()) => (SiteStatus::Indexed, String::new()),
            Err(e) => (SiteStatus::Failed, e.to_string()),
        };
        self.db
            .transaction(|tx| tx.update_status_by_id(site.id, SiteStatus::Indexing, status, &error))?;
        result
    }

    fn fetch_and_index(&self, site: &Site, path: &str) -> Result<()> {
        let page_url = url::join(&site.url, path)?;
        let fetched = self
            .pool
            .block_on(self.context.fetcher.fetch(page_url.as_str()))?;

        let mut page = Page::new(site.id, path, fetched.code, fetched.body);
        self.db.transaction(|tx| {
            tx.save_page(&mut page)?;
            tx.update_status_time_by_id(site.id, Utc::now())
        })?;
        self.context.indexer.index(&page)?;
        log::info!("Indexed {} ({})", page_url, page.code);
        Ok(())
    }

    /// Ranked search over one configured site or the whole corpus.
    pub fn search(
        &self,
        query: &str,
        site_url: Option<&str>,
        offset: usize,
        limit: Option<usize>,
    ) -> ApiResponse<SearchPage> {
        if query.trim().is_empty() {
            return ApiResponse::error(EMPTY_QUERY);
        }
        let limit = limit.unwrap_or(self.config.search.default_limit);

        let site = match site_url {
            None => None,
            Some(site_url) => {
                let Some(site_config) = self.config.site_for_url(site_url.trim()) else {
                    return ApiResponse::error(OUTSIDE_CONFIGURED_SITES);
                };
                match self.db.read(|conn| conn.find_site_by_url(&site_config.url)) {
                    Ok(Some(site)) => Some(site),
                    Ok(None) => return ApiResponse::ok(SearchPage::default()),
                    Err(e) => {
                        log::error!("Cannot load site {}: {}", site_config.url, e);
                        return ApiResponse::error("Search failed");
                    }
                }
            }
        };

        match self.ranker.search(query, site.as_ref(), offset, limit) {
            Ok(page) => ApiResponse::ok(page),
            Err(AppError::Validation(message)) => ApiResponse::error(message),
            Err(e) => {
                log::error!("Search for '{}' failed: {}", query, e);
                ApiResponse::error("Search failed")
            }
        }
    }

    /// Page and lemma counts per configured site.
    pub fn statistics(&self) -> ApiResponse<Statistics> {
        match self.collect_statistics() {
            Ok(statistics) => ApiResponse::ok(statistics),
            Err(e) => {
                log::error!("Cannot collect statistics: {}", e);
                ApiResponse::error("Statistics are unavailable")
            }
        }
    }

    fn collect_statistics(&self) -> Result<Statistics> {
        let detailed = self.db.read(|conn| {
            let mut detailed = Vec::with_capacity(self.config.sites.len());
            for site_config in &self.config.sites {
                let site = conn.find_site_by_url(&site_config.url)?;
                detailed.push(SiteStatistics {
                    url: site_config.url.clone(),
                    name: site_config.name.clone(),
                    status: site
                        .as_ref()
                        .map_or_else(|| NOT_INDEXED.to_string(), |s| s.status.to_string()),
                    status_time: site.as_ref().map_or_else(Utc::now, |s| s.status_time),
                    error: site.map(|s| s.last_error).unwrap_or_default(),
                    pages: conn.count_pages_by_site_url(&site_config.url)?,
                    lemmas: conn.count_lemmas_by_site_url(&site_config.url)?,
                });
            }
            Ok(detailed)
        })?;

        let total = TotalStatistics {
            sites: detailed.len(),
            pages: detailed.iter().map(|s| s.pages).sum(),
            lemmas: detailed.iter().map(|s| s.lemmas).sum(),
            indexing: self.is_indexing(),
        };
        Ok(Statistics { total, detailed })
    }
}
