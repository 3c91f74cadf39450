// src/services/crawler.rs

//! Recursive site crawler.
//!
//! Every visited path becomes a [`CrawlTask`]. A task fetches its page,
//! stores and indexes it, then forks one child task per newly discovered
//! same-site path and waits for the whole subtree. Paths are deduplicated
//! through a visited set shared by all tasks of one site crawl.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use dashmap::DashSet;
use futures::future::BoxFuture;

use crate::concurrency::WorkerPool;
use crate::error::Result;
use crate::models::{Page, Site};
use crate::services::indexer::IndexMaintainer;
use crate::storage::{Database, PageStore, SiteStore};
use crate::utils::{Fetcher, html, url};

static STOPPED: AtomicBool = AtomicBool::new(false);

/// Ask every running crawl to stop forking new tasks.
///
/// The flag stays set until [`reset`] is called.
pub fn stop() {
    STOPPED.store(true, Ordering::SeqCst);
}

/// Clear the stop flag before a new crawl.
pub fn reset() {
    STOPPED.store(false, Ordering::SeqCst);
}

pub fn is_stopped() -> bool {
    STOPPED.load(Ordering::SeqCst)
}

/// Collaborators shared by every task of every crawl.
pub struct CrawlContext {
    pub db: Arc<Database>,
    pub fetcher: Arc<dyn Fetcher>,
    pub indexer: Arc<IndexMaintainer>,
    pub workers: Arc<WorkerPool>,
    /// Pause before forking each child task
    pub politeness_delay_ms: u64,
}

/// One path of one site.
pub struct CrawlTask {
    site_id: i64,
    base_url: Arc<str>,
    path: String,
    visited: Arc<DashSet<String>>,
    context: Arc<CrawlContext>,
}

impl CrawlTask {
    /// Task for the site root with a fresh visited set.
    pub fn root(site: &Site, context: Arc<CrawlContext>) -> Self {
        let visited = Arc::new(DashSet::new());
        visited.insert("/".to_string());
        Self {
            site_id: site.id,
            base_url: Arc::from(site.url.as_str()),
            path: "/".to_string(),
            visited,
            context,
        }
    }

    fn child(&self, path: String) -> Self {
        Self {
            site_id: self.site_id,
            base_url: Arc::clone(&self.base_url),
            path,
            visited: Arc::clone(&self.visited),
            context: Arc::clone(&self.context),
        }
    }

    /// Paths discovered so far by this crawl.
    pub fn visited(&self) -> Arc<DashSet<String>> {
        Arc::clone(&self.visited)
    }

    /// Crawl this path and everything reachable from it.
    ///
    /// Must run inside a tokio runtime; children are spawned onto it.
    /// Errors of child tasks are logged and never reach the parent.
    pub fn compute(self) -> BoxFuture<'static, Result<()>> {
        Box::pin(async move {
            if is_stopped() {
                return Ok(());
            }

            let page_url = url::join(&self.base_url, &self.path)?;
            let fetched = self.context.fetcher.fetch(page_url.as_str()).await?;

            let mut page = Page::new(self.site_id, self.path.as_str(), fetched.code, fetched.body);
            self.context.db.transaction(|tx| {
                tx.save_page(&mut page)?;
                tx.update_status_time_by_id(self.site_id, Utc::now())
            })?;
            self.context.indexer.index(&page)?;

            if page.is_client_error() {
                log::debug!("{} answered {}, not following its links", page_url, page.code);
                return Ok(());
            }

            let links = html::extract_links(&page.content, &page_url);
            let mut children = Vec::new();
            for path in links {
                if !self.visited.insert(path.clone()) {
                    continue;
                }
                if is_stopped() {
                    break;
                }
                self.context
                    .workers
                    .delay(self.context.politeness_delay_ms)
                    .await?;
                children.push((path.clone(), tokio::spawn(self.child(path).compute())));
            }

            for (path, handle) in children {
                match handle.await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => log::warn!("Crawl of {}{} failed: {}", self.base_url, path, e),
                    Err(e) => log::error!("Crawl task for {}{} aborted: {}", self.base_url, path, e),
                }
            }
            Ok(())
        })
    }
}

/// Crawl a whole site starting at its root. Returns the number of paths visited.
pub async fn crawl_site(site: &Site, context: Arc<CrawlContext>) -> Result<usize> {
    let root = CrawlTask::root(site, context);
    let visited = root.visited();
    log::info!("Crawling {} ({})", site.name, site.url);
    root.compute().await?;
    Ok(visited.len())
}
