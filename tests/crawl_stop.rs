//! The stop flag is process-wide, so this binary holds a single test.

mod common;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use common::{StaticFetcher, config, html, service};
use site_search::models::SiteStatus;
use site_search::pipeline::indexing::STOPPED_BY_USER;
use site_search::services::crawler;
use site_search::storage::{PageStore, SiteStore};

const SITE: &str = "https://a.example";
const CHAIN: usize = 40;

#[test]
fn test_stop_fails_running_sites_and_halts_forking() {
    let fetcher = Arc::new(StaticFetcher::with_latency(Duration::from_millis(10)));
    for i in 0..CHAIN {
        let path = if i == 0 { String::new() } else { format!("p{i}") };
        let next = format!("/p{}", i + 1);
        fetcher.page(&format!("{SITE}/{path}"), 200, html("Chain", "кот", &[next.as_str()]));
    }
    fetcher.page(&format!("{SITE}/p{CHAIN}"), 200, html("End", "кот", &[]));

    let mut config = config(&[(SITE, "A")]);
    config.crawler.politeness_delay_ms = 20;
    let (service, db) = service(config, Arc::clone(&fetcher));
    let service = Arc::new(service);

    let background = {
        let service = Arc::clone(&service);
        thread::spawn(move || service.start_indexing())
    };

    let pages = || db.read(|c| c.count_pages_by_site_url(SITE)).unwrap();
    while pages() < 3 {
        assert!(!background.is_finished(), "crawl ended before it could be stopped");
        thread::sleep(Duration::from_millis(5));
    }

    assert!(service.stop_indexing().is_ok());
    assert!(crawler::is_stopped());
    background.join().unwrap();

    let site = db.read(|c| c.find_site_by_url(SITE)).unwrap().unwrap();
    assert_eq!(site.status, SiteStatus::Failed);
    assert_eq!(site.last_error, STOPPED_BY_USER);

    let stopped_at = pages();
    assert!(stopped_at < CHAIN + 1, "crawl was not halted");
    thread::sleep(Duration::from_millis(100));
    assert_eq!(pages(), stopped_at);

    // a new run clears the flag and crawls the whole chain
    assert!(service.start_indexing().is_ok());
    assert!(!crawler::is_stopped());
    assert_eq!(pages(), CHAIN + 1);
    let site = db.read(|c| c.find_site_by_url(SITE)).unwrap().unwrap();
    assert_eq!(site.status, SiteStatus::Indexed);
}
