//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Thread pool sizing
    #[serde(default)]
    pub pool: PoolConfig,

    /// Database location
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Query-time ranking settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Index maintenance settings
    #[serde(default)]
    pub indexing: IndexingConfig,

    /// Sites to crawl
    #[serde(default = "defaults::sites")]
    pub sites: Vec<SiteConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.normalize();
        Ok(config)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Trim trailing slashes so site URLs compare as plain prefixes.
    fn normalize(&mut self) {
        for site in &mut self.sites {
            let trimmed = site.url.trim().trim_end_matches('/').to_string();
            site.url = trimmed;
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if !(self.search.frequency_threshold > 0.0 && self.search.frequency_threshold <= 1.0) {
            return Err(AppError::validation(
                "search.frequency_threshold must be in (0, 1]",
            ));
        }
        if self.search.snippet_max_chars < 4 {
            return Err(AppError::validation("search.snippet_max_chars must be >= 4"));
        }
        if self.indexing.retry_attempts == 0 {
            return Err(AppError::validation("indexing.retry_attempts must be > 0"));
        }
        if self.sites.is_empty() {
            return Err(AppError::validation("No sites defined"));
        }
        for site in &self.sites {
            site.validate()?;
        }
        Ok(())
    }

    /// Find the configured site whose URL is a prefix of `url`.
    pub fn site_for_url(&self, url: &str) -> Option<&SiteConfig> {
        self.sites.iter().find(|site| site.contains(url))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawler: CrawlerConfig::default(),
            pool: PoolConfig::default(),
            database: DatabaseConfig::default(),
            search: SearchConfig::default(),
            indexing: IndexingConfig::default(),
            sites: defaults::sites(),
        }
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Referer header for HTTP requests
    #[serde(default = "defaults::referrer")]
    pub referrer: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay before forking each child crawl, in milliseconds
    #[serde(default = "defaults::politeness_delay")]
    pub politeness_delay_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            referrer: defaults::referrer(),
            timeout_secs: defaults::timeout(),
            politeness_delay_ms: defaults::politeness_delay(),
        }
    }
}

/// Thread pool sizing. Zero means "derive from available cores".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolConfig {
    #[serde(default)]
    pub crawl_threads: usize,

    #[serde(default)]
    pub worker_core_threads: usize,

    #[serde(default)]
    pub worker_max_threads: usize,

    /// Idle worker threads are released after this many seconds
    #[serde(default = "defaults::worker_idle")]
    pub worker_idle_secs: u64,
}

impl PoolConfig {
    fn available_cores() -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(2)
    }

    /// Crawl pool size: half of the cores, rounded up.
    pub fn crawl_threads(&self) -> usize {
        if self.crawl_threads > 0 {
            return self.crawl_threads;
        }
        Self::available_cores().div_ceil(2)
    }

    /// Worker pool core size: the other half of the cores.
    pub fn worker_core_threads(&self) -> usize {
        if self.worker_core_threads > 0 {
            return self.worker_core_threads;
        }
        (Self::available_cores() / 2).max(1)
    }

    /// Worker pool upper bound.
    pub fn worker_max_threads(&self) -> usize {
        if self.worker_max_threads > 0 {
            return self.worker_max_threads.max(self.worker_core_threads());
        }
        Self::available_cores().max(self.worker_core_threads())
    }
}

/// Database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path, or ":memory:"
    #[serde(default = "defaults::database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: defaults::database_path(),
        }
    }
}

/// Query-time ranking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Lemmas more frequent than this share of the maximum frequency are dropped
    #[serde(default = "defaults::frequency_threshold")]
    pub frequency_threshold: f64,

    /// Snippets longer than this are truncated with an ellipsis
    #[serde(default = "defaults::snippet_max_chars")]
    pub snippet_max_chars: usize,

    #[serde(default = "defaults::default_limit")]
    pub default_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            frequency_threshold: defaults::frequency_threshold(),
            snippet_max_chars: defaults::snippet_max_chars(),
            default_limit: defaults::default_limit(),
        }
    }
}

/// Index maintenance settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    /// How many times a page's revoke-and-rebuild transaction is attempted
    #[serde(default = "defaults::retry_attempts")]
    pub retry_attempts: u32,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            retry_attempts: defaults::retry_attempts(),
        }
    }
}

/// A site to crawl.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SiteConfig {
    /// Base URL, e.g. "https://example.com"
    pub url: String,

    /// Display name
    pub name: String,
}

impl SiteConfig {
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            name: name.into(),
        }
    }

    /// Whether `url` belongs to this site.
    pub fn contains(&self, url: &str) -> bool {
        url.starts_with(&self.url)
    }

    fn validate(&self) -> Result<()> {
        let parsed = Url::parse(&self.url)
            .map_err(|e| AppError::validation(format!("site url '{}': {e}", self.url)))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(AppError::validation(format!(
                "site url '{}' must be http(s) with a host",
                self.url
            )));
        }
        if parsed.path() != "/" {
            return Err(AppError::validation(format!(
                "site url '{}' must not contain a path",
                self.url
            )));
        }
        if self.name.trim().is_empty() {
            return Err(AppError::validation(format!(
                "site '{}' has an empty name",
                self.url
            )));
        }
        Ok(())
    }
}

mod defaults {
    use super::SiteConfig;

    // Crawler defaults
    pub fn user_agent() -> String {
        "SiteSearchBot".into()
    }
    pub fn referrer() -> String {
        "http://www.google.com".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn politeness_delay() -> u64 {
        200
    }

    // Pool defaults
    pub fn worker_idle() -> u64 {
        60
    }

    // Database defaults
    pub fn database_path() -> String {
        "storage/search.db".into()
    }

    // Search defaults
    pub fn frequency_threshold() -> f64 {
        0.9
    }
    pub fn snippet_max_chars() -> usize {
        200
    }
    pub fn default_limit() -> usize {
        20
    }

    // Indexing defaults
    pub fn retry_attempts() -> u32 {
        3
    }

    // Site defaults
    pub fn sites() -> Vec<SiteConfig> {
        vec![SiteConfig::new("https://example.com", "Example")]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.crawler.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_site_with_path() {
        let mut config = Config::default();
        config.sites = vec![SiteConfig::new("https://example.com/blog", "Blog")];
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_threshold() {
        let mut config = Config::default();
        config.search.frequency_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn parse_toml_applies_defaults_and_trims_urls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[crawler]
politeness_delay_ms = 0

[[sites]]
url = "https://docs.example.org/"
name = "Docs"
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.crawler.politeness_delay_ms, 0);
        assert_eq!(config.crawler.user_agent, "SiteSearchBot");
        assert_eq!(config.search.snippet_max_chars, 200);
        assert_eq!(config.sites[0].url, "https://docs.example.org");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_or_default_falls_back() {
        let config = Config::load_or_default("/nonexistent/config.toml");
        assert_eq!(config.sites.len(), 1);
    }

    #[test]
    fn site_for_url_matches_prefix() {
        let mut config = Config::default();
        config.sites = vec![
            SiteConfig::new("https://a.example", "A"),
            SiteConfig::new("https://b.example", "B"),
        ];
        assert_eq!(
            config.site_for_url("https://b.example/docs/1").map(|s| s.name.as_str()),
            Some("B")
        );
        assert!(config.site_for_url("https://c.example/").is_none());
    }

    #[test]
    fn pool_sizes_are_positive() {
        let pool = PoolConfig::default();
        assert!(pool.crawl_threads() >= 1);
        assert!(pool.worker_core_threads() >= 1);
        assert!(pool.worker_max_threads() >= pool.worker_core_threads());
    }
}
