// src/models/mod.rs

//! Domain models for the search engine.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod lemma;
mod page;
mod response;
mod site;

// Re-export all public types
pub use config::{
    Config, CrawlerConfig, DatabaseConfig, IndexingConfig, PoolConfig, SearchConfig, SiteConfig,
};
pub use lemma::{IndexEntry, Lemma};
pub use page::Page;
pub use response::{
    ApiResponse, SearchPage, SearchResult, SiteStatistics, Statistics, TotalStatistics,
};
pub use site::{Site, SiteStatus};
