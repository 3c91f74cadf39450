//! Utility functions and helpers.

pub mod html;
pub mod http;
pub mod log;
pub mod url;

pub use http::{FetchedPage, Fetcher, HttpFetcher};
