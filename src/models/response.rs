//! Response types returned to the request-handling layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a user-facing operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ApiResponse<T> {
    Ok { value: T },
    Error { message: String },
}

impl<T> ApiResponse<T> {
    pub fn ok(value: T) -> Self {
        Self::Ok { value }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Ok { value } => Some(value),
            Self::Error { .. } => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Ok { .. } => None,
            Self::Error { message } => Some(message),
        }
    }
}

/// One ranked hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub site_url: String,
    pub site_name: String,
    pub path: String,
    pub title: String,
    pub snippet: String,
    /// Relevance relative to the best hit, in `0..=1`
    pub relevance: f64,
}

/// A window over the ranked hits.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchPage {
    /// Size of the full result set, before slicing
    pub total_count: usize,
    pub results: Vec<SearchResult>,
}

/// Index statistics for all configured sites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total: TotalStatistics,
    pub detailed: Vec<SiteStatistics>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TotalStatistics {
    pub sites: usize,
    pub pages: usize,
    pub lemmas: usize,
    pub indexing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteStatistics {
    pub url: String,
    pub name: String,
    /// Site status, or "NOT INDEXED" for sites never crawled
    pub status: String,
    pub status_time: DateTime<Utc>,
    pub error: String,
    pub pages: usize,
    pub lemmas: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_serializes_tagged() {
        let response: ApiResponse<()> = ApiResponse::error("Empty search query");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "Empty search query");
    }

    #[test]
    fn test_ok_response_carries_value() {
        let response = ApiResponse::ok(SearchPage::default());
        assert!(response.is_ok());
        assert_eq!(response.value().map(|p| p.total_count), Some(0));
        assert!(response.message().is_none());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["value"]["total_count"], 0);
    }
}
