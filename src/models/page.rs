//! Page entity.

use serde::{Deserialize, Serialize};

/// A fetched page. `(site_id, path)` is unique; `id` is zero until saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: i64,
    pub site_id: i64,
    /// Site-relative path, "/" for the root
    pub path: String,
    pub code: u16,
    /// Raw HTML body
    pub content: String,
}

impl Page {
    pub fn new(site_id: i64, path: impl Into<String>, code: u16, content: impl Into<String>) -> Self {
        Self {
            id: 0,
            site_id,
            path: path.into(),
            code,
            content: content.into(),
        }
    }

    /// 4xx responses are stored but never expanded.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_client_error() {
        assert!(Page::new(1, "/missing", 404, "").is_client_error());
        assert!(!Page::new(1, "/", 200, "").is_client_error());
        assert!(!Page::new(1, "/boom", 500, "").is_client_error());
    }
}
