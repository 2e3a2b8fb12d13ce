//! Query parameter extractors for the conversation endpoints.

use serde::Deserialize;

use loki_core::chat::service::DEFAULT_PAGE_SIZE;

/// Query parameters for `GET /conversations/{id}/history`.
///
/// Bounds are checked by the chat service, not here.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub page: i64,
    #[serde(default = "default_size")]
    pub size: i64,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            page: 0,
            size: default_size(),
        }
    }
}

fn default_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

/// Query parameters for `GET /conversations/search`.
#[derive(Debug, Deserialize, Default)]
pub struct SearchQuery {
    /// Case-insensitive title substring.
    pub title: Option<String>,
}
