//! Page fetching: download a page, extract its visible text and count a
//! target phrase in it.

use async_trait::async_trait;
use thiserror::Error;

pub mod http;
pub mod text;

pub use http::HttpPageFetcher;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("invalid url {url:?}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("HTTP error {status} for url: {url}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Number of occurrences of `target` in the visible text of `url`.
    async fn count_occurrences(&self, url: &str, target: &str) -> Result<u64, FetchError>;
}
