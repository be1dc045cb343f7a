use super::{FetchError, PageFetcher, text};
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::error::Error as StdError;
use std::time::Duration;
use url::Url;

pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self { client })
    }

    /// Downloads `url` and returns its visible text.
    pub async fn fetch_text(&self, url: &str) -> std::result::Result<String, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        log::debug!("Visiting: {}", parsed);
        let res = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = res.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let html = res.text().await.map_err(|e| classify(url, e))?;
        log::debug!("HTML length: {} bytes", html.len());

        Ok(text::visible_text(&html))
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn count_occurrences(
        &self,
        url: &str,
        target: &str,
    ) -> std::result::Result<u64, FetchError> {
        let visible = self.fetch_text(url).await?;
        Ok(text::count_occurrences(&visible, target))
    }
}

fn classify(url: &str, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::Timeout {
            url: url.to_string(),
        };
    }
    FetchError::Transport {
        url: url.to_string(),
        message: error_chain(&err),
    }
}

/// reqwest hides the root cause behind `source()`; surface the whole chain.
fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
