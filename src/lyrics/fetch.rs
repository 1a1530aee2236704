use crate::error::LyricsError;
use anyhow::Context;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, UPGRADE_INSECURE_REQUESTS};
use std::time::Duration;

/// Retrieves the raw HTML of a lyrics detail page.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, LyricsError>;
}

/// Fetches pages over HTTP, presenting itself as a desktop browser.
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub const DEFAULT_USER_AGENT: &'static str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const SERVICE: &'static str = "lyrics-page";

    pub fn new(user_agent: &str, timeout: Duration) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("build reqwest client")?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, LyricsError> {
        tracing::debug!(%url, "fetching lyrics page");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LyricsError::from_reqwest(Self::SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LyricsError::from_status(Self::SERVICE, status));
        }

        response
            .text()
            .await
            .map_err(|e| LyricsError::from_reqwest(Self::SERVICE, e))
    }
}
