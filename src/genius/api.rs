//! Genius API client
//!
//! API Documentation: https://docs.genius.com

use super::models::{self, SearchResult};
use super::query::SearchQuery;
use super::SongSearch;
use crate::error::LyricsError;
use anyhow::Context;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct GeniusClient {
    client: reqwest::Client,
    base_url: String,
}

impl GeniusClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.genius.com";
    const SERVICE: &'static str = "genius";

    pub fn new(access_token: &str, base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", access_token))
            .context("genius access token is not a valid header value")?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("build reqwest client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Look a song up by its Genius id. `None` when the id does not exist.
    pub async fn song(&self, id: u64) -> Result<Option<SearchResult>, LyricsError> {
        let url = format!("{}/songs/{}", self.base_url, id);
        tracing::debug!(id, "genius song lookup");
        match self.get_text(&url).await {
            Ok(body) => models::parse_song_response(&body).map(Some),
            Err(LyricsError::Http { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn get_text(&self, url: &str) -> Result<String, LyricsError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LyricsError::from_reqwest(Self::SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            let err = LyricsError::from_status(Self::SERVICE, status);
            if err.is_auth() {
                tracing::error!(auth_failure = true, %status, "genius rejected the access token");
            }
            return Err(err);
        }

        response
            .text()
            .await
            .map_err(|e| LyricsError::from_reqwest(Self::SERVICE, e))
    }
}

#[async_trait::async_trait]
impl SongSearch for GeniusClient {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>, LyricsError> {
        query.validate()?;
        let term = query.to_query_string();
        let url = format!("{}/search?q={}", self.base_url, urlencoding::encode(&term));
        tracing::debug!(%term, optimized = query.optimize_query(), "genius search");

        let body = self.get_text(&url).await?;
        let results = models::parse_search_response(&body)?;
        tracing::info!(%term, hits = results.len(), "genius search finished");
        Ok(results)
    }
}
