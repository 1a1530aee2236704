//! Embedded video lookup through the YouTube Data API search endpoint.

use crate::error::LyricsError;
use anyhow::Context;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    id: ItemId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemId {
    video_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct YoutubeClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl YoutubeClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://www.googleapis.com/youtube/v3";
    const SERVICE: &'static str = "youtube";

    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build reqwest client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Embed URL of the first video matching `title artist`.
    pub async fn embed_url(&self, title: &str, artist: &str) -> Result<Option<String>, LyricsError> {
        if title.trim().is_empty() {
            return Err(LyricsError::invalid("title must not be empty"));
        }
        let query = format!("{} {}", title, artist);
        let url = format!(
            "{}/search?part=snippet&type=video&maxResults=1&q={}&key={}",
            self.base_url,
            urlencoding::encode(query.trim()),
            urlencoding::encode(&self.api_key)
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LyricsError::from_reqwest(Self::SERVICE, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(LyricsError::from_status(Self::SERVICE, status));
        }
        let body = response
            .text()
            .await
            .map_err(|e| LyricsError::from_reqwest(Self::SERVICE, e))?;
        parse_embed_url(&body)
    }
}

fn parse_embed_url(body: &str) -> Result<Option<String>, LyricsError> {
    let parsed: SearchResponse =
        serde_json::from_str(body).map_err(|e| LyricsError::unexpected("youtube", e))?;
    Ok(parsed
        .items
        .into_iter()
        .find_map(|i| i.id.video_id)
        .map(|id| format!("https://www.youtube.com/embed/{id}")))
}
