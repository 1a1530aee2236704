//! Trending songs from the Deezer chart, served through a `TtlCache`.
//!
//! API Documentation: https://developers.deezer.com/api/chart

use crate::cache::TtlCache;
use crate::error::LyricsError;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingSong {
    pub title: String,
    pub artist: String,
    pub url: String,
    pub album_art_url: Option<String>,
    pub rank: u32,
}

#[async_trait::async_trait]
pub trait ChartSource: Send + Sync {
    async fn top_tracks(&self, limit: usize) -> Result<Vec<TrendingSong>, LyricsError>;
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    data: Vec<ChartTrack>,
}

#[derive(Debug, Deserialize)]
struct ChartTrack {
    title: String,
    link: String,
    position: u32,
    artist: ChartArtist,
    album: ChartAlbum,
}

#[derive(Debug, Deserialize)]
struct ChartArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ChartAlbum {
    cover_medium: Option<String>,
}

fn parse_chart(body: &str) -> Result<Vec<TrendingSong>, LyricsError> {
    let chart: ChartResponse =
        serde_json::from_str(body).map_err(|e| LyricsError::unexpected("deezer", e))?;
    let mut songs: Vec<TrendingSong> = chart
        .data
        .into_iter()
        .map(|t| TrendingSong {
            title: t.title,
            artist: t.artist.name,
            url: t.link,
            album_art_url: t.album.cover_medium,
            rank: t.position,
        })
        .collect();
    songs.sort_by_key(|s| s.rank);
    Ok(songs)
}

#[derive(Debug, Clone)]
pub struct DeezerChartClient {
    client: reqwest::Client,
    base_url: String,
}

impl DeezerChartClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.deezer.com";
    const SERVICE: &'static str = "deezer";

    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build reqwest client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait::async_trait]
impl ChartSource for DeezerChartClient {
    async fn top_tracks(&self, limit: usize) -> Result<Vec<TrendingSong>, LyricsError> {
        let url = format!("{}/chart/0/tracks?limit={}", self.base_url, limit);
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
        parse_chart(&body)
    }
}

/// Chart lookups answered from cache while fresh.
pub struct TrendingService {
    source: Arc<dyn ChartSource>,
    cache: Arc<dyn TtlCache<Vec<TrendingSong>>>,
    ttl: Duration,
}

impl TrendingService {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

    pub fn new(
        source: Arc<dyn ChartSource>,
        cache: Arc<dyn TtlCache<Vec<TrendingSong>>>,
        ttl: Duration,
    ) -> Self {
        Self { source, cache, ttl }
    }

    /// Cache failures are logged and treated as misses.
    pub async fn trending(&self, limit: usize) -> Result<Vec<TrendingSong>, LyricsError> {
        let key = format!("trending:{limit}");

        let cached = tokio::task::spawn_blocking({
            let cache = self.cache.clone();
            let key = key.clone();
            move || cache.get(&key)
        })
        .await;
        match cached {
            Ok(Ok(Some(songs))) => {
                tracing::debug!(%key, "trending served from cache");
                return Ok(songs);
            }
            Ok(Ok(None)) => {}
            Ok(Err(e)) => tracing::warn!(%key, "trending cache read failed: {e:#}"),
            Err(e) => tracing::warn!(%key, "trending cache task failed: {e}"),
        }

        let songs = self.source.top_tracks(limit).await?;
        tracing::info!(count = songs.len(), "fetched trending chart");

        let stored = tokio::task::spawn_blocking({
            let cache = self.cache.clone();
            let songs = songs.clone();
            let ttl = self.ttl;
            move || cache.put(&key, songs, ttl)
        })
        .await;
        match stored {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("trending cache write failed: {e:#}"),
            Err(e) => tracing::warn!("trending cache task failed: {e}"),
        }

        Ok(songs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::storage::SqliteCache;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingChart {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl ChartSource for CountingChart {
        async fn top_tracks(&self, limit: usize) -> Result<Vec<TrendingSong>, LyricsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((1..=limit as u32)
                .map(|rank| TrendingSong {
                    title: format!("Hit {rank}"),
                    artist: "Artist".into(),
                    url: format!("https://deezer.test/track/{rank}"),
                    album_art_url: None,
                    rank,
                })
                .collect())
        }
    }

    struct BrokenCache;

    impl TtlCache<Vec<TrendingSong>> for BrokenCache {
        fn get(&self, _key: &str) -> anyhow::Result<Option<Vec<TrendingSong>>> {
            anyhow::bail!("disk on fire")
        }

        fn put(&self, _key: &str, _value: Vec<TrendingSong>, _ttl: Duration) -> anyhow::Result<()> {
            anyhow::bail!("disk on fire")
        }
    }

    fn chart() -> Arc<CountingChart> {
        Arc::new(CountingChart {
            calls: AtomicUsize::new(0),
        })
    }

    #[test]
    fn test_parse_chart_sorts_by_rank() {
        let body = r#"{"data": [
            {"title": "Second", "link": "https://deezer.test/2", "position": 2,
             "artist": {"name": "B"}, "album": {"cover_medium": "https://img.test/2.jpg"}},
            {"title": "First", "link": "https://deezer.test/1", "position": 1,
             "artist": {"name": "A"}, "album": {}}
        ], "total": 2}"#;
        let songs = parse_chart(body).unwrap();
        assert_eq!(songs[0].title, "First");
        assert_eq!(songs[0].album_art_url, None);
        assert_eq!(songs[1].artist, "B");
    }

    #[test]
    fn test_parse_chart_rejects_wrong_shape() {
        assert!(matches!(
            parse_chart(r#"{"error": {"code": 4}}"#),
            Err(LyricsError::UnexpectedResponse { .. })
        ));
    }

    #[tokio::test]
    async fn test_second_call_hits_memory_cache() {
        let source = chart();
        let service = TrendingService::new(
            source.clone(),
            Arc::new(MemoryCache::<Vec<TrendingSong>>::new(8)),
            TrendingService::DEFAULT_TTL,
        );
        let first = service.trending(3).await.unwrap();
        let second = service.trending(3).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        service.trending(5).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_expired_entries_refetch() {
        let source = chart();
        let service = TrendingService::new(
            source.clone(),
            Arc::new(SqliteCache::<Vec<TrendingSong>>::open_in_memory().unwrap()),
            Duration::ZERO,
        );
        service.trending(2).await.unwrap();
        service.trending(2).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cache_failure_degrades_to_fetch() {
        let source = chart();
        let service =
            TrendingService::new(source, Arc::new(BrokenCache), TrendingService::DEFAULT_TTL);
        let songs = service.trending(2).await.unwrap();
        assert_eq!(songs.len(), 2);
    }
}
