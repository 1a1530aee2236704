use super::{LyricsDocument, LyricsExtractor, RetrievalOutcome};
use crate::error::LyricsError;
use crate::genius::{SearchQuery, SearchResult, SongSearch};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts allowed after the first one, for transient failures only.
    pub max_retries: u32,
    pub delay: Duration,
    /// Switch to the punctuation-free query after a transient search failure.
    pub fallback_search: bool,
    pub max_candidates: usize,
}

impl RetryPolicy {
    /// Hard ceiling on `max_retries`, whatever the configuration asks for.
    pub const MAX_RETRIES: u32 = 2;
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: Self::MAX_RETRIES,
            delay: Duration::from_secs(1),
            fallback_search: true,
            max_candidates: 3,
        }
    }
}

/// Either a detail-page URL or a title/artist lookup.
#[derive(Debug, Clone)]
pub enum LyricsRequest {
    Url(String),
    Query(SearchQuery),
}

impl From<SearchQuery> for LyricsRequest {
    fn from(q: SearchQuery) -> Self {
        Self::Query(q)
    }
}

impl From<&str> for LyricsRequest {
    fn from(url: &str) -> Self {
        Self::Url(url.to_string())
    }
}

impl From<String> for LyricsRequest {
    fn from(url: String) -> Self {
        Self::Url(url)
    }
}

/// Top search match together with whatever its page yielded.
#[derive(Debug)]
pub struct SongLyrics {
    pub song: SearchResult,
    pub lyrics: RetrievalOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Search,
    Extract,
}

struct AttemptError {
    stage: Stage,
    error: LyricsError,
}

impl AttemptError {
    fn search(error: LyricsError) -> Self {
        Self {
            stage: Stage::Search,
            error,
        }
    }

    fn extract(error: LyricsError) -> Self {
        Self {
            stage: Stage::Extract,
            error,
        }
    }
}

pub struct LyricsPipeline {
    search: Arc<dyn SongSearch>,
    extractor: LyricsExtractor,
    policy: RetryPolicy,
}

impl LyricsPipeline {
    pub fn new(search: Arc<dyn SongSearch>, extractor: LyricsExtractor, policy: RetryPolicy) -> Self {
        Self {
            search,
            extractor,
            policy,
        }
    }

    /// Resolve a request to lyrics, retrying transient failures with a fixed
    /// delay. Every other failure is returned on the attempt it happened.
    pub async fn retrieve(&self, request: impl Into<LyricsRequest>) -> RetrievalOutcome {
        let request = request.into();
        let total = self.policy.max_retries.saturating_add(1);
        let mut simplify = false;
        let mut attempt = 1;

        loop {
            tracing::debug!(attempt, total, "lyrics retrieval attempt");
            let result = match &request {
                LyricsRequest::Url(url) => self
                    .extractor
                    .extract(url)
                    .await
                    .map_err(AttemptError::extract),
                LyricsRequest::Query(query) => self.resolve(query, simplify).await,
            };

            let failure = match result {
                Ok(Some(doc)) => return RetrievalOutcome::Found(doc),
                Ok(None) => return RetrievalOutcome::NotFound,
                Err(failure) => failure,
            };

            if !failure.error.is_transient() || attempt > self.policy.max_retries {
                tracing::error!(attempt, error = %failure.error, "lyrics retrieval failed");
                return RetrievalOutcome::Failed(failure.error);
            }

            // The simplified query gets one try, straight after the first
            // search failure; later attempts go back to the caller's query.
            simplify = attempt == 1 && failure.stage == Stage::Search && self.policy.fallback_search;
            tracing::warn!(
                attempt,
                total,
                error = %failure.error,
                simplified = simplify,
                delay_ms = self.policy.delay.as_millis() as u64,
                "transient failure, retrying"
            );
            tokio::time::sleep(self.policy.delay).await;
            attempt += 1;
        }
    }

    /// Top match for `query` plus the lyrics on its page; `None` without hits.
    pub async fn song_with_lyrics(
        &self,
        query: &SearchQuery,
    ) -> Result<Option<SongLyrics>, LyricsError> {
        query.validate()?;
        let Some(song) = self.search.search(query).await?.into_iter().next() else {
            return Ok(None);
        };
        let lyrics = self.retrieve(LyricsRequest::Url(song.detail_url.clone())).await;
        Ok(Some(SongLyrics { song, lyrics }))
    }

    async fn resolve(
        &self,
        query: &SearchQuery,
        simplify: bool,
    ) -> Result<Option<LyricsDocument>, AttemptError> {
        query.validate().map_err(AttemptError::search)?;

        let simplified = simplify.then(|| query.simplified()).filter(|s| {
            s.validate().is_ok() && s.to_query_string() != query.to_query_string()
        });
        let effective = simplified.as_ref().unwrap_or(query);
        let candidates = self
            .search
            .search(effective)
            .await
            .map_err(AttemptError::search)?;

        if candidates.is_empty() {
            tracing::info!(title = query.title(), artist = query.artist(), "no search results");
            return Ok(None);
        }

        let considered = candidates.len().min(self.policy.max_candidates);
        tracing::debug!(found = candidates.len(), considered, "trying candidates");

        for (i, candidate) in candidates.iter().take(considered).enumerate() {
            tracing::debug!(index = i + 1, title = %candidate.full_title, "extracting candidate");
            match self.extractor.extract(&candidate.detail_url).await {
                Ok(Some(doc)) => return Ok(Some(doc)),
                Ok(None) => {
                    tracing::debug!(index = i + 1, "candidate had no usable lyrics");
                }
                Err(e) if i + 1 < considered => {
                    tracing::warn!(index = i + 1, error = %e, "candidate extraction failed, trying next");
                }
                Err(e) => return Err(AttemptError::extract(e)),
            }
        }

        Ok(None)
    }
}
