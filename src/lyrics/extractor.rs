use super::cleanup;
use super::fetch::PageFetcher;
use super::strategies::{self, ExtractionStrategy};
use super::LyricsDocument;
use crate::error::LyricsError;
use scraper::Html;
use std::sync::Arc;

/// Fallback when the configuration does not say otherwise.
pub const DEFAULT_MIN_LYRICS_CHARS: usize = 20;

/// Runs the extraction cascade over a fetched lyrics page.
pub struct LyricsExtractor {
    fetcher: Arc<dyn PageFetcher>,
    cascade: Vec<Box<dyn ExtractionStrategy>>,
    min_chars: usize,
}

impl LyricsExtractor {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        cascade: Vec<Box<dyn ExtractionStrategy>>,
        min_chars: usize,
    ) -> Self {
        Self {
            fetcher,
            cascade,
            min_chars,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_default_cascade(fetcher: Arc<dyn PageFetcher>) -> anyhow::Result<Self> {
        Ok(Self::new(
            fetcher,
            strategies::default_cascade(&[])?,
            DEFAULT_MIN_LYRICS_CHARS,
        ))
    }

    /// Fetch `url` and extract its lyrics.
    ///
    /// `Ok(None)` means the page loaded but nothing usable was on it; fetch
    /// failures come back as errors.
    pub async fn extract(&self, url: &str) -> Result<Option<LyricsDocument>, LyricsError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| LyricsError::invalid(format!("bad lyrics url {url:?}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(LyricsError::invalid(format!(
                "lyrics url must be http(s): {url}"
            )));
        }

        let html = self.fetcher.fetch(url).await?;
        Ok(self.extract_from_html(&html, url))
    }

    /// Apply the cascade to an already-fetched page.
    pub fn extract_from_html(&self, html: &str, source_url: &str) -> Option<LyricsDocument> {
        let doc = Html::parse_document(html);

        let Some((strategy, raw)) = self
            .cascade
            .iter()
            .find_map(|s| s.extract(&doc).filter(|t| !t.trim().is_empty()).map(|t| (s.name(), t)))
        else {
            tracing::warn!(
                url = source_url,
                structure_drift = true,
                "no extraction strategy matched; page layout may have changed"
            );
            return None;
        };

        let text = cleanup::normalize(&raw);
        let chars = text.chars().count();
        if chars < self.min_chars {
            tracing::info!(
                url = source_url,
                strategy,
                chars,
                min = self.min_chars,
                "extracted text too short to be lyrics"
            );
            return None;
        }

        tracing::debug!(url = source_url, strategy, chars, "lyrics extracted");
        Some(LyricsDocument {
            text,
            source_url: source_url.to_string(),
        })
    }
}
