//! Lyrics retrieval
//!
//! This module provides:
//! - `PageFetcher` and its HTTP implementation for lyrics detail pages
//! - `LyricsExtractor`, which runs an ordered cascade of extraction strategies
//! - `LyricsPipeline`, which resolves a query or URL to a `RetrievalOutcome`

pub mod cleanup;
pub mod extractor;
pub mod fetch;
pub mod pipeline;
pub mod strategies;

pub use extractor::LyricsExtractor;
pub use fetch::{HttpPageFetcher, PageFetcher};
pub use pipeline::{LyricsPipeline, RetryPolicy};

use crate::error::LyricsError;
use serde::Serialize;

/// Normalized lyrics text and the page it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricsDocument {
    pub text: String,
    pub source_url: String,
}

/// What a retrieval produced.
#[derive(Debug)]
pub enum RetrievalOutcome {
    Found(LyricsDocument),
    /// No candidates, or none carried usable lyrics.
    NotFound,
    Failed(LyricsError),
}

impl RetrievalOutcome {
    #[cfg(test)]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    #[cfg(test)]
    pub fn document(&self) -> Option<&LyricsDocument> {
        match self {
            Self::Found(doc) => Some(doc),
            _ => None,
        }
    }
}
