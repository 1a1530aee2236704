//! Song search against the Genius API
//!
//! This module provides:
//! - `SearchQuery` with optional query normalization
//! - `GeniusClient`, the HTTP implementation of `SongSearch`
//! - `SearchResult`, the provider-neutral candidate shape

pub mod api;
pub mod models;
pub mod query;

pub use api::GeniusClient;
pub use models::SearchResult;
pub use query::SearchQuery;

use crate::error::LyricsError;

/// Anything that can turn a query into ranked candidates.
///
/// Zero hits is `Ok(vec![])`, never an error. Implementations do not retry.
#[async_trait::async_trait]
pub trait SongSearch: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>, LyricsError>;
}

/// Album art of the best match, if the provider has any.
pub async fn album_art(
    search: &dyn SongSearch,
    query: &SearchQuery,
) -> Result<Option<String>, LyricsError> {
    let results = search.search(query).await?;
    Ok(results.into_iter().next().and_then(|r| r.album_art_url))
}
