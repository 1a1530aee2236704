//! Genius API wire schema and the normalized result shape.
//!
//! Responses are decoded into these structs at the network boundary; a
//! payload that does not match fails with `UnexpectedResponse` instead of
//! leaking missing fields into the pipeline.

use crate::error::LyricsError;
use serde::{Deserialize, Serialize};

/// One search candidate, in provider relevance order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub full_title: String,
    pub album_art_url: Option<String>,
    pub detail_url: String,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    response: T,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    result: SongHit,
}

#[derive(Debug, Deserialize)]
struct SongResponse {
    song: SongHit,
}

#[derive(Debug, Deserialize)]
struct SongHit {
    id: u64,
    title: String,
    full_title: String,
    song_art_image_url: Option<String>,
    url: String,
    primary_artist: PrimaryArtist,
}

#[derive(Debug, Deserialize)]
struct PrimaryArtist {
    name: String,
}

impl From<SongHit> for SearchResult {
    fn from(hit: SongHit) -> Self {
        Self {
            id: hit.id.to_string(),
            title: hit.title,
            artist: hit.primary_artist.name,
            full_title: hit.full_title,
            album_art_url: hit.song_art_image_url.filter(|u| !u.is_empty()),
            detail_url: hit.url,
        }
    }
}

pub(crate) fn parse_search_response(body: &str) -> Result<Vec<SearchResult>, LyricsError> {
    let env: Envelope<SearchResponse> =
        serde_json::from_str(body).map_err(|e| LyricsError::unexpected("genius", e))?;
    Ok(env
        .response
        .hits
        .into_iter()
        .map(|h| SearchResult::from(h.result))
        .collect())
}

pub(crate) fn parse_song_response(body: &str) -> Result<SearchResult, LyricsError> {
    let env: Envelope<SongResponse> =
        serde_json::from_str(body).map_err(|e| LyricsError::unexpected("genius", e))?;
    Ok(env.response.song.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_BODY: &str = r#"{
        "meta": {"status": 200},
        "response": {"hits": [
            {"type": "song", "result": {
                "id": 17431,
                "title": "Bad",
                "full_title": "Bad by Michael Jackson",
                "song_art_image_url": "https://images.test/bad.jpg",
                "url": "https://genius.test/Michael-jackson-bad-lyrics",
                "primary_artist": {"id": 835, "name": "Michael Jackson"}
            }},
            {"type": "song", "result": {
                "id": 99,
                "title": "Bad (Remix)",
                "full_title": "Bad (Remix) by Someone",
                "song_art_image_url": "",
                "url": "https://genius.test/someone-bad-remix-lyrics",
                "primary_artist": {"id": 1, "name": "Someone"}
            }}
        ]}
    }"#;

    #[test]
    fn test_parse_search_preserves_order() {
        let results = parse_search_response(SEARCH_BODY).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "17431");
        assert_eq!(results[0].artist, "Michael Jackson");
        assert_eq!(
            results[0].album_art_url.as_deref(),
            Some("https://images.test/bad.jpg")
        );
        assert_eq!(results[1].title, "Bad (Remix)");
        assert_eq!(results[1].album_art_url, None);
    }

    #[test]
    fn test_parse_search_zero_hits() {
        let results = parse_search_response(r#"{"response": {"hits": []}}"#).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_parse_search_rejects_wrong_shape() {
        let err = parse_search_response(r#"{"response": {"sections": []}}"#).unwrap_err();
        assert!(matches!(err, LyricsError::UnexpectedResponse { .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_parse_song() {
        let body = r#"{"response": {"song": {
            "id": 5, "title": "Thriller", "full_title": "Thriller by Michael Jackson",
            "song_art_image_url": null, "url": "https://genius.test/thriller",
            "primary_artist": {"name": "Michael Jackson"}
        }}}"#;
        let song = parse_song_response(body).unwrap();
        assert_eq!(song.id, "5");
        assert_eq!(song.detail_url, "https://genius.test/thriller");
        assert_eq!(song.album_art_url, None);
    }
}
