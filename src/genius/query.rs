use crate::error::LyricsError;
use once_cell::sync::Lazy;
use regex::Regex;

static PARENTHETICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*(\([^)]*\)|\[[^\]]*\])\s*").expect("valid regex"));
static FEATURING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+(feat\.?|ft\.?|featuring)\s+.*$").expect("valid regex"));
static NOISE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s'&]").expect("valid regex"));
static PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// A title/artist lookup as the caller built it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    title: String,
    artist: String,
    optimize_query: bool,
}

impl SearchQuery {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            optimize_query: false,
        }
    }

    pub fn optimized(mut self, optimize_query: bool) -> Self {
        self.optimize_query = optimize_query;
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    pub fn optimize_query(&self) -> bool {
        self.optimize_query
    }

    pub fn validate(&self) -> Result<(), LyricsError> {
        if self.title.trim().is_empty() {
            return Err(LyricsError::invalid("title must not be empty"));
        }
        Ok(())
    }

    /// The search term sent to the provider.
    ///
    /// A blank artist adds no constraint. With `optimize_query` the title loses
    /// parentheticals, bracketed tags and trailing featured-artist credits, and
    /// both parts lose punctuation that does not help matching.
    pub fn to_query_string(&self) -> String {
        let artist = self.artist.trim();
        if !self.optimize_query {
            return if artist.is_empty() {
                self.title.clone()
            } else {
                format!("{} {}", self.title, self.artist)
            };
        }

        let title = PARENTHETICAL.replace_all(&self.title, " ");
        let title = FEATURING.replace(&title, "");
        let joined = if artist.is_empty() {
            title.into_owned()
        } else {
            format!("{} {}", title, artist)
        };
        let stripped = NOISE_CHARS.replace_all(&joined, "");
        WHITESPACE.replace_all(&stripped, " ").trim().to_string()
    }

    /// Same lookup with every non-word character removed; used for the
    /// fallback search after a transient failure.
    pub fn simplified(&self) -> Self {
        let strip = |s: &str| PUNCTUATION.replace_all(s, "").trim().to_string();
        Self {
            title: strip(&self.title),
            artist: strip(&self.artist),
            optimize_query: true,
        }
    }
}
