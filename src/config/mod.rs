use crate::genius::GeniusClient;
use crate::lyrics::{HttpPageFetcher, RetryPolicy};
use crate::trending::{DeezerChartClient, TrendingService};
use crate::youtube::YoutubeClient;
use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub genius: GeniusConfig,
    pub fetch: FetchConfig,
    pub retry: RetryConfig,
    pub extractor: ExtractorConfig,
    pub trending: TrendingConfig,
    pub youtube: YoutubeConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeniusConfig {
    /// Client access token from https://genius.com/api-clients
    pub access_token: Option<String>,
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-request timeout for API calls and lyrics pages.
    pub timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub delay_ms: u64,
    pub fallback_search: bool,
    pub max_candidates: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub min_lyrics_chars: usize,
    /// CSS selectors tried after the built-in container selectors.
    pub extra_selectors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendingConfig {
    pub base_url: String,
    pub limit: usize,
    pub ttl_secs: u64,
    pub cache: CacheBackend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
}

impl Default for GeniusConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            base_url: GeniusClient::DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 12,
            user_agent: HttpPageFetcher::DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_retries: policy.max_retries,
            delay_ms: policy.delay.as_millis() as u64,
            fallback_search: policy.fallback_search,
            max_candidates: policy.max_candidates,
        }
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            min_lyrics_chars: crate::lyrics::extractor::DEFAULT_MIN_LYRICS_CHARS,
            extra_selectors: Vec::new(),
        }
    }
}

impl Default for TrendingConfig {
    fn default() -> Self {
        Self {
            base_url: DeezerChartClient::DEFAULT_BASE_URL.to_string(),
            limit: 10,
            ttl_secs: TrendingService::DEFAULT_TTL.as_secs(),
            cache: CacheBackend::Sqlite,
        }
    }
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: YoutubeClient::DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let proj = ProjectDirs::from("dev", "lyricsense", "lyricsense");
        let data_dir = proj
            .as_ref()
            .map(|p| p.data_dir().to_path_buf())
            .unwrap_or_else(|| std::env::temp_dir().join("lyricsense"));
        Self { data_dir }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries.min(RetryPolicy::MAX_RETRIES),
            delay: Duration::from_millis(self.delay_ms),
            fallback_search: self.fallback_search,
            max_candidates: self.max_candidates.max(1),
        }
    }
}

pub fn save(cfg: &Config, override_path: Option<&Path>) -> anyhow::Result<()> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };
    write_private(&path, cfg)
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let proj = ProjectDirs::from("dev", "lyricsense", "lyricsense")
        .context("ProjectDirs unavailable")?;
    Ok(proj.config_dir().join("config.toml"))
}

pub fn load(override_path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    if !path.exists() {
        let cfg = Config::default();
        write_private(&path, &cfg)?;
        return Ok(cfg);
    }

    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    parse(&raw).with_context(|| format!("parse {}", path.display()))
}

fn parse(raw: &str) -> anyhow::Result<Config> {
    Ok(toml::from_str::<Config>(raw)?)
}

// The file can hold API credentials.
fn write_private(path: &Path, cfg: &Config) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create dir {}", parent.display()))?;
    }
    let raw = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, raw).with_context(|| format!("write {}", path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let cfg = parse(
            r#"
[genius]
access_token = "abc"

[retry]
max_retries = 5
"#,
        )
        .unwrap();
        assert_eq!(cfg.genius.access_token.as_deref(), Some("abc"));
        assert_eq!(cfg.genius.base_url, GeniusClient::DEFAULT_BASE_URL);
        assert_eq!(cfg.retry.max_retries, 5);
        assert_eq!(cfg.retry.max_candidates, 3);
        assert_eq!(cfg.trending.cache, CacheBackend::Sqlite);
    }

    #[test]
    fn test_policy_from_config() {
        let retry = RetryConfig {
            delay_ms: 250,
            max_candidates: 0,
            ..RetryConfig::default()
        };
        let policy = retry.policy();
        assert_eq!(policy.delay, Duration::from_millis(250));
        assert_eq!(policy.max_candidates, 1);
        assert_eq!(policy.max_retries, 2);
    }

    #[test]
    fn test_policy_caps_retries() {
        let retry = RetryConfig {
            max_retries: u32::MAX,
            ..RetryConfig::default()
        };
        assert_eq!(retry.policy().max_retries, RetryPolicy::MAX_RETRIES);

        let retry = RetryConfig {
            max_retries: 0,
            ..RetryConfig::default()
        };
        assert_eq!(retry.policy().max_retries, 0);
    }

    #[test]
    fn test_defaults_round_trip_through_toml() {
        let raw = toml::to_string_pretty(&Config::default()).unwrap();
        let cfg = parse(&raw).unwrap();
        assert_eq!(cfg.fetch.timeout_secs, 12);
        assert_eq!(cfg.trending.ttl_secs, 300);
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        assert!(parse("[trending]\ncache = \"redis\"\n").is_err());
    }
}
