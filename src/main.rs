mod cache;
mod config;
mod error;
mod genius;
mod lyrics;
mod storage;
mod trending;
mod youtube;

use anyhow::Context;
use cache::{MemoryCache, TtlCache};
use clap::{Parser, Subcommand};
use config::{CacheBackend, Config};
use genius::{GeniusClient, SearchQuery, SearchResult, SongSearch};
use lyrics::{HttpPageFetcher, LyricsExtractor, LyricsPipeline, RetrievalOutcome};
use std::sync::Arc;
use std::time::Duration;
use trending::{DeezerChartClient, TrendingService, TrendingSong};

#[derive(Debug, Parser)]
#[command(name = "lyricsense", version, about = "Song search and lyrics retrieval (headless)")]
struct Cli {
    /// Override config file path.
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Genius access token; overrides the config file.
    #[arg(long, env = "GENIUS_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// YouTube Data API key; overrides the config file.
    #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true)]
    youtube_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search songs and print the candidates.
    Search {
        title: String,
        #[arg(long, default_value = "")]
        artist: String,
        /// Print the results as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Find lyrics by title and artist.
    Lyrics {
        title: String,
        #[arg(long, default_value = "")]
        artist: String,
        /// Send title and artist as typed instead of normalizing them.
        #[arg(long)]
        no_optimize: bool,
    },
    /// Extract lyrics from a lyrics page URL.
    LyricsUrl { url: String },
    /// Print the top match for a title together with its lyrics.
    Song {
        title: String,
        #[arg(long, default_value = "")]
        artist: String,
    },
    /// Look a song up by Genius id and print its lyrics.
    SongId { id: u64 },
    /// Print the album art URL of the top match.
    AlbumArt {
        title: String,
        #[arg(long, default_value = "")]
        artist: String,
    },
    /// Print the current trending chart.
    Trending {
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Print an embeddable video URL for a song.
    Video {
        title: String,
        #[arg(long, default_value = "")]
        artist: String,
    },
    /// Store or clear the Genius access token in the config file.
    Auth {
        #[command(subcommand)]
        cmd: AuthCommand,
    },
}

#[derive(Debug, Subcommand)]
enum AuthCommand {
    /// Save a Genius client access token.
    Set { token: String },
    /// Remove the saved token.
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref()).context("load config")?;

    match cli.command {
        Command::Search { title, artist, json } => {
            let client = make_genius(&cfg, cli.token.as_deref())?;
            let query = SearchQuery::new(title, artist).optimized(true);
            let results = client.search(&query).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else if results.is_empty() {
                println!("No results.");
            } else {
                print_results(&results);
            }
        }
        Command::Lyrics {
            title,
            artist,
            no_optimize,
        } => {
            let pipeline = make_pipeline(&cfg, Arc::new(make_genius(&cfg, cli.token.as_deref())?))?;
            let query = SearchQuery::new(title, artist).optimized(!no_optimize);
            report(pipeline.retrieve(query).await)?;
        }
        Command::LyricsUrl { url } => {
            // Direct extraction never touches the search API, so no token is needed.
            let client = GeniusClient::new("", &cfg.genius.base_url, cfg.fetch.timeout())?;
            let pipeline = make_pipeline(&cfg, Arc::new(client))?;
            report(pipeline.retrieve(url).await)?;
        }
        Command::Song { title, artist } => {
            let pipeline = make_pipeline(&cfg, Arc::new(make_genius(&cfg, cli.token.as_deref())?))?;
            let query = SearchQuery::new(title, artist).optimized(true);
            match pipeline.song_with_lyrics(&query).await? {
                Some(song) => {
                    print_results(std::slice::from_ref(&song.song));
                    println!();
                    report(song.lyrics)?;
                }
                None => println!("No results."),
            }
        }
        Command::SongId { id } => {
            let client = Arc::new(make_genius(&cfg, cli.token.as_deref())?);
            let Some(song) = client.song(id).await? else {
                println!("No song with id {id}.");
                return Ok(());
            };
            print_results(std::slice::from_ref(&song));
            println!();
            let pipeline = make_pipeline(&cfg, client)?;
            report(pipeline.retrieve(song.detail_url).await)?;
        }
        Command::AlbumArt { title, artist } => {
            let client = make_genius(&cfg, cli.token.as_deref())?;
            let query = SearchQuery::new(title, artist).optimized(true);
            match genius::album_art(&client, &query).await? {
                Some(url) => println!("{url}"),
                None => println!("No album art found."),
            }
        }
        Command::Trending { limit, json } => {
            let service = make_trending(&cfg)?;
            let songs = service.trending(limit.unwrap_or(cfg.trending.limit)).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&songs)?);
            } else {
                print_trending(&songs);
            }
        }
        Command::Video { title, artist } => {
            let key = cli
                .youtube_key
                .as_deref()
                .or(cfg.youtube.api_key.as_deref())
                .context("no YouTube API key; pass --youtube-key or set youtube.api_key")?;
            let yt = youtube::YoutubeClient::new(key, &cfg.youtube.base_url, cfg.fetch.timeout())?;
            match yt.embed_url(&title, &artist).await? {
                Some(url) => println!("{url}"),
                None => println!("No video found."),
            }
        }
        Command::Auth { cmd } => {
            let mut cfg = cfg;
            match cmd {
                AuthCommand::Set { token } => cfg.genius.access_token = Some(token),
                AuthCommand::Clear => cfg.genius.access_token = None,
            }
            config::save(&cfg, cli.config.as_deref()).context("save config")?;
            println!("Updated config auth settings.");
        }
    }

    Ok(())
}

fn make_genius(cfg: &Config, token_override: Option<&str>) -> anyhow::Result<GeniusClient> {
    let token = token_override
        .or(cfg.genius.access_token.as_deref())
        .filter(|t| !t.trim().is_empty())
        .context("no Genius access token; run `lyricsense auth set <token>` or set GENIUS_ACCESS_TOKEN")?;
    GeniusClient::new(token, &cfg.genius.base_url, cfg.fetch.timeout())
}

fn make_pipeline(cfg: &Config, genius: Arc<GeniusClient>) -> anyhow::Result<LyricsPipeline> {
    let fetcher = Arc::new(HttpPageFetcher::new(
        &cfg.fetch.user_agent,
        cfg.fetch.timeout(),
    )?);
    let cascade = lyrics::strategies::default_cascade(&cfg.extractor.extra_selectors)
        .context("build extraction cascade")?;
    let extractor = LyricsExtractor::new(fetcher, cascade, cfg.extractor.min_lyrics_chars);
    Ok(LyricsPipeline::new(genius, extractor, cfg.retry.policy()))
}

fn make_trending(cfg: &Config) -> anyhow::Result<TrendingService> {
    let source = DeezerChartClient::new(&cfg.trending.base_url, cfg.fetch.timeout())?;
    let cache: Arc<dyn TtlCache<Vec<TrendingSong>>> = match cfg.trending.cache {
        CacheBackend::Memory => Arc::new(MemoryCache::<Vec<TrendingSong>>::new(16)),
        CacheBackend::Sqlite => {
            let path = cfg.paths.data_dir.join("cache.sqlite3");
            let cache = storage::SqliteCache::<Vec<TrendingSong>>::open(&path)?;
            if let Err(e) = cache.purge_expired() {
                tracing::warn!("purge expired cache entries: {e:#}");
            }
            Arc::new(cache)
        }
    };
    Ok(TrendingService::new(
        Arc::new(source),
        cache,
        Duration::from_secs(cfg.trending.ttl_secs),
    ))
}

fn report(outcome: RetrievalOutcome) -> anyhow::Result<()> {
    match outcome {
        RetrievalOutcome::Found(doc) => {
            println!("{}", doc.text);
            eprintln!("source: {}", doc.source_url);
            Ok(())
        }
        RetrievalOutcome::NotFound => {
            println!("No lyrics found.");
            Ok(())
        }
        RetrievalOutcome::Failed(e) => Err(e).context("lyrics retrieval failed"),
    }
}

fn print_results(results: &[SearchResult]) {
    for (i, r) in results.iter().enumerate() {
        println!("{:02}. {}  (id={})", i + 1, r.full_title, r.id);
        println!("    {}", r.detail_url);
    }
}

fn print_trending(songs: &[TrendingSong]) {
    for s in songs {
        println!("{:02}. {} — {}", s.rank, s.title, s.artist);
    }
}
