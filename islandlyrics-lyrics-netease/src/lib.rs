mod config;

pub use config::{
    NeteaseProviderConfig, CONFIG_TEMPLATE as NETEASE_CONFIG_TEMPLATE, PROVIDER_NAME,
};

use async_trait::async_trait;
use islandlyrics_core::scoring::announces_instrumental;
use islandlyrics_core::{
    build_client, parse_lrc, select_by_duration, CoreError, HttpConfig, LyricResult,
    LyricsProvider, LyricsQuery,
};
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

const LOG_TARGET: &str = "islandlyrics::provider::netease";

const SEARCH_URL: &str = "https://music.163.com/api/search/get";
const LYRIC_URL: &str = "https://music.163.com/api/song/lyric";

/// Netease Cloud Music lyrics provider
pub struct NeteaseProvider {
    client: ClientWithMiddleware,
    config: NeteaseProviderConfig,
}

impl NeteaseProvider {
    /// Create a new Netease provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(http: &HttpConfig, config: NeteaseProviderConfig) -> Result<Self, CoreError> {
        Ok(Self {
            client: build_client(http)?,
            config,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    result: Option<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    songs: Vec<Song>,
}

#[derive(Debug, Deserialize)]
struct Song {
    #[serde(default)]
    id: u64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    artists: Vec<Artist>,
    /// Track length in milliseconds
    duration: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Artist {
    #[serde(default)]
    name: String,
}

impl Song {
    fn duration(&self) -> Option<Duration> {
        self.duration.filter(|ms| *ms > 0).map(Duration::from_millis)
    }

    fn first_artist(&self) -> Option<String> {
        self.artists.first().map(|a| a.name.clone())
    }
}

/// Response from the lyric endpoint
#[derive(Debug, Deserialize)]
struct LyricResponse {
    lrc: Option<LyricBody>,
    /// The track is known to have no lyrics
    #[serde(default)]
    nolyric: bool,
    /// Nobody has submitted lyrics for the track yet
    #[serde(default)]
    uncollected: bool,
}

#[derive(Debug, Deserialize)]
struct LyricBody {
    #[serde(default)]
    lyric: String,
}

fn search_url(keyword: &str, limit: u32) -> String {
    format!(
        "{SEARCH_URL}?s={}&type=1&limit={limit}",
        urlencoding::encode(keyword)
    )
}

fn lyric_url(id: u64) -> String {
    format!("{LYRIC_URL}?id={id}&lv=-1&tv=-1")
}

fn parse_search(body: &str) -> Result<Vec<Song>, CoreError> {
    let response: SearchResponse = serde_json::from_str(body)?;
    Ok(response.result.map(|r| r.songs).unwrap_or_default())
}

fn instrumental(reason: &str) -> LyricResult {
    let mut result = LyricResult::failed(PROVIDER_NAME, reason);
    result.instrumental = true;
    result
}

/// Turn a lyric endpoint body into a result
fn interpret_lyric(body: &str) -> Result<LyricResult, CoreError> {
    let response: LyricResponse = serde_json::from_str(body)?;
    if response.nolyric || response.uncollected {
        return Ok(instrumental("track has no lyrics"));
    }

    let lyric = response.lrc.map(|l| l.lyric).unwrap_or_default();
    if lyric.trim().is_empty() {
        return Ok(LyricResult::failed(PROVIDER_NAME, "lyric body is empty"));
    }

    let timeline = parse_lrc(&lyric);
    if announces_instrumental(&lyric, timeline.len()) {
        debug!(target: LOG_TARGET, "Lyric body announces an instrumental track");
        return Ok(instrumental("instrumental track"));
    }

    Ok(LyricResult::found(PROVIDER_NAME, lyric, timeline))
}

impl NeteaseProvider {
    async fn get_text(&self, url: &str) -> Result<String, CoreError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        debug!(target: LOG_TARGET, "Netease response status: {}", status);

        if !status.is_success() {
            return Err(CoreError::HttpStatus {
                provider: PROVIDER_NAME.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }

    async fn lyrics_for(&self, song: &Song) -> Result<LyricResult, CoreError> {
        if song.id == 0 {
            return Ok(LyricResult::failed(PROVIDER_NAME, "search hit has no id"));
        }
        let url = lyric_url(song.id);
        info!(target: LOG_TARGET, "Netease GET (lyric): {}", url);
        interpret_lyric(&self.get_text(&url).await?)
    }
}

#[async_trait]
impl LyricsProvider for NeteaseProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn trust_bias(&self, _has_syllable_timing: bool) -> i32 {
        self.config.trust_bias
    }

    async fn lookup(&self, query: &LyricsQuery) -> Result<LyricResult, CoreError> {
        let url = search_url(&query.keyword(), self.config.search_limit);
        info!(target: LOG_TARGET, "Netease GET (search): {}", url);

        let songs = parse_search(&self.get_text(&url).await?)?;
        let song = select_by_duration(&songs, query.duration, Song::duration).ok_or_else(|| {
            CoreError::NoResult {
                title: query.title.clone(),
                artist: query.artist.clone(),
            }
        })?;
        info!(
            target: LOG_TARGET,
            "Netease matched {:?} - {} (id: {})",
            song.first_artist(),
            song.name,
            song.id
        );

        let result = self
            .lyrics_for(song)
            .await
            .unwrap_or_else(|e| LyricResult::failed(PROVIDER_NAME, e.to_string()));
        Ok(result.with_match(Some(song.name.clone()), song.first_artist()))
    }
}
