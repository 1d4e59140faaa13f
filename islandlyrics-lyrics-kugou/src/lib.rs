mod cipher;
mod config;

pub use cipher::{decode_krc, try_decode_krc};
pub use config::{KugouProviderConfig, CONFIG_TEMPLATE as KUGOU_CONFIG_TEMPLATE, PROVIDER_NAME};

use async_trait::async_trait;
use islandlyrics_core::{
    build_client, select_by_duration, CoreError, HttpConfig, LyricFormat, LyricResult,
    LyricsProvider, LyricsQuery,
};
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

const LOG_TARGET: &str = "islandlyrics::provider::kugou";

const SEARCH_URL: &str = "https://mobilecdn.kugou.com/api/v3/search/song";
const CANDIDATES_URL: &str = "https://lyrics.kugou.com/search";
const DOWNLOAD_URL: &str = "https://lyrics.kugou.com/download";

/// Kugou lyrics provider: song search, lyric candidate lookup, KRC download
pub struct KugouProvider {
    client: ClientWithMiddleware,
    config: KugouProviderConfig,
}

impl KugouProvider {
    /// Create a new Kugou provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(http: &HttpConfig, config: KugouProviderConfig) -> Result<Self, CoreError> {
        Ok(Self {
            client: build_client(http)?,
            config,
        })
    }
}

/// Response from the song search endpoint
#[derive(Debug, Deserialize)]
struct SearchResponse {
    data: Option<SearchData>,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    #[serde(default)]
    info: Vec<SongHit>,
}

#[derive(Debug, Clone, Deserialize)]
struct SongHit {
    #[serde(default)]
    songname: String,
    #[serde(default)]
    singername: String,
    #[serde(default)]
    hash: String,
    /// Track length in seconds, 0 when unknown
    duration: Option<u64>,
}

impl SongHit {
    fn duration(&self) -> Option<Duration> {
        self.duration
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// Response from the lyric candidate endpoint
#[derive(Debug, Deserialize)]
struct CandidatesResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    id: Option<CandidateId>,
    #[serde(default)]
    accesskey: String,
    /// Some candidates embed the payload directly
    #[serde(default)]
    content: String,
}

/// Candidate ids arrive as strings or numbers depending on the endpoint version
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CandidateId {
    Text(String),
    Number(u64),
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(id) => f.write_str(id),
            Self::Number(id) => write!(f, "{id}"),
        }
    }
}

/// Response from the download endpoint
#[derive(Debug, Deserialize)]
struct DownloadResponse {
    #[serde(default)]
    content: String,
}

fn search_url(keyword: &str) -> String {
    format!(
        "{SEARCH_URL}?format=json&keyword={}&page=1&pagesize=20&showtype=1",
        urlencoding::encode(keyword)
    )
}

fn candidates_url(hash: &str) -> String {
    format!(
        "{CANDIDATES_URL}?ver=1&man=yes&client=pc&keyword=&duration=&hash={}",
        urlencoding::encode(hash)
    )
}

fn download_url(id: &CandidateId, accesskey: &str) -> String {
    format!(
        "{DOWNLOAD_URL}?ver=1&client=pc&id={}&accesskey={}&fmt=krc&charset=utf8",
        urlencoding::encode(&id.to_string()),
        urlencoding::encode(accesskey)
    )
}

fn parse_search(body: &str) -> Result<Vec<SongHit>, CoreError> {
    let response: SearchResponse = serde_json::from_str(body)?;
    Ok(response.data.map(|data| data.info).unwrap_or_default())
}

fn parse_candidate(body: &str) -> Result<Option<Candidate>, CoreError> {
    let response: CandidatesResponse = serde_json::from_str(body)?;
    Ok(response.candidates.into_iter().next())
}

fn parse_download(body: &str) -> Result<String, CoreError> {
    let response: DownloadResponse = serde_json::from_str(body)?;
    Ok(response.content)
}

/// Decode a payload and parse it with the format its content suggests
fn build_result(encoded: &str) -> LyricResult {
    let body = decode_krc(encoded);
    let timeline = LyricFormat::detect(&body).parse(&body);
    LyricResult::found(PROVIDER_NAME, body, timeline)
}

impl KugouProvider {
    async fn get_text(&self, url: &str) -> Result<String, CoreError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        debug!(target: LOG_TARGET, "Kugou response status: {}", status);

        if !status.is_success() {
            return Err(CoreError::HttpStatus {
                provider: PROVIDER_NAME.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }

    /// Candidate lookup and download for a search hit
    async fn lyrics_for(&self, hit: &SongHit) -> Result<LyricResult, CoreError> {
        if hit.hash.is_empty() {
            return Ok(LyricResult::failed(PROVIDER_NAME, "search hit has no hash"));
        }

        let url = candidates_url(&hit.hash);
        info!(target: LOG_TARGET, "Kugou GET (candidates): {}", url);
        let Some(candidate) = parse_candidate(&self.get_text(&url).await?)? else {
            return Ok(LyricResult::failed(PROVIDER_NAME, "no lyric candidates"));
        };

        let mut encoded = candidate.content;
        if encoded.is_empty() && !candidate.accesskey.is_empty() {
            if let Some(id) = &candidate.id {
                let url = download_url(id, &candidate.accesskey);
                info!(target: LOG_TARGET, "Kugou GET (download): {}", url);
                match self.get_text(&url).await.and_then(|body| parse_download(&body)) {
                    Ok(content) => encoded = content,
                    Err(e) => warn!(target: LOG_TARGET, "Kugou download failed: {}", e),
                }
            }
        }

        if encoded.is_empty() {
            return Ok(LyricResult::failed(PROVIDER_NAME, "lyric content is empty"));
        }
        Ok(build_result(&encoded))
    }
}

#[async_trait]
impl LyricsProvider for KugouProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn trust_bias(&self, has_syllable_timing: bool) -> i32 {
        if has_syllable_timing {
            self.config.syllable_bias
        } else {
            self.config.plain_bias
        }
    }

    async fn lookup(&self, query: &LyricsQuery) -> Result<LyricResult, CoreError> {
        let url = search_url(&query.keyword());
        info!(target: LOG_TARGET, "Kugou GET (search): {}", url);

        let hits = parse_search(&self.get_text(&url).await?)?;
        let hit = select_by_duration(&hits, query.duration, SongHit::duration).ok_or_else(|| {
            CoreError::NoResult {
                title: query.title.clone(),
                artist: query.artist.clone(),
            }
        })?;
        info!(
            target: LOG_TARGET,
            "Kugou matched {} - {} (hash: {}, duration: {:?})",
            hit.singername,
            hit.songname,
            hit.hash,
            hit.duration
        );

        let result = match self.lyrics_for(hit).await {
            Ok(result) => result,
            Err(e) => {
                warn!(target: LOG_TARGET, "Kugou lyric lookup failed: {}", e);
                LyricResult::failed(PROVIDER_NAME, e.to_string())
            }
        };
        Ok(result.with_match(Some(hit.songname.clone()), Some(hit.singername.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_BODY: &str = r#"{
        "status": 1,
        "errcode": 0,
        "data": {
            "total": 2,
            "info": [
                {"songname": "晴天", "singername": "周杰伦", "hash": "AAA111", "duration": 269},
                {"songname": "晴天 (Live)", "singername": "周杰伦", "hash": "BBB222", "duration": 301}
            ]
        }
    }"#;

    #[test]
    fn test_parse_search() {
        let hits = parse_search(SEARCH_BODY).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].songname, "晴天");
        assert_eq!(hits[0].singername, "周杰伦");
        assert_eq!(hits[1].duration(), Some(Duration::from_secs(301)));

        let picked = select_by_duration(&hits, Some(Duration::from_secs(300)), SongHit::duration);
        assert_eq!(picked.map(|h| h.hash.as_str()), Some("BBB222"));
    }

    #[test]
    fn test_parse_search_without_data() {
        assert!(parse_search(r#"{"status": 0, "error": "bad"}"#)
            .unwrap()
            .is_empty());
        assert!(parse_search("<html>").is_err());
    }

    #[test]
    fn test_zero_duration_is_unknown() {
        let hits = parse_search(r#"{"data": {"info": [{"hash": "x", "duration": 0}]}}"#).unwrap();
        assert_eq!(hits[0].duration(), None);
    }

    #[test]
    fn test_parse_candidate_ids() {
        let candidate = parse_candidate(
            r#"{"status": 200, "candidates": [{"id": "12345", "accesskey": "ABCDEF", "duration": 269000}]}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(candidate.id.unwrap().to_string(), "12345");
        assert_eq!(candidate.accesskey, "ABCDEF");
        assert!(candidate.content.is_empty());

        let candidate = parse_candidate(r#"{"candidates": [{"id": 678, "accesskey": "K"}]}"#)
            .unwrap()
            .unwrap();
        assert_eq!(candidate.id.unwrap().to_string(), "678");

        assert!(parse_candidate(r#"{"candidates": []}"#).unwrap().is_none());
    }

    #[test]
    fn test_parse_download() {
        let content = parse_download(r#"{"status": 200, "fmt": "krc", "content": "a3JjMQ=="}"#);
        assert_eq!(content.unwrap(), "a3JjMQ==");
    }

    #[test]
    fn test_urls() {
        assert_eq!(
            search_url("晴天 周杰伦"),
            "https://mobilecdn.kugou.com/api/v3/search/song?format=json&keyword=%E6%99%B4%E5%A4%A9%20%E5%91%A8%E6%9D%B0%E4%BC%A6&page=1&pagesize=20&showtype=1"
        );
        assert_eq!(
            download_url(&CandidateId::Number(1), "K"),
            "https://lyrics.kugou.com/download?ver=1&client=pc&id=1&accesskey=K&fmt=krc&charset=utf8"
        );
        assert!(candidates_url("AAA111").ends_with("&hash=AAA111"));
    }

    #[test]
    fn test_build_result_detects_format() {
        // Undecodable payloads are parsed as they are
        let krc = build_result("[1000,1000]<0,500,0>晴<500,500,0>天");
        assert!(krc.is_usable());
        assert!(krc.has_syllable_timing);

        let lrc = build_result("[00:01.00]晴天");
        assert!(lrc.is_usable());
        assert!(!lrc.has_syllable_timing);
    }

    #[test]
    fn test_trust_bias() {
        let provider = KugouProvider::new(&HttpConfig::default(), KugouProviderConfig::default())
            .unwrap();
        assert_eq!(provider.trust_bias(true), 10);
        assert_eq!(provider.trust_bias(false), 5);
        assert_eq!(provider.name(), "kugou");
    }
}
