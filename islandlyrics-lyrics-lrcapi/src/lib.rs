mod config;

pub use config::{
    LrcApiProviderConfig, CONFIG_TEMPLATE as LRCAPI_CONFIG_TEMPLATE, DEFAULT_BASE_URL,
    PROVIDER_NAME,
};

use async_trait::async_trait;
use islandlyrics_core::{
    build_client, parse_krc, parse_lrc, CoreError, HttpConfig, LyricResult, LyricsProvider,
    LyricsQuery,
};
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{info, warn};

const LOG_TARGET: &str = "islandlyrics::provider::lrcapi";

const NOT_FOUND_MARKER: &str = "Lyrics not found";

/// LrcApi lyrics provider: one request, plain LRC or KRC text back
pub struct LrcApiProvider {
    client: ClientWithMiddleware,
    config: LrcApiProviderConfig,
}

impl LrcApiProvider {
    /// Create a new LrcApi provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured endpoint is empty or the HTTP client
    /// cannot be created.
    pub fn new(http: &HttpConfig, config: LrcApiProviderConfig) -> Result<Self, CoreError> {
        config.validate()?;
        Ok(Self {
            client: build_client(http)?,
            config,
        })
    }

    fn lyrics_url(&self, query: &LyricsQuery) -> String {
        format!(
            "{}?title={}&artist={}",
            self.config.base_url.trim_end_matches('?'),
            urlencoding::encode(&query.title),
            urlencoding::encode(&query.artist)
        )
    }
}

/// JSON error body, e.g. `{"detail": "Not Found"}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// Syllable-timed bodies start with a `[digit` line header and carry spans
fn looks_like_krc(body: &str) -> bool {
    let mut chars = body.chars();
    body.contains('<')
        && body.contains('>')
        && chars.next() == Some('[')
        && chars.next().is_some_and(|c| c.is_ascii_digit())
}

/// Turn a response body into a result
fn interpret_body(body: &str) -> LyricResult {
    if body.trim_start().starts_with('{') {
        if let Ok(error) = serde_json::from_str::<ErrorBody>(body) {
            let detail = match error.detail {
                serde_json::Value::String(detail) => detail,
                other => other.to_string(),
            };
            info!(target: LOG_TARGET, "LrcApi has no lyrics: {}", detail);
            return LyricResult::failed(PROVIDER_NAME, format!("not found: {detail}"));
        }
    }

    if body.trim().is_empty() || body.contains(NOT_FOUND_MARKER) {
        return LyricResult::failed(PROVIDER_NAME, "lyrics not found");
    }

    let timeline = if looks_like_krc(body) {
        parse_krc(body)
    } else {
        parse_lrc(body)
    };
    LyricResult::found(PROVIDER_NAME, body, timeline)
}

#[async_trait]
impl LyricsProvider for LrcApiProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn trust_bias(&self, _has_syllable_timing: bool) -> i32 {
        self.config.trust_bias
    }

    async fn lookup(&self, query: &LyricsQuery) -> Result<LyricResult, CoreError> {
        let url = self.lyrics_url(query);
        info!(target: LOG_TARGET, "LrcApi GET: {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        info!(target: LOG_TARGET, "LrcApi response status: {}", status);

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(interpret_body(&response.text().await?));
        }
        if !status.is_success() {
            warn!(target: LOG_TARGET, "LrcApi returned status: {}", status);
            return Err(CoreError::HttpStatus {
                provider: PROVIDER_NAME.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(interpret_body(&response.text().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lrc_body() {
        let result = interpret_body("[ti:晴天]\n[00:01.00]故事的小黄花\n[00:04.50]从出生那年就飘着");
        assert!(result.is_usable());
        assert!(!result.has_syllable_timing);
        assert_eq!(result.provider, "lrcapi");
        assert!(result.matched_title.is_none());
    }

    #[test]
    fn test_krc_body() {
        let result = interpret_body("[1000,1500]<0,500,0>故<500,500,0>事<1000,500,0>的");
        assert!(result.is_usable());
        assert!(result.has_syllable_timing);
    }

    #[test]
    fn test_krc_shape_requires_leading_header() {
        // Angle brackets inside an LRC line do not make it KRC
        assert!(!looks_like_krc("[00:01.00]<3 you"));
        assert!(!looks_like_krc("intro\n[1000,1500]<0,500,0>a"));
        assert!(looks_like_krc("[1000,1500]<0,500,0>a"));

        let result = interpret_body("[00:01.00]<3 you");
        assert!(result.is_usable());
        assert!(!result.has_syllable_timing);
    }

    #[test]
    fn test_detail_body_is_not_found() {
        let result = interpret_body(r#"{"detail": "Not Found"}"#);
        assert_eq!(result.error.as_deref(), Some("not found: Not Found"));
        assert!(result.timeline.is_none());

        let result = interpret_body(r#"{"detail": [{"msg": "field required"}]}"#);
        assert!(!result.is_usable());
    }

    #[test]
    fn test_not_found_text() {
        assert!(!interpret_body("Lyrics not found.").is_usable());
        assert!(!interpret_body("   ").is_usable());
    }

    #[test]
    fn test_lyrics_url() {
        let provider = LrcApiProvider::new(&HttpConfig::default(), LrcApiProviderConfig::default())
            .unwrap();
        assert_eq!(
            provider.lyrics_url(&LyricsQuery::new("晴天", "周杰伦")),
            "https://api.lrc.cx/lyrics?title=%E6%99%B4%E5%A4%A9&artist=%E5%91%A8%E6%9D%B0%E4%BC%A6"
        );
        assert_eq!(provider.trust_bias(false), 55);
    }
}
