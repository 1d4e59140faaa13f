use crate::error::CoreError;
use crate::lyrics::LyricResult;
use crate::time::DurationExt;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{error, warn};

const LOG_TARGET: &str = "islandlyrics::provider";

/// How far a search hit's duration may stray from the hint and still be preferred
pub const DURATION_TOLERANCE: Duration = Duration::from_secs(3);

/// Query parameters for fetching lyrics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricsQuery {
    pub title: String,
    pub artist: String,
    /// Track length, used to choose between search hits
    pub duration: Option<Duration>,
}

impl LyricsQuery {
    /// Create a new lyrics query
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            duration: None,
        }
    }

    /// Set the duration hint
    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Same query with a different title
    #[must_use]
    pub fn with_title(&self, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..self.clone()
        }
    }

    /// `title artist`, the keyword most search endpoints expect
    #[must_use]
    pub fn keyword(&self) -> String {
        if self.artist.is_empty() {
            self.title.clone()
        } else {
            format!("{} {}", self.title, self.artist)
        }
    }
}

/// Trait for lyrics providers
#[async_trait]
pub trait LyricsProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &'static str;

    /// Fixed score bonus for results from this provider
    fn trust_bias(&self, has_syllable_timing: bool) -> i32;

    /// Search, resolve and download lyrics for `query`.
    ///
    /// A song that was found but has no usable lyrics is an `Ok` result with
    /// `error` set, so the matched title survives.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failures or unexpected payloads.
    async fn lookup(&self, query: &LyricsQuery) -> Result<LyricResult, CoreError>;

    /// [`lookup`](Self::lookup) with every error folded into the result
    async fn fetch(&self, query: &LyricsQuery) -> LyricResult {
        match self.lookup(query).await {
            Ok(result) => result,
            Err(e) => {
                if e.is_network() {
                    warn!(target: LOG_TARGET, "Provider {} unreachable: {}", self.name(), e);
                } else {
                    error!(target: LOG_TARGET, "Provider {} failed: {}", self.name(), e);
                }
                LyricResult::failed(self.name(), e.to_string())
            }
        }
    }
}

/// Pick the search hit whose duration is within [`DURATION_TOLERANCE`] of the
/// hint, falling back to the first hit.
pub fn select_by_duration<T>(
    hits: &[T],
    hint: Option<Duration>,
    duration_of: impl Fn(&T) -> Option<Duration>,
) -> Option<&T> {
    hint.and_then(|hint| {
        hits.iter().find(|hit| {
            duration_of(hit).is_some_and(|d| d.is_near(hint, DURATION_TOLERANCE))
        })
    })
    .or_else(|| hits.first())
}
