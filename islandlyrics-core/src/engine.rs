//! Song sessions: one lyric fetch per song, superseded by the next song.

use crate::config::{Config, FetchConfig, ScrollConfig};
use crate::lyrics::LyricResult;
use crate::presenter::Presenter;
use crate::provider::{LyricsProvider, LyricsQuery};
use crate::selector::LyricsSelector;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::info;

const LOG_TARGET: &str = "islandlyrics::engine";

/// Everything the engine needs, handed over at construction
pub struct EngineContext {
    pub fetch: FetchConfig,
    pub scroll: ScrollConfig,
    pub providers: Vec<Arc<dyn LyricsProvider>>,
}

impl EngineContext {
    #[must_use]
    pub fn new(config: &Config, providers: Vec<Arc<dyn LyricsProvider>>) -> Self {
        Self {
            fetch: config.fetch.clone(),
            scroll: config.scroll.clone(),
            providers,
        }
    }
}

/// Identifies one song request; a newer request always gets a larger tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SongTag(u64);

impl SongTag {
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

/// How a fetch for one song ended
#[derive(Debug)]
pub enum FetchOutcome {
    /// The best result for the song, still current
    Ready(Box<LyricResult>),
    /// No provider had lyrics and one reported an instrumental track
    Instrumental(Box<LyricResult>),
    /// No provider returned usable lyrics
    NotFound,
    /// A newer song started before the fetch finished
    Cancelled,
    /// The fetch finished but the song playing is no longer the one asked for
    Stale,
}

impl FetchOutcome {
    #[must_use]
    pub fn into_result(self) -> Option<LyricResult> {
        match self {
            Self::Ready(result) => Some(*result),
            _ => None,
        }
    }
}

struct Session {
    tag: SongTag,
    /// The song this session fetches for
    requested: Option<LyricsQuery>,
    now_playing: Option<LyricsQuery>,
    cancel: CancellationToken,
}

/// Lyric acquisition for the currently playing song
pub struct LyricsEngine {
    selector: LyricsSelector,
    scroll: ScrollConfig,
    session: Mutex<Session>,
}

impl LyricsEngine {
    #[must_use]
    pub fn new(context: EngineContext) -> Self {
        let selector = LyricsSelector::new(context.providers, &context.fetch);
        Self {
            selector,
            scroll: context.scroll,
            session: Mutex::new(Session {
                tag: SongTag(0),
                requested: None,
                now_playing: None,
                cancel: CancellationToken::new(),
            }),
        }
    }

    #[must_use]
    pub const fn selector(&self) -> &LyricsSelector {
        &self.selector
    }

    /// Start a session for `query`, cancelling any fetch still in flight
    pub async fn begin_song(&self, query: LyricsQuery) -> (SongTag, CancellationToken) {
        let mut session = self.session.lock().await;
        session.cancel.cancel();

        session.tag = SongTag(session.tag.0 + 1);
        session.cancel = CancellationToken::new();
        session.requested = Some(query.clone());
        session.now_playing = Some(query);

        (session.tag, session.cancel.clone())
    }

    /// Record what is playing now without starting a fetch.
    ///
    /// When the song no longer matches the one being fetched, the fetch in
    /// flight is cancelled and reported stale.
    pub async fn update_now_playing(&self, query: LyricsQuery) {
        let mut session = self.session.lock().await;
        let changed = session
            .requested
            .as_ref()
            .is_some_and(|requested| !same_song(requested, &query));
        if changed && !session.cancel.is_cancelled() {
            info!(
                target: LOG_TARGET,
                "Now playing {} - {}, cancelling session {}",
                query.artist,
                query.title,
                session.tag.value()
            );
            session.cancel.cancel();
        }
        session.now_playing = Some(query);
    }

    /// Whether `tag` is the latest session and still plays `query`'s song
    pub async fn is_current(&self, tag: SongTag, query: &LyricsQuery) -> bool {
        let session = self.session.lock().await;
        session.tag == tag
            && session
                .now_playing
                .as_ref()
                .is_some_and(|playing| same_song(playing, query))
    }

    /// Cancel the in-flight fetch, if any
    pub async fn cancel_current(&self) {
        self.session.lock().await.cancel.cancel();
    }

    /// Fetch lyrics for a new song
    pub async fn fetch(&self, query: LyricsQuery) -> FetchOutcome {
        let (tag, cancel) = self.begin_song(query.clone()).await;
        info!(
            target: LOG_TARGET,
            "Fetching lyrics for {} - {} (session {})",
            query.artist,
            query.title,
            tag.value()
        );

        let best = self.selector.select(&query, &cancel).await;

        if self.session.lock().await.tag != tag {
            info!(target: LOG_TARGET, "Session {} was superseded", tag.value());
            return FetchOutcome::Cancelled;
        }
        if !self.is_current(tag, &query).await {
            info!(target: LOG_TARGET, "Discarding stale result of session {}", tag.value());
            return FetchOutcome::Stale;
        }
        if cancel.is_cancelled() {
            info!(target: LOG_TARGET, "Session {} was cancelled", tag.value());
            return FetchOutcome::Cancelled;
        }

        match best {
            Some(result) if result.is_usable() => FetchOutcome::Ready(Box::new(result)),
            Some(result) => FetchOutcome::Instrumental(Box::new(result)),
            None => {
                info!(
                    target: LOG_TARGET,
                    "No lyrics found for {} - {}", query.artist, query.title
                );
                FetchOutcome::NotFound
            }
        }
    }

    /// A presenter for a fetched result, starting a fresh pacing history
    #[must_use]
    pub fn presenter(&self, result: LyricResult, now: Instant) -> Presenter {
        Presenter::new(result.timeline.unwrap_or_default(), self.scroll.clone(), now)
    }
}

fn same_song(a: &LyricsQuery, b: &LyricsQuery) -> bool {
    a.title == b.title && a.artist == b.artist
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::lrc::parse_lrc;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    struct Slow {
        delay: Duration,
        instrumental: bool,
        finished: Arc<AtomicBool>,
    }

    #[async_trait]
    impl LyricsProvider for Slow {
        fn name(&self) -> &'static str {
            "slow"
        }

        fn trust_bias(&self, _has_syllable_timing: bool) -> i32 {
            0
        }

        async fn lookup(&self, query: &LyricsQuery) -> Result<LyricResult, CoreError> {
            tokio::time::sleep(self.delay).await;
            self.finished.store(true, Ordering::SeqCst);
            if self.instrumental {
                let mut result = LyricResult::failed("slow", "track has no lyrics");
                result.instrumental = true;
                return Ok(result);
            }
            let body = "[00:01.00]Hello";
            Ok(LyricResult::found("slow", body, parse_lrc(body))
                .with_match(Some(query.title.clone()), None))
        }
    }

    fn engine_with(provider: Slow) -> Arc<LyricsEngine> {
        let context = EngineContext::new(
            &Config::default(),
            vec![Arc::new(provider) as Arc<dyn LyricsProvider>],
        );
        Arc::new(LyricsEngine::new(context))
    }

    fn slow(delay: Duration) -> Slow {
        Slow {
            delay,
            instrumental: false,
            finished: Arc::new(AtomicBool::new(false)),
        }
    }

    fn engine(delay: Duration) -> Arc<LyricsEngine> {
        engine_with(slow(delay))
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_ready() {
        let engine = engine(Duration::from_secs(1));
        let outcome = engine.fetch(LyricsQuery::new("Hello", "Artist")).await;
        let result = outcome.into_result().unwrap();
        assert_eq!(result.provider, "slow");
        assert!(result.is_usable());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_song_cancels_previous_fetch() {
        let engine = engine(Duration::from_secs(3));

        let first = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.fetch(LyricsQuery::new("First", "A")).await })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;

        let second = engine.fetch(LyricsQuery::new("Second", "B")).await;
        assert!(matches!(first.await.unwrap(), FetchOutcome::Cancelled));
        assert!(matches!(second, FetchOutcome::Ready(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_metadata_change_makes_result_stale() {
        let engine = engine(Duration::from_secs(3));

        let fetch = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.fetch(LyricsQuery::new("First", "A")).await })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;
        engine.update_now_playing(LyricsQuery::new("Other", "B")).await;

        assert!(matches!(fetch.await.unwrap(), FetchOutcome::Stale));
    }

    #[tokio::test(start_paused = true)]
    async fn test_metadata_change_stops_providers_mid_flight() {
        let provider = slow(Duration::from_secs(8));
        let finished = Arc::clone(&provider.finished);
        let engine = engine_with(provider);

        let start = tokio::time::Instant::now();
        let fetch = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.fetch(LyricsQuery::new("First", "A")).await })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;
        engine.update_now_playing(LyricsQuery::new("Other", "B")).await;

        assert!(matches!(fetch.await.unwrap(), FetchOutcome::Stale));
        assert!(start.elapsed() < Duration::from_secs(2));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_song_metadata_keeps_fetch_running() {
        let engine = engine(Duration::from_secs(2));
        let fetch = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.fetch(LyricsQuery::new("First", "A")).await })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;
        engine.update_now_playing(LyricsQuery::new("First", "A")).await;

        assert!(matches!(fetch.await.unwrap(), FetchOutcome::Ready(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_current_stops_fetch() {
        let provider = slow(Duration::from_secs(5));
        let finished = Arc::clone(&provider.finished);
        let engine = engine_with(provider);

        let fetch = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.fetch(LyricsQuery::new("First", "A")).await })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;
        engine.cancel_current().await;

        assert!(matches!(fetch.await.unwrap(), FetchOutcome::Cancelled));
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_reports_instrumental() {
        let engine = engine_with(Slow {
            instrumental: true,
            ..slow(Duration::ZERO)
        });
        let outcome = engine.fetch(LyricsQuery::new("Interlude", "A")).await;
        let result = match outcome {
            FetchOutcome::Instrumental(result) => Some(result),
            _ => None,
        }
        .unwrap();
        assert_eq!(result.provider, "slow");
        assert!(result.instrumental);
    }

    #[tokio::test]
    async fn test_tags_increase() {
        let engine = engine(Duration::ZERO);
        let (first, _) = engine.begin_song(LyricsQuery::new("a", "b")).await;
        let (second, _) = engine.begin_song(LyricsQuery::new("c", "d")).await;
        assert!(second > first);
        assert!(!engine.is_current(first, &LyricsQuery::new("a", "b")).await);
        assert!(engine.is_current(second, &LyricsQuery::new("c", "d")).await);
    }

    #[tokio::test]
    async fn test_presenter_from_result() {
        let engine = engine(Duration::ZERO);
        let body = "[00:01.00]Hello";
        let result = LyricResult::found("slow", body, parse_lrc(body));
        let mut presenter = engine.presenter(result, Instant::now());
        let frame = presenter.tick(Duration::from_millis(1500), Instant::now());
        assert_eq!(frame.scroll.display_text, "Hello");
    }
}
