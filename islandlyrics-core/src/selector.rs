//! Racing every provider for one song and keeping the best answer.

use crate::config::FetchConfig;
use crate::lyrics::LyricResult;
use crate::provider::{LyricsProvider, LyricsQuery};
use crate::scoring::{clean_title, rank, score_result};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const LOG_TARGET: &str = "islandlyrics::selector";

/// Runs all providers concurrently under one deadline and ranks the results
pub struct LyricsSelector {
    providers: Vec<Arc<dyn LyricsProvider>>,
    deadline: Duration,
    retry_with_clean_title: bool,
}

impl LyricsSelector {
    #[must_use]
    pub fn new(providers: Vec<Arc<dyn LyricsProvider>>, config: &FetchConfig) -> Self {
        Self {
            providers,
            deadline: config.deadline(),
            retry_with_clean_title: config.retry_with_clean_title,
        }
    }

    /// Names of the registered providers
    pub fn provider_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.providers.iter().map(|p| p.name())
    }

    /// Best result for `query`, or `None` when nothing came back or `cancel`
    /// fired.
    ///
    /// The result is usable unless no provider had lyrics and one of them
    /// reported an instrumental track, in which case that verdict is returned.
    /// When the first round yields nothing usable and the cleaned title
    /// differs from the query title, a second round runs with the cleaned title.
    pub async fn select(
        &self,
        query: &LyricsQuery,
        cancel: &CancellationToken,
    ) -> Option<LyricResult> {
        let first = self.select_once(query, cancel).await;
        if first.as_ref().is_some_and(LyricResult::is_usable) {
            return first;
        }
        if cancel.is_cancelled() || !self.retry_with_clean_title {
            return first;
        }

        let cleaned = clean_title(&query.title);
        if cleaned.is_empty() || cleaned == query.title {
            return first;
        }

        info!(
            target: LOG_TARGET,
            "Nothing found for '{}', retrying as '{}'", query.title, cleaned
        );
        match self.select_once(&query.with_title(cleaned), cancel).await {
            Some(best) if best.is_usable() => Some(best),
            retried => first.or(retried),
        }
    }

    async fn select_once(
        &self,
        query: &LyricsQuery,
        cancel: &CancellationToken,
    ) -> Option<LyricResult> {
        let results = self.race(query, cancel).await;
        self.pick_best(results, &query.title)
    }

    /// Run every provider and collect what finished before the deadline.
    ///
    /// Returns the index of the provider alongside each result.
    async fn race(
        &self,
        query: &LyricsQuery,
        cancel: &CancellationToken,
    ) -> Vec<(usize, LyricResult)> {
        let mut tasks = JoinSet::new();
        for (index, provider) in self.providers.iter().enumerate() {
            let provider = Arc::clone(provider);
            let query = query.clone();
            tasks.spawn(async move { (index, provider.fetch(&query).await) });
        }

        let mut results = Vec::with_capacity(self.providers.len());
        let deadline = tokio::time::sleep(self.deadline);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!(target: LOG_TARGET, "Fetch cancelled, aborting {} task(s)", tasks.len());
                    tasks.abort_all();
                    return Vec::new();
                }
                () = &mut deadline => {
                    if !tasks.is_empty() {
                        warn!(
                            target: LOG_TARGET,
                            "Deadline of {}ms reached, abandoning {} provider(s)",
                            self.deadline.as_millis(),
                            tasks.len()
                        );
                    }
                    tasks.abort_all();
                    break;
                }
                joined = tasks.join_next() => match joined {
                    Some(Ok((index, result))) => {
                        debug!(
                            target: LOG_TARGET,
                            "{} finished (usable: {}, error: {:?})",
                            result.provider,
                            result.is_usable(),
                            result.error
                        );
                        results.push((index, result));
                    }
                    Some(Err(e)) => warn!(target: LOG_TARGET, "Provider task failed: {}", e),
                    None => break,
                },
            }
        }

        results
    }

    fn pick_best(&self, results: Vec<(usize, LyricResult)>, title: &str) -> Option<LyricResult> {
        let (usable, unusable): (Vec<_>, Vec<_>) = results
            .into_iter()
            .partition(|(_, result)| result.is_usable());

        let mut scored: Vec<LyricResult> = usable
            .into_iter()
            .filter_map(|(index, result)| {
                let provider = self.providers.get(index)?;
                let bias = provider.trust_bias(result.has_syllable_timing);
                let score = score_result(&result, title, bias);
                Some(result.with_score(score))
            })
            .collect();

        scored.sort_by(rank);
        for result in &scored {
            debug!(
                target: LOG_TARGET,
                "Candidate {}: score {}, syllables {}, matched {:?}",
                result.provider,
                result.score,
                result.has_syllable_timing,
                result.matched_title
            );
        }

        let Some(best) = scored.into_iter().next() else {
            return instrumental_verdict(unusable);
        };
        info!(
            target: LOG_TARGET,
            "Selected {} (score {}) for '{}'", best.provider, best.score, title
        );
        Some(best)
    }
}

/// The earliest registered provider's instrumental verdict, if any
fn instrumental_verdict(results: Vec<(usize, LyricResult)>) -> Option<LyricResult> {
    let (_, verdict) = results
        .into_iter()
        .filter(|(_, result)| result.instrumental)
        .min_by_key(|(index, _)| *index)?;
    info!(
        target: LOG_TARGET,
        "No lyrics found, {} reports an instrumental track", verdict.provider
    );
    Some(verdict)
}
