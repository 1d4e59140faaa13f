//! Ranking of provider results for one query.

use crate::lyrics::{LyricResult, Timeline};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;

const SYLLABLE_BONUS: i32 = 30;
const TIMESTAMP_BONUS: i32 = 20;
const EXACT_TITLE_BONUS: i32 = 50;
const CLEAN_TITLE_BONUS: i32 = 20;
const TITLE_MISMATCH_PENALTY: i32 = -50;
const UNKNOWN_TITLE_PENALTY: i32 = -10;
const INSTRUMENTAL_PENALTY: i32 = -100;

/// Bodies longer than this are real lyrics even if they mention an instrumental part
pub const INSTRUMENTAL_MAX_LINES: usize = 3;

/// Any LRC-like stamp, including `[m:ss:xx]` variants
#[allow(clippy::expect_used)]
static TIMESTAMP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\d{1,2}[.:]\d{1,2}[.:]\d{1,3}]").expect("valid timestamp regex")
});

#[allow(clippy::expect_used)]
static BRACKETED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(.*?\)|\[.*?\]").expect("valid bracket regex"));

#[allow(clippy::expect_used)]
static NOISE_WORDS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:feat|ft)\.|\b(?:radio edit|remix|version|live|cover|mix)\b")
        .expect("valid title noise regex")
});

#[allow(clippy::expect_used)]
static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Phrases providers put in place of lyrics for instrumental tracks
#[allow(clippy::expect_used)]
static INSTRUMENTAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)纯音乐|instrumental|no lyrics|请欣赏|没有歌词").expect("valid instrumental regex")
});

/// Strip bracketed parts and version noise from a title.
///
/// `"Song (Live) [Remastered] feat. X"` becomes `"Song X"`: bracketed content
/// goes first, then the words feat., ft., remix, version, live, cover,
/// radio edit and mix, then runs of whitespace collapse.
#[must_use]
pub fn clean_title(title: &str) -> String {
    let without_brackets = BRACKETED_RE.replace_all(title, " ");
    let without_noise = NOISE_WORDS_RE.replace_all(&without_brackets, "");
    WHITESPACE_RE
        .replace_all(without_noise.trim(), " ")
        .into_owned()
}

/// Whether `text` announces an instrumental track instead of lyrics
#[must_use]
pub fn is_instrumental_text(text: &str) -> bool {
    INSTRUMENTAL_RE.is_match(text)
}

/// Whether a body of `line_count` lines stands in for lyrics on an
/// instrumental track.
///
/// Only short bodies count, so an `(Instrumental)` interlude inside a full
/// song does not.
#[must_use]
pub fn announces_instrumental(text: &str, line_count: usize) -> bool {
    line_count <= INSTRUMENTAL_MAX_LINES && is_instrumental_text(text)
}

/// Whether `text` carries any recognizable timestamp tag
#[must_use]
pub fn has_timestamp(text: &str) -> bool {
    TIMESTAMP_RE.is_match(text)
}

/// Score `result` against the queried title.
///
/// `trust_bias` is the provider's fixed preference for this kind of result.
#[must_use]
pub fn score_result(result: &LyricResult, query_title: &str, trust_bias: i32) -> i32 {
    let raw = result.raw_text.as_deref().unwrap_or_default();
    let mut score = trust_bias;

    if result.has_syllable_timing {
        score += SYLLABLE_BONUS;
    }
    if result.has_syllable_timing || has_timestamp(raw) {
        score += TIMESTAMP_BONUS;
    }

    score += match result.matched_title.as_deref() {
        Some(matched) if matched.to_lowercase() == query_title.to_lowercase() => EXACT_TITLE_BONUS,
        Some(matched) => {
            if clean_title(matched).to_lowercase() == clean_title(query_title).to_lowercase() {
                CLEAN_TITLE_BONUS
            } else {
                TITLE_MISMATCH_PENALTY
            }
        }
        None => UNKNOWN_TITLE_PENALTY,
    };

    let line_count = result.timeline.as_ref().map_or(0, Timeline::len);
    if result.instrumental || announces_instrumental(raw, line_count) {
        score += INSTRUMENTAL_PENALTY;
    }

    score
}

/// Ordering for ranked results: higher score first, then syllable timing
#[must_use]
pub fn rank(a: &LyricResult, b: &LyricResult) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| b.has_syllable_timing.cmp(&a.has_syllable_timing))
}
