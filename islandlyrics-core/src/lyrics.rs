//! Lyric data model shared by parsers, providers, the cursor and the pacer.

use std::time::Duration;

/// Fallback duration for a line with no natural successor.
pub const DEFAULT_LAST_LINE_DURATION: Duration = Duration::from_millis(5000);

/// Timing for a single syllable of a syllable-timed line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyllableInfo {
    pub start_time: Duration,
    pub end_time: Duration,
    pub text: String,
}

/// A single line of lyrics with timing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricLine {
    pub start_time: Duration,
    pub end_time: Duration,
    pub text: String,
    /// Syllable-level timing, present for KRC sources
    pub syllables: Option<Vec<SyllableInfo>>,
}

impl LyricLine {
    /// Create a line without syllable timing
    pub fn new(start_time: Duration, end_time: Duration, text: impl Into<String>) -> Self {
        Self {
            start_time,
            end_time,
            text: text.into(),
            syllables: None,
        }
    }

    /// Whether `position` falls in the half-open interval `[start, end)`
    #[must_use]
    pub fn contains(&self, position: Duration) -> bool {
        self.start_time <= position && position < self.end_time
    }

    /// Line duration (zero if the bounds are inverted)
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end_time.saturating_sub(self.start_time)
    }

    /// Progress through this line in `0.0..=1.0`
    #[must_use]
    pub fn progress(&self, position: Duration) -> f32 {
        if position <= self.start_time {
            return 0.0;
        }
        if position >= self.end_time {
            return 1.0;
        }

        let total = self.duration();
        if total.is_zero() {
            return 1.0;
        }

        let elapsed = position.saturating_sub(self.start_time);
        (elapsed.as_secs_f32() / total.as_secs_f32()).clamp(0.0, 1.0)
    }

    /// Split the line text into `(sung, unsung)` at `position`.
    ///
    /// A syllable counts as sung from its start time onwards. Lines without
    /// syllable timing are entirely unsung before the line starts and
    /// entirely sung after.
    #[must_use]
    pub fn split_sung(&self, position: Duration) -> (String, String) {
        match self.syllables.as_deref() {
            Some(syllables) if !syllables.is_empty() => {
                let sung_count = syllables.partition_point(|s| s.start_time <= position);
                let sung = syllables[..sung_count].iter().map(|s| s.text.as_str()).collect();
                let unsung = syllables[sung_count..].iter().map(|s| s.text.as_str()).collect();
                (sung, unsung)
            }
            _ if position >= self.start_time => (self.text.clone(), String::new()),
            _ => (String::new(), self.text.clone()),
        }
    }
}

/// Metadata from LRC ID tags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimelineMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub author: Option<String>,
    pub offset_ms: i64,
}

/// Sorted sequence of lyric lines for one song
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    pub metadata: TimelineMetadata,
    pub lines: Vec<LyricLine>,
}

impl Timeline {
    /// Build a timeline from lines already sorted by start time
    #[must_use]
    pub fn from_lines(lines: Vec<LyricLine>) -> Self {
        Self {
            metadata: TimelineMetadata::default(),
            lines,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether any line carries syllable timing
    #[must_use]
    pub fn has_syllables(&self) -> bool {
        self.lines
            .iter()
            .any(|l| l.syllables.as_ref().is_some_and(|s| !s.is_empty()))
    }

    /// Plain text of all lines joined by newlines
    #[must_use]
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Normalized outcome of one provider call
#[derive(Debug, Clone, Default)]
pub struct LyricResult {
    /// Name of the provider that produced this result
    pub provider: &'static str,
    /// Lyric body after any provider-specific decoding
    pub raw_text: Option<String>,
    pub timeline: Option<Timeline>,
    pub has_syllable_timing: bool,
    pub score: i32,
    pub matched_title: Option<String>,
    pub matched_artist: Option<String>,
    /// The provider flagged the track as having no lyrics
    pub instrumental: bool,
    pub error: Option<String>,
}

impl LyricResult {
    /// A result carrying a parsed body
    pub fn found(provider: &'static str, raw_text: impl Into<String>, timeline: Timeline) -> Self {
        Self {
            provider,
            raw_text: Some(raw_text.into()),
            has_syllable_timing: timeline.has_syllables(),
            timeline: Some(timeline),
            ..Self::default()
        }
    }

    /// A failed attempt
    pub fn failed(provider: &'static str, error: impl Into<String>) -> Self {
        Self {
            provider,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Record what the provider matched the query against
    #[must_use]
    pub fn with_match(mut self, title: Option<String>, artist: Option<String>) -> Self {
        self.matched_title = title.filter(|t| !t.is_empty());
        self.matched_artist = artist.filter(|a| !a.is_empty());
        self
    }

    #[must_use]
    pub const fn with_score(mut self, score: i32) -> Self {
        self.score = score;
        self
    }

    /// Whether this result can be displayed
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.error.is_none() && self.timeline.as_ref().is_some_and(|t| !t.is_empty())
    }
}
