//! Resolving the active line and syllable for a playback position.

use crate::lyrics::{LyricLine, SyllableInfo, Timeline};
use std::time::Duration;

/// Snapshot of where playback sits inside a timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorPosition {
    /// Index of the most recently started line
    pub line_index: usize,
    /// Index of the most recently started syllable, if the line has syllables
    pub syllable_index: Option<usize>,
    /// `false` when the position sits in a gap after the line's end
    pub within_line: bool,
}

/// Highlight information handed to a renderer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightFrame<'a> {
    pub line_text: &'a str,
    pub syllables: Option<&'a [SyllableInfo]>,
    pub active_syllable_index: Option<usize>,
}

/// Binary-search cursor over a sorted timeline
#[derive(Debug, Clone, Copy)]
pub struct TimelineCursor<'a> {
    lines: &'a [LyricLine],
}

impl<'a> TimelineCursor<'a> {
    #[must_use]
    pub fn new(timeline: &'a Timeline) -> Self {
        Self {
            lines: &timeline.lines,
        }
    }

    /// Index of the line current at `position`.
    ///
    /// This is the line with `start <= position < end`; past the final start
    /// the last line stays current. In a gap between a line's end and the next
    /// start, the previous line is still reported. `None` only for an empty
    /// timeline or a position before the first line.
    #[must_use]
    pub fn resolve(&self, position: Duration) -> Option<usize> {
        let started = self.lines.partition_point(|l| l.start_time <= position);
        started.checked_sub(1)
    }

    /// Line current at `position`
    #[must_use]
    pub fn line_at(&self, position: Duration) -> Option<&'a LyricLine> {
        self.resolve(position).map(|i| &self.lines[i])
    }

    /// Full cursor snapshot for `position`
    #[must_use]
    pub fn locate(&self, position: Duration) -> Option<CursorPosition> {
        let line_index = self.resolve(position)?;
        let line = &self.lines[line_index];
        let is_last = line_index + 1 == self.lines.len();

        Some(CursorPosition {
            line_index,
            syllable_index: active_syllable(line, position),
            within_line: is_last || line.contains(position),
        })
    }

    /// Highlight frame for `position`
    #[must_use]
    pub fn highlight(&self, position: Duration) -> Option<HighlightFrame<'a>> {
        let line = self.line_at(position)?;
        Some(HighlightFrame {
            line_text: &line.text,
            syllables: line.syllables.as_deref(),
            active_syllable_index: active_syllable(line, position),
        })
    }
}

/// Index of the last syllable whose start is at or before `position`.
///
/// Syllables light up at their start time rather than when they finish.
#[must_use]
pub fn active_syllable(line: &LyricLine, position: Duration) -> Option<usize> {
    let syllables = line.syllables.as_deref()?;
    syllables
        .partition_point(|s| s.start_time <= position)
        .checked_sub(1)
}
