//! Syllable-timed KRC parsing.
//!
//! A KRC line looks like `[12340,2500]<0,300,0>Hel<300,400,0>lo`: the header
//! holds the absolute line start and duration in milliseconds, each span holds
//! an offset relative to the line start, a duration and an unused id.

use crate::lyrics::{LyricLine, SyllableInfo, Timeline};
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use tracing::trace;

const LOG_TARGET: &str = "islandlyrics::krc";

#[allow(clippy::expect_used)]
static LINE_HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[(\d+),(\d+)\]").expect("valid KRC line header regex"));

#[allow(clippy::expect_used)]
static SYLLABLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(\d+),(\d+),(\d+)>([^<]*)").expect("valid KRC syllable regex"));

/// Parse a KRC body into a syllable-timed timeline.
///
/// Lines without a valid header, without any syllable span, or with a zero
/// duration are skipped. Syllables keep their source order; their bounds are
/// clamped into the owning line. Lines are sorted by start time and a later
/// line repeating an earlier start time is dropped.
#[must_use]
pub fn parse_krc(input: &str) -> Timeline {
    let mut lines: Vec<LyricLine> = input
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('[') && line[1..].starts_with(|c: char| c.is_ascii_digit()))
        .filter_map(|line| {
            let parsed = parse_krc_line(line);
            if parsed.is_none() {
                trace!(target: LOG_TARGET, "Skipping KRC line: {}", line);
            }
            parsed
        })
        .collect();

    lines.sort_by_key(|l| l.start_time);
    lines.dedup_by_key(|l| l.start_time);

    Timeline::from_lines(lines)
}

fn parse_krc_line(line: &str) -> Option<LyricLine> {
    let header = LINE_HEADER_RE.captures(line)?;
    let line_start: u64 = header[1].parse().ok()?;
    let line_duration: u64 = header[2].parse().ok()?;
    if line_duration == 0 {
        return None;
    }
    let line_end = line_start.checked_add(line_duration)?;

    let content = &line[header.get(0)?.end()..];

    let mut syllables = Vec::new();
    let mut text = String::new();

    for caps in SYLLABLE_RE.captures_iter(content) {
        let offset: u64 = caps[1].parse().ok()?;
        let duration: u64 = caps[2].parse().ok()?;
        let span_text = &caps[4];

        let abs_start = line_start.saturating_add(offset).min(line_end);
        let abs_end = abs_start.saturating_add(duration).min(line_end);

        syllables.push(SyllableInfo {
            start_time: Duration::from_millis(abs_start),
            end_time: Duration::from_millis(abs_end),
            text: span_text.to_string(),
        });
        text.push_str(span_text);
    }

    if syllables.is_empty() {
        return None;
    }

    Some(LyricLine {
        start_time: Duration::from_millis(line_start),
        end_time: Duration::from_millis(line_end),
        text,
        syllables: Some(syllables),
    })
}
