//! Line-timed LRC parsing.

use crate::lyrics::{LyricLine, Timeline, TimelineMetadata, DEFAULT_LAST_LINE_DURATION};
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;

/// `[mm:ss.xx]` or `[mm:ss.xxx]`
#[allow(clippy::expect_used)]
static TIME_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(\d{2}):(\d{2})\.(\d{2,3})\]").expect("valid LRC time tag regex"));

/// Parse an LRC body into a timeline.
///
/// Every time tag on a line yields its own entry carrying the line's text with
/// all tags stripped, so `[00:05.00][00:15.00]Chorus` produces two lines. Lines
/// without a time tag are ignored unless they are ID tags. Entries are sorted
/// by start time; a later entry repeating an earlier start time is dropped.
#[must_use]
pub fn parse_lrc(input: &str) -> Timeline {
    let mut metadata = TimelineMetadata::default();
    let mut stamped: Vec<(u64, String)> = Vec::new();

    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        // Try to parse as ID tag first
        if let Some((key, value)) = parse_id_tag(line) {
            match key.to_lowercase().as_str() {
                "ti" => metadata.title = Some(value),
                "ar" => metadata.artist = Some(value),
                "al" => metadata.album = Some(value),
                "by" | "au" => metadata.author = Some(value),
                "offset" => {
                    if let Ok(offset) = value.parse::<i64>() {
                        metadata.offset_ms = offset;
                    }
                }
                _ => {} // Ignore unknown tags
            }
            continue;
        }

        let text = TIME_TAG_RE.replace_all(line, "").trim().to_string();
        for caps in TIME_TAG_RE.captures_iter(line) {
            if let Some(ms) = tag_millis(&caps[1], &caps[2], &caps[3]) {
                stamped.push((ms, text.clone()));
            }
        }
    }

    if metadata.offset_ms != 0 {
        for (ms, _) in &mut stamped {
            *ms = apply_offset(*ms, metadata.offset_ms);
        }
    }

    // Stable sort keeps source order for equal stamps, so dedup keeps the first
    stamped.sort_by_key(|(ms, _)| *ms);
    stamped.dedup_by_key(|(ms, _)| *ms);

    let mut lines = Vec::with_capacity(stamped.len());
    for (i, (ms, text)) in stamped.iter().enumerate() {
        let start_time = Duration::from_millis(*ms);
        let end_time = stamped.get(i + 1).map_or_else(
            || start_time + DEFAULT_LAST_LINE_DURATION,
            |(next, _)| Duration::from_millis(*next),
        );
        lines.push(LyricLine::new(start_time, end_time, text.clone()));
    }

    Timeline { metadata, lines }
}

/// Whether `input` carries at least one LRC time tag
#[must_use]
pub fn has_time_tags(input: &str) -> bool {
    TIME_TAG_RE.is_match(input)
}

/// Convert captured `mm`, `ss` and fraction digits to milliseconds.
///
/// Two fraction digits are centiseconds, three are milliseconds.
fn tag_millis(minutes: &str, seconds: &str, fraction: &str) -> Option<u64> {
    let minutes: u64 = minutes.parse().ok()?;
    let seconds: u64 = seconds.parse().ok()?;
    let fraction_value: u64 = fraction.parse().ok()?;
    let millis = if fraction.len() == 2 {
        fraction_value * 10
    } else {
        fraction_value
    };
    Some(minutes * 60_000 + seconds * 1000 + millis)
}

/// Parse an ID tag like [ti:Title] or [ar:Artist]
fn parse_id_tag(line: &str) -> Option<(String, String)> {
    if !line.starts_with('[') || !line.ends_with(']') {
        return None;
    }

    let content = &line[1..line.len() - 1];
    let (tag, value) = content.split_once(':')?;

    // If the tag part is numeric it's a timestamp, not an ID tag
    if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    Some((tag.to_string(), value.trim().to_string()))
}

/// Apply a millisecond offset (can be negative), saturating at zero
fn apply_offset(ms: u64, offset_ms: i64) -> u64 {
    if offset_ms >= 0 {
        ms.saturating_add(offset_ms.unsigned_abs())
    } else {
        ms.saturating_sub(offset_ms.unsigned_abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_parse_two_lines_with_end_chaining() {
        let timeline = parse_lrc("[00:01.00]Hello\n[00:03.50]World");
        assert_eq!(timeline.lines.len(), 2);
        assert_eq!(timeline.lines[0], LyricLine::new(ms(1000), ms(3500), "Hello"));
        assert_eq!(timeline.lines[1], LyricLine::new(ms(3500), ms(8500), "World"));
        assert!(timeline.lines.iter().all(|l| l.syllables.is_none()));
    }

    #[test]
    fn test_three_digit_fraction_is_millis() {
        let timeline = parse_lrc("[01:02.345]Line");
        assert_eq!(timeline.lines[0].start_time, ms(62_345));
    }

    #[test]
    fn test_multi_timestamp_line() {
        let timeline = parse_lrc("[00:15.00][00:05.00]Repeated lyric");
        assert_eq!(timeline.lines.len(), 2);
        assert_eq!(timeline.lines[0].start_time, ms(5000));
        assert_eq!(timeline.lines[0].end_time, ms(15_000));
        assert_eq!(timeline.lines[0].text, "Repeated lyric");
        assert_eq!(timeline.lines[1].text, "Repeated lyric");
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let input = "[00:20.00]Third\n[00:05.00]First\n[00:10.00]Second";
        let timeline = parse_lrc(input);
        let texts: Vec<_> = timeline.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["First", "Second", "Third"]);
        assert_eq!(timeline.lines[2].end_time, ms(25_000));
    }

    #[test]
    fn test_round_trip_of_generated_pairs() {
        let pairs: Vec<(u64, String)> = (0..12u64)
            .rev()
            .map(|i| (i * 3170 + 40, format!("line {i}")))
            .collect();

        let body: String = pairs
            .iter()
            .map(|(t, text)| {
                format!(
                    "[{:02}:{:02}.{:02}]{text}\n",
                    t / 60_000,
                    (t % 60_000) / 1000,
                    (t % 1000) / 10
                )
            })
            .collect();

        let timeline = parse_lrc(&body);
        let mut expected = pairs.clone();
        expected.sort_by_key(|(t, _)| *t);

        assert_eq!(timeline.lines.len(), expected.len());
        for (i, line) in timeline.lines.iter().enumerate() {
            assert_eq!(line.start_time, ms(expected[i].0));
            assert_eq!(line.text, expected[i].1);
            let end = expected.get(i + 1).map_or(expected[i].0 + 5000, |(t, _)| *t);
            assert_eq!(line.end_time, ms(end));
        }
    }

    #[test]
    fn test_duplicate_start_keeps_first() {
        let timeline = parse_lrc("[00:05.00]First\n[00:05.00]Second\n[00:07.00]Third");
        assert_eq!(timeline.lines.len(), 2);
        assert_eq!(timeline.lines[0].text, "First");
        assert!(timeline.lines.iter().all(|l| l.start_time < l.end_time));
    }

    #[test]
    fn test_parse_id_tags() {
        let input = "[ti:Song Title]\n[ar:Artist Name]\n[al:Album Name]\n[by:Someone]\n[00:05.00]Lyrics here";
        let timeline = parse_lrc(input);
        assert_eq!(timeline.metadata.title.as_deref(), Some("Song Title"));
        assert_eq!(timeline.metadata.artist.as_deref(), Some("Artist Name"));
        assert_eq!(timeline.metadata.album.as_deref(), Some("Album Name"));
        assert_eq!(timeline.metadata.author.as_deref(), Some("Someone"));
        assert_eq!(timeline.lines.len(), 1);
    }

    #[test]
    fn test_parse_offset() {
        let timeline = parse_lrc("[offset:500]\n[00:10.00]Test");
        assert_eq!(timeline.lines[0].start_time, ms(10_500));

        let timeline = parse_lrc("[offset:-500]\n[00:10.00]Test");
        assert_eq!(timeline.lines[0].start_time, ms(9500));
    }

    #[test]
    fn test_untagged_and_malformed_lines_skipped() {
        let input = "plain words\n[0:01.00]bad minutes\n[00:02.0]bad fraction\n[00:03.00]Good";
        let timeline = parse_lrc(input);
        assert_eq!(timeline.lines.len(), 1);
        assert_eq!(timeline.lines[0].text, "Good");
    }

    #[test]
    fn test_parse_cjk_lyrics() {
        let timeline = parse_lrc("[00:05.00]你好世界");
        assert_eq!(timeline.lines[0].text, "你好世界");
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_lrc("").is_empty());
        assert!(!has_time_tags("no tags"));
        assert!(has_time_tags("[00:01.00]x"));
    }
}
