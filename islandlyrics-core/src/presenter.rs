//! Per-tick combination of the timeline cursor and the scroll pacer.

use crate::config::{ScrollConfig, ScrollStrategy};
use crate::cursor::{HighlightFrame, TimelineCursor};
use crate::lyrics::Timeline;
use crate::pacer::{ScrollFrame, ScrollPacer, ScrollPhase};
use crate::weight::visual_weight;
use std::time::{Duration, Instant};

/// Tick interval once the active line has settled
const SETTLED_TICK: Duration = Duration::from_millis(1000);
/// Tick interval while following playback within a line
const TIMED_TICK: Duration = Duration::from_millis(200);

/// Output of one driver tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenterFrame<'a> {
    pub line_index: Option<usize>,
    pub scroll: ScrollFrame,
    pub highlight: Option<HighlightFrame<'a>>,
    /// Playback sits between the end of the active line and the next start
    pub in_gap: bool,
}

/// Drives a timeline from playback positions
#[derive(Debug)]
pub struct Presenter {
    timeline: Timeline,
    pacer: ScrollPacer,
    active_line: Option<usize>,
}

impl Presenter {
    #[must_use]
    pub fn new(timeline: Timeline, config: ScrollConfig, now: Instant) -> Self {
        Self {
            timeline,
            pacer: ScrollPacer::new(config, now),
            active_line: None,
        }
    }

    /// Swap in the next song's timeline and forget the learned tempo
    pub fn load(&mut self, timeline: Timeline, now: Instant) {
        self.timeline = timeline;
        self.active_line = None;
        self.pacer.reset_for_new_song(now);
    }

    #[must_use]
    pub const fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    fn strategy(&self) -> ScrollStrategy {
        self.pacer.config().strategy
    }

    /// Frame for playback `position` at wall-clock `now`.
    ///
    /// Every change of the active line index restarts pacing, including a
    /// line that repeats the previous line's text.
    pub fn tick(&mut self, position: Duration, now: Instant) -> PresenterFrame<'_> {
        let located = TimelineCursor::new(&self.timeline).locate(position);
        let index = located.map(|l| l.line_index);

        if index != self.active_line {
            self.active_line = index;
            if let Some(line) = index.and_then(|i| self.timeline.lines.get(i)) {
                self.pacer.on_line_change(&line.text, now);
            }
        }

        let Some(located) = located else {
            return PresenterFrame {
                line_index: None,
                scroll: ScrollFrame {
                    display_text: String::new(),
                    is_static: true,
                },
                highlight: None,
                in_gap: false,
            };
        };

        let line = &self.timeline.lines[located.line_index];
        let scroll = match self.strategy() {
            ScrollStrategy::Paced => self.pacer.tick(now),
            ScrollStrategy::Timed => {
                let display_text = if line.syllables.is_some() {
                    let (sung, unsung) = line.split_sung(position);
                    self.pacer.syllable_window(&sung, &unsung)
                } else {
                    self.pacer.timed_window(&line.text, line.progress(position))
                };
                let max = self.pacer.config().max_display_weight;
                ScrollFrame {
                    display_text,
                    is_static: visual_weight(&line.text) <= max,
                }
            }
        };

        PresenterFrame {
            line_index: Some(located.line_index),
            scroll,
            highlight: TimelineCursor::new(&self.timeline).highlight(position),
            in_gap: !located.within_line,
        }
    }

    /// How long the driver should wait before the next tick
    #[must_use]
    pub fn next_tick_delay(&self) -> Duration {
        match self.strategy() {
            ScrollStrategy::Timed => TIMED_TICK,
            ScrollStrategy::Paced if self.pacer.phase() == ScrollPhase::Done => SETTLED_TICK,
            ScrollStrategy::Paced => self.pacer.step_delay(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::krc::parse_krc;
    use crate::lrc::parse_lrc;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn timed() -> ScrollConfig {
        ScrollConfig {
            strategy: ScrollStrategy::Timed,
            ..ScrollConfig::default()
        }
    }

    #[test]
    fn test_before_first_line_shows_nothing() {
        let t0 = Instant::now();
        let timeline = parse_lrc("[00:05.00]Hello");
        let mut presenter = Presenter::new(timeline, ScrollConfig::default(), t0);
        let frame = presenter.tick(ms(1000), t0);
        assert_eq!(frame.line_index, None);
        assert_eq!(frame.scroll.display_text, "");
        assert!(frame.highlight.is_none());
    }

    #[test]
    fn test_paced_short_lines_settle() {
        let t0 = Instant::now();
        let timeline = parse_lrc("[00:01.00]Hello\n[00:03.50]World");
        let mut presenter = Presenter::new(timeline, ScrollConfig::default(), t0);

        let frame = presenter.tick(ms(1200), t0);
        assert_eq!(frame.line_index, Some(0));
        assert_eq!(frame.scroll.display_text, "Hello");
        assert!(frame.scroll.is_static);
        assert_eq!(presenter.next_tick_delay(), ms(1000));

        let frame = presenter.tick(ms(3600), t0 + ms(2400));
        assert_eq!(frame.line_index, Some(1));
        assert_eq!(frame.scroll.display_text, "World");
    }

    #[test]
    fn test_paced_long_line_uses_step_delay() {
        let t0 = Instant::now();
        let timeline = parse_lrc("[00:01.00]一二三四五六七八九十一二三四五六七八九十");
        let mut presenter = Presenter::new(timeline, ScrollConfig::default(), t0);
        let frame = presenter.tick(ms(1000), t0);
        assert!(!frame.scroll.is_static);
        assert_eq!(presenter.next_tick_delay(), ms(1800));
    }

    #[test]
    fn test_repeated_text_restarts_pacing() {
        let t0 = Instant::now();
        let line = "一二三四五六七八九十一二三四五六七八九十";
        let timeline = parse_lrc(&format!("[00:01.00]{line}\n[00:20.00]{line}"));
        let mut presenter = Presenter::new(timeline, ScrollConfig::default(), t0);

        presenter.tick(ms(1000), t0);
        let mut now = t0;
        for position in (2000..19_000).step_by(1000) {
            now += ms(1000);
            presenter.tick(ms(position), now);
        }
        assert_ne!(presenter.pacer.phase(), ScrollPhase::InitialPause);

        let frame = presenter.tick(ms(20_000), now + ms(1000));
        assert_eq!(frame.line_index, Some(1));
        assert_eq!(presenter.pacer.phase(), ScrollPhase::InitialPause);
    }

    #[test]
    fn test_timed_syllable_mode() {
        let t0 = Instant::now();
        let timeline = parse_krc("[1000,2000]<0,500,0>Hel<500,500,0>lo");
        let mut presenter = Presenter::new(timeline, timed(), t0);

        let frame = presenter.tick(ms(1600), t0);
        assert_eq!(frame.scroll.display_text, "Hello");
        assert!(frame.scroll.is_static);
        let highlight = frame.highlight.unwrap();
        assert_eq!(highlight.active_syllable_index, Some(1));
        assert_eq!(presenter.next_tick_delay(), ms(200));
    }

    #[test]
    fn test_timed_lrc_mode_follows_progress() {
        let t0 = Instant::now();
        let timeline =
            parse_lrc("[00:00.00]一二三四五六七八九十一二三四五六七八九十\n[00:10.00]next");
        let mut presenter = Presenter::new(timeline, timed(), t0);

        assert_eq!(presenter.tick(ms(1000), t0).scroll.display_text, "一二三四五六七八九");
        assert_eq!(
            presenter.tick(ms(9999), t0).scroll.display_text,
            "二三四五六七八九十"
        );
    }

    #[test]
    fn test_gap_is_reported() {
        let t0 = Instant::now();
        let timeline = parse_krc("[1000,1000]<0,1000,0>a\n[5000,1000]<0,1000,0>b");
        let mut presenter = Presenter::new(timeline, ScrollConfig::default(), t0);
        let frame = presenter.tick(ms(3000), t0);
        assert_eq!(frame.line_index, Some(0));
        assert!(frame.in_gap);
    }

    #[test]
    fn test_load_resets_for_new_song() {
        let t0 = Instant::now();
        let timeline = parse_lrc("[00:01.00]a");
        let mut presenter = Presenter::new(timeline, ScrollConfig::default(), t0);
        presenter.tick(ms(1500), t0);
        presenter.load(parse_lrc("[00:02.00]b"), t0);
        assert_eq!(presenter.tick(ms(2500), t0).scroll.display_text, "b");
        assert_eq!(presenter.pacer.tempo().sample_count(), 0);
    }
}
