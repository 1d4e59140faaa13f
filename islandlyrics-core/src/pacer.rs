//! Auto-scroll pacing for lines wider than the display.
//!
//! The paced strategy is a small state machine per active line: hold the
//! start of the line, step a window through it at a tempo learned from recent
//! line durations, hold the tail, then stop. The timed strategy instead derives
//! the window from how far playback has progressed through the line.

use crate::config::{ScrollConfig, ShiftMode};
use crate::time::DurationExt;
use crate::weight::{extract_by_weight, smart_shift_weight, visual_weight};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::debug;

const LOG_TARGET: &str = "islandlyrics::pacer";

/// Line durations kept for the tempo average
const MAX_TEMPO_SAMPLES: usize = 5;
/// Faster than this per character is a skip or a seek, not a sung line
const MIN_MS_PER_CHAR: u64 = 50;
/// Longer gaps are pauses or interludes
const MAX_TRACKED_GAP: Duration = Duration::from_secs(30);

/// Time reserved for the initial and final pauses
const STATIC_RESERVE_MS: u64 = 1500;
/// Time to refocus after each step
const FOCUS_DELAY_MS: u64 = 500;
/// Typical weight moved by one smart shift
const TYPICAL_SHIFT_WEIGHT: u64 = 5;
const FALLBACK_MS_PER_UNIT: u64 = 100;
const MIN_STEP_DELAY_MS: u64 = 500;
const MAX_STEP_DELAY_MS: u64 = 5000;

/// Sung weight before a syllable-timed line starts scrolling
const SCROLL_START_WEIGHT: usize = 8;
/// Weight that stays visible at the end of a timed scroll
const MIN_VISIBLE_WEIGHT: usize = 14;
/// Share of an LRC line shown unscrolled in timed mode
const TIMED_DEFERRAL: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollPhase {
    InitialPause,
    Scrolling,
    FinalPause,
    Done,
}

/// Per-line scroll state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollState {
    pub phase: ScrollPhase,
    /// Window start, in weight units from the start of the line
    pub offset_weight: usize,
    pub phase_started: Instant,
}

impl ScrollState {
    const fn fresh(now: Instant) -> Self {
        Self {
            phase: ScrollPhase::InitialPause,
            offset_weight: 0,
            phase_started: now,
        }
    }
}

/// What to show for the active line right now
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollFrame {
    pub display_text: String,
    /// The text will not change again until the next line
    pub is_static: bool,
}

/// Sliding window of recent line durations
#[derive(Debug, Clone, Default)]
pub struct TempoTracker {
    last_change: Option<Instant>,
    last_len: usize,
    samples: VecDeque<Duration>,
}

impl TempoTracker {
    /// Note that a line with `text` became active at `now`.
    ///
    /// Returns whether the time spent on the previous line was kept as a sample.
    pub fn record(&mut self, text: &str, now: Instant) -> bool {
        let len = text.chars().count();

        let Some(last_change) = self.last_change else {
            self.restart(len, now);
            return false;
        };

        let elapsed = now.saturating_duration_since(last_change);

        if self.last_len == 0 {
            self.restart(len, now);
            return false;
        }

        let per_char = elapsed.as_millis_u64() / self.last_len as u64;
        if per_char < MIN_MS_PER_CHAR {
            // The previous line's clock keeps running
            debug!(target: LOG_TARGET, "Ignoring fast line change: {}ms/char", per_char);
            return false;
        }

        if elapsed > MAX_TRACKED_GAP {
            debug!(target: LOG_TARGET, "Ignoring long gap: {}ms", elapsed.as_millis());
            self.restart(len, now);
            return false;
        }

        self.samples.push_back(elapsed);
        if self.samples.len() > MAX_TEMPO_SAMPLES {
            self.samples.pop_front();
        }
        self.restart(len, now);
        true
    }

    fn restart(&mut self, len: usize, now: Instant) {
        self.last_change = Some(now);
        self.last_len = len;
    }

    /// Mean of the kept samples
    #[must_use]
    pub fn average(&self) -> Option<Duration> {
        if self.samples.is_empty() {
            return None;
        }
        let total: Duration = self.samples.iter().sum();
        let count = u32::try_from(self.samples.len()).unwrap_or(u32::MAX);
        Some(total / count)
    }

    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Step delay for a line of `line_weight` given the average line duration.
///
/// The time left after the pauses and per-step refocus is spread over the
/// line's weight; one step then waits for a typical shift's share of it.
#[must_use]
pub fn adaptive_step_delay(average: Duration, line_weight: usize, default: Duration) -> Duration {
    let average_ms = average.as_millis_u64();
    if line_weight == 0 || average_ms < STATIC_RESERVE_MS {
        return default;
    }

    let weight = line_weight as u64;
    let steps = (weight / TYPICAL_SHIFT_WEIGHT).max(1);
    let per_unit = average_ms
        .checked_sub(STATIC_RESERVE_MS + steps * FOCUS_DELAY_MS)
        .filter(|available| *available > 0)
        .map_or(FALLBACK_MS_PER_UNIT, |available| available / weight);

    let delay = FOCUS_DELAY_MS.saturating_add(per_unit.saturating_mul(TYPICAL_SHIFT_WEIGHT));
    Duration::from_millis(delay.clamp(MIN_STEP_DELAY_MS, MAX_STEP_DELAY_MS))
}

/// Scroll pacer for the active line
#[derive(Debug, Clone)]
pub struct ScrollPacer {
    config: ScrollConfig,
    text: String,
    total_weight: usize,
    state: ScrollState,
    tempo: TempoTracker,
    step_delay: Duration,
}

impl ScrollPacer {
    #[must_use]
    pub fn new(config: ScrollConfig, now: Instant) -> Self {
        let step_delay = config.default_step_delay();
        Self {
            config,
            text: String::new(),
            total_weight: 0,
            state: ScrollState::fresh(now),
            tempo: TempoTracker::default(),
            step_delay,
        }
    }

    /// A new line became active. Repeats of the same text restart pacing too.
    pub fn on_line_change(&mut self, text: &str, now: Instant) {
        let previous_weight = self.total_weight;
        if self.tempo.record(text, now) {
            if let Some(average) = self.tempo.average() {
                self.step_delay =
                    adaptive_step_delay(average, previous_weight, self.config.default_step_delay());
                debug!(
                    target: LOG_TARGET,
                    "Adaptive step delay: {}ms (avg line {}ms, weight {})",
                    self.step_delay.as_millis(),
                    average.as_millis(),
                    previous_weight
                );
            }
        }

        self.text = text.to_string();
        self.total_weight = visual_weight(text);
        self.state = ScrollState::fresh(now);
    }

    /// Forget the learned tempo and the active line
    pub fn reset_for_new_song(&mut self, now: Instant) {
        self.tempo.clear();
        self.step_delay = self.config.default_step_delay();
        self.text.clear();
        self.total_weight = 0;
        self.state = ScrollState::fresh(now);
    }

    /// Advance the state machine and return what to display
    pub fn tick(&mut self, now: Instant) -> ScrollFrame {
        let max = self.config.max_display_weight;

        if self.total_weight <= max {
            self.state.phase = ScrollPhase::Done;
            return ScrollFrame {
                display_text: self.text.clone(),
                is_static: true,
            };
        }

        let elapsed = now.saturating_duration_since(self.state.phase_started);
        let remaining = self.total_weight.saturating_sub(self.state.offset_weight);

        let display_text = match self.state.phase {
            ScrollPhase::InitialPause => {
                if elapsed >= self.config.initial_pause() {
                    self.enter(ScrollPhase::Scrolling, now);
                }
                extract_by_weight(&self.text, 0, max)
            }
            ScrollPhase::Scrolling => {
                if remaining <= self.config.compensation_threshold {
                    self.enter(ScrollPhase::FinalPause, now);
                    extract_by_weight(&self.text, self.state.offset_weight, remaining)
                } else if remaining <= max {
                    self.enter(ScrollPhase::FinalPause, now);
                    extract_by_weight(&self.text, self.state.offset_weight, max)
                } else {
                    let window = extract_by_weight(&self.text, self.state.offset_weight, max);
                    self.state.offset_weight += self.shift(&window);
                    window
                }
            }
            ScrollPhase::FinalPause => {
                if elapsed >= self.config.final_pause() {
                    self.enter(ScrollPhase::Done, now);
                }
                extract_by_weight(&self.text, self.state.offset_weight, remaining.max(max))
            }
            ScrollPhase::Done => {
                extract_by_weight(&self.text, self.state.offset_weight, remaining.max(max))
            }
        };

        ScrollFrame {
            display_text,
            is_static: self.state.phase == ScrollPhase::Done,
        }
    }

    fn enter(&mut self, phase: ScrollPhase, now: Instant) {
        debug!(
            target: LOG_TARGET,
            "{:?} -> {:?} at offset {}", self.state.phase, phase, self.state.offset_weight
        );
        self.state.phase = phase;
        self.state.phase_started = now;
    }

    fn shift(&self, window: &str) -> usize {
        match self.config.shift {
            ShiftMode::Smart => smart_shift_weight(&self.text, self.state.offset_weight),
            ShiftMode::Page => match visual_weight(window) {
                0 => self.config.max_display_weight,
                weight => weight,
            },
        }
    }

    /// Window for a syllable-timed line split at the playback position.
    ///
    /// Nothing moves until the sung part reaches 8 units; afterwards the
    /// window trails the sung text while keeping at least 14 units in view.
    #[must_use]
    pub fn syllable_window(&self, sung: &str, unsung: &str) -> String {
        let max = self.config.max_display_weight;
        let sung_weight = visual_weight(sung);
        let total = sung_weight + visual_weight(unsung);
        let full = format!("{sung}{unsung}");

        if total <= max {
            return full;
        }

        let target = sung_weight.saturating_sub(SCROLL_START_WEIGHT);
        let cap = total.saturating_sub(MIN_VISIBLE_WEIGHT);
        extract_by_weight(&full, target.min(cap), max)
    }

    /// Window for a line-timed line at `progress` through it.
    ///
    /// The first 30% of the line is shown unscrolled, then the offset moves
    /// linearly to the end, keeping at least 14 units in view.
    #[must_use]
    pub fn timed_window(&self, text: &str, progress: f32) -> String {
        let max = self.config.max_display_weight;
        let total = visual_weight(text);
        if total <= max {
            return text.to_string();
        }

        let deferred = ((progress - TIMED_DEFERRAL) / (1.0 - TIMED_DEFERRAL)).clamp(0.0, 1.0);
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let target = (deferred * (total - max) as f32) as usize;
        let cap = total.saturating_sub(MIN_VISIBLE_WEIGHT);
        extract_by_weight(text, target.min(cap), max)
    }

    #[must_use]
    pub const fn state(&self) -> &ScrollState {
        &self.state
    }

    #[must_use]
    pub const fn phase(&self) -> ScrollPhase {
        self.state.phase
    }

    /// Delay between paced steps
    #[must_use]
    pub const fn step_delay(&self) -> Duration {
        self.step_delay
    }

    #[must_use]
    pub const fn config(&self) -> &ScrollConfig {
        &self.config
    }

    #[must_use]
    pub const fn tempo(&self) -> &TempoTracker {
        &self.tempo
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWENTY_CJK: &str = "一二三四五六七八九十一二三四五六七八九十";

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn page_config() -> ScrollConfig {
        ScrollConfig {
            shift: ShiftMode::Page,
            ..ScrollConfig::default()
        }
    }

    /// Tick every `step` until the pacer is done, collecting distinct windows
    fn run_to_done(pacer: &mut ScrollPacer, start: Instant, step: Duration) -> Vec<String> {
        let mut windows: Vec<String> = Vec::new();
        let mut now = start;
        for _ in 0..100 {
            let frame = pacer.tick(now);
            if windows.last() != Some(&frame.display_text) {
                windows.push(frame.display_text);
            }
            if frame.is_static {
                break;
            }
            now += step;
        }
        windows
    }

    #[test]
    fn test_short_line_is_done_immediately() {
        let t0 = Instant::now();
        let mut pacer = ScrollPacer::new(ScrollConfig::default(), t0);
        pacer.on_line_change("Hello world", t0);

        let frame = pacer.tick(t0);
        assert_eq!(frame.display_text, "Hello world");
        assert!(frame.is_static);
        assert_eq!(pacer.phase(), ScrollPhase::Done);
    }

    #[test]
    fn test_forty_weight_line_pages_in_three_windows() {
        let t0 = Instant::now();
        let mut pacer = ScrollPacer::new(page_config(), t0);
        pacer.on_line_change(TWENTY_CJK, t0);
        assert_eq!(visual_weight(TWENTY_CJK), 40);

        let windows = run_to_done(&mut pacer, t0, ms(600));
        assert_eq!(
            windows,
            vec![
                "一二三四五六七八九".to_string(),
                "十一二三四五六七八".to_string(),
                "九十".to_string(),
            ]
        );
        assert_eq!(pacer.state().offset_weight, 36);
    }

    #[test]
    fn test_initial_pause_holds_first_window() {
        let t0 = Instant::now();
        let mut pacer = ScrollPacer::new(ScrollConfig::default(), t0);
        pacer.on_line_change(TWENTY_CJK, t0);

        let frame = pacer.tick(t0 + ms(999));
        assert_eq!(pacer.phase(), ScrollPhase::InitialPause);
        assert_eq!(frame.display_text, "一二三四五六七八九");
        assert!(!frame.is_static);

        pacer.tick(t0 + ms(1000));
        assert_eq!(pacer.phase(), ScrollPhase::Scrolling);
        assert_eq!(pacer.state().offset_weight, 0);
    }

    #[test]
    fn test_offset_never_advances_after_compensation() {
        let t0 = Instant::now();
        let mut pacer = ScrollPacer::new(ScrollConfig::default(), t0);
        let line = "we were dancing in the moonlight until the morning came along";
        pacer.on_line_change(line, t0);

        let mut now = t0;
        let mut settled: Option<usize> = None;
        for _ in 0..200 {
            pacer.tick(now);
            if let Some(offset) = settled {
                assert_eq!(pacer.state().offset_weight, offset);
            } else if matches!(pacer.phase(), ScrollPhase::FinalPause | ScrollPhase::Done) {
                settled = Some(pacer.state().offset_weight);
            }
            now += ms(700);
        }
        assert!(settled.is_some());
        assert_eq!(pacer.phase(), ScrollPhase::Done);
        assert!(visual_weight(line) - pacer.state().offset_weight <= 18);
    }

    #[test]
    fn test_smart_shift_steps_cjk_by_two_characters() {
        let t0 = Instant::now();
        let mut pacer = ScrollPacer::new(ScrollConfig::default(), t0);
        pacer.on_line_change(TWENTY_CJK, t0);

        pacer.tick(t0);
        pacer.tick(t0 + ms(1000));
        let frame = pacer.tick(t0 + ms(2000));
        assert_eq!(frame.display_text, "一二三四五六七八九");
        assert_eq!(pacer.state().offset_weight, 4);

        let frame = pacer.tick(t0 + ms(3000));
        assert_eq!(frame.display_text, "三四五六七八九十一");
    }

    #[test]
    fn test_repeated_line_resets_pacing() {
        let t0 = Instant::now();
        let mut pacer = ScrollPacer::new(page_config(), t0);
        pacer.on_line_change(TWENTY_CJK, t0);
        run_to_done(&mut pacer, t0, ms(600));
        assert_eq!(pacer.phase(), ScrollPhase::Done);

        let t1 = t0 + ms(10_000);
        pacer.on_line_change(TWENTY_CJK, t1);
        assert_eq!(pacer.phase(), ScrollPhase::InitialPause);
        assert_eq!(pacer.state().offset_weight, 0);
        assert_eq!(pacer.tick(t1).display_text, "一二三四五六七八九");
    }

    #[test]
    fn test_adaptive_delay_from_line_durations() {
        let t0 = Instant::now();
        let mut pacer = ScrollPacer::new(ScrollConfig::default(), t0);
        pacer.on_line_change("abcdefghij", t0);
        assert_eq!(pacer.step_delay(), ms(1800));

        // 4000ms over weight 10: (4000 - 1500 - 2*500) / 10 = 150ms per unit
        pacer.on_line_change("abcdefghij", t0 + ms(4000));
        assert_eq!(pacer.tempo().sample_count(), 1);
        assert_eq!(pacer.step_delay(), ms(500 + 150 * 5));
    }

    #[test]
    fn test_fast_changes_do_not_restart_the_clock() {
        let t0 = Instant::now();
        let mut pacer = ScrollPacer::new(ScrollConfig::default(), t0);
        pacer.on_line_change("abcdefghij", t0);

        // 10ms per character: dropped
        pacer.on_line_change("abcdefghij", t0 + ms(100));
        assert_eq!(pacer.tempo().sample_count(), 0);
        assert_eq!(pacer.step_delay(), ms(1800));

        // Measured from t0, not from the dropped change
        pacer.on_line_change("abcdefghij", t0 + ms(4000));
        assert_eq!(pacer.tempo().average(), Some(ms(4000)));
    }

    #[test]
    fn test_long_gap_resets_without_sample() {
        let t0 = Instant::now();
        let mut pacer = ScrollPacer::new(ScrollConfig::default(), t0);
        pacer.on_line_change("abcdefghij", t0);
        pacer.on_line_change("abcdefghij", t0 + ms(31_000));
        assert_eq!(pacer.tempo().sample_count(), 0);

        // The clock restarted at the gap
        pacer.on_line_change("abcdefghij", t0 + ms(35_000));
        assert_eq!(pacer.tempo().average(), Some(ms(4000)));
    }

    #[test]
    fn test_history_window_is_bounded() {
        let t0 = Instant::now();
        let mut pacer = ScrollPacer::new(ScrollConfig::default(), t0);
        let mut now = t0;
        pacer.on_line_change("abcdefghij", now);
        for _ in 0..8 {
            now += ms(3000);
            pacer.on_line_change("abcdefghij", now);
        }
        assert_eq!(pacer.tempo().sample_count(), 5);
    }

    #[test]
    fn test_adaptive_delay_clamps() {
        let default = ms(1800);
        // Not enough time for the pauses: default
        assert_eq!(adaptive_step_delay(ms(1200), 10, default), default);
        assert_eq!(adaptive_step_delay(ms(4000), 0, default), default);
        // Negative budget falls back to 100ms per unit
        assert_eq!(adaptive_step_delay(ms(2000), 40, default), ms(1000));
        // Capped at 5s
        assert_eq!(adaptive_step_delay(ms(29_000), 1, default), ms(5000));
    }

    #[test]
    fn test_new_song_clears_tempo() {
        let t0 = Instant::now();
        let mut pacer = ScrollPacer::new(ScrollConfig::default(), t0);
        pacer.on_line_change("abcdefghij", t0);
        pacer.on_line_change("abcdefghij", t0 + ms(4000));
        assert_ne!(pacer.step_delay(), ms(1800));

        pacer.reset_for_new_song(t0 + ms(5000));
        assert_eq!(pacer.step_delay(), ms(1800));
        assert_eq!(pacer.tempo().sample_count(), 0);
    }

    #[test]
    fn test_syllable_window() {
        let pacer = ScrollPacer::new(ScrollConfig::default(), Instant::now());

        // Fits: shown whole
        assert_eq!(pacer.syllable_window("Hel", "lo"), "Hello");

        // Sung weight 6 is below the start threshold
        assert_eq!(
            pacer.syllable_window("一二三", "四五六七八九十一二三"),
            "一二三四五六七八九"
        );

        // Sung weight 10 scrolls by 2
        assert_eq!(
            pacer.syllable_window("一二三四五", "六七八九十一二"),
            "二三四五六七八九十"
        );

        // Fully sung: capped so 14 units remain visible
        assert_eq!(
            pacer.syllable_window("一二三四五六七八九十一二", ""),
            "六七八九十一二"
        );
    }

    #[test]
    fn test_timed_window() {
        let pacer = ScrollPacer::new(ScrollConfig::default(), Instant::now());

        assert_eq!(pacer.timed_window("short", 0.9), "short");
        assert_eq!(pacer.timed_window(TWENTY_CJK, 0.2), "一二三四五六七八九");
        // (0.72 - 0.3) / 0.7 * 22 = 13.2, so the window starts at the eighth ideograph
        assert_eq!(pacer.timed_window(TWENTY_CJK, 0.72), "八九十一二三四五六");
        assert_eq!(pacer.timed_window(TWENTY_CJK, 1.0), "二三四五六七八九十");
    }
}
