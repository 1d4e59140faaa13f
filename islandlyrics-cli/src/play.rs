//! Terminal playback of a fetched timeline against a simulated clock.

use islandlyrics_core::{parse_title, LyricResult, Presenter, Timeline};
use std::fmt::Write;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const LOG_TARGET: &str = "islandlyrics::play";

/// Never sleep less than this between ticks
const MIN_TICK: Duration = Duration::from_millis(20);

/// Playback position that advances with wall-clock time from `start`
#[derive(Debug, Clone, Copy)]
pub struct SimulatedClock {
    origin: Instant,
    start: Duration,
}

impl SimulatedClock {
    pub const fn new(origin: Instant, start: Duration) -> Self {
        Self { origin, start }
    }

    pub fn position(&self, now: Instant) -> Duration {
        self.start + now.saturating_duration_since(self.origin)
    }
}

/// `mm:ss.cc`
pub fn format_timestamp(position: Duration) -> String {
    let centis = position.as_millis() / 10;
    format!("{:02}:{:02}.{:02}", centis / 6000, centis / 100 % 60, centis % 100)
}

/// Summary line naming the provider and the matched track
fn header(result: &LyricResult) -> String {
    let mut header = format!("# {} (score {})", result.provider, result.score);
    if let Some(title) = &result.matched_title {
        let title = parse_title(title);
        let _ = write!(header, ": {}", title.primary);
        if !title.secondary.is_empty() {
            let _ = write!(header, " / {}", title.secondary);
        }
    }
    if let Some(artist) = &result.matched_artist {
        let _ = write!(header, " - {artist}");
    }
    if result.has_syllable_timing {
        header.push_str(" [syllable-timed]");
    }
    header
}

/// Print every line of `result` with its start time
pub fn print_result(result: &LyricResult) {
    println!("{}", header(result));

    for line in result.timeline.iter().flat_map(|t| &t.lines) {
        println!("[{}] {}", format_timestamp(line.start_time), line.text);
    }
}

/// Print the instrumental verdict in place of lyrics
pub fn print_instrumental(result: &LyricResult) {
    println!("# {}: instrumental track, no lyrics", result.provider);
}

/// Time until the next line starts after `position`, if any
fn until_next_line(timeline: &Timeline, position: Duration) -> Option<Duration> {
    let next = timeline.lines.partition_point(|l| l.start_time <= position);
    timeline
        .lines
        .get(next)
        .map(|l| l.start_time.saturating_sub(position))
}

/// Drive `presenter` until the last line ends or `cancel` fires.
///
/// Prints a line whenever the displayed text changes. Returns `false` if
/// playback was interrupted.
pub async fn run(mut presenter: Presenter, clock: SimulatedClock, cancel: CancellationToken) -> bool {
    let end = presenter
        .timeline()
        .lines
        .last()
        .map_or(Duration::ZERO, |l| l.end_time);
    info!(
        target: LOG_TARGET,
        "Playing {} line(s) from {}",
        presenter.timeline().len(),
        format_timestamp(clock.position(Instant::now()))
    );

    let mut shown: Option<(Option<usize>, String)> = None;

    loop {
        let now = Instant::now();
        let position = clock.position(now);
        if position >= end {
            return true;
        }

        {
            let frame = presenter.tick(position, now);
            let current = (frame.line_index, frame.scroll.display_text);
            if shown.as_ref() != Some(&current) {
                if !current.1.is_empty() {
                    println!("[{}] {}", format_timestamp(position), current.1);
                }
                shown = Some(current);
            }
        }

        let mut delay = presenter.next_tick_delay();
        if let Some(next) = until_next_line(presenter.timeline(), position) {
            delay = delay.min(next);
        }
        let delay = delay.max(MIN_TICK);
        debug!(target: LOG_TARGET, "Next tick in {}ms", delay.as_millis());

        tokio::select! {
            () = cancel.cancelled() => return false,
            () = tokio::time::sleep(delay) => {}
        }
    }
}
