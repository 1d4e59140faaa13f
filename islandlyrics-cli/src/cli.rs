use clap::{Args, Parser, Subcommand};
use islandlyrics_core::time::duration_from_secs_f64;
use islandlyrics_core::LyricsQuery;
use std::time::Duration;

/// Fetch synchronized lyrics and follow them in the terminal
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch the best lyrics for a track and print them with timestamps
    Fetch(TrackArgs),
    /// Fetch lyrics and play them back against a simulated playback clock
    Play {
        #[command(flatten)]
        track: TrackArgs,
        /// Playback position to start from, in seconds
        #[arg(long, default_value_t = 0.0)]
        start: f64,
    },
}

#[derive(Args, Debug, Clone)]
pub struct TrackArgs {
    /// Track title
    pub title: String,
    /// Track artist
    #[arg(default_value = "")]
    pub artist: String,
    /// Track length in seconds, used to choose between search hits
    #[arg(long)]
    pub duration: Option<f64>,
    /// Only query these providers (e.g. "kugou,lrcapi")
    #[arg(long, value_delimiter = ',')]
    pub providers: Vec<String>,
}

impl TrackArgs {
    pub fn query(&self) -> LyricsQuery {
        let query = LyricsQuery::new(self.title.trim(), self.artist.trim());
        match self.duration.and_then(duration_from_secs_f64) {
            Some(duration) => query.with_duration(duration),
            None => query,
        }
    }

    /// Whether `name` passes the `--providers` filter
    pub fn wants(&self, name: &str) -> bool {
        self.providers.is_empty()
            || self
                .providers
                .iter()
                .any(|p| p.trim().eq_ignore_ascii_case(name))
    }
}

impl Command {
    pub const fn track(&self) -> &TrackArgs {
        match self {
            Self::Fetch(track) | Self::Play { track, .. } => track,
        }
    }

    /// Start position for `play`
    pub fn start(&self) -> Duration {
        match self {
            Self::Fetch(_) => Duration::ZERO,
            Self::Play { start, .. } => duration_from_secs_f64(*start).unwrap_or_default(),
        }
    }
}
