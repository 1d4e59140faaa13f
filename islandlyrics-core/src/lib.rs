pub mod config;
pub mod cursor;
pub mod engine;
pub mod error;
pub mod format;
pub mod http;
pub mod krc;
pub mod lrc;
pub mod lyrics;
pub mod pacer;
pub mod paths;
pub mod presenter;
pub mod provider;
pub mod scoring;
pub mod selector;
pub mod time;
pub mod title;
pub mod weight;

pub use config::{
    build_config_template, Config, FetchConfig, HttpConfig, LoggingConfig, ProvidersConfig,
    ScrollConfig, ScrollStrategy, ShiftMode,
};

/// Re-export toml error type for config parsing error handling
pub use toml::de::Error as TomlParseError;
pub use cursor::{CursorPosition, HighlightFrame, TimelineCursor};
pub use engine::{EngineContext, FetchOutcome, LyricsEngine, SongTag};
pub use error::CoreError;
pub use format::LyricFormat;
pub use http::build_client;
pub use krc::parse_krc;
pub use lrc::{has_time_tags, parse_lrc};
pub use lyrics::{LyricLine, LyricResult, SyllableInfo, Timeline, TimelineMetadata};
pub use pacer::{ScrollFrame, ScrollPacer, ScrollPhase, TempoTracker};
pub use paths::{config_path, log_file_path, CONFIG_DIR_NAME, CONFIG_FILE_NAME, LOG_FILE_NAME};
pub use presenter::{Presenter, PresenterFrame};
pub use provider::{select_by_duration, LyricsProvider, LyricsQuery};
pub use selector::LyricsSelector;
pub use time::DurationExt;
pub use title::{parse_title, ParsedTitle};
pub use weight::visual_weight;
