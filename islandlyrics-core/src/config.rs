use crate::error::{CoreError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub scroll: ScrollConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Per-provider tables, interpreted by each provider crate
    #[serde(default)]
    pub providers: ProvidersConfig,
}

/// Settings shared by every provider's HTTP client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Transient-failure retries; 0 sends each request once
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default = "default_true")]
    pub accept_invalid_certs: bool,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

const fn default_timeout_secs() -> u64 {
    10
}

const fn default_true() -> bool {
    true
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}

impl HttpConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_timeout_secs(),
            max_retries: 0,
            accept_invalid_certs: true,
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Deadline for one batch of concurrent provider calls
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,
    /// Retry once with a cleaned title when nothing usable came back
    #[serde(default = "default_true")]
    pub retry_with_clean_title: bool,
}

const fn default_deadline_ms() -> u64 {
    10_000
}

impl FetchConfig {
    #[must_use]
    pub const fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            deadline_ms: default_deadline_ms(),
            retry_with_clean_title: true,
        }
    }
}

/// How far the paced scroller moves per step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShiftMode {
    /// Two ideographs, or up to the next word for Latin text
    #[default]
    Smart,
    /// A full display window
    Page,
}

/// What drives the scroll offset of an over-long line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScrollStrategy {
    /// Pause, step at the learned tempo, pause
    #[default]
    Paced,
    /// Follow the playback position through the line when timings are known
    Timed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollConfig {
    /// Display capacity in weight units (an ideograph weighs 2)
    #[serde(default = "default_max_display_weight")]
    pub max_display_weight: usize,
    /// Stop advancing once at most this much weight remains
    #[serde(default = "default_compensation_threshold")]
    pub compensation_threshold: usize,
    #[serde(default = "default_initial_pause_ms")]
    pub initial_pause_ms: u64,
    #[serde(default = "default_final_pause_ms")]
    pub final_pause_ms: u64,
    /// Step delay used until enough line timings were observed
    #[serde(default = "default_step_delay_ms")]
    pub default_step_delay_ms: u64,
    #[serde(default)]
    pub shift: ShiftMode,
    #[serde(default)]
    pub strategy: ScrollStrategy,
}

const fn default_max_display_weight() -> usize {
    18
}

const fn default_compensation_threshold() -> usize {
    8
}

const fn default_initial_pause_ms() -> u64 {
    1000
}

const fn default_final_pause_ms() -> u64 {
    500
}

const fn default_step_delay_ms() -> u64 {
    1800
}

impl ScrollConfig {
    #[must_use]
    pub const fn initial_pause(&self) -> Duration {
        Duration::from_millis(self.initial_pause_ms)
    }

    #[must_use]
    pub const fn final_pause(&self) -> Duration {
        Duration::from_millis(self.final_pause_ms)
    }

    #[must_use]
    pub const fn default_step_delay(&self) -> Duration {
        Duration::from_millis(self.default_step_delay_ms)
    }
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            max_display_weight: default_max_display_weight(),
            compensation_threshold: default_compensation_threshold(),
            initial_pause_ms: default_initial_pause_ms(),
            final_pause_ms: default_final_pause_ms(),
            default_step_delay_ms: default_step_delay_ms(),
            shift: ShiftMode::default(),
            strategy: ScrollStrategy::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write logs to a file next to the config
    #[serde(default)]
    pub enabled: bool,
}

/// Dynamic `[providers.<name>]` tables.
///
/// The core does not know the providers' option types; each provider crate
/// pulls its own table out with [`ProvidersConfig::get`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProvidersConfig(HashMap<String, toml::Value>);

impl ProvidersConfig {
    /// Deserialize the table for `name`, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the table does not match `T`.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        self.0
            .get(name)
            .map(|value| value.clone().try_into::<T>())
            .transpose()
            .map_err(CoreError::from)
    }

    /// Whether a table exists for `name`
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }
}

impl Config {
    /// Get the configuration directory path (~/.config/islandlyrics/)
    #[must_use]
    pub fn config_dir() -> PathBuf {
        crate::paths::config_dir()
    }

    /// Get the config file path (~/.config/islandlyrics/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load config from file or create template on first run.
    ///
    /// `provider_templates` are appended to the generated file so every
    /// compiled-in provider documents its own table.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigNotFound`] after writing the template, or an
    /// error if the file cannot be read, parsed, or fails validation.
    pub fn load_or_create(provider_templates: &[&str]) -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }

            fs::write(&config_path, build_config_template(provider_templates))?;

            return Err(CoreError::ConfigNotFound { path: config_path });
        }

        let content = fs::read_to_string(&config_path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid TOML or fails validation.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pacer and selector cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigInvalid`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.scroll.max_display_weight == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "scroll.max_display_weight must be positive".to_string(),
            });
        }
        if self.scroll.compensation_threshold >= self.scroll.max_display_weight {
            return Err(CoreError::ConfigInvalid {
                message: "scroll.compensation_threshold must be below scroll.max_display_weight"
                    .to_string(),
            });
        }
        if self.fetch.deadline_ms == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "fetch.deadline_ms must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Base template followed by each provider's fragment
#[must_use]
pub fn build_config_template(provider_templates: &[&str]) -> String {
    let mut template = CONFIG_TEMPLATE.to_string();
    for fragment in provider_templates {
        template.push('\n');
        template.push_str(fragment);
    }
    template
}

const CONFIG_TEMPLATE: &str = r##"# Island Lyrics Configuration
# ~/.config/islandlyrics/config.toml

[http]
timeout_secs = 10
connect_timeout_secs = 10
# Retries on transient failures (0 = each request is sent once)
max_retries = 0
# Several lyric hosts serve broken certificate chains
accept_invalid_certs = true
user_agent = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36"

[fetch]
# Deadline for one round of concurrent provider lookups
deadline_ms = 10000
# Retry once with "(Live)", "feat. X" etc. stripped from the title
retry_with_clean_title = true

[scroll]
# Display capacity in weight units: ideographs, kana and Hangul weigh 2
max_display_weight = 18
# Stop scrolling once this much weight or less remains
compensation_threshold = 8
initial_pause_ms = 1000
final_pause_ms = 500
default_step_delay_ms = 1800
# "smart" (word or two ideographs per step) or "page" (a full window per step)
shift = "smart"
# "paced" (learned tempo) or "timed" (follow playback position within the line)
strategy = "paced"

[logging]
# Write logs to ~/.config/islandlyrics/islandlyrics.log
enabled = false
"##;
