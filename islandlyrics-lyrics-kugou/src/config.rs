//! Kugou provider configuration.

use const_format::concatcp;
use islandlyrics_core::{CoreError, ProvidersConfig};
use serde::{Deserialize, Serialize};

/// Provider name used in config file and results
pub const PROVIDER_NAME: &str = "kugou";

/// Kugou-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KugouProviderConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Score bonus for syllable-timed (KRC) results
    #[serde(default = "default_syllable_bias")]
    pub syllable_bias: i32,
    /// Score bonus for line-timed results
    #[serde(default = "default_plain_bias")]
    pub plain_bias: i32,
}

const fn default_enabled() -> bool {
    true
}

const fn default_syllable_bias() -> i32 {
    10
}

const fn default_plain_bias() -> i32 {
    5
}

impl Default for KugouProviderConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            syllable_bias: default_syllable_bias(),
            plain_bias: default_plain_bias(),
        }
    }
}

impl KugouProviderConfig {
    /// Extract Kugou config from the dynamic providers config.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be parsed.
    pub fn from_providers(providers: &ProvidersConfig) -> Result<Option<Self>, CoreError> {
        providers.get(PROVIDER_NAME)
    }
}

/// Config template for the Kugou provider.
/// This is appended to the base config template when creating a new config file.
pub const CONFIG_TEMPLATE: &str = concatcp!(
    "[providers.",
    PROVIDER_NAME,
    r#"]
enabled = true
# Score bonus for syllable-timed results
syllable_bias = 10
# Score bonus for line-timed results
plain_bias = 5
"#
);
