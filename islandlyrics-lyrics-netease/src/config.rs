//! Netease provider configuration.

use const_format::concatcp;
use islandlyrics_core::{CoreError, ProvidersConfig};
use serde::{Deserialize, Serialize};

/// Provider name used in config file and results
pub const PROVIDER_NAME: &str = "netease";

/// Netease-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeteaseProviderConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Score bonus for results from this provider
    #[serde(default = "default_trust_bias")]
    pub trust_bias: i32,
    /// Number of search hits to consider when matching the duration hint
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,
}

const fn default_enabled() -> bool {
    true
}

const fn default_trust_bias() -> i32 {
    5
}

const fn default_search_limit() -> u32 {
    10
}

impl Default for NeteaseProviderConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            trust_bias: default_trust_bias(),
            search_limit: default_search_limit(),
        }
    }
}

impl NeteaseProviderConfig {
    /// Extract Netease config from the dynamic providers config.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be parsed.
    pub fn from_providers(providers: &ProvidersConfig) -> Result<Option<Self>, CoreError> {
        providers.get(PROVIDER_NAME)
    }
}

/// Config template for the Netease provider.
/// This is appended to the base config template when creating a new config file.
pub const CONFIG_TEMPLATE: &str = concatcp!(
    "[providers.",
    PROVIDER_NAME,
    r#"]
enabled = true
trust_bias = 5
# Search hits considered when matching the track duration
search_limit = 10
"#
);
