//! LrcApi provider configuration.

use const_format::concatcp;
use islandlyrics_core::{CoreError, ProvidersConfig};
use serde::{Deserialize, Serialize};

/// Provider name used in config file and results
pub const PROVIDER_NAME: &str = "lrcapi";

/// Public LrcApi instance
pub const DEFAULT_BASE_URL: &str = "https://api.lrc.cx/lyrics";

/// LrcApi-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LrcApiProviderConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Score bonus for results from this provider
    #[serde(default = "default_trust_bias")]
    pub trust_bias: i32,
    /// Lyrics endpoint of the LrcApi instance to query
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

const fn default_enabled() -> bool {
    true
}

const fn default_trust_bias() -> i32 {
    55
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}

impl Default for LrcApiProviderConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            trust_bias: default_trust_bias(),
            base_url: default_base_url(),
        }
    }
}

impl LrcApiProviderConfig {
    /// Extract LrcApi config from the dynamic providers config.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be parsed.
    pub fn from_providers(providers: &ProvidersConfig) -> Result<Option<Self>, CoreError> {
        providers.get(PROVIDER_NAME)
    }

    /// Validate the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is empty.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.base_url.trim().is_empty() {
            return Err(CoreError::ConfigMissingField {
                field: "providers.lrcapi.base_url".into(),
            });
        }
        Ok(())
    }
}

/// Config template for the LrcApi provider.
/// This is appended to the base config template when creating a new config file.
pub const CONFIG_TEMPLATE: &str = concatcp!(
    "[providers.",
    PROVIDER_NAME,
    r#"]
enabled = true
trust_bias = 55
# Point this at a self-hosted instance if you run one
base_url = ""#,
    DEFAULT_BASE_URL,
    "\"\n"
);
