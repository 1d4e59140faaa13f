use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // Configuration errors
    #[error("Config file not found at {path}. A template has been created - please review it and restart.")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid config: {message}")]
    ConfigInvalid { message: String },

    #[error("Missing required config field: {field}")]
    ConfigMissingField { field: String },

    #[error("Failed to parse config file: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    // Provider errors
    #[error("Lyrics provider {provider} returned HTTP status {status}")]
    HttpStatus { provider: String, status: u16 },

    #[error("Lyrics provider {provider} sent an unexpected response: {reason}")]
    MalformedResponse { provider: String, reason: String },

    #[error("Failed to decode lyric payload: {reason}")]
    Decode { reason: String },

    #[error("No lyrics found for track: {title} by {artist}")]
    NoResult { title: String, artist: String },

    // Network errors
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Network middleware failed: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Shorthand for a [`CoreError::MalformedResponse`] raised by `provider`.
    pub fn malformed(provider: &str, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            provider: provider.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether this error came from the transport rather than the payload.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Middleware(_) | Self::HttpStatus { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
