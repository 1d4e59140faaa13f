//! HTTP client construction shared by the provider crates.

use crate::config::HttpConfig;
use crate::error::Result;
use reqwest::redirect;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};

/// Build a client from `config`.
///
/// Redirects are never followed. Transient failures are retried
/// `max_retries` times with exponential backoff; the default of 0 sends each
/// request exactly once.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized.
pub fn build_client(config: &HttpConfig) -> Result<ClientWithMiddleware> {
    let base_client = reqwest::Client::builder()
        .timeout(config.timeout())
        .connect_timeout(config.connect_timeout())
        .redirect(redirect::Policy::none())
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .user_agent(config.user_agent.as_str())
        .build()?;

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
    let client = ClientBuilder::new(base_client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build();

    Ok(client)
}
