//! OpenAI-compatible client configuration.
//!
//! The conversational model is reached through an OpenAI-compatible chat
//! completions endpoint, so any provider exposing one can be configured.

use crate::config::ModelSettings;
use crate::error::{DugoutError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create a client for the configured endpoint, key and timeout.
pub fn create_client(settings: &ModelSettings) -> Result<Client<OpenAIConfig>> {
    let api_key = settings.api_key().ok_or_else(|| {
        DugoutError::Config(format!("{} is not set", settings.api_key_env))
    })?;

    let config = OpenAIConfig::new()
        .with_api_base(settings.api_base.trim_end_matches('/'))
        .with_api_key(api_key);

    create_client_with_timeout(config, Duration::from_secs(settings.timeout_secs))
}

/// Create a client from an explicit config with a custom timeout.
pub fn create_client_with_timeout(
    config: OpenAIConfig,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| DugoutError::Config(format!("Failed to create HTTP client: {}", e)))?;

    Ok(Client::with_config(config).with_http_client(http_client))
}
