//! Configuration loader for Loki Chat.
//!
//! Reads `config.toml` from the data directory (`~/.loki/` in production)
//! and deserializes it into [`LokiConfig`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::Path;

use loki_types::config::{LokiConfig, ProviderSettings};
use secrecy::SecretString;

/// Load configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`LokiConfig::default()`].
/// - If the file exists but cannot be read or parsed, logs a warning and
///   returns the default.
pub async fn load_config(data_dir: &Path) -> LokiConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return LokiConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return LokiConfig::default();
        }
    };

    match toml::from_str::<LokiConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            LokiConfig::default()
        }
    }
}

/// Read the provider API key from the environment variable named by
/// `settings.api_key_env`. Unset or blank values yield `None`.
pub fn resolve_api_key(settings: &ProviderSettings) -> Option<SecretString> {
    api_key_from(std::env::var(&settings.api_key_env).ok())
}

fn api_key_from(value: Option<String>) -> Option<SecretString> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(SecretString::from)
}
