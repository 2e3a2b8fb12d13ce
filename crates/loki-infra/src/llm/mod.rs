//! Completion provider implementations.
//!
//! Contains the concrete implementation of the [`LlmProvider`] trait defined
//! in `loki-core`, a provider factory ([`create_provider`]) that constructs
//! the right provider from [`ProviderSettings`], and a connection check
//! ([`test_provider_connection`]).
//!
//! [`LlmProvider`]: loki_core::llm::provider::LlmProvider

pub mod openai_compat;

use secrecy::SecretString;

use loki_core::llm::box_provider::BoxLlmProvider;
use loki_types::config::ProviderSettings;
use loki_types::llm::{CompletionRequest, LlmError, Message, ProviderType};

use self::openai_compat::OpenAiCompatibleProvider;
use self::openai_compat::config::{OLLAMA_BASE_URL, OPENAI_BASE_URL, OpenAiCompatConfig};

/// Create a [`BoxLlmProvider`] from [`ProviderSettings`].
///
/// # Errors
///
/// Returns [`LlmError::AuthenticationFailed`] if the provider type requires
/// an API key but none is provided.
pub fn create_provider(
    settings: &ProviderSettings,
    api_key: Option<SecretString>,
) -> Result<BoxLlmProvider, LlmError> {
    let config = match settings.provider_type {
        ProviderType::OpenAiCompatible => {
            let api_key = api_key.ok_or(LlmError::AuthenticationFailed)?;
            OpenAiCompatConfig {
                provider_name: settings.name.clone(),
                base_url: settings
                    .base_url
                    .clone()
                    .unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
                api_key,
                model: settings.model.clone(),
            }
        }
        ProviderType::Ollama => OpenAiCompatConfig {
            provider_name: settings.name.clone(),
            base_url: settings
                .base_url
                .clone()
                .unwrap_or_else(|| OLLAMA_BASE_URL.to_string()),
            api_key: api_key.unwrap_or_else(|| SecretString::from("ollama".to_string())),
            model: settings.model.clone(),
        },
    };

    tracing::debug!(
        provider = %config.provider_name,
        base_url = %config.base_url,
        model = %config.model,
        "Creating completion provider"
    );

    Ok(BoxLlmProvider::new(OpenAiCompatibleProvider::new(config)))
}

/// Test provider connectivity by sending a minimal completion request.
///
/// Sends a tiny "Hello" message with a minimal token budget.
pub async fn test_provider_connection(provider: &BoxLlmProvider) -> Result<(), LlmError> {
    let request = CompletionRequest {
        model: String::new(), // Provider uses its configured default
        messages: vec![Message::user("Hello")],
        system: None,
        max_tokens: 10,
        temperature: Some(0.0),
    };
    provider.complete(&request).await?;
    Ok(())
}
