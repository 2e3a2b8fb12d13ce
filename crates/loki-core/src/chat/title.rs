//! Conversation title generation via LLM.
//!
//! `generate_title` asks the provider for a short title derived from the
//! first user message. Failure is never fatal: any provider error or empty
//! reply yields [`DEFAULT_TITLE`].

use loki_types::llm::{LlmError, Message};
use tracing::{Instrument, info_span, warn};

use crate::llm::box_provider::BoxLlmProvider;

use super::context::CompletionSettings;

/// Title used whenever generation fails or produces nothing.
pub const DEFAULT_TITLE: &str = "New Chat";

/// System prompt for the title generation call.
pub const TITLE_SYSTEM_PROMPT: &str = "Generate a short, concise title (maximum 6 words) for a conversation that starts with this message. Only respond with the title, nothing else.";

/// Output cap for the title call.
const TITLE_MAX_TOKENS: u32 = 50;

/// Generate a conversation title from the first user message.
///
/// The reply is trimmed and stripped of double quotes.
#[tracing::instrument(name = "generate_title", skip(provider, settings, first_message))]
pub async fn generate_title(
    provider: &BoxLlmProvider,
    settings: &CompletionSettings,
    first_message: &str,
) -> String {
    match request_title(provider, settings, first_message).await {
        Ok(title) if !title.is_empty() => title,
        Ok(_) => {
            warn!("Title generation returned nothing, using default title");
            DEFAULT_TITLE.to_string()
        }
        Err(e) => {
            warn!(error = %e, "Title generation failed, using default title");
            DEFAULT_TITLE.to_string()
        }
    }
}

async fn request_title(
    provider: &BoxLlmProvider,
    settings: &CompletionSettings,
    first_message: &str,
) -> Result<String, LlmError> {
    let mut request = settings.request(
        vec![Message::user(first_message)],
        Some(TITLE_SYSTEM_PROMPT.to_string()),
    );
    request.max_tokens = TITLE_MAX_TOKENS;

    let span = info_span!(
        "gen_ai.generate_title",
        gen_ai.operation.name = "generate_title",
        gen_ai.provider.name = provider.name(),
        gen_ai.request.model = %request.model,
        gen_ai.request.max_tokens = request.max_tokens,
    );

    let response = provider.complete(&request).instrument(span).await?;
    Ok(clean_title(&response.content))
}

/// Trim whitespace and remove every double quote.
fn clean_title(raw: &str) -> String {
    raw.trim().replace('"', "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::LlmProvider;
    use loki_types::llm::{CompletionRequest, CompletionResponse, MessageRole, Usage};
    use std::sync::{Arc, Mutex};

    struct ScriptedProvider {
        reply: Result<String, ()>,
        seen: Arc<Mutex<Vec<CompletionRequest>>>,
    }

    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            self.seen.lock().unwrap().push(request.clone());
            match &self.reply {
                Ok(content) => Ok(CompletionResponse {
                    id: "title-1".to_string(),
                    content: content.clone(),
                    model: request.model.clone(),
                    usage: Usage::default(),
                }),
                Err(()) => Err(LlmError::Provider {
                    message: "connection refused".to_string(),
                }),
            }
        }
    }

    fn settings() -> CompletionSettings {
        CompletionSettings {
            model: "test-model".to_string(),
            max_tokens: 1024,
            temperature: None,
        }
    }

    fn provider(reply: Result<&str, ()>) -> (BoxLlmProvider, Arc<Mutex<Vec<CompletionRequest>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let provider = ScriptedProvider {
            reply: reply.map(str::to_string),
            seen: seen.clone(),
        };
        (BoxLlmProvider::new(provider), seen)
    }

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title("  \"Trip Planning\"  "), "Trip Planning");
        assert_eq!(clean_title("Say \"hi\" politely"), "Say hi politely");
        assert_eq!(clean_title("  \"\"  "), "");
    }

    #[tokio::test]
    async fn test_generate_title_sends_instruction_and_message() {
        let (provider, seen) = provider(Ok("\"Weekend in Lisbon\"\n"));
        let title = generate_title(&provider, &settings(), "Plan my weekend in Lisbon").await;
        assert_eq!(title, "Weekend in Lisbon");

        let requests = seen.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].system.as_deref(), Some(TITLE_SYSTEM_PROMPT));
        assert_eq!(requests[0].messages.len(), 1);
        assert_eq!(requests[0].messages[0].role, MessageRole::User);
        assert_eq!(requests[0].messages[0].content, "Plan my weekend in Lisbon");
        assert_eq!(requests[0].max_tokens, TITLE_MAX_TOKENS);
    }

    #[tokio::test]
    async fn test_generate_title_falls_back_on_error() {
        let (provider, _) = provider(Err(()));
        let title = generate_title(&provider, &settings(), "Hello").await;
        assert_eq!(title, DEFAULT_TITLE);
    }

    #[tokio::test]
    async fn test_generate_title_falls_back_on_blank_reply() {
        let (provider, _) = provider(Ok("  \"\" "));
        let title = generate_title(&provider, &settings(), "Hello").await;
        assert_eq!(title, DEFAULT_TITLE);
    }
}
