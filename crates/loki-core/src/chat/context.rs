//! Completion request assembly.
//!
//! A new conversation is answered in simple mode: the user's message alone.
//! A continuing conversation is answered in contextual mode: a fixed system
//! message, the most recent [`CONTEXT_WINDOW`] stored messages, then the new
//! user message.

use loki_types::chat::ChatMessage;
use loki_types::llm::{CompletionRequest, Message};

/// Maximum number of prior messages sent with a contextual request.
pub const CONTEXT_WINDOW: usize = 20;

/// Leading system message of every contextual request.
pub const CONTEXT_SYSTEM_MESSAGE: &str =
    "You are a helpful AI assistant. Use the conversation history to provide contextual responses.";

/// Request-level system instruction of every contextual request.
pub const CONTEXT_INSTRUCTION: &str = "Generate a response based on the conversation context.";

/// Model parameters shared by every completion the service issues.
#[derive(Debug, Clone)]
pub struct CompletionSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
}

impl CompletionSettings {
    /// Request skeleton carrying these settings.
    pub fn request(&self, messages: Vec<Message>, system: Option<String>) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            messages,
            system,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

/// Build the single-message request used for the first turn of a conversation.
pub fn build_simple_request(settings: &CompletionSettings, user_message: &str) -> CompletionRequest {
    settings.request(vec![Message::user(user_message)], None)
}

/// Build a history-augmented request.
///
/// `history` must be in chronological order; only its last
/// [`CONTEXT_WINDOW`] entries are used.
pub fn build_context_request(
    settings: &CompletionSettings,
    history: &[ChatMessage],
    user_message: &str,
) -> CompletionRequest {
    let window = &history[history.len().saturating_sub(CONTEXT_WINDOW)..];

    let mut messages = Vec::with_capacity(window.len() + 2);
    messages.push(Message::system(CONTEXT_SYSTEM_MESSAGE));
    messages.extend(window.iter().map(|m| Message {
        role: m.role.into(),
        content: m.content.clone(),
    }));
    messages.push(Message::user(user_message));

    settings.request(messages, Some(CONTEXT_INSTRUCTION.to_string()))
}
