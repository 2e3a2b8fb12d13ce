//! Chat service orchestrating conversation lifecycle and message persistence.
//!
//! ChatService coordinates the ConversationRepository and the completion
//! provider: it resolves or creates conversations, assembles completion
//! requests, persists each user/assistant exchange, and maps entities to
//! transfer objects for the API layer.

use std::time::Instant;

use loki_types::chat::{ChatMessage, Conversation, ConversationId, format_timestamp};
use loki_types::dto::{ConversationResponse, MessageResponse, SendMessageResponse};
use loki_types::error::ChatError;
use loki_types::llm::{CompletionRequest, CompletionResponse, LlmError};
use tracing::{Instrument, error, info, info_span};

use crate::chat::context::{CompletionSettings, build_context_request, build_simple_request};
use crate::chat::repository::ConversationRepository;
use crate::chat::title::generate_title;
use crate::llm::box_provider::BoxLlmProvider;

/// Number of conversations returned by [`ChatService::recent_conversations`].
pub const RECENT_LIMIT: i64 = 10;

/// Default page size for [`ChatService::get_history`].
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Largest accepted page size for [`ChatService::get_history`].
pub const MAX_PAGE_SIZE: i64 = 100;

/// Orchestrates conversations between the store and the completion provider.
///
/// Generic over `ConversationRepository` so loki-core never depends on
/// loki-infra. The provider is type-erased and chosen at start-up.
pub struct ChatService<C: ConversationRepository> {
    repo: C,
    provider: BoxLlmProvider,
    settings: CompletionSettings,
}

impl<C: ConversationRepository> ChatService<C> {
    pub fn new(repo: C, provider: BoxLlmProvider, settings: CompletionSettings) -> Self {
        Self {
            repo,
            provider,
            settings,
        }
    }

    /// Name of the configured completion provider.
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Send a user message, starting a new conversation when no id is given.
    ///
    /// A new conversation is titled by the provider and answered in simple
    /// mode; an existing one is answered with up to the last 20 messages as
    /// context. If the reply cannot be obtained or stored, a conversation
    /// created by this call is deleted again before the error is returned.
    #[tracing::instrument(
        name = "process_message",
        skip(self, message),
        fields(conversation_id = conversation_id.unwrap_or("new"))
    )]
    pub async fn process_message(
        &self,
        message: &str,
        conversation_id: Option<&str>,
    ) -> Result<SendMessageResponse, ChatError> {
        if message.trim().is_empty() {
            return Err(ChatError::Validation("Message cannot be empty".to_string()));
        }

        let existing = conversation_id.map(str::trim).filter(|id| !id.is_empty());

        let (conversation, request, is_new) = match existing {
            None => {
                let title = generate_title(&self.provider, &self.settings, message).await;
                let conversation = self
                    .repo
                    .create_conversation(&Conversation::new(title))
                    .await?;
                info!(
                    conversation_id = %conversation.id,
                    title = %conversation.title,
                    "Conversation created"
                );
                let request = build_simple_request(&self.settings, message);
                (conversation, request, true)
            }
            Some(raw) => {
                let conversation = self.resolve(raw).await?;
                let history = self.repo.get_messages(&conversation.id).await?;
                info!(
                    conversation_id = %conversation.id,
                    prior_messages = history.len(),
                    "Continuing conversation"
                );
                let request = build_context_request(&self.settings, &history, message);
                (conversation, request, false)
            }
        };

        let started = Instant::now();
        let response = match self.complete(&request).await {
            Ok(response) => response,
            Err(e) => {
                error!(
                    conversation_id = %conversation.id,
                    provider = self.provider.name(),
                    error = %e,
                    "Completion failed"
                );
                if is_new {
                    self.discard(&conversation.id).await;
                }
                return Err(ChatError::Provider(e));
            }
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        // Contextual replies are trimmed; first replies are kept verbatim.
        let reply = if is_new {
            response.content
        } else {
            response.content.trim().to_string()
        };

        let user = ChatMessage::user(conversation.id, message);
        let mut assistant = ChatMessage::assistant(conversation.id, reply, user.created_at);
        assistant.token_count = Some(response.usage.output_tokens);
        assistant.processing_time_ms = Some(elapsed_ms);

        if let Err(e) = self
            .repo
            .append_exchange(&conversation.id, &user, &assistant, assistant.created_at)
            .await
        {
            error!(
                conversation_id = %conversation.id,
                error = %e,
                "Failed to persist message exchange"
            );
            if is_new {
                self.discard(&conversation.id).await;
            }
            return Err(e.into());
        }

        Ok(SendMessageResponse {
            conversation_id: conversation.id.to_string(),
            title: conversation.title,
            user: user.content,
            assistant: assistant.content,
            timestamp: format_timestamp(&assistant.created_at),
        })
    }

    /// All conversations, most recently updated first, with their messages.
    pub async fn list_conversations(&self) -> Result<Vec<ConversationResponse>, ChatError> {
        let conversations = self.repo.list_conversations(None).await?;
        self.with_messages(conversations).await
    }

    /// The [`RECENT_LIMIT`] most recently updated conversations.
    pub async fn recent_conversations(&self) -> Result<Vec<ConversationResponse>, ChatError> {
        let conversations = self.repo.list_conversations(Some(RECENT_LIMIT)).await?;
        self.with_messages(conversations).await
    }

    /// Conversations whose title contains `query`, ignoring case.
    pub async fn search_conversations(
        &self,
        query: &str,
    ) -> Result<Vec<ConversationResponse>, ChatError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ChatError::Validation(
                "Search query cannot be empty".to_string(),
            ));
        }
        let conversations = self.repo.search_conversations(query).await?;
        self.with_messages(conversations).await
    }

    /// One conversation with its full message list.
    pub async fn get_conversation(&self, id: &str) -> Result<ConversationResponse, ChatError> {
        let conversation = self.resolve(id).await?;
        let messages = self.repo.get_messages(&conversation.id).await?;
        Ok(ConversationResponse::from_parts(&conversation, &messages))
    }

    /// Messages of a conversation, oldest first.
    pub async fn get_messages(&self, id: &str) -> Result<Vec<MessageResponse>, ChatError> {
        let conversation = self.resolve(id).await?;
        let messages = self.repo.get_messages(&conversation.id).await?;
        Ok(messages.iter().map(MessageResponse::from).collect())
    }

    /// One page of messages, newest first.
    ///
    /// `page` must be non-negative and `size` within `1..=MAX_PAGE_SIZE`.
    pub async fn get_history(
        &self,
        id: &str,
        page: i64,
        size: i64,
    ) -> Result<Vec<MessageResponse>, ChatError> {
        if page < 0 {
            return Err(ChatError::Validation(
                "Page number must be non-negative".to_string(),
            ));
        }
        if size <= 0 || size > MAX_PAGE_SIZE {
            return Err(ChatError::Validation(format!(
                "Page size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        let conversation = self.resolve(id).await?;
        // An offset past i64::MAX is past the end of any conversation.
        let Some(offset) = page.checked_mul(size) else {
            return Ok(Vec::new());
        };
        let messages = self
            .repo
            .get_message_page(&conversation.id, offset, size)
            .await?;
        Ok(messages.iter().map(MessageResponse::from).collect())
    }

    /// Rename a conversation. The stored title is trimmed.
    pub async fn rename_conversation(
        &self,
        id: &str,
        title: &str,
    ) -> Result<ConversationResponse, ChatError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ChatError::Validation("Title cannot be empty".to_string()));
        }

        let conversation_id = parse_id(id)?;
        self.repo.update_title(&conversation_id, title).await?;
        info!(conversation_id = %conversation_id, title, "Conversation renamed");

        self.get_conversation(id).await
    }

    /// Delete a conversation and all of its messages.
    pub async fn delete_conversation(&self, id: &str) -> Result<(), ChatError> {
        let conversation_id = parse_id(id)?;
        self.repo.delete_conversation(&conversation_id).await?;
        info!(conversation_id = %conversation_id, "Conversation deleted");
        Ok(())
    }

    async fn resolve(&self, id: &str) -> Result<Conversation, ChatError> {
        let conversation_id = parse_id(id)?;
        self.repo
            .get_conversation(&conversation_id)
            .await?
            .ok_or(ChatError::ConversationNotFound)
    }

    async fn with_messages(
        &self,
        conversations: Vec<Conversation>,
    ) -> Result<Vec<ConversationResponse>, ChatError> {
        let mut responses = Vec::with_capacity(conversations.len());
        for conversation in &conversations {
            let messages = self.repo.get_messages(&conversation.id).await?;
            responses.push(ConversationResponse::from_parts(conversation, &messages));
        }
        Ok(responses)
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let span = info_span!(
            "gen_ai.chat",
            gen_ai.operation.name = "chat",
            gen_ai.provider.name = self.provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.request.temperature = ?request.temperature,
            message_count = request.messages.len(),
        );
        self.provider.complete(request).instrument(span).await
    }

    /// Compensating delete for a conversation created by a failed call.
    async fn discard(&self, id: &ConversationId) {
        match self.repo.delete_conversation(id).await {
            Ok(()) => info!(conversation_id = %id, "Removed conversation after failed first exchange"),
            Err(e) => error!(
                conversation_id = %id,
                error = %e,
                "Failed to remove conversation after failed first exchange"
            ),
        }
    }
}

/// Parse a textual id; malformed ids are reported as not found.
fn parse_id(id: &str) -> Result<ConversationId, ChatError> {
    id.parse().map_err(|_| ChatError::ConversationNotFound)
}
