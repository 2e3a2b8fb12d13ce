//! Transfer objects exchanged over the HTTP API.
//!
//! Field names are camelCase on the wire. Timestamps are rendered with
//! [`crate::chat::format_timestamp`] (local time, no zone).

use serde::{Deserialize, Serialize};

use crate::chat::{ChatMessage, Conversation, format_timestamp};

/// Body of `POST /message`.
///
/// A missing `message` deserializes as empty and is rejected as blank by the
/// service rather than by the JSON extractor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// Result of a successful `POST /message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub conversation_id: String,
    pub title: String,
    pub user: String,
    pub assistant: String,
    /// Creation time of the assistant message.
    pub timestamp: String,
}

/// A message as presented to API clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: String,
    pub role: String,
    pub content: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,
}

impl From<&ChatMessage> for MessageResponse {
    fn from(message: &ChatMessage) -> Self {
        Self {
            id: message.id.to_string(),
            role: message.role.to_string(),
            content: message.content.clone(),
            created_at: format_timestamp(&message.created_at),
            token_count: message.token_count,
            processing_time_ms: message.processing_time_ms,
        }
    }
}

/// A conversation summary with its messages in chronological order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub id: String,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
    pub messages: Vec<MessageResponse>,
}

impl ConversationResponse {
    pub fn from_parts(conversation: &Conversation, messages: &[ChatMessage]) -> Self {
        Self {
            id: conversation.id.to_string(),
            title: conversation.title.clone(),
            created_at: format_timestamp(&conversation.created_at),
            updated_at: format_timestamp(&conversation.updated_at),
            messages: messages.iter().map(MessageResponse::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ConversationId;

    #[test]
    fn test_send_message_request_camel_case() {
        let request: SendMessageRequest =
            serde_json::from_str(r#"{"message":"hi","conversationId":"abc"}"#).unwrap();
        assert_eq!(request.message, "hi");
        assert_eq!(request.conversation_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_send_message_request_missing_fields_default() {
        let request: SendMessageRequest = serde_json::from_str("{}").unwrap();
        assert!(request.message.is_empty());
        assert!(request.conversation_id.is_none());

        let request: SendMessageRequest =
            serde_json::from_str(r#"{"message":"hi","conversationId":null}"#).unwrap();
        assert!(request.conversation_id.is_none());
    }

    #[test]
    fn test_message_response_omits_empty_metadata() {
        let message = ChatMessage::user(ConversationId::new(), "Hello");
        let json = serde_json::to_value(MessageResponse::from(&message)).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "Hello");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("tokenCount").is_none());
        assert!(json.get("processingTimeMs").is_none());
    }

    #[test]
    fn test_conversation_response_shape() {
        let conversation = Conversation::new("Trip Planning");
        let user = ChatMessage::user(conversation.id, "Where to?");
        let mut assistant = ChatMessage::assistant(conversation.id, "Lisbon.", user.created_at);
        assistant.token_count = Some(3);

        let response = ConversationResponse::from_parts(&conversation, &[user, assistant]);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["id"], conversation.id.to_string());
        assert_eq!(json["title"], "Trip Planning");
        assert!(json.get("updatedAt").is_some());
        assert_eq!(json["messages"].as_array().unwrap().len(), 2);
        assert_eq!(json["messages"][1]["role"], "assistant");
        assert_eq!(json["messages"][1]["tokenCount"], 3);
    }
}
