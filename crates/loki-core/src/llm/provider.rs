//! LlmProvider trait definition.
//!
//! This is the core abstraction that every completion backend implements.
//! Uses RPITIT for `complete`; see `BoxLlmProvider` for dynamic dispatch.

use loki_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for completion provider backends (OpenAI, Ollama, ...).
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in loki-infra (e.g., `OpenAiCompatibleProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "openai", "ollama").
    fn name(&self) -> &str;

    /// Send a completion request and receive the full response.
    ///
    /// Called exactly once per attempt; implementations must not retry.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
