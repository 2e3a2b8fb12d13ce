//! OpenTelemetry GenAI Semantic Convention attribute names.
//!
//! `tracing` span macros need literal field names, so request attributes are
//! declared inline (e.g. `gen_ai.request.model = %model`). The constants
//! cover the response attributes recorded into an already-open span via
//! `Span::record`, plus the operation name values.

/// The number of input tokens consumed.
pub const GEN_AI_USAGE_INPUT_TOKENS: &str = "gen_ai.usage.input_tokens";

/// The number of output tokens generated.
pub const GEN_AI_USAGE_OUTPUT_TOKENS: &str = "gen_ai.usage.output_tokens";

/// The unique response ID from the provider.
pub const GEN_AI_RESPONSE_ID: &str = "gen_ai.response.id";

// --- Operation name values ---

/// Standard chat completion operation.
pub const OP_CHAT: &str = "chat";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_names_follow_convention() {
        for name in [
            GEN_AI_USAGE_INPUT_TOKENS,
            GEN_AI_USAGE_OUTPUT_TOKENS,
            GEN_AI_RESPONSE_ID,
        ] {
            assert!(name.starts_with("gen_ai."), "{name}");
        }
    }
}
