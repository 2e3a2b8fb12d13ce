//! Observability for Loki Chat: tracing subscriber setup and OpenTelemetry
//! GenAI attribute names.

pub mod genai_attrs;
pub mod tracing_setup;
