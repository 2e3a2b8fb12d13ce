//! Application state wiring storage, provider and chat service together.
//!
//! The chat service is generic over its repository; AppState pins it to the
//! SQLite implementation from `loki-infra`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use loki_core::chat::{ChatService, CompletionSettings};
use loki_core::llm::box_provider::BoxLlmProvider;
use loki_infra::config::{load_config, resolve_api_key};
use loki_infra::filesystem::ensure_data_dir;
use loki_infra::llm::create_provider;
use loki_infra::sqlite::chat::SqliteConversationRepository;
use loki_infra::sqlite::pool::{DatabasePool, default_database_url};
use loki_types::config::LokiConfig;

/// Chat service pinned to the SQLite repository.
pub type ConcreteChatService = ChatService<SqliteConversationRepository>;

/// Shared application state, used by the HTTP handlers and the `check`
/// command.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    pub data_dir: PathBuf,
    pub config: Arc<LokiConfig>,
}

impl AppState {
    /// Initialize the application state: data dir, config, DB, provider.
    pub async fn init() -> anyhow::Result<Self> {
        let (data_dir, config) = load_environment().await?;
        let repo = open_repository(&data_dir, &config).await?;

        let api_key = resolve_api_key(&config.provider);
        let provider = create_provider(&config.provider, api_key).with_context(|| {
            format!(
                "could not configure provider '{}' (is {} set?)",
                config.provider.name, config.provider.api_key_env
            )
        })?;

        Ok(Self::from_parts(repo, provider, data_dir, config))
    }

    /// Assemble state from already-built parts.
    pub fn from_parts(
        repo: SqliteConversationRepository,
        provider: BoxLlmProvider,
        data_dir: PathBuf,
        config: LokiConfig,
    ) -> Self {
        let settings = CompletionSettings {
            model: config.provider.model.clone(),
            max_tokens: config.provider.max_tokens,
            temperature: config.provider.temperature,
        };
        let chat_service = ChatService::new(repo, provider, settings);

        Self {
            chat_service: Arc::new(chat_service),
            data_dir,
            config: Arc::new(config),
        }
    }
}

/// Create the data directory and load `config.toml` from it.
pub async fn load_environment() -> anyhow::Result<(PathBuf, LokiConfig)> {
    let data_dir = ensure_data_dir()
        .await
        .context("failed to create data directory")?;
    let config = load_config(&data_dir).await;
    Ok((data_dir, config))
}

/// Open the conversation store configured for `data_dir`.
///
/// Used directly by the offline CLI commands, which need no provider.
pub async fn open_repository(
    data_dir: &Path,
    config: &LokiConfig,
) -> anyhow::Result<SqliteConversationRepository> {
    let database_url = config
        .database_url
        .clone()
        .unwrap_or_else(|| default_database_url(data_dir));
    let pool = DatabasePool::new(&database_url)
        .await
        .with_context(|| format!("failed to open database at {database_url}"))?;
    Ok(SqliteConversationRepository::new(pool))
}
