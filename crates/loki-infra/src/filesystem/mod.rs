//! Data directory layout for Loki Chat.
//!
//! Everything Loki persists lives under one directory: the SQLite database
//! and the optional `config.toml`.

use std::path::PathBuf;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "LOKI_DATA_DIR";

/// Resolve the data directory.
///
/// Priority: `LOKI_DATA_DIR`, then `~/.loki`, then `./.loki`.
pub fn resolve_data_dir() -> PathBuf {
    data_dir_from(std::env::var(DATA_DIR_ENV).ok(), dirs::home_dir())
}

fn data_dir_from(env_value: Option<String>, home: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = env_value.filter(|d| !d.trim().is_empty()) {
        return PathBuf::from(dir);
    }

    // Use home directory fallback: ~/.loki
    if let Some(home) = home {
        return home.join(".loki");
    }

    // Last resort: current directory
    PathBuf::from(".loki")
}

/// Resolve the data directory and make sure it exists.
pub async fn ensure_data_dir() -> std::io::Result<PathBuf> {
    let dir = resolve_data_dir();
    tokio::fs::create_dir_all(&dir).await?;
    Ok(dir)
}
