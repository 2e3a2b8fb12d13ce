//! Provider connectivity check.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use loki_infra::config::resolve_api_key;
use loki_infra::llm::{create_provider, test_provider_connection};
use loki_types::config::LokiConfig;

/// Send a minimal completion through the configured provider and report
/// whether it answered.
///
/// # Examples
///
/// ```bash
/// loki check
/// loki check --json
/// ```
pub async fn check_provider(config: &LokiConfig, json: bool) -> Result<()> {
    let settings = &config.provider;
    let provider = create_provider(settings, resolve_api_key(settings)).with_context(|| {
        format!(
            "could not configure provider '{}' (is {} set?)",
            settings.name, settings.api_key_env
        )
    })?;

    let spinner = if json {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Contacting {}...", settings.name));
    spinner.enable_steady_tick(Duration::from_millis(80));

    let start = Instant::now();
    let result = test_provider_connection(&provider).await;
    let elapsed_ms = start.elapsed().as_millis();

    spinner.finish_and_clear();

    if json {
        let report = serde_json::json!({
            "provider": settings.name,
            "type": settings.provider_type.to_string(),
            "model": settings.model,
            "healthy": result.is_ok(),
            "latency_ms": elapsed_ms,
            "error": result.as_ref().err().map(|e| e.to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    match &result {
        Ok(()) => println!(
            "  {} {} ({}) answered in {}ms",
            style("✓").green().bold(),
            style(&settings.name).cyan(),
            settings.model,
            elapsed_ms
        ),
        Err(e) => println!(
            "  {} {} ({}) failed: {}",
            style("✗").red().bold(),
            style(&settings.name).cyan(),
            settings.model,
            e
        ),
    }
    println!();

    result.map_err(anyhow::Error::from)
}
