//! Loki Chat CLI and REST API entry point.
//!
//! Binary name: `loki`
//!
//! Parses CLI arguments, initializes tracing, storage and the completion
//! provider, then dispatches to the command handler or starts the REST API
//! server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need tracing or app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "loki", &mut std::io::stdout());
        return Ok(());
    }

    loki_observe::tracing_setup::init_tracing(verbosity_filter(cli.verbose, cli.quiet), cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    loki_observe::tracing_setup::shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { port, host } => {
            let state = AppState::init().await?;
            let host = host.unwrap_or_else(|| state.config.server.host.clone());
            let port = port.unwrap_or(state.config.server.port);

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            tracing::info!(
                %addr,
                provider = state.chat_service.provider_name(),
                data_dir = %state.data_dir.display(),
                "Loki Chat API listening"
            );
            if !cli.quiet {
                println!(
                    "  {} Loki Chat API listening on {}",
                    console::style("⚡").bold(),
                    console::style(format!("http://{addr}/api/v1/chat")).cyan()
                );
                println!("  {}", console::style("Press Ctrl+C to stop").dim());
            }

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            if !cli.quiet {
                println!("\n  Server stopped.");
            }
        }

        Commands::List { limit } => {
            let (data_dir, config) = state::load_environment().await?;
            let repo = state::open_repository(&data_dir, &config).await?;
            cli::conversation::list_conversations(&repo, limit, cli.json).await?;
        }

        Commands::Show { id } => {
            let (data_dir, config) = state::load_environment().await?;
            let repo = state::open_repository(&data_dir, &config).await?;
            cli::conversation::show_conversation(&repo, &id, cli.json).await?;
        }

        Commands::Delete { id, force } => {
            let (data_dir, config) = state::load_environment().await?;
            let repo = state::open_repository(&data_dir, &config).await?;
            cli::conversation::delete_conversation(&repo, &id, force, cli.json).await?;
        }

        Commands::Check => {
            let (_, config) = state::load_environment().await?;
            cli::check::check_provider(&config, cli.json).await?;
        }

        Commands::Completions { .. } => {}
    }

    Ok(())
}

/// Default log filter for the given verbosity; `RUST_LOG` overrides it.
fn verbosity_filter(verbose: u8, quiet: bool) -> &'static str {
    match verbose {
        0 if quiet => "error",
        0 => "warn",
        1 => "info,loki=debug",
        _ => "trace",
    }
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
///
/// If a handler cannot be installed, that source is ignored and the other
/// one still stops the server.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
