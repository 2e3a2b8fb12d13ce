//! CLI command definitions and dispatch for the `loki` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod check;
pub mod conversation;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Chat with a completion provider and keep the history.
#[derive(Parser)]
#[command(name = "loki", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on (overrides config.toml).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides config.toml).
        #[arg(long)]
        host: Option<String>,
    },

    /// List conversations, most recently updated first.
    #[command(alias = "ls")]
    List {
        /// Show at most this many conversations.
        #[arg(short, long)]
        limit: Option<i64>,
    },

    /// Show a conversation with its messages.
    Show {
        /// Conversation ID.
        id: String,
    },

    /// Delete a conversation and its messages.
    #[command(alias = "rm")]
    Delete {
        /// Conversation ID.
        id: String,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        force: bool,
    },

    /// Check that the configured completion provider answers.
    Check,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        <Cli as clap::CommandFactory>::command().debug_assert();
    }

    #[test]
    fn test_serve_overrides_are_optional() {
        let cli = Cli::try_parse_from(["loki", "serve"]).unwrap();
        assert!(matches!(cli.command, Commands::Serve { port: None, host: None }));

        let cli = Cli::try_parse_from(["loki", "-vv", "serve", "--port", "9000"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Serve { port: Some(9000), .. }));
    }

    #[test]
    fn test_delete_flags() {
        let cli = Cli::try_parse_from(["loki", "rm", "abc", "--force", "--json"]).unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Delete { id, force } => {
                assert_eq!(id, "abc");
                assert!(force);
            }
            _ => panic!("expected delete"),
        }
    }
}
