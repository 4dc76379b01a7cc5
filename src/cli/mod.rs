//! CLI definition for the `reel` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Reel agent runtime
#[derive(Parser, Debug)]
#[command(name = "reel", version, about = "Reel: media assistant runtime and MCP tool gateway")]
pub struct Cli {
    /// Path to a TOML config file (defaults to the platform config dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the MCP gateway and the tool REST mirror over HTTP
    Serve(ServeArgs),
    /// Chat with the agent from stdin
    Chat(ChatArgs),
}

/// Arguments for `reel serve`.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Listen address, overriding `mcp.bind`
    #[arg(short, long)]
    pub bind: Option<String>,
}

/// Arguments for `reel chat`.
#[derive(Parser, Debug)]
pub struct ChatArgs {
    /// Session id
    #[arg(short, long, default_value = "cli")]
    pub session: String,

    /// User id
    #[arg(short, long, default_value = "local")]
    pub user: String,

    /// Channel name used to pick the prompt addendum
    #[arg(long)]
    pub channel: Option<String>,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_serve_with_bind() {
        let cli = Cli::try_parse_from(["reel", "serve", "--bind", "0.0.0.0:9000"]).unwrap();
        match cli.command {
            Commands::Serve(args) => assert_eq!(args.bind.as_deref(), Some("0.0.0.0:9000")),
            other => panic!("expected Serve, got {other:?}"),
        }
    }

    #[test]
    fn parse_chat_with_defaults() {
        let cli = Cli::try_parse_from(["reel", "chat"]).unwrap();
        match cli.command {
            Commands::Chat(args) => {
                assert_eq!(args.session, "cli");
                assert_eq!(args.user, "local");
                assert!(args.channel.is_none());
            }
            other => panic!("expected Chat, got {other:?}"),
        }
    }

    #[test]
    fn parse_chat_with_session_and_global_config() {
        let cli = Cli::try_parse_from([
            "reel",
            "chat",
            "--session",
            "s1",
            "--user",
            "u1",
            "--config",
            "/tmp/reel.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/reel.toml")));
        match cli.command {
            Commands::Chat(args) => {
                assert_eq!(args.session, "s1");
                assert_eq!(args.user, "u1");
            }
            other => panic!("expected Chat, got {other:?}"),
        }
    }

    #[test]
    fn parse_missing_subcommand_is_error() {
        assert!(Cli::try_parse_from(["reel"]).is_err());
    }
}
