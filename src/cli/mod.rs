//! CLI module for Dugout.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Dugout - MLB tool calling for conversational models
///
/// Lets a conversational model answer baseball questions by calling the MLB
/// stats API, over HTTP, a live voice WebSocket, or straight from the terminal.
#[derive(Parser, Debug)]
#[command(name = "dugout")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP and WebSocket server
    Serve {
        /// Host to bind to (defaults to the configured host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to the configured port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Answer a baseball question with the stats tools
    Ask {
        /// The question to ask
        query: String,
    },

    /// Summarize a game video
    Summarize {
        /// URI of the video (mp4)
        uri: String,
    },

    /// List the tools offered to the model
    Tools,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::parse_from(["dugout", "-vv", "serve", "--port", "9000"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Serve { host, port } => {
                assert_eq!(host, None);
                assert_eq!(port, Some(9000));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_ask() {
        let cli = Cli::parse_from(["dugout", "-c", "/tmp/dugout.toml", "ask", "Who won?"]);
        assert_eq!(cli.config.as_deref(), Some("/tmp/dugout.toml"));
        assert!(matches!(cli.command, Commands::Ask { ref query } if query == "Who won?"));
    }
}
