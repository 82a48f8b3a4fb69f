//! CLI module for Delve.

pub mod commands;
mod output;
pub mod preflight;
mod terminal;

pub use output::Output;
pub use terminal::TerminalRenderer;

use crate::config::Variant;
use clap::{Parser, Subcommand};

/// Delve - research chat with web, YouTube and Reddit lookups
///
/// Ask questions in your terminal. The assistant decides when to search the
/// web, read a YouTube transcript or dig through Reddit, and cites what it used.
#[derive(Parser, Debug)]
#[command(name = "delve")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Assistant variant (web-search, reddit-strict, reddit)
    #[arg(long, global = true)]
    pub variant: Option<Variant>,

    /// LLM model to use (overrides LLM_MODEL and the config file)
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive chat session
    Chat,

    /// Ask a single question and print the answer
    Ask {
        /// The question to ask
        question: String,
    },

    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host from config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port from config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check credentials and configuration
    Doctor,

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

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
