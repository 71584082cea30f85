//! CLI argument parsing and config resolution

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::{config::GeminiConfig, error::Result};

/// gemini-chat: talk to a Gemini model from the terminal
#[derive(Debug, Parser)]
#[command(name = "gemini-chat")]
#[command(about = "Chat with Google Gemini models", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (defaults to <config dir>/gemini-chat/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Model identifier, e.g. gemini-2.5-flash
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// API key (overrides GEMINI_API_KEY)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// API base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Send a prompt and print the complete response as JSON
    Ask {
        /// The prompt to send
        prompt: String,
    },

    /// Send a prompt and print the response as it streams in
    Stream {
        /// The prompt to send
        prompt: String,
    },

    /// Show version information
    Version,
}

impl Cli {
    /// Parse CLI arguments from environment
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Build the client configuration: file, then environment, then flags
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed
    pub fn resolve_config(&self) -> Result<GeminiConfig> {
        let path = self
            .config
            .clone()
            .unwrap_or_else(GeminiConfig::default_config_path);

        let mut config = GeminiConfig::load_from_path(&path)?.with_env();

        if let Some(model) = &self.model {
            config = config.with_model(model);
        }
        if let Some(api_key) = &self.api_key {
            config = config.with_api_key(api_key);
        }
        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url);
        }

        Ok(config)
    }
}
