//! Command-line interface definition for ReviewLens
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for the interactive conversation, product listing,
//! and a backend status check.

use clap::{Parser, Subcommand};

/// ReviewLens - review regret analysis in the terminal
///
/// Pick a product (or paste a product URL), let the backend collect and
/// analyze its reviews, then talk through the regret points it found.
#[derive(Parser, Debug, Clone)]
#[command(name = "reviewlens")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the backend base URL
    #[arg(long)]
    pub api_url: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for ReviewLens
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive analysis conversation
    Chat {
        /// Entry mode: product (pick from the catalog) or url
        #[arg(short, long)]
        mode: Option<String>,

        /// Start right away with this product name
        #[arg(short, long, conflicts_with = "url")]
        product: Option<String>,

        /// Start right away with this product URL
        #[arg(short, long)]
        url: Option<String>,
    },

    /// List products available for analysis
    Products {
        /// Print the list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the backend's application settings
    Status {
        /// Print the settings as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            api_url: None,
            command: Commands::Status { json: false },
        }
    }
}
