//! ReviewLens - review regret analysis in the terminal
//!
#![doc = "ReviewLens - review regret analysis in the terminal"]
#![doc = "Main entry point for the ReviewLens command-line client."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use reviewlens::cli::{Cli, Commands};
use reviewlens::commands;
use reviewlens::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Chat { mode, product, url } => {
            tracing::info!("Starting interactive conversation");
            if let Some(m) = &mode {
                tracing::debug!("Using entry mode override: {}", m);
            }
            if let Some(p) = &product {
                tracing::debug!("Starting with product: {}", p);
            }
            if let Some(u) = &url {
                tracing::debug!("Starting with URL: {}", u);
            }

            // Moves `config` into the handler (match arms are exclusive)
            commands::chat::run_chat(config, mode, product, url).await?;
            Ok(())
        }
        Commands::Products { json } => {
            tracing::info!("Listing products");
            commands::catalog::list_products(&config, json).await?;
            Ok(())
        }
        Commands::Status { json } => {
            tracing::info!("Checking backend status");
            commands::catalog::show_status(&config, json).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// `RUST_LOG` wins when set; otherwise `--verbose` turns on debug output.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "reviewlens=debug"
    } else {
        "reviewlens=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
