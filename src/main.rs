//! scribe - Meeting-bot transcription core
//!
//! Entry point for the scribe CLI application.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use scribe::cli::{Cli, Commands};
use scribe::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over the verbose flag.
    let default_directive = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::Completions { shell } => {
            scribe::cli::completions::print(shell);
        }
        command => {
            // Load configuration only for runtime commands.
            let settings = Settings::load()?;

            match command {
                Commands::Transcribe {
                    file,
                    provider,
                    json,
                } => {
                    scribe::cli::commands::transcribe(&settings, &file, provider, json).await?;
                }
                Commands::Providers { json } => {
                    scribe::cli::commands::list_providers(&settings, json)?;
                }
                Commands::Counts {
                    file,
                    done_days,
                    json,
                } => {
                    scribe::cli::commands::issue_counts(&settings, &file, done_days, json)?;
                }
                Commands::Config(config_cmd) => {
                    scribe::cli::commands::config_command(&settings, config_cmd)?;
                }
                Commands::Completions { .. } => unreachable!(),
            }
        }
    }

    Ok(())
}
