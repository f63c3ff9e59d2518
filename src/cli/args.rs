//! CLI argument definitions using clap

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// scribe - Meeting-bot transcription and board reporting
#[derive(Parser, Debug)]
#[command(name = "scribe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Transcribe an audio file using the best available provider
    Transcribe {
        /// Path to the audio file (wav, webm, ogg, mp3, mp4, m4a, flac, aac)
        file: PathBuf,

        /// Force a specific provider instead of the priority order
        #[arg(short, long)]
        provider: Option<String>,

        /// Emit the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List transcription providers and their configuration state
    Providers {
        /// Emit the list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Aggregate issue counts from a JSON export
    Counts {
        /// Path to a JSON array of issues ({"status", "updated_at"})
        file: PathBuf,

        /// Days a done issue stays visible (defaults to config)
        #[arg(short, long)]
        done_days: Option<i64>,

        /// Emit the counts as JSON
        #[arg(long)]
        json: bool,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}
