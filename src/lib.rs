//! scribe - Meeting-bot transcription core
//!
//! Vendor-neutral speech-to-text provider adapters plus board issue
//! aggregation for the project views that consume the transcripts.

pub mod board;
pub mod cli;
pub mod config;
pub mod transcription;

use thiserror::Error;

/// Main error type for scribe
#[derive(Error, Debug)]
pub enum ScribeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transcription error: {0}")]
    Transcription(#[from] transcription::TranscriptionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ScribeError>;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "scribe";
