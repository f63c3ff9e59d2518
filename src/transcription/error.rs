//! Transcription error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by transcription providers.
///
/// Configuration and file-existence failures are never retried; vendor
/// failures are retried by the shared wrapper before surfacing here.
#[derive(Error, Debug)]
pub enum TranscriptionError {
    #[error("Provider {provider} is not configured. {hint}")]
    NotConfigured {
        provider: &'static str,
        hint: &'static str,
    },

    #[error("Audio file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Provider {provider} failed: {message}")]
    Provider {
        provider: &'static str,
        message: String,
    },

    #[error("Provider {provider} timed out waiting for transcription")]
    Timeout { provider: &'static str },

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("No transcription providers configured")]
    NoProviderConfigured,
}

impl TranscriptionError {
    /// Build a provider failure from any vendor-side error message.
    pub fn provider(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Provider {
            provider,
            message: message.into(),
        }
    }
}
