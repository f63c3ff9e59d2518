//! Transcription provider contract

use async_trait::async_trait;
use std::path::Path;

use crate::transcription::{TranscriptionError, TranscriptionResult};

/// A vendor speech-to-text adapter.
///
/// New vendors are added by implementing this trait against the
/// normalized [`TranscriptionResult`]; nothing else in the system
/// branches on vendor type.
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    /// Stable lowercase vendor identifier, used for routing, logging,
    /// and billing attribution.
    fn name(&self) -> &'static str;

    /// Whether the adapter has the credentials it needs. Must be
    /// side-effect-free so callers can pick a configured provider from a
    /// priority list without issuing network calls.
    fn is_configured(&self) -> bool;

    /// Transcribe a locally accessible audio file.
    ///
    /// Fails with `NotConfigured` before touching the filesystem or
    /// network when credentials are missing, and with `FileNotFound`
    /// when the path does not resolve to a readable file.
    async fn transcribe(&self, audio_path: &Path)
        -> Result<TranscriptionResult, TranscriptionError>;
}
