//! Vendor adapter registry
//!
//! One adapter per vendor, all satisfying [`TranscriptionProvider`].
//! Callers look adapters up by name or take the configured subset in
//! priority order; nothing outside this module branches on vendor type.

mod assemblyai;
mod azure;
mod deepgram;
mod gladia;
mod speechmatics;
mod whisper;

pub use assemblyai::AssemblyAiProvider;
pub use azure::AzureProvider;
pub use deepgram::DeepgramProvider;
pub use gladia::GladiaProvider;
pub use speechmatics::SpeechmaticsProvider;
pub use whisper::WhisperProvider;

use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

use crate::config::Settings;
use crate::transcription::TranscriptionProvider;

/// Default provider order: cheapest per-minute rate first.
pub const PROVIDER_PRIORITY: [&str; 6] = [
    AssemblyAiProvider::NAME,
    DeepgramProvider::NAME,
    GladiaProvider::NAME,
    SpeechmaticsProvider::NAME,
    WhisperProvider::NAME,
    AzureProvider::NAME,
];

/// Build every vendor adapter over a shared HTTP client.
///
/// Adapters are always constructed, configured or not; filtering by
/// [`TranscriptionProvider::is_configured`] is the caller's concern.
pub fn build_registry(settings: &Settings) -> Result<Vec<Box<dyn TranscriptionProvider>>> {
    let http = Client::builder()
        .timeout(Duration::from_secs(
            settings.transcription.request_timeout_secs,
        ))
        .build()
        .context("Failed to build transcription HTTP client")?;

    let providers: Vec<Box<dyn TranscriptionProvider>> = vec![
        Box::new(AssemblyAiProvider::new(http.clone(), settings)),
        Box::new(DeepgramProvider::new(http.clone(), settings)),
        Box::new(GladiaProvider::new(http.clone(), settings)),
        Box::new(SpeechmaticsProvider::new(http.clone(), settings)),
        Box::new(WhisperProvider::new(http.clone(), settings)),
        Box::new(AzureProvider::new(http, settings)),
    ];

    let configured = providers.iter().filter(|p| p.is_configured()).count();
    tracing::debug!(
        "Initialized {} transcription providers ({configured} configured)",
        providers.len()
    );

    Ok(providers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_covers_the_priority_list() {
        let settings = Settings::default();
        let registry = build_registry(&settings).unwrap();

        let names: Vec<&str> = registry.iter().map(|provider| provider.name()).collect();
        for name in PROVIDER_PRIORITY {
            assert!(names.contains(&name), "missing provider: {name}");
        }
    }

    #[test]
    fn no_provider_is_configured_by_default() {
        let settings = Settings::default();
        for provider in build_registry(&settings).unwrap() {
            assert!(
                !provider.is_configured(),
                "{} should need credentials",
                provider.name()
            );
        }
    }
}
