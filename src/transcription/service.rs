//! Transcription service: provider selection over the adapter registry

use anyhow::Result;
use std::path::Path;

use crate::config::Settings;
use crate::transcription::providers::build_registry;
use crate::transcription::{TranscriptionError, TranscriptionProvider, TranscriptionResult};

/// A completed transcription with billing attribution.
#[derive(Debug)]
pub struct TranscriptionOutcome {
    /// Name of the provider that produced the result
    pub provider: String,

    pub result: TranscriptionResult,
}

/// Routes transcription calls to the best available vendor adapter.
pub struct TranscriptionService {
    providers: Vec<Box<dyn TranscriptionProvider>>,
    priority: Vec<String>,
}

impl TranscriptionService {
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self {
            providers: build_registry(settings)?,
            priority: settings.transcription.priority.clone(),
        })
    }

    /// Look up a provider by its stable name.
    pub fn provider(&self, name: &str) -> Option<&dyn TranscriptionProvider> {
        self.providers
            .iter()
            .map(|provider| provider.as_ref())
            .find(|provider| provider.name() == name)
    }

    /// Names of providers that currently hold credentials, in priority order.
    pub fn configured_providers(&self) -> Vec<&str> {
        self.priority
            .iter()
            .filter_map(|name| self.provider(name))
            .filter(|provider| provider.is_configured())
            .map(|provider| provider.name())
            .collect()
    }

    /// Every known provider name, in priority order.
    pub fn provider_names(&self) -> Vec<&str> {
        self.priority
            .iter()
            .filter_map(|name| self.provider(name))
            .map(|provider| provider.name())
            .collect()
    }

    fn select(&self) -> Result<&dyn TranscriptionProvider, TranscriptionError> {
        self.priority
            .iter()
            .filter_map(|name| self.provider(name))
            .find(|provider| provider.is_configured())
            .ok_or(TranscriptionError::NoProviderConfigured)
    }

    /// Transcribe using the first configured provider in priority order.
    pub async fn transcribe(
        &self,
        audio_path: &Path,
    ) -> Result<TranscriptionOutcome, TranscriptionError> {
        let provider = self.select()?;
        tracing::info!("Selected provider: {}", provider.name());

        self.run(provider, audio_path).await
    }

    /// Transcribe with a specific provider, for manual override.
    pub async fn transcribe_with(
        &self,
        audio_path: &Path,
        provider_name: &str,
    ) -> Result<TranscriptionOutcome, TranscriptionError> {
        let provider = self
            .provider(provider_name)
            .ok_or_else(|| TranscriptionError::UnknownProvider(provider_name.to_string()))?;

        self.run(provider, audio_path).await
    }

    async fn run(
        &self,
        provider: &dyn TranscriptionProvider,
        audio_path: &Path,
    ) -> Result<TranscriptionOutcome, TranscriptionError> {
        let result = provider.transcribe(audio_path).await?;

        tracing::info!(
            "Transcription completed in {}ms using {} ({:.2} minutes of audio)",
            result.processing_time_ms,
            provider.name(),
            result.duration_minutes
        );

        Ok(TranscriptionOutcome {
            provider: provider.name().to_string(),
            result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_fails_without_credentials() {
        let settings = Settings::default();
        let service = TranscriptionService::new(&settings).unwrap();

        assert!(service.configured_providers().is_empty());
        assert!(matches!(
            service.select(),
            Err(TranscriptionError::NoProviderConfigured)
        ));
    }

    #[test]
    fn provider_lookup_is_exact() {
        let settings = Settings::default();
        let service = TranscriptionService::new(&settings).unwrap();

        assert!(service.provider("whisper").is_some());
        assert!(service.provider("Whisper").is_none());
        assert!(service.provider("nope").is_none());
    }

    #[tokio::test]
    async fn transcribe_with_unknown_provider_errors() {
        let settings = Settings::default();
        let service = TranscriptionService::new(&settings).unwrap();

        let err = service
            .transcribe_with(Path::new("meeting.webm"), "nope")
            .await
            .unwrap_err();
        assert!(matches!(err, TranscriptionError::UnknownProvider(name) if name == "nope"));
    }

    #[tokio::test]
    async fn transcribe_with_unconfigured_provider_errors() {
        let settings = Settings::default();
        let service = TranscriptionService::new(&settings).unwrap();

        let err = service
            .transcribe_with(Path::new("meeting.webm"), "deepgram")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TranscriptionError::NotConfigured { provider: "deepgram", .. }
        ));
    }
}
