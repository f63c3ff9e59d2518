//! Azure Speech-to-Text provider
//!
//! Synchronous vendor: one REST recognition call. Azure reports offsets
//! and durations in ISO-8601 style `PT<seconds>S` strings.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use std::time::Instant;

use crate::config::Settings;
use crate::transcription::mime::{audio_content_type, estimate_duration_minutes};
use crate::transcription::retry::retry_api;
use crate::transcription::types::count_words;
use crate::transcription::{
    TranscriptSegment, TranscriptionError, TranscriptionProvider, TranscriptionResult,
};

pub struct AzureProvider {
    http: Client,
    subscription_key: Option<String>,
    region: String,
}

impl AzureProvider {
    pub const NAME: &'static str = "azure";

    pub fn new(http: Client, settings: &Settings) -> Self {
        let subscription_key = Some(settings.providers.azure.speech_key.trim().to_string())
            .filter(|key| !key.is_empty());

        Self {
            http,
            subscription_key,
            region: settings.providers.azure.region.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "https://{}.stt.speech.microsoft.com/speech/recognition/conversation/cognitiveservices/v1?language=en-US&format=detailed",
            self.region
        )
    }

    async fn request_recognition(
        &self,
        key: &str,
        audio: &[u8],
        content_type: &str,
    ) -> Result<AzureResponse, TranscriptionError> {
        let res = self
            .http
            .post(self.endpoint())
            .header("Ocp-Apim-Subscription-Key", key)
            .header("Content-Type", content_type)
            .header("Accept", "application/json")
            .body(audio.to_vec())
            .send()
            .await
            .map_err(|err| TranscriptionError::provider(Self::NAME, err.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(TranscriptionError::provider(
                Self::NAME,
                format!("{status} {body}"),
            ));
        }

        res.json::<AzureResponse>()
            .await
            .map_err(|err| TranscriptionError::provider(Self::NAME, err.to_string()))
    }
}

#[async_trait]
impl TranscriptionProvider for AzureProvider {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn is_configured(&self) -> bool {
        self.subscription_key.is_some()
    }

    async fn transcribe(
        &self,
        audio_path: &Path,
    ) -> Result<TranscriptionResult, TranscriptionError> {
        let key = self
            .subscription_key
            .as_deref()
            .ok_or(TranscriptionError::NotConfigured {
                provider: Self::NAME,
                hint: "Set providers.azure.speech_key or SCRIBE_AZURE_SPEECH_KEY.",
            })?;

        let started = Instant::now();

        let metadata = tokio::fs::metadata(audio_path)
            .await
            .map_err(|_| TranscriptionError::FileNotFound(audio_path.to_path_buf()))?;
        let estimated_minutes = estimate_duration_minutes(metadata.len());

        let audio = tokio::fs::read(audio_path)
            .await
            .map_err(|_| TranscriptionError::FileNotFound(audio_path.to_path_buf()))?;

        let content_type = audio_content_type(audio_path);

        let response = retry_api(Self::NAME, || {
            self.request_recognition(key, &audio, content_type)
        })
        .await?;

        let processing_time_ms = started.elapsed().as_millis() as u64;

        Ok(normalize(response, processing_time_ms, estimated_minutes))
    }
}

/// Parse an Azure duration like `PT5.24S` to seconds.
fn parse_pt_duration(duration: &str) -> f64 {
    duration
        .strip_prefix("PT")
        .and_then(|rest| rest.strip_suffix('S'))
        .and_then(|secs| secs.parse::<f64>().ok())
        .unwrap_or(0.0)
}

fn normalize(
    response: AzureResponse,
    processing_time_ms: u64,
    estimated_minutes: f64,
) -> TranscriptionResult {
    let full_text = response
        .combined_recognized_phrases
        .first()
        .map(|combined| combined.display.clone())
        .unwrap_or_else(|| {
            response
                .recognized_phrases
                .iter()
                .filter_map(|phrase| phrase.n_best.first())
                .map(|best| best.display.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        });

    let segments: Vec<TranscriptSegment> = response
        .recognized_phrases
        .iter()
        .filter_map(|phrase| {
            let best = phrase.n_best.first()?;
            let text = best.display.trim().to_string();
            if text.is_empty() {
                return None;
            }

            let offset = parse_pt_duration(&phrase.offset);
            let duration = parse_pt_duration(&phrase.duration);

            let mut segment = TranscriptSegment::new(offset, offset + duration, text);
            segment.confidence = best.confidence;
            Some(segment)
        })
        .collect();

    let duration_minutes = match response.duration.as_deref() {
        Some(duration) => parse_pt_duration(duration) / 60.0,
        None => estimated_minutes,
    };

    TranscriptionResult {
        word_count: count_words(&full_text),
        full_text,
        segments,
        language: "en".to_string(),
        model_used: "azure-speech".to_string(),
        processing_time_ms,
        speaker_count: None,
        duration_minutes,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AzureResponse {
    duration: Option<String>,
    #[serde(default)]
    combined_recognized_phrases: Vec<AzureCombinedPhrase>,
    #[serde(default)]
    recognized_phrases: Vec<AzurePhrase>,
}

#[derive(Debug, Deserialize)]
struct AzureCombinedPhrase {
    display: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AzurePhrase {
    offset: String,
    duration: String,
    #[serde(rename = "nBest", default)]
    n_best: Vec<AzureBest>,
}

#[derive(Debug, Deserialize)]
struct AzureBest {
    display: String,
    confidence: Option<f64>,
}
