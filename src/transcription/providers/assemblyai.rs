//! AssemblyAI transcription provider
//!
//! Asynchronous vendor: upload the file, create a transcript job, then
//! poll until it completes. Vendor timestamps are in milliseconds.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::config::Settings;
use crate::transcription::mime::estimate_duration_minutes;
use crate::transcription::retry::retry_api;
use crate::transcription::types::count_words;
use crate::transcription::{
    TranscriptSegment, TranscriptionError, TranscriptionProvider, TranscriptionResult,
};

const BASE_URL: &str = "https://api.assemblyai.com/v2";
const MAX_WAIT: Duration = Duration::from_secs(600);
const POLL_INTERVAL: Duration = Duration::from_secs(3);
const SEGMENT_DURATION_MS: f64 = 30_000.0;

pub struct AssemblyAiProvider {
    http: Client,
    api_key: Option<String>,
}

impl AssemblyAiProvider {
    pub const NAME: &'static str = "assemblyai";

    pub fn new(http: Client, settings: &Settings) -> Self {
        let api_key = Some(settings.providers.assemblyai_api_key.trim().to_string())
            .filter(|key| !key.is_empty());

        Self { http, api_key }
    }

    async fn upload(&self, api_key: &str, audio: &[u8]) -> Result<UploadResponse, TranscriptionError> {
        let res = self
            .http
            .post(format!("{BASE_URL}/upload"))
            .header("Authorization", api_key)
            .header("Content-Type", "application/octet-stream")
            .body(audio.to_vec())
            .send()
            .await
            .map_err(|err| TranscriptionError::provider(Self::NAME, err.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(TranscriptionError::provider(
                Self::NAME,
                format!("upload failed: {status} {body}"),
            ));
        }

        res.json::<UploadResponse>()
            .await
            .map_err(|err| TranscriptionError::provider(Self::NAME, err.to_string()))
    }

    async fn create_transcript(
        &self,
        api_key: &str,
        audio_url: &str,
    ) -> Result<CreateResponse, TranscriptionError> {
        let res = self
            .http
            .post(format!("{BASE_URL}/transcript"))
            .header("Authorization", api_key)
            .json(&serde_json::json!({
                "audio_url": audio_url,
                "speaker_labels": true,
                "punctuate": true,
                "format_text": true,
            }))
            .send()
            .await
            .map_err(|err| TranscriptionError::provider(Self::NAME, err.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(TranscriptionError::provider(
                Self::NAME,
                format!("transcript request failed: {status} {body}"),
            ));
        }

        res.json::<CreateResponse>()
            .await
            .map_err(|err| TranscriptionError::provider(Self::NAME, err.to_string()))
    }

    async fn poll_transcript(
        &self,
        api_key: &str,
        id: &str,
    ) -> Result<TranscriptStatus, TranscriptionError> {
        let deadline = Instant::now() + MAX_WAIT;

        while Instant::now() < deadline {
            let status: TranscriptStatus = self
                .http
                .get(format!("{BASE_URL}/transcript/{id}"))
                .header("Authorization", api_key)
                .send()
                .await
                .map_err(|err| TranscriptionError::provider(Self::NAME, err.to_string()))?
                .json()
                .await
                .map_err(|err| TranscriptionError::provider(Self::NAME, err.to_string()))?;

            match status.status.as_str() {
                "completed" => return Ok(status),
                "error" => {
                    return Err(TranscriptionError::provider(
                        Self::NAME,
                        status.error.unwrap_or_else(|| "unknown error".to_string()),
                    ))
                }
                _ => tokio::time::sleep(POLL_INTERVAL).await,
            }
        }

        Err(TranscriptionError::Timeout {
            provider: Self::NAME,
        })
    }
}

#[async_trait]
impl TranscriptionProvider for AssemblyAiProvider {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn transcribe(
        &self,
        audio_path: &Path,
    ) -> Result<TranscriptionResult, TranscriptionError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(TranscriptionError::NotConfigured {
                provider: Self::NAME,
                hint: "Set providers.assemblyai_api_key or SCRIBE_ASSEMBLYAI_API_KEY.",
            })?;

        let started = Instant::now();

        let metadata = tokio::fs::metadata(audio_path)
            .await
            .map_err(|_| TranscriptionError::FileNotFound(audio_path.to_path_buf()))?;
        let estimated_minutes = estimate_duration_minutes(metadata.len());

        let audio = tokio::fs::read(audio_path)
            .await
            .map_err(|_| TranscriptionError::FileNotFound(audio_path.to_path_buf()))?;

        let uploaded = retry_api(Self::NAME, || self.upload(api_key, &audio)).await?;
        let created = retry_api(Self::NAME, || {
            self.create_transcript(api_key, &uploaded.upload_url)
        })
        .await?;

        let transcript = self.poll_transcript(api_key, &created.id).await?;

        let processing_time_ms = started.elapsed().as_millis() as u64;

        Ok(normalize(transcript, processing_time_ms, estimated_minutes))
    }
}

fn normalize(
    transcript: TranscriptStatus,
    processing_time_ms: u64,
    estimated_minutes: f64,
) -> TranscriptionResult {
    let utterances = transcript.utterances.unwrap_or_default();

    let segments = if !utterances.is_empty() {
        utterances
            .iter()
            .map(|u| {
                // Vendor times are milliseconds.
                let mut segment = TranscriptSegment::new(
                    u.start / 1000.0,
                    u.end / 1000.0,
                    u.text.trim().to_string(),
                );
                segment.confidence = Some(u.confidence);
                segment.speaker = Some(u.speaker.clone());
                segment
            })
            .collect()
    } else {
        group_words(&transcript.words)
    };

    let speakers: BTreeSet<&str> = utterances.iter().map(|u| u.speaker.as_str()).collect();
    let speaker_count = (!speakers.is_empty()).then_some(speakers.len());

    let full_text = transcript.text.unwrap_or_default();
    let duration_minutes = transcript
        .audio_duration
        .map(|secs| secs / 60.0)
        .unwrap_or(estimated_minutes);

    TranscriptionResult {
        word_count: count_words(&full_text),
        full_text,
        segments,
        language: transcript
            .language_code
            .unwrap_or_else(|| "en".to_string()),
        model_used: "assemblyai".to_string(),
        processing_time_ms,
        speaker_count,
        duration_minutes,
    }
}

fn group_words(words: &[AssemblyAiWord]) -> Vec<TranscriptSegment> {
    let mut segments: Vec<TranscriptSegment> = Vec::new();
    let mut current: Option<TranscriptSegment> = None;

    for word in words {
        match current.as_mut() {
            Some(segment) if word.start - segment.start_time * 1000.0 < SEGMENT_DURATION_MS => {
                segment.end_time = word.end / 1000.0;
                segment.text.push(' ');
                segment.text.push_str(&word.text);
            }
            _ => {
                if let Some(segment) = current.take() {
                    segments.push(segment);
                }
                let mut segment = TranscriptSegment::new(
                    word.start / 1000.0,
                    word.end / 1000.0,
                    word.text.clone(),
                );
                segment.confidence = Some(word.confidence);
                current = Some(segment);
            }
        }
    }

    if let Some(segment) = current {
        segments.push(segment);
    }

    segments
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptStatus {
    status: String,
    text: Option<String>,
    #[serde(default)]
    words: Vec<AssemblyAiWord>,
    utterances: Option<Vec<AssemblyAiUtterance>>,
    audio_duration: Option<f64>,
    language_code: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AssemblyAiWord {
    text: String,
    start: f64,
    end: f64,
    confidence: f64,
}

#[derive(Debug, Deserialize)]
struct AssemblyAiUtterance {
    text: String,
    start: f64,
    end: f64,
    confidence: f64,
    speaker: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_converts_utterance_times_to_seconds() {
        let transcript: TranscriptStatus = serde_json::from_str(
            r#"{
                "status": "completed",
                "text": "good morning team",
                "audio_duration": 300.0,
                "language_code": "en_us",
                "utterances": [
                    {"text": "good morning", "start": 0.0, "end": 1500.0, "confidence": 0.97, "speaker": "A"},
                    {"text": "team", "start": 1500.0, "end": 2100.0, "confidence": 0.92, "speaker": "B"}
                ]
            }"#,
        )
        .unwrap();

        let result = normalize(transcript, 20, 1.0);
        assert_eq!(result.segments[0].end_time, 1.5);
        assert_eq!(result.segments[1].start_time, 1.5);
        assert_eq!(result.speaker_count, Some(2));
        assert_eq!(result.duration_minutes, 5.0);
        assert_eq!(result.word_count, 3);
    }

    #[test]
    fn normalize_groups_words_without_utterances() {
        let transcript: TranscriptStatus = serde_json::from_str(
            r#"{
                "status": "completed",
                "text": "alpha beta",
                "words": [
                    {"text": "alpha", "start": 0.0, "end": 400.0, "confidence": 0.9},
                    {"text": "beta", "start": 600.0, "end": 900.0, "confidence": 0.8}
                ]
            }"#,
        )
        .unwrap();

        let result = normalize(transcript, 0, 2.5);
        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.segments[0].text, "alpha beta");
        assert_eq!(result.duration_minutes, 2.5);
        assert_eq!(result.language, "en");
    }
}
