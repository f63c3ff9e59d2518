//! Gladia transcription provider
//!
//! Asynchronous vendor: multipart upload, start a transcription, poll
//! the returned result URL.

use async_trait::async_trait;
use reqwest::multipart;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::config::Settings;
use crate::transcription::mime::{audio_content_type, estimate_duration_minutes};
use crate::transcription::retry::retry_api;
use crate::transcription::types::count_words;
use crate::transcription::{
    TranscriptSegment, TranscriptionError, TranscriptionProvider, TranscriptionResult,
};

const BASE_URL: &str = "https://api.gladia.io/v2";
const MAX_WAIT: Duration = Duration::from_secs(600);
const POLL_INTERVAL: Duration = Duration::from_secs(2);

pub struct GladiaProvider {
    http: Client,
    api_key: Option<String>,
}

impl GladiaProvider {
    pub const NAME: &'static str = "gladia";

    pub fn new(http: Client, settings: &Settings) -> Self {
        let api_key = Some(settings.providers.gladia_api_key.trim().to_string())
            .filter(|key| !key.is_empty());

        Self { http, api_key }
    }

    async fn upload(
        &self,
        api_key: &str,
        audio: &[u8],
        file_name: &str,
        content_type: &str,
    ) -> Result<UploadResponse, TranscriptionError> {
        let part = multipart::Part::bytes(audio.to_vec())
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .map_err(|err| TranscriptionError::provider(Self::NAME, err.to_string()))?;
        let form = multipart::Form::new().part("audio", part);

        let res = self
            .http
            .post(format!("{BASE_URL}/upload"))
            .header("x-gladia-key", api_key)
            .multipart(form)
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

    async fn start_transcription(
        &self,
        api_key: &str,
        audio_url: &str,
    ) -> Result<StartResponse, TranscriptionError> {
        let res = self
            .http
            .post(format!("{BASE_URL}/transcription"))
            .header("x-gladia-key", api_key)
            .json(&serde_json::json!({
                "audio_url": audio_url,
                "diarization": true,
                "language_behaviour": "automatic single language",
            }))
            .send()
            .await
            .map_err(|err| TranscriptionError::provider(Self::NAME, err.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(TranscriptionError::provider(
                Self::NAME,
                format!("transcription request failed: {status} {body}"),
            ));
        }

        res.json::<StartResponse>()
            .await
            .map_err(|err| TranscriptionError::provider(Self::NAME, err.to_string()))
    }

    async fn poll_result(
        &self,
        api_key: &str,
        result_url: &str,
    ) -> Result<GladiaResult, TranscriptionError> {
        let deadline = Instant::now() + MAX_WAIT;

        while Instant::now() < deadline {
            let status: PollResponse = self
                .http
                .get(result_url)
                .header("x-gladia-key", api_key)
                .send()
                .await
                .map_err(|err| TranscriptionError::provider(Self::NAME, err.to_string()))?
                .json()
                .await
                .map_err(|err| TranscriptionError::provider(Self::NAME, err.to_string()))?;

            match status.status.as_str() {
                "done" => {
                    return status.result.ok_or_else(|| {
                        TranscriptionError::provider(Self::NAME, "done response missing result")
                    })
                }
                "error" => {
                    return Err(TranscriptionError::provider(
                        Self::NAME,
                        "transcription failed",
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
impl TranscriptionProvider for GladiaProvider {
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
                hint: "Set providers.gladia_api_key or SCRIBE_GLADIA_API_KEY.",
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
        let file_name = audio_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("audio");

        let uploaded = retry_api(Self::NAME, || {
            self.upload(api_key, &audio, file_name, content_type)
        })
        .await?;

        let start = retry_api(Self::NAME, || {
            self.start_transcription(api_key, &uploaded.audio_url)
        })
        .await?;

        let result = self.poll_result(api_key, &start.result_url).await?;

        let processing_time_ms = started.elapsed().as_millis() as u64;

        Ok(normalize(result, processing_time_ms, estimated_minutes))
    }
}

fn normalize(
    result: GladiaResult,
    processing_time_ms: u64,
    estimated_minutes: f64,
) -> TranscriptionResult {
    let transcription = result.transcription;

    let segments: Vec<TranscriptSegment> = transcription
        .utterances
        .iter()
        .map(|u| {
            let mut segment = TranscriptSegment::new(u.start, u.end, u.text.trim().to_string());
            segment.confidence = Some(u.confidence);
            segment.speaker = u.speaker.map(|id| format!("Speaker {id}"));
            segment
        })
        .collect();

    let speakers: BTreeSet<u32> = transcription
        .utterances
        .iter()
        .filter_map(|u| u.speaker)
        .collect();
    let speaker_count = (!speakers.is_empty()).then_some(speakers.len());

    let duration_minutes = result
        .metadata
        .audio_duration
        .map(|secs| secs / 60.0)
        .unwrap_or(estimated_minutes);

    TranscriptionResult {
        word_count: count_words(&transcription.full_transcript),
        full_text: transcription.full_transcript,
        segments,
        language: transcription
            .languages
            .into_iter()
            .next()
            .unwrap_or_else(|| "en".to_string()),
        model_used: "gladia".to_string(),
        processing_time_ms,
        speaker_count,
        duration_minutes,
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    audio_url: String,
}

#[derive(Debug, Deserialize)]
struct StartResponse {
    result_url: String,
}

#[derive(Debug, Deserialize)]
struct PollResponse {
    status: String,
    result: Option<GladiaResult>,
}

#[derive(Debug, Deserialize)]
struct GladiaResult {
    transcription: GladiaTranscription,
    metadata: GladiaMetadata,
}

#[derive(Debug, Deserialize)]
struct GladiaTranscription {
    full_transcript: String,
    #[serde(default)]
    utterances: Vec<GladiaUtterance>,
    #[serde(default)]
    languages: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GladiaMetadata {
    audio_duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct GladiaUtterance {
    text: String,
    start: f64,
    end: f64,
    confidence: f64,
    speaker: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_maps_utterances_and_language() {
        let result: GladiaResult = serde_json::from_str(
            r#"{
                "transcription": {
                    "full_transcript": "quick status update",
                    "utterances": [
                        {"text": " quick status ", "start": 0.0, "end": 2.5, "confidence": 0.88, "speaker": 1},
                        {"text": "update", "start": 2.5, "end": 3.0, "confidence": 0.91, "speaker": 1}
                    ],
                    "languages": ["fr", "en"]
                },
                "metadata": {"audio_duration": 180.0}
            }"#,
        )
        .unwrap();

        let normalized = normalize(result, 5, 1.0);
        assert_eq!(normalized.language, "fr");
        assert_eq!(normalized.segments[0].text, "quick status");
        assert_eq!(normalized.speaker_count, Some(1));
        assert_eq!(normalized.duration_minutes, 3.0);
    }

    #[test]
    fn normalize_defaults_without_metadata() {
        let result: GladiaResult = serde_json::from_str(
            r#"{
                "transcription": {"full_transcript": "hi"},
                "metadata": {}
            }"#,
        )
        .unwrap();

        let normalized = normalize(result, 0, 4.0);
        assert_eq!(normalized.language, "en");
        assert_eq!(normalized.duration_minutes, 4.0);
        assert_eq!(normalized.speaker_count, None);
    }
}
