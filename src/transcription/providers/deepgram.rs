//! Deepgram transcription provider
//!
//! Synchronous vendor: one listen call returns the full result.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Instant;

use crate::config::Settings;
use crate::transcription::mime::{audio_content_type, estimate_duration_minutes};
use crate::transcription::retry::retry_api;
use crate::transcription::types::count_words;
use crate::transcription::{
    TranscriptSegment, TranscriptionError, TranscriptionProvider, TranscriptionResult,
};

const DEEPGRAM_ENDPOINT: &str =
    "https://api.deepgram.com/v1/listen?model=nova-2&punctuate=true&diarize=true&utterances=true&smart_format=true";

/// Span length when grouping word timings into segments.
const SEGMENT_DURATION_SECS: f64 = 30.0;

pub struct DeepgramProvider {
    http: Client,
    api_key: Option<String>,
}

impl DeepgramProvider {
    pub const NAME: &'static str = "deepgram";

    pub fn new(http: Client, settings: &Settings) -> Self {
        let api_key = Some(settings.providers.deepgram_api_key.trim().to_string())
            .filter(|key| !key.is_empty());

        Self { http, api_key }
    }

    async fn request_transcription(
        &self,
        api_key: &str,
        audio: &[u8],
        content_type: &str,
    ) -> Result<DeepgramResponse, TranscriptionError> {
        let res = self
            .http
            .post(DEEPGRAM_ENDPOINT)
            .header("Authorization", format!("Token {api_key}"))
            .header("Content-Type", content_type)
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

        res.json::<DeepgramResponse>()
            .await
            .map_err(|err| TranscriptionError::provider(Self::NAME, err.to_string()))
    }
}

#[async_trait]
impl TranscriptionProvider for DeepgramProvider {
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
                hint: "Set providers.deepgram_api_key or SCRIBE_DEEPGRAM_API_KEY.",
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
            self.request_transcription(api_key, &audio, content_type)
        })
        .await?;

        let processing_time_ms = started.elapsed().as_millis() as u64;

        normalize(response, processing_time_ms, estimated_minutes)
    }
}

fn normalize(
    response: DeepgramResponse,
    processing_time_ms: u64,
    estimated_minutes: f64,
) -> Result<TranscriptionResult, TranscriptionError> {
    let channel = response.results.channels.into_iter().next();
    let language = channel
        .as_ref()
        .and_then(|c| c.detected_language.clone())
        .unwrap_or_else(|| "en".to_string());

    let alternative = channel
        .and_then(|c| c.alternatives.into_iter().next())
        .ok_or_else(|| {
            TranscriptionError::provider(DeepgramProvider::NAME, "returned no transcription")
        })?;

    let utterances = response.results.utterances.unwrap_or_default();

    // Utterances are speaker-aware; fall back to grouping raw words.
    let segments = if !utterances.is_empty() {
        utterances
            .iter()
            .map(|u| {
                let mut segment =
                    TranscriptSegment::new(u.start, u.end, u.transcript.trim().to_string());
                segment.confidence = Some(u.confidence);
                segment.speaker = u.speaker.map(|id| format!("Speaker {id}"));
                segment
            })
            .collect()
    } else {
        group_words(&alternative.words)
    };

    let speakers: BTreeSet<u32> = utterances.iter().filter_map(|u| u.speaker).collect();
    let speaker_count = (!speakers.is_empty()).then_some(speakers.len());

    let duration_minutes = response
        .metadata
        .duration
        .map(|secs| secs / 60.0)
        .unwrap_or(estimated_minutes);

    Ok(TranscriptionResult {
        word_count: count_words(&alternative.transcript),
        full_text: alternative.transcript,
        segments,
        language,
        model_used: "deepgram-nova-2".to_string(),
        processing_time_ms,
        speaker_count,
        duration_minutes,
    })
}

/// Group word-level timings into roughly 30-second segments.
fn group_words(words: &[DeepgramWord]) -> Vec<TranscriptSegment> {
    let mut segments: Vec<TranscriptSegment> = Vec::new();
    let mut current: Option<TranscriptSegment> = None;

    for word in words {
        let text = word.punctuated_word.as_deref().unwrap_or(&word.word);

        match current.as_mut() {
            Some(segment) if word.start - segment.start_time < SEGMENT_DURATION_SECS => {
                segment.end_time = word.end;
                segment.text.push(' ');
                segment.text.push_str(text);
            }
            _ => {
                if let Some(segment) = current.take() {
                    segments.push(segment);
                }
                let mut segment = TranscriptSegment::new(word.start, word.end, text.to_string());
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
struct DeepgramResponse {
    metadata: DeepgramMetadata,
    results: DeepgramResults,
}

#[derive(Debug, Deserialize)]
struct DeepgramMetadata {
    duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DeepgramResults {
    #[serde(default)]
    channels: Vec<DeepgramChannel>,
    utterances: Option<Vec<DeepgramUtterance>>,
}

#[derive(Debug, Deserialize)]
struct DeepgramChannel {
    #[serde(default)]
    alternatives: Vec<DeepgramAlternative>,
    detected_language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeepgramAlternative {
    transcript: String,
    #[serde(default)]
    words: Vec<DeepgramWord>,
}

#[derive(Debug, Deserialize)]
struct DeepgramWord {
    word: String,
    start: f64,
    end: f64,
    confidence: f64,
    punctuated_word: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeepgramUtterance {
    start: f64,
    end: f64,
    confidence: f64,
    transcript: String,
    speaker: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_uses_utterances_and_counts_speakers() {
        let response: DeepgramResponse = serde_json::from_str(
            r#"{
                "metadata": {"duration": 90.0},
                "results": {
                    "channels": [{
                        "alternatives": [{"transcript": "hello there everyone"}],
                        "detected_language": "en"
                    }],
                    "utterances": [
                        {"start": 0.0, "end": 2.0, "confidence": 0.95, "transcript": "hello there", "speaker": 0},
                        {"start": 2.0, "end": 4.0, "confidence": 0.9, "transcript": "everyone", "speaker": 1}
                    ]
                }
            }"#,
        )
        .unwrap();

        let result = normalize(response, 10, 5.0).unwrap();
        assert_eq!(result.segments.len(), 2);
        assert_eq!(result.segments[0].speaker.as_deref(), Some("Speaker 0"));
        assert_eq!(result.speaker_count, Some(2));
        assert_eq!(result.duration_minutes, 1.5);
        assert_eq!(result.word_count, 3);
    }

    #[test]
    fn normalize_groups_words_when_no_utterances() {
        let response: DeepgramResponse = serde_json::from_str(
            r#"{
                "metadata": {},
                "results": {
                    "channels": [{
                        "alternatives": [{
                            "transcript": "one two",
                            "words": [
                                {"word": "one", "start": 0.0, "end": 0.5, "confidence": 0.9},
                                {"word": "two", "start": 31.0, "end": 31.5, "confidence": 0.8, "punctuated_word": "Two."}
                            ]
                        }]
                    }]
                }
            }"#,
        )
        .unwrap();

        let result = normalize(response, 0, 2.0).unwrap();
        // 31s gap forces a second segment, punctuated form preferred.
        assert_eq!(result.segments.len(), 2);
        assert_eq!(result.segments[1].text, "Two.");
        assert_eq!(result.duration_minutes, 2.0);
        assert_eq!(result.speaker_count, None);
    }

    #[test]
    fn normalize_rejects_empty_channels() {
        let response: DeepgramResponse =
            serde_json::from_str(r#"{"metadata": {}, "results": {"channels": []}}"#).unwrap();

        assert!(matches!(
            normalize(response, 0, 0.0),
            Err(TranscriptionError::Provider { .. })
        ));
    }
}
