//! OpenAI Whisper transcription provider
//!
//! Reference adapter: multipart upload to the audio transcription
//! endpoint requesting `verbose_json` with segment timestamps.

use async_trait::async_trait;
use reqwest::multipart;
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

const WHISPER_ENDPOINT: &str = "https://api.openai.com/v1/audio/transcriptions";
const WHISPER_MODEL: &str = "whisper-1";

pub struct WhisperProvider {
    http: Client,
    api_key: Option<String>,
    language: Option<String>,
}

impl WhisperProvider {
    pub const NAME: &'static str = "whisper";

    pub fn new(http: Client, settings: &Settings) -> Self {
        let api_key = Some(settings.providers.openai_api_key.trim().to_string())
            .filter(|key| !key.is_empty());
        let language = Some(settings.transcription.language.trim().to_string())
            .filter(|lang| !lang.is_empty());

        Self {
            http,
            api_key,
            language,
        }
    }

    async fn request_transcription(
        &self,
        api_key: &str,
        audio: &[u8],
        file_name: &str,
        content_type: &str,
    ) -> Result<WhisperResponse, TranscriptionError> {
        let file_part = multipart::Part::bytes(audio.to_vec())
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .map_err(|err| TranscriptionError::provider(Self::NAME, err.to_string()))?;

        let mut form = multipart::Form::new()
            .part("file", file_part)
            .text("model", WHISPER_MODEL)
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "segment");

        if let Some(ref language) = self.language {
            form = form.text("language", language.clone());
        }

        let res = self
            .http
            .post(WHISPER_ENDPOINT)
            .bearer_auth(api_key)
            .multipart(form)
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

        res.json::<WhisperResponse>()
            .await
            .map_err(|err| TranscriptionError::provider(Self::NAME, err.to_string()))
    }
}

#[async_trait]
impl TranscriptionProvider for WhisperProvider {
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
                hint: "Set providers.openai_api_key or SCRIBE_OPENAI_API_KEY.",
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

        let response = retry_api(Self::NAME, || {
            self.request_transcription(api_key, &audio, file_name, content_type)
        })
        .await?;

        let processing_time_ms = started.elapsed().as_millis() as u64;

        Ok(normalize(response, processing_time_ms, estimated_minutes))
    }
}

/// Map the vendor response to the normalized result.
///
/// Whisper reports a per-segment average log-probability rather than a
/// direct confidence; `exp` of a value <= 0 yields (0, 1].
fn normalize(
    response: WhisperResponse,
    processing_time_ms: u64,
    estimated_minutes: f64,
) -> TranscriptionResult {
    let segments: Vec<TranscriptSegment> = response
        .segments
        .into_iter()
        .filter_map(|segment| {
            let text = segment.text.trim().to_string();
            if text.is_empty() {
                return None;
            }

            let mut mapped = TranscriptSegment::new(segment.start, segment.end, text);
            mapped.confidence = segment.avg_logprob.map(f64::exp);
            Some(mapped)
        })
        .collect();

    let word_count = count_words(&response.text);

    // Vendor-reported duration wins over the file-size estimate.
    let duration_minutes = response
        .duration
        .map(|secs| secs / 60.0)
        .unwrap_or(estimated_minutes);

    TranscriptionResult {
        word_count,
        full_text: response.text,
        segments,
        language: response.language.unwrap_or_else(|| "en".to_string()),
        model_used: WHISPER_MODEL.to_string(),
        processing_time_ms,
        speaker_count: None,
        duration_minutes,
    }
}

#[derive(Debug, Deserialize)]
struct WhisperResponse {
    text: String,
    language: Option<String>,
    /// Audio duration in seconds
    duration: Option<f64>,
    #[serde(default)]
    segments: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    start: f64,
    end: f64,
    text: String,
    avg_logprob: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_response() -> WhisperResponse {
        serde_json::from_str(
            r#"{
                "text": "hi there",
                "language": "en",
                "duration": 120.0,
                "segments": [
                    {"start": 0.0, "end": 2.0, "text": " hi ", "avg_logprob": -0.1},
                    {"start": 2.0, "end": 4.0, "text": "there", "avg_logprob": -0.2},
                    {"start": 4.0, "end": 4.5, "text": "   ", "avg_logprob": -0.3}
                ]
            }"#,
        )
        .expect("sample response parses")
    }

    #[test]
    fn normalize_trims_text_and_derives_confidence() {
        let result = normalize(sample_response(), 1500, 9.0);

        assert_eq!(result.segments.len(), 2, "whitespace-only segment dropped");
        assert_eq!(result.segments[0].text, "hi");
        let confidence = result.segments[0].confidence.unwrap();
        assert!((confidence - (-0.1f64).exp()).abs() < 1e-12);
        assert!(confidence > 0.9 && confidence < 0.91);
    }

    #[test]
    fn normalize_prefers_vendor_duration_over_estimate() {
        let result = normalize(sample_response(), 0, 9.0);
        assert_eq!(result.duration_minutes, 2.0);
    }

    #[test]
    fn normalize_falls_back_to_estimate_and_english() {
        let response: WhisperResponse =
            serde_json::from_str(r#"{"text": "  hello   world "}"#).unwrap();

        let result = normalize(response, 0, 3.5);
        assert_eq!(result.duration_minutes, 3.5);
        assert_eq!(result.language, "en");
        assert_eq!(result.word_count, 2);
        assert!(result.segments.is_empty());
    }

    #[test]
    fn normalize_omits_confidence_without_logprob() {
        let response: WhisperResponse = serde_json::from_str(
            r#"{"text": "hi", "segments": [{"start": 0.0, "end": 1.0, "text": "hi"}]}"#,
        )
        .unwrap();

        let result = normalize(response, 0, 0.0);
        assert_eq!(result.segments[0].confidence, None);
    }

    #[tokio::test]
    async fn transcribe_fails_fast_when_unconfigured() {
        let settings = crate::config::Settings::default();
        let provider = WhisperProvider::new(Client::new(), &settings);
        assert!(!provider.is_configured());

        // Path does not exist; NotConfigured must win because it is
        // checked before any filesystem access.
        let err = provider
            .transcribe(Path::new("/nonexistent/audio.webm"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TranscriptionError::NotConfigured { provider: "whisper", .. }
        ));
    }
}
