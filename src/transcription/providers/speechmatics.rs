//! Speechmatics transcription provider
//!
//! Asynchronous vendor: submit a batch job, poll its status, then fetch
//! the transcript. The json-v2 transcript is word-level; words are
//! regrouped into ~30 second segments and punctuation tokens attach to
//! the preceding word.

use async_trait::async_trait;
use reqwest::multipart;
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::config::Settings;
use crate::transcription::mime::{audio_content_type, estimate_duration_minutes};
use crate::transcription::retry::retry_api;
use crate::transcription::types::count_words;
use crate::transcription::{
    TranscriptSegment, TranscriptionError, TranscriptionProvider, TranscriptionResult,
};

const BASE_URL: &str = "https://asr.api.speechmatics.com/v2";
const MAX_WAIT: Duration = Duration::from_secs(600);
const POLL_INTERVAL: Duration = Duration::from_secs(2);
const SEGMENT_DURATION_SECS: f64 = 30.0;

pub struct SpeechmaticsProvider {
    http: Client,
    api_key: Option<String>,
    language: String,
}

impl SpeechmaticsProvider {
    pub const NAME: &'static str = "speechmatics";

    pub fn new(http: Client, settings: &Settings) -> Self {
        let api_key = Some(settings.providers.speechmatics_api_key.trim().to_string())
            .filter(|key| !key.is_empty());
        let language = match settings.transcription.language.trim() {
            "" => "en".to_string(),
            lang => lang.to_string(),
        };

        Self {
            http,
            api_key,
            language,
        }
    }

    async fn create_job(
        &self,
        api_key: &str,
        audio: &[u8],
        file_name: &str,
        content_type: &str,
    ) -> Result<CreateJobResponse, TranscriptionError> {
        let config = serde_json::json!({
            "type": "transcription",
            "transcription_config": {
                "operating_point": "enhanced",
                "language": self.language,
            },
        });

        let part = multipart::Part::bytes(audio.to_vec())
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .map_err(|err| TranscriptionError::provider(Self::NAME, err.to_string()))?;
        let form = multipart::Form::new()
            .part("data_file", part)
            .text("config", config.to_string());

        let res = self
            .http
            .post(format!("{BASE_URL}/jobs"))
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
                format!("job creation failed: {status} {body}"),
            ));
        }

        res.json::<CreateJobResponse>()
            .await
            .map_err(|err| TranscriptionError::provider(Self::NAME, err.to_string()))
    }

    async fn poll_job(
        &self,
        api_key: &str,
        job_id: &str,
    ) -> Result<SpeechmaticsTranscript, TranscriptionError> {
        let deadline = Instant::now() + MAX_WAIT;

        while Instant::now() < deadline {
            let status: JobStatusResponse = self
                .http
                .get(format!("{BASE_URL}/jobs/{job_id}"))
                .bearer_auth(api_key)
                .send()
                .await
                .map_err(|err| TranscriptionError::provider(Self::NAME, err.to_string()))?
                .json()
                .await
                .map_err(|err| TranscriptionError::provider(Self::NAME, err.to_string()))?;

            match status.job.status.as_str() {
                "done" => return self.fetch_transcript(api_key, job_id).await,
                "rejected" | "deleted" => {
                    return Err(TranscriptionError::provider(
                        Self::NAME,
                        format!("job failed: {}", status.job.status),
                    ))
                }
                _ => tokio::time::sleep(POLL_INTERVAL).await,
            }
        }

        Err(TranscriptionError::Timeout {
            provider: Self::NAME,
        })
    }

    async fn fetch_transcript(
        &self,
        api_key: &str,
        job_id: &str,
    ) -> Result<SpeechmaticsTranscript, TranscriptionError> {
        self.http
            .get(format!("{BASE_URL}/jobs/{job_id}/transcript?format=json-v2"))
            .bearer_auth(api_key)
            .send()
            .await
            .map_err(|err| TranscriptionError::provider(Self::NAME, err.to_string()))?
            .json::<SpeechmaticsTranscript>()
            .await
            .map_err(|err| TranscriptionError::provider(Self::NAME, err.to_string()))
    }
}

#[async_trait]
impl TranscriptionProvider for SpeechmaticsProvider {
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
                hint: "Set providers.speechmatics_api_key or SCRIBE_SPEECHMATICS_API_KEY.",
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

        let created = retry_api(Self::NAME, || {
            self.create_job(api_key, &audio, file_name, content_type)
        })
        .await?;

        let transcript = self.poll_job(api_key, &created.id).await?;

        let processing_time_ms = started.elapsed().as_millis() as u64;

        Ok(normalize(transcript, processing_time_ms, estimated_minutes))
    }
}

fn normalize(
    transcript: SpeechmaticsTranscript,
    processing_time_ms: u64,
    estimated_minutes: f64,
) -> TranscriptionResult {
    let mut full_text = String::new();
    let mut segments: Vec<TranscriptSegment> = Vec::new();
    let mut current: Option<TranscriptSegment> = None;

    // Running mean over the words of the open segment; punctuation
    // tokens carry no confidence and do not count.
    let mut confidence_sum = 0.0;
    let mut confidence_count = 0u32;

    fn seal(mut segment: TranscriptSegment, sum: f64, count: u32) -> TranscriptSegment {
        if count > 0 {
            segment.confidence = Some(sum / f64::from(count));
        }
        segment
    }

    for result in &transcript.results {
        let Some(alternative) = result.alternatives.first() else {
            continue;
        };
        let content = alternative.content.trim();
        if content.is_empty() {
            continue;
        }

        if result.kind == "punctuation" {
            // Punctuation attaches to the preceding word in both the
            // full text and the open segment.
            full_text.push_str(content);
            if let Some(segment) = current.as_mut() {
                segment.text.push_str(content);
                segment.end_time = result.end_time;
            }
            continue;
        }

        if !full_text.is_empty() {
            full_text.push(' ');
        }
        full_text.push_str(content);

        match current.as_mut() {
            Some(segment) if result.start_time - segment.start_time < SEGMENT_DURATION_SECS => {
                segment.end_time = result.end_time;
                segment.text.push(' ');
                segment.text.push_str(content);
            }
            _ => {
                if let Some(segment) = current.take() {
                    segments.push(seal(segment, confidence_sum, confidence_count));
                }
                confidence_sum = 0.0;
                confidence_count = 0;
                current = Some(TranscriptSegment::new(
                    result.start_time,
                    result.end_time,
                    content.to_string(),
                ));
            }
        }

        if let Some(confidence) = alternative.confidence {
            confidence_sum += confidence;
            confidence_count += 1;
        }
    }

    if let Some(segment) = current {
        segments.push(seal(segment, confidence_sum, confidence_count));
    }

    let duration_minutes = transcript
        .metadata
        .duration
        .map(|secs| secs / 60.0)
        .unwrap_or(estimated_minutes);

    let language = transcript
        .metadata
        .transcription_config
        .map(|config| config.language)
        .filter(|lang| !lang.is_empty())
        .unwrap_or_else(|| "en".to_string());

    TranscriptionResult {
        word_count: count_words(&full_text),
        full_text,
        segments,
        language,
        model_used: "speechmatics-enhanced".to_string(),
        processing_time_ms,
        speaker_count: None,
        duration_minutes,
    }
}

#[derive(Debug, Deserialize)]
struct CreateJobResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct JobStatusResponse {
    job: JobStatus,
}

#[derive(Debug, Deserialize)]
struct JobStatus {
    status: String,
}

#[derive(Debug, Deserialize)]
struct SpeechmaticsTranscript {
    #[serde(default)]
    results: Vec<SpeechmaticsToken>,
    metadata: SpeechmaticsMetadata,
}

#[derive(Debug, Deserialize)]
struct SpeechmaticsToken {
    #[serde(rename = "type")]
    kind: String,
    start_time: f64,
    end_time: f64,
    #[serde(default)]
    alternatives: Vec<SpeechmaticsAlternative>,
}

#[derive(Debug, Deserialize)]
struct SpeechmaticsAlternative {
    content: String,
    confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SpeechmaticsMetadata {
    duration: Option<f64>,
    transcription_config: Option<TranscriptionConfig>,
}

#[derive(Debug, Deserialize)]
struct TranscriptionConfig {
    language: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcript(json: &str) -> SpeechmaticsTranscript {
        serde_json::from_str(json).expect("transcript parses")
    }

    #[test]
    fn normalize_attaches_punctuation_to_previous_word() {
        let result = normalize(
            transcript(
                r#"{
                    "results": [
                        {"type": "word", "start_time": 0.0, "end_time": 0.4,
                         "alternatives": [{"content": "hello", "confidence": 0.9}]},
                        {"type": "punctuation", "start_time": 0.4, "end_time": 0.4,
                         "alternatives": [{"content": ","}]},
                        {"type": "word", "start_time": 0.5, "end_time": 0.9,
                         "alternatives": [{"content": "world", "confidence": 0.8}]}
                    ],
                    "metadata": {"duration": 60.0,
                                 "transcription_config": {"language": "en"}}
                }"#,
            ),
            12,
            0.5,
        );

        assert_eq!(result.full_text, "hello, world");
        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.segments[0].text, "hello, world");
        assert_eq!(result.word_count, 2);
        assert_eq!(result.duration_minutes, 1.0);
    }

    #[test]
    fn normalize_averages_confidence_across_all_words() {
        let result = normalize(
            transcript(
                r#"{
                    "results": [
                        {"type": "word", "start_time": 0.0, "end_time": 0.4,
                         "alternatives": [{"content": "one", "confidence": 0.9}]},
                        {"type": "word", "start_time": 0.5, "end_time": 0.9,
                         "alternatives": [{"content": "two", "confidence": 0.6}]},
                        {"type": "word", "start_time": 1.0, "end_time": 1.4,
                         "alternatives": [{"content": "three", "confidence": 0.6}]}
                    ],
                    "metadata": {}
                }"#,
            ),
            0,
            1.0,
        );

        let confidence = result.segments[0].confidence.expect("segment confidence");
        assert!((confidence - 0.7).abs() < 1e-9, "got {confidence}");
    }

    #[test]
    fn normalize_keeps_confidence_when_first_word_lacks_one() {
        let result = normalize(
            transcript(
                r#"{
                    "results": [
                        {"type": "word", "start_time": 0.0, "end_time": 0.4,
                         "alternatives": [{"content": "um"}]},
                        {"type": "word", "start_time": 0.5, "end_time": 0.9,
                         "alternatives": [{"content": "hello", "confidence": 0.8}]}
                    ],
                    "metadata": {}
                }"#,
            ),
            0,
            1.0,
        );

        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.segments[0].confidence, Some(0.8));
    }

    #[test]
    fn normalize_splits_segments_after_thirty_seconds() {
        let result = normalize(
            transcript(
                r#"{
                    "results": [
                        {"type": "word", "start_time": 0.0, "end_time": 0.4,
                         "alternatives": [{"content": "first", "confidence": 0.9}]},
                        {"type": "word", "start_time": 31.0, "end_time": 31.4,
                         "alternatives": [{"content": "second", "confidence": 0.9}]}
                    ],
                    "metadata": {}
                }"#,
            ),
            0,
            2.0,
        );

        assert_eq!(result.segments.len(), 2);
        assert_eq!(result.duration_minutes, 2.0);
        assert_eq!(result.language, "en");
    }
}
