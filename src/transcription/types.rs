//! Normalized transcription result types
//!
//! Every vendor adapter reduces its wire format to these shapes so the
//! rest of the system (billing, storage, display) stays vendor-agnostic.

use serde::{Deserialize, Serialize};

/// A segment of transcribed speech
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Start time in seconds from beginning of audio
    pub start_time: f64,

    /// End time in seconds
    pub end_time: f64,

    /// Transcribed text (trimmed, non-empty)
    pub text: String,

    /// Speaker label when the vendor diarizes
    pub speaker: Option<String>,

    /// Confidence score (0.0 - 1.0)
    pub confidence: Option<f64>,
}

impl TranscriptSegment {
    /// Create a new transcript segment
    pub fn new(start_time: f64, end_time: f64, text: String) -> Self {
        Self {
            start_time,
            end_time,
            text,
            speaker: None,
            confidence: None,
        }
    }
}

/// The normalized output of one transcription call.
///
/// Created once per successful call and never mutated afterwards.
/// `duration_minutes` is usable directly for usage billing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResult {
    /// Full transcript text
    pub full_text: String,

    /// Chronologically ordered segments, as returned by the vendor
    pub segments: Vec<TranscriptSegment>,

    /// Detected or declared language code
    pub language: String,

    /// Vendor model identifier
    pub model_used: String,

    /// Wall-clock processing time in milliseconds
    pub processing_time_ms: u64,

    /// Word count computed from the full text, never vendor-supplied
    pub word_count: usize,

    /// Number of distinct speakers, when the vendor diarizes
    pub speaker_count: Option<usize>,

    /// Audio duration in minutes
    pub duration_minutes: f64,
}

/// Count words by splitting on runs of whitespace.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}
