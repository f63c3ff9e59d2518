//! Transcription module for scribe
//!
//! Vendor speech-to-text adapters behind one provider contract, plus
//! the registry and service layer that route calls between them.

mod error;
pub mod mime;
mod provider;
pub mod providers;
pub mod retry;
mod service;
mod types;

pub use error::TranscriptionError;
pub use provider::TranscriptionProvider;
pub use providers::PROVIDER_PRIORITY;
pub use service::{TranscriptionOutcome, TranscriptionService};
pub use types::{count_words, TranscriptSegment, TranscriptionResult};
