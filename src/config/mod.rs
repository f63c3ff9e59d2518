//! Configuration management for scribe

mod settings;

pub use settings::{
    AzureSettings, BoardSettings, GeneralSettings, ProviderSettings, Settings,
    TranscriptionSettings,
};
