//! Application settings management

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// General settings
    #[serde(default)]
    pub general: GeneralSettings,

    /// Transcription service settings
    #[serde(default)]
    pub transcription: TranscriptionSettings,

    /// Per-vendor provider credentials
    #[serde(default)]
    pub providers: ProviderSettings,

    /// Board / issue aggregation settings
    #[serde(default)]
    pub board: BoardSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionSettings {
    /// Provider priority order; the first configured entry wins
    #[serde(default = "default_priority")]
    pub priority: Vec<String>,

    /// Language hint sent to vendors that accept one (empty = auto-detect)
    #[serde(default)]
    pub language: String,

    /// HTTP request timeout in seconds for vendor calls
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// API credentials per transcription vendor.
///
/// Keys left empty in the config file can be supplied through
/// `SCRIBE_<VENDOR>_API_KEY` environment variables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// OpenAI API key (whisper provider)
    #[serde(default)]
    pub openai_api_key: String,

    /// Deepgram API key
    #[serde(default)]
    pub deepgram_api_key: String,

    /// AssemblyAI API key
    #[serde(default)]
    pub assemblyai_api_key: String,

    /// Gladia API key
    #[serde(default)]
    pub gladia_api_key: String,

    /// Speechmatics API key
    #[serde(default)]
    pub speechmatics_api_key: String,

    /// Azure Speech settings
    #[serde(default)]
    pub azure: AzureSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureSettings {
    /// Azure Speech subscription key
    #[serde(default)]
    pub speech_key: String,

    /// Azure Speech region
    #[serde(default = "default_azure_region")]
    pub region: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardSettings {
    /// Days a done issue stays visible on default board views
    #[serde(default = "default_done_column_days")]
    pub done_column_days: i64,

    /// Workflow status id -> category (todo, inprogress, done)
    #[serde(default = "default_status_categories")]
    pub status_categories: HashMap<String, String>,
}

// Default value functions

fn default_log_level() -> String {
    "info".to_string()
}

fn default_priority() -> Vec<String> {
    crate::transcription::PROVIDER_PRIORITY
        .iter()
        .map(|name| name.to_string())
        .collect()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_azure_region() -> String {
    "eastus".to_string()
}

fn default_done_column_days() -> i64 {
    14
}

fn default_status_categories() -> HashMap<String, String> {
    [
        ("todo", "todo"),
        ("inprogress", "inprogress"),
        ("done", "done"),
    ]
    .into_iter()
    .map(|(status, category)| (status.to_string(), category.to_string()))
    .collect()
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            priority: default_priority(),
            language: String::new(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for AzureSettings {
    fn default() -> Self {
        Self {
            speech_key: String::new(),
            region: default_azure_region(),
        }
    }
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            done_column_days: default_done_column_days(),
            status_categories: default_status_categories(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            general: GeneralSettings::default(),
            transcription: TranscriptionSettings::default(),
            providers: ProviderSettings::default(),
            board: BoardSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from the configuration file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            tracing::info!("No config file found, using defaults");
            let mut settings = Self::default();
            settings.apply_env_overrides();
            return Ok(settings);
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        settings.apply_env_overrides();

        Ok(settings)
    }

    /// Apply environment variable overrides for vendor credentials.
    fn apply_env_overrides(&mut self) {
        let overrides: [(&str, &mut String); 7] = [
            ("SCRIBE_OPENAI_API_KEY", &mut self.providers.openai_api_key),
            (
                "SCRIBE_DEEPGRAM_API_KEY",
                &mut self.providers.deepgram_api_key,
            ),
            (
                "SCRIBE_ASSEMBLYAI_API_KEY",
                &mut self.providers.assemblyai_api_key,
            ),
            ("SCRIBE_GLADIA_API_KEY", &mut self.providers.gladia_api_key),
            (
                "SCRIBE_SPEECHMATICS_API_KEY",
                &mut self.providers.speechmatics_api_key,
            ),
            ("SCRIBE_AZURE_SPEECH_KEY", &mut self.providers.azure.speech_key),
            ("SCRIBE_AZURE_SPEECH_REGION", &mut self.providers.azure.region),
        ];

        for (var, slot) in overrides {
            if let Ok(value) = std::env::var(var) {
                if !value.trim().is_empty() {
                    *slot = value;
                }
            }
        }
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("com", "scribe", "scribe")
            .context("Could not determine config directory")?;

        let config_dir = dirs.config_dir();
        Ok(config_dir.join("config.toml"))
    }

    /// Write default configuration to a file
    pub fn write_default(path: &PathBuf) -> Result<()> {
        let settings = Self::default();
        let content = toml::to_string_pretty(&settings)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}
