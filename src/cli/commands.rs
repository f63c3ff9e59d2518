//! CLI command implementations

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

use crate::board::{
    calculate_issue_counts, done_column_threshold, Issue, IssueCounts, StatusCategory,
};
use crate::cli::args::ConfigCommand;
use crate::config::Settings;
use crate::transcription::{TranscriptionResult, TranscriptionService};

#[derive(Serialize)]
struct TranscribeReport<'a> {
    provider: &'a str,
    result: &'a TranscriptionResult,
}

/// Transcribe an audio file and print the normalized result
pub async fn transcribe(
    settings: &Settings,
    file: &Path,
    provider: Option<String>,
    json: bool,
) -> Result<()> {
    let service = TranscriptionService::new(settings)?;

    let outcome = match provider {
        Some(name) => service.transcribe_with(file, &name).await?,
        None => service.transcribe(file).await?,
    };

    if json {
        let report = TranscribeReport {
            provider: &outcome.provider,
            result: &outcome.result,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let result = &outcome.result;
    println!("Provider: {}", outcome.provider);
    println!("Model: {}", result.model_used);
    println!("Language: {}", result.language);
    println!(
        "Audio: {:.2} minutes, {} words",
        result.duration_minutes, result.word_count
    );
    if let Some(speakers) = result.speaker_count {
        println!("Speakers: {}", speakers);
    }
    println!("Processed in {}ms", result.processing_time_ms);
    println!();

    for segment in &result.segments {
        let timestamp = format_timestamp(segment.start_time);
        match &segment.speaker {
            Some(speaker) => println!("  [{}] {}: {}", timestamp, speaker, segment.text),
            None => println!("  [{}] {}", timestamp, segment.text),
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct ProviderStatus<'a> {
    name: &'a str,
    configured: bool,
}

/// List providers in priority order with their configuration state
pub fn list_providers(settings: &Settings, json: bool) -> Result<()> {
    let service = TranscriptionService::new(settings)?;

    let statuses: Vec<ProviderStatus> = service
        .provider_names()
        .into_iter()
        .map(|name| ProviderStatus {
            name,
            configured: service
                .provider(name)
                .map(|provider| provider.is_configured())
                .unwrap_or(false),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
        return Ok(());
    }

    println!("Providers (priority order):");
    for status in &statuses {
        let state = if status.configured {
            "configured"
        } else {
            "not configured"
        };
        println!("  {:<14} {}", status.name, state);
    }

    if statuses.iter().all(|status| !status.configured) {
        println!();
        println!("No provider is configured. Set an API key in the config file");
        println!("or through SCRIBE_<VENDOR>_API_KEY environment variables.");
    }

    Ok(())
}

/// Aggregate issue counts from a JSON export file
pub fn issue_counts(
    settings: &Settings,
    file: &Path,
    done_days: Option<i64>,
    json: bool,
) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read issues file: {}", file.display()))?;

    let issues: Vec<Issue> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse issues file: {}", file.display()))?;

    let categories = status_category_map(settings);
    let days = done_days.unwrap_or(settings.board.done_column_days);
    let threshold = done_column_threshold(Utc::now().timestamp_millis(), days);

    let counts = calculate_issue_counts(&issues, &categories, threshold);

    if json {
        println!("{}", serde_json::to_string_pretty(&counts)?);
        return Ok(());
    }

    print_counts_table(&counts, issues.len(), days);

    Ok(())
}

/// Status -> category mapping from configuration; unknown category
/// names fall back to todo, matching the aggregator's own default.
fn status_category_map(settings: &Settings) -> HashMap<String, StatusCategory> {
    settings
        .board
        .status_categories
        .iter()
        .map(|(status, category)| {
            (
                status.clone(),
                StatusCategory::from_str(category).unwrap_or(StatusCategory::Todo),
            )
        })
        .collect()
}

fn print_counts_table(counts: &IssueCounts, issue_count: usize, done_days: i64) {
    println!(
        "{} issues (done column hides items older than {} days)",
        issue_count, done_days
    );
    println!();
    println!("{:<12} {:>6} {:>8} {:>7}", "category", "total", "visible", "hidden");

    for category in [
        StatusCategory::Todo,
        StatusCategory::InProgress,
        StatusCategory::Done,
    ] {
        println!(
            "{:<12} {:>6} {:>8} {:>7}",
            category.as_str(),
            counts.total.get(category),
            counts.visible.get(category),
            counts.hidden.get(category)
        );
    }
}

/// Handle config subcommands
pub fn config_command(settings: &Settings, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            let toml = toml::to_string_pretty(settings)?;
            println!("{}", toml);
        }
        ConfigCommand::Path => {
            let path = Settings::config_path()?;
            println!("{}", path.display());
        }
        ConfigCommand::Init { force } => {
            let path = Settings::config_path()?;
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at {}. Use --force to overwrite.",
                    path.display()
                );
            }
            Settings::write_default(&path)?;
            println!("Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

/// Format seconds as mm:ss
fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_format_as_minutes_and_seconds() {
        assert_eq!(format_timestamp(0.0), "0:00");
        assert_eq!(format_timestamp(65.4), "1:05");
        assert_eq!(format_timestamp(-3.0), "0:00");
    }

    #[test]
    fn invalid_configured_category_defaults_to_todo() {
        let mut settings = Settings::default();
        settings
            .board
            .status_categories
            .insert("review".to_string(), "blocked".to_string());

        let map = status_category_map(&settings);
        assert_eq!(map.get("review"), Some(&StatusCategory::Todo));
        assert_eq!(map.get("done"), Some(&StatusCategory::Done));
    }
}
