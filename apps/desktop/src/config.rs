use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;
use shared::domain::default_sections;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub sections: Vec<String>,
    pub speak_answers: bool,
    pub request_timeout_seconds: u64,
    pub mic_file: Option<PathBuf>,
    pub audio_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".into(),
            sections: default_sections(),
            speak_answers: true,
            request_timeout_seconds: 90,
            mic_file: None,
            audio_dir: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileSettings {
    server_url: Option<String>,
    sections: Option<Vec<String>>,
    speak_answers: Option<bool>,
    request_timeout_seconds: Option<u64>,
    mic_file: Option<PathBuf>,
    audio_dir: Option<PathBuf>,
}

/// Defaults, then the TOML file at `path` (if it exists), then environment.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        apply_file_settings(&mut settings, &raw)
            .with_context(|| format!("invalid config '{}'", path.display()))?;
        debug!(path = %path.display(), "loaded config file");
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file_settings(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.server_url {
        settings.server_url = v;
    }
    if let Some(v) = file_cfg.sections {
        settings.sections = v;
    }
    if let Some(v) = file_cfg.speak_answers {
        settings.speak_answers = v;
    }
    if let Some(v) = file_cfg.request_timeout_seconds {
        settings.request_timeout_seconds = v;
    }
    if let Some(v) = file_cfg.mic_file {
        settings.mic_file = Some(v);
    }
    if let Some(v) = file_cfg.audio_dir {
        settings.audio_dir = Some(v);
    }
    Ok(())
}

fn apply_env_overrides(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("PROMPTFORGE_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = var("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = var("APP__SECTIONS") {
        settings.sections = parse_section_list(&v);
    }

    if let Some(v) = var("APP__SPEAK_ANSWERS") {
        if let Some(parsed) = parse_flag(&v) {
            settings.speak_answers = parsed;
        }
    }

    if let Some(v) = var("APP__REQUEST_TIMEOUT_SECONDS") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.request_timeout_seconds = parsed;
        }
    }

    if let Some(v) = var("APP__MIC_FILE") {
        settings.mic_file = Some(PathBuf::from(v));
    }
    if let Some(v) = var("APP__AUDIO_DIR") {
        settings.audio_dir = Some(PathBuf::from(v));
    }
}

fn parse_section_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
