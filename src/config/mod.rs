//! Configuration reading and data directory paths.

pub mod paths;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use paths::get_data_dir;

/// Starting cabin temperature in °C.
pub const DEFAULT_TEMPERATURE: i32 = 22;

/// Upper bound on one speech-to-text round trip, in seconds.
pub const DEFAULT_STT_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_ADVISOR_TIMEOUT_SECS: u64 = 15;

pub const DEFAULT_ADVISOR_ENDPOINT: &str = "https://api.together.xyz/v1";
pub const DEFAULT_ADVISOR_MODEL: &str = "meta-llama/Llama-3.2-3B-Instruct-Turbo";
pub const DEFAULT_ADVISOR_PROMPT: &str =
    "You are a helpful AI assistant for controlling car systems like AC, Music, and Navigation.";

/// Top-level cabin_config.json shape (written by the display front-end).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CabinConfig {
    pub initial_temperature: i32,
    /// Base directory for relative track paths.
    pub music_dir: Option<PathBuf>,
    /// Track aliases in match order. Empty means the built-in catalog.
    pub tracks: Vec<TrackEntry>,
    pub input_device: Option<String>,
    pub auto_listen: bool,
    pub stt: SttSettings,
    pub advisor: AdvisorSettings,
}

impl Default for CabinConfig {
    fn default() -> Self {
        Self {
            initial_temperature: DEFAULT_TEMPERATURE,
            music_dir: None,
            tracks: Vec::new(),
            input_device: None,
            auto_listen: false,
            stt: SttSettings::default(),
            advisor: AdvisorSettings::default(),
        }
    }
}

/// One spoken alias mapped to an audio file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackEntry {
    pub alias: String,
    pub path: PathBuf,
}

/// Speech-to-text adapter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SttSettings {
    /// "openai-cloud" or "custom-cloud".
    pub adapter: String,
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: u64,
}

impl Default for SttSettings {
    fn default() -> Self {
        Self {
            adapter: "openai-cloud".to_string(),
            api_key: None,
            endpoint: None,
            model: None,
            timeout_secs: DEFAULT_STT_TIMEOUT_SECS,
        }
    }
}

/// Hosted LLM advisory call settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdvisorSettings {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub system_prompt: String,
    pub timeout_secs: u64,
}

impl Default for AdvisorSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            endpoint: DEFAULT_ADVISOR_ENDPOINT.to_string(),
            model: DEFAULT_ADVISOR_MODEL.to_string(),
            max_tokens: 100,
            temperature: 0.7,
            system_prompt: DEFAULT_ADVISOR_PROMPT.to_string(),
            timeout_secs: DEFAULT_ADVISOR_TIMEOUT_SECS,
        }
    }
}

/// Read cabin_config.json from the data directory.
pub fn read_cabin_config() -> CabinConfig {
    read_cabin_config_from(&get_config_path())
}

/// Read a config file, falling back to defaults when missing or malformed.
pub fn read_cabin_config_from(path: &Path) -> CabinConfig {
    read_json_file(path).unwrap_or_default()
}

/// Path to cabin_config.json.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("cabin_config.json")
}

/// Generic helper: read a JSON file and deserialize it.
fn read_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(val) => Some(val),
            Err(e) => {
                warn!("Failed to parse {}: {}", path.display(), e);
                None
            }
        },
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to read {}: {}", path.display(), e);
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = read_cabin_config_from(&dir.path().join("nope.json"));
        assert_eq!(cfg.initial_temperature, 22);
        assert!(cfg.tracks.is_empty());
        assert!(!cfg.advisor.enabled);
        assert_eq!(cfg.advisor.max_tokens, 100);
        assert_eq!(cfg.stt.adapter, "openai-cloud");
        assert_eq!(cfg.stt.timeout_secs, DEFAULT_STT_TIMEOUT_SECS);
    }

    #[test]
    fn test_malformed_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cabin_config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let cfg = read_cabin_config_from(&path);
        assert_eq!(cfg.initial_temperature, DEFAULT_TEMPERATURE);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cabin_config.json");
        std::fs::write(
            &path,
            r#"{
                "initialTemperature": 19,
                "tracks": [{"alias": "road trip", "path": "mix.mp3"}],
                "advisor": {"enabled": true, "apiKey": "k"}
            }"#,
        )
        .unwrap();
        let cfg = read_cabin_config_from(&path);
        assert_eq!(cfg.initial_temperature, 19);
        assert_eq!(cfg.tracks.len(), 1);
        assert_eq!(cfg.tracks[0].alias, "road trip");
        assert!(cfg.advisor.enabled);
        assert_eq!(cfg.advisor.model, DEFAULT_ADVISOR_MODEL);
        assert_eq!(cfg.advisor.timeout_secs, DEFAULT_ADVISOR_TIMEOUT_SECS);
        assert!(!cfg.auto_listen);
    }
}
