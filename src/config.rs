// Configuration - Generator, watch loop, and output settings
// Loaded from a JSON file; every field is optional and falls back to its default

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const CONFIG_DIR_NAME: &str = "chordwatch";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model identifier passed to the generator
    pub model: String,

    /// Generator executable, invoked as `<program> run <model> <prompt>`
    pub generator_program: String,

    /// Kill the generator after this many seconds; `null` waits forever
    pub generator_timeout_secs: Option<u64>,

    /// Delay between session polls
    pub poll_interval_ms: u64,

    /// Directory for generated MIDI files
    pub output_dir: PathBuf,

    /// MIDI resolution (PPQ)
    pub ticks_per_beat: u16,

    /// JSON session dump polled by the watch loop
    pub session_path: PathBuf,

    /// Reference MIDI file announced at startup; not read
    pub reference_midi: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            model: "llama3:latest".to_string(),
            generator_program: "ollama".to_string(),
            generator_timeout_secs: Some(120),
            poll_interval_ms: 1000,
            output_dir: PathBuf::from("."),
            ticks_per_beat: 480,
            session_path: PathBuf::from("live_session.json"),
            reference_midi: PathBuf::from("example_chord_progression.mid"),
        }
    }
}

impl Config {
    /// Load configuration
    ///
    /// An explicit path must exist. Without one, the per-user config file is
    /// used when present, otherwise the defaults.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Config = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll_interval_ms must be > 0".to_string()));
        }
        if self.ticks_per_beat == 0 || self.ticks_per_beat > 0x7FFF {
            return Err(ConfigError::Invalid(format!(
                "ticks_per_beat must be between 1 and 32767 (got {})",
                self.ticks_per_beat
            )));
        }
        if self.generator_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "generator_timeout_secs must be > 0 or null".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn generator_timeout(&self) -> Option<Duration> {
        self.generator_timeout_secs.map(Duration::from_secs)
    }
}

/// `<config dir>/chordwatch/config.json` for the current user
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.model, "llama3:latest");
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.generator_timeout(), Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{"model": "mistral", "poll_interval_ms": 250}"#).unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(config.model, "mistral");
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.ticks_per_beat, 480);
        assert_eq!(config.generator_program, "ollama");
    }

    #[test]
    fn test_null_timeout_disables_it() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{"generator_timeout_secs": null}"#).unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(config.generator_timeout(), None);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = Config::load(Some(temp_dir.path().join("absent.json").as_path()));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let config = Config {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = Config {
            ticks_per_beat: 0x8000,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_garbled_file_is_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, "model = mistral").unwrap();

        assert!(matches!(
            Config::load(Some(path.as_path())),
            Err(ConfigError::Parse { .. })
        ));
    }
}
