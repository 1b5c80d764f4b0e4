//! Configuration for PsychoStats.
//!
//! Settings are read from `psychostats.json` in camelCase. Every field has a
//! default, so a missing file or an empty object is a valid configuration.

use std::io::IsTerminal;
use std::path::Path;
use std::time::Duration;

use psychostats_genai::{GeminiConfig, DEFAULT_BASE_URL};
use serde::{Deserialize, Serialize};

use crate::error::{PsychoError, Result};

/// The default config file name.
const CONFIG_FILE_NAME: &str = "psychostats.json";

fn default_api_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_api_key_env() -> String {
    "API_KEY".to_string()
}

fn default_text_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_image_model() -> String {
    "gemini-2.5-flash-image".to_string()
}

fn default_video_model() -> String {
    "veo-3.1-fast-generate-preview".to_string()
}

fn default_state_dir() -> String {
    ".psychostats".to_string()
}

/// Default number of supplementary links kept per lesson.
const fn default_max_links() -> usize {
    3
}

/// Default interval between video status polls.
const fn default_poll_interval() -> u64 {
    5
}

/// Default number of video status polls before giving up.
const fn default_max_polls() -> u32 {
    60
}

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Endpoint of the generation API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model for lessons and the tutor.
    #[serde(default = "default_text_model")]
    pub text_model: String,

    /// Model for concept illustrations.
    #[serde(default = "default_image_model")]
    pub image_model: String,

    /// Model for concept videos.
    #[serde(default = "default_video_model")]
    pub video_model: String,

    /// Directory holding progress and platform preference.
    #[serde(default = "default_state_dir")]
    pub state_dir: String,

    /// Maximum number of supplementary links shown per lesson.
    #[serde(default = "default_max_links")]
    pub max_links: usize,

    /// Video generation polling.
    #[serde(default)]
    pub video: VideoConfig,

    /// Terminal styling.
    #[serde(default)]
    pub color: ColorMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_key_env: default_api_key_env(),
            text_model: default_text_model(),
            image_model: default_image_model(),
            video_model: default_video_model(),
            state_dir: default_state_dir(),
            max_links: default_max_links(),
            video: VideoConfig::default(),
            color: ColorMode::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// Returns the default configuration if `psychostats.json` does not exist.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            PsychoError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads `psychostats.json` from a specific directory.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file yields the default configuration. A file with invalid
    /// JSON yields `ConfigParseError`; invalid values yield
    /// `ConfigValidationError`.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(PsychoError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| PsychoError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    pub fn validate(&self) -> Result<()> {
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://"))
        {
            return Err(PsychoError::config_validation(
                format!("apiBaseUrl '{}' is not an http(s) URL", self.api_base_url),
                "Set apiBaseUrl to an address such as https://generativelanguage.googleapis.com",
            ));
        }

        if self.api_key_env.trim().is_empty() {
            return Err(PsychoError::config_validation(
                "apiKeyEnv must not be empty",
                "Name the environment variable that holds your API key, e.g. \"API_KEY\"",
            ));
        }

        for (field, model) in [
            ("textModel", &self.text_model),
            ("imageModel", &self.image_model),
            ("videoModel", &self.video_model),
        ] {
            if model.trim().is_empty() {
                return Err(PsychoError::config_validation(
                    format!("{field} must not be empty"),
                    format!("Remove {field} from psychostats.json to use the default model"),
                ));
            }
        }

        if self.state_dir.trim().is_empty() {
            return Err(PsychoError::config_validation(
                "stateDir must not be empty",
                "Provide a directory for saved progress in your psychostats.json",
            ));
        }

        if self.video.poll_interval_seconds == 0 {
            return Err(PsychoError::config_validation(
                "video.pollIntervalSeconds must be greater than 0",
                "Set video.pollIntervalSeconds to at least 1 in your psychostats.json",
            ));
        }

        if self.video.max_polls == 0 {
            return Err(PsychoError::config_validation(
                "video.maxPolls must be greater than 0",
                "Set video.maxPolls to at least 1 in your psychostats.json",
            ));
        }

        Ok(())
    }

    /// Builds the generation client settings, reading the API key from the
    /// configured environment variable.
    #[must_use]
    pub fn gemini_config(&self) -> GeminiConfig {
        GeminiConfig {
            base_url: self.api_base_url.clone(),
            api_key: None,
            api_key_env: self.api_key_env.clone(),
            text_model: self.text_model.clone(),
            image_model: self.image_model.clone(),
            video_model: self.video_model.clone(),
        }
        .with_key_from_env(self.api_key_env.clone())
    }
}

/// Polling policy for concept videos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoConfig {
    /// Seconds between status polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,

    /// Maximum number of status polls.
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: default_poll_interval(),
            max_polls: default_max_polls(),
        }
    }
}

impl VideoConfig {
    /// Interval between polls.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }
}

/// When to style terminal output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorMode {
    /// Style only when standard output is a terminal (default).
    #[default]
    Auto,
    /// Always style.
    Always,
    /// Never style.
    Never,
}

impl ColorMode {
    /// Parses a string into a `ColorMode`, case-insensitively.
    fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "always" => Some(Self::Always),
            "never" => Some(Self::Never),
            _ => None,
        }
    }

    /// Resolves the mode against the current standard output.
    #[must_use]
    pub fn enabled(self) -> bool {
        match self {
            Self::Auto => std::io::stdout().is_terminal(),
            Self::Always => true,
            Self::Never => false,
        }
    }
}

impl<'de> Deserialize<'de> for ColorMode {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str_case_insensitive(&s).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid color mode '{s}': expected one of 'auto', 'always', 'never'"
            ))
        })
    }
}

impl Serialize for ColorMode {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let s = match self {
            Self::Auto => "auto",
            Self::Always => "always",
            Self::Never => "never",
        };
        serializer.serialize_str(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_config_default_values() {
        let config = Config::default();

        assert_eq!(config.api_base_url, "https://generativelanguage.googleapis.com");
        assert_eq!(config.api_key_env, "API_KEY");
        assert_eq!(config.text_model, "gemini-2.5-flash");
        assert_eq!(config.image_model, "gemini-2.5-flash-image");
        assert_eq!(config.video_model, "veo-3.1-fast-generate-preview");
        assert_eq!(config.state_dir, ".psychostats");
        assert_eq!(config.max_links, 3);
        assert_eq!(config.video.poll_interval_seconds, 5);
        assert_eq!(config.video.max_polls, 60);
        assert_eq!(config.color, ColorMode::Auto);
    }

    #[test]
    fn test_config_deserialization_with_overrides() {
        let json = r#"{
            "textModel": "gemini-2.0-flash",
            "maxLinks": 5,
            "video": {"maxPolls": 10},
            "color": "NEVER"
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();

        assert_eq!(config.text_model, "gemini-2.0-flash");
        assert_eq!(config.max_links, 5);
        assert_eq!(config.video.max_polls, 10);
        assert_eq!(config.video.poll_interval_seconds, 5);
        assert_eq!(config.color, ColorMode::Never);
        assert_eq!(config.image_model, "gemini-2.5-flash-image");
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let config: Config = serde_json::from_str(r#"{"theme": "dark"}"#).unwrap();
        assert_eq!(config.state_dir, ".psychostats");
    }

    #[test]
    fn test_invalid_color_mode_error() {
        let err = serde_json::from_str::<Config>(r#"{"color": "rainbow"}"#)
            .unwrap_err()
            .to_string();
        assert!(err.contains("invalid color mode"));
        assert!(err.contains("rainbow"));
    }

    #[test]
    fn test_load_from_file_nonexistent_returns_default() {
        let path = PathBuf::from("/nonexistent/path/psychostats.json");
        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.text_model, "gemini-2.5-flash");
    }

    #[test]
    fn test_load_from_file_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "{ not valid json }").unwrap();

        let err = Config::load_from_file(&path).unwrap_err();
        assert!(
            matches!(&err, PsychoError::ConfigParseError { path: p, message } if *p == path && !message.is_empty()),
            "Expected ConfigParseError with correct path, got: {err:?}"
        );
    }

    #[test]
    fn test_load_from_dir_finds_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{"stateDir": "/tmp/psycho-state", "apiKeyEnv": "GEMINI_API_KEY"}"#,
        )
        .unwrap();

        let config = Config::load_from_dir(dir.path()).unwrap();
        assert_eq!(config.state_dir, "/tmp/psycho-state");
        assert_eq!(config.api_key_env, "GEMINI_API_KEY");
    }

    #[test]
    fn test_load_from_file_validates_after_parsing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, r#"{"video": {"pollIntervalSeconds": 0}}"#).unwrap();

        let err = Config::load_from_file(&path).unwrap_err();
        assert!(matches!(err, PsychoError::ConfigValidationError { .. }));
        assert!(err.to_string().contains("pollIntervalSeconds"));
    }

    #[test]
    fn test_config_validation_zero_polls() {
        let mut config = Config::default();
        config.video.max_polls = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("video.maxPolls"));
    }

    #[test]
    fn test_config_validation_empty_model() {
        let config = Config {
            image_model: "  ".to_string(),
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("imageModel must not be empty"));
    }

    #[test]
    fn test_config_validation_bad_url() {
        let config = Config {
            api_base_url: "generativelanguage.googleapis.com".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_empty_state_dir() {
        let config = Config {
            state_dir: String::new(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_valid_config_passes() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_gemini_config_uses_models() {
        let config = Config {
            api_key_env: "PSYCHOSTATS_TEST_KEY_THAT_IS_NOT_SET".to_string(),
            ..Config::default()
        };
        let gemini = config.gemini_config();
        assert_eq!(gemini.text_model, "gemini-2.5-flash");
        assert_eq!(gemini.api_key_env, "PSYCHOSTATS_TEST_KEY_THAT_IS_NOT_SET");
        assert!(gemini.api_key.is_none());
    }

    #[test]
    fn test_color_mode_explicit_values() {
        assert!(ColorMode::Always.enabled());
        assert!(!ColorMode::Never.enabled());
    }
}
