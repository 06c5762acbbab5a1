//! Configuration file support for docmark.
//!
//! Settings live in a versioned JSON file. A missing file means defaults; a
//! file written by a newer version is rejected rather than misread.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_TRANSLATION_TARGET;
use crate::history::HistoryConfig;

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// User preferences
    #[serde(default)]
    pub preferences: UserPreferences,

    /// OCR engine settings
    #[serde(default)]
    pub ocr: OcrConfig,

    /// Summarization backend settings
    #[serde(default)]
    pub summarizer: SummarizerConfig,

    /// Translation backend settings
    #[serde(default)]
    pub translator: TranslatorConfig,
}

/// User preferences section of the config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Default export folder path
    #[serde(default)]
    pub export_folder: String,

    /// Maximum undo steps to keep; unlimited when absent
    #[serde(default)]
    pub history_limit: Option<usize>,
}

impl UserPreferences {
    pub fn history_config(&self) -> HistoryConfig {
        HistoryConfig {
            max_history: self.history_limit,
        }
    }
}

/// OCR engine section of the config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Path or name of the tesseract executable
    #[serde(default = "default_tesseract_path")]
    pub tesseract_path: PathBuf,

    /// Tesseract language code
    #[serde(default = "default_ocr_language")]
    pub language: String,
}

fn default_tesseract_path() -> PathBuf {
    PathBuf::from("tesseract")
}

fn default_ocr_language() -> String {
    "eng".to_string()
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_path: default_tesseract_path(),
            language: default_ocr_language(),
        }
    }
}

/// Summarization backend section of the config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    /// Base URL of the Generative Language API
    pub endpoint: String,
    /// Model name
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 1024,
        }
    }
}

/// Translation backend section of the config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// URL of the LibreTranslate `/translate` endpoint
    pub endpoint: String,
    /// Language code used when the caller does not choose one
    pub default_target: String,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://libretranslate.de/translate".to_string(),
            default_target: DEFAULT_TRANSLATION_TARGET.to_string(),
        }
    }
}

impl AppConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            preferences: UserPreferences::default(),
            ocr: OcrConfig::default(),
            summarizer: SummarizerConfig::default(),
            translator: TranslatorConfig::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }
        if config.version < CONFIG_VERSION {
            log::warn!(
                "Config version mismatch: expected {}, got {}",
                CONFIG_VERSION,
                config.version
            );
        }

        Ok(config)
    }

    /// Get the default config filename.
    pub fn default_filename() -> &'static str {
        "config.json"
    }

    /// Get the default config file path.
    pub fn default_path() -> Option<PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("docmark").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("docmark")
                    .join(Self::default_filename())
            })
        }
    }

    /// Load configuration from `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("No config file found at {:?}, using defaults", path);
            return Ok(Self::new());
        }

        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Load from the default path, falling back to defaults on any problem.
    pub fn load_from_default_path() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::new();
        };
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!("Failed to load config file {:?}: {}", path, e);
            Self::new()
        })
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
