// TOML config adapter - Configuration management using TOML files

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::errors::*;

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "pixtrim.toml";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = TrimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(TrimError::BadArgs(format!("Invalid log format: {}", other))),
        }
    }
}

/// Where job progress is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressMode {
    /// Progress bar on stderr
    #[default]
    Console,
    /// One JSON event per line on stdout
    Json,
    None,
}

impl FromStr for ProgressMode {
    type Err = TrimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "console" => Ok(ProgressMode::Console),
            "json" => Ok(ProgressMode::Json),
            "none" => Ok(ProgressMode::None),
            other => Err(TrimError::BadArgs(format!("Invalid progress mode: {}", other))),
        }
    }
}

impl fmt::Display for ProgressMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProgressMode::Console => "console",
            ProgressMode::Json => "json",
            ProgressMode::None => "none",
        };
        f.write_str(name)
    }
}

/// Resolved application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrimConfig {
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    /// Parent of the engine's temporary directory; system temp dir when unset
    pub work_dir: Option<PathBuf>,
    pub log_level: String,
    pub log_format: LogFormat,
    pub progress: ProgressMode,
    /// Replace an existing output file
    pub overwrite: bool,
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            work_dir: None,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            progress: ProgressMode::Console,
            overwrite: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    pixtrim: TrimConfig,
}

/// TOML configuration adapter
pub struct TomlConfigAdapter;

impl TomlConfigAdapter {
    /// Parse a config document. Settings live under a `[pixtrim]` table.
    pub fn parse(content: &str) -> Result<TrimConfig, TrimError> {
        let file: ConfigFile = toml::from_str(content)
            .map_err(|e| TrimError::BadArgs(format!("Failed to parse TOML config: {}", e)))?;
        Ok(file.pixtrim)
    }

    /// Load `path`. A missing file yields `None`.
    pub fn load(path: &Path) -> Result<Option<TrimConfig>, TrimError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file");
                return Ok(None);
            }
            Err(e) => {
                return Err(TrimError::BadArgs(format!(
                    "Failed to read config file {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        let config = Self::parse(&content)?;
        debug!(path = %path.display(), "Config file loaded");
        Ok(Some(config))
    }

    /// Render a config as a `[pixtrim]` document
    pub fn serialize(config: &TrimConfig) -> Result<String, TrimError> {
        let mut table = toml::map::Map::new();
        let value = toml::Value::try_from(config)
            .map_err(|e| TrimError::BadArgs(format!("Failed to serialize config: {}", e)))?;
        table.insert("pixtrim".to_string(), value);
        toml::to_string_pretty(&toml::Value::Table(table))
            .map_err(|e| TrimError::BadArgs(format!("Failed to serialize config: {}", e)))
    }
}
