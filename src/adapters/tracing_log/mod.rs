// Tracing log adapter - Structured logging using tracing crate

use std::fmt;
use std::str::FromStr;

use tracing_subscriber::EnvFilter;

use crate::adapters::toml_config::LogFormat;
use crate::domain::errors::*;

/// Log verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Parse a level name, case-insensitively
    pub fn parse(level: &str) -> Result<Self, TrimError> {
        match level.trim().to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(TrimError::BadArgs(format!("Invalid log level: {}", other))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl FromStr for LogLevel {
    type Err = TrimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracing log adapter
pub struct TracingLogAdapter;

impl TracingLogAdapter {
    /// Install the global subscriber on stderr. `RUST_LOG`, when set, takes
    /// precedence over `level`. Returns false if a subscriber already exists.
    pub fn init(level: LogLevel, format: LogFormat) -> bool {
        let filter = Self::filter(level, std::env::var("RUST_LOG").ok().as_deref());
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false);

        let installed = match format {
            LogFormat::Pretty => builder.try_init().is_ok(),
            LogFormat::Json => builder.json().try_init().is_ok(),
        };
        if installed {
            tracing::debug!(level = %level, ?format, "Logging initialized");
        }
        installed
    }

    fn filter(level: LogLevel, rust_log: Option<&str>) -> EnvFilter {
        rust_log
            .filter(|directives| !directives.trim().is_empty())
            .and_then(|directives| EnvFilter::try_new(directives).ok())
            .unwrap_or_else(|| EnvFilter::new(level.as_str()))
    }
}
