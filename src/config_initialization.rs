//! Configuration initialization and hierarchy management

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::adapters::toml_config::DEFAULT_CONFIG_FILE;
use crate::adapters::{LogLevel, TomlConfigAdapter, TrimConfig};
use crate::cli::{Cli, Commands};

/// Environment variables and the config keys they override
const ENV_MAPPINGS: &[(&str, &str)] = &[
    ("PIXTRIM_FFMPEG_PATH", "ffmpeg_path"),
    ("PIXTRIM_FFPROBE_PATH", "ffprobe_path"),
    ("PIXTRIM_WORK_DIR", "work_dir"),
    ("PIXTRIM_LOG_LEVEL", "log_level"),
    ("PIXTRIM_LOG_FORMAT", "log_format"),
    ("PIXTRIM_PROGRESS", "progress"),
    ("PIXTRIM_OVERWRITE", "overwrite"),
];

/// Resolve configuration following precedence: CLI > Env > File > Defaults
pub fn initialize_configuration_hierarchy(cli: &Cli) -> Result<TrimConfig> {
    resolve_configuration(cli, |key| std::env::var(key).ok())
}

/// Same as [`initialize_configuration_hierarchy`] with an explicit environment
pub fn resolve_configuration<F>(cli: &Cli, env: F) -> Result<TrimConfig>
where
    F: Fn(&str) -> Option<String>,
{
    // An explicitly requested file must exist; the default one is optional
    let mut config = match &cli.config {
        Some(path) => TomlConfigAdapter::load(path)?
            .with_context(|| format!("Config file does not exist: {}", path.display()))?,
        None => TomlConfigAdapter::load(Path::new(DEFAULT_CONFIG_FILE))?.unwrap_or_default(),
    };

    let env_overrides = apply_environment(&mut config, env)?;
    if env_overrides > 0 {
        debug!("Applied {} environment variable overrides", env_overrides);
    }

    let cli_overrides = apply_cli_overrides(&mut config, cli);
    if cli_overrides > 0 {
        debug!("Applied {} CLI configuration overrides", cli_overrides);
    }

    LogLevel::parse(&config.log_level)?;
    Ok(config)
}

fn apply_environment<F>(config: &mut TrimConfig, env: F) -> Result<usize>
where
    F: Fn(&str) -> Option<String>,
{
    let mut applied = 0;
    for &(var, key) in ENV_MAPPINGS {
        let Some(value) = env(var) else { continue };
        match key {
            "ffmpeg_path" => config.ffmpeg_path = value,
            "ffprobe_path" => config.ffprobe_path = value,
            "work_dir" => config.work_dir = Some(PathBuf::from(value)),
            "log_level" => config.log_level = value,
            "log_format" => config.log_format = value.parse()?,
            "progress" => config.progress = value.parse()?,
            "overwrite" => {
                config.overwrite = parse_bool(&value)
                    .with_context(|| format!("Invalid boolean value for {}: {}", var, value))?
            }
            _ => continue,
        }
        info!("Environment override: {} -> {}", var, key);
        applied += 1;
    }
    Ok(applied)
}

fn apply_cli_overrides(config: &mut TrimConfig, cli: &Cli) -> usize {
    let mut applied = 0;

    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
        applied += 1;
    }
    if let Some(format) = cli.log_format() {
        config.log_format = format;
        applied += 1;
    }
    if let Some(mode) = cli.progress_mode() {
        config.progress = mode;
        applied += 1;
    }
    if let Commands::Trim(args) = &cli.command {
        if args.overwrite {
            config.overwrite = true;
            applied += 1;
        }
    }

    applied
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
