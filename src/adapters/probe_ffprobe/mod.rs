//! FFprobe adapter for media file probing
//!
//! Only the container duration is needed to plan a trim.

use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::domain::errors::*;
use crate::domain::model::validate_duration;
use crate::ports::*;

/// FFprobe-based probe adapter
pub struct FfprobeAdapter {
    ffprobe_path: String,
}

impl FfprobeAdapter {
    /// Create new FFprobe adapter using the given executable
    pub fn new(ffprobe_path: impl Into<String>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Extract `format.duration` from `-of json` output
fn parse_duration_json(json: &str) -> Result<f64, TrimError> {
    let output: ProbeOutput = serde_json::from_str(json)
        .map_err(|e| TrimError::BadArgs(format!("Unreadable ffprobe output: {}", e)))?;

    let raw = output
        .format
        .and_then(|f| f.duration)
        .ok_or_else(|| TrimError::BadArgs("ffprobe reported no duration".to_string()))?;

    let duration: f64 = raw
        .trim()
        .parse()
        .map_err(|_| TrimError::BadArgs(format!("Invalid duration from ffprobe: {}", raw)))?;
    validate_duration(duration)?;
    Ok(duration)
}

#[async_trait]
impl ProbePort for FfprobeAdapter {
    async fn probe_duration(&self, file_path: &str) -> Result<f64, TrimError> {
        debug!(file = file_path, "Probing duration");

        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "json",
            ])
            .arg(file_path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                TrimError::EngineUnavailable(format!("{}: {}", self.ffprobe_path, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TrimError::BadArgs(format!(
                "ffprobe could not read {}: {}",
                file_path,
                stderr.trim()
            )));
        }

        let duration = parse_duration_json(&String::from_utf8_lossy(&output.stdout))?;
        debug!(file = file_path, duration, "Duration probed");
        Ok(duration)
    }
}
