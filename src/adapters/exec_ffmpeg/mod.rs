//! FFmpeg execution adapter
//!
//! Drives the `ffmpeg` executable inside a private temporary directory that
//! serves as the engine's artifact namespace.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::OnceLock;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::domain::errors::*;
use crate::ports::*;

const CONCAT_LIST: &str = "concat-list.txt";
const STDERR_TAIL_LINES: usize = 20;

/// FFmpeg-based transcode adapter
pub struct FfmpegTranscodeAdapter {
    ffmpeg_path: String,
    work_root: Option<PathBuf>,
    workspace: OnceLock<TempDir>,
}

impl FfmpegTranscodeAdapter {
    /// Create new FFmpeg adapter using the given executable
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            work_root: None,
            workspace: OnceLock::new(),
        }
    }

    /// Create the working directory under `root` instead of the system temp dir
    pub fn with_work_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.work_root = Some(root.into());
        self
    }

    /// Working directory, once initialized
    pub fn workspace_path(&self) -> Option<&Path> {
        self.workspace.get().map(TempDir::path)
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, EngineError> {
        validate_artifact_name(name)?;
        let workspace = self.workspace.get().ok_or(EngineError::NotInitialized)?;
        Ok(workspace.path().join(name))
    }

    /// Run one ffmpeg command in the workspace, forwarding `-progress` output
    async fn run(
        &self,
        label: &str,
        args: &[String],
        expected_duration: f64,
        progress: &dyn ProgressObserver,
    ) -> Result<(), EngineError> {
        let workspace = self.workspace.get().ok_or(EngineError::NotInitialized)?;

        let mut command = Command::new(&self.ffmpeg_path);
        command
            .args([
                "-y",
                "-hide_banner",
                "-nostdin",
                "-loglevel",
                "error",
                "-nostats",
                "-progress",
                "pipe:1",
            ])
            .args(args)
            .current_dir(workspace.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(command = label, ?args, "Running ffmpeg");
        let mut child = command.spawn().map_err(|e| EngineError::CommandFailed {
            command: label.to_string(),
            status: "spawn failed".to_string(),
            stderr: e.to_string(),
        })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            EngineError::Io(std::io::Error::other("ffmpeg stdout not captured"))
        })?;
        let stderr = child.stderr.take().ok_or_else(|| {
            EngineError::Io(std::io::Error::other("ffmpeg stderr not captured"))
        })?;

        let read_progress = async {
            let mut lines = BufReader::new(stdout).lines();
            let mut state = ProgressState::default();
            while let Some(line) = lines.next_line().await? {
                if let Some((key, value)) = line.split_once('=') {
                    if state.update(key.trim(), value.trim()) {
                        progress.on_progress(state.fraction(expected_duration));
                    }
                }
            }
            Ok::<_, std::io::Error>(())
        };

        // Raw lines: a non-UTF-8 line must not stop the pipe from draining
        let read_errors = async {
            let mut reader = BufReader::new(stderr);
            let mut buf = Vec::new();
            let mut collected = Vec::new();
            while let Ok(n) = reader.read_until(b'\n', &mut buf).await {
                if n == 0 {
                    break;
                }
                let line = decode_line(&buf);
                debug!(target: "ffmpeg", "{}", line);
                collected.push(line);
                buf.clear();
            }
            collected
        };

        let (progress_result, stderr_lines) = tokio::join!(read_progress, read_errors);
        let status = child.wait().await?;
        progress_result?;

        if !status.success() {
            let skip = stderr_lines.len().saturating_sub(STDERR_TAIL_LINES);
            return Err(EngineError::CommandFailed {
                command: label.to_string(),
                status: status.to_string(),
                stderr: stderr_lines[skip..].join("\n"),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl TranscodePort for FfmpegTranscodeAdapter {
    async fn initialize(&self) -> Result<(), EngineError> {
        if self.workspace.get().is_some() {
            return Ok(());
        }

        let status = Command::new(&self.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| EngineError::Unavailable(format!("{}: {}", self.ffmpeg_path, e)))?;
        if !status.success() {
            return Err(EngineError::Unavailable(format!(
                "{} -version exited with {}",
                self.ffmpeg_path, status
            )));
        }

        let builder = {
            let mut builder = tempfile::Builder::new();
            builder.prefix("pixtrim-");
            builder
        };
        let workspace = match &self.work_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        info!(workspace = %workspace.path().display(), "FFmpeg workspace created");
        // A concurrent initializer may have won; its directory is kept
        let _ = self.workspace.set(workspace);
        Ok(())
    }

    async fn write_input(&self, name: &str, bytes: &[u8]) -> Result<(), EngineError> {
        let path = self.resolve(name)?;
        tokio::fs::write(&path, bytes).await?;
        debug!(artifact = name, bytes = bytes.len(), "Input written");
        Ok(())
    }

    async fn extract(
        &self,
        input: &str,
        start: f64,
        duration: f64,
        output: &str,
        progress: &dyn ProgressObserver,
    ) -> Result<(), EngineError> {
        self.resolve(input)?;
        self.resolve(output)?;

        let args = vec![
            "-i".to_string(),
            input.to_string(),
            "-ss".to_string(),
            format!("{:.6}", start),
            "-t".to_string(),
            format!("{:.6}", duration),
            "-c".to_string(),
            "copy".to_string(),
            output.to_string(),
        ];
        self.run("extract", &args, duration, progress).await
    }

    async fn concat(
        &self,
        segments: &[String],
        output: &str,
        expected_duration: f64,
        progress: &dyn ProgressObserver,
    ) -> Result<(), EngineError> {
        for segment in segments {
            self.resolve(segment)?;
        }
        self.resolve(output)?;

        let list_path = self.resolve(CONCAT_LIST)?;
        tokio::fs::write(&list_path, concat_list(segments)).await?;

        let args = vec![
            "-f".to_string(),
            "concat".to_string(),
            "-safe".to_string(),
            "0".to_string(),
            "-i".to_string(),
            CONCAT_LIST.to_string(),
            "-c".to_string(),
            "copy".to_string(),
            output.to_string(),
        ];
        let result = self.run("concat", &args, expected_duration, progress).await;

        if let Err(e) = tokio::fs::remove_file(&list_path).await {
            debug!(error = %e, "Could not remove concat list");
        }
        result
    }

    async fn read_output(&self, name: &str) -> Result<Vec<u8>, EngineError> {
        let path = self.resolve(name)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(EngineError::ArtifactNotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, name: &str) -> Result<(), EngineError> {
        let path = self.resolve(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Artifact names must stay inside the workspace
fn validate_artifact_name(name: &str) -> Result<(), EngineError> {
    let is_bare = !name.is_empty()
        && !name.contains(['/', '\\'])
        && Path::new(name).file_name() == Some(OsStr::new(name));
    if is_bare {
        Ok(())
    } else {
        Err(EngineError::InvalidArtifactName(name.to_string()))
    }
}

/// Lossy decode of one output line without its terminator
fn decode_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(['\r', '\n'])
        .to_string()
}

/// Body of a concat demuxer list
fn concat_list(segments: &[String]) -> String {
    segments
        .iter()
        .map(|s| format!("file '{}'", s.replace('\'', "'\\''")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Accumulates `key=value` lines emitted by `-progress`
#[derive(Debug, Default)]
struct ProgressState {
    out_time_secs: f64,
    complete: bool,
}

impl ProgressState {
    /// Returns true when the reported position changed
    fn update(&mut self, key: &str, value: &str) -> bool {
        match key {
            "out_time_us" | "out_time_ms" => match value.parse::<f64>() {
                // Both keys are reported in microseconds
                Ok(us) if us >= 0.0 => {
                    let secs = us / 1_000_000.0;
                    let changed = secs != self.out_time_secs;
                    self.out_time_secs = secs;
                    changed
                }
                _ => false,
            },
            "progress" => {
                self.complete = value == "end";
                self.complete
            }
            _ => false,
        }
    }

    fn fraction(&self, expected_duration_secs: f64) -> f64 {
        if self.complete {
            1.0
        } else if expected_duration_secs <= 0.0 {
            0.0
        } else {
            (self.out_time_secs / expected_duration_secs).clamp(0.0, 1.0)
        }
    }
}
