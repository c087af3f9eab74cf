// Adapters - External system implementations

pub mod exec_ffmpeg;
pub mod probe_ffprobe;
pub mod toml_config;
pub mod tracing_log;

// Re-export adapters
pub use exec_ffmpeg::FfmpegTranscodeAdapter;
pub use probe_ffprobe::FfprobeAdapter;
pub use toml_config::{LogFormat, ProgressMode, TomlConfigAdapter, TrimConfig};
pub use tracing_log::{LogLevel, TracingLogAdapter};
