// Domain models - Core types and data structures

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::domain::errors::TrimError;

/// Time specification with precision - represents time in seconds with fractional precision
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct TimeSpec {
    pub seconds: f64,
}

impl TimeSpec {
    /// Create a new TimeSpec from seconds
    pub fn from_seconds(seconds: f64) -> Self {
        Self { seconds }
    }

    pub fn as_seconds(&self) -> f64 {
        self.seconds
    }

    /// Parse time string in various formats
    pub fn parse(time_str: &str) -> Result<Self, TrimError> {
        let trimmed = time_str.trim();

        // Plain seconds
        if let Ok(seconds) = trimmed.parse::<f64>() {
            if !seconds.is_finite() {
                return Err(TrimError::BadArgs(format!("Time must be finite: {}", trimmed)));
            }
            if seconds < 0.0 {
                return Err(TrimError::BadArgs("Time cannot be negative".to_string()));
            }
            return Ok(Self::from_seconds(seconds));
        }

        let parts: Vec<&str> = trimmed.split(':').collect();
        match parts.as_slice() {
            [minutes, seconds] => {
                let minutes = Self::parse_unit(minutes, "minutes")?;
                let seconds = Self::parse_seconds(seconds)?;
                Ok(Self::from_seconds(minutes as f64 * 60.0 + seconds))
            }
            [hours, minutes, seconds] => {
                let hours = Self::parse_unit(hours, "hours")?;
                let minutes = Self::parse_unit(minutes, "minutes")?;
                if minutes >= 60 {
                    return Err(TrimError::BadArgs(
                        "Minutes must be less than 60".to_string(),
                    ));
                }
                let seconds = Self::parse_seconds(seconds)?;
                Ok(Self::from_seconds(
                    hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds,
                ))
            }
            _ => Err(TrimError::BadArgs(format!(
                "Invalid time format '{}'. Supported formats: seconds (e.g., 123.45), MM:SS.ms (e.g., 2:30.5), HH:MM:SS.ms (e.g., 1:02:30.5)",
                trimmed
            ))),
        }
    }

    fn parse_unit(part: &str, unit: &str) -> Result<u32, TrimError> {
        part.parse::<u32>()
            .map_err(|_| TrimError::BadArgs(format!("Invalid {} format: '{}'", unit, part)))
    }

    fn parse_seconds(part: &str) -> Result<f64, TrimError> {
        let seconds = part
            .parse::<f64>()
            .map_err(|_| TrimError::BadArgs(format!("Invalid seconds format: '{}'", part)))?;
        if !(0.0..60.0).contains(&seconds) {
            return Err(TrimError::BadArgs(
                "Seconds must be between 0 and 60".to_string(),
            ));
        }
        Ok(seconds)
    }

    /// Format as H:MM:SS.mmm (hours omitted when zero)
    pub fn format_hms(&self) -> String {
        let total_ms = (self.seconds.max(0.0) * 1000.0).round() as u64;
        let hours = total_ms / 3_600_000;
        let minutes = (total_ms % 3_600_000) / 60_000;
        let seconds = (total_ms % 60_000) / 1000;
        let milliseconds = total_ms % 1000;

        if hours > 0 {
            format!("{}:{:02}:{:02}.{:03}", hours, minutes, seconds, milliseconds)
        } else {
            format!("{}:{:02}.{:03}", minutes, seconds, milliseconds)
        }
    }
}

impl FromStr for TimeSpec {
    type Err = TrimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_hms())
    }
}

/// Identifier of a time range.
///
/// Cut ranges and keep ranges use separate namespaces, so a derived keep range
/// can never share an identifier with a user-declared cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeId {
    /// A user-declared "remove" range
    Cut(u64),
    /// A derived "keep" range, numbered by its position in the keep set
    Keep(usize),
}

impl fmt::Display for RangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeId::Cut(n) => write!(f, "range-{}", n),
            RangeId::Keep(n) => write!(f, "keep-{}", n),
        }
    }
}

impl Serialize for RangeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Half-open time interval `[start, end)` in seconds.
///
/// Construction normalizes the bounds, so `0 <= start <= end` always holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeRange {
    id: RangeId,
    start: f64,
    end: f64,
}

impl TimeRange {
    /// Create a range, clamping a negative start to zero and an inverted end to `start`.
    /// NaN bounds collapse the same way.
    pub fn new(id: RangeId, start: f64, end: f64) -> Self {
        let start = start.max(0.0);
        let end = end.max(start);
        Self { id, start, end }
    }

    pub fn id(&self) -> RangeId {
        self.id
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    /// Length of the range in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Zero-length ranges are allowed but remove nothing
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains(&self, seconds: f64) -> bool {
        seconds >= self.start && seconds < self.end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{} - {})",
            self.id,
            TimeSpec::from_seconds(self.start),
            TimeSpec::from_seconds(self.end)
        )
    }
}

/// A finished recording handed over by the capture side
#[derive(Debug, Clone)]
pub struct SourceMedia {
    pub bytes: Vec<u8>,
    pub duration: f64,
    /// Container extension, e.g. "mp4" or "webm"
    pub container: String,
}

impl SourceMedia {
    /// Create source media with validation
    pub fn new(bytes: Vec<u8>, duration: f64, container: &str) -> Result<Self, TrimError> {
        validate_duration(duration)?;
        let container = container.trim().trim_start_matches('.').to_lowercase();
        if container.is_empty() || !container.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(TrimError::BadArgs(format!(
                "Invalid container extension: '{}'",
                container
            )));
        }

        Ok(Self {
            bytes,
            duration,
            container,
        })
    }
}

/// Reject durations the planner cannot reason about
pub fn validate_duration(duration: f64) -> Result<(), TrimError> {
    if duration.is_finite() && duration >= 0.0 {
        Ok(())
    } else {
        Err(TrimError::InvalidDuration(duration))
    }
}

/// Output of a successful trim job
#[derive(Debug, Clone)]
pub struct TrimmedMedia {
    pub bytes: Vec<u8>,
    pub container: String,
    /// Keep ranges that were concatenated, in output order
    pub keep_ranges: Vec<TimeRange>,
    /// Total kept duration in seconds
    pub duration: f64,
}

impl TrimmedMedia {
    /// MIME type matching the container
    pub fn mime_type(&self) -> String {
        match self.container.as_str() {
            "mkv" => "video/x-matroska".to_string(),
            "mov" => "video/quicktime".to_string(),
            other => format!("video/{}", other),
        }
    }
}
