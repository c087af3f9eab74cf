//! Command-line argument definitions

use std::fmt;
use std::str::FromStr;

use clap::Args;

use crate::domain::errors::TrimError;
use crate::domain::model::TimeSpec;

/// A range to remove, written `START..END`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutSpec {
    pub start: TimeSpec,
    pub end: TimeSpec,
}

impl FromStr for CutSpec {
    type Err = TrimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s.split_once("..").ok_or_else(|| {
            TrimError::BadArgs(format!(
                "Invalid cut '{}'. Expected START..END, e.g. 1:30..2:05.5",
                s
            ))
        })?;
        Ok(Self {
            start: TimeSpec::parse(start)?,
            end: TimeSpec::parse(end)?,
        })
    }
}

impl fmt::Display for CutSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Arguments for the plan command
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Recording duration (HH:MM:SS.ms, MM:SS.ms, or seconds)
    #[arg(short, long)]
    pub duration: TimeSpec,

    /// Range to remove as START..END; repeat for several cuts
    #[arg(short, long = "cut", required = true)]
    pub cuts: Vec<CutSpec>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the trim command
#[derive(Args, Debug)]
pub struct TrimArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: String,

    /// Range to remove as START..END; repeat for several cuts
    #[arg(short, long = "cut", required = true)]
    pub cuts: Vec<CutSpec>,

    /// Output file path (default: <input>_trimmed.<ext>)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Recording duration; probed with ffprobe when omitted
    #[arg(short, long)]
    pub duration: Option<TimeSpec>,

    /// Replace the output file if it exists
    #[arg(long)]
    pub overwrite: bool,
}
