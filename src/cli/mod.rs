//! CLI module for pixtrim
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::adapters::{LogFormat, ProgressMode};

pub mod args;
pub mod commands;

pub use args::{CutSpec, PlanArgs, TrimArgs};

/// pixtrim - remove ranges from a recording and join what is left
///
/// Each removed range splits the recording; the remaining pieces are copied
/// without re-encoding and concatenated in their original order.
#[derive(Parser, Debug)]
#[command(name = "pixtrim")]
#[command(about = "Cut ranges out of a video and join the rest")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Logging level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long, global = true, value_parser = ["pretty", "json"])]
    pub log_format: Option<String>,

    /// Configuration file (default: ./pixtrim.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Progress reporting
    #[arg(long, global = true, value_parser = ["console", "json", "none"])]
    pub progress: Option<String>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn log_format(&self) -> Option<LogFormat> {
        self.log_format.as_deref().and_then(|f| f.parse().ok())
    }

    pub fn progress_mode(&self) -> Option<ProgressMode> {
        self.progress.as_deref().and_then(|p| p.parse().ok())
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the ranges that would be kept, without touching any media
    Plan(PlanArgs),
    /// Remove cut ranges from a video file
    Trim(TrimArgs),
}
