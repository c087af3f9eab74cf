//! Command implementations

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::adapters::{ProgressMode, TrimConfig};
use crate::app::container::AppContainer;
use crate::app::progress::{
    ConsoleProgressCallback, JsonProgressCallback, NoOpProgressCallback, ProgressCallback,
    ProgressTracker,
};
use crate::app::session::EditSession;
use crate::cli::args::{CutSpec, PlanArgs, TrimArgs};
use crate::domain::cut_set::CutSet;
use crate::domain::errors::TrimError;
use crate::domain::model::{SourceMedia, TimeRange, TimeSpec};
use crate::domain::rules::KeepRangePlanner;

#[derive(Serialize)]
struct PlanReport<'a> {
    duration: f64,
    cuts: &'a [TimeRange],
    /// Union of the cuts within the recording, as `[start, end]` pairs
    removed: Vec<(f64, f64)>,
    keep: &'a [TimeRange],
    kept_duration: f64,
    removed_duration: f64,
}

fn add_cuts(cut_set: &mut CutSet, cuts: &[CutSpec]) {
    for cut in cuts {
        cut_set.add_cut_range(cut.start.as_seconds(), cut.end.as_seconds());
    }
}

/// Execute the plan command
pub fn plan(args: &PlanArgs) -> Result<()> {
    let duration = args.duration.as_seconds();
    let mut cut_set = CutSet::new();
    add_cuts(&mut cut_set, &args.cuts);

    let keep = KeepRangePlanner::plan(cut_set.ranges(), duration);
    if keep.is_empty() {
        return Err(TrimError::EmptyResult.into());
    }
    let kept = KeepRangePlanner::kept_duration(&keep);

    if args.json {
        let report = PlanReport {
            duration,
            cuts: cut_set.ranges(),
            removed: KeepRangePlanner::merged_cuts(cut_set.ranges(), duration),
            keep: &keep,
            kept_duration: kept,
            removed_duration: duration - kept,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Keep Ranges");
    println!("===========");
    for range in &keep {
        println!("{}  ({:.3}s)", range, range.duration());
    }
    println!();
    println!(
        "Kept {} of {} ({} segment(s))",
        TimeSpec::from_seconds(kept),
        TimeSpec::from_seconds(duration),
        keep.len()
    );
    Ok(())
}

/// Default output path: `<stem>_trimmed.<ext>` next to the input
pub fn default_output_path(input: &Path) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("Input path has no file name: {}", input.display()))?;
    let ext = container_extension(input)?;
    Ok(input.with_file_name(format!("{}_trimmed.{}", stem, ext)))
}

fn container_extension(input: &Path) -> Result<String> {
    input
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .ok_or_else(|| anyhow!("Cannot determine container of {}: no file extension", input.display()))
}

fn progress_callback(mode: ProgressMode) -> Arc<dyn ProgressCallback> {
    match mode {
        ProgressMode::Console => Arc::new(ConsoleProgressCallback),
        ProgressMode::Json => Arc::new(JsonProgressCallback),
        ProgressMode::None => Arc::new(NoOpProgressCallback),
    }
}

/// Execute the trim command
pub async fn trim(args: &TrimArgs, config: &TrimConfig, container: &dyn AppContainer) -> Result<()> {
    let input = Path::new(&args.input);
    if !input.is_file() {
        return Err(anyhow!("Input file does not exist: {}", args.input));
    }

    let output = match &args.output {
        Some(output) => PathBuf::from(output),
        None => default_output_path(input)?,
    };
    if output.exists() && !config.overwrite {
        return Err(anyhow!(
            "Output file already exists: {} (use --overwrite to replace it)",
            output.display()
        ));
    }

    let duration = match args.duration {
        Some(duration) => duration.as_seconds(),
        None => container
            .probe()
            .probe_duration(&args.input)
            .await
            .context("Failed to determine recording duration")?,
    };

    let bytes = tokio::fs::read(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let media = SourceMedia::new(bytes, duration, &container_extension(input)?)?;

    let mut session = EditSession::new();
    session.load_recording(media);
    add_cuts(session.cut_set_mut(), &args.cuts);
    info!(
        input = %input.display(),
        output = %output.display(),
        cuts = session.cut_set().len(),
        duration,
        "Trimming"
    );

    let progress = ProgressTracker::new();
    progress.add_callback(progress_callback(config.progress));

    let pipeline = container.trim_interactor();
    pipeline.activate().await?;
    let trimmed = match session.process(&pipeline, &progress).await {
        Ok(trimmed) => trimmed,
        Err(e) => {
            warn!(category = ?e.category(), "Trim failed");
            return Err(e.into());
        }
    };

    tokio::fs::write(&output, &trimmed.bytes)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!(
        output = %output.display(),
        bytes = trimmed.bytes.len(),
        mime = %trimmed.mime_type(),
        "Output written"
    );

    if config.progress != ProgressMode::Json {
        println!(
            "Wrote {} ({} kept from {} segment(s))",
            output.display(),
            TimeSpec::from_seconds(trimmed.duration),
            trimmed.keep_ranges.len()
        );
    }
    Ok(())
}
