//! Concurrent batch runs over many track folders
//!
//! Each track runs on a blocking worker; at most `workers` tracks are in
//! flight at once. A failing track is logged and counted but never stops the
//! rest of the batch.

use super::{TrackContext, TrackOutcome, TrackTask};
use crate::config::PipelineConfig;
use crate::error::{BathyError, Result};
use crate::models::TrackStats;

use colored::*;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Result of one track within a batch
#[derive(Debug)]
pub struct TrackResult {
    pub track: PathBuf,
    pub outcome: Result<TrackOutcome>,
}

/// Aggregate counts for a batch run
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub task: Option<TrackTask>,
    pub processed: usize,
    pub skipped: usize,
    pub failures: Vec<(PathBuf, String)>,
    /// Stats summed over processed tracks
    pub totals: TrackStats,
    pub elapsed: Duration,
}

impl BatchSummary {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn total(&self) -> usize {
        self.processed + self.skipped + self.failed()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, result: TrackResult) {
        match result.outcome {
            Ok(TrackOutcome::Processed { stats, .. }) => {
                self.processed += 1;
                self.totals.absorb(&stats);
            }
            Ok(TrackOutcome::Skipped { .. }) => self.skipped += 1,
            Err(e) => self.failures.push((result.track, e.to_string())),
        }
    }

    /// Colored summary on stdout
    pub fn print(&self) {
        println!();
        println!("{}", "Batch Summary".bright_green().bold());
        if let Some(task) = self.task {
            println!("  Task:            {}", task.to_string().bright_white());
        }
        println!("  Tracks:          {}", self.total());
        println!(
            "  Processed:       {}",
            self.processed.to_string().bright_green()
        );
        if self.skipped > 0 {
            println!("  Skipped:         {}", self.skipped.to_string().yellow());
        }
        if self.totals.survey_points > 0 {
            println!("  Survey points:   {}", self.totals.survey_points);
            println!("  Cleaned:         {}", self.totals.cleaned);
            println!("  Rejected:        {}", self.totals.rejected());
        }
        if self.totals.confirmed_outliers > 0 {
            println!("  Outliers:        {}", self.totals.confirmed_outliers);
        }
        if self.totals.wrap_corrections > 0 {
            println!("  Wrap fixes:      {}", self.totals.wrap_corrections);
        }
        println!("  Elapsed:         {} ms", self.elapsed.as_millis());

        if !self.failures.is_empty() {
            println!(
                "  {} {}",
                "Tracks failed:".bright_red(),
                self.failed().to_string().bright_red()
            );
            for (track, reason) in &self.failures {
                println!("    {} {}", track.display().to_string().red(), reason);
            }
        }
    }
}

/// Runs one task over a set of tracks
pub struct BatchProcessor {
    config: Arc<PipelineConfig>,
    task: TrackTask,
    show_progress: bool,
}

impl BatchProcessor {
    pub fn new(config: Arc<PipelineConfig>, task: TrackTask) -> Self {
        Self {
            config,
            task,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub async fn run(&self, tracks: Vec<PathBuf>) -> BatchSummary {
        let start = Instant::now();
        let workers = self.config.workers.max(1);
        info!(
            "Running {} on {} tracks with {} workers",
            self.task,
            tracks.len(),
            workers
        );

        let pb = if self.show_progress && !tracks.is_empty() {
            create_progress_bar(tracks.len() as u64, &format!("Running {}", self.task))
        } else {
            ProgressBar::hidden()
        };

        let mut summary = stream::iter(tracks)
            .map(|track| {
                let config = self.config.clone();
                let task = self.task;
                let pb = pb.clone();
                async move {
                    pb.set_message(super::discovery::track_name(&track));
                    let outcome = run_blocking(track.clone(), config, task).await;
                    pb.inc(1);
                    TrackResult { track, outcome }
                }
            })
            .buffer_unordered(workers)
            .fold(
                BatchSummary {
                    task: Some(self.task),
                    ..Default::default()
                },
                |mut summary, result| async move {
                    match &result.outcome {
                        Ok(TrackOutcome::Processed { outputs, .. }) => {
                            debug!("{}: {} files", result.track.display(), outputs.len())
                        }
                        Ok(TrackOutcome::Skipped { reason }) => {
                            warn!("Skipped {}: {}", result.track.display(), reason)
                        }
                        Err(e) => error!("Failed to process {}: {}", result.track.display(), e),
                    }
                    summary.record(result);
                    summary
                },
            )
            .await;

        pb.finish_with_message(format!("{} tracks done", summary.total()));
        summary.elapsed = start.elapsed();

        info!(
            "Batch complete: {} processed, {} skipped, {} failed in {:.2}s",
            summary.processed,
            summary.skipped,
            summary.failed(),
            summary.elapsed.as_secs_f64()
        );
        summary
    }
}

/// Run one track on the blocking pool
pub async fn run_blocking(
    track: PathBuf,
    config: Arc<PipelineConfig>,
    task: TrackTask,
) -> Result<TrackOutcome> {
    tokio::task::spawn_blocking(move || TrackContext::new(track, config)?.run(task))
        .await
        .map_err(|e| BathyError::TaskFailed {
            reason: e.to_string(),
        })?
}

pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb
}
