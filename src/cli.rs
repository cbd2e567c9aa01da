//! Command-line interface components.

use crate::config::PipelineConfig;
use crate::constants::DEFAULT_LOG_LEVEL;
use crate::processor::TrackTask;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bathyclean")]
#[command(about = "Clean and cross-validate shipborne bathymetry against a reference model")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reject gross outliers and confirm them against crossover records
    Outliers(RunArgs),
    /// Fit and remove a multiplicative scale error
    Scale(RunArgs),
    /// Remove travel-time wrap offsets, then re-run the gross filter
    Wrap(RunArgs),
    /// Write the survey without dropout lines, for the intersection tool
    Prefilter(RunArgs),
    /// Combine raw intersection tables into the crossover file
    ImportCrossovers(RunArgs),
    /// List track pairs whose survey bounding boxes overlap
    Overlaps(OverlapArgs),
}

impl Commands {
    /// Per-track task for the processing commands
    pub fn task(&self) -> Option<TrackTask> {
        match self {
            Commands::Outliers(_) => Some(TrackTask::Outliers),
            Commands::Scale(_) => Some(TrackTask::Scale),
            Commands::Wrap(_) => Some(TrackTask::Wrap),
            Commands::Prefilter(_) => Some(TrackTask::Prefilter),
            Commands::ImportCrossovers(_) => Some(TrackTask::ImportCrossovers),
            Commands::Overlaps(_) => None,
        }
    }

    pub fn log_args(&self) -> &LogArgs {
        match self {
            Commands::Outliers(args)
            | Commands::Scale(args)
            | Commands::Wrap(args)
            | Commands::Prefilter(args)
            | Commands::ImportCrossovers(args) => &args.log,
            Commands::Overlaps(args) => &args.log,
        }
    }
}

/// Verbosity flags shared by every command
#[derive(clap::Args, Debug, Clone, Default)]
pub struct LogArgs {
    /// Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,
}

impl LogArgs {
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => DEFAULT_LOG_LEVEL,
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    pub fn show_progress(&self) -> bool {
        !self.quiet
    }
}

/// Arguments for the per-track processing commands
#[derive(clap::Args, Debug, Clone)]
pub struct RunArgs {
    /// Track folder, or with --batch a folder of track folders
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Treat PATH as a batch root and process every track in it
    #[arg(short, long)]
    pub batch: bool,

    /// JSON configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Replace existing output files
    #[arg(long = "force")]
    pub force_overwrite: bool,

    /// List the tracks that would be processed without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Tracks processed concurrently in batch mode
    #[arg(short = 'j', long, value_name = "COUNT")]
    pub workers: Option<usize>,

    /// Crossover search half-width in degrees, both axes
    #[arg(long, value_name = "DEGREES")]
    pub tolerance: Option<f64>,

    /// Wrap interval in depth units
    #[arg(long, value_name = "DEPTH")]
    pub wrap_interval: Option<f64>,

    /// Relative tolerance around each wrap multiple
    #[arg(long, value_name = "FRACTION")]
    pub wrap_tolerance: Option<f64>,

    /// Do not write qc_report.json
    #[arg(long)]
    pub no_report: bool,

    #[command(flatten)]
    pub log: LogArgs,
}

impl RunArgs {
    /// Configuration file (or defaults) with command-line overrides applied
    pub fn load_config(&self) -> crate::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(tolerance) = self.tolerance {
            config = config.with_crossover_tolerance(tolerance, tolerance);
        }
        if self.wrap_interval.is_some() || self.wrap_tolerance.is_some() {
            let interval = self.wrap_interval.unwrap_or(config.wrap.interval);
            let tolerance = self.wrap_tolerance.unwrap_or(config.wrap.tolerance);
            config = config.with_wrap(interval, tolerance);
        }
        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        if self.force_overwrite {
            config = config.with_force_overwrite();
        }
        if self.no_report {
            config = config.without_report();
        }

        config.validate()?;
        Ok(config)
    }
}

/// Arguments for the overlaps command
#[derive(clap::Args, Debug, Clone)]
pub struct OverlapArgs {
    /// Folder of track folders
    #[arg(value_name = "DIR")]
    pub root: PathBuf,

    /// JSON configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print pairs as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub log: LogArgs,
}

/// Set up structured logging on stderr
pub fn setup_logging(args: &LogArgs) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("bathyclean={}", log_level)));

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    tracing::debug!("Logging initialized at level: {}", log_level);
}

/// Command runners used by the binary
pub mod commands {
    use super::*;
    use crate::processor::batch::BatchProcessor;
    use crate::processor::discovery::{discover_tracks, track_name};
    use crate::processor::{TrackContext, TrackOutcome, overlapping_tracks};
    use anyhow::{Context, Result};
    use colored::*;
    use std::sync::Arc;
    use tracing::info;

    /// Exit status of a finished command
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Completion {
        Success,
        /// Some tracks in a batch failed
        PartialFailure,
    }

    pub async fn run(args: Args) -> Result<Completion> {
        match args.command {
            Commands::Outliers(run_args) => run_task(TrackTask::Outliers, run_args).await,
            Commands::Scale(run_args) => run_task(TrackTask::Scale, run_args).await,
            Commands::Wrap(run_args) => run_task(TrackTask::Wrap, run_args).await,
            Commands::Prefilter(run_args) => run_task(TrackTask::Prefilter, run_args).await,
            Commands::ImportCrossovers(run_args) => {
                run_task(TrackTask::ImportCrossovers, run_args).await
            }
            Commands::Overlaps(overlap_args) => run_overlaps(overlap_args),
        }
    }

    async fn run_task(task: TrackTask, args: RunArgs) -> Result<Completion> {
        let config = Arc::new(
            args.load_config()
                .context("Failed to load configuration")?,
        );

        let tracks = if args.batch {
            discover_tracks(&args.path, &config.layout)
                .with_context(|| format!("Failed to discover tracks in {}", args.path.display()))?
        } else {
            vec![args.path.clone()]
        };

        if args.dry_run {
            print_dry_run(task, &tracks);
            return Ok(Completion::Success);
        }

        if !args.batch {
            let ctx = TrackContext::new(args.path.clone(), config)?;
            let name = ctx.name().to_string();
            let outcome = tokio::task::spawn_blocking(move || ctx.run(task))
                .await
                .context("Track task panicked")?
                .with_context(|| format!("Failed to run {} on {}", task, name))?;
            if args.log.show_progress() {
                print_track_outcome(&name, &outcome);
            }
            return Ok(Completion::Success);
        }

        let summary = BatchProcessor::new(config, task)
            .with_progress(args.log.show_progress())
            .run(tracks)
            .await;

        if args.log.show_progress() {
            summary.print();
        }

        Ok(if summary.is_success() {
            Completion::Success
        } else {
            Completion::PartialFailure
        })
    }

    fn run_overlaps(args: OverlapArgs) -> Result<Completion> {
        let config = match &args.config {
            Some(path) => PipelineConfig::from_file(path)?,
            None => PipelineConfig::default(),
        };
        let tracks = discover_tracks(&args.root, &config.layout)
            .with_context(|| format!("Failed to discover tracks in {}", args.root.display()))?;
        info!("Computing overlaps for {} tracks", tracks.len());

        let pairs = overlapping_tracks(&tracks, Arc::new(config));

        if args.json {
            println!("{}", serde_json::to_string_pretty(&pairs)?);
        } else {
            for pair in &pairs {
                println!("{} {}", pair.track, pair.other);
            }
        }
        Ok(Completion::Success)
    }

    fn print_dry_run(task: TrackTask, tracks: &[PathBuf]) {
        println!(
            "{} {} on {} tracks",
            "Dry run:".bright_yellow().bold(),
            task,
            tracks.len()
        );
        for track in tracks {
            println!("  {} {}", track_name(track).bright_white(), track.display());
        }
    }

    fn print_track_outcome(name: &str, outcome: &TrackOutcome) {
        match outcome {
            TrackOutcome::Processed { stats, outputs } => {
                println!("{} {}", "Processed".bright_green().bold(), name.bright_white());
                println!(
                    "  points {}  cleaned {}  rejected {}  outliers {}",
                    stats.survey_points,
                    stats.cleaned,
                    stats.rejected(),
                    stats.confirmed_outliers
                );
                if let Some(fit) = stats.regression {
                    println!(
                        "  slope {:.6}  r {:.4}  samples {}",
                        fit.slope, fit.r_value, fit.samples
                    );
                }
                if stats.wrap_corrections > 0 {
                    println!("  wrap corrections {}", stats.wrap_corrections);
                }
                for path in outputs {
                    println!("  {} {}", "wrote".dimmed(), path.display());
                }
            }
            TrackOutcome::Skipped { reason } => {
                println!("{} {}: {}", "Skipped".yellow().bold(), name, reason);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_levels() {
        let args = Args::parse_from(["bathyclean", "outliers", "track", "-vv"]);
        assert_eq!(args.command.log_args().get_log_level(), "debug");

        let args = Args::parse_from(["bathyclean", "scale", "track", "-q"]);
        assert_eq!(args.command.log_args().get_log_level(), "error");
        assert!(!args.command.log_args().show_progress());

        let args = Args::parse_from(["bathyclean", "overlaps", "root"]);
        assert_eq!(args.command.log_args().get_log_level(), DEFAULT_LOG_LEVEL);
        assert!(args.command.task().is_none());
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let args = Args::parse_from([
            "bathyclean",
            "wrap",
            "root",
            "--batch",
            "--force",
            "-j",
            "3",
            "--tolerance",
            "0.5",
            "--wrap-interval",
            "1500",
            "--no-report",
        ]);
        assert_eq!(args.command.task(), Some(TrackTask::Wrap));

        let Commands::Wrap(run_args) = args.command else {
            panic!("Expected wrap command");
        };
        assert!(run_args.batch);

        let config = run_args.load_config().unwrap();
        assert_eq!(config.workers, 3);
        assert!(config.force_overwrite);
        assert!(!config.write_report);
        assert_eq!(config.crossover_tolerance.longitude, 0.5);
        assert_eq!(config.wrap.interval, 1500.0);
        assert_eq!(config.wrap.tolerance, 0.05);
    }

    #[test]
    fn test_wrap_tolerance_override_keeps_interval() {
        let args = Args::parse_from(["bathyclean", "wrap", "track", "--wrap-tolerance", "0.1"]);
        let Commands::Wrap(run_args) = args.command else {
            panic!("Expected wrap command");
        };

        let config = run_args.load_config().unwrap();
        assert_eq!(config.wrap.interval, crate::constants::DEFAULT_WRAP_INTERVAL);
        assert_eq!(config.wrap.tolerance, 0.1);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let args = Args::parse_from(["bathyclean", "wrap", "root", "--wrap-tolerance", "1.5"]);
        let Commands::Wrap(run_args) = args.command else {
            panic!("Expected wrap command");
        };
        assert!(run_args.load_config().is_err());
    }

    #[test]
    fn test_import_crossovers_subcommand_name() {
        let args = Args::parse_from(["bathyclean", "import-crossovers", "track", "--dry-run"]);
        assert_eq!(args.command.task(), Some(TrackTask::ImportCrossovers));
    }
}
