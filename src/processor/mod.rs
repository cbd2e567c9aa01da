//! Track processing engine.
//!
//! A [`TrackContext`] carries everything one track needs (its folder and the
//! shared read-only configuration) through loading, the QC stages and the
//! all-or-nothing output commit. Batch runs in [`batch`] fan tracks out over
//! blocking worker tasks; tracks share no mutable state.

pub mod batch;
pub mod discovery;
pub mod overlap;
pub mod passes;
pub mod report;
pub mod writer;

#[cfg(test)]
pub mod tests;

use self::overlap::{BoundingBox, TrackPair, find_overlaps};
use self::passes::{outlier_pass, scale_pass, wrap_pass};
use self::report::TrackReport;
use self::writer::{
    OutputSet, render_cleaned, render_crossovers, render_outliers, render_points, render_rejected,
};

use crate::config::PipelineConfig;
use crate::error::{BathyError, Result};
use crate::loader::{load_crossovers, load_points};
use crate::models::{CrossoverRecord, Point, TrackStats};
use crate::reference::ReferenceIndex;
use crate::x2sys::{combine_raw_crossovers, filter_survey_text, find_raw_crossover_files};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Work that can be run on a single track folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackTask {
    /// Gross filter and crossover confirmation
    Outliers,
    /// Scale-factor correction
    Scale,
    /// Travel-time wrap correction and re-filter
    Wrap,
    /// Survey file with dropout lines removed, for the intersection tool
    Prefilter,
    /// Combine raw intersection tables into the crossover file
    ImportCrossovers,
}

impl TrackTask {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackTask::Outliers => "outliers",
            TrackTask::Scale => "scale",
            TrackTask::Wrap => "wrap",
            TrackTask::Prefilter => "prefilter",
            TrackTask::ImportCrossovers => "import-crossovers",
        }
    }

    /// Whether the task produces a QC report
    pub fn is_qc_pass(&self) -> bool {
        matches!(self, TrackTask::Outliers | TrackTask::Scale | TrackTask::Wrap)
    }
}

impl fmt::Display for TrackTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a track run ended, short of an error
#[derive(Debug, Clone, PartialEq)]
pub enum TrackOutcome {
    Processed {
        stats: TrackStats,
        outputs: Vec<PathBuf>,
    },
    /// No correction could be made; nothing was written
    Skipped { reason: String },
}

/// Per-track processing context
#[derive(Debug, Clone)]
pub struct TrackContext {
    name: String,
    dir: PathBuf,
    config: Arc<PipelineConfig>,
}

impl TrackContext {
    pub fn new(dir: PathBuf, config: Arc<PipelineConfig>) -> Result<Self> {
        if !dir.is_dir() {
            return Err(BathyError::TrackNotFound { path: dir });
        }
        Ok(Self {
            name: discovery::track_name(&dir),
            dir,
            config,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one task to completion
    pub fn run(&self, task: TrackTask) -> Result<TrackOutcome> {
        info!("Track {}: running {}", self.name, task);
        match task {
            TrackTask::Outliers => self.run_outliers(),
            TrackTask::Scale => self.run_scale(),
            TrackTask::Wrap => self.run_wrap(),
            TrackTask::Prefilter => self.run_prefilter(),
            TrackTask::ImportCrossovers => self.run_import_crossovers(),
        }
    }

    fn output_path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn require(&self, path: PathBuf) -> Result<PathBuf> {
        if path.is_file() {
            Ok(path)
        } else {
            Err(BathyError::MissingInput { path })
        }
    }

    pub fn load_survey(&self) -> Result<Vec<Point>> {
        let path = self.require(self.config.layout.survey_path(&self.dir))?;
        load_points(&path)
    }

    pub fn load_reference(&self) -> Result<ReferenceIndex> {
        let path = self.require(self.config.layout.reference_path(&self.dir))?;
        let index = ReferenceIndex::build(&load_points(&path)?);
        debug!(
            "Track {}: reference index with {} keys",
            self.name,
            index.len()
        );
        Ok(index)
    }

    /// Crossover records, or none when the track has no crossover file
    pub fn load_crossovers(&self) -> Result<Vec<CrossoverRecord>> {
        let path = self.config.layout.crossovers_path(&self.dir);
        if !path.is_file() {
            warn!(
                "Track {}: no {} found, no rejections can be confirmed",
                self.name, self.config.layout.crossovers
            );
            return Ok(Vec::new());
        }
        load_crossovers(&path)
    }

    /// Bounding box of the survey coordinates
    pub fn survey_bounds(&self) -> Result<Option<BoundingBox>> {
        Ok(BoundingBox::from_points(&self.load_survey()?))
    }

    fn run_outliers(&self) -> Result<TrackOutcome> {
        let survey = self.load_survey()?;
        let index = self.load_reference()?;
        let crossovers = self.load_crossovers()?;

        let result = outlier_pass(&survey, &index, &crossovers, self.config.crossover_tolerance);

        let layout = &self.config.layout;
        let mut outputs = OutputSet::new();
        outputs.add(self.output_path(&layout.cleaned), render_cleaned(&result.filter.cleaned));
        outputs.add(self.output_path(&layout.rejected), render_rejected(&result.filter.rejected));
        outputs.add(self.output_path(&layout.outliers), render_outliers(&result.confirmed));

        self.finish(TrackTask::Outliers, result.stats, outputs)
    }

    fn run_scale(&self) -> Result<TrackOutcome> {
        let survey = self.load_survey()?;
        let index = self.load_reference()?;

        let result = match scale_pass(&survey, &index) {
            Ok(result) => result,
            Err(e) if e.is_recoverable() => {
                warn!("Track {}: scale correction skipped: {}", self.name, e);
                return Ok(TrackOutcome::Skipped {
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        };

        let mut outputs = OutputSet::new();
        outputs.add(
            self.output_path(&self.config.layout.scale_corrected),
            render_points(&result.correction.corrected),
        );

        self.finish(TrackTask::Scale, result.stats, outputs)
    }

    fn run_wrap(&self) -> Result<TrackOutcome> {
        let survey = self.load_survey()?;
        let index = self.load_reference()?;

        let result = wrap_pass(&survey, &index, self.config.wrap);

        let layout = &self.config.layout;
        let mut outputs = OutputSet::new();
        outputs.add(self.output_path(&layout.cleaned), render_cleaned(&result.filter.cleaned));
        outputs.add(self.output_path(&layout.rejected), render_rejected(&result.filter.rejected));

        self.finish(TrackTask::Wrap, result.stats, outputs)
    }

    fn run_prefilter(&self) -> Result<TrackOutcome> {
        let path = self.require(self.config.layout.survey_path(&self.dir))?;
        let text = std::fs::read_to_string(&path).map_err(|e| BathyError::io(&path, e))?;
        let filtered = filter_survey_text(&text);

        let stats = TrackStats {
            survey_points: filtered.kept + filtered.dropped,
            invalid_dropped: filtered.dropped,
            cleaned: filtered.kept,
            ..Default::default()
        };

        let mut outputs = OutputSet::new();
        outputs.add(self.output_path(&self.config.layout.filtered_survey), filtered.text);

        self.finish(TrackTask::Prefilter, stats, outputs)
    }

    fn run_import_crossovers(&self) -> Result<TrackOutcome> {
        let files = find_raw_crossover_files(&self.dir, &self.config.layout.raw_crossover_pattern)?;
        if files.is_empty() {
            warn!(
                "Track {}: no files matching {}",
                self.name, self.config.layout.raw_crossover_pattern
            );
        }
        let records = combine_raw_crossovers(&files)?;
        info!(
            "Track {}: {} crossover records from {} files",
            self.name,
            records.len(),
            files.len()
        );

        let stats = TrackStats {
            crossover_records: records.len(),
            ..Default::default()
        };

        let mut outputs = OutputSet::new();
        outputs.add(
            self.output_path(&self.config.layout.crossovers),
            render_crossovers(&records),
        );

        self.finish(TrackTask::ImportCrossovers, stats, outputs)
    }

    /// Attach the report if enabled and commit every output together
    fn finish(
        &self,
        task: TrackTask,
        stats: TrackStats,
        mut outputs: OutputSet,
    ) -> Result<TrackOutcome> {
        if self.config.write_report && task.is_qc_pass() {
            let report = TrackReport::new(self.name.clone(), task, stats.clone(), outputs.paths());
            outputs.add(self.output_path(&self.config.layout.report), report.to_json());
        }

        let written = outputs.commit(self.config.force_overwrite)?;
        info!(
            "Track {}: {} complete, {} files written",
            self.name,
            task,
            written.len()
        );

        Ok(TrackOutcome::Processed {
            stats,
            outputs: written,
        })
    }
}

/// Overlapping track pairs among `tracks`; unreadable tracks are skipped with a warning
pub fn overlapping_tracks(tracks: &[PathBuf], config: Arc<PipelineConfig>) -> Vec<TrackPair> {
    let mut boxes = Vec::with_capacity(tracks.len());

    for dir in tracks {
        let bounds = TrackContext::new(dir.clone(), config.clone()).and_then(|ctx| {
            let bounds = ctx.survey_bounds()?;
            Ok((ctx.name().to_string(), bounds))
        });
        match bounds {
            Ok((name, Some(bbox))) => boxes.push((name, bbox)),
            Ok((name, None)) => warn!("Track {}: no survey points, skipped", name),
            Err(e) => warn!("Track {}: {}", dir.display(), e),
        }
    }

    find_overlaps(&boxes)
}
