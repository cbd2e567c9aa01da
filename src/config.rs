//! Configuration management and validation.
//!
//! Provides the pipeline configuration: crossover search tolerance, wrap
//! correction parameters, track folder layout and batch settings. The gross
//! rejection thresholds are fixed domain constants and not configurable.

use crate::constants::{
    DEFAULT_CROSSOVER_TOLERANCE_DEG, DEFAULT_WRAP_INTERVAL, DEFAULT_WRAP_TOLERANCE, file_names,
};
use crate::error::{BathyError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Half-widths of the crossover search box, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossoverTolerance {
    pub longitude: f64,
    pub latitude: f64,
}

impl CrossoverTolerance {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

impl Default for CrossoverTolerance {
    fn default() -> Self {
        Self::new(
            DEFAULT_CROSSOVER_TOLERANCE_DEG,
            DEFAULT_CROSSOVER_TOLERANCE_DEG,
        )
    }
}

/// Travel-time wrap correction parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WrapConfig {
    /// Depth equivalent of one wrap, in depth units
    pub interval: f64,

    /// Relative tolerance around `k * interval`
    pub tolerance: f64,
}

impl Default for WrapConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_WRAP_INTERVAL,
            tolerance: DEFAULT_WRAP_TOLERANCE,
        }
    }
}

/// File names inside a track folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackLayout {
    pub reference: String,
    pub survey: String,
    pub crossovers: String,
    pub cleaned: String,
    pub rejected: String,
    pub outliers: String,
    pub scale_corrected: String,
    pub report: String,
    pub filtered_survey: String,
    pub raw_crossover_pattern: String,
}

impl Default for TrackLayout {
    fn default() -> Self {
        Self {
            reference: file_names::REFERENCE.to_string(),
            survey: file_names::SURVEY.to_string(),
            crossovers: file_names::CROSSOVERS.to_string(),
            cleaned: file_names::CLEANED.to_string(),
            rejected: file_names::REJECTED.to_string(),
            outliers: file_names::OUTLIERS.to_string(),
            scale_corrected: file_names::SCALE_CORRECTED.to_string(),
            report: file_names::REPORT.to_string(),
            filtered_survey: file_names::FILTERED_SURVEY.to_string(),
            raw_crossover_pattern: file_names::RAW_CROSSOVER_PATTERN.to_string(),
        }
    }
}

impl TrackLayout {
    pub fn reference_path(&self, track: &Path) -> PathBuf {
        track.join(&self.reference)
    }

    pub fn survey_path(&self, track: &Path) -> PathBuf {
        track.join(&self.survey)
    }

    pub fn crossovers_path(&self, track: &Path) -> PathBuf {
        track.join(&self.crossovers)
    }
}

/// Global configuration for bathymetry cleaning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Crossover confirmation search box
    pub crossover_tolerance: CrossoverTolerance,

    /// Travel-time wrap correction parameters
    pub wrap: WrapConfig,

    /// Track folder file names
    pub layout: TrackLayout,

    /// Number of tracks processed concurrently in batch mode
    pub workers: usize,

    /// Replace existing output files
    pub force_overwrite: bool,

    /// Write a JSON report next to each track's outputs
    pub write_report: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            crossover_tolerance: CrossoverTolerance::default(),
            wrap: WrapConfig::default(),
            layout: TrackLayout::default(),
            workers: num_cpus::get(),
            force_overwrite: false,
            write_report: true,
        }
    }
}

impl PipelineConfig {
    /// Load a JSON configuration file; absent keys take their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| BathyError::io(path, e))?;
        let config: Self = serde_json::from_str(&text).map_err(|e| BathyError::Json {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        let tol = self.crossover_tolerance;
        if !(tol.longitude.is_finite() && tol.longitude >= 0.0)
            || !(tol.latitude.is_finite() && tol.latitude >= 0.0)
        {
            return Err(BathyError::configuration(format!(
                "crossover tolerance must be finite and non-negative, got ({}, {})",
                tol.longitude, tol.latitude
            )));
        }
        if !(self.wrap.interval.is_finite() && self.wrap.interval > 0.0) {
            return Err(BathyError::configuration(format!(
                "wrap interval must be positive, got {}",
                self.wrap.interval
            )));
        }
        if !(0.0..1.0).contains(&self.wrap.tolerance) {
            return Err(BathyError::configuration(format!(
                "wrap tolerance must be in [0, 1), got {}",
                self.wrap.tolerance
            )));
        }
        if self.workers == 0 {
            return Err(BathyError::configuration("workers must be at least 1"));
        }
        Ok(())
    }

    /// Set the crossover search box
    pub fn with_crossover_tolerance(mut self, longitude: f64, latitude: f64) -> Self {
        self.crossover_tolerance = CrossoverTolerance::new(longitude, latitude);
        self
    }

    /// Set the wrap interval and relative tolerance
    pub fn with_wrap(mut self, interval: f64, tolerance: f64) -> Self {
        self.wrap = WrapConfig {
            interval,
            tolerance,
        };
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Enable overwriting existing outputs
    pub fn with_force_overwrite(mut self) -> Self {
        self.force_overwrite = true;
        self
    }

    /// Skip the per-track JSON report
    pub fn without_report(mut self) -> Self {
        self.write_report = false;
        self
    }
}
