//! Domain constants for bathymetry cleaning
//!
//! Thresholds that define the scientific behaviour of the pipeline live here
//! and are not part of the runtime configuration.

// =============================================================================
// Quality Control Thresholds
// =============================================================================

/// Maximum |reference - survey| disagreement accepted by the gross filter
pub const GROSS_DISCREPANCY_THRESHOLD: f64 = 1000.0;

/// Crossover mismatch magnitude above which a crossover corroborates a rejection
pub const CROSSOVER_MISMATCH_THRESHOLD: f64 = 1000.0;

/// Reference values above this are on land
pub const SEA_LEVEL: f64 = 0.0;

/// Default crossover search half-width in degrees (about one minute of arc)
pub const DEFAULT_CROSSOVER_TOLERANCE_DEG: f64 = 0.0167;

// =============================================================================
// Travel-Time Wrap
// =============================================================================

/// Depth equivalent of one sound-velocity round-trip ambiguity
pub const DEFAULT_WRAP_INTERVAL: f64 = 750.0;

/// Relative tolerance around an integer multiple of the wrap interval
pub const DEFAULT_WRAP_TOLERANCE: f64 = 0.05;

// =============================================================================
// Track Folder Layout
// =============================================================================

pub mod file_names {
    pub const REFERENCE: &str = "topo.xyz";
    pub const SURVEY: &str = "bathy.xyz";
    pub const CROSSOVERS: &str = "crossover.txt";
    pub const CLEANED: &str = "newbathy.xyz";
    pub const REJECTED: &str = "deletebathy.xyz";
    pub const OUTLIERS: &str = "outliers.xyz";
    pub const SCALE_CORRECTED: &str = "modify_bathy.xyz";
    pub const REPORT: &str = "qc_report.json";
    pub const FILTERED_SURVEY: &str = "filtered.xyz";

    /// Raw per-pair output of the track-intersection tool
    pub const RAW_CROSSOVER_PATTERN: &str = "*_crossover.txt";
}

// =============================================================================
// Track-Intersection Tool Output
// =============================================================================

/// Header lines preceding the data rows in each raw crossover file
pub const X2SYS_HEADER_LINES: usize = 4;

/// Minimum number of columns in a raw crossover data row (lon, lat, .., mismatch, ..)
pub const X2SYS_MIN_FIELDS: usize = 3;

// =============================================================================
// Logging
// =============================================================================

/// Default log level when no verbosity flags are given
pub const DEFAULT_LOG_LEVEL: &str = "warn";
