//! Core data structures for bathymetry cleaning.
//!
//! Defines survey/reference points, the exact coordinate join key, matched and
//! rejected points, crossover evidence and per-track statistics.

use serde::{Deserialize, Serialize};

/// A single sample: survey depth or reference model elevation.
///
/// Values are signed with negative below the datum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub longitude: f64,
    pub latitude: f64,
    pub value: f64,
}

impl Point {
    pub fn new(longitude: f64, latitude: f64, value: f64) -> Self {
        Self {
            longitude,
            latitude,
            value,
        }
    }

    /// Sensor dropout sentinel: NaN or exactly zero
    pub fn is_dropout(&self) -> bool {
        self.value.is_nan() || self.value == 0.0
    }

    pub fn key(&self) -> Option<CoordKey> {
        CoordKey::new(self.longitude, self.latitude)
    }
}

/// Exact (longitude, latitude) join key.
///
/// Compares bit patterns, with `-0.0` folded onto `0.0` so that keys agree
/// with float equality. NaN coordinates have no key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordKey {
    lon_bits: u64,
    lat_bits: u64,
}

impl CoordKey {
    pub fn new(longitude: f64, latitude: f64) -> Option<Self> {
        if longitude.is_nan() || latitude.is_nan() {
            return None;
        }
        Some(Self {
            lon_bits: canonical_bits(longitude),
            lat_bits: canonical_bits(latitude),
        })
    }

    pub fn longitude(&self) -> f64 {
        f64::from_bits(self.lon_bits)
    }

    pub fn latitude(&self) -> f64 {
        f64::from_bits(self.lat_bits)
    }
}

/// Bit pattern of a float with both zeros mapped to `+0.0`
pub(crate) fn canonical_bits(value: f64) -> u64 {
    if value == 0.0 {
        0.0f64.to_bits()
    } else {
        value.to_bits()
    }
}

/// A survey point joined to its reference model value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchedPoint {
    pub longitude: f64,
    pub latitude: f64,
    pub survey: f64,
    pub reference: f64,
}

impl MatchedPoint {
    pub fn new(longitude: f64, latitude: f64, survey: f64, reference: f64) -> Self {
        Self {
            longitude,
            latitude,
            survey,
            reference,
        }
    }

    pub fn from_survey(point: &Point, reference: f64) -> Self {
        Self::new(point.longitude, point.latitude, point.value, reference)
    }

    /// Absolute disagreement between model and survey
    pub fn discrepancy(&self) -> f64 {
        (self.reference - self.survey).abs()
    }

    /// Survey side of the match, as written to cleaned output
    pub fn survey_point(&self) -> Point {
        Point::new(self.longitude, self.latitude, self.survey)
    }
}

/// Why the gross filter rejected a point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// Reference model places the point above sea level
    OnLand,
    /// Survey and reference disagree by more than the gross threshold
    Discrepancy,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RejectedPoint {
    pub point: MatchedPoint,
    pub reason: RejectionReason,
}

/// Independent evidence that two overlapping tracks disagree at a location
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossoverRecord {
    pub longitude: f64,
    pub latitude: f64,
    pub mismatch: f64,
}

impl CrossoverRecord {
    pub fn new(longitude: f64, latitude: f64, mismatch: f64) -> Self {
        Self {
            longitude,
            latitude,
            mismatch,
        }
    }
}

/// A rejection corroborated by crossover evidence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfirmedOutlier {
    pub rejected: RejectedPoint,
    /// First crossover record found inside the tolerance box
    pub evidence: CrossoverRecord,
}

/// Scale regression diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionFit {
    pub slope: f64,
    pub r_value: f64,
    pub samples: usize,
}

/// Summary of survey - reference residuals over a retained point set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResidualStats {
    pub mean: f64,
    pub std_dev: f64,
    pub count: usize,
}

impl ResidualStats {
    /// Population statistics of `survey - reference`; `None` when empty
    pub fn from_matched(points: &[MatchedPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let count = points.len();
        let n = count as f64;
        let mean = points.iter().map(|p| p.survey - p.reference).sum::<f64>() / n;
        let variance = points
            .iter()
            .map(|p| {
                let d = p.survey - p.reference - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        Some(Self {
            mean,
            std_dev: variance.sqrt(),
            count,
        })
    }
}

/// Per-track processing statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackStats {
    pub survey_points: usize,
    pub invalid_dropped: usize,
    pub unmatched_dropped: usize,
    pub cleaned: usize,
    pub rejected_on_land: usize,
    pub rejected_discrepancy: usize,
    pub confirmed_outliers: usize,
    pub crossover_records: usize,
    pub wrap_corrections: usize,
    pub regression: Option<RegressionFit>,
    pub residual: Option<ResidualStats>,
}

impl TrackStats {
    pub fn rejected(&self) -> usize {
        self.rejected_on_land + self.rejected_discrepancy
    }

    /// Add another track's counts; per-track fits are not aggregated
    pub fn absorb(&mut self, other: &TrackStats) {
        self.survey_points += other.survey_points;
        self.invalid_dropped += other.invalid_dropped;
        self.unmatched_dropped += other.unmatched_dropped;
        self.cleaned += other.cleaned;
        self.rejected_on_land += other.rejected_on_land;
        self.rejected_discrepancy += other.rejected_discrepancy;
        self.confirmed_outliers += other.confirmed_outliers;
        self.crossover_records += other.crossover_records;
        self.wrap_corrections += other.wrap_corrections;
    }
}
