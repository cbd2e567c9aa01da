//! In-memory pass pipelines
//!
//! Composes the QC stages into the three track workflows. Nothing here touches
//! the filesystem, so the same functions serve the CLI and library callers.

use crate::config::{CrossoverTolerance, WrapConfig};
use crate::error::Result;
use crate::models::{
    ConfirmedOutlier, CrossoverRecord, MatchedPoint, Point, ResidualStats, TrackStats,
};
use crate::qc::gross_filter::{GrossFilterOutput, drop_invalid, join, split_matched};
use crate::qc::scale_factor::{ScaleCorrection, correct_scale, round_references};
use crate::qc::travel_time::{correct_wraps, wrap_reference};
use crate::qc::{apply_gross_filter, confirm_outliers, round_one_decimal};
use crate::reference::ReferenceIndex;

/// Gross filter plus crossover confirmation
#[derive(Debug, Clone)]
pub struct OutlierPassResult {
    pub filter: GrossFilterOutput,
    pub confirmed: Vec<ConfirmedOutlier>,
    pub stats: TrackStats,
}

pub fn outlier_pass(
    survey: &[Point],
    index: &ReferenceIndex,
    crossovers: &[CrossoverRecord],
    tolerance: CrossoverTolerance,
) -> OutlierPassResult {
    let filter = apply_gross_filter(survey, index);
    let confirmed = confirm_outliers(&filter.rejected, crossovers, tolerance);

    let mut stats = TrackStats {
        survey_points: survey.len(),
        crossover_records: crossovers.len(),
        confirmed_outliers: confirmed.len(),
        residual: ResidualStats::from_matched(&filter.cleaned),
        ..Default::default()
    };
    filter.record(&mut stats);

    OutlierPassResult {
        filter,
        confirmed,
        stats,
    }
}

/// Scale-factor correction of a whole track
#[derive(Debug, Clone)]
pub struct ScalePassResult {
    pub correction: ScaleCorrection,
    pub stats: TrackStats,
}

/// Join without gross filtering, fit on 0.1-rounded model values, rescale.
///
/// A degenerate regression is returned as an error for the caller to skip.
pub fn scale_pass(survey: &[Point], index: &ReferenceIndex) -> Result<ScalePassResult> {
    let (valid, invalid_dropped) = drop_invalid(survey);
    let (mut matched, unmatched_dropped) = join(&valid, index);
    round_references(&mut matched);

    let correction = correct_scale(&matched)?;

    let rescaled: Vec<MatchedPoint> = correction
        .corrected
        .iter()
        .zip(&matched)
        .map(|(c, m)| MatchedPoint::from_survey(c, m.reference))
        .collect();

    let stats = TrackStats {
        survey_points: survey.len(),
        invalid_dropped,
        unmatched_dropped,
        cleaned: correction.corrected.len(),
        regression: Some(correction.fit),
        residual: ResidualStats::from_matched(&rescaled),
        ..Default::default()
    };

    Ok(ScalePassResult { correction, stats })
}

/// Wrap correction followed by a fresh gross filter
#[derive(Debug, Clone)]
pub struct WrapPassResult {
    pub filter: GrossFilterOutput,
    pub corrections: usize,
    pub stats: TrackStats,
}

/// Survey values are taken at 0.1 resolution and model values at whole units
/// for the wrap test; the follow-up gross filter uses the model values as stored.
pub fn wrap_pass(survey: &[Point], index: &ReferenceIndex, wrap: WrapConfig) -> WrapPassResult {
    let (valid, invalid_dropped) = drop_invalid(survey);
    let rounded: Vec<Point> = valid
        .iter()
        .map(|p| Point::new(p.longitude, p.latitude, round_one_decimal(p.value)))
        .collect();

    let (mut matched, unmatched_dropped) = join(&rounded, index);
    for point in &mut matched {
        point.reference = wrap_reference(point.reference);
    }

    let corrected = correct_wraps(&matched, wrap);

    let rematched = corrected.points.iter().filter_map(|p| {
        index
            .get(p.longitude, p.latitude)
            .map(|reference| MatchedPoint { reference, ..*p })
    });
    let (cleaned, rejected) = split_matched(rematched);

    let filter = GrossFilterOutput {
        cleaned,
        rejected,
        invalid_dropped,
        unmatched_dropped,
    };

    let mut stats = TrackStats {
        survey_points: survey.len(),
        wrap_corrections: corrected.corrections,
        residual: ResidualStats::from_matched(&filter.cleaned),
        ..Default::default()
    };
    filter.record(&mut stats);

    WrapPassResult {
        filter,
        corrections: corrected.corrections,
        stats,
    }
}
