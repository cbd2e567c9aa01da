//! Scale-factor (multiplicative bias) correction
//!
//! Fits the slope of demeaned survey depth against reference depth and divides
//! every survey value by it. Repeated model samples are collapsed to their first
//! occurrence before fitting so they do not dominate the regression.

use super::round_one_decimal;
use crate::error::{BathyError, Result};
use crate::models::{MatchedPoint, Point, RegressionFit, canonical_bits};
use std::collections::HashSet;
use tracing::{debug, info};

/// Fitted scale regression and the rescaled survey track
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleCorrection {
    pub fit: RegressionFit,
    /// Every input point, in input order, with `survey / slope` at 0.1 resolution
    pub corrected: Vec<Point>,
}

/// Round model values to the 0.1 resolution the regression works at
pub fn round_references(points: &mut [MatchedPoint]) {
    for point in points {
        point.reference = round_one_decimal(point.reference);
    }
}

/// Keep the first point seen for each distinct reference value
pub fn dedup_by_reference(points: &[MatchedPoint]) -> Vec<MatchedPoint> {
    let mut seen = HashSet::with_capacity(points.len());
    points
        .iter()
        .filter(|p| seen.insert(canonical_bits(p.reference)))
        .copied()
        .collect()
}

/// Least-squares slope of demeaned survey values on reference values.
///
/// Fails when fewer than two distinct reference values remain, or when the
/// slope is zero or not finite, since the correction divides by it.
pub fn fit_scale_factor(points: &[MatchedPoint]) -> Result<RegressionFit> {
    let unique = dedup_by_reference(points);
    let samples = unique.len();
    if samples < 2 {
        return Err(BathyError::degenerate(format!(
            "need at least 2 distinct reference values, found {samples}"
        )));
    }

    let n = samples as f64;
    let survey_mean = unique.iter().map(|p| p.survey).sum::<f64>() / n;
    let x: Vec<f64> = unique.iter().map(|p| p.reference).collect();
    let y: Vec<f64> = unique.iter().map(|p| p.survey - survey_mean).collect();

    let x_mean = x.iter().sum::<f64>() / n;
    let y_mean = y.iter().sum::<f64>() / n;

    let mut ss_x = 0.0;
    let mut ss_y = 0.0;
    let mut ss_xy = 0.0;
    for (xi, yi) in x.iter().zip(&y) {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        ss_x += dx * dx;
        ss_y += dy * dy;
        ss_xy += dx * dy;
    }

    if ss_x == 0.0 || !ss_x.is_finite() {
        return Err(BathyError::degenerate("reference values have no variance"));
    }

    let slope = ss_xy / ss_x;
    if slope == 0.0 || !slope.is_finite() {
        return Err(BathyError::degenerate(format!(
            "slope {slope} cannot be used as a scale factor"
        )));
    }

    let r_value = if ss_y == 0.0 {
        0.0
    } else {
        (ss_xy / (ss_x * ss_y).sqrt()).clamp(-1.0, 1.0)
    };

    debug!(
        "Scale regression over {} unique reference values: slope={}, r={}",
        samples, slope, r_value
    );

    Ok(RegressionFit {
        slope,
        r_value,
        samples,
    })
}

/// Divide every survey value by `slope`, rounding to one decimal
pub fn apply_scale(points: &[MatchedPoint], slope: f64) -> Vec<Point> {
    points
        .iter()
        .map(|p| Point::new(p.longitude, p.latitude, round_one_decimal(p.survey / slope)))
        .collect()
}

/// Fit the scale factor and rescale the full (non-deduplicated) track
pub fn correct_scale(points: &[MatchedPoint]) -> Result<ScaleCorrection> {
    let fit = fit_scale_factor(points)?;
    let corrected = apply_scale(points, fit.slope);

    info!(
        "Scale correction: slope {:.6}, r {:.4}, {} points rescaled",
        fit.slope,
        fit.r_value,
        corrected.len()
    );

    Ok(ScaleCorrection { fit, corrected })
}
