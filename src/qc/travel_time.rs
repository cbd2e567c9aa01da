//! Travel-time wrap correction
//!
//! An echo sounder assuming the wrong sound velocity window can report depths
//! offset by whole multiples of a fixed interval. When the survey/reference
//! difference sits within a relative tolerance of `k * interval`, the offset is
//! removed. Coincidental differences outside the band are left alone.

use crate::config::WrapConfig;
use crate::models::MatchedPoint;
use tracing::{debug, info};

/// Wrap-corrected track
#[derive(Debug, Clone, PartialEq)]
pub struct WrapCorrection {
    /// Every input point, in input order, with corrected survey values
    pub points: Vec<MatchedPoint>,
    /// Number of points that were shifted
    pub corrections: usize,
}

/// Reference value as used for the wrap difference: nearest integer, ties to even
pub fn wrap_reference(value: f64) -> f64 {
    value.round_ties_even()
}

/// Corrected survey value if the discrepancy is explained by a wrap.
///
/// Returns `None` when the difference is zero, rounds to zero wraps, or falls
/// outside the tolerance band around the nearest multiple.
pub fn unwrap_depth(survey: f64, reference: f64, wrap: WrapConfig) -> Option<f64> {
    let difference = survey - reference;
    if difference == 0.0 || !difference.is_finite() {
        return None;
    }

    let multiplier = (difference.abs() / wrap.interval).round_ties_even();
    let shift = multiplier * wrap.interval;
    let inner = shift * (1.0 - wrap.tolerance);
    let outer = shift * (1.0 + wrap.tolerance);

    if difference > 0.0 {
        (inner <= difference && difference <= outer).then(|| survey - shift)
    } else {
        (-outer <= difference && difference <= -inner).then(|| survey + shift)
    }
}

/// Apply wrap correction to every matched point
pub fn correct_wraps(points: &[MatchedPoint], wrap: WrapConfig) -> WrapCorrection {
    let mut corrections = 0;

    let corrected: Vec<MatchedPoint> = points
        .iter()
        .map(|point| match unwrap_depth(point.survey, point.reference, wrap) {
            Some(survey) => {
                debug!(
                    "Wrap corrected at ({}, {}): {} -> {} (reference {})",
                    point.longitude, point.latitude, point.survey, survey, point.reference
                );
                corrections += 1;
                MatchedPoint { survey, ..*point }
            }
            None => *point,
        })
        .collect();

    info!(
        "Wrap correction: {} of {} points shifted by multiples of {}",
        corrections,
        points.len(),
        wrap.interval
    );

    WrapCorrection {
        points: corrected,
        corrections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap() -> WrapConfig {
        WrapConfig::default()
    }

    #[test]
    fn test_two_wraps_removed_exactly() {
        let reference = -2345.0;
        let survey = reference + 2.0 * 750.0;
        assert_eq!(unwrap_depth(survey, reference, wrap()), Some(reference));
    }

    #[test]
    fn test_negative_difference_added_back() {
        // difference -1530 -> k = 2, band [-1575, -1425]
        assert_eq!(unwrap_depth(-3530.0, -2000.0, wrap()), Some(-2030.0));
    }

    #[test]
    fn test_difference_outside_band_unchanged() {
        // difference -500 -> k = 1, band [-787.5, -712.5]
        assert_eq!(unwrap_depth(100.0, 600.0, wrap()), None);
        assert_eq!(unwrap_depth(-1300.0, -2000.0, wrap()), None);
    }

    #[test]
    fn test_band_edges_are_inclusive() {
        assert_eq!(unwrap_depth(-1287.5, -2000.0, wrap()), Some(-2037.5));
        assert_eq!(unwrap_depth(-1212.5, -2000.0, wrap()), Some(-1962.5));
        assert_eq!(unwrap_depth(-2712.5, -2000.0, wrap()), Some(-1962.5));
    }

    #[test]
    fn test_zero_and_small_differences_unchanged() {
        assert_eq!(unwrap_depth(-100.0, -100.0, wrap()), None);
        assert_eq!(unwrap_depth(-90.0, -100.0, wrap()), None);
        assert_eq!(unwrap_depth(-110.0, -100.0, wrap()), None);
    }

    #[test]
    fn test_correct_wraps_counts_and_keeps_order() {
        let points = vec![
            MatchedPoint::new(0.0, 0.0, -1250.0, -2000.0),
            MatchedPoint::new(1.0, 0.0, -2010.0, -2000.0),
            MatchedPoint::new(2.0, 0.0, -500.0, -2000.0),
        ];

        let result = correct_wraps(&points, wrap());

        assert_eq!(result.corrections, 2);
        assert_eq!(result.points[0].survey, -2000.0);
        assert_eq!(result.points[1].survey, -2010.0);
        assert_eq!(result.points[2].survey, -2000.0);
        assert_eq!(result.points[2].reference, -2000.0);
    }

    #[test]
    fn test_wrap_reference_rounds_half_to_even() {
        assert_eq!(wrap_reference(-1234.5), -1234.0);
        assert_eq!(wrap_reference(-1235.5), -1236.0);
        assert_eq!(wrap_reference(-10.2), -10.0);
    }
}
