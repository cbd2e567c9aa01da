//! Gross-outlier rejection for survey soundings
//!
//! Removes dropout values, joins survey points to the reference model by exact
//! coordinate and rejects points that are on land or that disagree with the
//! model by more than the fixed gross threshold.

use crate::constants::{GROSS_DISCREPANCY_THRESHOLD, SEA_LEVEL};
use crate::models::{MatchedPoint, Point, RejectedPoint, RejectionReason, TrackStats};
use crate::reference::ReferenceIndex;
use tracing::{debug, info};

/// Result of running the gross filter over one track
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GrossFilterOutput {
    /// Accepted points in survey order
    pub cleaned: Vec<MatchedPoint>,
    /// Rejected points in survey order
    pub rejected: Vec<RejectedPoint>,
    /// NaN or zero survey values removed before the join
    pub invalid_dropped: usize,
    /// Survey points with no reference sample at their coordinate
    pub unmatched_dropped: usize,
}

impl GrossFilterOutput {
    pub fn rejected_by(&self, reason: RejectionReason) -> usize {
        self.rejected.iter().filter(|r| r.reason == reason).count()
    }

    /// Fold the filter counts into track statistics
    pub fn record(&self, stats: &mut TrackStats) {
        stats.invalid_dropped += self.invalid_dropped;
        stats.unmatched_dropped += self.unmatched_dropped;
        stats.cleaned = self.cleaned.len();
        stats.rejected_on_land = self.rejected_by(RejectionReason::OnLand);
        stats.rejected_discrepancy = self.rejected_by(RejectionReason::Discrepancy);
    }
}

/// Decide a single matched point.
///
/// On-land is absolute: it wins regardless of how close the values are.
pub fn classify(point: MatchedPoint) -> Result<MatchedPoint, RejectedPoint> {
    if point.reference > SEA_LEVEL {
        return Err(RejectedPoint {
            point,
            reason: RejectionReason::OnLand,
        });
    }
    if point.discrepancy() > GROSS_DISCREPANCY_THRESHOLD {
        return Err(RejectedPoint {
            point,
            reason: RejectionReason::Discrepancy,
        });
    }
    Ok(point)
}

/// Split already-matched points into accepted and rejected, keeping order
pub fn split_matched(
    points: impl IntoIterator<Item = MatchedPoint>,
) -> (Vec<MatchedPoint>, Vec<RejectedPoint>) {
    let mut cleaned = Vec::new();
    let mut rejected = Vec::new();

    for point in points {
        match classify(point) {
            Ok(accepted) => cleaned.push(accepted),
            Err(rejection) => {
                debug!(
                    "Rejected ({:?}) at ({}, {}): survey {} reference {}",
                    rejection.reason,
                    point.longitude,
                    point.latitude,
                    point.survey,
                    point.reference
                );
                rejected.push(rejection);
            }
        }
    }

    (cleaned, rejected)
}

/// Remove dropout sentinels; returns the valid points and how many were dropped
pub fn drop_invalid(survey: &[Point]) -> (Vec<Point>, usize) {
    let valid: Vec<Point> = survey.iter().filter(|p| !p.is_dropout()).copied().collect();
    let dropped = survey.len() - valid.len();
    (valid, dropped)
}

/// Join survey points to the model; unmatched points are silently excluded
pub fn join(survey: &[Point], index: &ReferenceIndex) -> (Vec<MatchedPoint>, usize) {
    let matched: Vec<MatchedPoint> = survey.iter().filter_map(|p| index.match_point(p)).collect();
    let unmatched = survey.len() - matched.len();
    (matched, unmatched)
}

/// Run the complete gross filter over a survey track
pub fn apply_gross_filter(survey: &[Point], index: &ReferenceIndex) -> GrossFilterOutput {
    let (valid, invalid_dropped) = drop_invalid(survey);
    let (matched, unmatched_dropped) = join(&valid, index);
    let (cleaned, rejected) = split_matched(matched);

    info!(
        "Gross filter: {} survey points -> {} cleaned, {} rejected ({} invalid, {} unmatched)",
        survey.len(),
        cleaned.len(),
        rejected.len(),
        invalid_dropped,
        unmatched_dropped
    );

    GrossFilterOutput {
        cleaned,
        rejected,
        invalid_dropped,
        unmatched_dropped,
    }
}
