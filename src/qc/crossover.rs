//! Crossover confirmation of rejected soundings
//!
//! A rejected point is confirmed as an outlier when at least one crossover
//! record with a mismatch above the crossover threshold lies inside the
//! axis-aligned tolerance box around it. The box test is inclusive.
//!
//! [`CrossoverIndex`] sorts the significant records by longitude so each query
//! only tests a narrow band of candidates. It produces exactly the same
//! confirmations, and the same evidence record, as the linear scan in
//! [`confirm_outliers_linear`].

use crate::config::CrossoverTolerance;
use crate::constants::CROSSOVER_MISMATCH_THRESHOLD;
use crate::models::{ConfirmedOutlier, CrossoverRecord, RejectedPoint};
use tracing::info;

/// Extra longitude margin for the candidate band, absorbing rounding in the box test
const BAND_SLACK_DEG: f64 = 1e-6;

/// True when the record's mismatch is large enough to count as evidence
pub fn is_significant(record: &CrossoverRecord) -> bool {
    record.mismatch.abs() > CROSSOVER_MISMATCH_THRESHOLD
}

/// Inclusive box test, centred on the crossover record
pub fn within_tolerance(
    record: &CrossoverRecord,
    longitude: f64,
    latitude: f64,
    tolerance: CrossoverTolerance,
) -> bool {
    record.longitude - tolerance.longitude <= longitude
        && longitude <= record.longitude + tolerance.longitude
        && record.latitude - tolerance.latitude <= latitude
        && latitude <= record.latitude + tolerance.latitude
}

/// Longitude-sorted index over significant crossover records
#[derive(Debug, Clone)]
pub struct CrossoverIndex {
    /// (position in the source list, record), sorted by longitude
    entries: Vec<(usize, CrossoverRecord)>,
    tolerance: CrossoverTolerance,
}

impl CrossoverIndex {
    pub fn new(records: &[CrossoverRecord], tolerance: CrossoverTolerance) -> Self {
        let mut entries: Vec<(usize, CrossoverRecord)> = records
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, r)| is_significant(r) && !r.longitude.is_nan() && !r.latitude.is_nan())
            .collect();
        entries.sort_by(|a, b| a.1.longitude.total_cmp(&b.1.longitude));

        Self { entries, tolerance }
    }

    /// Number of records large enough to confirm an outlier
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Earliest (in source order) significant record whose box contains the point
    pub fn find(&self, longitude: f64, latitude: f64) -> Option<&CrossoverRecord> {
        let band = self.tolerance.longitude + BAND_SLACK_DEG;
        let start = self
            .entries
            .partition_point(|(_, r)| r.longitude < longitude - band);
        let end = self
            .entries
            .partition_point(|(_, r)| r.longitude <= longitude + band);

        self.entries
            .get(start..end.max(start))?
            .iter()
            .filter(|(_, r)| within_tolerance(r, longitude, latitude, self.tolerance))
            .min_by_key(|(position, _)| *position)
            .map(|(_, r)| r)
    }
}

/// Confirm rejected points against crossover evidence using the sorted index
pub fn confirm_outliers(
    rejected: &[RejectedPoint],
    crossovers: &[CrossoverRecord],
    tolerance: CrossoverTolerance,
) -> Vec<ConfirmedOutlier> {
    let index = CrossoverIndex::new(crossovers, tolerance);

    let confirmed: Vec<ConfirmedOutlier> = rejected
        .iter()
        .filter_map(|r| {
            index
                .find(r.point.longitude, r.point.latitude)
                .map(|evidence| ConfirmedOutlier {
                    rejected: *r,
                    evidence: *evidence,
                })
        })
        .collect();

    info!(
        "Crossover confirmation: {} of {} rejected points confirmed by {} significant crossovers",
        confirmed.len(),
        rejected.len(),
        index.len()
    );

    confirmed
}

/// Reference implementation: scan every crossover for every rejected point
pub fn confirm_outliers_linear(
    rejected: &[RejectedPoint],
    crossovers: &[CrossoverRecord],
    tolerance: CrossoverTolerance,
) -> Vec<ConfirmedOutlier> {
    rejected
        .iter()
        .filter_map(|r| {
            crossovers
                .iter()
                .find(|c| {
                    is_significant(c)
                        && within_tolerance(c, r.point.longitude, r.point.latitude, tolerance)
                })
                .map(|evidence| ConfirmedOutlier {
                    rejected: *r,
                    evidence: *evidence,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MatchedPoint, RejectionReason};

    fn rejected_at(lon: f64, lat: f64) -> RejectedPoint {
        RejectedPoint {
            point: MatchedPoint::new(lon, lat, -2000.0, -500.0),
            reason: RejectionReason::Discrepancy,
        }
    }

    fn tolerance() -> CrossoverTolerance {
        CrossoverTolerance::default()
    }

    #[test]
    fn test_confirmed_by_crossover_at_same_location() {
        let rejected = vec![rejected_at(0.0, 0.0)];
        let crossovers = vec![CrossoverRecord::new(0.0, 0.0, 1200.0)];

        let confirmed = confirm_outliers(&rejected, &crossovers, tolerance());
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].rejected, rejected[0]);
        assert_eq!(confirmed[0].evidence.mismatch, 1200.0);
    }

    #[test]
    fn test_no_crossovers_no_confirmation() {
        let rejected = vec![rejected_at(0.0, 0.0)];
        assert!(confirm_outliers(&rejected, &[], tolerance()).is_empty());
    }

    #[test]
    fn test_mismatch_must_exceed_threshold() {
        let rejected = vec![rejected_at(0.0, 0.0)];
        let crossovers = vec![
            CrossoverRecord::new(0.0, 0.0, 1000.0),
            CrossoverRecord::new(0.0, 0.0, 999.0),
        ];
        assert!(confirm_outliers(&rejected, &crossovers, tolerance()).is_empty());

        let negative = vec![CrossoverRecord::new(0.0, 0.0, -1500.0)];
        assert_eq!(confirm_outliers(&rejected, &negative, tolerance()).len(), 1);
    }

    #[test]
    fn test_box_is_inclusive_and_axis_aligned() {
        let tol = CrossoverTolerance::new(0.5, 0.25);
        let rejected = vec![rejected_at(10.0, 20.0)];

        let corner = vec![CrossoverRecord::new(10.5, 20.25, 2000.0)];
        assert_eq!(confirm_outliers(&rejected, &corner, tol).len(), 1);

        let outside_lat = vec![CrossoverRecord::new(10.0, 20.5, 2000.0)];
        assert!(confirm_outliers(&rejected, &outside_lat, tol).is_empty());

        let outside_lon = vec![CrossoverRecord::new(10.75, 20.0, 2000.0)];
        assert!(confirm_outliers(&rejected, &outside_lon, tol).is_empty());
    }

    #[test]
    fn test_multiple_matches_recorded_once_with_first_evidence() {
        let rejected = vec![rejected_at(0.0, 0.0)];
        let crossovers = vec![
            CrossoverRecord::new(0.01, 0.0, 1500.0),
            CrossoverRecord::new(-0.01, 0.0, 1800.0),
            CrossoverRecord::new(0.0, 0.0, 2500.0),
        ];

        let confirmed = confirm_outliers(&rejected, &crossovers, tolerance());
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].evidence.mismatch, 1500.0);
    }

    #[test]
    fn test_adding_records_is_monotonic() {
        let rejected: Vec<RejectedPoint> =
            (0..20).map(|i| rejected_at(i as f64 * 0.05, 0.0)).collect();
        let mut crossovers = vec![CrossoverRecord::new(0.1, 0.0, 1500.0)];
        let before = confirm_outliers(&rejected, &crossovers, tolerance());

        crossovers.push(CrossoverRecord::new(0.5, 0.01, 1300.0));
        crossovers.push(CrossoverRecord::new(50.0, 50.0, 5000.0));
        let after = confirm_outliers(&rejected, &crossovers, tolerance());

        for outlier in &before {
            assert!(after.iter().any(|o| o.rejected == outlier.rejected));
        }
        assert!(after.len() > before.len());
    }

    #[test]
    fn test_index_matches_linear_scan() {
        let tol = tolerance();
        let mut rejected = Vec::new();
        for i in 0..40 {
            for j in 0..10 {
                rejected.push(rejected_at(i as f64 * 0.01 - 0.2, j as f64 * 0.013));
            }
        }
        let mut crossovers = Vec::new();
        for k in 0..60 {
            let lon = (k as f64 * 0.0071) - 0.21;
            let lat = (k % 7) as f64 * 0.0167;
            let mismatch = if k % 3 == 0 { 900.0 } else { 1000.0 + k as f64 };
            crossovers.push(CrossoverRecord::new(lon, lat, mismatch));
        }
        crossovers.push(CrossoverRecord::new(f64::NAN, 0.0, 5000.0));

        let indexed = confirm_outliers(&rejected, &crossovers, tol);
        let linear = confirm_outliers_linear(&rejected, &crossovers, tol);
        assert!(!indexed.is_empty());
        assert_eq!(indexed, linear);
    }
}
