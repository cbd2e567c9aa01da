//! Exact-coordinate lookup of reference model values.
//!
//! The index joins survey points to model samples by exact `(lon, lat)`
//! equality. There is no tolerance and no nearest-neighbour fallback.

use crate::models::{CoordKey, MatchedPoint, Point};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    values: HashMap<CoordKey, f64>,
    duplicates: usize,
}

impl ReferenceIndex {
    /// Build the index in one pass; a repeated key keeps the last value seen
    pub fn build(points: &[Point]) -> Self {
        let mut values = HashMap::with_capacity(points.len());
        let mut duplicates = 0;

        for point in points {
            let Some(key) = point.key() else {
                continue;
            };
            if values.insert(key, point.value).is_some() {
                duplicates += 1;
            }
        }

        if duplicates > 0 {
            debug!(
                "Reference index: {} duplicate keys overwritten (last value wins)",
                duplicates
            );
        }

        Self { values, duplicates }
    }

    /// Model value at exactly this coordinate.
    ///
    /// A NaN model sample carries no information and is reported as absent.
    pub fn get(&self, longitude: f64, latitude: f64) -> Option<f64> {
        let key = CoordKey::new(longitude, latitude)?;
        self.values.get(&key).copied().filter(|v| !v.is_nan())
    }

    pub fn lookup(&self, point: &Point) -> Option<f64> {
        self.get(point.longitude, point.latitude)
    }

    /// Join a survey point to the model, if the model has its coordinate
    pub fn match_point(&self, point: &Point) -> Option<MatchedPoint> {
        self.lookup(point)
            .map(|reference| MatchedPoint::from_survey(point, reference))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of source rows that overwrote an earlier row with the same key
    pub fn duplicate_keys(&self) -> usize {
        self.duplicates
    }
}
