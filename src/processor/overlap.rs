//! Bounding-box overlap between survey tracks
//!
//! Used to decide which track pairs the intersection tool should be run on.
//! Longitudes are shifted into [0, 360) before boxing so tracks near the
//! antimeridian compare consistently.

use crate::models::Point;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Box around the points' coordinates; `None` when there are no finite points
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let mut coords = points
            .iter()
            .filter(|p| p.longitude.is_finite() && p.latitude.is_finite())
            .map(|p| (normalize_longitude(p.longitude), p.latitude));

        let (lon, lat) = coords.next()?;
        let mut bbox = Self {
            min_lon: lon,
            max_lon: lon,
            min_lat: lat,
            max_lat: lat,
        };
        for (lon, lat) in coords {
            bbox.min_lon = bbox.min_lon.min(lon);
            bbox.max_lon = bbox.max_lon.max(lon);
            bbox.min_lat = bbox.min_lat.min(lat);
            bbox.max_lat = bbox.max_lat.max(lat);
        }
        Some(bbox)
    }

    /// Inclusive on both axes
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.max_lon >= other.min_lon
            && other.max_lon >= self.min_lon
            && self.max_lat >= other.min_lat
            && other.max_lat >= self.min_lat
    }
}

/// Negative longitudes shifted by +360
pub fn normalize_longitude(longitude: f64) -> f64 {
    if longitude < 0.0 {
        longitude + 360.0
    } else {
        longitude
    }
}

/// An ordered pair of tracks whose boxes overlap
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackPair {
    pub track: String,
    pub other: String,
}

/// Every ordered pair of distinct tracks with overlapping boxes
pub fn find_overlaps(tracks: &[(String, BoundingBox)]) -> Vec<TrackPair> {
    let mut pairs = Vec::new();
    for (i, (name, bbox)) in tracks.iter().enumerate() {
        for (j, (other_name, other_bbox)) in tracks.iter().enumerate() {
            if i != j && bbox.overlaps(other_bbox) {
                pairs.push(TrackPair {
                    track: name.clone(),
                    other: other_name.clone(),
                });
            }
        }
    }
    pairs
}
