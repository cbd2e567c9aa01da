//! Per-track JSON run reports

use super::TrackTask;
use crate::models::TrackStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackReport {
    pub track: String,
    pub task: TrackTask,
    pub generated_at: DateTime<Utc>,
    pub stats: TrackStats,
    /// Data files written alongside the report
    pub outputs: Vec<PathBuf>,
}

impl TrackReport {
    pub fn new(
        track: impl Into<String>,
        task: TrackTask,
        stats: TrackStats,
        outputs: Vec<PathBuf>,
    ) -> Self {
        Self {
            track: track.into(),
            task,
            generated_at: Utc::now(),
            stats,
            outputs,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| String::from("{}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RegressionFit;

    #[test]
    fn test_report_json_round_trip() {
        let stats = TrackStats {
            survey_points: 10,
            cleaned: 8,
            regression: Some(RegressionFit {
                slope: 1.02,
                r_value: 0.99,
                samples: 7,
            }),
            ..Default::default()
        };
        let outputs = vec![PathBuf::from("modify_bathy.xyz")];
        let report = TrackReport::new("EW9903", TrackTask::Scale, stats, outputs);

        let json = report.to_json();
        assert!(json.contains("\"task\": \"scale\""));
        let parsed: TrackReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
    }
}
