//! Single-track task runs

use super::{create_track, test_config};
use crate::config::PipelineConfig;
use crate::processor::report::TrackReport;
use crate::processor::{TrackContext, TrackOutcome, TrackTask};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn processed(outcome: TrackOutcome) -> (crate::models::TrackStats, Vec<std::path::PathBuf>) {
    match outcome {
        TrackOutcome::Processed { stats, outputs } => (stats, outputs),
        TrackOutcome::Skipped { reason } => panic!("Expected processed track, skipped: {reason}"),
    }
}

#[test]
fn test_outliers_drops_invalid_and_unmatched() {
    let temp_dir = TempDir::new().unwrap();
    let dir = create_track(
        temp_dir.path(),
        "EW9903",
        &[
            ("topo.xyz", "0 0 -500\n"),
            ("bathy.xyz", "0 0 -500\n1 1 nan\n2 2 0\n3 3 100\n"),
        ],
    );

    let ctx = TrackContext::new(dir.clone(), test_config()).unwrap();
    let (stats, outputs) = processed(ctx.run(TrackTask::Outliers).unwrap());

    assert_eq!(fs::read_to_string(dir.join("newbathy.xyz")).unwrap(), "0.0 0.0 -500.0\n");
    assert_eq!(fs::read_to_string(dir.join("deletebathy.xyz")).unwrap(), "");
    assert_eq!(fs::read_to_string(dir.join("outliers.xyz")).unwrap(), "");
    assert_eq!(stats.survey_points, 4);
    assert_eq!(stats.invalid_dropped, 2);
    assert_eq!(stats.unmatched_dropped, 1);
    assert_eq!(stats.cleaned, 1);
    assert_eq!(outputs.len(), 4);
}

#[test]
fn test_outliers_confirmed_by_crossover() {
    let temp_dir = TempDir::new().unwrap();
    let dir = create_track(
        temp_dir.path(),
        "KN159L05",
        &[
            ("topo.xyz", "0 0 -500\n5 5 -110\n"),
            ("bathy.xyz", "0 0 -2000\n5 5 -100\n"),
            ("crossover.txt", "0 0 1200\n40 40 5000\n"),
        ],
    );

    let ctx = TrackContext::new(dir.clone(), test_config()).unwrap();
    let (stats, _) = processed(ctx.run(TrackTask::Outliers).unwrap());

    assert_eq!(fs::read_to_string(dir.join("newbathy.xyz")).unwrap(), "5.0 5.0 -100.0\n");
    assert_eq!(
        fs::read_to_string(dir.join("deletebathy.xyz")).unwrap(),
        "0.0 0.0 -2000.0 -500.0\n"
    );
    assert_eq!(
        fs::read_to_string(dir.join("outliers.xyz")).unwrap(),
        "0.0 0.0 -2000.0 -500.0\n"
    );
    assert_eq!(stats.rejected_discrepancy, 1);
    assert_eq!(stats.confirmed_outliers, 1);
    assert_eq!(stats.crossover_records, 2);

    let report: TrackReport =
        serde_json::from_str(&fs::read_to_string(dir.join("qc_report.json")).unwrap()).unwrap();
    assert_eq!(report.track, "KN159L05");
    assert_eq!(report.task, TrackTask::Outliers);
    assert_eq!(report.stats, stats);
    assert_eq!(report.outputs.len(), 3);
}

#[test]
fn test_scale_rescales_track() {
    let temp_dir = TempDir::new().unwrap();
    let dir = create_track(
        temp_dir.path(),
        "scaled",
        &[
            ("topo.xyz", "0 0 -1000\n1 0 -2000\n2 0 -3000\n"),
            ("bathy.xyz", "0 0 -1200\n1 0 -2400\n2 0 -3600\n"),
        ],
    );

    let ctx = TrackContext::new(dir.clone(), test_config()).unwrap();
    let (stats, _) = processed(ctx.run(TrackTask::Scale).unwrap());

    assert_eq!(
        fs::read_to_string(dir.join("modify_bathy.xyz")).unwrap(),
        "0.0 0.0 -1000.0\n1.0 0.0 -2000.0\n2.0 0.0 -3000.0\n"
    );
    let fit = stats.regression.unwrap();
    assert!((fit.slope - 1.2).abs() < 1e-9);
    assert_eq!(fit.samples, 3);
}

#[test]
fn test_scale_degenerate_is_skipped_without_output() {
    let temp_dir = TempDir::new().unwrap();
    let dir = create_track(
        temp_dir.path(),
        "flat",
        &[("topo.xyz", "0 0 -1000\n"), ("bathy.xyz", "0 0 -1200\n")],
    );

    let ctx = TrackContext::new(dir.clone(), test_config()).unwrap();
    let outcome = ctx.run(TrackTask::Scale).unwrap();

    assert!(matches!(outcome, TrackOutcome::Skipped { .. }));
    assert!(!dir.join("modify_bathy.xyz").exists());
    assert!(!dir.join("qc_report.json").exists());
}

#[test]
fn test_wrap_corrects_and_refilters() {
    let temp_dir = TempDir::new().unwrap();
    let dir = create_track(
        temp_dir.path(),
        "wrapped",
        &[
            ("topo.xyz", "0 0 -1000\n1 1 -1010\n"),
            ("bathy.xyz", "0 0 -2500\n1 1 -1000\n"),
        ],
    );

    let ctx = TrackContext::new(dir.clone(), test_config()).unwrap();
    let (stats, _) = processed(ctx.run(TrackTask::Wrap).unwrap());

    assert_eq!(
        fs::read_to_string(dir.join("newbathy.xyz")).unwrap(),
        "0.0 0.0 -1000.0\n1.0 1.0 -1000.0\n"
    );
    assert_eq!(fs::read_to_string(dir.join("deletebathy.xyz")).unwrap(), "");
    assert_eq!(stats.wrap_corrections, 1);
}

#[test]
fn test_prefilter_copies_valid_lines() {
    let temp_dir = TempDir::new().unwrap();
    let dir = create_track(
        temp_dir.path(),
        "raw",
        &[("bathy.xyz", "0 0 -500\n1 1 nan\n2 2 0\n")],
    );

    let ctx = TrackContext::new(dir.clone(), test_config()).unwrap();
    let (stats, _) = processed(ctx.run(TrackTask::Prefilter).unwrap());

    assert_eq!(fs::read_to_string(dir.join("filtered.xyz")).unwrap(), "0 0 -500\n");
    assert_eq!(stats.invalid_dropped, 2);
    assert!(!dir.join("qc_report.json").exists());
}

#[test]
fn test_import_crossovers_combines_tables() {
    let temp_dir = TempDir::new().unwrap();
    let header = "# header\n# header\n# header\n# header\n";
    let dir = create_track(
        temp_dir.path(),
        "pairs",
        &[
            ("bathy.xyz", "0 0 -500\n"),
            ("a_crossover.txt", &format!("{header}10.5 -20.25 1 2 -1234.5 9\n")),
            ("b_crossover.txt", &format!("{header}> segment\n1 2 3 4 55.5 6\n")),
        ],
    );

    let ctx = TrackContext::new(dir.clone(), test_config()).unwrap();
    let (stats, _) = processed(ctx.run(TrackTask::ImportCrossovers).unwrap());

    assert_eq!(
        fs::read_to_string(dir.join("crossover.txt")).unwrap(),
        "10.50000 -20.25000 1234.5\n1.00000 2.00000 55.5\n"
    );
    assert_eq!(stats.crossover_records, 2);
}

#[test]
fn test_report_can_be_disabled() {
    let temp_dir = TempDir::new().unwrap();
    let dir = create_track(
        temp_dir.path(),
        "quiet",
        &[("topo.xyz", "0 0 -500\n"), ("bathy.xyz", "0 0 -510\n")],
    );

    let config = Arc::new(PipelineConfig::default().without_report());
    let ctx = TrackContext::new(dir.clone(), config).unwrap();
    let (_, outputs) = processed(ctx.run(TrackTask::Outliers).unwrap());

    assert_eq!(outputs.len(), 3);
    assert!(!dir.join("qc_report.json").exists());
}
