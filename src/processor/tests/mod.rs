//! Integration tests for the processor module
//!
//! Builds track folders in temporary directories and runs tasks end to end.

pub mod track_runs;

use crate::config::PipelineConfig;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Create a track folder with the given file contents
pub fn create_track(root: &Path, name: &str, files: &[(&str, &str)]) -> PathBuf {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    for (file, contents) in files {
        fs::write(dir.join(file), contents).unwrap();
    }
    dir
}

pub fn test_config() -> Arc<PipelineConfig> {
    Arc::new(PipelineConfig::default().with_workers(2))
}
