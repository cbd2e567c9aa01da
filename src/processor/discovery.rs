//! Track discovery for batch runs
//!
//! A batch root holds one folder per survey track:
//! ```text
//! root/
//!   EW9903/
//!     bathy.xyz
//!     topo.xyz
//!     crossover.txt
//!   KN159L05/
//!     bathy.xyz
//!     topo.xyz
//! ```
//! Every immediate sub-directory containing a survey file is a track.

use crate::config::TrackLayout;
use crate::error::{BathyError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Track folders under `root`, sorted by name
pub fn discover_tracks(root: &Path, layout: &TrackLayout) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(BathyError::TrackNotFound {
            path: root.to_path_buf(),
        });
    }

    let mut tracks = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            let source = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
            BathyError::io(path, source)
        })?;

        if !entry.file_type().is_dir() {
            continue;
        }
        if layout.survey_path(entry.path()).is_file() {
            tracks.push(entry.into_path());
        } else {
            debug!(
                "Skipping {}: no {} present",
                entry.path().display(),
                layout.survey
            );
        }
    }

    tracks.sort();
    debug!("Discovered {} tracks in {}", tracks.len(), root.display());
    Ok(tracks)
}

/// Display name of a track folder
pub fn track_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_discovers_only_folders_with_survey() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        for name in ["b_track", "a_track", "empty"] {
            fs::create_dir_all(root.join(name)).unwrap();
        }
        fs::write(root.join("a_track").join("bathy.xyz"), "").unwrap();
        fs::write(root.join("b_track").join("bathy.xyz"), "").unwrap();
        fs::write(root.join("bathy.xyz"), "").unwrap();

        let tracks = discover_tracks(root, &TrackLayout::default()).unwrap();

        let names: Vec<String> = tracks.iter().map(|p| track_name(p)).collect();
        assert_eq!(names, vec!["a_track", "b_track"]);
    }

    #[test]
    fn test_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let err =
            discover_tracks(&temp_dir.path().join("nope"), &TrackLayout::default()).unwrap_err();
        assert!(matches!(err, BathyError::TrackNotFound { .. }));
    }
}
