//! Result writing for processed tracks
//!
//! Serializes cleaned, rejected and confirmed-outlier sets to the plain-text
//! formats, and commits all of a track's files together: every file is staged
//! as a temporary file beside its destination and only renamed into place once
//! all of them were written.

use crate::error::{BathyError, Result};
use crate::models::{ConfirmedOutlier, CrossoverRecord, MatchedPoint, Point, RejectedPoint};
use crate::x2sys::format_crossover;
use std::fmt::Write as _;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempPath};
use tracing::{debug, warn};

/// Shortest representation that reads back to the same value.
///
/// Exponent forms differ from the usual `1e-05`/`1e+16` spelling; depths and
/// coordinates never fall in that range.
pub fn format_value(value: f64) -> String {
    format!("{value:?}")
}

/// `lon lat value` lines
pub fn render_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> String {
    let mut out = String::new();
    for p in points {
        let _ = writeln!(
            out,
            "{} {} {}",
            format_value(p.longitude),
            format_value(p.latitude),
            format_value(p.value)
        );
    }
    out
}

/// `lon lat surveyValue referenceValue` lines
pub fn render_matched<'a>(points: impl IntoIterator<Item = &'a MatchedPoint>) -> String {
    let mut out = String::new();
    for p in points {
        let _ = writeln!(
            out,
            "{} {} {} {}",
            format_value(p.longitude),
            format_value(p.latitude),
            format_value(p.survey),
            format_value(p.reference)
        );
    }
    out
}

/// Cleaned output: survey side of each accepted point
pub fn render_cleaned(points: &[MatchedPoint]) -> String {
    let survey: Vec<Point> = points.iter().map(MatchedPoint::survey_point).collect();
    render_points(&survey)
}

pub fn render_rejected(points: &[RejectedPoint]) -> String {
    render_matched(points.iter().map(|r| &r.point))
}

pub fn render_outliers(points: &[ConfirmedOutlier]) -> String {
    render_matched(points.iter().map(|o| &o.rejected.point))
}

pub fn render_crossovers(records: &[CrossoverRecord]) -> String {
    let mut out = String::new();
    for record in records {
        out.push_str(&format_crossover(record));
        out.push('\n');
    }
    out
}

/// Output files of one track, written all-or-nothing
#[derive(Debug, Default)]
pub struct OutputSet {
    files: Vec<(PathBuf, String)>,
}

impl OutputSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: PathBuf, contents: String) {
        self.files.push((path, contents));
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|(p, _)| p.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Stage every file, then persist them. Refuses to replace existing
    /// files unless `overwrite` is set, before anything is written. If any
    /// file cannot be put in place, the ones already committed are removed
    /// and any files they replaced are restored.
    pub fn commit(self, overwrite: bool) -> Result<Vec<PathBuf>> {
        if !overwrite {
            if let Some((path, _)) = self.files.iter().find(|(p, _)| p.exists()) {
                return Err(BathyError::OutputExists { path: path.clone() });
            }
        }

        let mut staged = Vec::with_capacity(self.files.len());
        for (path, contents) in &self.files {
            staged.push((stage(path, contents)?, path.clone()));
        }

        let mut committed: Vec<Committed> = Vec::with_capacity(staged.len());
        for (temp, path) in staged {
            match place(temp, &path, overwrite) {
                Ok(entry) => {
                    debug!("Wrote {}", path.display());
                    committed.push(entry);
                }
                Err(e) => {
                    rollback(committed);
                    return Err(e);
                }
            }
        }

        // Dropping the backups deletes the replaced contents.
        Ok(committed.into_iter().map(|c| c.path).collect())
    }
}

/// A file put in place, with the previous contents it replaced
struct Committed {
    path: PathBuf,
    backup: Option<TempPath>,
}

fn stage(path: &Path, contents: &str) -> Result<NamedTempFile> {
    let dir = parent_dir(path);
    let mut temp = NamedTempFile::new_in(dir).map_err(|e| BathyError::io(dir, e))?;
    temp.write_all(contents.as_bytes())
        .and_then(|_| temp.flush())
        .map_err(|e| BathyError::io(path, e))?;
    Ok(temp)
}

fn parent_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Move an existing file aside, then rename the staged file into place
fn place(temp: NamedTempFile, path: &Path, overwrite: bool) -> Result<Committed> {
    if !overwrite {
        return match temp.persist_noclobber(path) {
            Ok(_) => Ok(Committed {
                path: path.to_path_buf(),
                backup: None,
            }),
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                Err(BathyError::OutputExists {
                    path: path.to_path_buf(),
                })
            }
            Err(e) => Err(BathyError::io(path, e.error)),
        };
    }

    let backup = if fs::symlink_metadata(path).is_ok() {
        let dir = parent_dir(path);
        let backup = NamedTempFile::new_in(dir)
            .map_err(|e| BathyError::io(dir, e))?
            .into_temp_path();
        fs::rename(path, &backup).map_err(|e| BathyError::io(path, e))?;
        Some(backup)
    } else {
        None
    };

    if let Err(e) = temp.persist(path) {
        if let Some(backup) = &backup {
            restore(backup, path);
        }
        return Err(BathyError::io(path, e.error));
    }

    Ok(Committed {
        path: path.to_path_buf(),
        backup,
    })
}

fn rollback(committed: Vec<Committed>) {
    for entry in committed.into_iter().rev() {
        if let Err(e) = fs::remove_file(&entry.path) {
            warn!("Failed to remove {}: {}", entry.path.display(), e);
        }
        if let Some(backup) = &entry.backup {
            restore(backup, &entry.path);
        }
        debug!("Rolled back {}", entry.path.display());
    }
}

fn restore(backup: &Path, path: &Path) {
    if let Err(e) = fs::rename(backup, path) {
        warn!(
            "Failed to restore {} from {}: {}",
            path.display(),
            backup.display(),
            e
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RejectionReason;
    use tempfile::TempDir;

    #[test]
    fn test_format_value_keeps_decimal_point() {
        assert_eq!(format_value(-500.0), "-500.0");
        assert_eq!(format_value(12.345), "12.345");
        assert_eq!(format_value(0.1 + 0.2), "0.30000000000000004");
    }

    #[test]
    fn test_render_formats() {
        let matched = vec![MatchedPoint::new(1.5, -2.25, -510.0, -500.0)];
        assert_eq!(render_cleaned(&matched), "1.5 -2.25 -510.0\n");
        assert_eq!(render_matched(&matched), "1.5 -2.25 -510.0 -500.0\n");

        let rejected = vec![RejectedPoint {
            point: matched[0],
            reason: RejectionReason::Discrepancy,
        }];
        assert_eq!(render_rejected(&rejected), "1.5 -2.25 -510.0 -500.0\n");
        assert_eq!(render_rejected(&[]), "");
    }

    #[test]
    fn test_commit_writes_all_files() {
        let temp_dir = TempDir::new().unwrap();
        let mut outputs = OutputSet::new();
        outputs.add(temp_dir.path().join("a.xyz"), "1 2 3\n".to_string());
        outputs.add(temp_dir.path().join("b.xyz"), String::new());

        let written = outputs.commit(false).unwrap();

        assert_eq!(written.len(), 2);
        assert_eq!(std::fs::read_to_string(&written[0]).unwrap(), "1 2 3\n");
        assert_eq!(std::fs::read_to_string(&written[1]).unwrap(), "");
        let leftovers = std::fs::read_dir(temp_dir.path()).unwrap().count();
        assert_eq!(leftovers, 2);
    }

    #[test]
    fn test_existing_output_refused_before_writing() {
        let temp_dir = TempDir::new().unwrap();
        let existing = temp_dir.path().join("b.xyz");
        std::fs::write(&existing, "old\n").unwrap();

        let mut outputs = OutputSet::new();
        outputs.add(temp_dir.path().join("a.xyz"), "new\n".to_string());
        outputs.add(existing.clone(), "new\n".to_string());

        let err = outputs.commit(false).unwrap_err();
        assert!(matches!(err, BathyError::OutputExists { path } if path == existing));
        assert!(!temp_dir.path().join("a.xyz").exists());
        assert_eq!(std::fs::read_to_string(&existing).unwrap(), "old\n");
    }

    #[test]
    fn test_overwrite_replaces() {
        let temp_dir = TempDir::new().unwrap();
        let existing = temp_dir.path().join("a.xyz");
        std::fs::write(&existing, "old\n").unwrap();

        let mut outputs = OutputSet::new();
        outputs.add(existing.clone(), "new\n".to_string());
        outputs.commit(true).unwrap();

        assert_eq!(std::fs::read_to_string(&existing).unwrap(), "new\n");
    }

    #[test]
    fn test_failed_commit_restores_previous_files() {
        let temp_dir = TempDir::new().unwrap();
        let replaced = temp_dir.path().join("a.xyz");
        std::fs::write(&replaced, "old\n").unwrap();
        let blocked = temp_dir.path().join("c.xyz");
        std::fs::create_dir(&blocked).unwrap();
        std::fs::write(blocked.join("keep"), "x").unwrap();

        let mut outputs = OutputSet::new();
        outputs.add(replaced.clone(), "new\n".to_string());
        outputs.add(temp_dir.path().join("b.xyz"), "new\n".to_string());
        outputs.add(blocked.clone(), "new\n".to_string());

        let err = outputs.commit(true).unwrap_err();

        assert!(matches!(err, BathyError::Io { path, .. } if path == blocked));
        assert_eq!(std::fs::read_to_string(&replaced).unwrap(), "old\n");
        assert!(!temp_dir.path().join("b.xyz").exists());
        assert!(blocked.join("keep").exists());
        let leftovers = std::fs::read_dir(temp_dir.path()).unwrap().count();
        assert_eq!(leftovers, 2);
    }
}
