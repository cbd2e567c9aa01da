//! Adapters for the track-intersection tool's text files.
//!
//! The tool itself runs out-of-band. This module prepares the survey input it
//! expects (dropout lines removed) and folds its raw per-pair crossover tables
//! into the `lon lat mismatch` records the crossover confirmation consumes.

use crate::constants::{X2SYS_HEADER_LINES, X2SYS_MIN_FIELDS};
use crate::error::{BathyError, Result};
use crate::models::CrossoverRecord;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Survey text with dropout lines removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredSurvey {
    pub text: String,
    pub kept: usize,
    pub dropped: usize,
}

/// Keep lines with exactly three fields whose value is not a dropout sentinel.
///
/// Kept lines are copied verbatim, so coordinate formatting survives for the
/// exact-match join further down the line.
pub fn filter_survey_text(text: &str) -> FilteredSurvey {
    let mut filtered = String::with_capacity(text.len());
    let mut kept = 0;
    let mut dropped = 0;

    for line in text.split_inclusive('\n') {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let is_valid = fields.len() == 3 && {
            let value = fields[2].to_ascii_lowercase();
            value != "0" && value != "nan"
        };

        if is_valid {
            filtered.push_str(line);
            kept += 1;
        } else {
            dropped += 1;
        }
    }

    FilteredSurvey {
        text: filtered,
        kept,
        dropped,
    }
}

/// Parse one raw crossover table.
///
/// The first [`X2SYS_HEADER_LINES`] lines are header. Each data row yields its
/// first two columns as the position and the absolute value of the
/// second-to-last column as the mismatch. Comment (`#`) and segment (`>`) lines
/// are skipped wherever they appear.
pub fn parse_raw_crossovers<R: BufRead>(reader: R, path: &Path) -> Result<Vec<CrossoverRecord>> {
    let mut records = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| BathyError::io(path, e))?;
        let line_no = index + 1;
        if line_no <= X2SYS_HEADER_LINES {
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('>') {
            continue;
        }

        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() < X2SYS_MIN_FIELDS {
            return Err(BathyError::malformed(
                path,
                line_no,
                format!(
                    "expected at least {X2SYS_MIN_FIELDS} fields, found {}",
                    fields.len()
                ),
            ));
        }

        let number = |field: &str| {
            field.parse::<f64>().map_err(|_| {
                BathyError::malformed(path, line_no, format!("'{field}' is not a number"))
            })
        };

        let longitude = number(fields[0])?;
        let latitude = number(fields[1])?;
        let mismatch = number(fields[fields.len() - 2])?.abs();
        records.push(CrossoverRecord::new(longitude, latitude, mismatch));
    }

    debug!(
        "Parsed {} crossover rows from {}",
        records.len(),
        path.display()
    );
    Ok(records)
}

pub fn read_raw_crossovers(path: &Path) -> Result<Vec<CrossoverRecord>> {
    let file = File::open(path).map_err(|e| BathyError::io(path, e))?;
    parse_raw_crossovers(BufReader::new(file), path)
}

/// Raw crossover tables in `dir` matching `pattern`, sorted by path
pub fn find_raw_crossover_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let full_pattern = dir.join(pattern).to_string_lossy().into_owned();
    let entries = glob::glob(&full_pattern).map_err(|e| BathyError::Pattern {
        pattern: full_pattern.clone(),
        source: e,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(path) if path.is_file() => Some(path),
            Ok(_) => None,
            Err(e) => {
                debug!("Skipping unreadable glob entry: {}", e);
                None
            }
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Combine every raw table in order into one record list
pub fn combine_raw_crossovers(files: &[PathBuf]) -> Result<Vec<CrossoverRecord>> {
    let mut combined = Vec::new();
    for file in files {
        combined.extend(read_raw_crossovers(file)?);
    }
    Ok(combined)
}

/// Crossover line in the combined file format
pub fn format_crossover(record: &CrossoverRecord) -> String {
    format!(
        "{:.5} {:.5} {:.1}",
        record.longitude, record.latitude, record.mismatch
    )
}
