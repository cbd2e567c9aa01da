//! Whitespace-delimited point file parsing.
//!
//! Reads `lon lat value` style files into typed records. Every non-blank line
//! must split into exactly the expected number of numeric fields; anything else
//! aborts the file with the offending path and 1-based line number.

use crate::error::{BathyError, Result};
use crate::models::{CrossoverRecord, Point};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// Load survey or reference samples (`lon lat value`)
pub fn load_points(path: &Path) -> Result<Vec<Point>> {
    let rows = read_records::<3>(path)?;
    let points: Vec<Point> = rows
        .into_iter()
        .map(|[lon, lat, value]| Point::new(lon, lat, value))
        .collect();
    debug!("Loaded {} points from {}", points.len(), path.display());
    Ok(points)
}

/// Load crossover records (`lon lat mismatch`)
pub fn load_crossovers(path: &Path) -> Result<Vec<CrossoverRecord>> {
    let rows = read_records::<3>(path)?;
    let records: Vec<CrossoverRecord> = rows
        .into_iter()
        .map(|[lon, lat, mismatch]| CrossoverRecord::new(lon, lat, mismatch))
        .collect();
    debug!(
        "Loaded {} crossover records from {}",
        records.len(),
        path.display()
    );
    Ok(records)
}

/// Open `path` and parse every record, preserving file order
pub fn read_records<const N: usize>(path: &Path) -> Result<Vec<[f64; N]>> {
    let file = File::open(path).map_err(|e| BathyError::io(path, e))?;
    parse_records(BufReader::new(file), path)
}

/// Parse records from any buffered reader; `path` is only used for diagnostics
pub fn parse_records<const N: usize, R: BufRead>(
    reader: R,
    path: &Path,
) -> Result<Vec<[f64; N]>> {
    let mut records = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| BathyError::io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(parse_line::<N>(&line, path, index + 1)?);
    }

    Ok(records)
}

/// Split one line into exactly `N` floats
pub fn parse_line<const N: usize>(line: &str, path: &Path, line_no: usize) -> Result<[f64; N]> {
    let mut values = [0.0; N];
    let mut count = 0;

    for field in line.split_whitespace() {
        if count == N {
            return Err(BathyError::malformed(
                path,
                line_no,
                format!("expected {N} fields, found more"),
            ));
        }
        values[count] = field.parse::<f64>().map_err(|_| {
            BathyError::malformed(path, line_no, format!("'{field}' is not a number"))
        })?;
        count += 1;
    }

    if count != N {
        return Err(BathyError::malformed(
            path,
            line_no,
            format!("expected {N} fields, found {count}"),
        ));
    }

    Ok(values)
}
