//! CSV writers for pipeline artifacts.
//!
//! Intermediate artifacts are written without a header row, timestamp
//! first, matching the layout the loaders expect. Labeled series can also
//! be written back out with a header (capture-style), and joined tables
//! carry their prefixed column names.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use thiserror::Error;

use super::series::TimeSeries;
use crate::processors::join::JoinedTable;

/// Errors that can occur during write operations.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Failed to create parent directories.
    #[error("failed to create parent directories for '{path}': {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or open file for writing.
    #[error("failed to create file '{path}': {source}")]
    CreateFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV writing error.
    #[error("CSV write error for '{path}': {source}")]
    CsvError {
        path: String,
        #[source]
        source: csv::Error,
    },

    /// A labeled write was requested on an unlabeled series.
    #[error("series has no column labels; cannot write a headered file")]
    MissingLabels,
}

/// Result type for write operations.
pub type Result<T> = std::result::Result<T, WriteError>;

/// Creates parent directories for a file path if they don't exist.
fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| WriteError::CreateDirectory {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(())
}

fn create_csv_writer(path: &Path) -> Result<csv::Writer<BufWriter<File>>> {
    ensure_parent_dirs(path)?;
    let file = File::create(path).map_err(|e| WriteError::CreateFile {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(csv::Writer::from_writer(BufWriter::new(file)))
}

// Values round-trip through the shortest f64 representation so reloaded
// artifacts bit-match what was written (exact-timestamp joins depend on it).
fn format_value(value: f64) -> String {
    value.to_string()
}

fn write_rows(
    writer: &mut csv::Writer<BufWriter<File>>,
    path: &Path,
    series: &TimeSeries,
) -> Result<()> {
    let path_str = path.display().to_string();
    let mut record = Vec::with_capacity(1 + series.num_channels());

    for i in 0..series.len() {
        record.clear();
        record.push(format_value(series.timestamps[i]));
        record.extend(series.channels.iter().map(|c| format_value(c[i])));

        writer
            .write_record(&record)
            .map_err(|e| WriteError::CsvError {
                path: path_str.clone(),
                source: e,
            })?;
    }

    writer.flush().map_err(|e| WriteError::CreateFile {
        path: path_str,
        source: e,
    })?;

    Ok(())
}

/// Write a series as a headerless artifact CSV, timestamp first.
pub fn write_artifact_csv(path: &Path, series: &TimeSeries) -> Result<()> {
    let mut writer = create_csv_writer(path)?;
    write_rows(&mut writer, path, series)
}

/// Write a labeled series as a headered capture-style CSV.
///
/// The header row is `TIMESTAMP` followed by the channel labels.
pub fn write_capture_csv(path: &Path, series: &TimeSeries) -> Result<()> {
    let labels = series.labels.as_ref().ok_or(WriteError::MissingLabels)?;

    let mut writer = create_csv_writer(path)?;
    let path_str = path.display().to_string();

    let mut header = Vec::with_capacity(1 + labels.len());
    header.push("TIMESTAMP".to_string());
    header.extend(labels.iter().cloned());

    writer
        .write_record(&header)
        .map_err(|e| WriteError::CsvError {
            path: path_str,
            source: e,
        })?;

    write_rows(&mut writer, path, series)
}

/// Write a joined table with its prefixed column names as the header.
pub fn write_joined_csv(path: &Path, table: &JoinedTable) -> Result<()> {
    let mut writer = create_csv_writer(path)?;
    let path_str = path.display().to_string();

    let mut header = Vec::with_capacity(1 + table.labels.len());
    header.push("TIMESTAMP".to_string());
    header.extend(table.labels.iter().cloned());

    writer
        .write_record(&header)
        .map_err(|e| WriteError::CsvError {
            path: path_str.clone(),
            source: e,
        })?;

    let mut record = Vec::with_capacity(1 + table.columns.len());
    for i in 0..table.timestamps.len() {
        record.clear();
        record.push(format_value(table.timestamps[i]));
        record.extend(table.columns.iter().map(|c| format_value(c[i])));

        writer
            .write_record(&record)
            .map_err(|e| WriteError::CsvError {
                path: path_str.clone(),
                source: e,
            })?;
    }

    writer.flush().map_err(|e| WriteError::CreateFile {
        path: path_str,
        source: e,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::loaders::{load_artifact_csv, load_capture_csv};
    use std::fs;
    use tempfile::tempdir;

    fn test_series() -> TimeSeries {
        TimeSeries::new(
            vec![0.0, 0.01, 0.02],
            vec![vec![1.0, 2.0, 3.0], vec![0.5, 0.25, 0.125]],
        )
        .unwrap()
    }

    #[test]
    fn test_write_artifact_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("artifact.csv");
        let series = test_series();

        write_artifact_csv(&path, &series).unwrap();
        let reloaded = load_artifact_csv(&path).unwrap();

        assert_eq!(reloaded.timestamps, series.timestamps);
        assert_eq!(reloaded.channels, series.channels);
    }

    #[test]
    fn test_write_artifact_has_no_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("artifact.csv");

        write_artifact_csv(&path, &test_series()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.lines().next().unwrap().starts_with('0'));
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_write_capture_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("capture.csv");
        let series = test_series()
            .with_labels(vec!["POT_3".to_string(), "ENCODER_POS_1".to_string()])
            .unwrap();

        write_capture_csv(&path, &series).unwrap();
        let reloaded = load_capture_csv(&path).unwrap();

        assert_eq!(reloaded.labels, series.labels);
        assert_eq!(reloaded.channels, series.channels);
    }

    #[test]
    fn test_write_capture_requires_labels() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("capture.csv");

        let result = write_capture_csv(&path, &test_series());
        assert!(matches!(result, Err(WriteError::MissingLabels)));
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deep").join("artifact.csv");

        write_artifact_csv(&path, &test_series()).unwrap();
        assert!(path.exists());
    }
}
