//! CSV loaders for capture and artifact files.
//!
//! Two readers:
//! - headerless intermediate artifacts: column 0 is the timestamp in
//!   seconds, everything after it is data, and
//! - headered capture logs with named columns (`TIMESTAMP`,
//!   `POSITION_FEEDBACK_1`, ...).
//!
//! Unparseable or empty cells become NaN so downstream stages can decide
//! how to treat missing readings.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use thiserror::Error;

use super::series::{SeriesError, TimeSeries};

/// Errors that can occur during file loading.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Empty file: {0}")]
    EmptyFile(PathBuf),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Malformed series: {0}")]
    Shape(#[from] SeriesError),
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

fn parse_cell(cell: &str) -> f64 {
    cell.trim().parse().unwrap_or(f64::NAN)
}

/// Load a headerless artifact CSV into a [`TimeSeries`].
///
/// Column 0 is the timestamp in seconds; the remaining columns become data
/// channels in order. All rows must share the first row's width.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is empty, or has ragged
/// rows.
pub fn load_artifact_csv<P: AsRef<Path>>(path: P) -> Result<TimeSeries> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let mut rows: Vec<Vec<f64>> = Vec::with_capacity(4096);
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(parse_cell).collect());
    }

    if rows.is_empty() {
        return Err(LoaderError::EmptyFile(path.to_path_buf()));
    }

    Ok(TimeSeries::from_rows(&rows)?)
}

/// Load a headered capture CSV into a labeled [`TimeSeries`].
///
/// The `TIMESTAMP` column is extracted as the time axis; every other column
/// becomes a labeled data channel, preserving file order.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is empty, or lacks a
/// `TIMESTAMP` column.
pub fn load_capture_csv<P: AsRef<Path>>(path: P) -> Result<TimeSeries> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let headers = reader.headers()?.clone();
    let ts_idx = headers
        .iter()
        .position(|h| h == "TIMESTAMP")
        .ok_or_else(|| LoaderError::MissingColumn("TIMESTAMP".to_string()))?;

    let labels: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != ts_idx)
        .map(|(_, name)| name.to_string())
        .collect();

    let mut timestamps = Vec::with_capacity(4096);
    let mut channels: Vec<Vec<f64>> = vec![Vec::with_capacity(4096); labels.len()];

    for result in reader.records() {
        let record = result?;

        timestamps.push(record.get(ts_idx).map_or(f64::NAN, parse_cell));

        let mut channel = 0;
        for (i, cell) in record.iter().enumerate() {
            if i == ts_idx {
                continue;
            }
            if channel < channels.len() {
                channels[channel].push(parse_cell(cell));
                channel += 1;
            }
        }
        // Short rows pad with NaN so every channel stays aligned.
        for column in channels[channel..].iter_mut() {
            column.push(f64::NAN);
        }
    }

    if timestamps.is_empty() {
        return Err(LoaderError::EmptyFile(path.to_path_buf()));
    }

    Ok(TimeSeries::new(timestamps, channels)?.with_labels(labels)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_artifact_csv() -> Result<()> {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "0.0,1.0,10.0").unwrap();
        writeln!(file, "0.01,2.0,20.0").unwrap();
        writeln!(file, "0.02,3.0,30.0").unwrap();
        file.flush().unwrap();

        let series = load_artifact_csv(file.path())?;
        assert_eq!(series.len(), 3);
        assert_eq!(series.num_channels(), 2);
        assert_eq!(series.timestamps, vec![0.0, 0.01, 0.02]);
        assert_eq!(series.channels[1], vec![10.0, 20.0, 30.0]);
        assert!(series.labels.is_none());

        Ok(())
    }

    #[test]
    fn test_load_artifact_csv_empty() {
        let file = NamedTempFile::new().unwrap();
        let result = load_artifact_csv(file.path());
        assert!(matches!(result, Err(LoaderError::EmptyFile(_))));
    }

    #[test]
    fn test_load_artifact_csv_blank_cell_is_nan() -> Result<()> {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "0.0,,2.0").unwrap();
        file.flush().unwrap();

        let series = load_artifact_csv(file.path())?;
        assert!(series.channels[0][0].is_nan());
        assert_eq!(series.channels[1][0], 2.0);

        Ok(())
    }

    #[test]
    fn test_load_capture_csv() -> Result<()> {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "TIMESTAMP,POT_3,ENCODER_POS_1").unwrap();
        writeln!(file, "0.0,0.5,1.5").unwrap();
        writeln!(file, "0.1,0.6,1.6").unwrap();
        file.flush().unwrap();

        let series = load_capture_csv(file.path())?;
        assert_eq!(series.len(), 2);
        assert_eq!(
            series.labels,
            Some(vec!["POT_3".to_string(), "ENCODER_POS_1".to_string()])
        );
        assert_eq!(series.timestamps, vec![0.0, 0.1]);
        assert_eq!(series.channels[0], vec![0.5, 0.6]);

        Ok(())
    }

    #[test]
    fn test_load_capture_csv_missing_timestamp() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "POT_3,ENCODER_POS_1").unwrap();
        writeln!(file, "0.5,1.5").unwrap();
        file.flush().unwrap();

        let result = load_capture_csv(file.path());
        assert!(matches!(result, Err(LoaderError::MissingColumn(name)) if name == "TIMESTAMP"));
    }
}
