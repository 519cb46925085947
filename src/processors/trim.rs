//! Edge trimming.
//!
//! Captures routinely carry settling transients at the start and operator
//! wind-down at the end; trimming removes a fixed number of rows from
//! either edge before the numeric stages run.

use thiserror::Error;

use crate::core::series::TimeSeries;

/// Errors that can occur while trimming.
#[derive(Debug, Error)]
pub enum TrimError {
    #[error("cannot trim {requested} rows from a series of {len} rows")]
    InsufficientLength { requested: usize, len: usize },
}

/// Result type for trim operations.
pub type Result<T> = std::result::Result<T, TrimError>;

/// Remove `start_count` rows from the front and `end_count` from the back.
///
/// Covers both legacy trims: end-only (`start_count = 0`, seconds x
/// frequency worth of rows) and symmetric (`start_count == end_count`).
/// The output length is `len - start_count - end_count`.
///
/// # Errors
///
/// Fails when the request would consume the entire series
/// (`start_count + end_count >= len`).
pub fn trim(series: &TimeSeries, start_count: usize, end_count: usize) -> Result<TimeSeries> {
    let len = series.len();
    let requested = start_count + end_count;

    if requested >= len {
        return Err(TrimError::InsufficientLength { requested, len });
    }

    Ok(series.slice_rows(start_count, len - end_count))
}

/// Convert a duration in seconds to a row count at the given sample rate.
///
/// This is how the end-only trim tool expressed its argument: remove the
/// last `seconds x frequency` rows.
pub fn rows_for_duration(seconds: f64, frequency: f64) -> usize {
    (seconds * frequency) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series_of(n: usize) -> TimeSeries {
        let timestamps: Vec<f64> = (0..n).map(|i| i as f64 * 0.01).collect();
        let data: Vec<f64> = (0..n).map(|i| i as f64).collect();
        TimeSeries::new(timestamps, vec![data]).unwrap()
    }

    #[test]
    fn test_trim_both_ends() {
        let series = series_of(10);
        let trimmed = trim(&series, 2, 3).unwrap();

        assert_eq!(trimmed.len(), 5);
        assert_eq!(trimmed.channels[0], vec![2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(trimmed.timestamps[0], series.timestamps[2]);
    }

    #[test]
    fn test_trim_end_only() {
        let series = series_of(10);
        let trimmed = trim(&series, 0, 4).unwrap();

        assert_eq!(trimmed.len(), 6);
        assert_eq!(trimmed.channels[0].last(), Some(&5.0));
    }

    #[test]
    fn test_trim_nothing_is_identity() {
        let series = series_of(5);
        let trimmed = trim(&series, 0, 0).unwrap();

        assert_eq!(trimmed.timestamps, series.timestamps);
        assert_eq!(trimmed.channels, series.channels);
    }

    #[test]
    fn test_trim_exceeding_length_fails() {
        let series = series_of(5);

        assert!(matches!(
            trim(&series, 3, 2),
            Err(TrimError::InsufficientLength { requested: 5, len: 5 })
        ));
        assert!(trim(&series, 6, 0).is_err());
    }

    #[test]
    fn test_rows_for_duration() {
        assert_eq!(rows_for_duration(1.5, 100.0), 150);
        assert_eq!(rows_for_duration(0.0, 100.0), 0);
        // Truncates like the original seconds-to-rows conversion.
        assert_eq!(rows_for_duration(0.999, 10.0), 9);
    }
}
