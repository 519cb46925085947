//! Ordered validation/test splitting.
//!
//! Splits a preprocessed series into two consecutive segments without
//! shuffling, so each half stays a contiguous recording. The second
//! segment's timestamps are re-zeroed to its own first row so it can feed
//! the same downstream stages as a fresh capture.

use thiserror::Error;

use crate::core::series::TimeSeries;

/// Errors that can occur while splitting.
#[derive(Debug, Error)]
pub enum SplitError {
    #[error("split ratio {0} is outside (0, 1)")]
    InvalidRatio(f64),

    #[error("ratio {ratio} leaves an empty segment for a series of {len} rows")]
    EmptySegment { ratio: f64, len: usize },
}

/// Result type for split operations.
pub type Result<T> = std::result::Result<T, SplitError>;

/// Split into `(validation, test)` at `floor(len * ratio)` rows.
///
/// The validation segment keeps its timestamps; the test segment's
/// timestamps are shifted so its first row reads zero.
///
/// # Errors
///
/// Fails when the ratio is outside `(0, 1)` or either segment would come
/// out empty.
pub fn split_ordered(series: &TimeSeries, ratio: f64) -> Result<(TimeSeries, TimeSeries)> {
    if !(ratio > 0.0 && ratio < 1.0) {
        return Err(SplitError::InvalidRatio(ratio));
    }

    let len = series.len();
    let split_idx = (len as f64 * ratio) as usize;
    if split_idx == 0 || split_idx >= len {
        return Err(SplitError::EmptySegment { ratio, len });
    }

    let val = series.slice_rows(0, split_idx);
    let mut test = series.slice_rows(split_idx, len);

    let t0 = test.timestamps[0];
    for t in &mut test.timestamps {
        *t -= t0;
    }

    Ok((val, test))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series_of(n: usize) -> TimeSeries {
        let timestamps: Vec<f64> = (0..n).map(|i| i as f64 * 0.1).collect();
        let data: Vec<f64> = (0..n).map(|i| i as f64).collect();
        TimeSeries::new(timestamps, vec![data]).unwrap()
    }

    #[test]
    fn test_split_half() {
        let series = series_of(10);
        let (val, test) = split_ordered(&series, 0.5).unwrap();

        assert_eq!(val.len(), 5);
        assert_eq!(test.len(), 5);
        assert_eq!(val.channels[0], vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(test.channels[0], vec![5.0, 6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_split_rezeroes_test_timestamps() {
        let series = series_of(10);
        let (val, test) = split_ordered(&series, 0.7).unwrap();

        assert_eq!(val.timestamps[0], 0.0);
        assert_eq!(test.timestamps[0], 0.0);
        // Spacing of the test half is preserved.
        assert!((test.timestamps[1] - 0.1).abs() < 1e-12);
        assert_eq!(test.len(), 3);
    }

    #[test]
    fn test_split_floor_index() {
        let series = series_of(7);
        let (val, test) = split_ordered(&series, 0.5).unwrap();

        // floor(7 * 0.5) = 3.
        assert_eq!(val.len(), 3);
        assert_eq!(test.len(), 4);
    }

    #[test]
    fn test_split_invalid_ratio() {
        let series = series_of(10);
        assert!(matches!(
            split_ordered(&series, 0.0),
            Err(SplitError::InvalidRatio(_))
        ));
        assert!(matches!(
            split_ordered(&series, 1.0),
            Err(SplitError::InvalidRatio(_))
        ));
    }

    #[test]
    fn test_split_empty_segment() {
        let series = series_of(2);
        assert!(matches!(
            split_ordered(&series, 0.1),
            Err(SplitError::EmptySegment { .. })
        ));
    }
}
