//! Core time series container and validation.
//!
//! A [`TimeSeries`] holds one timestamp column plus any number of equally
//! long data channels. Pipeline stages never mutate a series they were
//! given; every transform returns a fresh one.

use thiserror::Error;

/// Errors raised when a series violates its shape or ordering invariants.
#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("channel {channel} has {actual} samples, expected {expected}")]
    LengthMismatch {
        channel: usize,
        expected: usize,
        actual: usize,
    },

    #[error("expected {expected} data channels, found {actual}")]
    ChannelCountMismatch { expected: usize, actual: usize },

    #[error("labels cover {labels} channels but series has {channels}")]
    LabelCountMismatch { labels: usize, channels: usize },

    #[error("timestamps are not strictly increasing at row {row}")]
    NonMonotonicTimestamps { row: usize },

    #[error("row {row} has {actual} values, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

/// Result type for series operations.
pub type Result<T> = std::result::Result<T, SeriesError>;

/// Time-stamped multi-channel telemetry, stored column-wise.
///
/// `timestamps` are seconds as floating point; `channels[c][i]` is the value
/// of data channel `c` at row `i`. Missing readings are NaN. `labels`, when
/// present, name the data channels (the timestamp column is implicit).
#[derive(Debug, Clone, Default)]
pub struct TimeSeries {
    /// Timestamp column in seconds, non-decreasing.
    pub timestamps: Vec<f64>,
    /// Data channels, each the same length as `timestamps`.
    pub channels: Vec<Vec<f64>>,
    /// Optional channel names for headered sources.
    pub labels: Option<Vec<String>>,
}

impl TimeSeries {
    /// Builds a series from a timestamp column and data channels, validating
    /// that every channel matches the timestamp length.
    pub fn new(timestamps: Vec<f64>, channels: Vec<Vec<f64>>) -> Result<Self> {
        let expected = timestamps.len();
        for (channel, values) in channels.iter().enumerate() {
            if values.len() != expected {
                return Err(SeriesError::LengthMismatch {
                    channel,
                    expected,
                    actual: values.len(),
                });
            }
        }

        Ok(Self {
            timestamps,
            channels,
            labels: None,
        })
    }

    /// Builds a series from rows shaped `[timestamp, c0, c1, ...]`.
    ///
    /// Every row must have the same width as the first; a ragged row fails
    /// the whole conversion.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Ok(Self::default());
        };

        let width = first.len();
        if width == 0 {
            return Err(SeriesError::RaggedRow {
                row: 0,
                expected: 1,
                actual: 0,
            });
        }

        let mut timestamps = Vec::with_capacity(rows.len());
        let mut channels = vec![Vec::with_capacity(rows.len()); width - 1];

        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(SeriesError::RaggedRow {
                    row: row_idx,
                    expected: width,
                    actual: row.len(),
                });
            }
            timestamps.push(row[0]);
            for (channel, &value) in row[1..].iter().enumerate() {
                channels[channel].push(value);
            }
        }

        Ok(Self {
            timestamps,
            channels,
            labels: None,
        })
    }

    /// Attaches channel labels, validating the count.
    pub fn with_labels(mut self, labels: Vec<String>) -> Result<Self> {
        if labels.len() != self.channels.len() {
            return Err(SeriesError::LabelCountMismatch {
                labels: labels.len(),
                channels: self.channels.len(),
            });
        }
        self.labels = Some(labels);
        Ok(self)
    }

    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// True when the series has no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Number of data channels (the timestamp column is not counted).
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Returns row `i` as `[timestamp, c0, c1, ...]`.
    pub fn row(&self, i: usize) -> Vec<f64> {
        let mut row = Vec::with_capacity(1 + self.channels.len());
        row.push(self.timestamps[i]);
        row.extend(self.channels.iter().map(|c| c[i]));
        row
    }

    /// Fails unless the series has exactly `expected` data channels.
    pub fn ensure_channel_count(&self, expected: usize) -> Result<()> {
        if self.channels.len() != expected {
            return Err(SeriesError::ChannelCountMismatch {
                expected,
                actual: self.channels.len(),
            });
        }
        Ok(())
    }

    /// Fails unless timestamps are strictly increasing.
    ///
    /// Interpolation and differentiation require this; callers deduplicate
    /// upstream when a capture contains repeated stamps.
    pub fn ensure_strictly_increasing(&self) -> Result<()> {
        for (row, pair) in self.timestamps.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(SeriesError::NonMonotonicTimestamps { row: row + 1 });
            }
        }
        Ok(())
    }

    /// Copies the rows in `start..end` into a new series, keeping labels.
    pub fn slice_rows(&self, start: usize, end: usize) -> Self {
        Self {
            timestamps: self.timestamps[start..end].to_vec(),
            channels: self
                .channels
                .iter()
                .map(|c| c[start..end].to_vec())
                .collect(),
            labels: self.labels.clone(),
        }
    }
}
