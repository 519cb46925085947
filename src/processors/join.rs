//! Timestamp-aligned joining of two series.
//!
//! Used to place filtered and unfiltered versions of the same capture side
//! by side. Matching is exact bit equality on the timestamp, which works
//! because both inputs descend from the same source rows and artifacts
//! round-trip through the shortest f64 representation.

use std::collections::HashMap;
use thiserror::Error;

use crate::core::series::TimeSeries;

/// Errors that can occur while joining.
#[derive(Debug, Error)]
pub enum JoinError {
    #[error("channel index {index} is out of range for a series with {num_channels} channels")]
    ChannelOutOfRange { index: usize, num_channels: usize },
}

/// Result type for join operations.
pub type Result<T> = std::result::Result<T, JoinError>;

/// A joined, wide-format table: one timestamp column plus prefixed value
/// columns taken from both inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedTable {
    pub timestamps: Vec<f64>,
    pub labels: Vec<String>,
    pub columns: Vec<Vec<f64>>,
}

impl JoinedTable {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Label for channel `index` of `series`: the series' own label when it
/// has one, `COL_{index+1}` otherwise.
fn channel_label(series: &TimeSeries, index: usize) -> String {
    series
        .labels
        .as_ref()
        .and_then(|labels| labels.get(index).cloned())
        .unwrap_or_else(|| format!("COL_{}", index + 1))
}

fn check_channels(series: &TimeSeries, channels: &[usize]) -> Result<()> {
    for &index in channels {
        if index >= series.num_channels() {
            return Err(JoinError::ChannelOutOfRange {
                index,
                num_channels: series.num_channels(),
            });
        }
    }
    Ok(())
}

/// Inner-join two series on exact timestamp equality.
///
/// Rows of `a` whose timestamp appears (bit-for-bit) in `b` survive,
/// reordered by ascending timestamp; the selected channels of each side
/// are emitted with the respective prefix on their labels. Rows present in
/// only one input are dropped silently.
///
/// # Errors
///
/// Fails when a requested channel index is out of range for its series.
pub fn join(
    a: &TimeSeries,
    b: &TimeSeries,
    channels_a: &[usize],
    channels_b: &[usize],
    prefix_a: &str,
    prefix_b: &str,
) -> Result<JoinedTable> {
    check_channels(a, channels_a)?;
    check_channels(b, channels_b)?;

    // First occurrence wins when b carries duplicate timestamps.
    let mut rows_b: HashMap<u64, usize> = HashMap::with_capacity(b.len());
    for (i, &t) in b.timestamps.iter().enumerate() {
        rows_b.entry(t.to_bits()).or_insert(i);
    }

    let mut matched: Vec<(usize, usize)> = a
        .timestamps
        .iter()
        .enumerate()
        .filter_map(|(i, &t)| rows_b.get(&t.to_bits()).map(|&j| (i, j)))
        .collect();
    matched.sort_by(|&(i, _), &(k, _)| a.timestamps[i].total_cmp(&a.timestamps[k]));

    let timestamps: Vec<f64> = matched.iter().map(|&(i, _)| a.timestamps[i]).collect();

    let mut labels = Vec::with_capacity(channels_a.len() + channels_b.len());
    let mut columns = Vec::with_capacity(channels_a.len() + channels_b.len());

    for &c in channels_a {
        labels.push(format!("{}{}", prefix_a, channel_label(a, c)));
        columns.push(matched.iter().map(|&(i, _)| a.channels[c][i]).collect());
    }
    for &c in channels_b {
        labels.push(format!("{}{}", prefix_b, channel_label(b, c)));
        columns.push(matched.iter().map(|&(_, j)| b.channels[c][j]).collect());
    }

    Ok(JoinedTable {
        timestamps,
        labels,
        columns,
    })
}
