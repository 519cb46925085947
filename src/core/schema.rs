//! Channel naming and schema projections.
//!
//! Two tabular layouts flow through the pipeline:
//! - the headered capture format produced by the logger, with named columns
//!   (`POSITION_FEEDBACK_1..6`, `FORCE_1..3`, `POT_3/4/5`, ...), and
//! - headerless intermediate artifacts whose canonical shape is 19 columns:
//!   timestamp + 6 position + 6 velocity + 6 torque.

use thiserror::Error;

use super::series::TimeSeries;

/// Errors raised when a required named channel is absent.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("missing required column: {0}")]
    MissingColumn(String),

    #[error("series carries no column labels; a headered capture is required")]
    Unlabeled,
}

/// Result type for schema operations.
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Number of joints on the manipulator.
pub const NUM_JOINTS: usize = 6;

/// Data channels in the canonical headerless artifact (timestamp excluded).
pub const CANONICAL_CHANNELS: usize = 3 * NUM_JOINTS;

/// Data-channel indices of the torque block in the canonical layout.
pub const TORQUE_CHANNELS: std::ops::Range<usize> = 12..18;

/// Data-channel indices of the velocity block in the canonical layout.
pub const VELOCITY_CHANNELS: std::ops::Range<usize> = 6..12;

/// Data-channel indices of the position block in the canonical layout.
pub const POSITION_CHANNELS: std::ops::Range<usize> = 0..6;

/// Capture column names that project onto the canonical joints artifact.
pub fn joints_capture_columns() -> Vec<String> {
    let mut columns = Vec::with_capacity(CANONICAL_CHANNELS);
    for prefix in ["POSITION_FEEDBACK", "VELOCITY_FEEDBACK", "TORQUE_FEEDBACK"] {
        for i in 1..=NUM_JOINTS {
            columns.push(format!("{}_{}", prefix, i));
        }
    }
    columns
}

/// Capture column names for the force/torque sensor artifact.
pub fn sensor_capture_columns() -> Vec<String> {
    let mut columns = Vec::with_capacity(6);
    for prefix in ["FORCE", "TORQUE"] {
        for i in 1..=3 {
            columns.push(format!("{}_{}", prefix, i));
        }
    }
    columns
}

/// A subset of data channels a transform is restricted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelSelection {
    /// Every data channel.
    All,
    /// Only the listed data-channel indices.
    Indices(Vec<usize>),
}

impl ChannelSelection {
    /// The torque block of the canonical layout, the default filter target.
    pub fn torque() -> Self {
        Self::Indices(TORQUE_CHANNELS.collect())
    }

    /// True when channel `idx` is selected.
    pub fn contains(&self, idx: usize) -> bool {
        match self {
            Self::All => true,
            Self::Indices(indices) => indices.contains(&idx),
        }
    }
}

/// Finds the data-channel index of a named column.
pub fn channel_index(series: &TimeSeries, name: &str) -> Result<usize> {
    let labels = series.labels.as_ref().ok_or(SchemaError::Unlabeled)?;
    labels
        .iter()
        .position(|l| l == name)
        .ok_or_else(|| SchemaError::MissingColumn(name.to_string()))
}

/// Projects named columns out of a labeled series, in the requested order.
///
/// The timestamp column always comes along; the result keeps the requested
/// names as its labels. Any absent column fails the whole projection.
pub fn project(series: &TimeSeries, columns: &[String]) -> Result<TimeSeries> {
    let mut channels = Vec::with_capacity(columns.len());
    for name in columns {
        let idx = channel_index(series, name)?;
        channels.push(series.channels[idx].clone());
    }

    let mut projected = TimeSeries {
        timestamps: series.timestamps.clone(),
        channels,
        labels: None,
    };
    projected.labels = Some(columns.to_vec());
    Ok(projected)
}
