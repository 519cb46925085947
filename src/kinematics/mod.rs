//! Jacobian tabulation against an injected robot model.
//!
//! The kinematic model itself is an external collaborator; the pipeline
//! only consumes its spatial Jacobian. Passing the model in as a trait
//! object keeps it out of global state and lets tests substitute a stub.

use thiserror::Error;

use crate::core::schema::NUM_JOINTS;
use crate::core::series::TimeSeries;

/// Errors that can occur during Jacobian tabulation.
#[derive(Debug, Error)]
pub enum KinematicsError {
    #[error("series has {got} channels, need at least {need} joint position channels")]
    InsufficientChannels { need: usize, got: usize },
}

/// Result type for kinematics operations.
pub type Result<T> = std::result::Result<T, KinematicsError>;

/// A loaded kinematic model, reduced to the one call the pipeline makes.
pub trait RobotModel {
    /// Spatial Jacobian at the given joint configuration.
    fn spatial_jacobian(&self, joints: &[f64; NUM_JOINTS]) -> [[f64; NUM_JOINTS]; NUM_JOINTS];
}

/// Row-major labels `J11 .. J66` for a flattened Jacobian.
pub fn jacobian_labels() -> Vec<String> {
    (1..=NUM_JOINTS)
        .flat_map(|r| (1..=NUM_JOINTS).map(move |c| format!("J{r}{c}")))
        .collect()
}

/// Evaluate the model's spatial Jacobian at every row of a joint series.
///
/// The first [`NUM_JOINTS`] channels of `joints_series` are taken as the
/// joint position configuration. The output keeps the input timestamps and
/// carries 36 channels, the 6x6 matrix flattened row-major.
///
/// # Errors
///
/// Fails when the series has fewer than [`NUM_JOINTS`] channels.
pub fn jacobian_table(model: &dyn RobotModel, joints_series: &TimeSeries) -> Result<TimeSeries> {
    if joints_series.num_channels() < NUM_JOINTS {
        return Err(KinematicsError::InsufficientChannels {
            need: NUM_JOINTS,
            got: joints_series.num_channels(),
        });
    }

    let mut channels = vec![Vec::with_capacity(joints_series.len()); NUM_JOINTS * NUM_JOINTS];

    for i in 0..joints_series.len() {
        let mut configuration = [0.0; NUM_JOINTS];
        for (j, slot) in configuration.iter_mut().enumerate() {
            *slot = joints_series.channels[j][i];
        }

        let jacobian = model.spatial_jacobian(&configuration);
        for (k, channel) in channels.iter_mut().enumerate() {
            channel.push(jacobian[k / NUM_JOINTS][k % NUM_JOINTS]);
        }
    }

    Ok(TimeSeries {
        timestamps: joints_series.timestamps.clone(),
        channels,
        labels: Some(jacobian_labels()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Model whose Jacobian entry (r, c) is `100*r + 10*c + q1`, making
    /// row/column placement and configuration plumbing visible.
    struct StubModel;

    impl RobotModel for StubModel {
        fn spatial_jacobian(&self, joints: &[f64; NUM_JOINTS]) -> [[f64; NUM_JOINTS]; NUM_JOINTS] {
            let mut out = [[0.0; NUM_JOINTS]; NUM_JOINTS];
            for (r, row) in out.iter_mut().enumerate() {
                for (c, v) in row.iter_mut().enumerate() {
                    *v = 100.0 * r as f64 + 10.0 * c as f64 + joints[0];
                }
            }
            out
        }
    }

    fn joint_series(n: usize) -> TimeSeries {
        let timestamps: Vec<f64> = (0..n).map(|i| i as f64 * 0.1).collect();
        let channels: Vec<Vec<f64>> = (0..NUM_JOINTS)
            .map(|j| (0..n).map(|i| (i + j) as f64).collect())
            .collect();
        TimeSeries::new(timestamps, channels).unwrap()
    }

    #[test]
    fn test_jacobian_table_layout() {
        let series = joint_series(3);
        let table = jacobian_table(&StubModel, &series).unwrap();

        assert_eq!(table.num_channels(), 36);
        assert_eq!(table.len(), 3);
        assert_eq!(table.timestamps, series.timestamps);

        // Row-major: channel 7 is (r=1, c=1); joints[0] at row 2 is 2.0.
        assert_eq!(table.channels[7][2], 100.0 + 10.0 + 2.0);
        assert_eq!(table.channels[0][0], 0.0);
        assert_eq!(table.labels.as_ref().unwrap()[7], "J22");
        assert_eq!(table.labels.as_ref().unwrap()[35], "J66");
    }

    #[test]
    fn test_jacobian_table_requires_six_channels() {
        let series = TimeSeries::new(vec![0.0], vec![vec![1.0]; 3]).unwrap();
        assert!(matches!(
            jacobian_table(&StubModel, &series),
            Err(KinematicsError::InsufficientChannels { need: 6, got: 3 })
        ));
    }
}
