//! Assembly of typed capture records into per-stream series.
//!
//! The upstream log-container reader is an external collaborator that
//! yields a time-ordered stream of typed records (joint states, wrench
//! samples, jaw states, Jacobian snapshots). This module turns one such
//! stream into a [`CaptureSet`]: timestamps normalized to the first joint
//! sample, one series per stream, ready to write as headerless artifacts.

use thiserror::Error;

use crate::core::schema::{self, NUM_JOINTS};
use crate::core::series::TimeSeries;

/// Errors that can occur while assembling a capture.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("{stream} record {index} carries {got} values, expected {expected}")]
    InconsistentChannels {
        stream: &'static str,
        index: usize,
        expected: usize,
        got: usize,
    },
}

/// Result type for ingest operations.
pub type Result<T> = std::result::Result<T, IngestError>;

/// One typed message extracted from a capture log. Timestamps are in
/// seconds.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// Manipulator joint state: position, velocity, and effort per joint.
    Joints {
        timestamp: f64,
        position: Vec<f64>,
        velocity: Vec<f64>,
        effort: Vec<f64>,
    },
    /// Force/torque sensor sample.
    Wrench {
        timestamp: f64,
        force: [f64; 3],
        torque: [f64; 3],
    },
    /// Gripper jaw state.
    Jaw {
        timestamp: f64,
        position: f64,
        velocity: f64,
        effort: f64,
    },
    /// Row-major 6x6 spatial Jacobian snapshot.
    Jacobian { timestamp: f64, values: Vec<f64> },
}

/// The per-stream series assembled from one capture.
///
/// Only the joint stream is guaranteed; sensor, jaw, and Jacobian streams
/// are absent when the capture carried no such messages.
#[derive(Debug, Clone)]
pub struct CaptureSet {
    pub joints: TimeSeries,
    pub jacobian: Option<TimeSeries>,
    pub sensor: Option<TimeSeries>,
    pub jaw: Option<TimeSeries>,
}

struct StreamBuf {
    timestamps: Vec<f64>,
    channels: Vec<Vec<f64>>,
}

impl StreamBuf {
    fn new(num_channels: usize) -> Self {
        Self {
            timestamps: Vec::new(),
            channels: vec![Vec::new(); num_channels],
        }
    }

    fn push(&mut self, timestamp: f64, values: impl Iterator<Item = f64>) {
        self.timestamps.push(timestamp);
        for (channel, v) in self.channels.iter_mut().zip(values) {
            channel.push(v);
        }
    }

    fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    fn into_series(mut self, start_time: f64, labels: Option<Vec<String>>) -> TimeSeries {
        for t in &mut self.timestamps {
            *t -= start_time;
        }
        TimeSeries {
            timestamps: self.timestamps,
            channels: self.channels,
            labels,
        }
    }
}

fn check_len(stream: &'static str, index: usize, expected: usize, got: usize) -> Result<()> {
    if got != expected {
        return Err(IngestError::InconsistentChannels {
            stream,
            index,
            expected,
            got,
        });
    }
    Ok(())
}

/// Assemble a record stream into per-stream series.
///
/// All timestamps are shifted by the first joint timestamp (zero when the
/// capture has no joint records). When a jaw stream is present, the jaw
/// and joint series are truncated to their common length so they stay
/// row-aligned downstream.
///
/// # Errors
///
/// Fails when a joint record does not carry exactly six values per field
/// or a Jacobian record does not carry exactly 36.
pub fn assemble(records: impl IntoIterator<Item = Record>) -> Result<CaptureSet> {
    let mut joints = StreamBuf::new(schema::CANONICAL_CHANNELS);
    let mut jacobian = StreamBuf::new(NUM_JOINTS * NUM_JOINTS);
    let mut sensor = StreamBuf::new(6);
    let mut jaw = StreamBuf::new(3);

    for record in records {
        match record {
            Record::Joints {
                timestamp,
                position,
                velocity,
                effort,
            } => {
                let index = joints.timestamps.len();
                check_len("joints", index, NUM_JOINTS, position.len())?;
                check_len("joints", index, NUM_JOINTS, velocity.len())?;
                check_len("joints", index, NUM_JOINTS, effort.len())?;
                joints.push(
                    timestamp,
                    position
                        .into_iter()
                        .chain(velocity)
                        .chain(effort),
                );
            }
            Record::Jacobian { timestamp, values } => {
                let index = jacobian.timestamps.len();
                check_len("jacobian", index, NUM_JOINTS * NUM_JOINTS, values.len())?;
                jacobian.push(timestamp, values.into_iter());
            }
            Record::Wrench {
                timestamp,
                force,
                torque,
            } => {
                sensor.push(timestamp, force.into_iter().chain(torque));
            }
            Record::Jaw {
                timestamp,
                position,
                velocity,
                effort,
            } => {
                jaw.push(timestamp, [position, velocity, effort].into_iter());
            }
        }
    }

    let start_time = joints.timestamps.first().copied().unwrap_or(0.0);

    let mut joints = joints.into_series(start_time, Some(schema::joints_capture_columns()));
    let jacobian = (!jacobian.is_empty()).then(|| jacobian.into_series(start_time, None));
    let sensor = (!sensor.is_empty())
        .then(|| sensor.into_series(start_time, Some(schema::sensor_capture_columns())));
    let jaw = (!jaw.is_empty()).then(|| {
        jaw.into_series(
            start_time,
            Some(
                ["JAW_POSITION", "JAW_VELOCITY", "JAW_EFFORT"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            ),
        )
    });

    // Keep jaw and joints row-aligned.
    let jaw = jaw.map(|jaw_series| {
        let min_len = jaw_series.len().min(joints.len());
        joints = joints.slice_rows(0, min_len);
        jaw_series.slice_rows(0, min_len)
    });

    Ok(CaptureSet {
        joints,
        jacobian,
        sensor,
        jaw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joint_record(timestamp: f64, value: f64) -> Record {
        Record::Joints {
            timestamp,
            position: vec![value; 6],
            velocity: vec![value + 10.0; 6],
            effort: vec![value + 20.0; 6],
        }
    }

    #[test]
    fn test_assemble_normalizes_to_first_joint_timestamp() {
        let records = vec![
            Record::Wrench {
                timestamp: 99.5,
                force: [1.0, 2.0, 3.0],
                torque: [4.0, 5.0, 6.0],
            },
            joint_record(100.0, 0.0),
            joint_record(100.1, 1.0),
            Record::Jacobian {
                timestamp: 100.05,
                values: vec![0.5; 36],
            },
        ];

        let set = assemble(records).unwrap();

        assert_eq!(set.joints.timestamps[0], 0.0);
        assert!((set.joints.timestamps[1] - 0.1).abs() < 1e-9);
        // The other streams shift by the same offset, even when they
        // start before the first joint sample.
        assert!((set.sensor.as_ref().unwrap().timestamps[0] + 0.5).abs() < 1e-9);
        assert!((set.jacobian.as_ref().unwrap().timestamps[0] - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_assemble_joint_layout() {
        let set = assemble(vec![joint_record(0.0, 1.0)]).unwrap();

        assert_eq!(set.joints.num_channels(), 18);
        assert_eq!(set.joints.channels[0][0], 1.0);
        assert_eq!(set.joints.channels[6][0], 11.0);
        assert_eq!(set.joints.channels[12][0], 21.0);
        assert_eq!(
            set.joints.labels.as_ref().unwrap()[0],
            "POSITION_FEEDBACK_1"
        );
        assert!(set.sensor.is_none());
        assert!(set.jaw.is_none());
    }

    #[test]
    fn test_assemble_truncates_joints_to_jaw_length() {
        let records = vec![
            joint_record(0.0, 0.0),
            joint_record(0.1, 1.0),
            joint_record(0.2, 2.0),
            Record::Jaw {
                timestamp: 0.0,
                position: 0.5,
                velocity: 0.0,
                effort: 0.0,
            },
            Record::Jaw {
                timestamp: 0.1,
                position: 0.6,
                velocity: 0.0,
                effort: 0.0,
            },
        ];

        let set = assemble(records).unwrap();
        assert_eq!(set.joints.len(), 2);
        assert_eq!(set.jaw.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn test_assemble_rejects_short_joint_record() {
        let records = vec![Record::Joints {
            timestamp: 0.0,
            position: vec![0.0; 5],
            velocity: vec![0.0; 6],
            effort: vec![0.0; 6],
        }];

        assert!(matches!(
            assemble(records),
            Err(IngestError::InconsistentChannels {
                stream: "joints",
                expected: 6,
                got: 5,
                ..
            })
        ));
    }

    #[test]
    fn test_assemble_rejects_wrong_jacobian_width() {
        let records = vec![Record::Jacobian {
            timestamp: 0.0,
            values: vec![0.0; 30],
        }];

        assert!(matches!(
            assemble(records),
            Err(IngestError::InconsistentChannels {
                stream: "jacobian",
                expected: 36,
                got: 30,
                ..
            })
        ));
    }
}
