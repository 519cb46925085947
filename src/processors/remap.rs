//! Affine channel remapping and derived-velocity recomputation.
//!
//! The potentiometer channels track the encoder positions up to an affine
//! calibration (and a sign flip on the third axis). Fitting that map per
//! axis and rewriting the encoder channels from the pots recovers position
//! readings when the encoders themselves glitch. Velocities derived from
//! the rewritten positions are rebuilt by smoothing, differentiating, and
//! smoothing again.

use thiserror::Error;

use crate::core::series::TimeSeries;

/// Default exponential-smoothing span for velocity recomputation.
pub const DEFAULT_VELOCITY_SMOOTH_SPAN: usize = 25;

const POT_TO_ENCODER: [(&str, &str, f64); 3] = [
    ("POT_3", "ENCODER_POS_1", 1.0),
    ("POT_4", "ENCODER_POS_2", 1.0),
    ("POT_5", "ENCODER_POS_3", -1.0),
];

/// Errors that can occur while remapping.
#[derive(Debug, Error)]
pub enum RemapError {
    #[error("required column '{0}' not found")]
    MissingColumn(String),

    #[error("series has no column labels")]
    Unlabeled,

    #[error("channel index {index} is out of range for a series with {num_channels} channels")]
    ChannelOutOfRange { index: usize, num_channels: usize },
}

/// Result type for remap operations.
pub type Result<T> = std::result::Result<T, RemapError>;

/// Least-squares affine fit `y ~ slope * x + intercept` over finite pairs.
///
/// Degenerate inputs fall back rather than fail: fewer than two finite
/// pairs yields the identity `(1, 0)`, and numerically zero variance in
/// `x` yields a pure offset `(1, mean(y) - mean(x))`.
pub fn fit_affine(x: &[f64], y: &[f64]) -> (f64, f64) {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(&a, &b)| (a, b))
        .collect();

    if pairs.len() < 2 {
        return (1.0, 0.0);
    }

    let n = pairs.len() as f64;
    let x_mean = pairs.iter().map(|&(a, _)| a).sum::<f64>() / n;
    let y_mean = pairs.iter().map(|&(_, b)| b).sum::<f64>() / n;

    let denom: f64 = pairs.iter().map(|&(a, _)| (a - x_mean).powi(2)).sum();
    if denom <= f64::EPSILON {
        return (1.0, y_mean - x_mean);
    }

    let slope: f64 = pairs
        .iter()
        .map(|&(a, b)| (a - x_mean) * (b - y_mean))
        .sum::<f64>()
        / denom;
    (slope, y_mean - slope * x_mean)
}

/// Exponentially weighted mean with `alpha = 2 / (span + 1)`, seeded by the
/// first finite value. Non-finite samples carry the previous mean forward.
pub fn ewm_mean(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut state: Option<f64> = None;

    values
        .iter()
        .map(|&v| {
            if v.is_finite() {
                state = Some(match state {
                    Some(s) => (1.0 - alpha) * s + alpha * v,
                    None => v,
                });
            }
            state.unwrap_or(f64::NAN)
        })
        .collect()
}

/// Central-difference gradient on a non-uniform grid, one-sided at the
/// edges.
fn gradient_nonuniform(ts: &[f64], ys: &[f64]) -> Vec<f64> {
    let n = ys.len();
    let mut out = vec![0.0; n];

    out[0] = (ys[1] - ys[0]) / (ts[1] - ts[0]);
    out[n - 1] = (ys[n - 1] - ys[n - 2]) / (ts[n - 1] - ts[n - 2]);
    for i in 1..n - 1 {
        let hs = ts[i] - ts[i - 1];
        let hd = ts[i + 1] - ts[i];
        out[i] = (hs * hs * ys[i + 1] + (hd * hd - hs * hs) * ys[i] - hd * hd * ys[i - 1])
            / (hs * hd * (hs + hd));
    }
    out
}

/// Central-difference gradient assuming a uniform step.
fn gradient_uniform(step: f64, ys: &[f64]) -> Vec<f64> {
    let n = ys.len();
    let mut out = vec![0.0; n];

    out[0] = (ys[1] - ys[0]) / step;
    out[n - 1] = (ys[n - 1] - ys[n - 2]) / step;
    for i in 1..n - 1 {
        out[i] = (ys[i + 1] - ys[i - 1]) / (2.0 * step);
    }
    out
}

/// Estimate velocity from a position channel: exponential smoothing of
/// position, numerical differentiation, then a second, shorter smoothing
/// pass on the velocity.
///
/// Timestamps with non-positive steps anywhere fall back to a uniform grid
/// at the median positive step (1.0 when no step is positive). Fewer than
/// three samples yields all zeros.
pub fn smoothed_velocity(ts: &[f64], positions: &[f64], smooth_span: usize) -> Vec<f64> {
    if positions.len() < 3 {
        return vec![0.0; positions.len()];
    }

    let span = smooth_span.max(3);
    let pos_smooth = ewm_mean(positions, span);

    let dt: Vec<f64> = ts.windows(2).map(|w| w[1] - w[0]).collect();
    let vel = if dt.iter().all(|&d| d > 0.0) {
        gradient_nonuniform(ts, &pos_smooth)
    } else {
        let mut positive: Vec<f64> = dt.iter().copied().filter(|&d| d > 0.0).collect();
        let step = if positive.is_empty() {
            1.0
        } else {
            positive.sort_by(f64::total_cmp);
            positive[positive.len() / 2]
        };
        gradient_uniform(step, &pos_smooth)
    };

    ewm_mean(&vel, (span / 2).max(3))
}

/// Fit `target ~ sign * source` and overwrite the target channel with the
/// mapped values.
///
/// # Errors
///
/// Fails when either channel index is out of range.
pub fn remap_channel(
    series: &TimeSeries,
    source: usize,
    target: usize,
    sign: f64,
) -> Result<TimeSeries> {
    let num_channels = series.num_channels();
    for index in [source, target] {
        if index >= num_channels {
            return Err(RemapError::ChannelOutOfRange {
                index,
                num_channels,
            });
        }
    }

    let signed: Vec<f64> = series.channels[source].iter().map(|&v| sign * v).collect();
    let (slope, intercept) = fit_affine(&signed, &series.channels[target]);

    let mut out = series.clone();
    out.channels[target] = signed.iter().map(|&v| slope * v + intercept).collect();
    Ok(out)
}

fn find_column(series: &TimeSeries, name: &str) -> Result<usize> {
    let labels = series.labels.as_ref().ok_or(RemapError::Unlabeled)?;
    labels
        .iter()
        .position(|l| l == name)
        .ok_or_else(|| RemapError::MissingColumn(name.to_string()))
}

/// Rewrite `ENCODER_POS_1/2/3` from `POT_3/4/5` (the third pot inverted),
/// keeping the raw encoder channels as appended `ORIGINAL_ENCODER_POS_i`
/// columns.
///
/// With `update_velocity`, `ENCODER_VEL_1/2/3` are recomputed from the
/// rewritten positions via [`smoothed_velocity`] at `vel_smooth_span`.
///
/// # Errors
///
/// Fails when the series is unlabeled or any required column is absent.
pub fn replace_encoder_from_pots(
    series: &TimeSeries,
    update_velocity: bool,
    vel_smooth_span: usize,
) -> Result<TimeSeries> {
    let mappings: Vec<(usize, usize, f64)> = POT_TO_ENCODER
        .iter()
        .map(|&(pot, enc, sign)| {
            Ok((find_column(series, pot)?, find_column(series, enc)?, sign))
        })
        .collect::<Result<_>>()?;

    let vel_columns: Option<Vec<usize>> = if update_velocity {
        Some(
            (1..=3)
                .map(|i| find_column(series, &format!("ENCODER_VEL_{i}")))
                .collect::<Result<_>>()?,
        )
    } else {
        None
    };

    let mut out = series.clone();

    // Preserve the raw encoder readings before overwriting them.
    for (i, &(_, enc, _)) in mappings.iter().enumerate() {
        out.channels.push(series.channels[enc].clone());
        if let Some(labels) = out.labels.as_mut() {
            labels.push(format!("ORIGINAL_ENCODER_POS_{}", i + 1));
        }
    }

    for &(pot, enc, sign) in &mappings {
        let signed: Vec<f64> = out.channels[pot].iter().map(|&v| sign * v).collect();
        let (slope, intercept) = fit_affine(&signed, &out.channels[enc]);
        out.channels[enc] = signed.iter().map(|&v| slope * v + intercept).collect();
    }

    if let Some(vel_columns) = vel_columns {
        for (&vel, &(_, enc, _)) in vel_columns.iter().zip(&mappings) {
            out.channels[vel] =
                smoothed_velocity(&out.timestamps, &out.channels[enc], vel_smooth_span);
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_affine_exact() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [2.0, 4.0, 6.0, 8.0];
        let (slope, intercept) = fit_affine(&x, &y);

        assert!((slope - 2.0).abs() < 1e-12);
        assert!((intercept - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_fit_affine_skips_non_finite_pairs() {
        let x = [0.0, f64::NAN, 1.0, 2.0];
        let y = [1.0, 5.0, 3.0, f64::INFINITY];
        let (slope, intercept) = fit_affine(&x, &y);

        // Only (0,1) and (1,3) survive.
        assert!((slope - 2.0).abs() < 1e-12);
        assert!((intercept - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_fit_affine_degenerate_inputs() {
        assert_eq!(fit_affine(&[1.0], &[2.0]), (1.0, 0.0));
        assert_eq!(fit_affine(&[], &[]), (1.0, 0.0));

        // Zero variance in x: pure offset.
        let (slope, intercept) = fit_affine(&[5.0, 5.0, 5.0], &[7.0, 8.0, 9.0]);
        assert_eq!(slope, 1.0);
        assert!((intercept - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_ewm_mean_recurrence() {
        // span 3 gives alpha 0.5.
        let out = ewm_mean(&[0.0, 2.0, 2.0], 3);
        assert_eq!(out, vec![0.0, 1.0, 1.5]);
    }

    #[test]
    fn test_ewm_mean_carries_through_nan() {
        let out = ewm_mean(&[1.0, f64::NAN, 3.0], 3);
        assert_eq!(out[0], 1.0);
        assert_eq!(out[1], 1.0);
        assert_eq!(out[2], 2.0);
    }

    #[test]
    fn test_ewm_mean_constant_is_fixed_point() {
        let out = ewm_mean(&[4.0; 10], 25);
        assert!(out.iter().all(|&v| (v - 4.0).abs() < 1e-12));
    }

    #[test]
    fn test_gradient_linear_signal() {
        let ts = [0.0, 0.1, 0.3, 0.4];
        let ys: Vec<f64> = ts.iter().map(|&t| 5.0 * t).collect();
        for v in gradient_nonuniform(&ts, &ys) {
            assert!((v - 5.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_smoothed_velocity_short_input_is_zero() {
        assert_eq!(smoothed_velocity(&[0.0, 1.0], &[1.0, 2.0], 25), vec![0.0, 0.0]);
    }

    #[test]
    fn test_smoothed_velocity_constant_position() {
        let ts: Vec<f64> = (0..20).map(|i| i as f64 * 0.01).collect();
        let pos = vec![2.5; 20];
        for v in smoothed_velocity(&ts, &pos, 25) {
            assert!(v.abs() < 1e-12);
        }
    }

    #[test]
    fn test_smoothed_velocity_non_monotonic_fallback() {
        // A repeated timestamp forces the median-step fallback; the result
        // must still be finite.
        let ts = [0.0, 0.1, 0.1, 0.3, 0.4];
        let pos = [0.0, 1.0, 2.0, 3.0, 4.0];
        for v in smoothed_velocity(&ts, &pos, 5) {
            assert!(v.is_finite());
        }
    }

    fn encoder_series() -> TimeSeries {
        let timestamps: Vec<f64> = (0..50).map(|i| i as f64 * 0.01).collect();
        let pot3: Vec<f64> = (0..50).map(|i| i as f64 * 0.1).collect();
        let pot4: Vec<f64> = (0..50).map(|i| 1.0 - i as f64 * 0.05).collect();
        let pot5: Vec<f64> = (0..50).map(|i| i as f64 * 0.2).collect();
        let enc1: Vec<f64> = pot3.iter().map(|&v| 2.0 * v + 1.0).collect();
        let enc2: Vec<f64> = pot4.iter().map(|&v| 0.5 * v - 3.0).collect();
        let enc3: Vec<f64> = pot5.iter().map(|&v| -v * 3.0 + 0.5).collect();
        let vel = vec![9.0; 50];

        TimeSeries::new(
            timestamps,
            vec![
                pot3,
                pot4,
                pot5,
                enc1,
                enc2,
                enc3,
                vel.clone(),
                vel.clone(),
                vel,
            ],
        )
        .unwrap()
        .with_labels(
            [
                "POT_3",
                "POT_4",
                "POT_5",
                "ENCODER_POS_1",
                "ENCODER_POS_2",
                "ENCODER_POS_3",
                "ENCODER_VEL_1",
                "ENCODER_VEL_2",
                "ENCODER_VEL_3",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_replace_encoder_recovers_exact_calibration() {
        let series = encoder_series();
        let out = replace_encoder_from_pots(&series, false, 25).unwrap();

        // The pots already explain the encoders exactly (including the
        // sign flip on axis 3), so the rewrite reproduces them.
        for enc in 3..6 {
            for (a, b) in out.channels[enc].iter().zip(&series.channels[enc]) {
                assert!((a - b).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_replace_encoder_appends_originals() {
        let series = encoder_series();
        let out = replace_encoder_from_pots(&series, false, 25).unwrap();

        assert_eq!(out.num_channels(), series.num_channels() + 3);
        let labels = out.labels.as_ref().unwrap();
        assert_eq!(labels[9], "ORIGINAL_ENCODER_POS_1");
        assert_eq!(labels[11], "ORIGINAL_ENCODER_POS_3");
        assert_eq!(out.channels[9], series.channels[3]);
    }

    #[test]
    fn test_replace_encoder_recomputes_velocity() {
        let series = encoder_series();
        let out = replace_encoder_from_pots(&series, true, 25).unwrap();

        // The sentinel velocity values must be replaced by estimates
        // derived from position.
        assert!(out.channels[6].iter().all(|&v| v != 9.0));
        assert!(out.channels[6].iter().all(|&v| v.is_finite()));
    }

    #[test]
    fn test_replace_encoder_missing_column() {
        let series = TimeSeries::new(vec![0.0, 0.1], vec![vec![1.0, 2.0]])
            .unwrap()
            .with_labels(vec!["POT_3".to_string()])
            .unwrap();

        assert!(matches!(
            replace_encoder_from_pots(&series, false, 25),
            Err(RemapError::MissingColumn(name)) if name == "ENCODER_POS_1"
        ));
    }

    #[test]
    fn test_remap_channel_by_index() {
        let series = TimeSeries::new(
            vec![0.0, 0.1, 0.2, 0.3],
            vec![vec![0.0, 1.0, 2.0, 3.0], vec![2.0, 4.0, 6.0, 8.0]],
        )
        .unwrap();

        let out = remap_channel(&series, 0, 1, 1.0).unwrap();
        for (a, b) in out.channels[1].iter().zip(&series.channels[1]) {
            assert!((a - b).abs() < 1e-12);
        }

        assert!(matches!(
            remap_channel(&series, 0, 5, 1.0),
            Err(RemapError::ChannelOutOfRange { index: 5, .. })
        ));
    }
}
