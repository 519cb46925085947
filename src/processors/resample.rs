//! Rate conversion: decimation and uniform-rate interpolation.
//!
//! Decimation reduces an integer rate ratio with one of three policies;
//! interpolation rebuilds a series on an exactly uniform clock from
//! possibly jittery timestamps.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::core::series::{SeriesError, TimeSeries};

/// Errors that can occur during rate conversion.
#[derive(Debug, Error)]
pub enum ResampleError {
    #[error("cannot convert {original} Hz to {target} Hz: ratio below 1")]
    InvalidRate { original: f64, target: f64 },

    #[error("target rate {0} Hz is not positive")]
    NonPositiveRate(f64),

    #[error("unknown decimation policy: {0}")]
    UnsupportedPolicy(String),

    #[error("series of {len} rows is too short for a window of {window} rows")]
    InsufficientLength { len: usize, window: usize },

    #[error(transparent)]
    Series(#[from] SeriesError),
}

/// Result type for resampling operations.
pub type Result<T> = std::result::Result<T, ResampleError>;

/// How rows are combined when reducing the sample rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecimationPolicy {
    /// Keep every k-th row, drop the rest.
    Stride,
    /// Centered moving average of span k, then keep every k-th row.
    MovingAverage,
    /// Mean of each consecutive block of k rows.
    GroupedMean,
}

impl FromStr for DecimationPolicy {
    type Err = ResampleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "stride" => Ok(Self::Stride),
            "moving_average" => Ok(Self::MovingAverage),
            "grouped_mean" => Ok(Self::GroupedMean),
            other => Err(ResampleError::UnsupportedPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for DecimationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stride => write!(f, "stride"),
            Self::MovingAverage => write!(f, "moving_average"),
            Self::GroupedMean => write!(f, "grouped_mean"),
        }
    }
}

/// A decimation request: source and target rates plus the policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateConversionSpec {
    pub original_rate: f64,
    pub target_rate: f64,
    pub policy: DecimationPolicy,
}

impl RateConversionSpec {
    /// Integer decimation factor, `floor(original / target)`.
    ///
    /// # Errors
    ///
    /// Fails when the ratio rounds below 1 (upsampling belongs to
    /// [`interpolate_to_rate`]).
    pub fn window_size(&self) -> Result<usize> {
        let ratio = self.original_rate / self.target_rate;
        if !ratio.is_finite() || ratio < 1.0 {
            return Err(ResampleError::InvalidRate {
                original: self.original_rate,
                target: self.target_rate,
            });
        }
        Ok(ratio as usize)
    }
}

/// Reduce the sample rate by an integer factor.
///
/// The timestamp column is treated like any other channel: under
/// `MovingAverage` and `GroupedMean` the output timestamps are averages of
/// the source timestamps, which keeps them aligned with the averaged data.
///
/// # Errors
///
/// Fails when the rate ratio is below 1 or the series is shorter than one
/// window.
pub fn decimate(series: &TimeSeries, spec: &RateConversionSpec) -> Result<TimeSeries> {
    let k = spec.window_size()?;
    if series.len() < k {
        return Err(ResampleError::InsufficientLength {
            len: series.len(),
            window: k,
        });
    }

    match spec.policy {
        DecimationPolicy::Stride => Ok(stride(series, k)),
        DecimationPolicy::MovingAverage => {
            let averaged = moving_average(series, k);
            Ok(stride(&averaged, k))
        }
        DecimationPolicy::GroupedMean => Ok(grouped_mean(series, k)),
    }
}

fn stride(series: &TimeSeries, k: usize) -> TimeSeries {
    let pick = |v: &[f64]| -> Vec<f64> { v.iter().step_by(k).copied().collect() };

    TimeSeries {
        timestamps: pick(&series.timestamps),
        channels: series.channels.iter().map(|c| pick(c)).collect(),
        labels: series.labels.clone(),
    }
}

/// Centered span-`k` moving average; boundary rows without a full window
/// are dropped, leaving `len - k + 1` rows.
fn moving_average(series: &TimeSeries, k: usize) -> TimeSeries {
    let len = series.len();
    let back = (k - 1) / 2;
    let fwd = k / 2;

    let smooth = |v: &[f64]| -> Vec<f64> {
        (back..len - fwd)
            .map(|i| v[i - back..=i + fwd].iter().sum::<f64>() / k as f64)
            .collect()
    };

    TimeSeries {
        timestamps: smooth(&series.timestamps),
        channels: series.channels.par_iter().map(|c| smooth(c)).collect(),
        labels: series.labels.clone(),
    }
}

/// Mean of consecutive blocks of `k` rows; a partial trailing block is
/// dropped.
fn grouped_mean(series: &TimeSeries, k: usize) -> TimeSeries {
    let mean_blocks = |v: &[f64]| -> Vec<f64> {
        v.chunks_exact(k)
            .map(|block| block.iter().sum::<f64>() / k as f64)
            .collect()
    };

    TimeSeries {
        timestamps: mean_blocks(&series.timestamps),
        channels: series.channels.par_iter().map(|c| mean_blocks(c)).collect(),
        labels: series.labels.clone(),
    }
}

/// Resample onto an exactly uniform clock by linear interpolation.
///
/// Timestamps are shifted so the series starts at zero, then a grid of
/// `floor(duration * rate) + 1` evenly spaced instants covering
/// `[0, duration]` is laid down and every channel is linearly interpolated
/// onto it. The grid never extends past the last source timestamp, so no
/// extrapolation happens in practice, but the channel interpolator extends
/// the end segments linearly rather than clamping.
///
/// # Errors
///
/// Fails when the rate is not positive, the series has fewer than two
/// rows, or the source timestamps are not strictly increasing.
pub fn interpolate_to_rate(series: &TimeSeries, rate: f64) -> Result<TimeSeries> {
    if !(rate > 0.0) || !rate.is_finite() {
        return Err(ResampleError::NonPositiveRate(rate));
    }
    if series.len() < 2 {
        return Err(ResampleError::InsufficientLength {
            len: series.len(),
            window: 2,
        });
    }
    series.ensure_strictly_increasing()?;

    let t0 = series.timestamps[0];
    let shifted: Vec<f64> = series.timestamps.iter().map(|&t| t - t0).collect();
    let duration = shifted[shifted.len() - 1];

    let n = (duration * rate) as usize + 1;
    let grid: Vec<f64> = if n == 1 {
        vec![0.0]
    } else {
        let step = duration / (n - 1) as f64;
        (0..n).map(|i| i as f64 * step).collect()
    };

    let channels: Vec<Vec<f64>> = series
        .channels
        .par_iter()
        .map(|channel| interp_channel(&shifted, channel, &grid))
        .collect();

    Ok(TimeSeries {
        timestamps: grid,
        channels,
        labels: series.labels.clone(),
    })
}

/// Piecewise-linear interpolation of `(xs, ys)` at the points `grid`.
///
/// Points outside `[xs[0], xs[last]]` follow the end segments linearly.
fn interp_channel(xs: &[f64], ys: &[f64], grid: &[f64]) -> Vec<f64> {
    let last = xs.len() - 1;

    grid.iter()
        .map(|&x| {
            // partition_point gives the first node strictly above x.
            let hi = xs.partition_point(|&t| t <= x).clamp(1, last);
            let lo = hi - 1;
            let frac = (x - xs[lo]) / (xs[hi] - xs[lo]);
            ys[lo] + frac * (ys[hi] - ys[lo])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series_of(timestamps: Vec<f64>, data: Vec<f64>) -> TimeSeries {
        TimeSeries::new(timestamps, vec![data]).unwrap()
    }

    fn spec(original: f64, target: f64, policy: DecimationPolicy) -> RateConversionSpec {
        RateConversionSpec {
            original_rate: original,
            target_rate: target,
            policy,
        }
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            "stride".parse::<DecimationPolicy>().unwrap(),
            DecimationPolicy::Stride
        );
        assert_eq!(
            "moving-average".parse::<DecimationPolicy>().unwrap(),
            DecimationPolicy::MovingAverage
        );
        assert!("median".parse::<DecimationPolicy>().is_err());
    }

    #[test]
    fn test_window_size() {
        assert_eq!(spec(1000.0, 100.0, DecimationPolicy::Stride).window_size().unwrap(), 10);
        // Non-integer ratios truncate.
        assert_eq!(spec(1000.0, 300.0, DecimationPolicy::Stride).window_size().unwrap(), 3);
        assert!(spec(100.0, 300.0, DecimationPolicy::Stride).window_size().is_err());
    }

    #[test]
    fn test_decimate_stride() {
        let series = series_of(
            vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5],
            vec![10.0, 11.0, 12.0, 13.0, 14.0, 15.0],
        );
        let out = decimate(&series, &spec(10.0, 5.0, DecimationPolicy::Stride)).unwrap();

        assert_eq!(out.timestamps, vec![0.0, 0.2, 0.4]);
        assert_eq!(out.channels[0], vec![10.0, 12.0, 14.0]);
    }

    #[test]
    fn test_decimate_stride_factor_one_is_identity() {
        let series = series_of(vec![0.0, 0.1, 0.2], vec![1.0, 2.0, 3.0]);
        let out = decimate(&series, &spec(100.0, 100.0, DecimationPolicy::Stride)).unwrap();

        assert_eq!(out.timestamps, series.timestamps);
        assert_eq!(out.channels, series.channels);
    }

    #[test]
    fn test_decimate_grouped_mean() {
        // Odd trailing row is dropped.
        let series = series_of(vec![0.0, 1.0, 2.0, 3.0, 4.0], vec![1.0, 3.0, 5.0, 7.0, 9.0]);
        let out = decimate(&series, &spec(2.0, 1.0, DecimationPolicy::GroupedMean)).unwrap();

        assert_eq!(out.timestamps, vec![0.5, 2.5]);
        assert_eq!(out.channels[0], vec![2.0, 6.0]);
    }

    #[test]
    fn test_decimate_moving_average() {
        let series = series_of(
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
            vec![0.0, 3.0, 6.0, 9.0, 12.0, 15.0],
        );
        let out = decimate(&series, &spec(3.0, 1.0, DecimationPolicy::MovingAverage)).unwrap();

        // Span-3 averaging keeps rows 1..=4 of the source, stride keeps
        // every third of those.
        assert_eq!(out.timestamps, vec![1.0, 4.0]);
        assert_eq!(out.channels[0], vec![3.0, 12.0]);
    }

    #[test]
    fn test_decimate_too_short() {
        let series = series_of(vec![0.0, 1.0], vec![1.0, 2.0]);
        assert!(matches!(
            decimate(&series, &spec(10.0, 1.0, DecimationPolicy::GroupedMean)),
            Err(ResampleError::InsufficientLength { len: 2, window: 10 })
        ));
    }

    #[test]
    fn test_interpolate_reproduces_uniform_nodes() {
        let timestamps: Vec<f64> = (0..11).map(|i| i as f64 * 0.1).collect();
        let data: Vec<f64> = timestamps.iter().map(|&t| 2.0 * t + 1.0).collect();
        let series = series_of(timestamps.clone(), data.clone());

        let out = interpolate_to_rate(&series, 10.0).unwrap();
        assert_eq!(out.len(), 11);
        for i in 0..11 {
            assert!((out.timestamps[i] - timestamps[i]).abs() < 1e-9);
            assert!((out.channels[0][i] - data[i]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_interpolate_jittered_linear_signal() {
        // A linear signal survives interpolation exactly even when the
        // source clock is uneven.
        let timestamps = vec![0.0, 0.09, 0.21, 0.3, 0.42, 0.5];
        let data: Vec<f64> = timestamps.iter().map(|&t| 4.0 * t).collect();
        let series = series_of(timestamps, data);

        let out = interpolate_to_rate(&series, 10.0).unwrap();
        assert_eq!(out.len(), 6);
        for i in 0..out.len() {
            assert!((out.timestamps[i] - i as f64 * 0.1).abs() < 1e-12);
            assert!((out.channels[0][i] - 0.4 * i as f64).abs() < 1e-9);
        }
    }

    #[test]
    fn test_interpolate_shifts_to_zero() {
        let series = series_of(vec![100.0, 100.5, 101.0], vec![1.0, 2.0, 3.0]);
        let out = interpolate_to_rate(&series, 2.0).unwrap();

        assert_eq!(out.timestamps, vec![0.0, 0.5, 1.0]);
        assert_eq!(out.channels[0], vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_interpolate_rejects_non_monotonic() {
        let series = series_of(vec![0.0, 0.2, 0.1], vec![1.0, 2.0, 3.0]);
        assert!(matches!(
            interpolate_to_rate(&series, 10.0),
            Err(ResampleError::Series(SeriesError::NonMonotonicTimestamps { row: 2 }))
        ));
    }

    #[test]
    fn test_interpolate_rejects_bad_inputs() {
        let series = series_of(vec![0.0], vec![1.0]);
        assert!(interpolate_to_rate(&series, 10.0).is_err());

        let series = series_of(vec![0.0, 1.0], vec![1.0, 2.0]);
        assert!(matches!(
            interpolate_to_rate(&series, 0.0),
            Err(ResampleError::NonPositiveRate(_))
        ));
    }
}
