//! FIR low-pass design and zero-phase application.
//!
//! Design is the windowed-sinc method: an ideal low-pass impulse response
//! shaped by a Kaiser, Dolph-Chebyshev, or Hamming window and scaled for
//! unity gain at DC. Application runs the filter forward and backward over
//! each selected channel so the pass introduces no phase shift; the whole
//! channel must be in memory, which rules out streaming input.

use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::windows;
use crate::core::schema::ChannelSelection;
use crate::core::series::TimeSeries;

/// Kaiser window shape parameter used for torque filtering.
pub const KAISER_BETA: f64 = 3.5;

/// Dolph-Chebyshev stop-band attenuation in dB.
pub const CHEBYSHEV_ATTENUATION_DB: f64 = 40.0;

/// Errors that can occur during filter design or application.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("unknown filter type: {0}")]
    UnsupportedFilterType(String),

    #[error("cutoff {cutoff} Hz is outside (0, {nyquist}) Hz")]
    InvalidCutoff { cutoff: f64, nyquist: f64 },

    #[error("filter order must be at least 1")]
    InvalidOrder,

    #[error("series of {len} rows is too short for reflect padding of {pad} rows")]
    InsufficientLength { len: usize, pad: usize },
}

/// Result type for filter operations.
pub type Result<T> = std::result::Result<T, FilterError>;

/// Window family used to shape the low-pass taps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    Kaiser,
    Chebyshev,
    Hamming,
}

impl FromStr for WindowKind {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "kaiser" => Ok(Self::Kaiser),
            "chebyshev" => Ok(Self::Chebyshev),
            "hamming" => Ok(Self::Hamming),
            other => Err(FilterError::UnsupportedFilterType(other.to_string())),
        }
    }
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kaiser => write!(f, "kaiser"),
            Self::Chebyshev => write!(f, "chebyshev"),
            Self::Hamming => write!(f, "hamming"),
        }
    }
}

/// A complete low-pass design request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FilterDescriptor {
    pub kind: WindowKind,
    /// Filter order; the design yields `order + 1` taps.
    pub order: usize,
    /// Cutoff frequency in Hz.
    pub cutoff_hz: f64,
    /// Sample rate of the series the filter will run on, in Hz.
    pub sample_rate_hz: f64,
}

impl FilterDescriptor {
    /// Designs the coefficient vector for this descriptor.
    pub fn design(&self) -> Result<Vec<f64>> {
        design_fir(self.kind, self.sample_rate_hz, self.cutoff_hz, self.order)
    }
}

/// Design a linear-phase low-pass FIR filter.
///
/// The cutoff is normalized against the Nyquist rate and must land in
/// (0, 1). Returns `order + 1` taps, symmetric about the center and
/// normalized for approximately unity gain at DC.
pub fn design_fir(
    kind: WindowKind,
    sample_rate: f64,
    cutoff: f64,
    order: usize,
) -> Result<Vec<f64>> {
    if order == 0 {
        return Err(FilterError::InvalidOrder);
    }

    let nyquist = sample_rate / 2.0;
    let fc = cutoff / nyquist;
    if !(fc > 0.0 && fc < 1.0) {
        return Err(FilterError::InvalidCutoff { cutoff, nyquist });
    }

    let num_taps = order + 1;
    let alpha = order as f64 / 2.0;

    // Ideal low-pass impulse response sampled at the tap positions.
    let mut taps: Vec<f64> = (0..num_taps)
        .map(|i| {
            let m = i as f64 - alpha;
            if m.abs() < 1e-12 {
                fc
            } else {
                (std::f64::consts::PI * fc * m).sin() / (std::f64::consts::PI * m)
            }
        })
        .collect();

    let window = match kind {
        WindowKind::Kaiser => windows::kaiser(num_taps, KAISER_BETA),
        WindowKind::Chebyshev => windows::chebyshev(num_taps, CHEBYSHEV_ATTENUATION_DB),
        WindowKind::Hamming => windows::hamming(num_taps),
    };

    for (tap, w) in taps.iter_mut().zip(&window) {
        *tap *= w;
    }

    // Unity gain at DC.
    let dc: f64 = taps.iter().sum();
    for tap in &mut taps {
        *tap /= dc;
    }

    Ok(taps)
}

/// Causal FIR pass: `y[n] = sum_k b[k] * x[n-k]`.
fn filter_forward(coeffs: &[f64], x: &[f64]) -> Vec<f64> {
    let mut y = vec![0.0; x.len()];
    for n in 0..x.len() {
        let mut acc = 0.0;
        for (k, &b) in coeffs.iter().enumerate() {
            if k > n {
                break;
            }
            acc += b * x[n - k];
        }
        y[n] = acc;
    }
    y
}

/// Zero-phase filtering of one channel with mirrored edge padding.
fn filtfilt_channel(coeffs: &[f64], x: &[f64], pad: usize) -> Vec<f64> {
    let n = x.len();

    // Mirror extension, edge sample excluded: x[pad], ..., x[1] in front,
    // x[n-2], ..., x[n-1-pad] at the back.
    let mut extended = Vec::with_capacity(n + 2 * pad);
    for i in (1..=pad).rev() {
        extended.push(x[i]);
    }
    extended.extend_from_slice(x);
    for i in 2..=pad + 1 {
        extended.push(x[n - i]);
    }

    let mut y = filter_forward(coeffs, &extended);
    y.reverse();
    let mut y = filter_forward(coeffs, &y);
    y.reverse();

    y[pad..pad + n].to_vec()
}

/// Apply a designed filter without phase distortion.
///
/// Each selected channel is reflect-padded by `3 x order` samples at both
/// ends, filtered forward, reversed, filtered again, and reversed; the
/// padding is then stripped so the output length equals the input length.
/// Timestamps and unselected channels pass through untouched. Channels are
/// independent and processed in parallel.
///
/// # Errors
///
/// Fails when the series is not longer than the padding length.
pub fn apply_zero_phase(
    series: &TimeSeries,
    coeffs: &[f64],
    selection: &ChannelSelection,
) -> Result<TimeSeries> {
    let order = coeffs.len().saturating_sub(1);
    let pad = 3 * order;

    if series.len() <= pad {
        return Err(FilterError::InsufficientLength {
            len: series.len(),
            pad,
        });
    }

    let channels: Vec<Vec<f64>> = series
        .channels
        .par_iter()
        .enumerate()
        .map(|(idx, channel)| {
            if selection.contains(idx) {
                filtfilt_channel(coeffs, channel, pad)
            } else {
                channel.clone()
            }
        })
        .collect();

    Ok(TimeSeries {
        timestamps: series.timestamps.clone(),
        channels,
        labels: series.labels.clone(),
    })
}
