//! Configuration types for the telemetry pipeline.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::processors::filter::WindowKind;
use crate::processors::resample::DecimationPolicy;

/// Configuration for FIR filter design and application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Window family shaping the low-pass taps
    #[serde(default = "default_window")]
    pub window: WindowKind,

    /// Filter order (taps = order + 1)
    #[serde(default = "default_filter_order")]
    pub order: usize,

    /// Cutoff frequency in Hz
    #[serde(default = "default_cutoff_hz")]
    pub cutoff_hz: f64,

    /// Sample rate of the input series in Hz
    #[serde(default = "default_sample_rate_hz")]
    pub sample_rate_hz: f64,
}

fn default_window() -> WindowKind {
    WindowKind::Kaiser
}

fn default_filter_order() -> usize {
    30
}

fn default_cutoff_hz() -> f64 {
    10.0
}

fn default_sample_rate_hz() -> f64 {
    1000.0
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            order: default_filter_order(),
            cutoff_hz: default_cutoff_hz(),
            sample_rate_hz: default_sample_rate_hz(),
        }
    }
}

/// Configuration for decimation and interpolation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResampleConfig {
    /// Source sample rate in Hz
    #[serde(default = "default_sample_rate_hz")]
    pub original_rate_hz: f64,

    /// Target sample rate in Hz
    #[serde(default = "default_target_rate_hz")]
    pub target_rate_hz: f64,

    /// How rows are combined during decimation
    #[serde(default = "default_policy")]
    pub policy: DecimationPolicy,
}

fn default_target_rate_hz() -> f64 {
    100.0
}

fn default_policy() -> DecimationPolicy {
    DecimationPolicy::GroupedMean
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            original_rate_hz: default_sample_rate_hz(),
            target_rate_hz: default_target_rate_hz(),
            policy: default_policy(),
        }
    }
}

/// Configuration for pot-to-encoder remapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemapConfig {
    /// Recompute ENCODER_VEL_1/2/3 from the remapped positions
    #[serde(default = "default_update_velocity")]
    pub update_velocity: bool,

    /// Exponential-smoothing span for the velocity estimate
    #[serde(default = "default_vel_smooth_span")]
    pub vel_smooth_span: usize,
}

fn default_update_velocity() -> bool {
    true
}

fn default_vel_smooth_span() -> usize {
    crate::processors::remap::DEFAULT_VELOCITY_SMOOTH_SPAN
}

impl Default for RemapConfig {
    fn default() -> Self {
        Self {
            update_velocity: default_update_velocity(),
            vel_smooth_span: default_vel_smooth_span(),
        }
    }
}

/// Configuration for edge trimming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrimConfig {
    /// Rows removed from the front
    #[serde(default)]
    pub start_rows: usize,

    /// Rows removed from the back
    #[serde(default = "default_end_rows")]
    pub end_rows: usize,
}

fn default_end_rows() -> usize {
    500
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            start_rows: 0,
            end_rows: default_end_rows(),
        }
    }
}

/// Main pipeline configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub trim: TrimConfig,

    #[serde(default)]
    pub filter: FilterConfig,

    #[serde(default)]
    pub resample: ResampleConfig,

    #[serde(default)]
    pub remap: RemapConfig,
}

impl PipelineConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
