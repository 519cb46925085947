//! Batch signal conditioning for robotic-manipulator telemetry.
//!
//! This crate provides tools for:
//! - Loading and writing capture and artifact CSV files
//! - Edge trimming, FIR design, and zero-phase filtering
//! - Decimation and uniform-rate interpolation
//! - Timestamp-aligned joining and affine channel remapping
//! - Assembling typed capture records and tabulating Jacobians
//!
//! # Example
//!
//! ```no_run
//! use telemetry_pipeline::core::loaders::load_artifact_csv;
//! use telemetry_pipeline::core::schema::ChannelSelection;
//! use telemetry_pipeline::processors::filter::{apply_zero_phase, design_fir, WindowKind};
//!
//! let series = load_artifact_csv("capture.csv").unwrap();
//! let coeffs = design_fir(WindowKind::Kaiser, 1000.0, 10.0, 30).unwrap();
//! let filtered = apply_zero_phase(&series, &coeffs, &ChannelSelection::torque()).unwrap();
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod ingest;
pub mod kinematics;
pub mod processors;
pub mod visualization;

pub use config::{FilterConfig, PipelineConfig, RemapConfig, ResampleConfig, TrimConfig};
pub use core::series::TimeSeries;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
