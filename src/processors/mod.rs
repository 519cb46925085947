//! Signal-conditioning stages.
//!
//! Each stage is a pure batch transform over a fully materialized
//! [`TimeSeries`](crate::core::TimeSeries): it returns a new series (or
//! table) and never mutates its input, so stages compose freely and can be
//! tested in isolation.

pub mod filter;
pub mod join;
pub mod remap;
pub mod resample;
pub mod split;
pub mod trim;
pub mod windows;

pub use filter::{apply_zero_phase, design_fir, FilterDescriptor, FilterError, WindowKind};
pub use join::{join, JoinError, JoinedTable};
pub use remap::{fit_affine, replace_encoder_from_pots, smoothed_velocity, RemapError};
pub use resample::{
    decimate, interpolate_to_rate, DecimationPolicy, RateConversionSpec, ResampleError,
};
pub use split::{split_ordered, SplitError};
pub use trim::{trim, TrimError};
