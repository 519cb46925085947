//! Core data types and I/O operations.

pub mod loaders;
pub mod schema;
pub mod series;
pub mod writers;

pub use loaders::{load_artifact_csv, load_capture_csv, LoaderError};
pub use schema::{ChannelSelection, SchemaError};
pub use series::{SeriesError, TimeSeries};
pub use writers::{write_artifact_csv, write_capture_csv, write_joined_csv, WriteError};
