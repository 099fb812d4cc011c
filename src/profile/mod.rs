//! Argo float file extraction
//!
//! Reads profile, trajectory and metadata records out of float files.
//! Readings that are NaN or equal to the `-999` marker are dropped, and a
//! parameter is kept for a profile only if at least one reading survives.

mod container;
mod extractor;
mod netcdf;
mod types;

pub use container::{ArrayContainer, MemoryContainer};
pub use extractor::{ProfileExtractor, is_supported_file_name};
pub use netcdf::{NetcdfContainer, validate};
pub use types::{
    Extraction, FloatMetadata, MISSING_VALUE, Measurement, Measurements, ProfileRecord,
    SUPPORTED_PARAMETERS, TrajectoryRecord, argo_date, format_timestamp, is_valid_reading,
};
