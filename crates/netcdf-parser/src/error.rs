//! Error types for NetCDF parsing operations.

use thiserror::Error;

/// Result type for NetCDF parser operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for NetCDF parsing.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// No dimension or coordinate matched any time-axis name.
    #[error("{input}: no time coordinate found (tried {})", tried.join(", "))]
    MissingTimeCoordinate { input: String, tried: Vec<String> },

    /// Missing required variable, coordinate or dimension
    #[error("{input}: missing {what}")]
    MissingData { input: String, what: String },

    /// Time units that are not `<unit> since <epoch>`
    #[error("{input}: unsupported time units '{units}'")]
    InvalidTimeUnits { input: String, units: String },

    /// Invalid data format
    #[error("{input}: invalid data format: {reason}")]
    InvalidFormat { input: String, reason: String },

    /// The crop window selects no cells.
    #[error("{input}: crop window {window:?} selects no grid cells")]
    EmptyCrop { input: String, window: [f64; 4] },

    #[error(transparent)]
    Raster(#[from] grid_processor::GridProcessorError),
}

impl NetCdfError {
    pub fn missing(input: impl Into<String>, what: impl Into<String>) -> Self {
        Self::MissingData {
            input: input.into(),
            what: what.into(),
        }
    }

    pub fn invalid(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            input: input.into(),
            reason: reason.into(),
        }
    }
}
