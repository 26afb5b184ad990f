//! Error types for grid processing.

use grid_common::GridError;
use projection::ProjectionError;
use thiserror::Error;

/// Errors that can occur during grid processing.
#[derive(Error, Debug)]
pub enum GridProcessorError {
    /// Geometry or CRS failure shared with the other stages.
    #[error(transparent)]
    Grid(#[from] GridError),

    /// CRS pair could not be built by the transform provider.
    #[error(transparent)]
    Projection(#[from] ProjectionError),

    /// Buffer length does not match its declared shape.
    #[error("{name}: buffer holds {actual} values, expected {width}x{height}")]
    ShapeMismatch {
        name: String,
        width: usize,
        height: usize,
        actual: usize,
    },

    /// Failed to open or decode a raster file.
    #[error("failed to read raster {path}: {reason}")]
    ReadFailed { path: String, reason: String },

    /// Failed to encode or write a raster file.
    #[error("failed to write raster {path}: {reason}")]
    WriteFailed { path: String, reason: String },

    /// Missing or unusable georeferencing tags.
    #[error("invalid raster metadata in {path}: {reason}")]
    InvalidMetadata { path: String, reason: String },

    /// Storage/IO error.
    #[error("storage error: {0}")]
    StorageError(String),
}

impl GridProcessorError {
    pub fn shape_mismatch(name: impl Into<String>, width: usize, height: usize, actual: usize) -> Self {
        Self::ShapeMismatch {
            name: name.into(),
            width,
            height,
            actual,
        }
    }

    pub fn read_failed(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::ReadFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn write_failed(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::WriteFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_metadata(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidMetadata {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for GridProcessorError {
    fn from(err: std::io::Error) -> Self {
        Self::StorageError(err.to_string())
    }
}

/// Result type for grid processor operations.
pub type Result<T> = std::result::Result<T, GridProcessorError>;
