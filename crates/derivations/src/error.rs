//! Error types for derivations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DerivationError {
    /// Two inputs that must share a grid have different sizes.
    #[error("{name}: expected {expected} values, got {actual}")]
    ShapeMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// Cell size must be positive and finite.
    #[error("invalid cell size {0}")]
    InvalidCellSize(f64),

    /// A time index points past the end of the stacked array.
    #[error("{name}: time index {index} out of range for {steps} steps")]
    TimeIndexOutOfRange {
        name: String,
        index: usize,
        steps: usize,
    },

    #[error(transparent)]
    Raster(#[from] grid_processor::GridProcessorError),
}

impl DerivationError {
    pub fn shape_mismatch(name: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch {
            name: name.into(),
            expected,
            actual,
        }
    }
}

pub type Result<T> = std::result::Result<T, DerivationError>;
