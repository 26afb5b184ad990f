//! Error taxonomy shared by the grid-alignment stages.

use thiserror::Error;

/// Result type alias using GridError.
pub type GridResult<T> = Result<T, GridError>;

/// Geometry and spatial-reference failures.
///
/// Every variant names the input it was raised for so the orchestrator can
/// report which file or layer stopped the stage.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("Invalid geometry for {input}: {reason}")]
    InvalidGeometry { input: String, reason: String },

    #[error("CRS undefined for {0}")]
    CrsUndefined(String),

    #[error("Mixed CRS in {input}: expected {expected}, found {found}")]
    MixedCrs {
        input: String,
        expected: String,
        found: String,
    },

    #[error("Degenerate affine transform for {input} (determinant {determinant})")]
    DegenerateTransform { input: String, determinant: f64 },
}

impl GridError {
    pub fn invalid_geometry(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn crs_undefined(input: impl Into<String>) -> Self {
        Self::CrsUndefined(input.into())
    }

    pub fn degenerate(input: impl Into<String>, determinant: f64) -> Self {
        Self::DegenerateTransform {
            input: input.into(),
            determinant,
        }
    }
}
