use grid_common::Crs;
use thiserror::Error;

pub type ProjectionResult<T> = Result<T, ProjectionError>;

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("{0} is not in the CRS definition database")]
    UnknownCrs(Crs),

    #[error("Invalid projection definition for {crs}: {reason}")]
    InvalidDefinition { crs: Crs, reason: String },

    #[error("Transform from {from} to {to} failed at ({x}, {y}): {reason}")]
    TransformFailed {
        from: Crs,
        to: Crs,
        x: f64,
        y: f64,
        reason: String,
    },

    #[error("No finite points when transforming bounds from {from} to {to}")]
    EmptyBounds { from: Crs, to: Crs },
}
