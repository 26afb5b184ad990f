//! Error types for the preparation stages.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while preparing rasters.
#[derive(Error, Debug)]
pub enum PrepareError {
    #[error("Failed to read {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A stage input that must exist on disk is missing.
    #[error("{stage}: missing input file {}", path.display())]
    MissingInputFile { stage: &'static str, path: PathBuf },

    #[error("Failed to read area of interest {path}: {reason}")]
    Aoi { path: String, reason: String },

    /// One day of the weather stage failed.
    #[error("weather day {date}: {source}")]
    WeatherDay {
        date: String,
        #[source]
        source: Box<PrepareError>,
    },

    #[error(transparent)]
    Grid(#[from] grid_common::GridError),

    #[error(transparent)]
    Projection(#[from] projection::ProjectionError),

    #[error(transparent)]
    Raster(#[from] grid_processor::GridProcessorError),

    #[error(transparent)]
    Derivation(#[from] derivations::DerivationError),

    #[error(transparent)]
    NetCdf(#[from] netcdf_parser::NetCdfError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PrepareError {
    pub fn missing_input(stage: &'static str, path: impl Into<PathBuf>) -> Self {
        Self::MissingInputFile {
            stage,
            path: path.into(),
        }
    }

    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }
}

/// Result type for preparation operations.
pub type Result<T> = std::result::Result<T, PrepareError>;
