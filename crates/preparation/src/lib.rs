//! Preparation of co-registered fire-input rasters.
//!
//! The pipeline has four stages that share one target grid:
//!
//! 1. **grid** snaps the AOI bounds (reprojected to the target CRS) to a
//!    [`GridSpec`](grid_common::GridSpec) and writes an all-zero template
//!    GeoTIFF
//! 2. **dem** clips the DEM to the AOI, warps it bilinearly onto the grid and
//!    derives Horn slope and aspect
//! 3. **lulc** mosaics land-cover tiles, warps them (nearest) onto the grid
//!    and maps classes to fuel scores
//! 4. **weather** aggregates hourly ERA5 fields to daily values, derives wind
//!    speed/direction, temperature, relative humidity and precipitation and
//!    warps each onto the grid
//!
//! Every file location comes from an explicit [`PrepareConfig`].

pub mod aoi;
pub mod config;
pub mod error;
pub mod preparer;
pub mod stages;

pub use aoi::Aoi;
pub use config::{
    AoiConfig, DemConfig, FailurePolicy, GridConfig, LulcConfig, PrepareConfig, WeatherConfig,
    WeatherVariableNames,
};
pub use error::{PrepareError, Result};
pub use preparer::Preparer;
pub use stages::{Stage, StageReport};
