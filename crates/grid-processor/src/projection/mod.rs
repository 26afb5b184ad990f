//! Resampling onto the target grid.
//!
//! This module handles the coordinate transformations and interpolation
//! needed to warp a source raster into the target grid's CRS and geometry.

pub mod interpolation;
pub mod reproject;

pub use interpolation::{bilinear_interpolate, nearest_interpolate};
pub use reproject::{resample, Resampler};
