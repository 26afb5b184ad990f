//! Warp arbitrary source rasters onto a fixed target grid.
//!
//! For every destination cell the center is computed under the target
//! affine, carried into the source CRS through a [`CoordinateTransform`] and
//! mapped to fractional source pixel coordinates with the inverse source
//! affine. Cells whose center cannot be transformed, falls outside the source
//! or lands on nodata become the caller's nodata.
//!
//! # Example
//!
//! ```ignore
//! use grid_processor::{InterpolationMethod, Resampler};
//! use projection::Proj4Provider;
//!
//! let provider = Proj4Provider::new();
//! let resampler = Resampler::new(&grid, &provider);
//! let elevation = resampler.resample(&dem, InterpolationMethod::Bilinear, f32::NAN)?;
//! assert!(elevation.is_on_grid(&grid));
//! ```

use grid_common::GridSpec;
use projection::{Proj4Provider, TransformProvider};
use rayon::prelude::*;
use tracing::debug;

use super::{bilinear_interpolate, nearest_interpolate};
use crate::error::Result;
use crate::types::{InterpolationMethod, Pixel, RasterBuffer};

/// Resamples rasters onto one target grid.
///
/// Holds only shared references, so a single resampler can serve parallel
/// callers.
pub struct Resampler<'a> {
    grid: &'a GridSpec,
    provider: &'a dyn TransformProvider,
}

impl<'a> Resampler<'a> {
    pub fn new(grid: &'a GridSpec, provider: &'a dyn TransformProvider) -> Self {
        Self { grid, provider }
    }

    /// Resample `source` onto the target grid.
    ///
    /// The output always has the grid's shape, transform and CRS, with
    /// element type `T` and the given `nodata`. Integer outputs are rounded;
    /// values not representable in `T` become nodata.
    ///
    /// # Errors
    /// * `CrsUndefined` if the source has no CRS
    /// * `DegenerateTransform` if the source affine is not invertible
    /// * A projection error if no transform exists for the CRS pair
    pub fn resample<S: Pixel, T: Pixel>(
        &self,
        source: &RasterBuffer<S>,
        method: InterpolationMethod,
        nodata: T,
    ) -> Result<RasterBuffer<T>> {
        let source_crs = source.require_crs()?;
        let inverse = source.inverse_transform()?;
        let to_source = self.provider.transformer(self.grid.crs, source_crs)?;
        let grid = self.grid;

        debug!(
            source = %source.name,
            source_crs = %source_crs,
            target_crs = %grid.crs,
            method = %method,
            width = grid.width,
            height = grid.height,
            "Resampling raster"
        );

        let mut data = vec![nodata; grid.len()];
        data.par_chunks_mut(grid.width)
            .enumerate()
            .for_each(|(row, out_row)| {
                for (col, out) in out_row.iter_mut().enumerate() {
                    let (x, y) = grid.cell_center(col, row);
                    let Ok((sx, sy)) = to_source.transform(x, y) else {
                        continue;
                    };
                    let (px, py) = inverse.apply(sx, sy);
                    let value = match method {
                        InterpolationMethod::Nearest => nearest_interpolate(source, px, py),
                        InterpolationMethod::Bilinear => bilinear_interpolate(source, px, py),
                    };
                    if let Some(v) = value.and_then(T::from_f64) {
                        *out = v;
                    }
                }
            });

        let mut out = RasterBuffer::from_grid(grid, data, nodata)?;
        out.name = source.name.clone();
        Ok(out)
    }
}

/// Resample with the default proj4rs-backed transform provider.
pub fn resample<S: Pixel, T: Pixel>(
    source: &RasterBuffer<S>,
    grid: &GridSpec,
    method: InterpolationMethod,
    nodata: T,
) -> Result<RasterBuffer<T>> {
    let provider = Proj4Provider::new();
    Resampler::new(grid, &provider).resample(source, method, nodata)
}
