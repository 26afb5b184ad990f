//! Cropping to a window and masking to a polygon footprint.

use geo::{BoundingRect, Intersects, MultiPolygon, Point};
use grid_common::{BoundingBox, GridError};
use rayon::prelude::*;
use tracing::debug;

use crate::error::Result;
use crate::types::{Pixel, RasterBuffer};

/// Round pixel coordinates that are within float noise of an integer.
fn snap(v: f64, round: fn(f64) -> f64) -> f64 {
    if (v - v.round()).abs() < 1e-6 {
        v.round()
    } else {
        round(v)
    }
}

/// Crop `raster` to the cells intersecting `bbox`.
///
/// The window is snapped outward to whole source cells and clamped to the
/// raster, so the result keeps the source pixel grid.
pub fn crop_to_bounds<T: Pixel>(raster: &RasterBuffer<T>, bbox: &BoundingBox) -> Result<RasterBuffer<T>> {
    let inverse = raster.inverse_transform()?;

    let corners = [
        inverse.apply(bbox.min_x, bbox.min_y),
        inverse.apply(bbox.min_x, bbox.max_y),
        inverse.apply(bbox.max_x, bbox.min_y),
        inverse.apply(bbox.max_x, bbox.max_y),
    ];
    let window = BoundingBox::from_points(corners)
        .filter(BoundingBox::is_valid)
        .ok_or_else(|| GridError::invalid_geometry(raster.name.clone(), "crop bounds are not finite"))?;

    let col_start = snap(window.min_x, f64::floor).max(0.0) as usize;
    let row_start = snap(window.min_y, f64::floor).max(0.0) as usize;
    let col_end = (snap(window.max_x, f64::ceil).max(0.0) as usize).min(raster.width);
    let row_end = (snap(window.max_y, f64::ceil).max(0.0) as usize).min(raster.height);

    if col_start >= col_end || row_start >= row_end {
        return Err(GridError::invalid_geometry(
            raster.name.clone(),
            format!(
                "crop window ({}, {}, {}, {}) does not overlap the raster",
                bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y
            ),
        )
        .into());
    }

    let width = col_end - col_start;
    let height = row_end - row_start;
    let mut data = Vec::with_capacity(width * height);
    for row in row_start..row_end {
        let start = row * raster.width;
        data.extend_from_slice(&raster.data[start + col_start..start + col_end]);
    }

    let mut out = RasterBuffer::new(
        data,
        width,
        height,
        raster.transform.window(col_start, row_start),
        raster.crs,
        raster.nodata,
    )?;
    out.name = raster.name.clone();
    Ok(out)
}

/// Crop `raster` to the footprint's bounding box and set every cell whose
/// center lies outside the footprint to nodata.
///
/// The footprint must be in the raster's CRS.
pub fn clip_to_polygon<T: Pixel>(
    raster: &RasterBuffer<T>,
    footprint: &MultiPolygon<f64>,
) -> Result<RasterBuffer<T>> {
    let rect = footprint
        .bounding_rect()
        .ok_or_else(|| GridError::invalid_geometry(raster.name.clone(), "clip footprint is empty"))?;
    let bbox = BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y);

    let mut out = crop_to_bounds(raster, &bbox)?;
    let transform = out.transform;
    let nodata = out.nodata;
    let width = out.width;

    out.data
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(row, values)| {
            for (col, value) in values.iter_mut().enumerate() {
                let (x, y) = transform.pixel_center(col, row);
                if !footprint.intersects(&Point::new(x, y)) {
                    *value = nodata;
                }
            }
        });

    debug!(
        raster = %out.name,
        width = out.width,
        height = out.height,
        valid = out.valid_count(),
        "Clipped raster to footprint"
    );
    Ok(out)
}
