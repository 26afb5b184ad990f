//! Merge overlapping or adjacent rasters into one.

use grid_common::{BoundingBox, GeoTransform, GridError};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::Result;
use crate::types::{Pixel, RasterBuffer};

/// Merge `sources` into a single raster covering their union.
///
/// The output uses the finest pixel size among the inputs and the first
/// input's nodata. Each output cell takes its value from the first input, in
/// slice order, whose cell at that location is valid.
///
/// Returns `Ok(None)` for an empty slice.
///
/// # Errors
/// * `CrsUndefined` if any input has no CRS
/// * `MixedCrs` if the inputs disagree on CRS
/// * `DegenerateTransform` if an input affine is not invertible
pub fn mosaic<T: Pixel>(sources: &[RasterBuffer<T>]) -> Result<Option<RasterBuffer<T>>> {
    let Some(first) = sources.first() else {
        return Ok(None);
    };

    let crs = first.require_crs()?;
    for source in &sources[1..] {
        let other = source.require_crs()?;
        if other != crs {
            return Err(GridError::MixedCrs {
                input: source.name.clone(),
                expected: crs.to_string(),
                found: other.to_string(),
            }
            .into());
        }
    }

    let inverses = sources
        .iter()
        .map(|s| s.inverse_transform())
        .collect::<Result<Vec<_>>>()?;

    let mut union: Option<BoundingBox> = None;
    let mut res_x = f64::INFINITY;
    let mut res_y = f64::INFINITY;
    for source in sources {
        let bounds = source.bounds();
        union = Some(match union {
            Some(u) => u.union(&bounds),
            None => bounds,
        });
        let (px, py) = source.transform.pixel_size();
        res_x = res_x.min(px);
        res_y = res_y.min(py);
    }
    let union = union.unwrap_or(first.bounds());

    let width = cell_count(union.width(), res_x);
    let height = cell_count(union.height(), res_y);
    let transform = GeoTransform::from_origin(union.min_x, union.max_y, res_x, res_y);
    let nodata = first.nodata;

    let mut data = vec![nodata; width * height];
    data.par_chunks_mut(width).enumerate().for_each(|(row, out_row)| {
        for (col, out) in out_row.iter_mut().enumerate() {
            let (x, y) = transform.pixel_center(col, row);
            for (source, inverse) in sources.iter().zip(&inverses) {
                let (px, py) = inverse.apply(x, y);
                if px < 0.0 || py < 0.0 {
                    continue;
                }
                if let Some(v) = source.get_valid(px.floor() as usize, py.floor() as usize) {
                    *out = v;
                    break;
                }
            }
        }
    });

    let mut out = RasterBuffer::new(data, width, height, transform, Some(crs), nodata)?;
    out.name = format!("mosaic of {} rasters", sources.len());

    debug!(resolution_x = res_x, resolution_y = res_y, "Mosaic resolution");
    info!(
        inputs = sources.len(),
        width = out.width,
        height = out.height,
        valid = out.valid_count(),
        "Mosaicked rasters"
    );
    Ok(Some(out))
}

/// Whole cells needed to span `extent`, ignoring float noise at exact
/// multiples.
fn cell_count(extent: f64, res: f64) -> usize {
    let n = extent / res;
    let rounded = n.round();
    let cells = if (n - rounded).abs() < 1e-6 { rounded } else { n.ceil() };
    (cells as usize).max(1)
}
