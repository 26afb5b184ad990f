//! Target grid definition shared by every output raster.

use serde::{Deserialize, Serialize};

use crate::error::{GridError, GridResult};
use crate::{BoundingBox, Crs, GeoTransform};

/// Absolute tolerance, in pixel-index units, for treating a coordinate as
/// already on a pixel boundary. Independent of coordinate magnitude.
const SNAP_TOLERANCE: f64 = 1e-9;

/// The fixed raster geometry all prepared layers are aligned to.
///
/// `origin_x`/`origin_y` are the top-left corner in CRS units. Pixels are
/// square and north-up:
///
/// ```text
/// x = origin_x + col * pixel_size
/// y = origin_y - row * pixel_size
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_size: f64,
    pub width: usize,
    pub height: usize,
    pub crs: Crs,
    pub nodata: f64,
}

impl GridSpec {
    /// Create a grid, validating pixel size and dimensions.
    pub fn new(
        origin_x: f64,
        origin_y: f64,
        pixel_size: f64,
        width: usize,
        height: usize,
        crs: Crs,
        nodata: f64,
    ) -> GridResult<Self> {
        check_pixel_size(pixel_size)?;
        if !origin_x.is_finite() || !origin_y.is_finite() {
            return Err(GridError::invalid_geometry(
                "grid",
                format!("non-finite origin ({origin_x}, {origin_y})"),
            ));
        }
        if width == 0 || height == 0 {
            return Err(GridError::invalid_geometry(
                "grid",
                format!("empty grid {width}x{height}"),
            ));
        }
        Ok(Self {
            origin_x,
            origin_y,
            pixel_size,
            width,
            height,
            crs,
            nodata,
        })
    }

    /// Build a grid covering `bounds`, snapped outward to multiples of
    /// `pixel_size`.
    ///
    /// The snapped extent is derived from integer pixel indices, so the
    /// width/height are exact and `(max - min)` is a whole number of pixels.
    /// A bounds that is degenerate along one axis still yields one pixel.
    pub fn from_bounds(
        bounds: &BoundingBox,
        pixel_size: f64,
        crs: Crs,
        nodata: f64,
    ) -> GridResult<Self> {
        check_pixel_size(pixel_size)?;
        if !bounds.is_valid() {
            return Err(GridError::invalid_geometry(
                "grid",
                format!(
                    "bounds ({}, {}, {}, {}) are not finite and ordered",
                    bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y
                ),
            ));
        }

        let col_min = snap_floor(bounds.min_x / pixel_size);
        let col_max = snap_ceil(bounds.max_x / pixel_size);
        let row_min = snap_floor(bounds.min_y / pixel_size);
        let row_max = snap_ceil(bounds.max_y / pixel_size);

        let width = (col_max - col_min).max(1);
        let height = (row_max - row_min).max(1);

        Self::new(
            col_min as f64 * pixel_size,
            (row_min + height) as f64 * pixel_size,
            pixel_size,
            width as usize,
            height as usize,
            crs,
            nodata,
        )
    }

    /// The north-up affine for this grid.
    pub fn transform(&self) -> GeoTransform {
        GeoTransform::from_origin(self.origin_x, self.origin_y, self.pixel_size, self.pixel_size)
    }

    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::new(
            self.origin_x,
            self.origin_y - self.height as f64 * self.pixel_size,
            self.origin_x + self.width as f64 * self.pixel_size,
            self.origin_y,
        )
    }

    /// CRS coordinates of the center of `(col, row)`.
    pub fn cell_center(&self, col: usize, row: usize) -> (f64, f64) {
        (
            self.origin_x + (col as f64 + 0.5) * self.pixel_size,
            self.origin_y - (row as f64 + 0.5) * self.pixel_size,
        )
    }

    /// `(height, width)`, row-major order.
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whole-metre label used in output file names, e.g. `30`.
    pub fn pixel_label(&self) -> String {
        if self.pixel_size.fract() == 0.0 {
            format!("{}", self.pixel_size as i64)
        } else {
            format!("{}", self.pixel_size)
        }
    }
}

fn check_pixel_size(pixel_size: f64) -> GridResult<()> {
    if !pixel_size.is_finite() || pixel_size <= 0.0 {
        return Err(GridError::invalid_geometry(
            "grid",
            format!("pixel size must be positive and finite, got {pixel_size}"),
        ));
    }
    Ok(())
}

fn snap_floor(v: f64) -> i64 {
    let r = v.round();
    if (v - r).abs() <= SNAP_TOLERANCE {
        r as i64
    } else {
        v.floor() as i64
    }
}

fn snap_ceil(v: f64) -> i64 {
    let r = v.round();
    if (v - r).abs() <= SNAP_TOLERANCE {
        r as i64
    } else {
        v.ceil() as i64
    }
}
