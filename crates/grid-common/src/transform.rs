//! Affine geotransform between pixel and CRS coordinates.

use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

use crate::BoundingBox;

/// Determinants below this are treated as non-invertible.
const DEGENERATE_EPSILON: f64 = 1e-12;

/// Six-coefficient affine transform (rasterio ordering).
///
/// ```text
/// x = a * col + b * row + c
/// y = d * col + e * row + f
/// ```
///
/// `(col, row)` are continuous pixel coordinates: `(0, 0)` is the top-left
/// corner of the first pixel and `(0.5, 0.5)` its center. North-up rasters
/// have `b == d == 0` and a negative `e`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl GeoTransform {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// North-up transform anchored at the top-left corner.
    pub fn from_origin(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self::new(pixel_width, 0.0, origin_x, 0.0, -pixel_height, origin_y)
    }

    fn matrix(&self) -> Matrix3<f64> {
        Matrix3::new(self.a, self.b, self.c, self.d, self.e, self.f, 0.0, 0.0, 1.0)
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.e - self.b * self.d
    }

    /// Map continuous pixel coordinates to CRS coordinates.
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.a * col + self.b * row + self.c,
            self.d * col + self.e * row + self.f,
        )
    }

    /// CRS coordinates of a pixel center.
    pub fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        self.apply(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// Inverse transform (CRS -> pixel), or `None` when the scale is degenerate.
    pub fn inverse(&self) -> Option<GeoTransform> {
        if !self.is_invertible() {
            return None;
        }
        let inv = self.matrix().try_inverse()?;
        Some(GeoTransform::new(
            inv[(0, 0)],
            inv[(0, 1)],
            inv[(0, 2)],
            inv[(1, 0)],
            inv[(1, 1)],
            inv[(1, 2)],
        ))
    }

    pub fn is_invertible(&self) -> bool {
        let det = self.determinant();
        det.is_finite() && det.abs() > DEGENERATE_EPSILON
    }

    /// Pixel width and height in CRS units (always positive).
    pub fn pixel_size(&self) -> (f64, f64) {
        (self.a.hypot(self.d), self.b.hypot(self.e))
    }

    /// True when there is no rotation term.
    pub fn is_rectilinear(&self) -> bool {
        self.b == 0.0 && self.d == 0.0
    }

    /// Bounding box covering a raster of the given shape.
    pub fn bounds(&self, width: usize, height: usize) -> BoundingBox {
        let (w, h) = (width as f64, height as f64);
        let corners = [
            self.apply(0.0, 0.0),
            self.apply(w, 0.0),
            self.apply(0.0, h),
            self.apply(w, h),
        ];
        // Four corners always present.
        BoundingBox::from_points(corners).unwrap_or(BoundingBox::new(0.0, 0.0, 0.0, 0.0))
    }

    /// Transform of a sub-window starting at `(col_off, row_off)`.
    pub fn window(&self, col_off: usize, row_off: usize) -> GeoTransform {
        let (c, f) = self.apply(col_off as f64, row_off as f64);
        GeoTransform { c, f, ..*self }
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::from_origin(0.0, 0.0, 1.0, 1.0)
    }
}
