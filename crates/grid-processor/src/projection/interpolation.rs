//! Nodata-aware sampling of a source raster at fractional pixel positions.
//!
//! Positions are corner-based pixel coordinates from the inverse affine:
//! `(0.0, 0.0)` is the top-left corner of the first cell and `(0.5, 0.5)` its
//! center.

use crate::types::{Pixel, RasterBuffer};

/// Value of the cell containing the position.
///
/// Returns `None` outside the raster or on a nodata cell.
pub fn nearest_interpolate<T: Pixel>(source: &RasterBuffer<T>, px: f64, py: f64) -> Option<f64> {
    if !inside(source, px, py) {
        return None;
    }
    let col = px.floor() as usize;
    let row = py.floor() as usize;
    source.get_valid(col, row).map(Pixel::as_f64)
}

/// Bilinear interpolation between the four surrounding cell centers.
///
/// Neighbours that are nodata or fall outside the raster are dropped and the
/// remaining weights renormalised. Returns `None` outside the raster or when
/// no neighbour with positive weight is valid.
pub fn bilinear_interpolate<T: Pixel>(source: &RasterBuffer<T>, px: f64, py: f64) -> Option<f64> {
    if !inside(source, px, py) {
        return None;
    }

    // Center-based coordinates
    let fx = px - 0.5;
    let fy = py - 0.5;
    let x0 = fx.floor();
    let y0 = fy.floor();
    let tx = fx - x0;
    let ty = fy - y0;

    let neighbours = [
        (x0, y0, (1.0 - tx) * (1.0 - ty)),
        (x0 + 1.0, y0, tx * (1.0 - ty)),
        (x0, y0 + 1.0, (1.0 - tx) * ty),
        (x0 + 1.0, y0 + 1.0, tx * ty),
    ];

    let mut sum = 0.0;
    let mut weight_sum = 0.0;
    for (x, y, w) in neighbours {
        if w <= 0.0 || x < 0.0 || y < 0.0 {
            continue;
        }
        if let Some(v) = source.get_valid(x as usize, y as usize) {
            sum += v.as_f64() * w;
            weight_sum += w;
        }
    }

    if weight_sum > 1e-12 {
        Some(sum / weight_sum)
    } else {
        None
    }
}

fn inside<T>(source: &RasterBuffer<T>, px: f64, py: f64) -> bool {
    px.is_finite()
        && py.is_finite()
        && px >= 0.0
        && py >= 0.0
        && px < source.width as f64
        && py < source.height as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_common::GeoTransform;

    fn raster(data: Vec<f32>, width: usize, height: usize) -> RasterBuffer<f32> {
        RasterBuffer::new(data, width, height, GeoTransform::default(), None, -9999.0).unwrap()
    }

    #[test]
    fn test_nearest_interpolate() {
        let r = raster(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0], 3, 3);

        assert_eq!(nearest_interpolate(&r, 0.5, 0.5), Some(1.0));
        assert_eq!(nearest_interpolate(&r, 1.5, 1.5), Some(5.0));
        assert_eq!(nearest_interpolate(&r, 0.9, 0.9), Some(1.0));
        assert_eq!(nearest_interpolate(&r, 1.1, 1.1), Some(5.0));
        assert_eq!(nearest_interpolate(&r, 3.0, 0.5), None);
        assert_eq!(nearest_interpolate(&r, -0.1, 0.5), None);
    }

    #[test]
    fn test_nearest_skips_nodata() {
        let r = raster(vec![1.0, -9999.0, f32::NAN, 4.0], 2, 2);
        assert_eq!(nearest_interpolate(&r, 1.5, 0.5), None);
        assert_eq!(nearest_interpolate(&r, 0.5, 1.5), None);
        assert_eq!(nearest_interpolate(&r, 1.5, 1.5), Some(4.0));
    }

    #[test]
    fn test_bilinear_interpolate() {
        let r = raster(vec![1.0, 2.0, 3.0, 4.0], 2, 2);

        // Cell centers
        assert_eq!(bilinear_interpolate(&r, 0.5, 0.5), Some(1.0));
        assert_eq!(bilinear_interpolate(&r, 1.5, 0.5), Some(2.0));
        assert_eq!(bilinear_interpolate(&r, 0.5, 1.5), Some(3.0));

        // Midpoint between all four centers
        let v = bilinear_interpolate(&r, 1.0, 1.0).unwrap();
        assert!((v - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_bilinear_renormalises_over_valid_neighbours() {
        let r = raster(vec![1.0, -9999.0, 3.0, 5.0], 2, 2);
        let v = bilinear_interpolate(&r, 1.0, 1.0).unwrap();
        assert!((v - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_bilinear_all_invalid_is_none() {
        let r = raster(vec![f32::NAN, -9999.0, -9999.0, f32::NAN], 2, 2);
        assert_eq!(bilinear_interpolate(&r, 1.0, 1.0), None);
    }

    #[test]
    fn test_bilinear_at_edge_uses_inside_neighbours() {
        let r = raster(vec![1.0, 2.0, 3.0, 4.0], 2, 2);
        // Quarter cell from the left edge; the left neighbours are off-raster
        let v = bilinear_interpolate(&r, 0.25, 0.5).unwrap();
        assert!((v - 1.0).abs() < 1e-9);
        assert_eq!(bilinear_interpolate(&r, 2.5, 0.5), None);
    }
}
