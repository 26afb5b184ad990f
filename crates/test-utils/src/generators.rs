//! Synthetic raster and time-series generators.
//!
//! These generators create predictable, verifiable data patterns with
//! known analytic derivatives or aggregates, so tests can check results
//! against closed-form expectations.

use chrono::{DateTime, Duration, TimeZone, Utc};

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50);
/// assert_eq!(grid[1], 1000.0);
/// assert_eq!(grid[10], 1.0);
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// Creates a constant grid (a flat DEM when used as elevation).
pub fn create_constant_grid(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}

/// Creates an inclined plane `z = base + gx * x - gy * row_y`.
///
/// `x` grows with column and `y` grows northward (decreasing row), both in
/// units of `cellsize`. `gx` and `gy` are the true gradients in z units per
/// CRS unit along x (east) and y (north).
pub fn create_plane_grid(width: usize, height: usize, cellsize: f64, base: f64, gx: f64, gy: f64) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        let y = (height - 1 - row) as f64 * cellsize;
        for col in 0..width {
            let x = col as f64 * cellsize;
            data.push((base + gx * x + gy * y) as f32);
        }
    }
    data
}

/// Creates a grid with NaN values at the given indices.
pub fn create_grid_with_nans(width: usize, height: usize, value: f32, nan_indices: &[usize]) -> Vec<f32> {
    let mut data = vec![value; width * height];
    for &idx in nan_indices {
        if idx < data.len() {
            data[idx] = f32::NAN;
        }
    }
    data
}

/// Creates a land-cover grid cycling through the given class codes.
pub fn create_landcover_grid(width: usize, height: usize, classes: &[u16]) -> Vec<u16> {
    (0..width * height)
        .map(|i| classes.get(i % classes.len().max(1)).copied().unwrap_or(0))
        .collect()
}

/// Hourly timestamps starting at midnight UTC of the given day.
pub fn hourly_times(year: i32, month: u32, day: u32, hours: usize) -> Vec<DateTime<Utc>> {
    let start = Utc
        .with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .expect("valid calendar date");
    (0..hours as i64).map(|h| start + Duration::hours(h)).collect()
}

/// Stacks `steps` copies of a `width x height` field, multiplying step `t`
/// by `scale(t)`. Produces a `[time, y, x]` flat array.
pub fn create_time_series(width: usize, height: usize, steps: usize, base: f32, scale: impl Fn(usize) -> f32) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height * steps);
    for t in 0..steps {
        let factor = scale(t);
        data.extend(std::iter::repeat(base * factor).take(width * height));
    }
    data
}
