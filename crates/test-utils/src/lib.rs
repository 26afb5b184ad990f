//! Test support for the fire-input preparation crates.
//!
//! - [`paths`] finds optional sample inputs (DEM tiles, WorldCover tiles,
//!   ERA5 NetCDF) and makes scratch directories
//! - [`generators`] builds synthetic elevation, land-cover and hourly series
//!   on small UTM grids
//! - [`fixtures`] holds AOI GeoJSON snippets and WorldCover class codes
//!
//! The macros below cover the assertions the raster tests repeat: skipping
//! when a sample file is missing and comparing float rasters where NaN marks
//! nodata.

pub mod fixtures;
pub mod generators;
pub mod paths;

pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Resolve a sample file or return early from the test.
///
/// ```ignore
/// let path = require_test_file!("era5_instant_sample.nc");
/// ```
#[macro_export]
macro_rules! require_test_file {
    ($name:expr) => {{
        match $crate::find_test_file($name) {
            Some(path) => path,
            None => {
                eprintln!("SKIPPED: sample '{}' not found (set TEST_DATA_DIR)", $name);
                return;
            }
        }
    }};
}

/// Resolve several sample files, returning early if any is missing.
#[macro_export]
macro_rules! require_test_files {
    ($($name:expr),+ $(,)?) => {{
        let mut paths = Vec::new();
        $(
            match $crate::find_test_file($name) {
                Some(path) => paths.push(path),
                None => {
                    eprintln!("SKIPPED: sample '{}' not found (set TEST_DATA_DIR)", $name);
                    return;
                }
            }
        )+
        paths
    }};
}

/// `|left - right| <= epsilon`, compared as f64.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if !(diff <= epsilon) {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// [`assert_approx_eq!`] on both members of an `(x, y)` pair.
#[macro_export]
macro_rules! assert_coords_approx_eq {
    (($x1:expr, $y1:expr), ($x2:expr, $y2:expr), $epsilon:expr) => {{
        $crate::assert_approx_eq!($x1, $x2, $epsilon);
        $crate::assert_approx_eq!($y1, $y2, $epsilon);
    }};
}

/// Cell-by-cell comparison of two float rasters given as slices.
///
/// NaN (nodata) must line up exactly; other cells compare within `epsilon`.
/// The panic names the first mismatching cell.
///
/// ```ignore
/// assert_raster_approx_eq!(&slope.data, &[0.0, f32::NAN, 45.0], 1e-4);
/// ```
#[macro_export]
macro_rules! assert_raster_approx_eq {
    ($actual:expr, $expected:expr, $epsilon:expr) => {{
        let actual: &[f32] = &$actual[..];
        let expected: &[f32] = &$expected[..];
        let epsilon: f64 = $epsilon as f64;
        assert_eq!(
            actual.len(),
            expected.len(),
            "raster length mismatch: {} vs {}",
            actual.len(),
            expected.len()
        );
        for (idx, (&a, &e)) in actual.iter().zip(expected).enumerate() {
            if a.is_nan() || e.is_nan() {
                if a.is_nan() != e.is_nan() {
                    panic!("cell {idx}: nodata mismatch, actual {a:?} expected {e:?}");
                }
                continue;
            }
            let diff = (a as f64 - e as f64).abs();
            if diff > epsilon {
                panic!("cell {idx}: actual {a:?} expected {e:?}, diff {diff:?} > {epsilon:?}");
            }
        }
    }};
}
