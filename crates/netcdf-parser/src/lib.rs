//! Gridded NetCDF datasets for daily weather derivation.
//!
//! ERA5 single-level downloads arrive as two files, one with instantaneous
//! fields (wind components, temperature, dewpoint) and one with accumulated
//! fields (precipitation). This crate models such a file in memory as a
//! [`GriddedDataset`] and provides the pieces the weather stage needs:
//!
//! - [`find_time_axis`] picks the time axis by a fixed name priority
//! - [`decode_times`] decodes CF `"<unit> since <epoch>"` values
//! - [`LatLonGrid`] and [`extract_time_stack`] cut a lat/lon window out of a
//!   `[time, lat, lon]` variable in north-up order
//!
//! [`open_dataset`] reads files from disk through libnetcdf.

pub mod dataset;
pub mod error;
pub mod latlon;
pub mod native;
pub mod time;

use std::path::Path;

pub use dataset::{CoordinateVariable, DataVariable, GriddedDataset};
pub use error::{NetCdfError, NetCdfResult};
pub use latlon::{extract_time_stack, GridWindow, LatLonGrid};
pub use time::{decode_times, find_time_axis, CfTimeUnits, TIME_AXIS_NAMES};

/// Load a NetCDF file from disk.
pub fn open_dataset(path: &Path) -> NetCdfResult<GriddedDataset> {
    if !path.exists() {
        return Err(NetCdfError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} not found", path.display()),
        )));
    }

    native::load_dataset(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_file() {
        let err = open_dataset(Path::new("/nonexistent/instant.nc")).unwrap_err();
        assert!(matches!(err, NetCdfError::IoError(_)));
    }

    #[test]
    fn test_open_reads_through_libnetcdf() {
        let dir = test_utils::temp_test_dir();
        let path = dir.path().join("not_netcdf.nc");
        std::fs::write(&path, b"plain text, not a NetCDF header").unwrap();

        let err = open_dataset(&path).unwrap_err();
        match err {
            NetCdfError::InvalidFormat { input, reason } => {
                assert!(input.ends_with("not_netcdf.nc"));
                assert!(reason.contains("failed to open NetCDF"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
