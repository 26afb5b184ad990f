//! Native NetCDF loading using the netcdf library.
//!
//! Reads every dimension, every 1-D coordinate variable (a variable named
//! after its only dimension) and every other numeric variable into a
//! [`GriddedDataset`]. Packed values are unpacked with `scale_factor` and
//! `add_offset`; `_FillValue` and `missing_value` become NaN.

use std::path::Path;
use std::sync::Once;

use netcdf::AttributeValue;
use tracing::{debug, warn};

use crate::dataset::{CoordinateVariable, DataVariable, GriddedDataset};
use crate::error::{NetCdfError, NetCdfResult};

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose error messages to stderr even when errors
/// are handled gracefully (e.g. when probing optional attributes). Call this
/// early, before any HDF5/NetCDF operation. Safe to call multiple times.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and null handlers are a
        // documented way to disable error output.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Load a whole NetCDF file into memory.
pub fn load_dataset(path: &Path) -> NetCdfResult<GriddedDataset> {
    silence_hdf5_errors();

    let source = path.display().to_string();
    let file = netcdf::open(path)
        .map_err(|e| NetCdfError::invalid(&source, format!("failed to open NetCDF: {e}")))?;

    let mut dataset = GriddedDataset::new(&source);
    for dim in file.dimensions() {
        dataset.dimensions.push((dim.name(), dim.len()));
    }

    for var in file.variables() {
        let name = var.name();
        let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();

        let raw: Vec<f64> = match var.get_values::<f64, _>(..) {
            Ok(values) => values,
            Err(e) => {
                // Non-numeric variables (strings, compound types) are not needed
                warn!(input = %source, variable = %name, error = %e, "Skipping unreadable variable");
                continue;
            }
        };

        if dims.len() == 1 && dims[0] == name {
            let units = get_string_attr(&var, "units");
            dataset
                .coordinates
                .insert(name, CoordinateVariable { values: raw, units });
            continue;
        }

        let scale = get_f64_attr(&var, "scale_factor").unwrap_or(1.0);
        let offset = get_f64_attr(&var, "add_offset").unwrap_or(0.0);
        let fills: Vec<f64> = ["_FillValue", "missing_value"]
            .iter()
            .filter_map(|a| get_f64_attr(&var, a))
            .collect();

        let values = raw
            .iter()
            .map(|&v| {
                if v.is_nan() || fills.iter().any(|f| *f == v) {
                    f32::NAN
                } else {
                    (v * scale + offset) as f32
                }
            })
            .collect();

        debug!(input = %source, variable = %name, dims = ?dims, "Loaded variable");
        dataset
            .variables
            .insert(name, DataVariable { dims, values });
    }

    Ok(dataset)
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}

fn get_string_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        AttributeValue::Str(s) => Some(s),
        AttributeValue::Strs(mut s) if !s.is_empty() => Some(s.swap_remove(0)),
        _ => None,
    }
}
