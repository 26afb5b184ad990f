//! Regular latitude/longitude grids and their extraction as rasters.

use grid_common::{Crs, GeoTransform};
use grid_processor::RasterBuffer;
use tracing::debug;

use crate::dataset::GriddedDataset;
use crate::error::{NetCdfError, NetCdfResult};

pub const LATITUDE_NAMES: [&str; 2] = ["latitude", "lat"];
pub const LONGITUDE_NAMES: [&str; 2] = ["longitude", "lon"];

/// Sub-range of a lat/lon grid. Indices refer to the stored axis order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridWindow {
    pub lat_start: usize,
    pub lat_len: usize,
    pub lon_start: usize,
    pub lon_len: usize,
}

impl GridWindow {
    pub fn cells(&self) -> usize {
        self.lat_len * self.lon_len
    }
}

/// Cell-center coordinates of a regular lat/lon grid.
#[derive(Debug, Clone, PartialEq)]
pub struct LatLonGrid {
    pub lat_name: String,
    pub lon_name: String,
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
}

fn find_coordinate<'a>(
    dataset: &'a GriddedDataset,
    names: &[&str],
) -> NetCdfResult<(&'a str, &'a [f64])> {
    names
        .iter()
        .find_map(|n| {
            dataset
                .coordinates
                .get_key_value(*n)
                .map(|(k, c)| (k.as_str(), c.values.as_slice()))
        })
        .ok_or_else(|| NetCdfError::missing(&dataset.source, format!("coordinate {}", names.join("/"))))
}

fn monotonic(values: &[f64]) -> bool {
    let inc = values.windows(2).all(|w| w[1] > w[0]);
    let dec = values.windows(2).all(|w| w[1] < w[0]);
    inc || dec
}

/// Contiguous index range whose values fall in `[lo, hi]`.
fn select(values: &[f64], lo: f64, hi: f64) -> Option<(usize, usize)> {
    let first = values.iter().position(|v| *v >= lo && *v <= hi)?;
    let len = values[first..]
        .iter()
        .take_while(|v| **v >= lo && **v <= hi)
        .count();
    Some((first, len))
}

impl LatLonGrid {
    pub fn from_dataset(dataset: &GriddedDataset) -> NetCdfResult<Self> {
        let (lat_name, lats) = find_coordinate(dataset, &LATITUDE_NAMES)?;
        let (lon_name, lons) = find_coordinate(dataset, &LONGITUDE_NAMES)?;

        if lats.len() < 2 || lons.len() < 2 {
            return Err(NetCdfError::invalid(
                &dataset.source,
                "lat/lon axes need at least two points",
            ));
        }
        if !monotonic(lats) || !monotonic(lons) {
            return Err(NetCdfError::invalid(
                &dataset.source,
                "lat/lon axes must be strictly monotonic",
            ));
        }

        Ok(Self {
            lat_name: lat_name.to_string(),
            lon_name: lon_name.to_string(),
            lats: lats.to_vec(),
            lons: lons.to_vec(),
        })
    }

    pub fn full_window(&self) -> GridWindow {
        GridWindow {
            lat_start: 0,
            lat_len: self.lats.len(),
            lon_start: 0,
            lon_len: self.lons.len(),
        }
    }

    /// Window of cells whose centers fall in `[lon_min, lat_min, lon_max, lat_max]`.
    pub fn window(&self, input: &str, crop: Option<[f64; 4]>) -> NetCdfResult<GridWindow> {
        let Some(bbox) = crop else {
            return Ok(self.full_window());
        };
        let [lon_min, lat_min, lon_max, lat_max] = bbox;
        let empty = || NetCdfError::EmptyCrop {
            input: input.to_string(),
            window: bbox,
        };
        let (lat_start, lat_len) = select(&self.lats, lat_min, lat_max).ok_or_else(empty)?;
        let (lon_start, lon_len) = select(&self.lons, lon_min, lon_max).ok_or_else(empty)?;
        debug!(
            input = %input,
            lat_start, lat_len, lon_start, lon_len,
            "Cropped lat/lon window"
        );
        Ok(GridWindow {
            lat_start,
            lat_len,
            lon_start,
            lon_len,
        })
    }

    pub fn lat_step(&self) -> f64 {
        (self.lats[self.lats.len() - 1] - self.lats[0]) / (self.lats.len() - 1) as f64
    }

    pub fn lon_step(&self) -> f64 {
        (self.lons[self.lons.len() - 1] - self.lons[0]) / (self.lons.len() - 1) as f64
    }

    /// Latitude stored south to north.
    pub fn is_ascending(&self) -> bool {
        self.lat_step() > 0.0
    }

    /// North-up affine for `window`, origin at the top-left cell corner.
    pub fn transform(&self, window: &GridWindow) -> GeoTransform {
        let dx = self.lon_step().abs();
        let dy = self.lat_step().abs();
        let west = self.lons[window.lon_start].min(self.lons[window.lon_start + window.lon_len - 1]);
        let lat_a = self.lats[window.lat_start];
        let lat_b = self.lats[window.lat_start + window.lat_len - 1];
        let north = lat_a.max(lat_b);
        GeoTransform::from_origin(west - dx / 2.0, north + dy / 2.0, dx, dy)
    }

    /// Copy one `[lat, lon]` field out of `values` into north-up row order.
    ///
    /// `values` is the stored 2-D field of the full grid.
    pub fn extract(&self, values: &[f32], window: &GridWindow) -> Vec<f32> {
        let ncols = self.lons.len();
        let flip_cols = self.lon_step() < 0.0;
        let mut out = Vec::with_capacity(window.cells());
        for r in 0..window.lat_len {
            let src_row = if self.is_ascending() {
                window.lat_start + window.lat_len - 1 - r
            } else {
                window.lat_start + r
            };
            let row = &values[src_row * ncols..(src_row + 1) * ncols];
            let cols = &row[window.lon_start..window.lon_start + window.lon_len];
            if flip_cols {
                out.extend(cols.iter().rev());
            } else {
                out.extend_from_slice(cols);
            }
        }
        out
    }

    /// Wrap a north-up window field as a WGS84 raster with NaN nodata.
    pub fn raster(
        &self,
        window: &GridWindow,
        data: Vec<f32>,
        name: impl Into<String>,
    ) -> NetCdfResult<RasterBuffer<f32>> {
        let raster = RasterBuffer::new(
            data,
            window.lon_len,
            window.lat_len,
            self.transform(window),
            Some(Crs::WGS84),
            f32::NAN,
        )?;
        Ok(raster.with_name(name))
    }
}

/// Stack of `variable` over the time axis, cropped to `window`.
///
/// The result holds `steps` consecutive north-up fields of
/// `window.cells()` values each. The variable must be laid out
/// `[time, lat, lon]`.
pub fn extract_time_stack(
    dataset: &GriddedDataset,
    variable: &str,
    time_axis: &str,
    grid: &LatLonGrid,
    window: &GridWindow,
) -> NetCdfResult<Vec<f32>> {
    let var = dataset.validate_variable(variable)?;
    let expected = [time_axis, grid.lat_name.as_str(), grid.lon_name.as_str()];
    if var.dims.len() != 3 || var.dims.iter().zip(expected).any(|(d, e)| d != e) {
        return Err(NetCdfError::invalid(
            &dataset.source,
            format!(
                "variable '{variable}' has dimensions {:?}, expected {expected:?}",
                var.dims
            ),
        ));
    }

    let field = grid.lats.len() * grid.lons.len();
    let steps = var.values.len() / field;
    let mut out = Vec::with_capacity(steps * window.cells());
    for t in 0..steps {
        out.extend(grid.extract(&var.values[t * field..(t + 1) * field], window));
    }
    Ok(out)
}
