//! Weather stage: daily ERA5 aggregates derived and warped onto the grid.
//!
//! Runs in two phases. [`WeatherInputs::prepare`] checks both datasets once
//! (time axis, variables, lat/lon coordinates, day grouping) and extracts the
//! cropped hourly stacks. Each day is then processed independently, in
//! parallel when configured, under the configured failure policy.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use derivations::{daily_mean, daily_sum, DailyWeather, WeatherField};
use grid_common::{group_by_day, Crs, GridSpec};
use grid_processor::{InterpolationMethod, Resampler};
use netcdf_parser::{
    decode_times, extract_time_stack, find_time_axis, open_dataset, GriddedDataset, GridWindow,
    LatLonGrid, NetCdfError,
};
use projection::{transform_bounds, TransformProvider};
use rayon::prelude::*;
use tracing::{debug, error, info, info_span, warn};

use super::{load_grid, output_writer, require_file, Stage, StageReport};
use crate::config::{FailurePolicy, PrepareConfig, WeatherConfig};
use crate::error::{PrepareError, Result};

/// Time steps belonging to one UTC day in each file.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherDay {
    pub date: NaiveDate,
    pub instant: Vec<usize>,
    /// `None` when the accumulated file has no samples for this day.
    pub accum: Option<Vec<usize>>,
}

impl WeatherDay {
    pub fn label(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// Cropped hourly stacks of both files and the days to process.
#[derive(Debug, Clone)]
pub struct WeatherInputs {
    pub grid: LatLonGrid,
    pub window: GridWindow,
    pub days: Vec<WeatherDay>,
    /// u10, v10, t2m, d2m stacks, `[time, cell]`.
    instant: [Vec<f32>; 4],
    tp: Vec<f32>,
    accum_source: String,
}

struct Opened {
    grid: LatLonGrid,
    window: GridWindow,
    days: BTreeMap<NaiveDate, Vec<usize>>,
    axis: &'static str,
}

fn open(dataset: &GriddedDataset, crop: Option<[f64; 4]>) -> Result<Opened> {
    let axis = find_time_axis(dataset)?;
    let times = decode_times(dataset, axis)?;
    let grid = LatLonGrid::from_dataset(dataset)?;
    let window = grid.window(&dataset.source, crop)?;
    let days = group_by_day(&times)
        .into_iter()
        .map(|g| (g.date, g.indices))
        .collect();
    debug!(
        input = %dataset.source,
        time_axis = axis,
        steps = times.len(),
        rows = window.lat_len,
        cols = window.lon_len,
        "Opened weather dataset"
    );
    Ok(Opened {
        grid,
        window,
        days,
        axis,
    })
}

impl WeatherInputs {
    pub fn prepare(
        instant: &GriddedDataset,
        accum: &GriddedDataset,
        config: &WeatherConfig,
    ) -> Result<Self> {
        let inst = open(instant, config.crop)?;
        let acc = open(accum, config.crop)?;

        let same_grid = inst.window.lat_len == acc.window.lat_len
            && inst.window.lon_len == acc.window.lon_len
            && inst.grid.transform(&inst.window) == acc.grid.transform(&acc.window);
        if !same_grid {
            return Err(NetCdfError::invalid(
                &accum.source,
                format!("lat/lon grid differs from {}", instant.source),
            )
            .into());
        }

        let names = &config.variables;
        let stack = |ds: &GriddedDataset, o: &Opened, name: &str| {
            extract_time_stack(ds, name, o.axis, &o.grid, &o.window)
        };
        let instant_stacks = [
            stack(instant, &inst, &names.u10)?,
            stack(instant, &inst, &names.v10)?,
            stack(instant, &inst, &names.t2m)?,
            stack(instant, &inst, &names.d2m)?,
        ];
        let tp = stack(accum, &acc, &names.tp)?;

        let days: Vec<WeatherDay> = inst
            .days
            .iter()
            .map(|(date, indices)| WeatherDay {
                date: *date,
                instant: indices.clone(),
                accum: acc.days.get(date).cloned(),
            })
            .collect();

        for day in days.iter().filter(|d| d.accum.is_none()) {
            warn!(date = %day.label(), input = %accum.source, "No accumulated samples for day");
        }

        Ok(Self {
            grid: inst.grid,
            window: inst.window,
            days,
            instant: instant_stacks,
            tp,
            accum_source: accum.source.clone(),
        })
    }

    /// Daily means/sum for `day` on the native grid.
    pub fn aggregate(&self, day: &WeatherDay, config: &WeatherConfig) -> Result<DailyWeather> {
        let cells = self.window.cells();
        let names = config.variables.instant();
        let mean = |i: usize| daily_mean(names[i], &self.instant[i], cells, &day.instant);

        let accum = day.accum.as_ref().ok_or_else(|| {
            let what = format!("'{}' samples on {}", config.variables.tp, day.label());
            NetCdfError::missing(&self.accum_source, what)
        })?;

        Ok(DailyWeather {
            date: day.date,
            u10: mean(0)?,
            v10: mean(1)?,
            t2m: mean(2)?,
            d2m: mean(3)?,
            tp: daily_sum(&config.variables.tp, &self.tp, cells, accum)?,
        })
    }
}

/// Warn when the native window leaves part of the target grid uncovered.
/// Uncovered cells come out as nodata.
fn check_coverage(
    inputs: &WeatherInputs,
    grid: &GridSpec,
    provider: &dyn TransformProvider,
) -> Result<()> {
    let to_lonlat = provider.transformer(grid.crs, Crs::WGS84)?;
    let needed = transform_bounds(to_lonlat.as_ref(), &grid.bounds())?;
    let native = inputs
        .grid
        .transform(&inputs.window)
        .bounds(inputs.window.lon_len, inputs.window.lat_len);

    if !native.contains_point(needed.min_x, needed.min_y)
        || !native.contains_point(needed.max_x, needed.max_y)
    {
        warn!(
            grid = ?needed,
            native = ?native,
            "Weather window does not cover the target grid"
        );
    }
    Ok(())
}

/// Derive, warp and write the five layers of one day.
pub fn process_day(
    inputs: &WeatherInputs,
    day: &WeatherDay,
    config: &WeatherConfig,
    grid: &GridSpec,
    provider: &dyn TransformProvider,
) -> Result<Vec<PathBuf>> {
    let daily = inputs.aggregate(day, config)?;
    let resampler = Resampler::new(grid, provider);
    let writer = output_writer();
    let pixel_label = grid.pixel_label();

    let mut written = Vec::with_capacity(5);
    for (variable, values) in daily.derive()? {
        let native = inputs.grid.raster(
            &inputs.window,
            values,
            format!("{}_{}", day.label(), variable.tag()),
        )?;
        let field = WeatherField {
            variable,
            date: day.date,
            raster: resampler.resample(&native, InterpolationMethod::Bilinear, f32::NAN)?,
        };
        let path = config.output_dir.join(field.file_name(&pixel_label));
        writer.write(&field.raster, &path)?;
        written.push(path);
    }

    info!(date = %day.label(), files = written.len(), "Wrote daily weather rasters");
    Ok(written)
}

/// Process every day of already loaded datasets.
pub fn run_datasets(
    instant: &GriddedDataset,
    accum: &GriddedDataset,
    config: &PrepareConfig,
    grid: &GridSpec,
    provider: &dyn TransformProvider,
) -> Result<StageReport> {
    let cfg = &config.weather;
    let inputs = WeatherInputs::prepare(instant, accum, cfg)?;
    check_coverage(&inputs, grid, provider)?;
    let _span = info_span!("weather", days = inputs.days.len(), policy = %cfg.on_day_error).entered();

    fs::create_dir_all(&cfg.output_dir)?;

    let process = |day: &WeatherDay| {
        process_day(&inputs, day, cfg, grid, provider).map_err(|e| PrepareError::WeatherDay {
            date: day.label(),
            source: Box::new(e),
        })
    };

    let mut report = StageReport::new(Stage::Weather);
    match cfg.on_day_error {
        FailurePolicy::Abort => {
            let outputs: Vec<Vec<PathBuf>> = if cfg.parallel {
                inputs.days.par_iter().map(process).collect::<Result<_>>()?
            } else {
                inputs.days.iter().map(process).collect::<Result<_>>()?
            };
            report.outputs = outputs.concat();
        }
        FailurePolicy::Skip => {
            let results: Vec<Result<Vec<PathBuf>>> = if cfg.parallel {
                inputs.days.par_iter().map(process).collect()
            } else {
                inputs.days.iter().map(process).collect()
            };
            for (day, result) in inputs.days.iter().zip(results) {
                match result {
                    Ok(paths) => report.outputs.extend(paths),
                    Err(e) => {
                        error!(date = %day.label(), error = %e, "Skipping failed weather day");
                        report.skipped.push(day.label());
                    }
                }
            }
        }
    }

    info!(
        output_dir = %cfg.output_dir.display(),
        files = report.outputs.len(),
        skipped = report.skipped.len(),
        "Weather stage complete"
    );
    Ok(report)
}

fn load(path: &Path) -> Result<GriddedDataset> {
    Ok(open_dataset(path)?)
}

pub fn run(config: &PrepareConfig, provider: &dyn TransformProvider) -> Result<StageReport> {
    let cfg = &config.weather;
    require_file("weather", &cfg.instant)?;
    require_file("weather", &cfg.accum)?;
    let grid = load_grid("weather", config)?;

    let instant = load(&cfg.instant)?;
    let accum = load(&cfg.accum)?;
    run_datasets(&instant, &accum, config, &grid, provider)
}
