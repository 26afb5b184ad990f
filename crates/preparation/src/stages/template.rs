//! Target grid stage: AOI bounds to a snapped [`GridSpec`] and a template
//! GeoTIFF.

use std::path::Path;

use grid_common::GridSpec;
use grid_processor::RasterBuffer;
use projection::TransformProvider;
use tracing::info;

use super::{output_writer, Stage, StageReport};
use crate::aoi::Aoi;
use crate::config::PrepareConfig;
use crate::error::Result;

/// Nodata of the template raster.
pub const TEMPLATE_NODATA: u8 = 0;

/// Grid covering `aoi` once reprojected to the configured CRS.
pub fn build_grid(
    aoi: &Aoi,
    config: &PrepareConfig,
    provider: &dyn TransformProvider,
) -> Result<GridSpec> {
    let projected = aoi.to_crs(provider, config.grid.crs)?;
    let bounds = projected.bounds()?;
    let grid = GridSpec::from_bounds(
        &bounds,
        config.grid.pixel_size,
        config.grid.crs,
        TEMPLATE_NODATA as f64,
    )?;
    Ok(grid)
}

/// All-zero `u8` raster on `grid`, nodata 0.
pub fn write_template(grid: &GridSpec, path: &Path) -> Result<()> {
    let template = RasterBuffer::filled(grid, 0u8, TEMPLATE_NODATA).with_name("template");
    output_writer().write(&template, path)?;
    Ok(())
}

pub fn run(config: &PrepareConfig, provider: &dyn TransformProvider) -> Result<StageReport> {
    let aoi = Aoi::read(&config.aoi.path, config.aoi.crs)?;
    let grid = build_grid(&aoi, config, provider)?;
    write_template(&grid, &config.grid.template)?;

    info!(
        path = %config.grid.template.display(),
        width = grid.width,
        height = grid.height,
        pixel_size = grid.pixel_size,
        crs = %grid.crs,
        "Wrote template grid"
    );

    let mut report = StageReport::new(Stage::Grid);
    report.outputs.push(config.grid.template.clone());
    Ok(report)
}
