//! Terrain stage: clip the DEM to the AOI, warp it onto the grid and derive
//! slope and aspect.

use grid_common::GridSpec;
use grid_processor::{clip_to_polygon, read_geotiff, InterpolationMethod, RasterBuffer, Resampler};
use projection::TransformProvider;
use tracing::{debug, info};

use super::{load_grid, output_writer, require_file, Stage, StageReport};
use crate::aoi::Aoi;
use crate::config::PrepareConfig;
use crate::error::Result;

/// Elevation, slope and aspect on the target grid.
#[derive(Debug, Clone)]
pub struct TerrainLayers {
    pub elevation: RasterBuffer<f32>,
    pub slope: RasterBuffer<f32>,
    pub aspect: RasterBuffer<f32>,
}

/// Mask `dem` to the AOI footprint, cropped to the footprint's bounds.
pub fn clip_dem(
    dem: &RasterBuffer<f32>,
    aoi: &Aoi,
    provider: &dyn TransformProvider,
) -> Result<RasterBuffer<f32>> {
    let footprint = aoi.to_crs(provider, dem.require_crs()?)?;
    Ok(clip_to_polygon(dem, &footprint.footprint)?)
}

/// Bilinear warp onto `grid` (NaN nodata) and Horn slope/aspect.
pub fn derive_terrain(
    dem: &RasterBuffer<f32>,
    grid: &GridSpec,
    provider: &dyn TransformProvider,
) -> Result<TerrainLayers> {
    let elevation = Resampler::new(grid, provider)
        .resample(dem, InterpolationMethod::Bilinear, f32::NAN)?
        .with_name("elevation");
    let (slope, aspect) = derivations::slope_aspect(&elevation)?;
    Ok(TerrainLayers {
        elevation,
        slope: slope.with_name("slope"),
        aspect: aspect.with_name("aspect"),
    })
}

pub fn run(config: &PrepareConfig, provider: &dyn TransformProvider) -> Result<StageReport> {
    let cfg = &config.dem;
    require_file("dem", &cfg.input)?;
    let grid = load_grid("dem", config)?;
    let aoi = Aoi::read(&config.aoi.path, config.aoi.crs)?;

    let raw = read_geotiff::<f32>(&cfg.input)?;
    debug!(path = %cfg.input.display(), width = raw.width, height = raw.height, "Read DEM");

    let clipped = clip_dem(&raw, &aoi, provider)?;
    let writer = output_writer();
    writer.write(&clipped, &cfg.clip)?;
    info!(path = %cfg.clip.display(), width = clipped.width, height = clipped.height, "Clipped DEM to AOI");

    let layers = derive_terrain(&clipped, &grid, provider)?;
    writer.write(&layers.elevation, &cfg.elevation)?;
    writer.write(&layers.slope, &cfg.slope)?;
    writer.write(&layers.aspect, &cfg.aspect)?;

    info!(
        elevation = %cfg.elevation.display(),
        slope = %cfg.slope.display(),
        aspect = %cfg.aspect.display(),
        valid_cells = layers.elevation.valid_count(),
        "Wrote terrain layers"
    );

    let mut report = StageReport::new(Stage::Dem);
    report.outputs = vec![
        cfg.clip.clone(),
        cfg.elevation.clone(),
        cfg.slope.clone(),
        cfg.aspect.clone(),
    ];
    Ok(report)
}
