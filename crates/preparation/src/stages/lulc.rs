//! Land-cover stage: optional tile mosaic, nearest warp onto the grid and
//! fuel-score classification.

use std::path::{Path, PathBuf};

use derivations::classify_raster;
use grid_common::GridSpec;
use grid_processor::{mosaic, read_geotiff, InterpolationMethod, RasterBuffer, Resampler};
use projection::TransformProvider;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::{load_grid, output_writer, require_file, Stage, StageReport};
use crate::config::PrepareConfig;
use crate::error::Result;

/// Nodata of the aligned land-cover raster.
pub const LANDCOVER_NODATA: u16 = 0;

/// `*.tif`/`*.tiff` files directly inside `dir`, sorted by path.
pub fn find_tiles(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }
    let mut tiles: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "Skipping unreadable entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("tif") || e.eq_ignore_ascii_case("tiff"))
        })
        .collect();
    tiles.sort();
    tiles
}

/// Mosaic `tiles` in order. `None` when there are no tiles.
pub fn mosaic_tiles(tiles: &[PathBuf]) -> Result<Option<RasterBuffer<u16>>> {
    let rasters = tiles
        .iter()
        .map(|p| read_geotiff::<u16>(p))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(mosaic(&rasters)?)
}

/// Nearest warp onto `grid` (nodata 0) and the matching fuel scores.
pub fn align_landcover(
    landcover: &RasterBuffer<u16>,
    grid: &GridSpec,
    provider: &dyn TransformProvider,
) -> Result<(RasterBuffer<u16>, RasterBuffer<f32>)> {
    let aligned = Resampler::new(grid, provider)
        .resample(landcover, InterpolationMethod::Nearest, LANDCOVER_NODATA)?
        .with_name("landcover");
    let fuel = classify_raster(&aligned).with_name("fuel_score");
    Ok((aligned, fuel))
}

pub fn run(config: &PrepareConfig, provider: &dyn TransformProvider) -> Result<StageReport> {
    let cfg = &config.lulc;
    let mut report = StageReport::new(Stage::Lulc);
    let writer = output_writer();

    let tiles = find_tiles(&cfg.tiles_dir);
    debug!(dir = %cfg.tiles_dir.display(), tiles = tiles.len(), "Scanned land-cover tiles");
    if let Some(merged) = mosaic_tiles(&tiles)? {
        writer.write(&merged, &cfg.input)?;
        info!(
            path = %cfg.input.display(),
            tiles = tiles.len(),
            width = merged.width,
            height = merged.height,
            "Mosaicked land-cover tiles"
        );
        report.outputs.push(cfg.input.clone());
    }

    require_file("lulc", &cfg.input)?;
    let grid = load_grid("lulc", config)?;
    let landcover = read_geotiff::<u16>(&cfg.input)?;

    let (aligned, fuel) = align_landcover(&landcover, &grid, provider)?;
    writer.write(&aligned, &cfg.aligned)?;
    writer.write(&fuel, &cfg.fuel)?;

    info!(
        landcover = %cfg.aligned.display(),
        fuel = %cfg.fuel.display(),
        valid_cells = aligned.valid_count(),
        "Wrote land-cover and fuel layers"
    );
    report.outputs.push(cfg.aligned.clone());
    report.outputs.push(cfg.fuel.clone());
    Ok(report)
}
