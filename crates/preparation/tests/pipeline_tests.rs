//! End-to-end stage runs on synthetic inputs in a temporary directory.

use std::fs;
use std::path::Path;

use grid_common::{Crs, GeoTransform, GridSpec};
use grid_processor::{read_geotiff, read_grid_spec, write_geotiff, RasterBuffer};
use netcdf_parser::{GriddedDataset, NetCdfError};
use preparation::stages::weather;
use preparation::{FailurePolicy, PrepareConfig, PrepareError, Preparer, Stage};
use projection::IdentityProvider;
use test_utils::{aoi, assert_approx_eq, create_plane_grid, temp_test_dir, UTM_44N};

/// Config rooted at `root` with a projected 0..100 m AOI on UTM 44N.
fn setup(root: &Path) -> PrepareConfig {
    let mut config = PrepareConfig::with_root(root).unwrap();
    config.aoi.crs = UTM_44N;
    config.grid.crs = UTM_44N;
    config.grid.pixel_size = 30.0;
    fs::create_dir_all(config.aoi.path.parent().unwrap()).unwrap();
    fs::write(&config.aoi.path, aoi::PROJECTED_SQUARE).unwrap();
    config
}

fn preparer(config: &PrepareConfig) -> Preparer {
    Preparer::with_provider(config.clone(), Box::new(IdentityProvider)).unwrap()
}

// ============================================================================
// Grid stage
// ============================================================================

#[test]
fn test_grid_stage_writes_template() {
    let dir = temp_test_dir();
    let config = setup(dir.path());

    let report = preparer(&config).run_stage(Stage::Grid).unwrap();
    assert_eq!(report.outputs, vec![config.grid.template.clone()]);

    let grid = read_grid_spec(&config.grid.template).unwrap();
    assert_eq!((grid.width, grid.height), (4, 4));
    assert_approx_eq!(grid.origin_x, 0.0, 1e-9);
    assert_approx_eq!(grid.origin_y, 120.0, 1e-9);
    assert_eq!(grid.crs, UTM_44N);

    let template = read_geotiff::<u8>(&config.grid.template).unwrap();
    assert!(template.data.iter().all(|&v| v == 0));
}

#[test]
fn test_grid_stage_missing_aoi() {
    let dir = temp_test_dir();
    let config = PrepareConfig::with_root(dir.path()).unwrap();
    let err = preparer(&config).run_stage(Stage::Grid).unwrap_err();
    assert!(matches!(err, PrepareError::MissingInputFile { stage: "aoi", .. }));
}

// ============================================================================
// DEM stage
// ============================================================================

#[test]
fn test_dem_stage() {
    let dir = temp_test_dir();
    let config = setup(dir.path());
    let prep = preparer(&config);
    prep.run_stage(Stage::Grid).unwrap();

    // 10 m DEM over -50..200 in both axes, z = 1000 + 0.1 * x
    let data = create_plane_grid(25, 25, 10.0, 1000.0 - 0.1 * 45.0, 0.1, 0.0);
    let dem = RasterBuffer::new(
        data,
        25,
        25,
        GeoTransform::from_origin(-50.0, 200.0, 10.0, 10.0),
        Some(UTM_44N),
        f32::NAN,
    )
    .unwrap();
    write_geotiff(&dem, &config.dem.input).unwrap();

    let report = prep.run_stage(Stage::Dem).unwrap();
    assert_eq!(report.outputs.len(), 4);

    // Clip is cropped to the AOI bounds on the source grid
    let clip = read_geotiff::<f32>(&config.dem.clip).unwrap();
    assert_eq!((clip.width, clip.height), (10, 10));

    let elevation = read_geotiff::<f32>(&config.dem.elevation).unwrap();
    assert_eq!(elevation.shape(), (4, 4));
    // Cell centers at 105 m fall outside the clipped DEM
    assert!(elevation.get(3, 1).unwrap().is_nan());
    assert!(elevation.get(1, 0).unwrap().is_nan());
    // Center x = 45 m
    assert_approx_eq!(elevation.get(1, 2).unwrap(), 1004.5, 1e-3);
    assert_eq!(elevation.valid_count(), 9);

    let slope = read_geotiff::<f32>(&config.dem.slope).unwrap();
    let aspect = read_geotiff::<f32>(&config.dem.aspect).unwrap();
    let s = slope.get(1, 2).unwrap();
    assert!(s.is_finite() && s > 0.0);
    assert!(aspect.get(1, 2).unwrap().is_finite());
    // Any nodata neighbour makes the cell nodata
    assert!(slope.get(1, 1).unwrap().is_nan());
}

#[test]
fn test_dem_stage_requires_template() {
    let dir = temp_test_dir();
    let config = setup(dir.path());
    let dem = RasterBuffer::new(
        vec![1.0f32; 4],
        2,
        2,
        GeoTransform::from_origin(0.0, 100.0, 50.0, 50.0),
        Some(UTM_44N),
        f32::NAN,
    )
    .unwrap();
    write_geotiff(&dem, &config.dem.input).unwrap();

    let err = preparer(&config).run_stage(Stage::Dem).unwrap_err();
    match err {
        PrepareError::MissingInputFile { stage, path } => {
            assert_eq!(stage, "dem");
            assert_eq!(path, config.grid.template);
        }
        other => panic!("unexpected {other:?}"),
    }
}

// ============================================================================
// Land-cover stage
// ============================================================================

fn write_tile(path: &Path, origin_x: f64, class: u16) {
    let tile = RasterBuffer::new(
        vec![class; 2 * 4],
        2,
        4,
        GeoTransform::from_origin(origin_x, 120.0, 30.0, 30.0),
        Some(UTM_44N),
        0u16,
    )
    .unwrap();
    write_geotiff(&tile, path).unwrap();
}

#[test]
fn test_lulc_stage_mosaics_tiles() {
    let dir = temp_test_dir();
    let config = setup(dir.path());
    let prep = preparer(&config);
    prep.run_stage(Stage::Grid).unwrap();

    write_tile(&config.lulc.tiles_dir.join("b_east.tif"), 60.0, 30);
    write_tile(&config.lulc.tiles_dir.join("a_west.tif"), 0.0, 10);
    fs::write(config.lulc.tiles_dir.join("README.txt"), "not a tile").unwrap();

    let report = prep.run_stage(Stage::Lulc).unwrap();
    assert_eq!(
        report.outputs,
        vec![
            config.lulc.input.clone(),
            config.lulc.aligned.clone(),
            config.lulc.fuel.clone()
        ]
    );

    let merged = read_geotiff::<u16>(&config.lulc.input).unwrap();
    assert_eq!((merged.width, merged.height), (4, 4));

    let aligned = read_geotiff::<u16>(&config.lulc.aligned).unwrap();
    assert_eq!(aligned.nodata, 0);
    for row in 0..4 {
        assert_eq!(aligned.get(0, row), Some(10));
        assert_eq!(aligned.get(1, row), Some(10));
        assert_eq!(aligned.get(2, row), Some(30));
        assert_eq!(aligned.get(3, row), Some(30));
    }

    let fuel = read_geotiff::<f32>(&config.lulc.fuel).unwrap();
    assert_approx_eq!(fuel.get(0, 0).unwrap(), 1.0, 1e-6);
    assert_approx_eq!(fuel.get(3, 3).unwrap(), 0.7, 1e-6);
}

#[test]
fn test_lulc_stage_without_tiles_or_input() {
    let dir = temp_test_dir();
    let config = setup(dir.path());
    let prep = preparer(&config);
    prep.run_stage(Stage::Grid).unwrap();

    let err = prep.run_stage(Stage::Lulc).unwrap_err();
    assert!(matches!(err, PrepareError::MissingInputFile { stage: "lulc", .. }));
}

// ============================================================================
// Weather stage
// ============================================================================

const APRIL_1: f64 = 1_711_929_600.0;

fn lonlat_grid() -> GridSpec {
    GridSpec::new(78.0, 30.0, 0.05, 4, 4, Crs::WGS84, 0.0).unwrap()
}

/// Three latitudes (descending) by four longitudes, `hours` hourly steps.
fn dataset(source: &str, hours: usize, fields: &[(&str, f32)]) -> GriddedDataset {
    let times: Vec<f64> = (0..hours).map(|h| APRIL_1 + h as f64 * 3600.0).collect();
    let mut ds = GriddedDataset::new(source)
        .with_coordinate("valid_time", times, Some("seconds since 1970-01-01"))
        .with_coordinate("latitude", vec![30.0, 29.75, 29.5], Some("degrees_north"))
        .with_coordinate("longitude", vec![78.0, 78.25, 78.5, 78.75], Some("degrees_east"));
    for (name, value) in fields {
        ds = ds.with_variable(
            *name,
            &["valid_time", "latitude", "longitude"],
            vec![*value; hours * 12],
        );
    }
    ds
}

fn instant(hours: usize) -> GriddedDataset {
    dataset(
        "instant.nc",
        hours,
        &[("u10", 3.0), ("v10", 4.0), ("t2m", 300.0), ("d2m", 300.0)],
    )
}

fn weather_config(root: &Path, policy: FailurePolicy, parallel: bool) -> PrepareConfig {
    let mut config = PrepareConfig::with_root(root).unwrap();
    config.weather.crop = None;
    config.weather.on_day_error = policy;
    config.weather.parallel = parallel;
    config
}

#[test]
fn test_weather_two_days() {
    let dir = temp_test_dir();
    let config = weather_config(dir.path(), FailurePolicy::Abort, true);
    let accum = dataset("accum.nc", 48, &[("tp", 0.0001)]);

    let report =
        weather::run_datasets(&instant(48), &accum, &config, &lonlat_grid(), &IdentityProvider)
            .unwrap();
    assert_eq!(report.outputs.len(), 10);
    assert!(report.skipped.is_empty());

    let out = &config.weather.output_dir;
    let expected = [
        ("wind_speed", 5.0),
        ("wind_dir", 36.869_9),
        ("t2m", 26.85),
        ("rh", 100.0),
        ("tp", 2.4),
    ];
    for date in ["2024-04-01", "2024-04-02"] {
        for (tag, value) in expected {
            let path = out.join(format!("{date}_{tag}_0.05m.tif"));
            let raster = read_geotiff::<f32>(&path).unwrap();
            assert_eq!(raster.shape(), (4, 4));
            assert_eq!(raster.crs, Some(Crs::WGS84));
            for v in &raster.data {
                assert_approx_eq!(*v, value, 1e-3);
            }
        }
    }
}

#[test]
fn test_weather_skip_policy() {
    let dir = temp_test_dir();
    let config = weather_config(dir.path(), FailurePolicy::Skip, false);
    // Precipitation only for the first day
    let accum = dataset("accum.nc", 24, &[("tp", 0.0001)]);

    let report =
        weather::run_datasets(&instant(48), &accum, &config, &lonlat_grid(), &IdentityProvider)
            .unwrap();
    assert_eq!(report.outputs.len(), 5);
    assert_eq!(report.skipped, vec!["2024-04-02".to_string()]);
    assert!(config
        .weather
        .output_dir
        .join("2024-04-01_tp_0.05m.tif")
        .exists());
}

#[test]
fn test_weather_abort_policy() {
    let dir = temp_test_dir();
    let config = weather_config(dir.path(), FailurePolicy::Abort, false);
    let accum = dataset("accum.nc", 24, &[("tp", 0.0001)]);

    let err = weather::run_datasets(&instant(48), &accum, &config, &lonlat_grid(), &IdentityProvider)
        .unwrap_err();
    match err {
        PrepareError::WeatherDay { date, .. } => assert_eq!(date, "2024-04-02"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_weather_missing_time_axis() {
    let dir = temp_test_dir();
    let config = weather_config(dir.path(), FailurePolicy::Abort, false);
    let accum = GriddedDataset::new("accum.nc")
        .with_coordinate("latitude", vec![30.0, 29.75], None)
        .with_coordinate("longitude", vec![78.0, 78.25], None)
        .with_variable("tp", &["latitude", "longitude"], vec![0.0; 4]);

    let err = weather::run_datasets(&instant(24), &accum, &config, &lonlat_grid(), &IdentityProvider)
        .unwrap_err();
    assert!(matches!(
        err,
        PrepareError::NetCdf(NetCdfError::MissingTimeCoordinate { .. })
    ));
}

#[test]
fn test_weather_missing_files() {
    let dir = temp_test_dir();
    let config = weather_config(dir.path(), FailurePolicy::Abort, false);
    let err = preparer(&config).run_stage(Stage::Weather).unwrap_err();
    match err {
        PrepareError::MissingInputFile { stage, path } => {
            assert_eq!(stage, "weather");
            assert_eq!(path, config.weather.instant);
        }
        other => panic!("unexpected {other:?}"),
    }
}
