//! Benchmarks for resampling onto a target grid.
//!
//! Run with: cargo bench --package grid-processor --bench resample_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use grid_common::{Crs, GeoTransform, GridSpec};
use grid_processor::{InterpolationMethod, RasterBuffer, Resampler};
use projection::{IdentityProvider, Proj4Provider};
use test_utils::create_plane_grid;

/// 10 m DEM-like source covering the target with margin.
fn create_source(size: usize) -> RasterBuffer<f32> {
    let data = create_plane_grid(size, size, 10.0, 500.0, 0.2, 0.1);
    RasterBuffer::new(
        data,
        size,
        size,
        GeoTransform::from_origin(500_000.0, 3_300_000.0 + size as f64 * 10.0, 10.0, 10.0),
        Some(Crs::epsg(32644)),
        f32::NAN,
    )
    .unwrap()
}

fn target_grid(size: usize) -> GridSpec {
    let cells = size * 10 / 30;
    GridSpec::new(
        500_000.0,
        3_300_000.0 + size as f64 * 10.0,
        30.0,
        cells,
        cells,
        Crs::epsg(32644),
        f64::NAN,
    )
    .unwrap()
}

fn bench_same_crs(c: &mut Criterion) {
    let mut group = c.benchmark_group("resample_same_crs");

    for size in [300, 900, 1800] {
        let source = create_source(size);
        let grid = target_grid(size);
        group.throughput(Throughput::Elements(grid.len() as u64));

        for method in [InterpolationMethod::Nearest, InterpolationMethod::Bilinear] {
            group.bench_with_input(
                BenchmarkId::new(method.to_string(), size),
                &(&source, &grid),
                |b, (source, grid)| {
                    let resampler = Resampler::new(grid, &IdentityProvider);
                    b.iter(|| {
                        resampler
                            .resample(black_box(*source), method, f32::NAN)
                            .unwrap()
                    })
                },
            );
        }
    }

    group.finish();
}

fn bench_reproject(c: &mut Criterion) {
    let mut group = c.benchmark_group("resample_reproject");
    let provider = Proj4Provider::new();

    // 0.25 degree ERA5-like field onto a 30 m UTM grid
    let era5 = RasterBuffer::new(
        vec![290.0f32; 40 * 40],
        40,
        40,
        GeoTransform::from_origin(75.0, 35.0, 0.25, 0.25),
        Some(Crs::WGS84),
        f32::NAN,
    )
    .unwrap();
    let grid = GridSpec::new(300_000.0, 3_400_000.0, 30.0, 500, 500, Crs::epsg(32644), f64::NAN).unwrap();
    group.throughput(Throughput::Elements(grid.len() as u64));

    group.bench_function("era5_to_utm_bilinear", |b| {
        let resampler = Resampler::new(&grid, &provider);
        b.iter(|| {
            resampler
                .resample(black_box(&era5), InterpolationMethod::Bilinear, f32::NAN)
                .unwrap()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_same_crs, bench_reproject);
criterion_main!(benches);
