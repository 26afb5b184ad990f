//! Common test fixtures for raster preparation tests.

use grid_common::{Crs, GridSpec};

/// UTM zone 44N, the projected CRS used across fixtures.
pub const UTM_44N: Crs = Crs::epsg(32644);

/// A `width x height` grid of 30 m cells on UTM 44N with its top-left
/// corner at `(origin_x, origin_y)`.
pub fn utm_grid(origin_x: f64, origin_y: f64, width: usize, height: usize) -> GridSpec {
    GridSpec {
        origin_x,
        origin_y,
        pixel_size: 30.0,
        width,
        height,
        crs: UTM_44N,
        nodata: 0.0,
    }
}

/// AOI GeoJSON documents.
pub mod aoi {
    /// FeatureCollection with one lon/lat polygon.
    pub const LONLAT_SQUARE: &str = r#"{
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {"name": "study area"},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[79.0, 30.0], [79.2, 30.0], [79.2, 30.2], [79.0, 30.2], [79.0, 30.0]]]
            }
        }]
    }"#;

    /// Bare projected polygon (UTM 44N) covering 0..100 m.
    pub const PROJECTED_SQUARE: &str = r#"{
        "type": "Polygon",
        "coordinates": [[[0.0, 0.0], [100.0, 0.0], [100.0, 100.0], [0.0, 100.0], [0.0, 0.0]]]
    }"#;

    /// FeatureCollection with no features.
    pub const EMPTY: &str = r#"{"type": "FeatureCollection", "features": []}"#;
}

/// Land-cover class codes (ESA WorldCover).
pub mod landcover {
    pub const TREE_COVER: u16 = 10;
    pub const SHRUBLAND: u16 = 20;
    pub const GRASSLAND: u16 = 30;
    pub const CROPLAND: u16 = 40;
    pub const BUILT_UP: u16 = 50;
    pub const BARE: u16 = 60;
    pub const SNOW_ICE: u16 = 70;
    pub const WATER: u16 = 80;
    pub const WETLAND: u16 = 90;
}
