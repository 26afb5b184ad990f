//! GeoTIFF tag ids and the GeoKeyDirectory layout.

use grid_common::Crs;

pub const MODEL_PIXEL_SCALE_TAG: u16 = 33550;
pub const MODEL_TIEPOINT_TAG: u16 = 33922;
pub const MODEL_TRANSFORMATION_TAG: u16 = 34264;
pub const GEO_KEY_DIRECTORY_TAG: u16 = 34735;
pub const GDAL_NODATA_TAG: u16 = 42113;

const GT_MODEL_TYPE_GEO_KEY: u16 = 1024;
const GT_RASTER_TYPE_GEO_KEY: u16 = 1025;
const GEOGRAPHIC_TYPE_GEO_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_GEO_KEY: u16 = 3072;

const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;
const RASTER_PIXEL_IS_POINT: u16 = 2;
const USER_DEFINED: u16 = 32767;

/// Build a GeoKeyDirectory for an EPSG-coded CRS.
pub fn encode(crs: Crs, geographic: bool) -> Vec<u16> {
    let mut keys = vec![1, 1, 0, 3];
    keys.extend_from_slice(&[
        GT_MODEL_TYPE_GEO_KEY,
        0,
        1,
        if geographic {
            MODEL_TYPE_GEOGRAPHIC
        } else {
            MODEL_TYPE_PROJECTED
        },
    ]);
    keys.extend_from_slice(&[GT_RASTER_TYPE_GEO_KEY, 0, 1, RASTER_PIXEL_IS_AREA]);
    let crs_key = if geographic {
        GEOGRAPHIC_TYPE_GEO_KEY
    } else {
        PROJECTED_CS_TYPE_GEO_KEY
    };
    keys.extend_from_slice(&[crs_key, 0, 1, crs.code()]);
    keys
}

/// Keys relevant to georeferencing, decoded from a GeoKeyDirectory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeoKeys {
    pub crs: Option<Crs>,
    pub pixel_is_point: bool,
}

/// Decode the directory. Only inline (location 0) short values are read;
/// user-defined CRSs yield `crs: None`.
pub fn decode(directory: &[u16]) -> GeoKeys {
    let mut keys = GeoKeys::default();
    if directory.len() < 4 {
        return keys;
    }
    let count = directory[3] as usize;

    let mut projected = None;
    let mut geographic = None;
    for entry in directory[4..].chunks_exact(4).take(count) {
        let (id, location, value) = (entry[0], entry[1], entry[3]);
        if location != 0 {
            continue;
        }
        match id {
            GT_RASTER_TYPE_GEO_KEY => keys.pixel_is_point = value == RASTER_PIXEL_IS_POINT,
            PROJECTED_CS_TYPE_GEO_KEY if value != USER_DEFINED => projected = Some(value),
            GEOGRAPHIC_TYPE_GEO_KEY if value != USER_DEFINED => geographic = Some(value),
            _ => {}
        }
    }

    // A projected CRS also carries its base geographic CRS
    keys.crs = projected.or(geographic).map(Crs::epsg);
    keys
}

/// GDAL_NODATA text for a nodata value.
pub fn format_nodata(nodata: f64) -> String {
    if nodata.is_nan() {
        "nan".to_string()
    } else {
        format!("{nodata}")
    }
}

pub fn parse_nodata(text: &str) -> Option<f64> {
    let trimmed = text.trim().trim_end_matches('\0');
    match trimmed.to_lowercase().as_str() {
        "nan" | "-nan" => Some(f64::NAN),
        other => other.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_projected() {
        let dir = encode(Crs::epsg(32644), false);
        assert_eq!(dir.len(), 16);
        let keys = decode(&dir);
        assert_eq!(keys.crs, Some(Crs::epsg(32644)));
        assert!(!keys.pixel_is_point);
    }

    #[test]
    fn test_projected_wins_over_geographic() {
        let dir = vec![
            1, 1, 0, 3, //
            1024, 0, 1, 1, //
            2048, 0, 1, 4326, //
            3072, 0, 1, 32644,
        ];
        assert_eq!(decode(&dir).crs, Some(Crs::epsg(32644)));
    }

    #[test]
    fn test_user_defined_and_truncated() {
        let dir = vec![1, 1, 0, 1, 3072, 0, 1, USER_DEFINED];
        assert_eq!(decode(&dir).crs, None);
        assert_eq!(decode(&[1, 1]).crs, None);
    }

    #[test]
    fn test_nodata_text() {
        assert!(parse_nodata(&format_nodata(f64::NAN)).unwrap().is_nan());
        assert_eq!(parse_nodata("-9999"), Some(-9999.0));
        assert_eq!(parse_nodata("0\0"), Some(0.0));
        assert_eq!(format_nodata(0.0), "0");
        assert_eq!(parse_nodata("none"), None);
    }
}
