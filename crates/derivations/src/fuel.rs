//! Land-cover class to fuel score.

use grid_processor::RasterBuffer;

/// Score for classes missing from the table.
pub const DEFAULT_FUEL_SCORE: f32 = 0.2;

/// ESA WorldCover classes and their relative fuel load.
const WORLDCOVER_FUEL: [(u16, f32); 8] = [
    (10, 1.0), // tree cover
    (20, 0.7), // shrubland
    (30, 0.7), // grassland
    (40, 0.5), // cropland
    (60, 0.1), // bare / sparse vegetation
    (50, 0.0), // built-up
    (80, 0.0), // permanent water
    (90, 0.4), // herbaceous wetland
];

/// Fuel score for a land-cover code using the WorldCover table.
pub fn classify(code: u16) -> f32 {
    WORLDCOVER_FUEL
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, s)| *s)
        .unwrap_or(DEFAULT_FUEL_SCORE)
}

/// [`classify`] applied to every cell; nodata becomes NaN.
pub fn classify_raster(landcover: &RasterBuffer<u16>) -> RasterBuffer<f32> {
    landcover.map_valid(f32::NAN, classify)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{landcover, utm_grid};

    #[test]
    fn test_classify_table() {
        assert_eq!(classify(landcover::TREE_COVER), 1.0);
        assert_eq!(classify(landcover::SHRUBLAND), 0.7);
        assert_eq!(classify(landcover::GRASSLAND), 0.7);
        assert_eq!(classify(landcover::CROPLAND), 0.5);
        assert_eq!(classify(landcover::BARE), 0.1);
        assert_eq!(classify(landcover::BUILT_UP), 0.0);
        assert_eq!(classify(landcover::WATER), 0.0);
        assert_eq!(classify(landcover::WETLAND), 0.4);
    }

    #[test]
    fn test_unknown_codes_use_default() {
        assert_eq!(classify(999), 0.2);
        // Snow and ice is not in the table
        assert_eq!(classify(70), 0.2);
        assert_eq!(classify(95), 0.2);
    }

    #[test]
    fn test_classify_raster_nodata() {
        let grid = utm_grid(0.0, 60.0, 2, 2);
        let lc = RasterBuffer::from_grid(&grid, vec![10u16, 0, 50, 999], 0).unwrap();
        let fuel = classify_raster(&lc);

        assert_eq!(fuel.data[0], 1.0);
        assert!(fuel.data[1].is_nan());
        assert_eq!(fuel.data[2], 0.0);
        assert_eq!(fuel.data[3], 0.2);
        assert!(fuel.nodata.is_nan());
        assert!(fuel.is_on_grid(&grid));
    }

    #[test]
    fn test_classify_raster_matches_classify() {
        let codes = vec![10u16, 20, 30, 40, 50, 60, 70, 80, 90, 95, 100, 65535];
        let grid = utm_grid(0.0, 30.0 * codes.len() as f64, codes.len(), 1);
        let lc = RasterBuffer::from_grid(&grid, codes.clone(), 0).unwrap();
        let fuel = classify_raster(&lc);
        for (code, score) in codes.iter().zip(&fuel.data) {
            assert_eq!(*score, classify(*code), "code {code}");
        }
    }
}
