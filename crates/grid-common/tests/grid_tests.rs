//! Snapping properties of GridSpec over a range of extents.

use grid_common::{BoundingBox, Crs, GridSpec};

// ============================================================================
// Outward snapping
// ============================================================================

#[test]
fn test_snapped_grid_covers_input() {
    let pixel = 30.0;
    let cases = [
        (0.0, 0.0, 100.0, 100.0),
        (1.5, 2.5, 3.5, 4.5),
        (-1234.5, 9876.25, 4321.0, 12000.0),
        (500_000.0, 3_300_000.0, 512_345.6, 3_321_987.3),
        (299_999.9999, 3_299_999.9999, 300_090.0001, 3_300_090.0001),
        (599_999.99999, 1_999_999.999999, 600_029.999999, 2_000_000.00001),
    ];

    for (min_x, min_y, max_x, max_y) in cases {
        let bbox = BoundingBox::new(min_x, min_y, max_x, max_y);
        let grid = GridSpec::from_bounds(&bbox, pixel, Crs::epsg(32644), 0.0).unwrap();
        let b = grid.bounds();

        assert!(b.min_x <= bbox.min_x && b.min_y <= bbox.min_y);
        assert!(b.max_x >= bbox.max_x && b.max_y >= bbox.max_y);

        // Extent is a whole number of pixels
        assert!(((b.max_x - b.min_x) / pixel).fract().abs() < 1e-9);
        assert!(((b.max_y - b.min_y) / pixel).fract().abs() < 1e-9);

        // Origin is pixel aligned
        assert!((b.min_x / pixel - (b.min_x / pixel).round()).abs() < 1e-9);
        assert!((b.max_y / pixel - (b.max_y / pixel).round()).abs() < 1e-9);

        // No more than one extra pixel on each side
        assert!(bbox.min_x - b.min_x < pixel);
        assert!(b.max_x - bbox.max_x < pixel);
    }
}

#[test]
fn test_already_aligned_extent_unchanged() {
    let bbox = BoundingBox::new(300.0, 600.0, 900.0, 1200.0);
    let grid = GridSpec::from_bounds(&bbox, 30.0, Crs::epsg(32644), 0.0).unwrap();
    assert_eq!(grid.bounds(), bbox);
    assert_eq!(grid.shape(), (20, 20));
    assert_eq!(grid.len(), 400);
}

#[test]
fn test_serde_roundtrip_keeps_crs() {
    let grid = GridSpec::new(10.0, 20.0, 30.0, 3, 2, Crs::epsg(32644), 0.0).unwrap();
    let json = serde_json::to_string(&grid).unwrap();
    assert!(json.contains("EPSG:32644"));
    let back: GridSpec = serde_json::from_str(&json).unwrap();
    assert_eq!(back, grid);
}
