//! EPSG transforms using proj4rs and the crs-definitions database.

use grid_common::Crs;
use proj4rs::proj::Proj;
use tracing::debug;

use crate::error::{ProjectionError, ProjectionResult};
use crate::provider::{CoordinateTransform, IdentityTransform, TransformProvider};

/// Get the PROJ string for a CRS from the crs-definitions database.
pub fn proj_string(crs: Crs) -> Option<&'static str> {
    crs_definitions::from_code(crs.code()).map(|def| def.proj4)
}

/// Whether a CRS uses lon/lat coordinates. Codes missing from the database
/// fall back to the EPSG 4000-4999 geographic range.
pub fn is_geographic(crs: Crs) -> bool {
    match proj_string(crs) {
        Some(definition) => is_longlat(definition),
        None => (4000..5000).contains(&crs.code()),
    }
}

fn is_longlat(definition: &str) -> bool {
    definition.contains("+proj=longlat") || definition.contains("+proj=latlong")
}

fn build_proj(crs: Crs) -> ProjectionResult<(Proj, bool)> {
    let definition = proj_string(crs).ok_or(ProjectionError::UnknownCrs(crs))?;
    let proj = Proj::from_proj_string(definition).map_err(|e| ProjectionError::InvalidDefinition {
        crs,
        reason: format!("{e:?}"),
    })?;
    Ok((proj, is_longlat(definition)))
}

/// A compiled source/target projection pair.
pub struct Proj4Transform {
    from: Crs,
    to: Crs,
    source_proj: Proj,
    target_proj: Proj,
    /// proj4rs works in radians for geographic CRSs
    source_is_geographic: bool,
    target_is_geographic: bool,
}

impl Proj4Transform {
    pub fn new(from: Crs, to: Crs) -> ProjectionResult<Self> {
        let (source_proj, source_is_geographic) = build_proj(from)?;
        let (target_proj, target_is_geographic) = build_proj(to)?;
        debug!(from = %from, to = %to, "Built proj4rs transform");
        Ok(Self {
            from,
            to,
            source_proj,
            target_proj,
            source_is_geographic,
            target_is_geographic,
        })
    }
}

impl CoordinateTransform for Proj4Transform {
    fn source(&self) -> Crs {
        self.from
    }

    fn target(&self) -> Crs {
        self.to
    }

    fn transform(&self, x: f64, y: f64) -> ProjectionResult<(f64, f64)> {
        let (x_in, y_in) = if self.source_is_geographic {
            (x.to_radians(), y.to_radians())
        } else {
            (x, y)
        };

        let mut point = (x_in, y_in, 0.0);
        proj4rs::transform::transform(&self.source_proj, &self.target_proj, &mut point).map_err(
            |e| ProjectionError::TransformFailed {
                from: self.from,
                to: self.to,
                x,
                y,
                reason: format!("{e:?}"),
            },
        )?;

        let out = if self.target_is_geographic {
            (point.0.to_degrees(), point.1.to_degrees())
        } else {
            (point.0, point.1)
        };
        if !out.0.is_finite() || !out.1.is_finite() {
            return Err(ProjectionError::TransformFailed {
                from: self.from,
                to: self.to,
                x,
                y,
                reason: "result is not finite".to_string(),
            });
        }
        Ok(out)
    }
}

/// Default provider: any EPSG code known to crs-definitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Proj4Provider;

impl Proj4Provider {
    pub fn new() -> Self {
        Self
    }
}

impl TransformProvider for Proj4Provider {
    fn transformer(&self, from: Crs, to: Crs) -> ProjectionResult<Box<dyn CoordinateTransform>> {
        if from == to {
            return Ok(Box::new(IdentityTransform::new(from)));
        }
        Ok(Box::new(Proj4Transform::new(from, to)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::transform_bounds;
    use grid_common::BoundingBox;

    #[test]
    fn test_wgs84_is_geographic() {
        assert!(is_geographic(Crs::WGS84));
        assert!(!is_geographic(Crs::epsg(32644)));
    }

    #[test]
    fn test_unknown_code() {
        let provider = Proj4Provider::new();
        let err = provider.transformer(Crs::WGS84, Crs::epsg(1)).err().unwrap();
        assert!(matches!(err, ProjectionError::UnknownCrs(_)));
    }

    #[test]
    fn test_utm_central_meridian() {
        // Zone 44N central meridian is 81E; false easting 500 km
        let t = Proj4Provider::new()
            .transformer(Crs::WGS84, Crs::epsg(32644))
            .unwrap();
        let (x, y) = t.transform(81.0, 0.0).unwrap();
        assert!((x - 500_000.0).abs() < 1e-3, "x = {x}");
        assert!(y.abs() < 1e-3, "y = {y}");
    }

    #[test]
    fn test_utm_roundtrip() {
        let provider = Proj4Provider::new();
        let fwd = provider.transformer(Crs::WGS84, Crs::epsg(32644)).unwrap();
        let inv = provider.transformer(Crs::epsg(32644), Crs::WGS84).unwrap();

        let (lon, lat) = (79.5, 30.25);
        let (x, y) = fwd.transform(lon, lat).unwrap();
        let (lon2, lat2) = inv.transform(x, y).unwrap();
        assert!((lon - lon2).abs() < 1e-7);
        assert!((lat - lat2).abs() < 1e-7);
    }

    #[test]
    fn test_same_crs_is_noop() {
        let t = Proj4Provider::new()
            .transformer(Crs::epsg(32644), Crs::epsg(32644))
            .unwrap();
        assert!(t.is_identity());
        assert_eq!(t.transform(123.0, 456.0).unwrap(), (123.0, 456.0));
    }

    #[test]
    fn test_transform_bounds_contains_corners() {
        let t = Proj4Provider::new()
            .transformer(Crs::WGS84, Crs::epsg(32644))
            .unwrap();
        let bbox = BoundingBox::new(79.0, 30.0, 80.0, 31.0);
        let out = transform_bounds(t.as_ref(), &bbox).unwrap();
        for (lon, lat) in [(79.0, 30.0), (80.0, 31.0), (79.0, 31.0), (80.0, 30.0)] {
            let (x, y) = t.transform(lon, lat).unwrap();
            assert!(out.contains_point(x, y));
        }
        assert!(out.width() > 90_000.0 && out.width() < 110_000.0);
    }
}
