//! Area of interest read from GeoJSON.

use std::fs;
use std::path::Path;

use geo::{BoundingRect, Geometry, MapCoords, MultiPolygon};
use geojson::GeoJson;
use grid_common::{BoundingBox, Crs, GridError};
use projection::{ProjectionError, TransformProvider};
use tracing::{debug, warn};

use crate::error::{PrepareError, Result};

/// Union footprint of the polygons in a GeoJSON document.
#[derive(Debug, Clone, PartialEq)]
pub struct Aoi {
    pub footprint: MultiPolygon<f64>,
    pub crs: Crs,
    /// Label used in logs and errors, usually the source path.
    pub source: String,
}

fn collect_polygons(geometry: Geometry<f64>, out: &mut Vec<geo::Polygon<f64>>, skipped: &mut usize) {
    match geometry {
        Geometry::Polygon(p) => out.push(p),
        Geometry::MultiPolygon(mp) => out.extend(mp.0),
        Geometry::GeometryCollection(gc) => {
            for g in gc.0 {
                collect_polygons(g, out, skipped);
            }
        }
        _ => *skipped += 1,
    }
}

impl Aoi {
    /// Read a Feature, FeatureCollection or bare geometry file.
    pub fn read(path: &Path, crs: Crs) -> Result<Self> {
        if !path.exists() {
            return Err(PrepareError::missing_input("aoi", path));
        }
        let text = fs::read_to_string(path)?;
        Self::from_geojson_str(&text, crs, &path.display().to_string())
    }

    pub fn from_geojson_str(text: &str, crs: Crs, source: &str) -> Result<Self> {
        let aoi_error = |reason: String| PrepareError::Aoi {
            path: source.to_string(),
            reason,
        };
        let geojson: GeoJson = text.parse().map_err(|e| aoi_error(format!("{e}")))?;

        let geometries: Vec<geojson::Geometry> = match geojson {
            GeoJson::FeatureCollection(fc) => {
                fc.features.into_iter().filter_map(|f| f.geometry).collect()
            }
            GeoJson::Feature(f) => f.geometry.into_iter().collect(),
            GeoJson::Geometry(g) => vec![g],
        };

        let mut polygons = Vec::new();
        let mut skipped = 0usize;
        for g in geometries {
            let geometry = Geometry::<f64>::try_from(g).map_err(|e| aoi_error(format!("{e}")))?;
            collect_polygons(geometry, &mut polygons, &mut skipped);
        }
        if skipped > 0 {
            warn!(aoi = %source, skipped, "Ignoring non-polygon geometries");
        }
        if polygons.is_empty() {
            return Err(GridError::invalid_geometry(source, "no polygon geometries").into());
        }

        debug!(aoi = %source, polygons = polygons.len(), crs = %crs, "Read area of interest");
        Ok(Self {
            footprint: MultiPolygon::new(polygons),
            crs,
            source: source.to_string(),
        })
    }

    /// Reproject every vertex into `target`.
    pub fn to_crs(&self, provider: &dyn TransformProvider, target: Crs) -> Result<Self> {
        if target == self.crs {
            return Ok(self.clone());
        }
        let transform = provider.transformer(self.crs, target)?;
        let transform = transform.as_ref();
        let footprint = self
            .footprint
            .try_map_coords(|c| -> std::result::Result<geo::Coord<f64>, ProjectionError> {
                let (x, y) = transform.transform(c.x, c.y)?;
                Ok(geo::Coord { x, y })
            })?;
        Ok(Self {
            footprint,
            crs: target,
            source: self.source.clone(),
        })
    }

    /// Bounding box of the footprint in its own CRS.
    pub fn bounds(&self) -> Result<BoundingBox> {
        let rect = self
            .footprint
            .bounding_rect()
            .ok_or_else(|| GridError::invalid_geometry(&self.source, "footprint is empty"))?;
        let bbox = BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y);
        if !bbox.is_valid() {
            return Err(GridError::invalid_geometry(&self.source, "footprint bounds are not finite").into());
        }
        Ok(bbox)
    }
}
