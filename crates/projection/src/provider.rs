//! Transform traits and the identity implementation.

use grid_common::{BoundingBox, Crs};

use crate::error::{ProjectionError, ProjectionResult};

/// Points sampled along each bbox edge when reprojecting bounds.
const EDGE_SAMPLES: usize = 21;

/// A ready-to-use transform from one CRS into another.
pub trait CoordinateTransform: Send + Sync {
    fn source(&self) -> Crs;
    fn target(&self) -> Crs;

    /// Transform a single point. Geographic coordinates are lon/lat degrees.
    fn transform(&self, x: f64, y: f64) -> ProjectionResult<(f64, f64)>;

    /// True if no coordinate math happens.
    fn is_identity(&self) -> bool {
        self.source() == self.target()
    }
}

/// Factory for transforms between CRS pairs.
pub trait TransformProvider: Send + Sync {
    fn transformer(&self, from: Crs, to: Crs) -> ProjectionResult<Box<dyn CoordinateTransform>>;
}

/// Pass-through transform for a CRS onto itself.
#[derive(Debug, Clone, Copy)]
pub struct IdentityTransform {
    crs: Crs,
}

impl IdentityTransform {
    pub fn new(crs: Crs) -> Self {
        Self { crs }
    }
}

impl CoordinateTransform for IdentityTransform {
    fn source(&self) -> Crs {
        self.crs
    }

    fn target(&self) -> Crs {
        self.crs
    }

    fn transform(&self, x: f64, y: f64) -> ProjectionResult<(f64, f64)> {
        Ok((x, y))
    }
}

/// Provider that only supports same-CRS pairs. Used by tests and by runs
/// where every input already shares the target CRS.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityProvider;

impl TransformProvider for IdentityProvider {
    fn transformer(&self, from: Crs, to: Crs) -> ProjectionResult<Box<dyn CoordinateTransform>> {
        if from != to {
            return Err(ProjectionError::TransformFailed {
                from,
                to,
                x: f64::NAN,
                y: f64::NAN,
                reason: "identity provider cannot change CRS".to_string(),
            });
        }
        Ok(Box::new(IdentityTransform::new(from)))
    }
}

/// Reproject a bounding box by transforming points densified along its
/// edges and taking their envelope. Points that fail to transform are
/// skipped.
pub fn transform_bounds(
    transform: &dyn CoordinateTransform,
    bbox: &BoundingBox,
) -> ProjectionResult<BoundingBox> {
    if transform.is_identity() {
        return Ok(*bbox);
    }

    let step = |i: usize| i as f64 / (EDGE_SAMPLES - 1) as f64;
    let mut points = Vec::with_capacity(EDGE_SAMPLES * 4);
    for i in 0..EDGE_SAMPLES {
        let x = bbox.min_x + bbox.width() * step(i);
        let y = bbox.min_y + bbox.height() * step(i);
        points.push((x, bbox.min_y));
        points.push((x, bbox.max_y));
        points.push((bbox.min_x, y));
        points.push((bbox.max_x, y));
    }

    let projected = points
        .into_iter()
        .filter_map(|(x, y)| transform.transform(x, y).ok())
        .filter(|(x, y)| x.is_finite() && y.is_finite());

    BoundingBox::from_points(projected).ok_or(ProjectionError::EmptyBounds {
        from: transform.source(),
        to: transform.target(),
    })
}
