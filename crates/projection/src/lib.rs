//! Coordinate reference system transformations.
//!
//! CRS math is exposed as a capability: stages ask a [`TransformProvider`]
//! for a [`CoordinateTransform`] between two [`Crs`] values and never touch
//! projection formulas themselves. [`Proj4Provider`] resolves EPSG codes
//! through the `crs-definitions` database and transforms with `proj4rs`.

pub mod error;
pub mod proj4;
pub mod provider;

pub use error::{ProjectionError, ProjectionResult};
pub use grid_common::Crs;
pub use proj4::{is_geographic, proj_string, Proj4Provider, Proj4Transform};
pub use provider::{
    transform_bounds, CoordinateTransform, IdentityProvider, IdentityTransform, TransformProvider,
};
