//! Common types shared across the raster preparation crates.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod grid;
pub mod time;
pub mod transform;

pub use bbox::BoundingBox;
pub use crs::Crs;
pub use error::{GridError, GridResult};
pub use grid::GridSpec;
pub use time::{group_by_day, DayGroup};
pub use transform::GeoTransform;
