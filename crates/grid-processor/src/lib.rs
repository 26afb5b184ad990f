//! Raster processing for the preparation pipeline.
//!
//! This crate holds single-band rasters in memory and aligns them to a
//! fixed target grid:
//!
//! - **Resampling**: nearest and bilinear warps through a pluggable CRS
//!   transform, nodata-aware
//! - **Mosaicking**: first-valid-wins merge of tiles
//! - **Clipping**: crop to a window and mask to a polygon footprint
//! - **GeoTIFF I/O**: deflate-compressed output with georeferencing tags
//!
//! # Architecture
//!
//! ```text
//! GeoTIFF / NetCDF source
//!      │
//!      ▼
//! RasterBuffer<S>  ──► clip_to_polygon / mosaic
//!      │
//!      ▼
//! Resampler::resample(source, method, nodata)
//!      │
//!      ├─► target cell center (GridSpec affine)
//!      ├─► TransformProvider: target CRS → source CRS
//!      └─► inverse source affine → nearest / bilinear sample
//!               │
//!               ▼
//!          RasterBuffer<T> on GridSpec ──► write_geotiff
//! ```

pub mod clip;
pub mod error;
pub mod geokeys;
pub mod mosaic;
pub mod projection;
pub mod reader;
pub mod types;
pub mod writer;

// Re-export commonly used types at crate root
pub use clip::{clip_to_polygon, crop_to_bounds};
pub use error::{GridProcessorError, Result};
pub use mosaic::mosaic;
pub use projection::{bilinear_interpolate, nearest_interpolate, resample, Resampler};
pub use reader::{read_geotiff, read_grid_spec, read_metadata, RasterMetadata};
pub use types::{InterpolationMethod, Pixel, RasterBuffer};
pub use writer::{write_geotiff, GeoTiffCompression, GeoTiffWriter};
