//! Raster readers.

pub mod geotiff_reader;

pub use geotiff_reader::{read_geotiff, read_grid_spec, read_metadata, RasterMetadata};
