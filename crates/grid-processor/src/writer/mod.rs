//! Raster writers.

pub mod geotiff_writer;

pub use geotiff_writer::{write_geotiff, GeoTiffCompression, GeoTiffWriter};
