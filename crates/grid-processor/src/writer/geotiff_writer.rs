//! GeoTIFF writer for single-band rasters.
//!
//! Writes ModelPixelScale, ModelTiepoint, GeoKeyDirectory and GDAL_NODATA
//! tags so the output opens georeferenced in GDAL-based tools.

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use tiff::encoder::{Compression, DeflateLevel, TiffEncoder, TiffValue};
use tiff::tags::Tag;
use tracing::debug;

use crate::error::{GridProcessorError, Result};
use crate::geokeys;
use crate::types::{Pixel, RasterBuffer};

/// Compression method for GeoTIFF output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeoTiffCompression {
    None,
    Lzw,
    /// Deflate (zlib), the default for prepared layers.
    #[default]
    Deflate,
}

impl GeoTiffCompression {
    fn to_tiff(self) -> Compression {
        match self {
            Self::None => Compression::Uncompressed,
            Self::Lzw => Compression::Lzw,
            Self::Deflate => Compression::Deflate(DeflateLevel::Fast),
        }
    }
}

/// Builder for configuring GeoTIFF output.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoTiffWriter {
    compression: GeoTiffCompression,
}

impl GeoTiffWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compression(mut self, compression: GeoTiffCompression) -> Self {
        self.compression = compression;
        self
    }

    /// Write `raster` to `path`, creating parent directories as needed.
    pub fn write<T: Pixel>(&self, raster: &RasterBuffer<T>, path: &Path) -> Result<()>
    where
        [T]: TiffValue,
    {
        let path_str = path.display().to_string();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        self.write_to(raster, BufWriter::new(file))
            .map_err(|e| GridProcessorError::write_failed(&path_str, e))?;

        debug!(
            path = %path_str,
            width = raster.width,
            height = raster.height,
            compression = ?self.compression,
            "Wrote GeoTIFF"
        );
        Ok(())
    }

    /// Write to any writer that implements `Write + Seek`.
    pub fn write_to<T: Pixel, W: Write + Seek>(
        &self,
        raster: &RasterBuffer<T>,
        writer: W,
    ) -> std::result::Result<(), tiff::TiffError>
    where
        [T]: TiffValue,
    {
        let mut encoder = TiffEncoder::new(writer)?.with_compression(self.compression.to_tiff());
        let mut image = encoder.new_image::<T::TiffColor>(raster.width as u32, raster.height as u32)?;

        let gt = raster.transform;
        if gt.is_rectilinear() && gt.a > 0.0 && gt.e < 0.0 {
            let pixel_scale = [gt.a, -gt.e, 0.0];
            image
                .encoder()
                .write_tag(Tag::Unknown(geokeys::MODEL_PIXEL_SCALE_TAG), &pixel_scale[..])?;

            // Ties pixel (0, 0) to the top-left corner
            let tiepoint = [0.0, 0.0, 0.0, gt.c, gt.f, 0.0];
            image
                .encoder()
                .write_tag(Tag::Unknown(geokeys::MODEL_TIEPOINT_TAG), &tiepoint[..])?;
        } else {
            let matrix = [
                gt.a, gt.b, 0.0, gt.c, //
                gt.d, gt.e, 0.0, gt.f, //
                0.0, 0.0, 0.0, 0.0, //
                0.0, 0.0, 0.0, 1.0,
            ];
            image
                .encoder()
                .write_tag(Tag::Unknown(geokeys::MODEL_TRANSFORMATION_TAG), &matrix[..])?;
        }

        if let Some(crs) = raster.crs {
            let directory = geokeys::encode(crs, projection::is_geographic(crs));
            image
                .encoder()
                .write_tag(Tag::Unknown(geokeys::GEO_KEY_DIRECTORY_TAG), &directory[..])?;
        }

        let nodata = geokeys::format_nodata(raster.nodata.as_f64());
        image
            .encoder()
            .write_tag(Tag::Unknown(geokeys::GDAL_NODATA_TAG), nodata.as_str())?;

        image.write_data(&raster.data)
    }
}

/// Write with the default (deflate) settings.
pub fn write_geotiff<T: Pixel>(raster: &RasterBuffer<T>, path: &Path) -> Result<()>
where
    [T]: TiffValue,
{
    GeoTiffWriter::new().write(raster, path)
}
