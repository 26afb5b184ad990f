//! GeoTIFF reader for single-band rasters.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use grid_common::{Crs, GeoTransform, GridSpec};
use num_traits::NumCast;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;
use tracing::debug;

use crate::error::{GridProcessorError, Result};
use crate::geokeys;
use crate::types::{Pixel, RasterBuffer};

/// Relative tolerance for treating a pixel as square.
const SQUARE_TOLERANCE: f64 = 1e-9;

/// Georeferencing read from a GeoTIFF without decoding pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterMetadata {
    pub width: usize,
    pub height: usize,
    pub transform: GeoTransform,
    pub crs: Option<Crs>,
    pub nodata: Option<f64>,
}

fn open(path: &Path) -> Result<Decoder<BufReader<File>>> {
    let file = File::open(path)?;
    Decoder::new(BufReader::new(file))
        .map_err(|e| GridProcessorError::read_failed(path.display().to_string(), e))
}

fn decode_metadata<R: Read + Seek>(decoder: &mut Decoder<R>, path: &Path) -> Result<RasterMetadata> {
    let (width, height) = decoder
        .dimensions()
        .map_err(|e| GridProcessorError::read_failed(path.display().to_string(), e))?;

    let keys = decoder
        .get_tag_u16_vec(Tag::Unknown(geokeys::GEO_KEY_DIRECTORY_TAG))
        .map(|dir| geokeys::decode(&dir))
        .unwrap_or_default();

    let transform = read_transform(decoder, keys.pixel_is_point).ok_or_else(|| {
        GridProcessorError::invalid_metadata(
            path.display().to_string(),
            "no ModelPixelScale/ModelTiepoint or ModelTransformation tags",
        )
    })?;

    let nodata = decoder
        .get_tag_ascii_string(Tag::Unknown(geokeys::GDAL_NODATA_TAG))
        .ok()
        .and_then(|text| geokeys::parse_nodata(&text));

    Ok(RasterMetadata {
        width: width as usize,
        height: height as usize,
        transform,
        crs: keys.crs,
        nodata,
    })
}

fn read_transform<R: Read + Seek>(decoder: &mut Decoder<R>, pixel_is_point: bool) -> Option<GeoTransform> {
    let scale = decoder
        .get_tag_f64_vec(Tag::Unknown(geokeys::MODEL_PIXEL_SCALE_TAG))
        .ok();
    let tiepoint = decoder
        .get_tag_f64_vec(Tag::Unknown(geokeys::MODEL_TIEPOINT_TAG))
        .ok();

    let mut transform = match (scale, tiepoint) {
        (Some(scale), Some(tie)) if scale.len() >= 2 && tie.len() >= 6 => {
            // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
            let origin_x = tie[3] - tie[0] * scale[0];
            let origin_y = tie[4] + tie[1] * scale[1];
            GeoTransform::from_origin(origin_x, origin_y, scale[0], scale[1])
        }
        _ => {
            let m = decoder
                .get_tag_f64_vec(Tag::Unknown(geokeys::MODEL_TRANSFORMATION_TAG))
                .ok()?;
            if m.len() < 8 {
                return None;
            }
            GeoTransform::new(m[0], m[1], m[3], m[4], m[5], m[7])
        }
    };

    if pixel_is_point {
        // Shift from pixel centers to pixel corners
        let (c, f) = transform.apply(-0.5, -0.5);
        transform.c = c;
        transform.f = f;
    }
    Some(transform)
}

/// Read georeferencing only.
pub fn read_metadata(path: &Path) -> Result<RasterMetadata> {
    let mut decoder = open(path)?;
    decode_metadata(&mut decoder, path)
}

macro_rules! convert_samples {
    ($buf:expr, $nodata:expr) => {
        $buf.into_iter()
            .map(|v| <T as NumCast>::from(v).unwrap_or($nodata))
            .collect::<Vec<T>>()
    };
}

/// Read the first band of a GeoTIFF as `T`.
///
/// Samples that do not fit `T` become nodata. The nodata value comes from
/// the GDAL_NODATA tag when it is representable in `T`, otherwise
/// [`Pixel::default_nodata`].
pub fn read_geotiff<T: Pixel>(path: &Path) -> Result<RasterBuffer<T>> {
    let path_str = path.display().to_string();
    let mut decoder = open(path)?;
    let meta = decode_metadata(&mut decoder, path)?;

    let nodata = meta
        .nodata
        .and_then(T::from_f64)
        .unwrap_or_else(T::default_nodata);

    let image = decoder
        .read_image()
        .map_err(|e| GridProcessorError::read_failed(&path_str, e))?;

    let data: Vec<T> = match image {
        DecodingResult::U8(buf) => convert_samples!(buf, nodata),
        DecodingResult::U16(buf) => convert_samples!(buf, nodata),
        DecodingResult::U32(buf) => convert_samples!(buf, nodata),
        DecodingResult::U64(buf) => convert_samples!(buf, nodata),
        DecodingResult::I8(buf) => convert_samples!(buf, nodata),
        DecodingResult::I16(buf) => convert_samples!(buf, nodata),
        DecodingResult::I32(buf) => convert_samples!(buf, nodata),
        DecodingResult::I64(buf) => convert_samples!(buf, nodata),
        DecodingResult::F32(buf) => convert_samples!(buf, nodata),
        DecodingResult::F64(buf) => convert_samples!(buf, nodata),
        #[allow(unreachable_patterns)]
        _ => {
            return Err(GridProcessorError::read_failed(
                &path_str,
                "unsupported TIFF sample format",
            ))
        }
    };

    if data.len() != meta.width * meta.height {
        return Err(GridProcessorError::shape_mismatch(
            &path_str,
            meta.width,
            meta.height,
            data.len(),
        ));
    }

    let raster = RasterBuffer::new(data, meta.width, meta.height, meta.transform, meta.crs, nodata)?
        .with_name(&path_str);

    debug!(
        path = %path_str,
        width = raster.width,
        height = raster.height,
        crs = ?raster.crs,
        "Read GeoTIFF"
    );
    Ok(raster)
}

/// Reconstruct the target grid from a template GeoTIFF.
///
/// The template must be north-up with square pixels and carry an EPSG CRS.
/// A missing GDAL_NODATA tag means nodata 0.
pub fn read_grid_spec(path: &Path) -> Result<GridSpec> {
    let path_str = path.display().to_string();
    let meta = read_metadata(path)?;
    let gt = meta.transform;

    if !gt.is_rectilinear() || gt.a <= 0.0 || gt.e >= 0.0 {
        return Err(GridProcessorError::invalid_metadata(
            &path_str,
            "template grid must be north-up without rotation",
        ));
    }
    if (gt.a + gt.e).abs() > SQUARE_TOLERANCE * gt.a {
        return Err(GridProcessorError::invalid_metadata(
            &path_str,
            format!("template pixels are not square ({} x {})", gt.a, -gt.e),
        ));
    }
    let crs = meta
        .crs
        .ok_or_else(|| grid_common::GridError::crs_undefined(&path_str))?;

    Ok(GridSpec::new(
        gt.c,
        gt.f,
        gt.a,
        meta.width,
        meta.height,
        crs,
        meta.nodata.unwrap_or(0.0),
    )?)
}
