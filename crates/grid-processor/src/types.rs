//! Core types for raster processing.

use std::fmt::Debug;

use grid_common::{BoundingBox, Crs, GeoTransform, GridError, GridSpec};
use num_traits::NumCast;
use tiff::encoder::colortype::{self, ColorType};

use crate::error::{GridProcessorError, Result};

/// Element type of a single-band raster.
///
/// Implemented for the sample formats the pipeline writes: `u8` (template),
/// `u16` (land cover), `i16` (DEM tiles), `f32` (derived layers) and `f64`.
pub trait Pixel: Copy + Debug + PartialEq + Send + Sync + NumCast + 'static {
    /// Matching TIFF sample layout for the writer.
    type TiffColor: ColorType<Inner = Self>;

    /// Nodata used when a file declares none.
    fn default_nodata() -> Self;

    /// True for the nodata sentinel, and for NaN on float types.
    fn is_nodata(self, nodata: Self) -> bool;

    fn as_f64(self) -> f64;

    /// Convert a computed value into this type. Integer types round to the
    /// nearest value; `None` if the value is not representable.
    fn from_f64(value: f64) -> Option<Self>;
}

macro_rules! impl_int_pixel {
    ($t:ty, $color:ty) => {
        impl Pixel for $t {
            type TiffColor = $color;

            fn default_nodata() -> Self {
                0
            }

            fn is_nodata(self, nodata: Self) -> bool {
                self == nodata
            }

            fn as_f64(self) -> f64 {
                self as f64
            }

            fn from_f64(value: f64) -> Option<Self> {
                if !value.is_finite() {
                    return None;
                }
                <$t as NumCast>::from(value.round())
            }
        }
    };
}

macro_rules! impl_float_pixel {
    ($t:ty, $color:ty) => {
        impl Pixel for $t {
            type TiffColor = $color;

            fn default_nodata() -> Self {
                <$t>::NAN
            }

            fn is_nodata(self, nodata: Self) -> bool {
                self.is_nan() || self == nodata
            }

            fn as_f64(self) -> f64 {
                self as f64
            }

            fn from_f64(value: f64) -> Option<Self> {
                if value.is_nan() {
                    return Some(<$t>::NAN);
                }
                <$t as NumCast>::from(value)
            }
        }
    };
}

impl_int_pixel!(u8, colortype::Gray8);
impl_int_pixel!(u16, colortype::Gray16);
impl_int_pixel!(i16, colortype::GrayI16);
impl_float_pixel!(f32, colortype::Gray32Float);
impl_float_pixel!(f64, colortype::Gray64Float);

/// A single-band georeferenced raster held in memory.
///
/// `data` is row-major, `height` rows of `width` values. Operations on a
/// buffer return new buffers and never modify their input.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterBuffer<T> {
    pub data: Vec<T>,
    pub width: usize,
    pub height: usize,
    pub transform: GeoTransform,
    pub crs: Option<Crs>,
    pub nodata: T,
    /// Label used in logs and errors, usually the source path.
    pub name: String,
}

impl<T: Pixel> RasterBuffer<T> {
    pub fn new(
        data: Vec<T>,
        width: usize,
        height: usize,
        transform: GeoTransform,
        crs: Option<Crs>,
        nodata: T,
    ) -> Result<Self> {
        if width == 0 || height == 0 || data.len() != width * height {
            return Err(GridProcessorError::shape_mismatch(
                "raster",
                width,
                height,
                data.len(),
            ));
        }
        Ok(Self {
            data,
            width,
            height,
            transform,
            crs,
            nodata,
            name: "raster".to_string(),
        })
    }

    /// A buffer on `grid` with every cell set to `value`.
    pub fn filled(grid: &GridSpec, value: T, nodata: T) -> Self {
        Self {
            data: vec![value; grid.len()],
            width: grid.width,
            height: grid.height,
            transform: grid.transform(),
            crs: Some(grid.crs),
            nodata,
            name: "raster".to_string(),
        }
    }

    /// Wrap existing values laid out on `grid`.
    pub fn from_grid(grid: &GridSpec, data: Vec<T>, nodata: T) -> Result<Self> {
        Self::new(data, grid.width, grid.height, grid.transform(), Some(grid.crs), nodata)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// `(height, width)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, col: usize, row: usize) -> Option<T> {
        if col >= self.width || row >= self.height {
            return None;
        }
        Some(self.data[row * self.width + col])
    }

    /// Value at `(col, row)` unless it is out of range or nodata.
    pub fn get_valid(&self, col: usize, row: usize) -> Option<T> {
        self.get(col, row).filter(|v| !v.is_nodata(self.nodata))
    }

    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| !v.is_nodata(self.nodata)).count()
    }

    pub fn bounds(&self) -> BoundingBox {
        self.transform.bounds(self.width, self.height)
    }

    /// The CRS, or `CrsUndefined` naming this raster.
    pub fn require_crs(&self) -> Result<Crs> {
        self.crs
            .ok_or_else(|| GridError::crs_undefined(self.name.clone()).into())
    }

    /// Inverse affine, or `DegenerateTransform` naming this raster.
    pub fn inverse_transform(&self) -> Result<GeoTransform> {
        self.transform.inverse().ok_or_else(|| {
            GridError::degenerate(self.name.clone(), self.transform.determinant()).into()
        })
    }

    /// True if the buffer lies exactly on `grid` (shape, CRS and transform).
    pub fn is_on_grid(&self, grid: &GridSpec) -> bool {
        const TOL: f64 = 1e-9;
        let gt = grid.transform();
        let close = |a: f64, b: f64| (a - b).abs() <= TOL * a.abs().max(b.abs()).max(1.0);
        self.width == grid.width
            && self.height == grid.height
            && self.crs == Some(grid.crs)
            && close(self.transform.a, gt.a)
            && close(self.transform.b, gt.b)
            && close(self.transform.c, gt.c)
            && close(self.transform.d, gt.d)
            && close(self.transform.e, gt.e)
            && close(self.transform.f, gt.f)
    }

    /// Apply `f` to every valid cell; nodata cells become `nodata`.
    pub fn map_valid<U: Pixel>(&self, nodata: U, f: impl Fn(T) -> U) -> RasterBuffer<U> {
        let data = self
            .data
            .iter()
            .map(|&v| if v.is_nodata(self.nodata) { nodata } else { f(v) })
            .collect();
        RasterBuffer {
            data,
            width: self.width,
            height: self.height,
            transform: self.transform,
            crs: self.crs,
            nodata,
            name: self.name.clone(),
        }
    }

    /// Same geometry, new values.
    pub fn with_data<U: Pixel>(&self, data: Vec<U>, nodata: U) -> Result<RasterBuffer<U>> {
        let mut out = RasterBuffer::new(
            data,
            self.width,
            self.height,
            self.transform,
            self.crs,
            nodata,
        )?;
        out.name = self.name.clone();
        Ok(out)
    }
}

/// Interpolation method for resampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InterpolationMethod {
    /// Nearest neighbor (preserves exact values, used for categorical data).
    #[default]
    Nearest,
    /// Bilinear interpolation over the four surrounding cell centers.
    Bilinear,
}

impl std::fmt::Display for InterpolationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nearest => write!(f, "nearest"),
            Self::Bilinear => write!(f, "bilinear"),
        }
    }
}
