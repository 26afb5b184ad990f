//! Physical quantities derived from grid-aligned rasters.
//!
//! - [`terrain`]: Horn slope and aspect from elevation
//! - [`fuel`]: land-cover class to fuel score lookup
//! - [`weather`]: wind, relative humidity, unit conversion and daily
//!   aggregation of hourly fields
//!
//! Every function treats NaN (and the raster's nodata) as "no measurement"
//! and propagates it to the output.

pub mod error;
pub mod fuel;
pub mod terrain;
pub mod weather;

pub use error::{DerivationError, Result};
pub use fuel::{classify, classify_raster};
pub use terrain::{horn_slope_aspect, slope_aspect};
pub use weather::{
    daily_mean, daily_sum, kelvin_to_celsius, metres_to_millimetres, relative_humidity,
    wind_direction, wind_speed, Aggregation, DailyWeather, WeatherField, WeatherVariable,
};
