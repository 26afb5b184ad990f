//! Daily weather layers from hourly reanalysis fields.
//!
//! Instantaneous fields (wind components, temperature, dewpoint) are
//! averaged over each UTC day; accumulated precipitation is summed. The
//! daily aggregates are then turned into the five published layers.

use std::fmt;

use chrono::NaiveDate;
use grid_processor::RasterBuffer;
use serde::{Deserialize, Serialize};

use crate::error::{DerivationError, Result};

/// Offset between Kelvin and degrees Celsius.
pub const KELVIN_OFFSET: f32 = 273.15;

/// Wind speed in m/s from eastward and northward components.
pub fn wind_speed(u: f32, v: f32) -> f32 {
    u.hypot(v)
}

/// Meteorological-style direction in degrees `[0, 360)`: 0 for a vector
/// pointing north, 90 for east.
pub fn wind_direction(u: f32, v: f32) -> f32 {
    let deg = (u as f64).atan2(v as f64).to_degrees();
    ((deg + 360.0) % 360.0) as f32
}

/// Magnus-Tetens exponent `ln(e_s(t_c) / 6.112)` at `t_c` degrees Celsius.
fn magnus_exponent(t_c: f64) -> f64 {
    17.67 * t_c / (t_c + 243.5)
}

/// Relative humidity (%) from 2 m temperature and dewpoint, both Kelvin.
///
/// The vapour pressure ratio is taken in log space so it stays finite near
/// the Magnus pole at -243.5 degC. Clamped to `[0, 100]`; equal inputs give
/// 100 and NaN in either input gives NaN.
pub fn relative_humidity(t_k: f32, td_k: f32) -> f32 {
    if t_k.is_nan() || td_k.is_nan() {
        return f32::NAN;
    }
    if t_k == td_k {
        return 100.0;
    }
    let t_c = t_k as f64 - KELVIN_OFFSET as f64;
    let td_c = td_k as f64 - KELVIN_OFFSET as f64;
    let rh = 100.0 * (magnus_exponent(td_c) - magnus_exponent(t_c)).exp();
    if rh.is_nan() {
        return if td_k > t_k { 100.0 } else { 0.0 };
    }
    rh.clamp(0.0, 100.0) as f32
}

pub fn kelvin_to_celsius(t_k: f32) -> f32 {
    t_k - KELVIN_OFFSET
}

pub fn metres_to_millimetres(m: f32) -> f32 {
    m * 1000.0
}

/// How hourly samples collapse into one daily value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Mean,
    Sum,
}

/// Aggregate selected time steps of a `[time, cell]` stack.
///
/// `stack` holds consecutive fields of `cells` values each. NaN samples are
/// skipped; a cell with no valid sample among `indices` is NaN.
pub fn aggregate(
    name: &str,
    stack: &[f32],
    cells: usize,
    indices: &[usize],
    how: Aggregation,
) -> Result<Vec<f32>> {
    if cells == 0 || stack.len() % cells != 0 {
        return Err(DerivationError::shape_mismatch(name, cells, stack.len()));
    }
    let steps = stack.len() / cells;
    if let Some(&index) = indices.iter().find(|&&i| i >= steps) {
        return Err(DerivationError::TimeIndexOutOfRange {
            name: name.to_string(),
            index,
            steps,
        });
    }

    let mut sum = vec![0.0f64; cells];
    let mut count = vec![0u32; cells];
    for &t in indices {
        let field = &stack[t * cells..(t + 1) * cells];
        for (cell, &v) in field.iter().enumerate() {
            if !v.is_nan() {
                sum[cell] += v as f64;
                count[cell] += 1;
            }
        }
    }

    Ok(sum
        .into_iter()
        .zip(count)
        .map(|(s, n)| match (n, how) {
            (0, _) => f32::NAN,
            (_, Aggregation::Sum) => s as f32,
            (n, Aggregation::Mean) => (s / n as f64) as f32,
        })
        .collect())
}

pub fn daily_mean(name: &str, stack: &[f32], cells: usize, indices: &[usize]) -> Result<Vec<f32>> {
    aggregate(name, stack, cells, indices, Aggregation::Mean)
}

pub fn daily_sum(name: &str, stack: &[f32], cells: usize, indices: &[usize]) -> Result<Vec<f32>> {
    aggregate(name, stack, cells, indices, Aggregation::Sum)
}

/// The five published daily layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherVariable {
    WindSpeed,
    WindDirection,
    Temperature,
    RelativeHumidity,
    Precipitation,
}

impl WeatherVariable {
    pub const ALL: [WeatherVariable; 5] = [
        WeatherVariable::WindSpeed,
        WeatherVariable::WindDirection,
        WeatherVariable::Temperature,
        WeatherVariable::RelativeHumidity,
        WeatherVariable::Precipitation,
    ];

    /// Tag used in output file names.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::WindSpeed => "wind_speed",
            Self::WindDirection => "wind_dir",
            Self::Temperature => "t2m",
            Self::RelativeHumidity => "rh",
            Self::Precipitation => "tp",
        }
    }
}

impl fmt::Display for WeatherVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One derived layer for one day, on the target grid.
#[derive(Debug, Clone)]
pub struct WeatherField {
    pub variable: WeatherVariable,
    pub date: NaiveDate,
    pub raster: RasterBuffer<f32>,
}

impl WeatherField {
    /// `{YYYY-MM-DD}_{tag}_{pixel}m.tif`
    pub fn file_name(&self, pixel_label: &str) -> String {
        format!(
            "{}_{}_{}m.tif",
            self.date.format("%Y-%m-%d"),
            self.variable.tag(),
            pixel_label
        )
    }
}

/// Daily aggregates of the raw fields on their native grid.
///
/// `u10`, `v10` in m/s, `t2m`, `d2m` in Kelvin (daily means) and `tp` in
/// metres (daily sum).
#[derive(Debug, Clone)]
pub struct DailyWeather {
    pub date: NaiveDate,
    pub u10: Vec<f32>,
    pub v10: Vec<f32>,
    pub t2m: Vec<f32>,
    pub d2m: Vec<f32>,
    pub tp: Vec<f32>,
}

impl DailyWeather {
    fn check(&self) -> Result<usize> {
        let cells = self.u10.len();
        for (name, field) in [
            ("v10", &self.v10),
            ("t2m", &self.t2m),
            ("d2m", &self.d2m),
            ("tp", &self.tp),
        ] {
            if field.len() != cells {
                return Err(DerivationError::shape_mismatch(name, cells, field.len()));
            }
        }
        Ok(cells)
    }

    /// The five layers on the native grid, in [`WeatherVariable::ALL`] order.
    pub fn derive(&self) -> Result<Vec<(WeatherVariable, Vec<f32>)>> {
        self.check()?;
        let zip = |a: &[f32], b: &[f32], f: fn(f32, f32) -> f32| -> Vec<f32> {
            a.iter().zip(b).map(|(&x, &y)| f(x, y)).collect()
        };

        Ok(vec![
            (WeatherVariable::WindSpeed, zip(&self.u10, &self.v10, wind_speed)),
            (WeatherVariable::WindDirection, zip(&self.u10, &self.v10, wind_direction)),
            (
                WeatherVariable::Temperature,
                self.t2m.iter().map(|&t| kelvin_to_celsius(t)).collect(),
            ),
            (
                WeatherVariable::RelativeHumidity,
                zip(&self.t2m, &self.d2m, relative_humidity),
            ),
            (
                WeatherVariable::Precipitation,
                self.tp.iter().map(|&p| metres_to_millimetres(p)).collect(),
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{assert_approx_eq, create_time_series};

    #[test]
    fn test_wind_speed() {
        assert_eq!(wind_speed(3.0, 4.0), 5.0);
        assert_eq!(wind_speed(0.0, 0.0), 0.0);
        assert!(wind_speed(f32::NAN, 1.0).is_nan());
    }

    #[test]
    fn test_wind_direction_compass() {
        assert_approx_eq!(wind_direction(0.0, 1.0), 0.0, 1e-6);
        assert_approx_eq!(wind_direction(1.0, 0.0), 90.0, 1e-6);
        assert_approx_eq!(wind_direction(0.0, -1.0), 180.0, 1e-6);
        assert_approx_eq!(wind_direction(-1.0, 0.0), 270.0, 1e-6);
        for (u, v) in [(0.3, -2.0), (-5.0, -5.0), (1e-3, 1e3)] {
            let d = wind_direction(u, v);
            assert!((0.0..360.0).contains(&d));
        }
    }

    #[test]
    fn test_relative_humidity_saturated() {
        for t in [250.0, 273.15, 300.0, 315.0] {
            assert_approx_eq!(relative_humidity(t, t), 100.0, 1e-4);
        }
    }

    #[test]
    fn test_relative_humidity_bounded() {
        for t in (230..330).step_by(7) {
            for td in (220..340).step_by(9) {
                let rh = relative_humidity(t as f32, td as f32);
                assert!((0.0..=100.0).contains(&rh), "rh({t}, {td}) = {rh}");
            }
        }
        // Dewpoint above temperature clamps to saturation
        assert_eq!(relative_humidity(290.0, 295.0), 100.0);
    }

    #[test]
    fn test_relative_humidity_finite_near_magnus_pole() {
        // -243.5 degC sits at 29.65 K; sweep both inputs across it
        let samples: Vec<f32> = (0..=1600).map(|i| i as f32 * 0.25).collect();
        for &t in samples.iter().step_by(3) {
            for &td in samples.iter().step_by(5) {
                let rh = relative_humidity(t, td);
                assert!((0.0..=100.0).contains(&rh), "rh({t}, {td}) = {rh}");
            }
        }

        assert_eq!(relative_humidity(25.0, 25.0), 100.0);
        assert_eq!(relative_humidity(29.65, 29.65), 100.0);
        for (t, td) in [(25.0, 24.0), (29.6, 29.7), (29.7, 29.6), (31.0, 20.0)] {
            let rh = relative_humidity(t, td);
            assert!((0.0..=100.0).contains(&rh), "rh({t}, {td}) = {rh}");
        }
    }

    #[test]
    fn test_relative_humidity_reference_value() {
        // 30 C with a 20 C dewpoint is about 55 %
        let rh = relative_humidity(303.15, 293.15);
        assert!((rh - 55.0).abs() < 1.0, "rh = {rh}");
        assert!(relative_humidity(f32::NAN, 290.0).is_nan());
    }

    #[test]
    fn test_unit_conversions() {
        assert_approx_eq!(kelvin_to_celsius(273.15), 0.0, 1e-5);
        assert_approx_eq!(metres_to_millimetres(0.0025), 2.5, 1e-6);
    }

    #[test]
    fn test_daily_precipitation_sum() {
        // 24 hourly values of x metres sum to 24 * x * 1000 mm
        let x = 0.0004f32;
        let stack = create_time_series(3, 2, 24, x, |_| 1.0);
        let indices: Vec<usize> = (0..24).collect();
        let total = daily_sum("tp", &stack, 6, &indices).unwrap();
        for v in total {
            assert_approx_eq!(metres_to_millimetres(v), 24.0 * x * 1000.0, 1e-3);
        }
    }

    #[test]
    fn test_daily_mean_skips_nan() {
        // Two cells, three steps; cell 1 is missing at step 1
        let stack = vec![1.0, 10.0, 2.0, f32::NAN, 3.0, 20.0];
        let mean = daily_mean("t2m", &stack, 2, &[0, 1, 2]).unwrap();
        assert_approx_eq!(mean[0], 2.0, 1e-6);
        assert_approx_eq!(mean[1], 15.0, 1e-6);
    }

    #[test]
    fn test_all_missing_cell_is_nan() {
        let stack = vec![f32::NAN, 1.0, f32::NAN, 1.0];
        assert!(daily_sum("tp", &stack, 2, &[0, 1]).unwrap()[0].is_nan());
        assert!(daily_mean("tp", &stack, 2, &[0, 1]).unwrap()[0].is_nan());
    }

    #[test]
    fn test_aggregate_subset_of_steps() {
        let stack = create_time_series(1, 1, 48, 1.0, |t| t as f32);
        let second_day: Vec<usize> = (24..48).collect();
        let mean = daily_mean("u10", &stack, 1, &second_day).unwrap();
        assert_approx_eq!(mean[0], 35.5, 1e-6);
    }

    #[test]
    fn test_aggregate_errors() {
        let stack = vec![0.0; 6];
        assert!(matches!(
            daily_mean("u10", &stack, 4, &[0]),
            Err(DerivationError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            daily_mean("u10", &stack, 2, &[3]),
            Err(DerivationError::TimeIndexOutOfRange { index: 3, steps: 3, .. })
        ));
    }

    #[test]
    fn test_daily_weather_derive() {
        let day = DailyWeather {
            date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            u10: vec![3.0, 0.0],
            v10: vec![4.0, -2.0],
            t2m: vec![300.0, f32::NAN],
            d2m: vec![300.0, 280.0],
            tp: vec![0.01, 0.0],
        };
        let layers = day.derive().unwrap();
        let tags: Vec<_> = layers.iter().map(|(v, _)| v.tag()).collect();
        assert_eq!(tags, vec!["wind_speed", "wind_dir", "t2m", "rh", "tp"]);

        assert_eq!(layers[0].1[0], 5.0);
        assert_approx_eq!(layers[1].1[1], 180.0, 1e-5);
        assert_approx_eq!(layers[2].1[0], 26.85, 1e-4);
        assert_approx_eq!(layers[3].1[0], 100.0, 1e-4);
        assert!(layers[3].1[1].is_nan());
        assert_approx_eq!(layers[4].1[0], 10.0, 1e-5);
    }

    #[test]
    fn test_daily_weather_shape_mismatch() {
        let day = DailyWeather {
            date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            u10: vec![0.0; 4],
            v10: vec![0.0; 4],
            t2m: vec![0.0; 3],
            d2m: vec![0.0; 4],
            tp: vec![0.0; 4],
        };
        assert!(day.derive().is_err());
    }

    #[test]
    fn test_field_file_name() {
        let grid = test_utils::utm_grid(0.0, 30.0, 1, 1);
        let field = WeatherField {
            variable: WeatherVariable::WindDirection,
            date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            raster: RasterBuffer::filled(&grid, 0.0, f32::NAN),
        };
        assert_eq!(field.file_name("30"), "2024-04-01_wind_dir_30m.tif");
    }
}
