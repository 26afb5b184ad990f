//! Time-axis identification and CF time decoding.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

use crate::dataset::GriddedDataset;
use crate::error::{NetCdfError, NetCdfResult};

/// Names accepted for the time axis, highest priority first.
pub const TIME_AXIS_NAMES: [&str; 5] = ["time", "valid_time", "datetime", "date", "t"];

/// First name in [`TIME_AXIS_NAMES`] present as a dimension or coordinate.
pub fn find_time_axis(dataset: &GriddedDataset) -> NetCdfResult<&'static str> {
    TIME_AXIS_NAMES
        .iter()
        .copied()
        .find(|name| dataset.has_dimension_or_coordinate(name))
        .ok_or_else(|| NetCdfError::MissingTimeCoordinate {
            input: dataset.source.clone(),
            tried: TIME_AXIS_NAMES.iter().map(|s| s.to_string()).collect(),
        })
}

/// Decoded `<unit> since <epoch>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CfTimeUnits {
    pub seconds_per_unit: i64,
    pub epoch: DateTime<Utc>,
}

impl CfTimeUnits {
    pub fn parse(units: &str) -> Option<Self> {
        let (unit, epoch) = units.trim().split_once(" since ")?;
        let seconds_per_unit = match unit.trim().to_ascii_lowercase().as_str() {
            "seconds" | "second" | "secs" | "sec" | "s" => 1,
            "minutes" | "minute" | "mins" | "min" => 60,
            "hours" | "hour" | "hrs" | "hr" | "h" => 3_600,
            "days" | "day" | "d" => 86_400,
            _ => return None,
        };
        Some(Self {
            seconds_per_unit,
            epoch: parse_epoch(epoch.trim())?,
        })
    }

    pub fn decode(&self, value: f64) -> Option<DateTime<Utc>> {
        if !value.is_finite() {
            return None;
        }
        let millis = (value * self.seconds_per_unit as f64 * 1000.0).round();
        if millis.abs() > i64::MAX as f64 {
            return None;
        }
        self.epoch
            .checked_add_signed(Duration::milliseconds(millis as i64))
    }
}

fn parse_epoch(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let s = s
        .trim_end_matches("UTC")
        .trim_end_matches('Z')
        .trim_end_matches("+00:00")
        .trim();
    for fmt in [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Decode the values of the time coordinate `axis` to UTC timestamps.
pub fn decode_times(dataset: &GriddedDataset, axis: &str) -> NetCdfResult<Vec<DateTime<Utc>>> {
    let coord = dataset.coordinate(axis)?;
    let units = coord.units.as_deref().unwrap_or_default();
    let parsed = CfTimeUnits::parse(units).ok_or_else(|| NetCdfError::InvalidTimeUnits {
        input: dataset.source.clone(),
        units: units.to_string(),
    })?;

    coord
        .values
        .iter()
        .map(|&v| {
            parsed.decode(v).ok_or_else(|| {
                NetCdfError::invalid(&dataset.source, format!("time value {v} cannot be decoded"))
            })
        })
        .collect()
}
