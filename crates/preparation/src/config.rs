//! Pipeline configuration.
//!
//! Loaded from YAML. Every section has defaults matching the standard
//! project layout, so a minimal file only names what differs:
//!
//! ```yaml
//! grid:
//!   crs: EPSG:32644
//!   pixel_size: 30
//! aoi:
//!   path: data/aoi/uttarakhand.geojson
//! weather:
//!   on_day_error: skip
//! ```
//!
//! Relative paths resolve against `root`, which defaults to the directory
//! holding the config file. `${VAR}` and `~` are expanded first.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use grid_common::Crs;
use serde::{Deserialize, Serialize};

use crate::error::{PrepareError, Result};

// ============================================================================
// Sections
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub crs: Crs,
    pub pixel_size: f64,
    /// Template GeoTIFF that fixes the grid for every later stage.
    pub template: PathBuf,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            crs: Crs::epsg(32644),
            pixel_size: 30.0,
            template: PathBuf::from("grid/template_30m.tif"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AoiConfig {
    /// GeoJSON file with Polygon/MultiPolygon geometries.
    pub path: PathBuf,
    /// CRS of the GeoJSON coordinates.
    pub crs: Crs,
}

impl Default for AoiConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/aoi/uttarakhand.geojson"),
            crs: Crs::WGS84,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemConfig {
    pub input: PathBuf,
    /// Intermediate DEM clipped to the AOI, in the input's CRS.
    pub clip: PathBuf,
    pub elevation: PathBuf,
    pub slope: PathBuf,
    pub aspect: PathBuf,
}

impl Default for DemConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data/dem/utt_dem_raw.tif"),
            clip: PathBuf::from("data/dem/utt_dem_clip.tif"),
            elevation: PathBuf::from("data/dem/utt_dem_30m.tif"),
            slope: PathBuf::from("data/dem/utt_slope_deg.tif"),
            aspect: PathBuf::from("data/dem/utt_aspect_deg.tif"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LulcConfig {
    /// Directory of `*.tif` tiles mosaicked into `input` when present.
    pub tiles_dir: PathBuf,
    pub input: PathBuf,
    pub aligned: PathBuf,
    pub fuel: PathBuf,
}

impl Default for LulcConfig {
    fn default() -> Self {
        Self {
            tiles_dir: PathBuf::from("data/lulc/worldcover_tiles"),
            input: PathBuf::from("data/lulc/worldcover_2021.tif"),
            aligned: PathBuf::from("data/lulc/worldcover_30m.tif"),
            fuel: PathBuf::from("data/lulc/fuel_score_30m.tif"),
        }
    }
}

/// Names of the ERA5 variables in the input files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherVariableNames {
    pub u10: String,
    pub v10: String,
    pub t2m: String,
    pub d2m: String,
    pub tp: String,
}

impl Default for WeatherVariableNames {
    fn default() -> Self {
        Self {
            u10: "u10".to_string(),
            v10: "v10".to_string(),
            t2m: "t2m".to_string(),
            d2m: "d2m".to_string(),
            tp: "tp".to_string(),
        }
    }
}

impl WeatherVariableNames {
    /// Names read from the instantaneous file, in u, v, t, td order.
    pub fn instant(&self) -> [&str; 4] {
        [&self.u10, &self.v10, &self.t2m, &self.d2m]
    }
}

/// What the weather stage does when one day fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the stage with the day's error.
    #[default]
    Abort,
    /// Log the error, keep going and list the day in the report.
    Skip,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "skip" => Ok(Self::Skip),
            other => Err(format!("unknown failure policy '{other}' (expected abort or skip)")),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abort => f.write_str("abort"),
            Self::Skip => f.write_str("skip"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// ERA5 file with instantaneous fields (u10, v10, t2m, d2m).
    pub instant: PathBuf,
    /// ERA5 file with accumulated fields (tp).
    pub accum: PathBuf,
    pub output_dir: PathBuf,
    pub variables: WeatherVariableNames,
    /// `[lon_min, lat_min, lon_max, lat_max]` applied before aggregation.
    pub crop: Option<[f64; 4]>,
    /// Process days in parallel.
    pub parallel: bool,
    pub on_day_error: FailurePolicy,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            instant: PathBuf::from("data/weather/data_stream-oper_stepType-instant.nc"),
            accum: PathBuf::from("data/weather/data_stream-oper_stepType-accum.nc"),
            output_dir: PathBuf::from("data/weather"),
            variables: WeatherVariableNames::default(),
            crop: Some([77.0, 28.2, 81.8, 31.8]),
            parallel: true,
            on_day_error: FailurePolicy::Abort,
        }
    }
}

// ============================================================================
// Top level
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepareConfig {
    /// Base for relative paths. Relative values are taken from the config
    /// file's directory.
    pub root: Option<PathBuf>,
    pub grid: GridConfig,
    pub aoi: AoiConfig,
    pub dem: DemConfig,
    pub lulc: LulcConfig,
    pub weather: WeatherConfig,
}

fn expand(path: &Path) -> Result<PathBuf> {
    let text = path.to_string_lossy();
    let expanded = shellexpand::full(&text)
        .map_err(|e| PrepareError::invalid_config(format!("{}: {e}", path.display())))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

impl PrepareConfig {
    /// Load, resolve and validate a YAML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| PrepareError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Self::from_yaml_str(&content, base)
    }

    /// Parse YAML text; relative paths resolve against `base`.
    pub fn from_yaml_str(content: &str, base: &Path) -> Result<Self> {
        let mut config: PrepareConfig = serde_yaml::from_str(content)?;
        config.resolve_paths(base)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults rooted at `root`.
    pub fn with_root(root: &Path) -> Result<Self> {
        let mut config = Self::default();
        config.resolve_paths(root)?;
        Ok(config)
    }

    fn paths_mut(&mut self) -> [&mut PathBuf; 14] {
        [
            &mut self.grid.template,
            &mut self.aoi.path,
            &mut self.dem.input,
            &mut self.dem.clip,
            &mut self.dem.elevation,
            &mut self.dem.slope,
            &mut self.dem.aspect,
            &mut self.lulc.tiles_dir,
            &mut self.lulc.input,
            &mut self.lulc.aligned,
            &mut self.lulc.fuel,
            &mut self.weather.instant,
            &mut self.weather.accum,
            &mut self.weather.output_dir,
        ]
    }

    /// Expand `${VAR}`/`~` and make every path absolute against the root.
    pub fn resolve_paths(&mut self, base: &Path) -> Result<()> {
        let root = match &self.root {
            Some(r) => {
                let r = expand(r)?;
                if r.is_absolute() {
                    r
                } else {
                    base.join(r)
                }
            }
            None => base.to_path_buf(),
        };

        for path in self.paths_mut() {
            if path.as_os_str().is_empty() {
                continue;
            }
            let expanded = expand(path)?;
            *path = if expanded.is_absolute() {
                expanded
            } else {
                root.join(expanded)
            };
        }
        self.root = Some(root);
        Ok(())
    }

    /// Check values no stage can work with.
    pub fn validate(&self) -> Result<()> {
        let px = self.grid.pixel_size;
        if !(px.is_finite() && px > 0.0) {
            return Err(PrepareError::invalid_config(format!(
                "grid.pixel_size must be positive and finite, got {px}"
            )));
        }

        let names = &self.weather.variables;
        let all = [&names.u10, &names.v10, &names.t2m, &names.d2m, &names.tp];
        if let Some(empty) = all.iter().position(|n| n.trim().is_empty()) {
            let keys = ["u10", "v10", "t2m", "d2m", "tp"];
            return Err(PrepareError::invalid_config(format!(
                "weather.variables.{} must not be empty",
                keys[empty]
            )));
        }
        let instant = names.instant();
        for (i, a) in instant.iter().enumerate() {
            if instant[i + 1..].contains(a) {
                return Err(PrepareError::invalid_config(format!(
                    "weather variable '{a}' is used for two fields"
                )));
            }
        }

        if let Some([lon_min, lat_min, lon_max, lat_max]) = self.weather.crop {
            let ok = [lon_min, lat_min, lon_max, lat_max].iter().all(|v| v.is_finite())
                && lon_min < lon_max
                && lat_min < lat_max;
            if !ok {
                return Err(PrepareError::invalid_config(format!(
                    "weather.crop must be [lon_min, lat_min, lon_max, lat_max], got {:?}",
                    [lon_min, lat_min, lon_max, lat_max]
                )));
            }
        }
        Ok(())
    }
}
