//! The four preparation stages.
//!
//! Each stage reads its inputs from the paths in [`PrepareConfig`], writes
//! its outputs and returns a [`StageReport`]. Stages after `grid` read the
//! template GeoTIFF to recover the target [`GridSpec`].

pub mod dem;
pub mod lulc;
pub mod template;
pub mod weather;

use std::fmt;
use std::path::{Path, PathBuf};

use grid_common::GridSpec;
use grid_processor::{read_grid_spec, GeoTiffCompression, GeoTiffWriter};
use serde::{Deserialize, Serialize};

use crate::config::PrepareConfig;
use crate::error::{PrepareError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Grid,
    Dem,
    Lulc,
    Weather,
}

impl Stage {
    /// Run order.
    pub const ALL: [Stage; 4] = [Stage::Grid, Stage::Dem, Stage::Lulc, Stage::Weather];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Grid => "grid",
            Stage::Dem => "dem",
            Stage::Lulc => "lulc",
            Stage::Weather => "weather",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a stage wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct StageReport {
    pub stage: Stage,
    pub outputs: Vec<PathBuf>,
    /// Units of work that failed and were skipped (weather days).
    pub skipped: Vec<String>,
}

impl StageReport {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            outputs: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

pub(crate) fn require_file(stage: &'static str, path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(PrepareError::missing_input(stage, path))
    }
}

/// Writer used for every output: deflate-compressed GeoTIFF.
pub(crate) fn output_writer() -> GeoTiffWriter {
    GeoTiffWriter::new().compression(GeoTiffCompression::Deflate)
}

/// Grid recovered from the template written by the grid stage.
pub fn load_grid(stage: &'static str, config: &PrepareConfig) -> Result<GridSpec> {
    require_file(stage, &config.grid.template)?;
    Ok(read_grid_spec(&config.grid.template)?)
}
