//! Stage orchestration.

use std::time::Instant;

use projection::{Proj4Provider, TransformProvider};
use tracing::{info, info_span};

use crate::config::PrepareConfig;
use crate::error::Result;
use crate::stages::{dem, lulc, template, weather, Stage, StageReport};

/// Runs stages against one validated configuration.
pub struct Preparer {
    config: PrepareConfig,
    provider: Box<dyn TransformProvider>,
}

impl Preparer {
    /// Validate `config` and use the PROJ-based transform provider.
    pub fn new(config: PrepareConfig) -> Result<Self> {
        Self::with_provider(config, Box::new(Proj4Provider::new()))
    }

    pub fn with_provider(config: PrepareConfig, provider: Box<dyn TransformProvider>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, provider })
    }

    pub fn run_stage(&self, stage: Stage) -> Result<StageReport> {
        let _span = info_span!("stage", name = %stage).entered();
        let started = Instant::now();
        info!("Starting stage");

        let provider = self.provider.as_ref();
        let report = match stage {
            Stage::Grid => template::run(&self.config, provider)?,
            Stage::Dem => dem::run(&self.config, provider)?,
            Stage::Lulc => lulc::run(&self.config, provider)?,
            Stage::Weather => weather::run(&self.config, provider)?,
        };

        info!(
            outputs = report.outputs.len(),
            skipped = report.skipped.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Finished stage"
        );
        Ok(report)
    }

    /// Run `stages` in [`Stage::ALL`] order, stopping at the first failure.
    pub fn run(&self, stages: &[Stage]) -> Result<Vec<StageReport>> {
        Stage::ALL
            .iter()
            .filter(|s| stages.contains(s))
            .map(|s| self.run_stage(*s))
            .collect()
    }
}
