//! Fire-input preparation runner.
//!
//! Loads a YAML configuration and runs the grid, DEM, land-cover and
//! weather stages, either all in order or one at a time.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use grid_common::BoundingBox;
use preparation::{FailurePolicy, PrepareConfig, Preparer, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StageArg {
    Grid,
    Dem,
    Lulc,
    Weather,
    All,
}

impl StageArg {
    fn stages(self) -> Vec<Stage> {
        match self {
            StageArg::Grid => vec![Stage::Grid],
            StageArg::Dem => vec![Stage::Dem],
            StageArg::Lulc => vec![Stage::Lulc],
            StageArg::Weather => vec![Stage::Weather],
            StageArg::All => Stage::ALL.to_vec(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "preparer")]
#[command(about = "Prepare co-registered 30 m terrain, fuel and weather rasters")]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/prepare.yaml", env = "PREPARE_CONFIG")]
    config: PathBuf,

    /// Stage to run
    #[arg(short, long, value_enum, default_value = "all")]
    stage: StageArg,

    /// Override the weather failure policy (abort or skip)
    #[arg(long)]
    on_day_error: Option<FailurePolicy>,

    /// Override the weather crop window as "lon_min,lat_min,lon_max,lat_max"
    #[arg(long, value_parser = BoundingBox::from_csv)]
    crop: Option<BoundingBox>,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Emit JSON logs
    #[arg(long)]
    json: bool,
}

fn init_tracing(args: &Args) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true);

    if args.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args);

    info!(config = %args.config.display(), stage = ?args.stage, "Starting preparer");

    let mut config = PrepareConfig::load(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?;
    if let Some(policy) = args.on_day_error {
        config.weather.on_day_error = policy;
    }
    if let Some(crop) = args.crop {
        config.weather.crop = Some([crop.min_x, crop.min_y, crop.max_x, crop.max_y]);
    }

    let preparer = Preparer::new(config).context("Invalid configuration")?;

    let reports = match preparer.run(&args.stage.stages()) {
        Ok(reports) => reports,
        Err(e) => {
            error!(error = %e, "Preparation failed");
            return Err(e).context("Preparation failed");
        }
    };

    for report in &reports {
        for path in &report.outputs {
            info!(stage = %report.stage, path = %path.display(), "Output");
        }
        for day in &report.skipped {
            warn!(stage = %report.stage, day = %day, "Skipped");
        }
    }
    info!(stages = reports.len(), "Preparation complete");
    Ok(())
}
