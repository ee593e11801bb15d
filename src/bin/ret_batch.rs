// Batch recharge estimation
//
// Runs every year of a config and writes RechargeEstimates_{year}.csv per year.
// Usage: cargo run --release --bin ret_batch -- [config.json]

use anyhow::Context;
use recharge_estimator::overlay::CsvOverlayDir;
use recharge_estimator::output::write_year;
use recharge_estimator::site_selection::AreaOfInterest;
use recharge_estimator::{RetData, RunConfig, YearBatchDriver};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recharge_estimator=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => RunConfig::load(&PathBuf::from(path))?,
        None => {
            tracing::info!("No config given; using defaults");
            RunConfig::default().normalized()?
        }
    };

    tracing::info!("Configuration:");
    tracing::info!("  Years: {} ({:?} .. {:?})", config.years.len(), config.years.first(), config.years.last());
    tracing::info!("  Input: {}", config.input_dir.display());
    tracing::info!("  Output: {}", config.output_dir.display());

    let area = config
        .area_of_interest
        .as_ref()
        .map(|path| AreaOfInterest::load(&config.input_dir.join(path)))
        .transpose()?;
    if let Some(area) = &area {
        tracing::info!("  Clipping outputs to {} parcels", area.len());
    }

    let data = RetData::load(&config).context("Failed to load input tables")?;
    let overlays = CsvOverlayDir::new(&config.input_dir, &config.files.parcels);
    let mut driver = YearBatchDriver::new(data, &config)?;

    let output_dir = config.output_dir.clone();
    let years = driver.run(&overlays, |output| {
        write_year(&output_dir, output, area.as_ref())?;
        Ok(())
    })?;

    tracing::info!("Done: {} years written to {}", years, output_dir.display());
    Ok(())
}
