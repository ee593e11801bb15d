// Site-specific years of interest
//
// Lists the sites touching an area of interest and the years that matter for
// them within a simulation period, one year per line on stdout. Given a model
// name, also clips each of those years' estimates in the output directory to
// the area, under model_specific/{model}/.
// Usage: cargo run --bin site_years -- <config.json> <area.txt> <yoi.tsv> [start] [duration] [model]

use anyhow::{bail, Context};
use recharge_estimator::output::clip_year_file;
use recharge_estimator::overlay::ParcelOverlay;
use recharge_estimator::site_selection::{
    sites_in_area, years_of_interest, AreaOfInterest, SimulationPeriod, YoiDictionary,
};
use recharge_estimator::{RetData, RunConfig};
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

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        bail!("usage: {} <config.json> <area.txt> <yoi.tsv> [start] [duration] [model]", args[0]);
    }

    let config = RunConfig::load(&PathBuf::from(&args[1]))?;
    let area = AreaOfInterest::load(&PathBuf::from(&args[2]))?;
    let dictionary = YoiDictionary::load(&PathBuf::from(&args[3]))?;

    // Unparseable values fall back to the defaults
    let defaults = SimulationPeriod::default();
    let period = SimulationPeriod {
        start: args.get(4).and_then(|s| s.parse().ok()).unwrap_or(defaults.start),
        duration: args.get(5).and_then(|s| s.parse().ok()).unwrap_or(defaults.duration),
    };

    let data = RetData::load(&config).context("Failed to load input tables")?;
    let overlay = ParcelOverlay::from_csv(&config.input_path(&config.files.parcels))?;

    let sites = sites_in_area(&overlay, &data, &area);
    tracing::info!("Sites in area: {}", sites.len());

    let years = years_of_interest(&sites, &dictionary, period);
    tracing::info!(
        "Years of interest {}..={}: {}",
        period.start,
        period.end(),
        years.len()
    );

    for year in &years {
        println!("{}", year);
    }

    if let Some(model) = args.get(6) {
        let dest = config.output_dir.join("model_specific").join(model);
        let mut clipped = 0usize;
        for &year in &years {
            if clip_year_file(&config.output_dir, &dest, year, &area)?.is_some() {
                clipped += 1;
            }
        }
        tracing::info!("Clipped {} of {} years into {}", clipped, years.len(), dest.display());
    }
    Ok(())
}
