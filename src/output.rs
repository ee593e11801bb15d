//! Per-year output tables.

use crate::driver::YearOutput;
use crate::recharge::RechargeRecord;
use crate::site_selection::{clip, AreaOfInterest};
use crate::utils::{read_csv, string_values};
use anyhow::{Context, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};

/// `RechargeEstimates_{year}.csv` under `dir`
pub fn output_path(dir: &Path, year: i32) -> PathBuf {
    dir.join(format!("RechargeEstimates_{}.csv", year))
}

/// Records as a DataFrame with the published column names.
pub fn records_to_frame(records: &[RechargeRecord]) -> Result<DataFrame> {
    let parcel_keys: Vec<String> = records.iter().map(|r| r.parcel_key.clone()).collect();
    let soil_types: Vec<Option<String>> = records.iter().map(|r| r.soil_type.clone()).collect();
    let surfaces: Vec<Option<String>> = records.iter().map(|r| r.surface_condition.clone()).collect();
    let covers: Vec<Option<String>> = records.iter().map(|r| r.cover_type.clone()).collect();
    let sources: Vec<Option<String>> = records.iter().map(|r| r.source.clone()).collect();
    let rates: Vec<f64> = records.iter().map(|r| r.recharge_rate).collect();

    let df = df![
        "ParcelKey" => parcel_keys,
        "SoilType" => soil_types,
        "SurfCond" => surfaces,
        "CoverType" => covers,
        "Source" => sources,
        "RechargeRate" => rates,
    ]
    .context("Failed to build output frame")?;

    Ok(df)
}

/// Write one year's output, clipped to `area` when given.
pub fn write_year(dir: &Path, output: &YearOutput, area: Option<&AreaOfInterest>) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut df = match area {
        Some(area) => records_to_frame(&clip(&output.records, area))?,
        None => records_to_frame(&output.records)?,
    };

    let path = output_path(dir, output.year);
    let mut file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::debug!("Wrote {} rows to {}", df.height(), path.display());
    Ok(path)
}

/// `Recharge_{year}.csv` under `dir`, the clipped copy of one year
pub fn clipped_path(dir: &Path, year: i32) -> PathBuf {
    dir.join(format!("Recharge_{}.csv", year))
}

/// Clip an already written year to `area`, into `dest_dir`.
///
/// Returns None when `source_dir` has no output for `year`.
pub fn clip_year_file(
    source_dir: &Path,
    dest_dir: &Path,
    year: i32,
    area: &AreaOfInterest,
) -> Result<Option<PathBuf>> {
    let source = output_path(source_dir, year);
    if !source.exists() {
        tracing::warn!("No estimates for {} at {}", year, source.display());
        return Ok(None);
    }

    let df = read_csv(&source)?;
    let mask: BooleanChunked = string_values(&df, "ParcelKey")?
        .iter()
        .map(|key| key.as_deref().is_some_and(|key| area.contains(key)))
        .collect();
    let mut clipped = df
        .filter(&mask)
        .with_context(|| format!("Failed to clip {}", source.display()))?;

    std::fs::create_dir_all(dest_dir).with_context(|| format!("Failed to create {}", dest_dir.display()))?;
    let path = clipped_path(dest_dir, year);
    let mut file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut clipped)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::debug!("Clipped {} to {} of {} rows", year, clipped.height(), df.height());
    Ok(Some(path))
}
