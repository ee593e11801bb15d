//! Run configuration.
//!
//! Loaded from a JSON file; every field has a default so a config only needs
//! to name what differs. Defaults reproduce the reference batch constants.

use crate::error::RetError;
use crate::families::LayerKind;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Input table file names, relative to `input_dir`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InputFiles {
    pub parcels: String,
    pub brmp: String,
    pub aac1943: String,
    pub naip2011: String,
    pub cvp: String,
    pub ehsit: String,
    pub bggenexs: String,
    pub bggensit: String,
    pub disposition: String,
    pub disposition_lookup: String,
    pub recharge_lookup: String,
}

impl Default for InputFiles {
    fn default() -> Self {
        Self {
            parcels: "parcels.csv".to_string(),
            brmp: "brmp.csv".to_string(),
            aac1943: "aac1943.csv".to_string(),
            naip2011: "naip2011.csv".to_string(),
            cvp: "cvp.csv".to_string(),
            ehsit: "ehsit.csv".to_string(),
            bggenexs: "bggenexs.csv".to_string(),
            bggensit: "bggensit.csv".to_string(),
            disposition: "disposition.csv".to_string(),
            disposition_lookup: "disposition_lookup.csv".to_string(),
            recharge_lookup: "recharge_lookup.csv".to_string(),
        }
    }
}

/// Inclusive year window; an open end is unbounded.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct YearWindow {
    pub from: Option<i32>,
    pub through: Option<i32>,
}

impl YearWindow {
    pub const ALWAYS: YearWindow = YearWindow { from: None, through: None };

    pub const fn new(from: Option<i32>, through: Option<i32>) -> Self {
        Self { from, through }
    }

    pub fn contains(&self, year: i32) -> bool {
        self.from.map_or(true, |from| year >= from) && self.through.map_or(true, |through| year <= through)
    }
}

/// Years in which each layer contributes to the merge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EligibilityWindows {
    pub brmp: YearWindow,
    pub aac1943: YearWindow,
    pub aac1943_fallow: YearWindow,
    pub naip2011: YearWindow,
    pub cvp: YearWindow,
    pub ehsit: YearWindow,
    pub bggenexs: YearWindow,
    pub bggensit: YearWindow,
}

impl Default for EligibilityWindows {
    fn default() -> Self {
        Self {
            brmp: YearWindow::new(Some(1880), None),
            aac1943: YearWindow::new(Some(1880), Some(1943)),
            aac1943_fallow: YearWindow::new(Some(1944), None),
            naip2011: YearWindow::new(Some(1944), None),
            cvp: YearWindow::new(Some(1998), None),
            ehsit: YearWindow::ALWAYS,
            bggenexs: YearWindow::new(Some(1944), None),
            bggensit: YearWindow::new(Some(1944), None),
        }
    }
}

impl EligibilityWindows {
    pub fn window(&self, kind: LayerKind) -> YearWindow {
        match kind {
            LayerKind::Brmp => self.brmp,
            LayerKind::Aac1943 => self.aac1943,
            LayerKind::Aac1943Fallow => self.aac1943_fallow,
            LayerKind::Naip2011 => self.naip2011,
            LayerKind::CleanupPackages => self.cvp,
            LayerKind::WasteSites => self.ehsit,
            LayerKind::ExistingBuildings => self.bggenexs,
            LayerKind::ExistingSites => self.bggensit,
        }
    }

    pub fn is_eligible(&self, kind: LayerKind, year: i32) -> bool {
        self.window(kind).contains(year)
    }
}

/// Batch run parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    /// Years of interest (normalised to ascending unique order)
    pub years: Vec<i32>,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub files: InputFiles,
    /// Optional file of parcel keys (one per line) to clip outputs to
    pub area_of_interest: Option<PathBuf>,
    /// Waste-site `HAZSITE_ID`s dropped before processing
    pub excluded_waste_sites: Vec<i64>,
    /// Final disposition year used when the table has none
    pub default_final_disposition_year: i32,
    pub windows: EligibilityWindows,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            years: vec![1943, 1944],
            input_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("output"),
            files: InputFiles::default(),
            area_of_interest: None,
            excluded_waste_sites: vec![2732],
            default_final_disposition_year: 2042,
            windows: EligibilityWindows::default(),
        }
    }
}

impl RunConfig {
    /// Load from JSON and normalise.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: RunConfig = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        Ok(config.normalized()?)
    }

    /// Sort and deduplicate the years; an empty year list is an error.
    pub fn normalized(mut self) -> Result<Self, RetError> {
        self.years.sort_unstable();
        self.years.dedup();
        if self.years.is_empty() {
            return Err(RetError::InvalidConfig {
                message: "years must name at least one model year".to_string(),
            });
        }
        Ok(self)
    }

    /// Years of interest in processing order
    pub fn years_of_interest(&self) -> &[i32] {
        &self.years
    }

    pub fn window(&self, kind: LayerKind) -> YearWindow {
        self.windows.window(kind)
    }

    pub fn input_path(&self, file: &str) -> PathBuf {
        self.input_dir.join(file)
    }
}
