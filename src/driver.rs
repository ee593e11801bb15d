//! Year Batch Driver
//!
//! Steps through the years of interest in ascending order.
//!
//! The BRMP background donor is resolved once, before the first year, for
//! every layer that declares it reads background
//! ([`LayerKind::reads_background`]). Then per year:
//! 1. Run each eligible layer's classifier in precedence order against the
//!    store as the previous year left it
//! 2. Merge the layers by precedence
//! 3. Join the merged parcels against the recharge table
//! 4. Commit the year's staged state
//!
//! Nothing reaches the store until step 4, so a failing year leaves the
//! state exactly as the previous year committed it.

use crate::config::{EligibilityWindows, RunConfig};
use crate::data::RetData;
use crate::error::RetError;
use crate::families::{
    BackgroundDonor, BrmpClassifier, CleanupPackageClassifier, FacilityClassifier, FamilyClassifier,
    HistoricalCoverClassifier, LayerKind, WasteSiteClassifier, YearContext,
};
use crate::merge::merge_layers;
use crate::overlay::{OverlaySource, ParcelOverlay};
use crate::recharge::{assign_rates, RechargeRecord};
use crate::store::CrossYearStateStore;
use anyhow::{Context, Result};
use std::time::Instant;

/// One year's rated output.
#[derive(Debug, Clone)]
pub struct YearOutput {
    pub year: i32,
    /// Layers that contributed, in precedence order
    pub layers: Vec<LayerKind>,
    pub records: Vec<RechargeRecord>,
    /// Parcels rated with the sentinel
    pub rate_misses: usize,
}

pub struct YearBatchDriver {
    data: RetData,
    years: Vec<i32>,
    windows: EligibilityWindows,
    excluded_waste_sites: Vec<i64>,
    background: BackgroundDonor,
    store: CrossYearStateStore,
    /// Earliest run year; stateful layers take the background then
    seed_year: i32,
    last_year: Option<i32>,
}

impl YearBatchDriver {
    pub fn new(data: RetData, config: &RunConfig) -> Result<Self, RetError> {
        let config = config.clone().normalized()?;
        let seed_year = config.years.first().copied().ok_or_else(|| RetError::InvalidConfig {
            message: "no years to run".to_string(),
        })?;

        let readers: Vec<LayerKind> = LayerKind::PRECEDENCE
            .into_iter()
            .filter(|&kind| kind.reads_background())
            .filter(|&kind| config.years.iter().any(|&year| config.windows.is_eligible(kind, year)))
            .collect();
        let background = if readers.is_empty() {
            BackgroundDonor::default()
        } else {
            let donor = BackgroundDonor::from_brmp(&data.brmp, &data.lookups.recharge);
            tracing::debug!("Background donor: {} BRMP polygons for {:?}", donor.len(), readers);
            donor
        };

        Ok(Self {
            data,
            years: config.years,
            windows: config.windows,
            excluded_waste_sites: config.excluded_waste_sites,
            background,
            store: CrossYearStateStore::new(),
            seed_year,
            last_year: None,
        })
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn store(&self) -> &CrossYearStateStore {
        &self.store
    }

    pub fn data(&self) -> &RetData {
        &self.data
    }

    pub fn background(&self) -> &BackgroundDonor {
        &self.background
    }

    pub fn seed_year(&self) -> i32 {
        self.seed_year
    }

    /// Eligible layers for `year`, lowest precedence first.
    pub fn schedule(&self, year: i32) -> Vec<LayerKind> {
        LayerKind::PRECEDENCE
            .into_iter()
            .filter(|&kind| self.windows.is_eligible(kind, year))
            .collect()
    }

    fn classifier(&self, kind: LayerKind) -> Box<dyn FamilyClassifier + '_> {
        match kind {
            LayerKind::Brmp => Box::new(BrmpClassifier),
            LayerKind::Aac1943 | LayerKind::Aac1943Fallow => {
                Box::new(HistoricalCoverClassifier::new(kind, &self.data.aac1943))
            }
            LayerKind::Naip2011 => Box::new(HistoricalCoverClassifier::new(kind, &self.data.naip2011)),
            LayerKind::CleanupPackages => Box::new(CleanupPackageClassifier::new(&self.data.cvp)),
            LayerKind::WasteSites => Box::new(WasteSiteClassifier::new(
                &self.data.ehsit,
                &self.data.dispositions,
                &self.excluded_waste_sites,
            )),
            LayerKind::ExistingBuildings => Box::new(FacilityClassifier::new(
                kind,
                &self.data.bggenexs,
                &self.data.dispositions,
            )),
            LayerKind::ExistingSites => Box::new(FacilityClassifier::new(
                kind,
                &self.data.bggensit,
                &self.data.dispositions,
            )),
        }
    }

    /// Classify, merge and rate one year, then commit its state.
    pub fn run_year(&mut self, year: i32, overlay: &ParcelOverlay) -> Result<YearOutput, RetError> {
        if let Some(previous) = self.last_year {
            if year <= previous {
                return Err(RetError::YearOutOfOrder { year, previous });
            }
        }

        let schedule = self.schedule(year);

        let mut layers = Vec::with_capacity(schedule.len());
        let mut staged = Vec::new();
        for &kind in &schedule {
            let ctx = YearContext {
                model_year: year,
                seed_year: self.seed_year,
                lookups: &self.data.lookups,
                store: &self.store,
                background: &self.background,
            };
            let output = self.classifier(kind).classify(overlay, &ctx)?;
            tracing::debug!("{} {}: {} parcels", year, kind, output.layer.len());
            layers.push(output.layer);
            staged.extend(output.staged);
        }

        let merged = merge_layers(&layers);
        let join = assign_rates(overlay, &merged, &self.data.lookups.recharge);

        self.store.commit_all(staged);
        self.last_year = Some(year);

        Ok(YearOutput {
            year,
            layers: schedule,
            records: join.records,
            rate_misses: join.misses,
        })
    }

    /// Run every configured year, handing each output to `sink`.
    ///
    /// A failure in any year stops the run; later years are not attempted.
    pub fn run<S, F>(&mut self, source: &S, mut sink: F) -> Result<usize>
    where
        S: OverlaySource + ?Sized,
        F: FnMut(&YearOutput) -> Result<()>,
    {
        let years = self.years.clone();
        let total = years.len();
        let run_start = Instant::now();

        for (i, &year) in years.iter().enumerate() {
            let start = Instant::now();
            let overlay = source
                .overlay_for_year(year)
                .with_context(|| format!("Failed to load overlay for {}", year))?;
            let output = self
                .run_year(year, &overlay)
                .with_context(|| format!("Year {} failed; remaining years skipped", year))?;
            sink(&output).with_context(|| format!("Failed to write output for {}", year))?;

            tracing::info!(
                "Year {} ({}/{}): {} layers, {} parcels, {} without rate, {:?}",
                year,
                i + 1,
                total,
                output.layers.len(),
                output.records.len(),
                output.rate_misses,
                start.elapsed()
            );
        }

        tracing::info!("Processed {} years in {:?}", total, run_start.elapsed());
        Ok(total)
    }
}
