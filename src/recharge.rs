//! Recharge rate join
//!
//! Joins the merged per-parcel classification against the recharge table on
//! (cover type, surface condition, soil type). A triple the table does not
//! know gets the -9999 sentinel; misses are logged, never fatal.

use crate::families::CoverLayer;
use crate::overlay::ParcelOverlay;
use crate::utils::{RateLookup, RechargeLookup};
use rayon::prelude::*;
use rustc_hash::FxHashSet;

pub use crate::utils::RATE_SENTINEL;

/// One rated parcel of a year's output.
#[derive(Debug, Clone, PartialEq)]
pub struct RechargeRecord {
    pub parcel_key: String,
    pub soil_type: Option<String>,
    pub surface_condition: Option<String>,
    pub cover_type: Option<String>,
    pub source: Option<String>,
    pub recharge_rate: f64,
}

/// Rated parcels in overlay order, plus how many fell back to the sentinel.
#[derive(Debug, Clone, Default)]
pub struct RateJoin {
    pub records: Vec<RechargeRecord>,
    pub misses: usize,
}

/// Rate every overlay parcel.
///
/// Parcels no layer covers, or without a soil type, are rated with the
/// sentinel too.
pub fn assign_rates(overlay: &ParcelOverlay, merged: &CoverLayer, recharge: &RechargeLookup) -> RateJoin {
    let rated: Vec<(RechargeRecord, bool)> = overlay
        .rows
        .par_iter()
        .map(|row| {
            let cell = merged.get(&row.parcel_key);
            let lookup = match (cell, row.soil_type.as_deref()) {
                (Some(cell), Some(soil)) => recharge.rate(
                    &cell.condition.cover_type,
                    &cell.condition.surface_condition,
                    soil,
                ),
                _ => RateLookup::Missing,
            };
            let missed = matches!(lookup, RateLookup::Missing);

            let record = RechargeRecord {
                parcel_key: row.parcel_key.clone(),
                soil_type: row.soil_type.clone(),
                surface_condition: cell.map(|c| c.condition.surface_condition.clone()),
                cover_type: cell.map(|c| c.condition.cover_type.clone()),
                source: cell.map(|c| c.source.clone()),
                recharge_rate: lookup.or_sentinel(),
            };
            (record, missed)
        })
        .collect();

    let misses = rated.iter().filter(|(_, missed)| *missed).count();
    if misses > 0 {
        let mut triples: FxHashSet<(String, String, String)> = FxHashSet::default();
        for (record, missed) in &rated {
            if *missed {
                triples.insert((
                    record.cover_type.clone().unwrap_or_default(),
                    record.surface_condition.clone().unwrap_or_default(),
                    record.soil_type.clone().unwrap_or_default(),
                ));
            }
        }
        let mut sample: Vec<_> = triples.into_iter().collect();
        sample.sort();
        sample.truncate(5);
        tracing::warn!(
            "{} parcels have no recharge rate; set to {}. e.g. (cover, surface, soil) {:?}",
            misses,
            RATE_SENTINEL,
            sample
        );
    }

    RateJoin {
        records: rated.into_iter().map(|(record, _)| record).collect(),
        misses,
    }
}
