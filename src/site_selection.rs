//! Site-specific selection
//!
//! Narrows a batch to a model domain: which sites touch the area of interest,
//! which years matter for them, and which output parcels fall inside it.

use crate::data::RetData;
use crate::families::LayerKind;
use crate::overlay::ParcelOverlay;
use crate::recharge::RechargeRecord;
use anyhow::{Context, Result};
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::Path;

/// Simulation period; years run from `start` through `start + duration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationPeriod {
    pub start: i32,
    pub duration: i32,
}

impl Default for SimulationPeriod {
    fn default() -> Self {
        Self {
            start: 1943,
            duration: 2000,
        }
    }
}

impl SimulationPeriod {
    pub fn end(&self) -> i32 {
        self.start + self.duration
    }

    pub fn contains(&self, year: i32) -> bool {
        year >= self.start && year <= self.end()
    }
}

/// Parcels making up a model domain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AreaOfInterest {
    parcels: FxHashSet<String>,
}

impl AreaOfInterest {
    pub fn from_parcels<I, S>(parcels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parcels: parcels.into_iter().map(Into::into).collect(),
        }
    }

    /// One parcel key per line; blank lines and a `parcel_key` header are skipped.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read area of interest: {}", path.display()))?;
        Ok(Self::from_parcels(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && *line != "parcel_key"),
        ))
    }

    pub fn contains(&self, parcel_key: &str) -> bool {
        self.parcels.contains(parcel_key)
    }

    pub fn len(&self) -> usize {
        self.parcels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parcels.is_empty()
    }
}

/// Years of interest per site, from the tab-separated dictionary
/// `siteId<TAB>year<TAB>year...`.
#[derive(Debug, Clone, Default)]
pub struct YoiDictionary {
    years: FxHashMap<String, Vec<i32>>,
}

impl YoiDictionary {
    pub fn parse(text: &str) -> Self {
        let mut years = FxHashMap::default();
        for (line_no, line) in text.lines().enumerate() {
            let mut cells = line.split('\t');
            let Some(site) = cells.next().map(str::trim).filter(|s| !s.is_empty()) else {
                continue;
            };
            let mut site_years = Vec::new();
            for cell in cells.map(str::trim).filter(|c| !c.is_empty()) {
                match cell.parse::<i32>() {
                    Ok(year) => site_years.push(year),
                    Err(_) => tracing::warn!("YoI dictionary line {}: '{}' is not a year", line_no + 1, cell),
                }
            }
            years.insert(site.to_string(), site_years);
        }
        Self { years }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read YoI dictionary: {}", path.display()))?;
        Ok(Self::parse(&text))
    }

    pub fn years_for(&self, site_id: &str) -> Option<&[i32]> {
        self.years.get(site_id).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}

/// Business keys of the cleanup packages, facilities and waste sites over any
/// parcel of the area, in first-seen order.
pub fn sites_in_area(overlay: &ParcelOverlay, data: &RetData, area: &AreaOfInterest) -> Vec<String> {
    let mut seen = FxHashSet::default();
    let mut sites = Vec::new();
    let mut push = |site: String| {
        if seen.insert(site.clone()) {
            sites.push(site);
        }
    };

    for kind in [
        LayerKind::CleanupPackages,
        LayerKind::ExistingBuildings,
        LayerKind::ExistingSites,
        LayerKind::WasteSites,
    ] {
        for row in overlay.rows.iter().filter(|row| area.contains(&row.parcel_key)) {
            let Some(fid) = row.fid(kind) else {
                continue;
            };
            let site = match kind {
                LayerKind::CleanupPackages => data.cvp.get(&fid).map(|p| p.key_wsrf.clone()),
                LayerKind::ExistingBuildings => data.bggenexs.get(&fid).map(|f| f.facil_name.clone()),
                LayerKind::ExistingSites => data.bggensit.get(&fid).map(|f| f.facil_name.clone()),
                LayerKind::WasteSites => data.ehsit.get(&fid).map(|s| s.site_id()),
                _ => None,
            };
            if let Some(site) = site {
                push(site);
            }
        }
    }

    sites
}

/// Sorted unique years listed for `site_ids` that fall inside `period`.
pub fn years_of_interest<S: AsRef<str>>(
    site_ids: &[S],
    dictionary: &YoiDictionary,
    period: SimulationPeriod,
) -> Vec<i32> {
    let mut years: Vec<i32> = site_ids
        .iter()
        .filter_map(|id| dictionary.years_for(id.as_ref()))
        .flatten()
        .copied()
        .filter(|&year| period.contains(year))
        .collect();
    years.sort_unstable();
    years.dedup();
    years
}

/// Records whose parcel lies in the area.
pub fn clip(records: &[RechargeRecord], area: &AreaOfInterest) -> Vec<RechargeRecord> {
    records
        .iter()
        .filter(|record| area.contains(&record.parcel_key))
        .cloned()
        .collect()
}
