//! Data Loading and Management
//!
//! Loads the layer attribute tables, the disposition table and the lookup
//! tables using Polars, and turns them into keyed records.

use crate::classify::LifecycleDates;
use crate::config::RunConfig;
use crate::error::RetError;
use crate::utils::{
    float_values, int_values, materialize_with_columns, read_csv, string_values, year_values,
    DispositionLookup, LookupTables, RechargeLookup,
};
use anyhow::{Context, Result};
use polars::prelude::*;
use rustc_hash::FxHashMap;
use std::path::Path;

/// BRMP background vegetation polygon.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrmpPolygon {
    pub cover_type: Option<String>,
}

/// Historical cover polygon (AAC 1943, NAIP 2011).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverPolygon {
    pub surface_condition: Option<String>,
    pub cover_type: Option<String>,
}

/// Cleanup package (CVP) polygon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupPackageRecord {
    pub key_wsrf: String,
}

/// Waste site polygon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WasteSiteRecord {
    pub hazsite_id: Option<i64>,
    pub site_num: String,
}

impl WasteSiteRecord {
    /// Business key: `SITE_NUM` up to the first `;`
    pub fn site_id(&self) -> String {
        self.site_num
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_string()
    }
}

/// Building or building-site polygon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacilityRecord {
    pub facil_name: String,
}

/// One row of the disposition table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispositionRecord {
    pub dates: LifecycleDates,
    /// Waste-site current label (`Actual_Disposition`)
    pub actual_disposition: Option<String>,
    /// Final label for every family (`TPA_Disposition`)
    pub tpa_disposition: Option<String>,
    /// Facility current label (`Disposition`)
    pub disposition: Option<String>,
}

/// Main data holder for a run
///
/// Layer records are keyed by the fid the overlay refers to them by;
/// disposition records by `Site_ID`.
#[derive(Debug, Clone)]
pub struct RetData {
    pub brmp: FxHashMap<i64, BrmpPolygon>,
    pub aac1943: FxHashMap<i64, CoverPolygon>,
    pub naip2011: FxHashMap<i64, CoverPolygon>,
    pub cvp: FxHashMap<i64, CleanupPackageRecord>,
    pub ehsit: FxHashMap<i64, WasteSiteRecord>,
    pub bggenexs: FxHashMap<i64, FacilityRecord>,
    pub bggensit: FxHashMap<i64, FacilityRecord>,
    pub dispositions: FxHashMap<String, DispositionRecord>,
    pub lookups: LookupTables,
}

impl RetData {
    /// Empty layers around the given lookup tables.
    pub fn with_lookups(lookups: LookupTables) -> Self {
        Self {
            brmp: FxHashMap::default(),
            aac1943: FxHashMap::default(),
            naip2011: FxHashMap::default(),
            cvp: FxHashMap::default(),
            ehsit: FxHashMap::default(),
            bggenexs: FxHashMap::default(),
            bggensit: FxHashMap::default(),
            dispositions: FxHashMap::default(),
            lookups,
        }
    }

    /// Load every table named by the config.
    pub fn load(config: &RunConfig) -> Result<Self> {
        let files = &config.files;
        tracing::info!("Loading tables from {}", config.input_dir.display());

        let disposition = Self::load_disposition_lookup(&config.input_path(&files.disposition_lookup))?;
        let recharge = Self::load_recharge_lookup(&config.input_path(&files.recharge_lookup))?;

        let data = RetData {
            brmp: Self::load_brmp(&config.input_path(&files.brmp))?,
            aac1943: Self::load_cover_polygons(&config.input_path(&files.aac1943))?,
            naip2011: Self::load_cover_polygons(&config.input_path(&files.naip2011))?,
            cvp: Self::load_cleanup_packages(&config.input_path(&files.cvp))?,
            ehsit: Self::load_waste_sites(&config.input_path(&files.ehsit))?,
            bggenexs: Self::load_facilities(&config.input_path(&files.bggenexs))?,
            bggensit: Self::load_facilities(&config.input_path(&files.bggensit))?,
            dispositions: Self::load_dispositions(
                &config.input_path(&files.disposition),
                config.default_final_disposition_year,
            )?,
            lookups: LookupTables { disposition, recharge },
        };

        tracing::info!("  BRMP polygons: {}", data.brmp.len());
        tracing::info!("  AAC 1943 polygons: {}", data.aac1943.len());
        tracing::info!("  NAIP 2011 polygons: {}", data.naip2011.len());
        tracing::info!("  Cleanup packages: {}", data.cvp.len());
        tracing::info!("  Waste sites: {}", data.ehsit.len());
        tracing::info!("  Existing buildings: {}", data.bggenexs.len());
        tracing::info!("  Existing sites: {}", data.bggensit.len());
        tracing::info!("  Disposition records: {}", data.dispositions.len());
        tracing::info!(
            "  Recharge rates: {} over {} soil types",
            data.lookups.recharge.len(),
            data.lookups.recharge.soil_types().len()
        );

        Ok(data)
    }

    /// fid column of a layer table; rows without a fid are dropped.
    fn fids(df: &DataFrame, context: &str) -> Result<Vec<Option<i64>>> {
        let fids = int_values(df, "fid").with_context(|| format!("{}: bad fid column", context))?;
        let missing = fids.iter().filter(|f| f.is_none()).count();
        if missing > 0 {
            tracing::warn!("{}: {} rows without fid skipped", context, missing);
        }
        Ok(fids)
    }

    fn load_brmp(path: &Path) -> Result<FxHashMap<i64, BrmpPolygon>> {
        let df = materialize_with_columns(&read_csv(path)?, &["fid", "Cover_Type"], "brmp table")?;
        let fids = Self::fids(&df, "brmp table")?;
        let covers = string_values(&df, "Cover_Type")?;

        Ok(fids
            .into_iter()
            .zip(covers)
            .filter_map(|(fid, cover_type)| fid.map(|fid| (fid, BrmpPolygon { cover_type })))
            .collect())
    }

    fn load_cover_polygons(path: &Path) -> Result<FxHashMap<i64, CoverPolygon>> {
        let context = format!("cover table {}", path.display());
        let df = materialize_with_columns(&read_csv(path)?, &["fid", "SurfCon", "Cover"], &context)?;
        let fids = Self::fids(&df, &context)?;
        let surfaces = string_values(&df, "SurfCon")?;
        let covers = string_values(&df, "Cover")?;

        Ok(fids
            .into_iter()
            .zip(surfaces.into_iter().zip(covers))
            .filter_map(|(fid, (surface_condition, cover_type))| {
                fid.map(|fid| {
                    (
                        fid,
                        CoverPolygon {
                            surface_condition,
                            cover_type,
                        },
                    )
                })
            })
            .collect())
    }

    fn load_cleanup_packages(path: &Path) -> Result<FxHashMap<i64, CleanupPackageRecord>> {
        let df = materialize_with_columns(&read_csv(path)?, &["fid", "Key_WSRF"], "cvp table")?;
        let fids = Self::fids(&df, "cvp table")?;
        let keys = string_values(&df, "Key_WSRF")?;

        Ok(fids
            .into_iter()
            .zip(keys)
            .filter_map(|(fid, key)| match (fid, key) {
                (Some(fid), Some(key_wsrf)) => Some((fid, CleanupPackageRecord { key_wsrf })),
                _ => None,
            })
            .collect())
    }

    fn load_waste_sites(path: &Path) -> Result<FxHashMap<i64, WasteSiteRecord>> {
        let df = materialize_with_columns(
            &read_csv(path)?,
            &["fid", "HAZSITE_ID", "SITE_NUM"],
            "ehsit table",
        )?;
        let fids = Self::fids(&df, "ehsit table")?;
        let hazsite_ids = int_values(&df, "HAZSITE_ID")?;
        let site_nums = string_values(&df, "SITE_NUM")?;

        let mut map = FxHashMap::default();
        for ((fid, hazsite_id), site_num) in fids.into_iter().zip(hazsite_ids).zip(site_nums) {
            match (fid, site_num) {
                (Some(fid), Some(site_num)) => {
                    map.insert(fid, WasteSiteRecord { hazsite_id, site_num });
                }
                // Blank site numbers never take part in the classification
                (Some(fid), None) => tracing::debug!("ehsit fid {} has no SITE_NUM", fid),
                _ => {}
            }
        }
        Ok(map)
    }

    fn load_facilities(path: &Path) -> Result<FxHashMap<i64, FacilityRecord>> {
        let context = format!("facility table {}", path.display());
        let df = materialize_with_columns(&read_csv(path)?, &["fid", "FACIL_NAME"], &context)?;
        let fids = Self::fids(&df, &context)?;
        let names = string_values(&df, "FACIL_NAME")?;

        Ok(fids
            .into_iter()
            .zip(names)
            .filter_map(|(fid, name)| match (fid, name) {
                (Some(fid), Some(facil_name)) => Some((fid, FacilityRecord { facil_name })),
                _ => None,
            })
            .collect())
    }

    /// Disposition table keyed by `Site_ID`; the first row for a site wins.
    fn load_dispositions(path: &Path, default_final_year: i32) -> Result<FxHashMap<String, DispositionRecord>> {
        let df = materialize_with_columns(
            &read_csv(path)?,
            &[
                "Site_ID",
                "Date_Begin",
                "Date_End",
                "Date_Disposition",
                "Disposition_TPA_Date",
                "Actual_Disposition",
                "TPA_Disposition",
                "Disposition",
            ],
            "disposition table",
        )?;

        let site_ids = string_values(&df, "Site_ID")?;
        let begins = year_values(&df, "Date_Begin")?;
        let ends = year_values(&df, "Date_End")?;
        let currents = year_values(&df, "Date_Disposition")?;
        let finals = year_values(&df, "Disposition_TPA_Date")?;
        let actual = string_values(&df, "Actual_Disposition")?;
        let tpa = string_values(&df, "TPA_Disposition")?;
        let disposition = string_values(&df, "Disposition")?;

        let mut map = FxHashMap::default();
        let mut duplicates = 0usize;
        for i in 0..df.height() {
            let Some(site_id) = site_ids[i].clone() else {
                continue;
            };
            if map.contains_key(&site_id) {
                duplicates += 1;
                continue;
            }
            map.insert(
                site_id,
                DispositionRecord {
                    dates: LifecycleDates::new(
                        begins[i],
                        ends[i],
                        currents[i],
                        Some(finals[i].unwrap_or(default_final_year)),
                    ),
                    actual_disposition: actual[i].clone(),
                    tpa_disposition: tpa[i].clone(),
                    disposition: disposition[i].clone(),
                },
            );
        }
        if duplicates > 0 {
            tracing::warn!("disposition table: {} duplicate Site_ID rows ignored", duplicates);
        }

        Ok(map)
    }

    fn load_disposition_lookup(path: &Path) -> Result<DispositionLookup> {
        let df = materialize_with_columns(
            &read_csv(path)?,
            &["Disposition", "Cover_Type", "SurfCond"],
            "disposition lookup",
        )?;
        let labels = string_values(&df, "Disposition")?;
        let covers = string_values(&df, "Cover_Type")?;
        let surfaces = string_values(&df, "SurfCond")?;

        let rows = labels
            .into_iter()
            .zip(covers.into_iter().zip(surfaces))
            .filter_map(|(label, (cover, surface))| {
                label.map(|label| (label, cover.unwrap_or_default(), surface.unwrap_or_default()))
            });

        let lookup: Result<DispositionLookup, RetError> = DispositionLookup::from_rows(rows);
        lookup.with_context(|| format!("Invalid disposition lookup: {}", path.display()))
    }

    /// Recharge table: `Cover_Type`, `SurfCond`, then one column per soil type.
    fn load_recharge_lookup(path: &Path) -> Result<RechargeLookup> {
        let df = read_csv(path)?;
        materialize_with_columns(&df, &["Cover_Type", "SurfCond"], "recharge lookup")?;

        let soil_types: Vec<String> = df
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .filter(|name| name != "Cover_Type" && name != "SurfCond")
            .collect();

        let covers = string_values(&df, "Cover_Type")?;
        let surfaces = string_values(&df, "SurfCond")?;
        let rates = soil_types
            .iter()
            .map(|soil| float_values(&df, soil))
            .collect::<Result<Vec<_>>>()?;

        let mut lookup = RechargeLookup::new(soil_types);
        for i in 0..df.height() {
            let (Some(cover), Some(surface)) = (&covers[i], &surfaces[i]) else {
                continue;
            };
            let row: Vec<Option<f64>> = rates.iter().map(|column| column[i]).collect();
            lookup.add_row(cover, surface, &row);
        }

        Ok(lookup)
    }
}
