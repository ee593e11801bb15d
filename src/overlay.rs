//! Parcel Overlay
//!
//! The geometry engine's union output, consumed as a table: one row per
//! parcel with the fid of every source polygon lying over it.

use crate::families::LayerKind;
use crate::utils::{int_values, materialize_with_columns, read_csv, string_values};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Overlay column names, in file order.
pub const OVERLAY_COLUMNS: [&str; 9] = [
    "parcel_key",
    "soil_type",
    "brmp_fid",
    "aac1943_fid",
    "naip2011_fid",
    "cvp_fid",
    "ehsit_fid",
    "bggenexs_fid",
    "bggensit_fid",
];

/// One atomic overlay region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParcelRow {
    pub parcel_key: String,
    pub soil_type: Option<String>,
    pub brmp_fid: Option<i64>,
    pub aac1943_fid: Option<i64>,
    pub naip2011_fid: Option<i64>,
    pub cvp_fid: Option<i64>,
    pub ehsit_fid: Option<i64>,
    pub bggenexs_fid: Option<i64>,
    pub bggensit_fid: Option<i64>,
}

impl ParcelRow {
    pub fn new(parcel_key: impl Into<String>) -> Self {
        Self {
            parcel_key: parcel_key.into(),
            ..Default::default()
        }
    }

    /// Polygon of `kind` over this parcel. Both AAC 1943 layers share one source.
    pub fn fid(&self, kind: LayerKind) -> Option<i64> {
        match kind {
            LayerKind::Brmp => self.brmp_fid,
            LayerKind::Aac1943 | LayerKind::Aac1943Fallow => self.aac1943_fid,
            LayerKind::Naip2011 => self.naip2011_fid,
            LayerKind::CleanupPackages => self.cvp_fid,
            LayerKind::WasteSites => self.ehsit_fid,
            LayerKind::ExistingBuildings => self.bggenexs_fid,
            LayerKind::ExistingSites => self.bggensit_fid,
        }
    }
}

/// All parcels of one year's overlay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParcelOverlay {
    pub rows: Vec<ParcelRow>,
}

impl ParcelOverlay {
    pub fn new(rows: Vec<ParcelRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Load an overlay table. Missing fid columns are treated as empty.
    pub fn from_csv(path: &Path) -> Result<Self> {
        let df = read_csv(path)?;
        materialize_with_columns(&df, &OVERLAY_COLUMNS[..2], "parcel overlay")
            .with_context(|| format!("Invalid overlay table: {}", path.display()))?;

        let keys = string_values(&df, "parcel_key")?;
        let soils = string_values(&df, "soil_type")?;
        let height = df.height();
        let fid_column = |name: &str| -> Result<Vec<Option<i64>>> {
            if df.column(name).is_ok() {
                int_values(&df, name)
            } else {
                Ok(vec![None; height])
            }
        };

        let brmp = fid_column("brmp_fid")?;
        let aac1943 = fid_column("aac1943_fid")?;
        let naip2011 = fid_column("naip2011_fid")?;
        let cvp = fid_column("cvp_fid")?;
        let ehsit = fid_column("ehsit_fid")?;
        let bggenexs = fid_column("bggenexs_fid")?;
        let bggensit = fid_column("bggensit_fid")?;

        let mut rows = Vec::with_capacity(height);
        for i in 0..height {
            let Some(parcel_key) = keys[i].clone() else {
                tracing::warn!("Overlay row {} in {} has no parcel_key; skipped", i, path.display());
                continue;
            };
            rows.push(ParcelRow {
                parcel_key,
                soil_type: soils[i].clone(),
                brmp_fid: brmp[i],
                aac1943_fid: aac1943[i],
                naip2011_fid: naip2011[i],
                cvp_fid: cvp[i],
                ehsit_fid: ehsit[i],
                bggenexs_fid: bggenexs[i],
                bggensit_fid: bggensit[i],
            });
        }

        Ok(Self { rows })
    }
}

/// Supplies the overlay for each model year.
pub trait OverlaySource {
    fn overlay_for_year(&self, year: i32) -> Result<ParcelOverlay>;
}

/// The same overlay every year.
#[derive(Debug, Clone)]
pub struct StaticOverlay(pub ParcelOverlay);

impl OverlaySource for StaticOverlay {
    fn overlay_for_year(&self, _year: i32) -> Result<ParcelOverlay> {
        Ok(self.0.clone())
    }
}

/// Overlays from a directory: `parcels_{year}.csv` when present, else `parcels.csv`.
#[derive(Debug, Clone)]
pub struct CsvOverlayDir {
    dir: PathBuf,
    shared_file: String,
}

impl CsvOverlayDir {
    pub fn new(dir: impl Into<PathBuf>, shared_file: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            shared_file: shared_file.into(),
        }
    }

    /// Path the overlay for `year` is read from.
    pub fn path_for_year(&self, year: i32) -> PathBuf {
        let stem = Path::new(&self.shared_file)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("parcels");
        let per_year = self.dir.join(format!("{}_{}.csv", stem, year));
        if per_year.exists() {
            per_year
        } else {
            self.dir.join(&self.shared_file)
        }
    }
}

impl OverlaySource for CsvOverlayDir {
    fn overlay_for_year(&self, year: i32) -> Result<ParcelOverlay> {
        let path = self.path_for_year(year);
        tracing::debug!("Overlay for {} from {}", year, path.display());
        ParcelOverlay::from_csv(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("recharge_overlay_{}_{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_fid_by_layer() {
        let row = ParcelRow {
            brmp_fid: Some(1),
            aac1943_fid: Some(2),
            ehsit_fid: Some(3),
            ..ParcelRow::new("p1")
        };
        assert_eq!(row.fid(LayerKind::Brmp), Some(1));
        assert_eq!(row.fid(LayerKind::Aac1943Fallow), Some(2));
        assert_eq!(row.fid(LayerKind::WasteSites), Some(3));
        assert_eq!(row.fid(LayerKind::ExistingSites), None);
    }

    #[test]
    fn test_from_csv_with_empty_fids() {
        let dir = temp_dir("read");
        let path = dir.join("parcels.csv");
        fs::write(
            &path,
            "parcel_key,soil_type,brmp_fid,ehsit_fid\np1,Qy,1,\np2,Ri,,7\n",
        )
        .unwrap();

        let overlay = ParcelOverlay::from_csv(&path).unwrap();
        assert_eq!(overlay.len(), 2);
        assert_eq!(overlay.rows[0].soil_type.as_deref(), Some("Qy"));
        assert_eq!(overlay.rows[0].brmp_fid, Some(1));
        assert_eq!(overlay.rows[0].ehsit_fid, None);
        assert_eq!(overlay.rows[1].brmp_fid, None);
        assert_eq!(overlay.rows[1].ehsit_fid, Some(7));
        assert_eq!(overlay.rows[1].cvp_fid, None);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_per_year_overlay_preferred() {
        let dir = temp_dir("per_year");
        fs::write(dir.join("parcels.csv"), "parcel_key,soil_type\nshared,Qy\n").unwrap();
        fs::write(dir.join("parcels_1950.csv"), "parcel_key,soil_type\nyearly,Qy\n").unwrap();

        let source = CsvOverlayDir::new(&dir, "parcels.csv");
        assert_eq!(source.overlay_for_year(1950).unwrap().rows[0].parcel_key, "yearly");
        assert_eq!(source.overlay_for_year(1951).unwrap().rows[0].parcel_key, "shared");

        fs::remove_dir_all(&dir).ok();
    }
}
