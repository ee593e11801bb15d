//! Entity family classifiers
//!
//! One module per family, each turning the year's overlay into a classified
//! layer of (surface condition, cover type) cells keyed by parcel.
//!
//! Precedence (later overwrites earlier when merged):
//! BRMP → AAC 1943 / AAC 1943 fallow → NAIP 2011 → CVP → ehsit → bggenexs → bggensit

pub mod background;
pub mod cleanup_packages;
pub mod facilities;
pub mod waste_sites;

pub use background::{BackgroundDonor, BrmpClassifier, HistoricalCoverClassifier};
pub use cleanup_packages::CleanupPackageClassifier;
pub use facilities::FacilityClassifier;
pub use waste_sites::WasteSiteClassifier;

use crate::error::RetError;
use crate::overlay::ParcelOverlay;
use crate::store::{CrossYearStateStore, StagedWrites};
use crate::utils::LookupTables;
use rustc_hash::FxHashMap;

/// Surface condition and cover type pair: the unit every classifier produces.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CoverCondition {
    pub surface_condition: String,
    pub cover_type: String,
}

impl CoverCondition {
    pub fn new(surface_condition: impl Into<String>, cover_type: impl Into<String>) -> Self {
        Self {
            surface_condition: surface_condition.into(),
            cover_type: cover_type.into(),
        }
    }
}

/// Condition plus the label of the layer it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverAttributes {
    pub condition: CoverCondition,
    pub source: String,
}

/// Every input layer, in merge precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LayerKind {
    Brmp,
    Aac1943,
    Aac1943Fallow,
    Naip2011,
    CleanupPackages,
    WasteSites,
    ExistingBuildings,
    ExistingSites,
}

impl LayerKind {
    /// All layers, lowest precedence first
    pub const PRECEDENCE: [LayerKind; 8] = [
        LayerKind::Brmp,
        LayerKind::Aac1943,
        LayerKind::Aac1943Fallow,
        LayerKind::Naip2011,
        LayerKind::CleanupPackages,
        LayerKind::WasteSites,
        LayerKind::ExistingBuildings,
        LayerKind::ExistingSites,
    ];

    /// Value written to the `Source` attribute
    pub fn source_label(self) -> &'static str {
        match self {
            LayerKind::Brmp => "BRMP_2011",
            LayerKind::Aac1943 | LayerKind::Aac1943Fallow => "AAC_1943",
            LayerKind::Naip2011 => "NAIP_2011",
            LayerKind::CleanupPackages => "cvp",
            LayerKind::WasteSites => "ehsit",
            LayerKind::ExistingBuildings => "bggenexs",
            LayerKind::ExistingSites => "bggensit",
        }
    }

    /// Short name for logs and errors
    pub fn name(self) -> &'static str {
        match self {
            LayerKind::Brmp => "brmp",
            LayerKind::Aac1943 => "aac1943",
            LayerKind::Aac1943Fallow => "aac1943_fallow",
            LayerKind::Naip2011 => "naip2011",
            LayerKind::CleanupPackages => "cvp",
            LayerKind::WasteSites => "ehsit",
            LayerKind::ExistingBuildings => "bggenexs",
            LayerKind::ExistingSites => "bggensit",
        }
    }

    /// Whether the classifier reads the BRMP background donor in the same year.
    pub fn reads_background(self) -> bool {
        matches!(
            self,
            LayerKind::Brmp | LayerKind::WasteSites | LayerKind::ExistingBuildings | LayerKind::ExistingSites
        )
    }
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One classified layer: parcel key → attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverLayer {
    pub name: String,
    pub cells: FxHashMap<String, CoverAttributes>,
}

impl CoverLayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: FxHashMap::default(),
        }
    }

    /// Assign `condition` to every parcel in `parcels`, tagged with `kind`'s source.
    pub fn assign(&mut self, kind: LayerKind, parcels: &[String], condition: &CoverCondition) {
        for parcel in parcels {
            self.cells.insert(
                parcel.clone(),
                CoverAttributes {
                    condition: condition.clone(),
                    source: kind.source_label().to_string(),
                },
            );
        }
    }

    pub fn get(&self, parcel_key: &str) -> Option<&CoverAttributes> {
        self.cells.get(parcel_key)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Everything a classifier may read for one model year.
///
/// Built by the driver; classifiers never mutate it. State for the next year
/// is returned as [`StagedWrites`] and committed by the driver.
pub struct YearContext<'a> {
    pub model_year: i32,
    /// First year of the run; every stateful layer takes the background then.
    pub seed_year: i32,
    pub lookups: &'a LookupTables,
    pub store: &'a CrossYearStateStore,
    pub background: &'a BackgroundDonor,
}

impl YearContext<'_> {
    pub fn is_seed_year(&self) -> bool {
        self.model_year == self.seed_year
    }

    /// Co-located background condition for an instance.
    ///
    /// An instance with no BRMP polygon under it gets the disposition
    /// lookup's `default` entry.
    pub fn background_for(&self, brmp_fid: Option<i64>) -> CoverCondition {
        match brmp_fid.and_then(|fid| self.background.condition(fid)) {
            Some(condition) => condition.clone(),
            None => {
                tracing::warn!(
                    "No background condition for BRMP fid {:?} in {}; using disposition default",
                    brmp_fid,
                    self.model_year
                );
                self.lookups.disposition.default_condition().clone()
            }
        }
    }

    /// Whether `layer` has committed state from an earlier year.
    pub fn has_history(&self, layer: LayerKind) -> bool {
        self.store.last_year(layer).is_some()
    }

    /// Previous year's stored condition.
    ///
    /// A layer classified for the first time after the seed year (eligible
    /// only from a later year) has nothing to carry, so its instances take the
    /// background. Once the layer has history, a miss is fatal.
    pub fn carry_forward(
        &self,
        layer: LayerKind,
        key: &str,
        brmp_fid: Option<i64>,
    ) -> Result<CoverCondition, RetError> {
        if !self.has_history(layer) {
            tracing::debug!("{} {}: first {} pass, carrying background", self.model_year, key, layer);
            return Ok(self.background_for(brmp_fid));
        }
        self.store.require(layer, key, self.model_year).cloned()
    }
}

/// Output of one family pass.
#[derive(Debug)]
pub struct FamilyOutput {
    pub layer: CoverLayer,
    /// State to commit once the whole year has succeeded (None for stateless layers)
    pub staged: Option<StagedWrites>,
}

/// A classifier for one layer.
pub trait FamilyClassifier {
    fn layer(&self) -> LayerKind;

    fn classify(&self, overlay: &ParcelOverlay, ctx: &YearContext<'_>) -> Result<FamilyOutput, RetError>;
}

/// An entity instance: the parcels sharing one business key and BRMP polygon.
#[derive(Debug, Clone)]
pub struct EntityInstance<'r, T> {
    pub key: String,
    pub business_key: String,
    pub brmp_fid: Option<i64>,
    pub parcels: Vec<String>,
    pub record: &'r T,
}

/// Composite key `{businessKey}_{brmpFid}`, with -1 for "no BRMP polygon".
pub fn composite_key(business_key: &str, brmp_fid: Option<i64>) -> String {
    format!("{}_{}", business_key, brmp_fid.unwrap_or(-1))
}

/// Group the overlay parcels of `kind` into entity instances.
///
/// Parcels whose layer fid is missing from `records` (e.g. excluded records)
/// are skipped. Instances keep first-appearance order.
pub fn group_instances<'r, T>(
    overlay: &ParcelOverlay,
    kind: LayerKind,
    records: &'r FxHashMap<i64, T>,
    business_key: impl Fn(&T) -> String,
) -> Vec<EntityInstance<'r, T>> {
    let mut instances: Vec<EntityInstance<'r, T>> = Vec::new();
    let mut index: FxHashMap<String, usize> = FxHashMap::default();

    for row in &overlay.rows {
        let Some(record) = row.fid(kind).and_then(|fid| records.get(&fid)) else {
            continue;
        };
        let business = business_key(record);
        let key = composite_key(&business, row.brmp_fid);

        match index.get(&key) {
            Some(&i) => instances[i].parcels.push(row.parcel_key.clone()),
            None => {
                index.insert(key.clone(), instances.len());
                instances.push(EntityInstance {
                    key,
                    business_key: business,
                    brmp_fid: row.brmp_fid,
                    parcels: vec![row.parcel_key.clone()],
                    record,
                });
            }
        }
    }

    instances
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::ParcelRow;

    #[test]
    fn test_composite_key_format() {
        assert_eq!(composite_key("216-A-1", Some(42)), "216-A-1_42");
        assert_eq!(composite_key("216-A-1", None), "216-A-1_-1");
    }

    #[test]
    fn test_group_instances_by_business_key_and_brmp() {
        let mut overlay = ParcelOverlay::default();
        for (parcel, brmp, site) in [("p1", 1, 10), ("p2", 1, 10), ("p3", 2, 10), ("p4", 2, 11), ("p5", 2, 99)] {
            overlay.rows.push(ParcelRow {
                parcel_key: parcel.to_string(),
                brmp_fid: Some(brmp),
                ehsit_fid: Some(site),
                ..Default::default()
            });
        }
        let mut records: FxHashMap<i64, String> = FxHashMap::default();
        records.insert(10, "A".to_string());
        records.insert(11, "A".to_string());

        let instances = group_instances(&overlay, LayerKind::WasteSites, &records, |r| r.clone());
        let keys: Vec<&str> = instances.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["A_1", "A_2"]);
        assert_eq!(instances[0].parcels, vec!["p1", "p2"]);
        // Two polygons of the same site over one BRMP polygon are one instance
        assert_eq!(instances[1].parcels, vec!["p3", "p4"]);
    }

    #[test]
    fn test_precedence_order_is_sorted() {
        let mut sorted = LayerKind::PRECEDENCE;
        sorted.sort();
        assert_eq!(sorted, LayerKind::PRECEDENCE);
    }
}
