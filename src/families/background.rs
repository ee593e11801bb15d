//! Background vegetation layers
//!
//! BRMP is the regional baseline and doubles as the background donor that
//! waste sites and facilities fall back to. AAC 1943 and NAIP 2011 are
//! historical cover maps copied onto the parcels they cover.

use super::{CoverCondition, CoverLayer, FamilyClassifier, FamilyOutput, LayerKind, YearContext};
use crate::data::{BrmpPolygon, CoverPolygon};
use crate::error::RetError;
use crate::overlay::ParcelOverlay;
use crate::utils::{RechargeLookup, UNDEFINED_CONDITION};
use rustc_hash::FxHashMap;

/// BRMP cover names that differ from the recharge table's.
const BRMP_COVER_RENAMES: [(&str, &str); 2] = [
    (
        "Gravel/Industrial/Non-Vegetated/Agricultural/Exotic Weed",
        "Gravel/Industrial/Non-Vegetated/Exotic Weed",
    ),
    ("Barrier-MinRchrg", "Barrier/MinRchrg"),
];

/// Recharge-table spelling of a BRMP cover type.
pub fn brmp_cover_type(cover: &str) -> &str {
    BRMP_COVER_RENAMES
        .iter()
        .find(|(from, _)| *from == cover)
        .map_or(cover, |(_, to)| *to)
}

/// AAC 1943 through 1943: cheatgrass read as irrigated land, abandoned fields
/// as orchards.
pub fn aac1943_condition(polygon: &CoverPolygon) -> CoverCondition {
    let surface = match polygon.surface_condition.as_deref() {
        Some("Cheatgrass") => "Irrigated",
        Some(other) => other,
        None => UNDEFINED_CONDITION,
    };
    let cover = match polygon.cover_type.as_deref() {
        Some("Abandoned Fields") => "Agricultural / Orchard",
        Some(other) => other,
        None => UNDEFINED_CONDITION,
    };
    CoverCondition::new(surface, cover)
}

fn copied_condition(polygon: &CoverPolygon) -> CoverCondition {
    CoverCondition::new(
        polygon.surface_condition.as_deref().unwrap_or(UNDEFINED_CONDITION),
        polygon.cover_type.as_deref().unwrap_or(UNDEFINED_CONDITION),
    )
}

/// BRMP condition per polygon, computed once per year before any family
/// that reads it.
#[derive(Debug, Clone, Default)]
pub struct BackgroundDonor {
    by_fid: FxHashMap<i64, CoverCondition>,
}

impl BackgroundDonor {
    /// Resolve every BRMP polygon's surface condition through the recharge
    /// table's cover → surface pairs.
    pub fn from_brmp(brmp: &FxHashMap<i64, BrmpPolygon>, recharge: &RechargeLookup) -> Self {
        let mut by_fid = FxHashMap::default();
        let mut undefined = 0usize;

        for (&fid, polygon) in brmp {
            let cover = polygon
                .cover_type
                .as_deref()
                .map_or(UNDEFINED_CONDITION, brmp_cover_type);
            let surface = match recharge.surface_condition_for_cover(cover) {
                Some(surface) => surface,
                None => {
                    undefined += 1;
                    UNDEFINED_CONDITION
                }
            };
            by_fid.insert(fid, CoverCondition::new(surface, cover));
        }

        if undefined > 0 {
            tracing::warn!(
                "{} BRMP polygons have a cover type missing from the recharge table; surface set to '{}'",
                undefined,
                UNDEFINED_CONDITION
            );
        }

        Self { by_fid }
    }

    pub fn from_conditions(by_fid: FxHashMap<i64, CoverCondition>) -> Self {
        Self { by_fid }
    }

    pub fn condition(&self, brmp_fid: i64) -> Option<&CoverCondition> {
        self.by_fid.get(&brmp_fid)
    }

    pub fn len(&self) -> usize {
        self.by_fid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_fid.is_empty()
    }
}

/// The BRMP output layer: the donor's condition on every parcel it covers.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrmpClassifier;

impl FamilyClassifier for BrmpClassifier {
    fn layer(&self) -> LayerKind {
        LayerKind::Brmp
    }

    fn classify(&self, overlay: &ParcelOverlay, ctx: &YearContext<'_>) -> Result<FamilyOutput, RetError> {
        let mut layer = CoverLayer::new(LayerKind::Brmp.name());
        for row in &overlay.rows {
            if let Some(condition) = row.brmp_fid.and_then(|fid| ctx.background.condition(fid)) {
                layer.assign(LayerKind::Brmp, std::slice::from_ref(&row.parcel_key), condition);
            }
        }
        Ok(FamilyOutput { layer, staged: None })
    }
}

/// AAC 1943, AAC 1943 fallow or NAIP 2011.
#[derive(Debug, Clone, Copy)]
pub struct HistoricalCoverClassifier<'d> {
    kind: LayerKind,
    polygons: &'d FxHashMap<i64, CoverPolygon>,
}

impl<'d> HistoricalCoverClassifier<'d> {
    pub fn new(kind: LayerKind, polygons: &'d FxHashMap<i64, CoverPolygon>) -> Self {
        Self { kind, polygons }
    }
}

impl FamilyClassifier for HistoricalCoverClassifier<'_> {
    fn layer(&self) -> LayerKind {
        self.kind
    }

    fn classify(&self, overlay: &ParcelOverlay, _ctx: &YearContext<'_>) -> Result<FamilyOutput, RetError> {
        let mut layer = CoverLayer::new(self.kind.name());
        for row in &overlay.rows {
            let Some(polygon) = row.fid(self.kind).and_then(|fid| self.polygons.get(&fid)) else {
                continue;
            };
            let condition = match self.kind {
                LayerKind::Aac1943 => aac1943_condition(polygon),
                _ => copied_condition(polygon),
            };
            layer.assign(self.kind, std::slice::from_ref(&row.parcel_key), &condition);
        }
        Ok(FamilyOutput { layer, staged: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::ParcelRow;
    use crate::store::CrossYearStateStore;
    use crate::utils::{DispositionLookup, LookupTables};

    fn recharge() -> RechargeLookup {
        let mut lookup = RechargeLookup::new(vec!["Qy".to_string()]);
        lookup.add_row("Shrub-Steppe", "Mature", &[Some(3.6)]);
        lookup.add_row("Barrier/MinRchrg", "Barrier", &[Some(0.1)]);
        lookup
    }

    fn lookups() -> LookupTables {
        LookupTables {
            disposition: DispositionLookup::from_rows(vec![("default", "Shrub-Steppe", "Mature")]).unwrap(),
            recharge: recharge(),
        }
    }

    #[test]
    fn test_brmp_renames() {
        assert_eq!(brmp_cover_type("Barrier-MinRchrg"), "Barrier/MinRchrg");
        assert_eq!(
            brmp_cover_type("Gravel/Industrial/Non-Vegetated/Agricultural/Exotic Weed"),
            "Gravel/Industrial/Non-Vegetated/Exotic Weed"
        );
        assert_eq!(brmp_cover_type("Shrub-Steppe"), "Shrub-Steppe");
    }

    #[test]
    fn test_donor_surface_from_recharge_table() {
        let mut brmp = FxHashMap::default();
        brmp.insert(1, BrmpPolygon { cover_type: Some("Barrier-MinRchrg".to_string()) });
        brmp.insert(2, BrmpPolygon { cover_type: Some("Riparian".to_string()) });

        let donor = BackgroundDonor::from_brmp(&brmp, &recharge());
        assert_eq!(donor.condition(1), Some(&CoverCondition::new("Barrier", "Barrier/MinRchrg")));
        assert_eq!(donor.condition(2), Some(&CoverCondition::new("undefined", "Riparian")));
        assert_eq!(donor.condition(3), None);
    }

    #[test]
    fn test_aac1943_mappings() {
        let polygon = CoverPolygon {
            surface_condition: Some("Cheatgrass".to_string()),
            cover_type: Some("Abandoned Fields".to_string()),
        };
        assert_eq!(
            aac1943_condition(&polygon),
            CoverCondition::new("Irrigated", "Agricultural / Orchard")
        );
    }

    #[test]
    fn test_fallow_copies_unchanged() {
        let mut polygons = FxHashMap::default();
        polygons.insert(
            5,
            CoverPolygon {
                surface_condition: Some("Cheatgrass".to_string()),
                cover_type: Some("Abandoned Fields".to_string()),
            },
        );
        let overlay = ParcelOverlay::new(vec![
            ParcelRow { aac1943_fid: Some(5), ..ParcelRow::new("p1") },
            ParcelRow::new("p2"),
        ]);
        let lookups = lookups();
        let store = CrossYearStateStore::new();
        let donor = BackgroundDonor::default();
        let ctx = YearContext {
            model_year: 1950,
            seed_year: 1944,
            lookups: &lookups,
            store: &store,
            background: &donor,
        };

        let fallow = HistoricalCoverClassifier::new(LayerKind::Aac1943Fallow, &polygons)
            .classify(&overlay, &ctx)
            .unwrap();
        let cell = fallow.layer.get("p1").unwrap();
        assert_eq!(cell.condition, CoverCondition::new("Cheatgrass", "Abandoned Fields"));
        assert_eq!(cell.source, "AAC_1943");
        assert!(fallow.layer.get("p2").is_none());
        assert!(fallow.staged.is_none());

        let early = HistoricalCoverClassifier::new(LayerKind::Aac1943, &polygons)
            .classify(&overlay, &ctx)
            .unwrap();
        assert_eq!(early.layer.get("p1").unwrap().condition.surface_condition, "Irrigated");
    }

    #[test]
    fn test_brmp_layer_uses_donor() {
        let mut brmp = FxHashMap::default();
        brmp.insert(1, BrmpPolygon { cover_type: Some("Shrub-Steppe".to_string()) });
        let donor = BackgroundDonor::from_brmp(&brmp, &recharge());
        let overlay = ParcelOverlay::new(vec![
            ParcelRow { brmp_fid: Some(1), ..ParcelRow::new("p1") },
            ParcelRow { brmp_fid: Some(9), ..ParcelRow::new("p2") },
        ]);
        let lookups = lookups();
        let store = CrossYearStateStore::new();
        let ctx = YearContext {
            model_year: 1943,
            seed_year: 1943,
            lookups: &lookups,
            store: &store,
            background: &donor,
        };

        let output = BrmpClassifier.classify(&overlay, &ctx).unwrap();
        assert_eq!(output.layer.len(), 1);
        let cell = output.layer.get("p1").unwrap();
        assert_eq!(cell.condition, CoverCondition::new("Mature", "Shrub-Steppe"));
        assert_eq!(cell.source, "BRMP_2011");
    }
}
