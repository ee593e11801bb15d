//! Cleanup verification packages (CVP)
//!
//! A package's year is the leading number of its `Key_WSRF`. Valid packages
//! are revegetated: they start from the `Developing` disposition and regrow
//! from the package year. Without a `Developing` entry the seed is
//! `undefined`.

use super::{group_instances, CoverCondition, CoverLayer, FamilyClassifier, FamilyOutput, LayerKind, YearContext};
use crate::classify::advance;
use crate::data::CleanupPackageRecord;
use crate::error::RetError;
use crate::overlay::ParcelOverlay;
use crate::store::StagedWrites;
use crate::utils::{DispositionMatch, UNDEFINED_CONDITION};
use rustc_hash::FxHashMap;

/// Disposition label a package starts from.
pub const SEED_LABEL: &str = "Developing";

/// Leading digits of `Key_WSRF`, or 0 when there are none.
pub fn package_year(key_wsrf: &str) -> i32 {
    let digits: String = key_wsrf.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// Whether a package of `year` counts in `model_year`: 2000 up to the model
/// year, or the two-digit years 98 and 99.
pub fn is_valid_package_year(year: i32, model_year: i32) -> bool {
    (2000..=model_year).contains(&year) || (98..100).contains(&year)
}

/// Calendar year of a valid package year (98 → 1998, 99 → 1999).
pub fn calendar_year(year: i32) -> i32 {
    if (98..100).contains(&year) {
        1900 + year
    } else {
        year
    }
}

pub struct CleanupPackageClassifier<'d> {
    packages: &'d FxHashMap<i64, CleanupPackageRecord>,
}

impl<'d> CleanupPackageClassifier<'d> {
    pub fn new(packages: &'d FxHashMap<i64, CleanupPackageRecord>) -> Self {
        Self { packages }
    }
}

impl FamilyClassifier for CleanupPackageClassifier<'_> {
    fn layer(&self) -> LayerKind {
        LayerKind::CleanupPackages
    }

    fn classify(&self, overlay: &ParcelOverlay, ctx: &YearContext<'_>) -> Result<FamilyOutput, RetError> {
        let seed = match ctx.lookups.disposition.resolve(Some(SEED_LABEL)) {
            DispositionMatch::Found(condition) => condition.clone(),
            DispositionMatch::Default(_) | DispositionMatch::Unmatched => {
                tracing::warn!(
                    "Disposition lookup has no '{}' entry; cleanup packages seeded as '{}'",
                    SEED_LABEL,
                    UNDEFINED_CONDITION
                );
                CoverCondition::new(UNDEFINED_CONDITION, UNDEFINED_CONDITION)
            }
        };

        let instances = group_instances(overlay, LayerKind::CleanupPackages, self.packages, |p| {
            p.key_wsrf.clone()
        });
        let mut layer = CoverLayer::new(LayerKind::CleanupPackages.name());
        let mut staged = StagedWrites::new(LayerKind::CleanupPackages, ctx.model_year);
        let mut skipped = 0usize;

        for instance in &instances {
            let year = package_year(&instance.business_key);
            if !is_valid_package_year(year, ctx.model_year) {
                skipped += 1;
                continue;
            }

            let surface = advance(&seed.surface_condition, calendar_year(year), ctx.model_year);
            let condition = CoverCondition::new(surface, seed.cover_type.clone());
            layer.assign(LayerKind::CleanupPackages, &instance.parcels, &condition);
            staged.insert(instance.key.clone(), condition);
        }

        tracing::debug!(
            "{}: {} cleanup packages classified, {} not valid this year",
            ctx.model_year,
            staged.len(),
            skipped
        );

        Ok(FamilyOutput {
            layer,
            staged: Some(staged),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::families::BackgroundDonor;
    use crate::overlay::ParcelRow;
    use crate::store::CrossYearStateStore;
    use crate::utils::{DispositionLookup, LookupTables, RechargeLookup};

    #[test]
    fn test_package_year_parsing() {
        assert_eq!(package_year("2004-100-E"), 2004);
        assert_eq!(package_year("99-200W"), 99);
        assert_eq!(package_year("CVP-2004"), 0);
        assert_eq!(package_year(""), 0);
    }

    #[test]
    fn test_package_validity() {
        assert!(is_valid_package_year(2004, 2004));
        assert!(!is_valid_package_year(2005, 2004));
        assert!(is_valid_package_year(98, 1998));
        assert!(is_valid_package_year(99, 2010));
        assert!(!is_valid_package_year(0, 2010));
        assert!(!is_valid_package_year(1999, 2010));
        assert_eq!(calendar_year(98), 1998);
        assert_eq!(calendar_year(2004), 2004);
    }

    fn classify(lookup_rows: Vec<(&str, &str, &str)>, year: i32) -> FamilyOutput {
        let mut packages = FxHashMap::default();
        packages.insert(1, CleanupPackageRecord { key_wsrf: "2000-045".to_string() });
        packages.insert(2, CleanupPackageRecord { key_wsrf: "2015-001".to_string() });
        let overlay = ParcelOverlay::new(vec![
            ParcelRow { brmp_fid: Some(1), cvp_fid: Some(1), ..ParcelRow::new("c1") },
            ParcelRow { brmp_fid: Some(1), cvp_fid: Some(2), ..ParcelRow::new("c2") },
        ]);
        let lookups = LookupTables {
            disposition: DispositionLookup::from_rows(lookup_rows).unwrap(),
            recharge: RechargeLookup::default(),
        };
        let store = CrossYearStateStore::new();
        let donor = BackgroundDonor::default();
        let ctx = YearContext {
            model_year: year,
            seed_year: 1998,
            lookups: &lookups,
            store: &store,
            background: &donor,
        };
        CleanupPackageClassifier::new(&packages).classify(&overlay, &ctx).unwrap()
    }

    fn revegetation() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![("default", "Shrub-Steppe", "Mature"), ("Developing", "Bunchgrass", "Developing")]
    }

    #[test]
    fn test_packages_regrow_from_package_year() {
        let output = classify(revegetation(), 2010);

        // Developing (10) + 10 years = 20 → still Developing
        let cell = output.layer.get("c1").unwrap();
        assert_eq!(cell.condition, CoverCondition::new("Developing", "Bunchgrass"));
        assert_eq!(cell.source, "cvp");
        // 2015 package not yet valid in 2010
        assert!(output.layer.get("c2").is_none());
        assert!(output.staged.unwrap().get("2000-045_1").is_some());
    }

    #[test]
    fn test_packages_mature_after_thirty_years() {
        let output = classify(revegetation(), 2030);
        assert_eq!(output.layer.get("c1").unwrap().condition.surface_condition, "Mature");
        assert_eq!(output.layer.get("c2").unwrap().condition.surface_condition, "Developing");
    }

    #[test]
    fn test_seed_from_disposition_lookup() {
        let output = classify(
            vec![("default", "Shrub-Steppe", "Mature"), ("developing", "Bunchgrass", "Cheatgrass")],
            2001,
        );
        assert_eq!(
            output.layer.get("c1").unwrap().condition,
            CoverCondition::new("Cheatgrass", "Bunchgrass")
        );
    }

    #[test]
    fn test_missing_seed_entry_is_undefined() {
        // 2003 is inside the grace period of the 2000 package
        let output = classify(vec![("default", "Shrub-Steppe", "Mature")], 2003);
        assert_eq!(
            output.layer.get("c1").unwrap().condition,
            CoverCondition::new("undefined", "undefined")
        );
        assert!(output.staged.unwrap().get("2000-045_1").is_some());
    }
}
