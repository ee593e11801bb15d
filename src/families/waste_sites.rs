//! Waste sites (ehsit)
//!
//! Phase from the disposition dates via [`WasteSitePhase`], then:
//! NONEXISTENT → background, ACTIVE/INACTIVE → bare disturbed ground,
//! INTERMEDIATE/FINAL → disposition label lookup, FLAG → carry forward.
//! Waste sites do not undergo succession.

use super::{
    group_instances, CoverCondition, CoverLayer, EntityInstance, FamilyClassifier, FamilyOutput, LayerKind,
    YearContext,
};
use crate::classify::{OperationalPhase, PhaseStrategy, WasteSitePhase};
use crate::data::{DispositionRecord, WasteSiteRecord};
use crate::error::RetError;
use crate::overlay::ParcelOverlay;
use crate::store::StagedWrites;
use crate::utils::DispositionMatch;
use rustc_hash::{FxHashMap, FxHashSet};

/// Surface condition of an operating or idle waste site.
pub const DISTURBED_SURFACE: &str = "Bare";
/// Cover type of an operating or idle waste site.
pub const DISTURBED_COVER: &str = "Disturbed";

pub struct WasteSiteClassifier<'d> {
    sites: FxHashMap<i64, &'d WasteSiteRecord>,
    dispositions: &'d FxHashMap<String, DispositionRecord>,
    strategy: WasteSitePhase,
}

impl<'d> WasteSiteClassifier<'d> {
    /// Sites whose `HAZSITE_ID` is in `excluded` are dropped here.
    pub fn new(
        sites: &'d FxHashMap<i64, WasteSiteRecord>,
        dispositions: &'d FxHashMap<String, DispositionRecord>,
        excluded: &[i64],
    ) -> Self {
        let excluded: FxHashSet<i64> = excluded.iter().copied().collect();
        let kept: FxHashMap<i64, &'d WasteSiteRecord> = sites
            .iter()
            .filter(|(_, site)| !site.hazsite_id.is_some_and(|id| excluded.contains(&id)))
            .map(|(&fid, site)| (fid, site))
            .collect();

        if kept.len() < sites.len() {
            tracing::debug!("Excluded {} waste site polygons", sites.len() - kept.len());
        }

        Self {
            sites: kept,
            dispositions,
            strategy: WasteSitePhase,
        }
    }

    fn instance_condition(
        &self,
        instance: &EntityInstance<'_, &'d WasteSiteRecord>,
        ctx: &YearContext<'_>,
    ) -> Result<CoverCondition, RetError> {
        if ctx.is_seed_year() {
            return Ok(ctx.background_for(instance.brmp_fid));
        }

        let record = self.dispositions.get(&instance.business_key);
        let dates = record.map(|r| r.dates).unwrap_or_default();
        let phase = self.strategy.classify(ctx.model_year, &dates);

        let label = match phase {
            OperationalPhase::Nonexistent => return Ok(ctx.background_for(instance.brmp_fid)),
            OperationalPhase::Active | OperationalPhase::Inactive => {
                return Ok(CoverCondition::new(DISTURBED_SURFACE, DISTURBED_COVER))
            }
            OperationalPhase::Intermediate => record.and_then(|r| r.actual_disposition.as_deref()),
            OperationalPhase::Final => record.and_then(|r| r.tpa_disposition.as_deref()),
            OperationalPhase::Flag => {
                return ctx.carry_forward(LayerKind::WasteSites, &instance.key, instance.brmp_fid)
            }
        };

        match ctx.lookups.disposition.resolve(label) {
            DispositionMatch::Found(condition) => Ok(condition.clone()),
            DispositionMatch::Default(_) => {
                ctx.carry_forward(LayerKind::WasteSites, &instance.key, instance.brmp_fid)
            }
            DispositionMatch::Unmatched => {
                tracing::debug!(
                    "Waste site {}: disposition '{}' not in lookup; carrying forward",
                    instance.key,
                    label.unwrap_or_default()
                );
                ctx.carry_forward(LayerKind::WasteSites, &instance.key, instance.brmp_fid)
            }
        }
    }
}

impl FamilyClassifier for WasteSiteClassifier<'_> {
    fn layer(&self) -> LayerKind {
        LayerKind::WasteSites
    }

    fn classify(&self, overlay: &ParcelOverlay, ctx: &YearContext<'_>) -> Result<FamilyOutput, RetError> {
        let instances = group_instances(overlay, LayerKind::WasteSites, &self.sites, |site| site.site_id());
        let mut layer = CoverLayer::new(LayerKind::WasteSites.name());
        let mut staged = StagedWrites::new(LayerKind::WasteSites, ctx.model_year);

        for instance in &instances {
            let condition = self.instance_condition(instance, ctx)?;
            layer.assign(LayerKind::WasteSites, &instance.parcels, &condition);
            staged.insert(instance.key.clone(), condition);
        }

        tracing::debug!(
            "{}: {} waste site instances over {} parcels",
            ctx.model_year,
            instances.len(),
            layer.len()
        );

        Ok(FamilyOutput {
            layer,
            staged: Some(staged),
        })
    }
}
