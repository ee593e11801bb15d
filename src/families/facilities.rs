//! Facilities: existing buildings (bggenexs) and building sites (bggensit)
//!
//! Phase from the disposition dates via [`FacilityPhase`]. An operating
//! facility is a barrier; once a disposition applies, the looked-up condition
//! regrows from the disposition year.

use super::{
    group_instances, CoverCondition, CoverLayer, EntityInstance, FamilyClassifier, FamilyOutput, LayerKind,
    YearContext,
};
use crate::classify::{advance, FacilityPhase, OperationalPhase, PhaseStrategy};
use crate::data::{DispositionRecord, FacilityRecord};
use crate::error::RetError;
use crate::overlay::ParcelOverlay;
use crate::store::StagedWrites;
use crate::utils::DispositionMatch;
use rustc_hash::FxHashMap;

pub const BARRIER_SURFACE: &str = "Barrier";
pub const BARRIER_COVER: &str = "Barrier/MinRchrg";

pub struct FacilityClassifier<'d> {
    kind: LayerKind,
    facilities: &'d FxHashMap<i64, FacilityRecord>,
    dispositions: &'d FxHashMap<String, DispositionRecord>,
    strategy: FacilityPhase,
}

impl<'d> FacilityClassifier<'d> {
    /// `kind` is [`LayerKind::ExistingBuildings`] or [`LayerKind::ExistingSites`].
    pub fn new(
        kind: LayerKind,
        facilities: &'d FxHashMap<i64, FacilityRecord>,
        dispositions: &'d FxHashMap<String, DispositionRecord>,
    ) -> Self {
        debug_assert!(matches!(
            kind,
            LayerKind::ExistingBuildings | LayerKind::ExistingSites
        ));
        Self {
            kind,
            facilities,
            dispositions,
            strategy: FacilityPhase,
        }
    }

    fn instance_condition(
        &self,
        instance: &EntityInstance<'_, FacilityRecord>,
        ctx: &YearContext<'_>,
    ) -> Result<CoverCondition, RetError> {
        if ctx.is_seed_year() {
            return Ok(ctx.background_for(instance.brmp_fid));
        }

        let record = self.dispositions.get(&instance.business_key);
        let dates = record.map(|r| r.dates).unwrap_or_default();
        let phase = self.strategy.classify(ctx.model_year, &dates);

        let (label, since) = match phase {
            OperationalPhase::Nonexistent => return Ok(ctx.background_for(instance.brmp_fid)),
            OperationalPhase::Active => return Ok(CoverCondition::new(BARRIER_SURFACE, BARRIER_COVER)),
            OperationalPhase::Intermediate => (
                record.and_then(|r| r.disposition.as_deref()),
                dates.current_disposition,
            ),
            OperationalPhase::Final => (
                record.and_then(|r| r.tpa_disposition.as_deref()),
                dates.final_disposition,
            ),
            OperationalPhase::Inactive | OperationalPhase::Flag => {
                return ctx.carry_forward(self.kind, &instance.key, instance.brmp_fid)
            }
        };

        match ctx.lookups.disposition.resolve(label) {
            DispositionMatch::Found(condition) => {
                let surface = match since {
                    Some(year) => advance(&condition.surface_condition, year, ctx.model_year),
                    None => condition.surface_condition.clone(),
                };
                Ok(CoverCondition::new(surface, condition.cover_type.clone()))
            }
            DispositionMatch::Default(_) | DispositionMatch::Unmatched => {
                ctx.carry_forward(self.kind, &instance.key, instance.brmp_fid)
            }
        }
    }
}

impl FamilyClassifier for FacilityClassifier<'_> {
    fn layer(&self) -> LayerKind {
        self.kind
    }

    fn classify(&self, overlay: &ParcelOverlay, ctx: &YearContext<'_>) -> Result<FamilyOutput, RetError> {
        let instances = group_instances(overlay, self.kind, self.facilities, |f| f.facil_name.clone());
        let mut layer = CoverLayer::new(self.kind.name());
        let mut staged = StagedWrites::new(self.kind, ctx.model_year);

        for instance in &instances {
            let condition = self.instance_condition(instance, ctx)?;
            layer.assign(self.kind, &instance.parcels, &condition);
            staged.insert(instance.key.clone(), condition);
        }

        tracing::debug!("{}: {} {} instances", ctx.model_year, instances.len(), self.kind);

        Ok(FamilyOutput {
            layer,
            staged: Some(staged),
        })
    }
}
