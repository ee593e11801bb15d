//! Operational Phase Classification
//!
//! Derives a lifecycle phase for an entity instance from its four optional
//! date attributes and the model year.
//!
//! Two strategies exist and are kept separate on purpose: waste sites and
//! facilities evolved different branch orders, and the differences change the
//! outcome at the edges (see `test_strategies_diverge_*` below).

/// Lifecycle phase of an entity instance in a given model year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationalPhase {
    /// Not yet built / not yet accepting waste
    Nonexistent,
    /// Operating or under construction
    Active,
    /// Exists but no longer operating, awaiting disposition
    Inactive,
    /// Between the current and the final disposition
    Intermediate,
    /// All planned remediation concluded
    Final,
    /// Missing or contradictory dates
    Flag,
}

impl OperationalPhase {
    /// Position in the lifecycle order. FLAG sits outside the order.
    pub fn lifecycle_rank(self) -> Option<u8> {
        match self {
            OperationalPhase::Nonexistent => Some(0),
            OperationalPhase::Active => Some(1),
            OperationalPhase::Inactive => Some(2),
            OperationalPhase::Intermediate => Some(3),
            OperationalPhase::Final => Some(4),
            OperationalPhase::Flag => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OperationalPhase::Nonexistent => "NONEXISTENT",
            OperationalPhase::Active => "ACTIVE",
            OperationalPhase::Inactive => "INACTIVE",
            OperationalPhase::Intermediate => "INTERMEDIATE",
            OperationalPhase::Final => "FINAL",
            OperationalPhase::Flag => "FLAG",
        }
    }
}

impl std::fmt::Display for OperationalPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four lifecycle dates, each a year or absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LifecycleDates {
    pub start_ops: Option<i32>,
    pub end_ops: Option<i32>,
    pub current_disposition: Option<i32>,
    pub final_disposition: Option<i32>,
}

impl LifecycleDates {
    pub fn new(
        start_ops: Option<i32>,
        end_ops: Option<i32>,
        current_disposition: Option<i32>,
        final_disposition: Option<i32>,
    ) -> Self {
        Self {
            start_ops,
            end_ops,
            current_disposition,
            final_disposition,
        }
    }
}

/// Phase derivation strategy for one entity family.
pub trait PhaseStrategy {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Classify one instance for `model_year`.
    fn classify(&self, model_year: i32, dates: &LifecycleDates) -> OperationalPhase;
}

/// Waste-site phase tree.
///
/// Branches are tried in priority order and the first match wins:
/// 1. start known: before start → NONEXISTENT; within start..=end → ACTIVE;
///    then the disposition tail (needs end, then current, then final date)
/// 2. start unknown, end and current known: the disposition tail
/// 3. current and final known: INTERMEDIATE / FINAL
/// 4. only final known: FINAL once reached
///
/// Anything not bracketed is FLAG.
#[derive(Debug, Clone, Copy, Default)]
pub struct WasteSitePhase;

impl WasteSitePhase {
    fn disposition_tail(model_year: i32, current: i32, final_disposition: Option<i32>) -> OperationalPhase {
        match final_disposition {
            Some(fin) if model_year >= current && model_year < fin => OperationalPhase::Intermediate,
            Some(fin) if model_year >= fin => OperationalPhase::Final,
            _ => OperationalPhase::Flag,
        }
    }
}

impl PhaseStrategy for WasteSitePhase {
    fn name(&self) -> &'static str {
        "waste-site"
    }

    fn classify(&self, model_year: i32, dates: &LifecycleDates) -> OperationalPhase {
        let y = model_year;
        match (dates.start_ops, dates.end_ops, dates.current_disposition, dates.final_disposition) {
            (Some(start), end, current, fin) => {
                if y < start {
                    return OperationalPhase::Nonexistent;
                }
                let Some(end) = end else {
                    return OperationalPhase::Flag;
                };
                if y <= end {
                    return OperationalPhase::Active;
                }
                let Some(current) = current else {
                    return OperationalPhase::Flag;
                };
                if y < current {
                    return OperationalPhase::Inactive;
                }
                Self::disposition_tail(y, current, fin)
            }
            (None, Some(end), Some(current), fin) => {
                if y > end && y < current {
                    OperationalPhase::Inactive
                } else {
                    Self::disposition_tail(y, current, fin)
                }
            }
            (None, None, Some(current), Some(fin)) => Self::disposition_tail(y, current, Some(fin)),
            (None, _, None, Some(fin)) if y >= fin => OperationalPhase::Final,
            _ => OperationalPhase::Flag,
        }
    }
}

/// Nothing existed on site before this year; facilities are NONEXISTENT
/// before it whatever their dates say.
pub const FACILITY_EPOCH_YEAR: i32 = 1943;

/// Facility (buildings and building sites) phase tree.
///
/// Differs from [`WasteSitePhase`]:
/// - any year before 1943 is NONEXISTENT
/// - the start year itself is ACTIVE even without an end date
/// - the INACTIVE and INTERMEDIATE checks tolerate a missing earlier date
#[derive(Debug, Clone, Copy, Default)]
pub struct FacilityPhase;

impl PhaseStrategy for FacilityPhase {
    fn name(&self) -> &'static str {
        "facility"
    }

    fn classify(&self, model_year: i32, dates: &LifecycleDates) -> OperationalPhase {
        let y = model_year;
        if y < FACILITY_EPOCH_YEAR {
            return OperationalPhase::Nonexistent;
        }

        if let Some(start) = dates.start_ops {
            if y < start {
                return OperationalPhase::Nonexistent;
            }
            if y == start {
                return OperationalPhase::Active;
            }
            if let Some(end) = dates.end_ops {
                if y <= end {
                    return OperationalPhase::Active;
                }
            }
        }

        if let Some(current) = dates.current_disposition {
            let past_end = dates.end_ops.map_or(true, |end| y > end);
            if past_end && y < current {
                return OperationalPhase::Inactive;
            }
        }

        if let Some(fin) = dates.final_disposition {
            let reached_current = dates.current_disposition.map_or(true, |current| y >= current);
            if reached_current && y < fin {
                return OperationalPhase::Intermediate;
            }
            if y >= fin {
                return OperationalPhase::Final;
            }
        }

        OperationalPhase::Flag
    }
}
