//! Vegetation Succession
//!
//! Regrowth from a disturbed surface toward mature cover, driven by the years
//! elapsed since a reference date.
//!
//! Stage arithmetic:
//! 1. Inside the 5-year grace period (or for the `default` condition) the
//!    condition is returned unchanged
//! 2. stage = base stage of the condition + elapsed years
//! 3. The stage maps back to the coarsest condition whose threshold it meets

/// Years after the reference date before succession starts.
pub const GRACE_PERIOD_YEARS: i32 = 5;

/// Condition label that never undergoes succession.
pub const DEFAULT_CONDITION: &str = "default";

/// Successional stage of a surface, ordered from disturbed to mature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SuccessionStage {
    Bare,
    Cheatgrass,
    Developing,
    Mature,
}

impl SuccessionStage {
    /// Stage threshold in years (Bare 0, Cheatgrass 5, Developing 10, Mature 40)
    pub fn threshold(self) -> i32 {
        match self {
            SuccessionStage::Bare => 0,
            SuccessionStage::Cheatgrass => 5,
            SuccessionStage::Developing => 10,
            SuccessionStage::Mature => 40,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SuccessionStage::Bare => "Bare",
            SuccessionStage::Cheatgrass => "Cheatgrass",
            SuccessionStage::Developing => "Developing",
            SuccessionStage::Mature => "Mature",
        }
    }

    /// Parse a surface-condition label. Exact match, as stored in the tables.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Bare" => Some(SuccessionStage::Bare),
            "Cheatgrass" => Some(SuccessionStage::Cheatgrass),
            "Developing" => Some(SuccessionStage::Developing),
            "Mature" => Some(SuccessionStage::Mature),
            _ => None,
        }
    }

    /// Coarsest stage whose threshold `stage_years` meets.
    pub fn from_stage_years(stage_years: i32) -> Self {
        if stage_years < 5 {
            SuccessionStage::Bare
        } else if stage_years < 10 {
            SuccessionStage::Cheatgrass
        } else if stage_years < 40 {
            SuccessionStage::Developing
        } else {
            SuccessionStage::Mature
        }
    }
}

/// Base stage in years for any surface-condition label; unknown labels start at 0.
pub fn base_stage_years(condition: &str) -> i32 {
    SuccessionStage::from_label(condition).map_or(0, SuccessionStage::threshold)
}

/// Advance `condition` by the succession elapsed between `start_year` and `model_year`.
///
/// # Examples
/// ```
/// use recharge_estimator::advance;
///
/// assert_eq!(advance("Cheatgrass", 2000, 2010), "Developing");
/// assert_eq!(advance("Bare", 2000, 2004), "Bare");
/// assert_eq!(advance("default", 1950, 2050), "default");
/// ```
pub fn advance(condition: &str, start_year: i32, model_year: i32) -> String {
    if model_year < start_year + GRACE_PERIOD_YEARS || condition == DEFAULT_CONDITION {
        return condition.to_string();
    }

    let stage_years = base_stage_years(condition) + (model_year - start_year);
    SuccessionStage::from_stage_years(stage_years).label().to_string()
}
