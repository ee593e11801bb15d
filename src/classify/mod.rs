//! Temporal classification primitives
//!
//! - `phase`: lifecycle phase from lifecycle dates (two strategies)
//! - `succession`: vegetation regrowth from elapsed years

pub mod phase;
pub mod succession;

pub use phase::{
    FacilityPhase, LifecycleDates, OperationalPhase, PhaseStrategy, WasteSitePhase,
    FACILITY_EPOCH_YEAR,
};
pub use succession::{advance, SuccessionStage, DEFAULT_CONDITION, GRACE_PERIOD_YEARS};
