//! Recharge Estimator
//!
//! Year-stepped land-cover classification for recharge estimation.
//!
//! Each simulated year, every parcel of the overlay is assigned a surface
//! condition and cover type by a stack of layers (background vegetation,
//! historical cover, cleanup packages, waste sites, facilities), the layers are
//! merged by precedence, and the result is joined against the recharge-rate
//! table keyed by (cover type, surface condition, soil type).
//!
//! Layout:
//! - `classify/`: operational phase strategies and vegetation succession
//! - `utils/`: lookup tables and DataFrame column helpers
//! - `families/`: one classifier per entity family
//! - `store`: cross-year state carried between year steps
//! - `merge`, `recharge`: per-year overlay precedence and rate join
//! - `driver`: ascending year loop tying everything together

pub mod classify;
pub mod config;
pub mod data;
pub mod driver;
pub mod error;
pub mod families;
pub mod merge;
pub mod output;
pub mod overlay;
pub mod recharge;
pub mod site_selection;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use classify::{
    advance, FacilityPhase, LifecycleDates, OperationalPhase, PhaseStrategy, SuccessionStage,
    WasteSitePhase,
};
pub use config::RunConfig;
pub use data::RetData;
pub use driver::{YearBatchDriver, YearOutput};
pub use error::RetError;
pub use families::{CoverAttributes, CoverCondition, CoverLayer, LayerKind};
pub use overlay::{OverlaySource, ParcelOverlay, ParcelRow};
pub use recharge::{RechargeRecord, RATE_SENTINEL};
pub use store::CrossYearStateStore;
pub use utils::{DispositionLookup, LookupTables, RechargeLookup};
