//! Utility modules for recharge estimation
//!
//! Contains shared functionality used across the families and the driver:
//! - Lookup tables: disposition and recharge-rate mappings
//! - LazyFrame helpers: CSV loading with column validation

pub mod lazy_helpers;
pub mod lookup_tables;

// Re-export commonly used types
pub use lazy_helpers::{
    float_values, int_values, materialize_with_columns, read_csv, string_values, year_values,
};
pub use lookup_tables::{
    normalize_label, DispositionLookup, DispositionMatch, LookupTables, RateLookup, RechargeLookup,
    DEFAULT_DISPOSITION, RATE_SENTINEL, UNDEFINED_CONDITION,
};
