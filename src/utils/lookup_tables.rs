//! Disposition and Recharge Lookup Tables
//!
//! Static mappings loaded once per run:
//! - disposition label → (cover type, surface condition), with a required
//!   `default` entry
//! - (cover type, surface condition, soil type) → recharge rate
//!
//! Disposition labels match case-insensitively after trimming. The recharge
//! table matches exactly, as stored.

use crate::error::RetError;
use crate::families::CoverCondition;
use rustc_hash::FxHashMap;

/// Sentinel disposition label that must be present.
pub const DEFAULT_DISPOSITION: &str = "default";

/// Sentinel condition for labels that match nothing.
pub const UNDEFINED_CONDITION: &str = "undefined";

/// Normalize a disposition label for matching.
pub fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Result of resolving a disposition label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispositionMatch<'a> {
    /// Label present in the table
    Found(&'a CoverCondition),
    /// Label empty or absent; the `default` entry applies
    Default(&'a CoverCondition),
    /// Non-empty label with no entry
    Unmatched,
}

/// Disposition label → cover condition.
#[derive(Debug, Clone)]
pub struct DispositionLookup {
    entries: FxHashMap<String, CoverCondition>,
    default: CoverCondition,
}

impl DispositionLookup {
    /// Build from (label, cover type, surface condition) rows. Later rows win.
    pub fn from_rows<I, S>(rows: I) -> Result<Self, RetError>
    where
        I: IntoIterator<Item = (S, S, S)>,
        S: AsRef<str>,
    {
        let mut entries = FxHashMap::default();
        for (label, cover, surface) in rows {
            entries.insert(
                normalize_label(label.as_ref()),
                CoverCondition::new(surface.as_ref().trim(), cover.as_ref().trim()),
            );
        }

        let default = entries
            .get(DEFAULT_DISPOSITION)
            .cloned()
            .ok_or(RetError::MissingDefaultDisposition {
                sentinel: DEFAULT_DISPOSITION,
            })?;

        Ok(Self { entries, default })
    }

    /// Exact (case-insensitive) entry for `label`
    pub fn get(&self, label: &str) -> Option<&CoverCondition> {
        self.entries.get(&normalize_label(label))
    }

    /// Resolve a possibly-empty label.
    pub fn resolve(&self, label: Option<&str>) -> DispositionMatch<'_> {
        match label.map(str::trim).filter(|l| !l.is_empty()) {
            None => DispositionMatch::Default(&self.default),
            Some(l) => match self.get(l) {
                Some(condition) => DispositionMatch::Found(condition),
                None => DispositionMatch::Unmatched,
            },
        }
    }

    pub fn default_condition(&self) -> &CoverCondition {
        &self.default
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Rate returned when a (cover, surface, soil) triple is not in the table.
pub const RATE_SENTINEL: f64 = -9999.0;

/// Outcome of a rate lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateLookup {
    Found(f64),
    Missing,
}

impl RateLookup {
    /// Rate, or -9999 when missing
    pub fn or_sentinel(self) -> f64 {
        match self {
            RateLookup::Found(rate) => rate,
            RateLookup::Missing => RATE_SENTINEL,
        }
    }
}

/// Recharge rates by (cover type, surface condition, soil type).
#[derive(Debug, Clone, Default)]
pub struct RechargeLookup {
    rates: FxHashMap<(String, String, String), f64>,
    cover_surface: FxHashMap<String, String>,
    soil_types: Vec<String>,
}

impl RechargeLookup {
    /// Create an empty table for the given soil columns.
    pub fn new(soil_types: Vec<String>) -> Self {
        Self {
            rates: FxHashMap::default(),
            cover_surface: FxHashMap::default(),
            soil_types,
        }
    }

    /// Add one table row: cover type, surface condition, and one rate per soil
    /// column (None leaves that soil unrated).
    pub fn add_row(&mut self, cover_type: &str, surface_condition: &str, rates: &[Option<f64>]) {
        self.cover_surface
            .insert(cover_type.to_string(), surface_condition.to_string());
        for (soil, rate) in self.soil_types.iter().zip(rates) {
            if let Some(rate) = rate {
                self.rates.insert(
                    (cover_type.to_string(), surface_condition.to_string(), soil.clone()),
                    *rate,
                );
            }
        }
    }

    /// Rate lookup for a triple
    pub fn rate(&self, cover_type: &str, surface_condition: &str, soil_type: &str) -> RateLookup {
        let key = (
            cover_type.to_string(),
            surface_condition.to_string(),
            soil_type.to_string(),
        );
        match self.rates.get(&key) {
            Some(rate) => RateLookup::Found(*rate),
            None => RateLookup::Missing,
        }
    }

    /// Surface condition the table pairs with `cover_type` (last row wins).
    pub fn surface_condition_for_cover(&self, cover_type: &str) -> Option<&str> {
        self.cover_surface.get(cover_type).map(String::as_str)
    }

    pub fn soil_types(&self) -> &[String] {
        &self.soil_types
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// All lookup tables for a run.
#[derive(Debug, Clone)]
pub struct LookupTables {
    pub disposition: DispositionLookup,
    pub recharge: RechargeLookup,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn disposition() -> DispositionLookup {
        DispositionLookup::from_rows(vec![
            ("default", "Shrub-Steppe", "Mature"),
            ("Remove/Treat/Dispose", "Gravel/Industrial/Non-Vegetated/Exotic Weed", "Bare"),
            ("Closed in Place", "Barrier/MinRchrg", "Barrier"),
        ])
        .unwrap()
    }

    #[test]
    fn test_default_is_required() {
        let err = DispositionLookup::from_rows(vec![("Closed in Place", "Barrier/MinRchrg", "Barrier")])
            .unwrap_err();
        assert!(matches!(err, RetError::MissingDefaultDisposition { .. }));
    }

    #[test]
    fn test_labels_match_case_insensitively() {
        let lookup = disposition();
        let expected = CoverCondition::new("Barrier", "Barrier/MinRchrg");
        assert_eq!(lookup.get("closed in place"), Some(&expected));
        assert_eq!(lookup.get("  CLOSED IN PLACE "), Some(&expected));
        assert_eq!(lookup.get("DEFAULT"), Some(lookup.default_condition()));
    }

    #[test]
    fn test_resolve_three_way() {
        let lookup = disposition();
        assert!(matches!(lookup.resolve(Some("Closed in Place")), DispositionMatch::Found(_)));
        assert!(matches!(lookup.resolve(None), DispositionMatch::Default(_)));
        assert!(matches!(lookup.resolve(Some("   ")), DispositionMatch::Default(_)));
        assert_eq!(lookup.resolve(Some("No Action")), DispositionMatch::Unmatched);
    }

    fn recharge() -> RechargeLookup {
        let mut lookup = RechargeLookup::new(vec!["Qy".to_string(), "Ri".to_string(), "XX".to_string()]);
        lookup.add_row("Shrub-Steppe", "Mature", &[Some(3.6), Some(4.0), None]);
        lookup.add_row("Disturbed", "Bare", &[Some(55.4), Some(63.0), Some(27.0)]);
        lookup
    }

    #[test]
    fn test_rate_found() {
        let lookup = recharge();
        match lookup.rate("Disturbed", "Bare", "Ri") {
            RateLookup::Found(rate) => assert_relative_eq!(rate, 63.0),
            RateLookup::Missing => panic!("expected a rate"),
        }
    }

    #[test]
    fn test_rate_miss_yields_sentinel() {
        let lookup = recharge();
        assert_eq!(lookup.rate("Mature", "Bare", "XX"), RateLookup::Missing);
        assert_relative_eq!(lookup.rate("Mature", "Bare", "XX").or_sentinel(), -9999.0);
        // Blank cell in the table is a miss too
        assert_eq!(lookup.rate("Shrub-Steppe", "Mature", "XX"), RateLookup::Missing);
    }

    #[test]
    fn test_rate_match_is_exact() {
        let lookup = recharge();
        assert_eq!(lookup.rate("disturbed", "Bare", "Ri"), RateLookup::Missing);
    }

    #[test]
    fn test_cover_surface_last_row_wins() {
        let mut lookup = recharge();
        assert_eq!(lookup.surface_condition_for_cover("Disturbed"), Some("Bare"));
        lookup.add_row("Disturbed", "Cheatgrass", &[Some(1.0), None, None]);
        assert_eq!(lookup.surface_condition_for_cover("Disturbed"), Some("Cheatgrass"));
        assert_eq!(lookup.surface_condition_for_cover("Unknown"), None);
    }
}
