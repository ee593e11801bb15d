//! Cross-Year State Store
//!
//! Last-known condition of every entity instance, keyed by layer and
//! composite key. One store per run, created empty.
//!
//! Writes never land directly: a family pass fills [`StagedWrites`], and the
//! driver commits all of a year's staged writes once the year has fully
//! succeeded. Committing a layer replaces its whole map, so keys that did not
//! appear this year are dropped.

use crate::error::RetError;
use crate::families::{CoverCondition, LayerKind};
use rustc_hash::FxHashMap;

/// Run-scoped map of layer → composite key → last condition.
#[derive(Debug, Default)]
pub struct CrossYearStateStore {
    layers: FxHashMap<LayerKind, LayerState>,
}

#[derive(Debug, Default)]
struct LayerState {
    year: i32,
    conditions: FxHashMap<String, CoverCondition>,
}

/// Pending writes from one family pass.
#[derive(Debug)]
pub struct StagedWrites {
    layer: LayerKind,
    year: i32,
    entries: FxHashMap<String, CoverCondition>,
}

impl StagedWrites {
    pub fn new(layer: LayerKind, year: i32) -> Self {
        Self {
            layer,
            year,
            entries: FxHashMap::default(),
        }
    }

    pub fn insert(&mut self, key: String, condition: CoverCondition) {
        self.entries.insert(key, condition);
    }

    pub fn layer(&self) -> LayerKind {
        self.layer
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&CoverCondition> {
        self.entries.get(key)
    }
}

impl CrossYearStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored condition for `key`, if any
    pub fn previous(&self, layer: LayerKind, key: &str) -> Option<&CoverCondition> {
        self.layers.get(&layer).and_then(|state| state.conditions.get(key))
    }

    /// Stored condition for `key`, or a missing-seed-year error for `year`.
    pub fn require(&self, layer: LayerKind, key: &str, year: i32) -> Result<&CoverCondition, RetError> {
        self.previous(layer, key).ok_or_else(|| RetError::MissingSeedYear {
            year,
            layer: layer.name(),
            key: key.to_string(),
        })
    }

    /// Year of the last commit for `layer`
    pub fn last_year(&self, layer: LayerKind) -> Option<i32> {
        self.layers.get(&layer).map(|state| state.year)
    }

    /// Replace `layer`'s state with the staged writes.
    pub fn commit(&mut self, staged: StagedWrites) {
        self.layers.insert(
            staged.layer,
            LayerState {
                year: staged.year,
                conditions: staged.entries,
            },
        );
    }

    /// Commit a whole year's writes at once.
    pub fn commit_all(&mut self, staged: impl IntoIterator<Item = StagedWrites>) {
        for writes in staged {
            self.commit(writes);
        }
    }

    pub fn len(&self, layer: LayerKind) -> usize {
        self.layers.get(&layer).map_or(0, |state| state.conditions.len())
    }

    pub fn is_empty(&self) -> bool {
        self.layers.values().all(|state| state.conditions.is_empty())
    }
}
