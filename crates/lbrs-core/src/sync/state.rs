//! Per-run outcome accounting
//!
//! Every layer lands in exactly one bucket. The buckets drive the promotion
//! decision and the end-of-run summary, so nothing here is advisory.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::domain::LayerKey;

/// Accumulated outcomes of one sync run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RunState {
    /// Layers freshly imported this run.
    pub updated: Vec<LayerKey>,
    /// Layers whose recorded stamp already matched upstream.
    pub up_to_date: u64,
    /// Layers that could not be brought into the store (absent upstream,
    /// failed import, failed export).
    pub omitted: BTreeSet<LayerKey>,
    /// Layers that imported but produced zero features.
    pub empty: BTreeSet<LayerKey>,
    /// Layers whose features fail the spatial check against their county.
    pub mismatched: BTreeSet<LayerKey>,
    /// Subset of the omissions where the publisher had nothing at all.
    pub missing_source: BTreeSet<LayerKey>,
}

impl RunState {
    pub fn record_updated(&mut self, key: LayerKey) {
        self.updated.push(key);
    }

    pub fn record_up_to_date(&mut self) {
        self.up_to_date += 1;
    }

    pub fn record_omitted(&mut self, key: LayerKey) {
        self.omitted.insert(key);
    }

    /// An upstream no-show is both an omission and worth tracking apart.
    pub fn record_missing_source(&mut self, key: LayerKey) {
        self.missing_source.insert(key.clone());
        self.omitted.insert(key);
    }

    pub fn record_empty(&mut self, key: LayerKey) {
        self.empty.insert(key);
    }

    pub fn record_mismatched(&mut self, key: LayerKey) {
        self.mismatched.insert(key);
    }

    /// No failures of any category.
    pub fn is_clean(&self) -> bool {
        self.omitted.is_empty() && self.empty.is_empty() && self.mismatched.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> LayerKey {
        name.parse().unwrap()
    }

    #[test]
    fn missing_source_counts_as_an_omission() {
        let mut state = RunState::default();
        state.record_missing_source(key("BEL_CL"));
        assert!(state.omitted.contains(&key("BEL_CL")));
        assert!(state.missing_source.contains(&key("BEL_CL")));
        assert!(!state.is_clean());
    }

    #[test]
    fn a_run_with_only_updates_is_clean() {
        let mut state = RunState::default();
        state.record_updated(key("ADA_CL"));
        state.record_up_to_date();
        assert!(state.is_clean());
    }
}
