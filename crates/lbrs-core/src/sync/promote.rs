//! The all-or-nothing archive promotion gate
//!
//! A run's workspace store replaces the archive store only when every
//! failure falls inside the anticipated-omission allow-list. One unexpected
//! omission, one empty layer, or one spatial mismatch holds the whole run
//! back so the archive never regresses.

use serde::Serialize;

use crate::config::SyncConfig;
use crate::sync::state::RunState;

/// Outcome of the promotion gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    /// Replace the archive store (and export packages) with this run's.
    Promote,
    /// Keep the archive untouched; the reasons name every blocker.
    Hold { reasons: Vec<String> },
}

impl Decision {
    pub fn is_promote(&self) -> bool {
        matches!(self, Decision::Promote)
    }
}

/// Apply the promotion gate to a finished run.
pub fn decide(config: &SyncConfig, state: &RunState) -> Decision {
    let mut reasons = Vec::new();

    if !config.archive_enabled {
        reasons.push("archive promotion is disabled by configuration".to_string());
    }
    for key in &state.mismatched {
        reasons.push(format!("{key} failed the spatial check"));
    }
    for key in &state.empty {
        reasons.push(format!("{key} imported zero features"));
    }
    for key in &state.omitted {
        if !config.is_anticipated(key) {
            reasons.push(format!("{key} was omitted and is not anticipated"));
        }
    }

    if reasons.is_empty() {
        Decision::Promote
    } else {
        Decision::Hold { reasons }
    }
}
