//! Fixed SRS-correction policy
//!
//! Upstream centerline layers arrive in a mix of projections, and a handful
//! declare the wrong EPSG code outright. This table encodes the three known
//! error patterns so imports land in a common target projection. It is fixed
//! policy data correcting specific upstream mislabeling; do not infer or
//! extend it from observed data.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::LayerKey;

/// An EPSG spatial reference code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SrsCode(pub u32);

impl fmt::Display for SrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

/// Statewide target projection (Ohio North, US survey feet).
pub const DEFAULT_TARGET: SrsCode = SrsCode(3734);

/// Statewide default source projection assumed when no override applies.
pub const DEFAULT_SOURCE: SrsCode = SrsCode(32123);

/// Centerline layers already stored in the target projection; these import
/// with no SRS flags at all.
const ALREADY_IN_TARGET: &[&str] = &[
    "AUG_CL", "CAR_CL", "CUY_CL", "DEL_CL", "FUL_CL", "HAS_CL", "HEN_CL", "HOL_CL", "KNO_CL",
    "MAH_CL", "RIC_CL", "TUS_CL",
];

/// Centerline layers correctly declared in EPSG:3735 (south zone) rather
/// than the statewide default; the source must be stated explicitly.
const DECLARED_3735: &[&str] = &[
    "BUT_CL", "CLA_CL", "CLE_CL", "CLI_CL", "FAI_CL", "FRA_CL", "GRE_CL", "HIG_CL", "LAW_CL",
    "LIC_CL", "MAD_CL", "MOT_CL", "MUS_CL",
];

/// Centerline layers whose declared code is itself wrong upstream (converted
/// to the south zone but labeled north); the known-correct code is
/// substituted before reprojecting.
const MISLABELED: &[&str] = &["HAR_CL", "POR_CL"];

/// Classification of a layer key against the override table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SrsCorrection {
    /// Already stored in the target projection; no reprojection.
    InTarget,
    /// Correctly declares a non-default source SRS that must be stated
    /// explicitly alongside the target.
    DeclaredSource(SrsCode),
    /// Declares the wrong code; the known-correct code replaces it.
    CorrectedSource(SrsCode),
    /// Statewide default: reproject to the target with no source override.
    Default,
}

/// Look up the fixed override classification for a layer key.
pub fn classify(key: &LayerKey) -> SrsCorrection {
    let name = key.table_name();
    if ALREADY_IN_TARGET.contains(&name.as_str()) {
        SrsCorrection::InTarget
    } else if DECLARED_3735.contains(&name.as_str()) {
        SrsCorrection::DeclaredSource(SrsCode(3735))
    } else if MISLABELED.contains(&name.as_str()) {
        SrsCorrection::CorrectedSource(DEFAULT_SOURCE)
    } else {
        SrsCorrection::Default
    }
}

/// The source/target pair a translation should be invoked with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SrsPlan {
    /// Explicit source SRS (`-s_srs`), when one must be stated.
    pub source: Option<SrsCode>,
    /// Target SRS (`-t_srs`), absent when the layer is already in target.
    pub target: Option<SrsCode>,
}

impl SrsPlan {
    /// A plan that only reprojects to `target`, with no source override.
    pub fn to_target(target: SrsCode) -> Self {
        Self {
            source: None,
            target: Some(target),
        }
    }
}

impl SrsCorrection {
    /// Resolve the classification into concrete translation parameters.
    pub fn plan(self, target: SrsCode) -> SrsPlan {
        match self {
            SrsCorrection::InTarget => SrsPlan::default(),
            SrsCorrection::DeclaredSource(source) | SrsCorrection::CorrectedSource(source) => {
                SrsPlan {
                    source: Some(source),
                    target: Some(target),
                }
            }
            SrsCorrection::Default => SrsPlan::to_target(target),
        }
    }
}
