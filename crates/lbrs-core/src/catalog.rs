//! Fixed catalog data for the statewide LBRS publication
//!
//! The county set, the default layer selection, the export-of-interest
//! subset, and the anticipated-omission allow-list are publisher facts, not
//! tunables; configuration may narrow them but the canonical values live
//! here.

use crate::domain::{CountyCode, LayerKey, LayerType};

/// All 88 Ohio counties, by code, in publication order.
pub const ALL_COUNTIES: [&str; 88] = [
    "ADA", "ALL", "ASD", "ATB", "ATH", "AUG", "BEL", "BRO", "BUT", "CAR", "CHP", "CLA", "CLE",
    "CLI", "COL", "COS", "CRA", "CUY", "DAR", "DEF", "DEL", "ERI", "FAI", "FAY", "FRA", "FUL",
    "GAL", "GEA", "GRE", "GUE", "HAM", "HAN", "HAR", "HAS", "HEN", "HIG", "HOC", "HOL", "HUR",
    "JAC", "JEF", "KNO", "LAK", "LAW", "LIC", "LOG", "LOR", "LUC", "MAD", "MAH", "MAR", "MED",
    "MEG", "MER", "MIA", "MOE", "MOT", "MRG", "MRW", "MUS", "NOB", "OTT", "PAU", "PER", "PIC",
    "PIK", "POR", "PRE", "PUT", "RIC", "ROS", "SAN", "SCI", "SEN", "SHE", "STA", "SUM", "TRU",
    "TUS", "UNI", "VAN", "VIN", "WAR", "WAS", "WAY", "WIL", "WOO", "WYA",
];

/// Counties whose corrected layers are additionally exported as standalone
/// shapefile packages (typically one's own county and its neighbors).
pub const DEFAULT_EXPORT_COUNTIES: [&str; 8] =
    ["HAR", "ALL", "AUG", "HAN", "LOG", "MAR", "UNI", "WYA"];

/// Layer keys known to be absent upstream. Omissions inside this list do not
/// block archive promotion.
pub const ANTICIPATED_OMISSIONS: [&str; 12] = [
    "BEL_ADDS", "BEL_CL", "GEA_ADDS", "GEA_CL", "HAM_ADDS", "HAM_CL", "MED_ADDS", "MED_CL",
    "UNI_ADDS", "UNI_CL", "WAR_ADDS", "WAR_CL",
];

/// The full county set as typed codes.
pub fn all_counties() -> Vec<CountyCode> {
    ALL_COUNTIES
        .iter()
        .map(|code| CountyCode::new(code).expect("catalog county codes are valid"))
        .collect()
}

/// The most commonly requested layer types (address points and centerlines).
pub fn default_layer_types() -> Vec<LayerType> {
    vec![LayerType::AddressPoints, LayerType::Centerlines]
}

/// The default export-of-interest subset as typed codes.
pub fn default_export_counties() -> Vec<CountyCode> {
    DEFAULT_EXPORT_COUNTIES
        .iter()
        .map(|code| CountyCode::new(code).expect("catalog county codes are valid"))
        .collect()
}

/// The anticipated-omission allow-list as typed keys.
pub fn anticipated_omissions() -> Vec<LayerKey> {
    ANTICIPATED_OMISSIONS
        .iter()
        .map(|key| key.parse().expect("catalog layer keys are valid"))
        .collect()
}
