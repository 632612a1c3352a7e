//! Domain identifiers: county codes, layer types, and layer keys
//!
//! A `LayerKey` names one synchronizable stream: the (county, layer type)
//! pair whose table lives in the workspace store and whose archive lives at
//! the publisher under `{COUNTY}_{LAYER}.zip`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A three-letter uppercase county code (e.g. `HAR` for Hardin).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountyCode(String);

impl CountyCode {
    pub fn new(code: &str) -> Result<Self> {
        let code = code.trim().to_ascii_uppercase();
        if code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase()) {
            Ok(Self(code))
        } else {
            Err(Error::InvalidCounty { code })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CountyCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for CountyCode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<CountyCode> for String {
    fn from(code: CountyCode) -> Self {
        code.0
    }
}

/// Category of vector data published per county.
///
/// This is a closed set: the freshness ledger carries one column per layer
/// type, so adding a variant is a deliberate schema migration, not a config
/// edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LayerType {
    /// Address points (`ADDS`)
    AddressPoints,
    /// Road centerlines (`CL`)
    Centerlines,
    /// Road intersections (`INTRSCTS`)
    Intersections,
    /// Landmarks (`LNDMRKS`)
    Landmarks,
    /// Rail crossings (`RLXING`)
    RailCrossings,
}

impl LayerType {
    pub const ALL: [LayerType; 5] = [
        LayerType::AddressPoints,
        LayerType::Centerlines,
        LayerType::Intersections,
        LayerType::Landmarks,
        LayerType::RailCrossings,
    ];

    /// The publisher's code for this layer type.
    pub fn code(self) -> &'static str {
        match self {
            LayerType::AddressPoints => "ADDS",
            LayerType::Centerlines => "CL",
            LayerType::Intersections => "INTRSCTS",
            LayerType::Landmarks => "LNDMRKS",
            LayerType::RailCrossings => "RLXING",
        }
    }

    pub fn parse(code: &str) -> Result<Self> {
        let upper = code.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|lt| lt.code() == upper)
            .ok_or(Error::UnknownLayerType { code: upper })
    }
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for LayerType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for LayerType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<LayerType> for String {
    fn from(layer: LayerType) -> Self {
        layer.code().to_string()
    }
}

/// One synchronizable stream: a county crossed with a layer type.
///
/// Displays as `HAR_CL`, which is also the table name in the store and the
/// basename of the remote archive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LayerKey {
    pub county: CountyCode,
    pub layer: LayerType,
}

impl LayerKey {
    pub fn new(county: CountyCode, layer: LayerType) -> Self {
        Self { county, layer }
    }

    /// The store table name for this stream, identical to the display form.
    pub fn table_name(&self) -> String {
        format!("{}_{}", self.county, self.layer.code())
    }
}

impl fmt::Display for LayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.county, self.layer.code())
    }
}

impl FromStr for LayerKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (county, layer) = s.split_once('_').ok_or_else(|| Error::InvalidLayerKey {
            key: s.to_string(),
        })?;
        Ok(Self {
            county: CountyCode::new(county).map_err(|_| Error::InvalidLayerKey {
                key: s.to_string(),
            })?,
            layer: LayerType::parse(layer).map_err(|_| Error::InvalidLayerKey {
                key: s.to_string(),
            })?,
        })
    }
}

impl TryFrom<String> for LayerKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<LayerKey> for String {
    fn from(key: LayerKey) -> Self {
        key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn county_code_normalizes_case() {
        assert_eq!(CountyCode::new("har").unwrap().as_str(), "HAR");
    }

    #[test]
    fn county_code_rejects_bad_lengths_and_digits() {
        assert!(CountyCode::new("HARD").is_err());
        assert!(CountyCode::new("HA").is_err());
        assert!(CountyCode::new("H4R").is_err());
        assert!(CountyCode::new("").is_err());
    }

    #[test]
    fn layer_type_round_trips_through_codes() {
        for layer in LayerType::ALL {
            assert_eq!(LayerType::parse(layer.code()).unwrap(), layer);
        }
        assert!(LayerType::parse("ROADS").is_err());
    }

    #[test]
    fn layer_key_parses_and_displays() {
        let key: LayerKey = "HAR_CL".parse().unwrap();
        assert_eq!(key.county.as_str(), "HAR");
        assert_eq!(key.layer, LayerType::Centerlines);
        assert_eq!(key.to_string(), "HAR_CL");
        assert_eq!(key.table_name(), "HAR_CL");
    }

    #[test]
    fn layer_key_parse_rejects_malformed_input() {
        assert!("HARCL".parse::<LayerKey>().is_err());
        assert!("H_CL".parse::<LayerKey>().is_err());
        assert!("HAR_NOPE".parse::<LayerKey>().is_err());
    }

    #[test]
    fn layer_key_orders_by_county_then_layer() {
        let ada: LayerKey = "ADA_CL".parse().unwrap();
        let har_adds: LayerKey = "HAR_ADDS".parse().unwrap();
        let har_cl: LayerKey = "HAR_CL".parse().unwrap();
        assert!(ada < har_adds);
        assert!(har_adds < har_cl);
    }
}
