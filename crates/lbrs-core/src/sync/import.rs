//! Building and running store imports
//!
//! Layer archives are streamed straight from the publisher through the
//! translation utility's virtual filesystem, so an import never touches the
//! local disk except through the store itself.

use crate::config::SyncConfig;
use crate::domain::LayerKey;
use crate::gdal::{TranslateRequest, VectorUtility};
use crate::srs::{self, SrsPlan};
use crate::Result;

/// The import request for one layer, with its SRS correction applied.
pub fn layer_request(config: &SyncConfig, key: &LayerKey, source: String) -> TranslateRequest {
    let mut request = TranslateRequest::gpkg_import(config.store_path(), key.table_name(), source);
    request.transaction_size = Some(config.transaction_size);
    request.feature_limit = config.feature_limit;
    request.srs = srs::classify(key).plan(config.target_srs);
    request
}

/// The import request that rebuilds the county boundary table on a fresh
/// store. Runs in one dataset transaction; a partial boundary table would
/// poison every later spatial check.
pub fn boundary_request(config: &SyncConfig) -> TranslateRequest {
    let mut request = TranslateRequest::gpkg_import(
        config.store_path(),
        config.boundary_table.clone(),
        format!("/vsicurl/{}", config.boundary_url),
    );
    request.dataset_transaction = true;
    request.srs = SrsPlan::to_target(config.target_srs);
    request.source_layers = vec![config.boundary_source_layer.clone()];
    request
}

/// Import one layer into the store.
pub fn import_layer<U: VectorUtility>(
    utility: &U,
    config: &SyncConfig,
    key: &LayerKey,
    source: String,
) -> Result<()> {
    tracing::info!(key = %key, "importing layer");
    utility.translate(&layer_request(config, key, source))
}

/// Import the county boundary table into a fresh store.
pub fn import_boundary<U: VectorUtility>(utility: &U, config: &SyncConfig) -> Result<()> {
    tracing::info!(table = %config.boundary_table, "importing county boundaries");
    utility.translate(&boundary_request(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config() -> SyncConfig {
        let mut config = SyncConfig::default();
        config.workspace = PathBuf::from("/ws");
        config
    }

    #[test]
    fn layer_request_streams_from_the_virtual_path() {
        let config = config();
        let key: LayerKey = "FRA_CL".parse().unwrap();
        let request = layer_request(
            &config,
            &key,
            "/vsizip/vsicurl/http://example/FRA_CL.zip".to_string(),
        );
        let args = request.to_args();
        assert!(args.contains(&"/vsizip/vsicurl/http://example/FRA_CL.zip".to_string()));
        assert!(args.contains(&"FRA_CL".to_string()));
        // FRA_CL declares the south-zone source.
        assert!(args.contains(&"-s_srs".to_string()));
    }

    #[test]
    fn layer_request_carries_the_configured_limit_and_governor() {
        let mut config = config();
        config.feature_limit = Some(250);
        config.transaction_size = 5_000;
        let key: LayerKey = "ADA_CL".parse().unwrap();
        let args = layer_request(&config, &key, "src".to_string()).to_args();
        let l = args.iter().position(|a| a == "-limit").unwrap();
        assert_eq!(args[l + 1], "250");
        let gt = args.iter().position(|a| a == "-gt").unwrap();
        assert_eq!(args[gt + 1], "5000");
    }

    #[test]
    fn boundary_request_is_transactional_and_reprojected() {
        let config = config();
        let args = boundary_request(&config).to_args();
        assert!(args.contains(&"-ds_transaction".to_string()));
        assert!(!args.contains(&"-s_srs".to_string()));
        let t = args.iter().position(|a| a == "-t_srs").unwrap();
        assert_eq!(args[t + 1], "EPSG:3734");
        assert_eq!(args.last().unwrap(), "OGRGeoJSON");
        assert!(args.iter().any(|a| a.starts_with("/vsicurl/https://")));
    }
}
