//! End-to-end engine runs against the scripted publisher and store
//!
//! These exercise the full pipeline on a temp workspace: freshness
//! comparison, import, validation, export packaging, the promotion gate,
//! and the second-run no-op.

use lbrs_core::fetch::{self, FetchKind};
use lbrs_core::{Decision, LayerType, SyncEngine};
use lbrs_test_utils::{FakeSource, FakeUtility, key, seed_store, stamp, test_config};
use tempfile::TempDir;

fn centerlines_config(temp: &TempDir, counties: &[&str]) -> lbrs_core::SyncConfig {
    let mut config = test_config(temp.path());
    config.counties = counties.iter().map(|c| c.parse().unwrap()).collect();
    config.layer_types = vec![LayerType::Centerlines];
    config
}

#[test]
fn clean_run_imports_validates_and_promotes() {
    let temp = TempDir::new().unwrap();
    let config = centerlines_config(&temp, &["ADA"]);
    seed_store(&config).unwrap();

    let utility = FakeUtility::with_counties(&["ADA"]);
    let mut source = FakeSource::new();
    source.publish(key("ADA_CL"), stamp("2020-03-10 17:08:37"));

    let report = SyncEngine::new(&config, &utility, &source).run().unwrap();

    assert_eq!(report.state.updated, vec![key("ADA_CL")]);
    assert!(report.state.is_clean());
    assert_eq!(report.decision, Decision::Promote);
    assert!(report.promoted);
    assert!(config.archive_store_path().exists());
    assert_eq!(utility.imported(), vec!["ADA_CL".to_string()]);
    assert_eq!(
        utility.stamp_of("ADA", "CL_stamp"),
        Some("2020-03-10 17:08:37".to_string())
    );
}

#[test]
fn second_run_is_a_no_op_when_stamps_match() {
    let temp = TempDir::new().unwrap();
    let config = centerlines_config(&temp, &["ADA"]);
    seed_store(&config).unwrap();

    let utility = FakeUtility::with_counties(&["ADA"]);
    let mut source = FakeSource::new();
    source.publish(key("ADA_CL"), stamp("2020-03-10 17:08:37"));

    SyncEngine::new(&config, &utility, &source).run().unwrap();
    let second = SyncEngine::new(&config, &utility, &source).run().unwrap();

    assert!(second.state.updated.is_empty());
    assert_eq!(second.state.up_to_date, 1);
    assert_eq!(utility.imported().len(), 1);
}

#[test]
fn force_import_bypasses_the_freshness_check() {
    let temp = TempDir::new().unwrap();
    let mut config = centerlines_config(&temp, &["ADA"]);
    config.force_import = true;
    seed_store(&config).unwrap();

    let utility = FakeUtility::with_counties(&["ADA"]);
    utility.set_stamp("ADA", "CL_stamp", "2020-03-10 17:08:37");
    let mut source = FakeSource::new();
    source.publish(key("ADA_CL"), stamp("2020-03-10 17:08:37"));

    let report = SyncEngine::new(&config, &utility, &source).run().unwrap();
    assert_eq!(report.state.updated, vec![key("ADA_CL")]);
}

#[test]
fn a_changed_upstream_stamp_triggers_reimport() {
    let temp = TempDir::new().unwrap();
    let config = centerlines_config(&temp, &["ADA"]);
    seed_store(&config).unwrap();

    let utility = FakeUtility::with_counties(&["ADA"]);
    utility.set_stamp("ADA", "CL_stamp", "2019-01-01 00:00:00");
    let mut source = FakeSource::new();
    source.publish(key("ADA_CL"), stamp("2020-03-10 17:08:37"));

    let report = SyncEngine::new(&config, &utility, &source).run().unwrap();
    assert_eq!(report.state.updated, vec![key("ADA_CL")]);
    assert_eq!(
        utility.stamp_of("ADA", "CL_stamp"),
        Some("2020-03-10 17:08:37".to_string())
    );
}

#[test]
fn a_misaligned_layer_holds_promotion_and_keeps_the_raw_archive() {
    let temp = TempDir::new().unwrap();
    let config = centerlines_config(&temp, &["HAR"]);
    seed_store(&config).unwrap();

    let utility = FakeUtility::with_counties(&["HAR"]);
    utility.set_behavior("HAR_CL", 5_000, 0);
    let mut source = FakeSource::new();
    source.publish(key("HAR_CL"), stamp("2020-03-10 17:08:37"));

    let report = SyncEngine::new(&config, &utility, &source).run().unwrap();

    assert!(report.state.mismatched.contains(&key("HAR_CL")));
    assert!(!report.promoted);
    let Decision::Hold { reasons } = &report.decision else {
        panic!("expected hold");
    };
    assert!(reasons.iter().any(|r| r.contains("HAR_CL")));
    // Evidence for offline inspection.
    assert!(config.raw_dir().join("HAR_CL.zip").exists());
    assert!(!config.archive_store_path().exists());
}

#[test]
fn an_empty_layer_holds_promotion() {
    let temp = TempDir::new().unwrap();
    let config = centerlines_config(&temp, &["ADA"]);
    seed_store(&config).unwrap();

    let utility = FakeUtility::with_counties(&["ADA"]);
    utility.set_behavior("ADA_CL", 0, 0);
    let mut source = FakeSource::new();
    source.publish(key("ADA_CL"), stamp("2020-03-10 17:08:37"));

    let report = SyncEngine::new(&config, &utility, &source).run().unwrap();
    assert!(report.state.empty.contains(&key("ADA_CL")));
    assert!(!report.promoted);
}

#[test]
fn anticipated_omissions_do_not_block_promotion() {
    let temp = TempDir::new().unwrap();
    // BEL_CL is on the default allow-list.
    let config = centerlines_config(&temp, &["BEL"]);
    seed_store(&config).unwrap();

    let utility = FakeUtility::with_counties(&["BEL"]);
    let source = FakeSource::new(); // publishes nothing

    let report = SyncEngine::new(&config, &utility, &source).run().unwrap();
    assert!(report.state.missing_source.contains(&key("BEL_CL")));
    assert!(report.promoted);
}

#[test]
fn an_unanticipated_omission_holds_promotion() {
    let temp = TempDir::new().unwrap();
    let config = centerlines_config(&temp, &["ADA"]);
    seed_store(&config).unwrap();

    let utility = FakeUtility::with_counties(&["ADA"]);
    let source = FakeSource::new();

    let report = SyncEngine::new(&config, &utility, &source).run().unwrap();
    assert!(!report.promoted);
}

#[test]
fn a_failed_import_is_recorded_as_an_omission() {
    let temp = TempDir::new().unwrap();
    let config = centerlines_config(&temp, &["ADA"]);
    seed_store(&config).unwrap();

    let utility = FakeUtility::with_counties(&["ADA"]);
    utility.fail_import("ADA_CL");
    let mut source = FakeSource::new();
    source.publish(key("ADA_CL"), stamp("2020-03-10 17:08:37"));

    let report = SyncEngine::new(&config, &utility, &source).run().unwrap();
    assert!(report.state.omitted.contains(&key("ADA_CL")));
    assert!(!report.promoted);
}

#[test]
fn a_failed_export_is_recorded_as_an_omission_and_holds_promotion() {
    let temp = TempDir::new().unwrap();
    // HAR is on the default export list, so its export failure matters.
    let config = centerlines_config(&temp, &["HAR"]);
    seed_store(&config).unwrap();

    let utility = FakeUtility::with_counties(&["HAR"]);
    utility.fail_export("HAR_CL");
    let mut source = FakeSource::new();
    source.publish(key("HAR_CL"), stamp("2020-03-10 17:08:37"));

    let report = SyncEngine::new(&config, &utility, &source).run().unwrap();

    // The import itself succeeded; only the package is missing.
    assert_eq!(utility.imported(), vec!["HAR_CL".to_string()]);
    assert!(report.state.omitted.contains(&key("HAR_CL")));
    assert!(!report.promoted);
    assert!(!config.archive_store_path().exists());
}

#[test]
fn export_counties_get_shapefile_packages_on_promotion() {
    let temp = TempDir::new().unwrap();
    // HAR is on the default export list.
    let config = centerlines_config(&temp, &["HAR"]);
    seed_store(&config).unwrap();

    let utility = FakeUtility::with_counties(&["HAR"]);
    let mut source = FakeSource::new();
    source.publish(key("HAR_CL"), stamp("2020-03-10 17:08:37"));

    let report = SyncEngine::new(&config, &utility, &source).run().unwrap();
    assert!(report.promoted);
    // The package is transferred to the archive alongside the store.
    assert!(
        config
            .archive_dir()
            .join("SHPs")
            .join("HAR_CL.zip")
            .exists()
    );
}

#[test]
fn non_export_counties_are_not_packaged() {
    let temp = TempDir::new().unwrap();
    let config = centerlines_config(&temp, &["ADA"]);
    seed_store(&config).unwrap();

    let utility = FakeUtility::with_counties(&["ADA"]);
    let mut source = FakeSource::new();
    source.publish(key("ADA_CL"), stamp("2020-03-10 17:08:37"));

    SyncEngine::new(&config, &utility, &source).run().unwrap();
    assert!(!config.export_dir().join("ADA_CL.zip").exists());
}

#[test]
fn run_report_serializes_for_scripting() {
    let temp = TempDir::new().unwrap();
    let config = centerlines_config(&temp, &["ADA"]);
    seed_store(&config).unwrap();

    let utility = FakeUtility::with_counties(&["ADA"]);
    let mut source = FakeSource::new();
    source.publish(key("ADA_CL"), stamp("2020-03-10 17:08:37"));

    let report = SyncEngine::new(&config, &utility, &source).run().unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&serde_json::to_string(&report).unwrap()).unwrap();
    assert_eq!(json["decision"], "promote");
    assert_eq!(json["promoted"], true);
    assert_eq!(json["updated"][0], "ADA_CL");
}

#[test]
fn fetch_mode_downloads_archives_without_a_store() {
    let temp = TempDir::new().unwrap();
    let config = centerlines_config(&temp, &["ADA", "BEL"]);

    let mut source = FakeSource::new();
    source.publish(key("ADA_CL"), stamp("2020-03-10 17:08:37"));

    let report = fetch::run(&config, &source, FetchKind::Archive).unwrap();
    assert_eq!(report.fetched, vec![config.raw_dir().join("ADA_CL.zip")]);
    assert_eq!(report.missing, vec![key("BEL_CL")]);
}

#[test]
fn fetch_mode_extracts_projection_sidecars() {
    let temp = TempDir::new().unwrap();
    let config = centerlines_config(&temp, &["ADA", "HAR"]);

    let mut source = FakeSource::new();
    source.publish(key("ADA_CL"), stamp("2020-03-10 17:08:37"));
    source.publish_without_prj(key("HAR_CL"), stamp("2020-03-10 17:08:37"));

    let report = fetch::run(&config, &source, FetchKind::Projection).unwrap();
    assert_eq!(report.fetched, vec![config.prj_dir().join("ADA_CL.prj")]);
    // Published but with no sidecar in the archive.
    assert_eq!(report.missing, vec![key("HAR_CL")]);
}
