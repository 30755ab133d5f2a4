mod common;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::{prelude::PredicateBooleanExt, str::contains};

use common::{FARMERS_FIXTURE, TRANSACTIONS_FIXTURE, TestWorkspace, fixture_path};

#[test]
fn columns_lists_farmer_roles() {
    cargo_bin_cmd!("fertilizer-audit")
        .args([
            "columns",
            "-i",
            fixture_path(FARMERS_FIXTURE).to_str().unwrap(),
            "--dataset",
            "farmers",
        ])
        .assert()
        .success()
        .stdout(
            contains("detected role")
                .and(contains("FarmerID (farmers file)"))
                .and(contains("Name (farmers file) [optional]"))
                .and(contains("LandSize / area (farmers file)")),
        );
}

#[test]
fn columns_respects_keyword_overrides() {
    let workspace = TestWorkspace::new();
    let config = workspace.write("audit.yml", "keywords:\n  dealer_id: [village]\n");
    cargo_bin_cmd!("fertilizer-audit")
        .args([
            "columns",
            "-i",
            fixture_path(TRANSACTIONS_FIXTURE).to_str().unwrap(),
            "--dataset",
            "transactions",
            "--config",
            config.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(contains(
            "VillageID      DealerID (transactions file), VillageID/Name (transactions file) [optional]",
        ));
}

#[test]
fn columns_reports_missing_file() {
    let workspace = TestWorkspace::new();
    let missing = workspace.path().join("absent.tsv");
    cargo_bin_cmd!("fertilizer-audit")
        .args([
            "columns",
            "-i",
            missing.to_str().unwrap(),
            "--dataset",
            "transactions",
        ])
        .assert()
        .failure()
        .stderr(contains("Transactions file not found"));
}
