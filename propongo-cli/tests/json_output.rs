use std::fs;
use std::process::Command;
use tempfile::TempDir;

const LEGACY_PROPOSAL: &str = r#"{
    "clientName": "Acme",
    "scope": {
        "deliverables": ["Design"],
        "deliverableDates": {"0": {"startDate": "2024-04-08", "endDate": "2024-04-19"}}
    },
    "budget": {"breakdown": [{"description": "Audit", "amount": "750.00"}]}
}"#;

#[test]
fn test_timeline_json_stays_parseable_after_upgrade() {
    let temp_dir = TempDir::new().unwrap();
    let store = temp_dir.path().join("store");
    fs::create_dir_all(&store).unwrap();
    fs::write(store.join("proposalData.json"), LEGACY_PROPOSAL).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_propongo"))
        .env("PROPONGO_CONFIG", temp_dir.path().join("config.yaml"))
        .env_remove("PROPONGO_LOG")
        .arg("--store")
        .arg(&store)
        .args(["timeline", "--today", "2024-04-02", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let chart: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(chart["items"][0]["name"], "Design");

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Upgraded an older proposal format."));
}
