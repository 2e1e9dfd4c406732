//! End-to-end runs of the `osmdl` binary. Nothing here touches the network:
//! downloads are either dry runs or already present on disk.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const OSM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6">
  <node id="1" lat="52.01" lon="13.01"/>
  <node id="2" lat="52.02" lon="13.02"/>
  <way id="3"><nd ref="1"/><nd ref="2"/></way>
</osm>"#;

fn osmdl(output_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("osmdl").expect("binary exists");
    cmd.env("RUST_LOG", "info")
        .arg("--headless")
        .arg("--output-dir")
        .arg(output_dir);
    cmd
}

#[test]
fn no_parameters_is_a_no_op() {
    let temp = TempDir::new().expect("create temp dir");
    osmdl(temp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Nothing to download"));
}

#[test]
fn dry_run_writes_plan() {
    let temp = TempDir::new().expect("create temp dir");
    let plan_path = temp.path().join("download_plan.json");

    osmdl(temp.path())
        .args(["--dry-run", "--plan"])
        .arg(&plan_path)
        .arg("--download=52.0,13.0,53.0,14.0")
        .args(["--downloadgps", "1,2,3,4"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Planned download"));

    let plan: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&plan_path).expect("plan written"))
            .expect("plan is json");
    let tasks = plan["tasks"].as_array().expect("tasks array");
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0]["kind"], "osm_data");
    assert_eq!(
        tasks[0]["url"],
        "https://api.openstreetmap.org/api/0.6/map?bbox=13,52,14,53"
    );
    assert_eq!(tasks[1]["kind"], "gps_track");
    assert!(!temp.path().join("map_13_52_14_53.osm").exists());
}

#[test]
fn local_files_are_opened() {
    let temp = TempDir::new().expect("create temp dir");
    let file = temp.path().join("data.osm");
    fs::write(&file, OSM).expect("write osm");

    osmdl(temp.path())
        .arg("--download")
        .arg(&file)
        .assert()
        .success()
        .stderr(predicate::str::contains("2 nodes, 1 ways, 0 relations"));
}

#[test]
fn files_are_rejected_for_gps() {
    let temp = TempDir::new().expect("create temp dir");
    let file = temp.path().join("data.osm");
    fs::write(&file, OSM).expect("write osm");
    let plan_path = temp.path().join("download_plan.json");

    osmdl(temp.path())
        .args(["--dry-run", "--plan"])
        .arg(&plan_path)
        .arg("--downloadgps")
        .arg(&file)
        .args(["--downloadgps", "file:///tmp/data.osm"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Processing download parameter"))
        .stderr(predicate::str::contains("Opened").not());

    let plan: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&plan_path).expect("plan written"))
            .expect("plan is json");
    assert_eq!(plan["tasks"].as_array().expect("tasks array").len(), 0);
}

#[test]
fn negative_bounds_are_accepted_as_separate_values() {
    let temp = TempDir::new().expect("create temp dir");
    let plan_path = temp.path().join("download_plan.json");

    osmdl(temp.path())
        .args(["--dry-run", "--plan"])
        .arg(&plan_path)
        .args(["--download", "-33.9,151.2,-33.8,151.3"])
        .args(["--downloadgps", "-33.9,151.2,-33.8,151.3"])
        .assert()
        .success();

    let plan: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&plan_path).expect("plan written"))
            .expect("plan is json");
    let tasks = plan["tasks"].as_array().expect("tasks array");
    assert_eq!(tasks.len(), 2);
    assert_eq!(
        tasks[0]["url"],
        "https://api.openstreetmap.org/api/0.6/map?bbox=151.2,-33.9,151.3,-33.8"
    );
    assert_eq!(tasks[1]["kind"], "gps_track");
}

#[test]
fn existing_downloads_are_reported() {
    let temp = TempDir::new().expect("create temp dir");
    fs::write(temp.path().join("map_13_52_14_53.osm"), OSM).expect("write osm");

    osmdl(temp.path())
        .arg("--download=52,13,53,14")
        .assert()
        .success()
        .stderr(predicate::str::contains("Output file already exists"))
        .stderr(predicate::str::contains("Downloaded"));
}

#[test]
fn compressed_downloads_are_not_inspected() {
    let temp = TempDir::new().expect("create temp dir");
    fs::write(temp.path().join("extract.osm.gz"), b"\x1f\x8b\x08\x00").expect("write gz");

    osmdl(temp.path())
        .args(["--download", "http://somewhere.com/extract.osm.gz"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Saved compressed download without inspecting it"))
        .stderr(predicate::str::contains("Unable to summarize").not());
}

#[test]
fn execute_plan_runs_tasks() {
    let temp = TempDir::new().expect("create temp dir");
    let output = temp.path().join("area.osm");
    fs::write(&output, OSM).expect("write osm");
    let plan_path = temp.path().join("plan.json");
    let plan = serde_json::json!({
        "tasks": [{
            "kind": "osm_data",
            "url": "https://api.openstreetmap.org/api/0.6/map?bbox=13,52,14,53",
            "output": output,
        }]
    });
    fs::write(&plan_path, plan.to_string()).expect("write plan");

    osmdl(temp.path())
        .arg("--execute-plan")
        .arg(&plan_path)
        .assert()
        .success()
        .stderr(predicate::str::contains("Executing download plan"));
}

#[test]
fn execute_plan_conflicts_with_download() {
    let temp = TempDir::new().expect("create temp dir");
    osmdl(temp.path())
        .args(["--execute-plan", "plan.json", "--download", "a.osm"])
        .assert()
        .failure();
}
