//! Integration tests for the acre CLI commands.

#![allow(deprecated)] // Command::cargo_bin – macro replacement not yet stable

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const MEADOW: &str = r#"{
    "map": {
        "width": 6,
        "height": 6,
        "tilesheets": [
            {"id": "outdoors", "image_source": "tiles/outdoors.png", "columns": 8, "rows": 8}
        ],
        "layers": [
            {"id": "Back", "fill": {"sheet": "outdoors", "index": 0}}
        ]
    },
    "name": "Meadow",
    "objects": [
        {"name": "boulder", "kind": {"type": "generic"}, "tile": {"x": 3, "y": 3}}
    ]
}"#;

const POND: &str = r#"{
    "width": 2,
    "height": 2,
    "tilesheets": [
        {"id": "water", "image_source": "tiles/outdoors.png", "columns": 8, "rows": 8}
    ],
    "layers": [
        {"id": "Back", "fill": {"sheet": "water", "index": 12}}
    ]
}"#;

/// Create a temp directory holding a location file and a patch map.
fn test_files() -> (TempDir, PathBuf, PathBuf) {
    let dir = TempDir::new().unwrap();
    let location = dir.path().join("meadow.json");
    let pond = dir.path().join("pond.json");
    fs::write(&location, MEADOW).unwrap();
    fs::write(&pond, POND).unwrap();
    (dir, location, pond)
}

fn acre() -> Command {
    Command::cargo_bin("acre").unwrap()
}

// ---------------------------------------------------------------------------
// inspect
// ---------------------------------------------------------------------------

#[test]
fn inspect_summarizes_location() {
    let (_dir, location, _) = test_files();
    acre()
        .arg("inspect")
        .arg(&location)
        .assert()
        .success()
        .stdout(predicate::str::contains("Meadow"))
        .stdout(predicate::str::contains("6x6 tiles"))
        .stdout(predicate::str::contains("objects"));
}

#[test]
fn inspect_tile_lists_occupants() {
    let (_dir, location, _) = test_files();
    acre()
        .args(["inspect", "--tile", "3,3"])
        .arg(&location)
        .assert()
        .success()
        .stdout(predicate::str::contains("boulder"))
        .stdout(predicate::str::contains("placeable:"));
}

#[test]
fn inspect_tile_respects_mask() {
    let (_dir, location, _) = test_files();
    acre()
        .args(["inspect", "--tile", "3,3", "--mask", "furniture|buildings"])
        .arg(&location)
        .assert()
        .success()
        .stdout(predicate::str::contains("(no occupants)"))
        .stdout(predicate::str::contains("boulder").not());
}

#[test]
fn inspect_map_draws_occupancy() {
    let (_dir, location, _) = test_files();
    acre()
        .args(["inspect", "--map"])
        .arg(&location)
        .assert()
        .success()
        .stdout(predicate::str::contains("...o.."));
}

#[test]
fn inspect_rejects_bad_tile() {
    let (_dir, location, _) = test_files();
    acre()
        .args(["inspect", "--tile", "3"])
        .arg(&location)
        .assert()
        .failure();
}

#[test]
fn inspect_missing_file_fails() {
    acre()
        .args(["inspect", "/nonexistent/meadow.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn inspect_invalid_json_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ not json").unwrap();
    acre()
        .arg("inspect")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid location file"));
}

// ---------------------------------------------------------------------------
// patch
// ---------------------------------------------------------------------------

#[test]
fn patch_writes_patched_location() {
    let (dir, location, pond) = test_files();
    let out = dir.path().join("patched.json");
    acre()
        .arg("patch")
        .arg(&location)
        .arg("--source")
        .arg(&pond)
        .args(["--key", "pond", "--dest", "1,1,2,2"])
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stderr(predicate::str::contains("Applied"));

    let written = fs::read_to_string(&out).unwrap();
    assert!(written.contains("\"pond\""));
    assert!(written.contains("\"index\": 12"));
}

#[test]
fn patch_same_key_is_applied_once() {
    let (dir, location, pond) = test_files();
    let first = dir.path().join("first.json");
    let second = dir.path().join("second.json");
    acre()
        .arg("patch")
        .arg(&location)
        .arg("--source")
        .arg(&pond)
        .args(["--key", "pond"])
        .arg("--output")
        .arg(&first)
        .assert()
        .success();
    acre()
        .arg("patch")
        .arg(&first)
        .arg("--source")
        .arg(&pond)
        .args(["--key", "pond"])
        .arg("--output")
        .arg(&second)
        .assert()
        .success()
        .stderr(predicate::str::contains("already applied"));

    let a: serde_json::Value = serde_json::from_str(&fs::read_to_string(&first).unwrap()).unwrap();
    let b: serde_json::Value = serde_json::from_str(&fs::read_to_string(&second).unwrap()).unwrap();
    assert_eq!(a["map"], b["map"]);
}

#[test]
fn patch_to_stdout() {
    let (_dir, location, pond) = test_files();
    acre()
        .arg("patch")
        .arg(&location)
        .arg("--source")
        .arg(&pond)
        .args(["--key", "pond"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"applied_patches\""));
}

#[test]
fn patch_rejects_bad_rect() {
    let (_dir, location, pond) = test_files();
    acre()
        .arg("patch")
        .arg(&location)
        .arg("--source")
        .arg(&pond)
        .args(["--key", "pond", "--dest", "1,1,two,2"])
        .assert()
        .failure();
}

// ---------------------------------------------------------------------------
// simulate
// ---------------------------------------------------------------------------

#[test]
fn simulate_runs_days() {
    let (_dir, location, _) = test_files();
    acre()
        .arg("simulate")
        .arg(&location)
        .args(["--days", "2", "--frames", "10", "--seed", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Simulation"))
        .stdout(predicate::str::contains("Meadow"))
        .stdout(predicate::str::contains("terrain features"));
}

#[test]
fn simulate_verbose_shows_event_log() {
    let (_dir, location, _) = test_files();
    acre()
        .arg("simulate")
        .arg(&location)
        .args(["--days", "1", "--frames", "1", "--verbose"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Event Log"))
        .stdout(predicate::str::contains("viewing Meadow"));
}
