//! Scenario: offline snapshot tooling
//!
//! # Invariants under test
//! 1. `snapshot show` decodes a persisted snapshot and prints its fences.
//! 2. `snapshot reconcile` prints the reconciled / lost / dropped partition.
//! 3. A corrupt snapshot fails with a decode error naming the file.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;

const SNAPSHOT: &str = concat!(
    r#"[{"uid":"home","name":"Home","payload":"","lat":1.0,"lng":1.0,"radius":500,"monitor":3},"#,
    r#"{"uid":"work","name":"Work","payload":"{}","lat":2.0,"lng":2.0,"radius":800,"monitor":1}]"#
);

fn snapshot_file(dir: &tempfile::TempDir, body: &str) -> String {
    let p = dir.path().join("activeFencesJSON.json");
    fs::write(&p, body).unwrap();
    p.to_string_lossy().to_string()
}

#[test]
fn show_prints_fences() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let file = snapshot_file(&dir, SNAPSHOT);

    Command::cargo_bin("perimeter")?
        .args(["snapshot", "show", "--file", &file])
        .assert()
        .success()
        .stdout(predicate::str::contains("count=2"))
        .stdout(predicate::str::contains("\"uid\": \"work\""))
        .stdout(predicate::str::contains("\"monitor\": 1"));
    Ok(())
}

#[test]
fn reconcile_prints_partition() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let file = snapshot_file(&dir, SNAPSHOT);

    let out = Command::cargo_bin("perimeter")?
        .args([
            "snapshot", "reconcile", "--file", &file, "--live", "work", "--live", "stray",
        ])
        .output()?;
    assert!(out.status.success());

    let v: serde_json::Value = serde_json::from_slice(&out.stdout)?;
    assert_eq!(v["reconciled"], serde_json::json!(["work"]));
    assert_eq!(v["lost"], serde_json::json!(["stray"]));
    assert_eq!(v["dropped"], serde_json::json!(["home"]));
    assert_eq!(v["clean"], false);
    Ok(())
}

#[test]
fn corrupt_snapshot_fails() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let file = snapshot_file(&dir, "[{\"uid\":");

    Command::cargo_bin("perimeter")?
        .args(["snapshot", "show", "--file", &file])
        .assert()
        .failure()
        .stderr(predicate::str::contains("decode snapshot failed"));
    Ok(())
}
