use std::fs;

use anyhow::{Context, Result};
use perimeter_reconcile::{reconcile as reconcile_snapshot, LiveRegions, PersistedSnapshot};
use serde_json::json;

fn read_snapshot(file: &str) -> Result<PersistedSnapshot> {
    let raw = fs::read_to_string(file).with_context(|| format!("read snapshot failed: {file}"))?;
    PersistedSnapshot::decode(&raw).with_context(|| format!("decode snapshot failed: {file}"))
}

pub fn show(file: &str) -> Result<()> {
    let snap = read_snapshot(file)?;
    println!("count={}", snap.len());
    let out = serde_json::to_string_pretty(&json!({ "data": snap.fences }))
        .context("serialize fences failed")?;
    println!("{out}");
    Ok(())
}

pub fn reconcile(file: &str, live: &[String]) -> Result<()> {
    let snap = read_snapshot(file)?;
    let live: LiveRegions = live.iter().cloned().collect();
    let report = reconcile_snapshot(&snap, &live);

    let out = json!({
        "reconciled": report.reconciled_uids(),
        "lost": report.lost,
        "dropped": report.dropped,
        "clean": report.is_clean(),
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&out).context("serialize report failed")?
    );
    Ok(())
}
