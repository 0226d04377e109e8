use anyhow::Result;
use perimeter_config::{
    load_layered_yaml, report_unused_keys, EngineConfig, Platform, UnusedKeyPolicy,
};
use tracing::{info, warn};

fn as_refs(paths: &[String]) -> Vec<&str> {
    paths.iter().map(|s| s.as_str()).collect()
}

pub fn config_hash(paths: &[String]) -> Result<()> {
    let loaded = load_layered_yaml(&as_refs(paths))?;
    println!("config_hash={}", loaded.config_hash);
    println!("{}", loaded.canonical_json);
    Ok(())
}

pub fn config_check(paths: &[String], strict: bool) -> Result<()> {
    let loaded = load_layered_yaml(&as_refs(paths))?;

    let policy = if strict {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let report = report_unused_keys(&loaded.config_json, policy)?;
    for key in &report.unused_leaf_pointers {
        warn!(key = %key, "unused config key");
    }

    let cfg = EngineConfig::from_loaded(&loaded)?;
    info!(config_hash = %loaded.config_hash, "config ok");

    println!("config_hash={}", loaded.config_hash);
    println!("platform={}", platform_name(cfg.platform));
    println!("fence_limit={}", cfg.policy.limit);
    println!(
        "radius_m={}..={}",
        cfg.policy.min_radius_m, cfg.policy.max_radius_m
    );
    println!("persistence_key={}", cfg.persistence.key);
    match &cfg.persistence.dir {
        Some(dir) => println!("persistence_dir={}", dir.display()),
        None => println!("persistence_dir=<memory>"),
    }
    println!("unused_keys={}", report.unused_leaf_pointers.len());
    Ok(())
}

fn platform_name(p: Platform) -> &'static str {
    match p {
        Platform::Ios => "ios",
        Platform::Android => "android",
        Platform::Custom => "custom",
    }
}
