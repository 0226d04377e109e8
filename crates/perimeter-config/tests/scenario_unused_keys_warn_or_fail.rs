//! Scenario: unused-key guard
//!
//! 1. Unused keys are reported in WARN mode without error.
//! 2. Unused keys fail in FAIL mode with CONFIG_UNUSED_KEYS.
//! 3. Keys under consumed prefixes are never flagged.

use perimeter_config::{load_layered_yaml_from_strings, report_unused_keys, UnusedKeyPolicy};

#[test]
fn warn_mode_reports_typos() {
    let loaded = load_layered_yaml_from_strings(&["
platform: ios
fence:
  limit: 10
"])
    .unwrap();
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn).unwrap();
    assert!(!report.is_clean());
    assert_eq!(report.unused_leaf_pointers, vec!["/fence/limit"]);
}

#[test]
fn fail_mode_errors() {
    let loaded = load_layered_yaml_from_strings(&["extra: 1"]).unwrap();
    let err = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail).unwrap_err();
    assert!(err.to_string().contains("CONFIG_UNUSED_KEYS"));
}

#[test]
fn consumed_sections_are_clean() {
    let loaded = load_layered_yaml_from_strings(&["
platform: android
fences:
  limit: 50
  coordinate_match: lat_lng
persistence:
  key: k
  dir: /tmp/x
logging:
  filter: debug
"])
    .unwrap();
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail).unwrap();
    assert!(report.is_clean());
    assert_eq!(
        report.consumed_prefixes,
        vec!["/fences", "/logging", "/persistence", "/platform"]
    );
}
