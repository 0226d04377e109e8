//! Typed engine configuration.
//!
//! ```yaml
//! platform: ios            # ios | android | custom
//! fences:
//!   limit: 20              # optional for ios/android, required for custom
//!   min_radius_m: 200
//!   max_radius_m: 2000
//!   coordinate_match: lat_lng
//! persistence:
//!   key: activeFencesJSON
//!   dir: ./state
//! logging:
//!   filter: info
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use perimeter_fence::{CoordinateMatch, FencePolicy};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{load_layered_yaml, LoadedConfig};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    #[default]
    Ios,
    Android,
    /// No built-in profile; `fences.limit` must be given.
    Custom,
}

impl Platform {
    pub fn default_policy(self) -> Option<FencePolicy> {
        match self {
            Platform::Ios => Some(FencePolicy::ios()),
            Platform::Android => Some(FencePolicy::android()),
            Platform::Custom => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Durable key holding the fence snapshot.
    pub key: String,
    /// Directory for the file-backed store. `None` means in-memory only.
    pub dir: Option<PathBuf>,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            key: "activeFencesJSON".to_string(),
            dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFences {
    limit: Option<usize>,
    min_radius_m: Option<u32>,
    max_radius_m: Option<u32>,
    coordinate_match: CoordinateMatch,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    platform: Platform,
    fences: RawFences,
    persistence: PersistenceConfig,
    logging: LoggingConfig,
}

/// Everything the runtime needs, validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub platform: Platform,
    pub policy: FencePolicy,
    pub persistence: PersistenceConfig,
    pub logging: LoggingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            platform: Platform::Ios,
            policy: FencePolicy::ios(),
            persistence: PersistenceConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn load(paths: &[&str]) -> Result<Self> {
        let loaded = load_layered_yaml(paths)?;
        Self::from_loaded(&loaded)
    }

    pub fn from_loaded(loaded: &LoadedConfig) -> Result<Self> {
        Self::from_json(&loaded.config_json)
    }

    pub fn from_json(config_json: &Value) -> Result<Self> {
        let raw: RawConfig =
            serde_json::from_value(config_json.clone()).context("CONFIG_INVALID: bad shape")?;

        let base = match raw.platform.default_policy() {
            Some(p) => p,
            None => {
                let Some(limit) = raw.fences.limit else {
                    bail!("CONFIG_INVALID: platform=custom requires fences.limit");
                };
                FencePolicy {
                    limit,
                    ..FencePolicy::ios()
                }
            }
        };

        let policy = FencePolicy {
            limit: raw.fences.limit.unwrap_or(base.limit),
            min_radius_m: raw.fences.min_radius_m.unwrap_or(base.min_radius_m),
            max_radius_m: raw.fences.max_radius_m.unwrap_or(base.max_radius_m),
            coordinate_match: raw.fences.coordinate_match,
        };

        if policy.limit == 0 {
            bail!("CONFIG_INVALID: fences.limit must be > 0");
        }
        if policy.min_radius_m > policy.max_radius_m {
            bail!(
                "CONFIG_INVALID: fences.min_radius_m ({}) > fences.max_radius_m ({})",
                policy.min_radius_m,
                policy.max_radius_m
            );
        }
        if raw.persistence.key.trim().is_empty() {
            bail!("CONFIG_INVALID: persistence.key must not be empty");
        }

        Ok(Self {
            platform: raw.platform,
            policy,
            persistence: raw.persistence,
            logging: raw.logging,
        })
    }
}
