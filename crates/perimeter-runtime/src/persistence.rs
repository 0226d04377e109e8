use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use perimeter_config::PersistenceConfig;
use perimeter_reconcile::{PersistedSnapshot, DEFAULT_SNAPSHOT_KEY};

use crate::PersistenceAdapter;

// ---------------------------------------------------------------------------
// MemoryPersistence
// ---------------------------------------------------------------------------

/// In-process key-value store holding the encoded snapshot string.
///
/// Clones share the same storage, so a test can drop an engine and build a
/// new one over the same "disk" to simulate a process restart.
#[derive(Clone, Debug)]
pub struct MemoryPersistence {
    key: String,
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl Default for MemoryPersistence {
    fn default() -> Self {
        Self::new(DEFAULT_SNAPSHOT_KEY)
    }
}

impl MemoryPersistence {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            entries: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The stored bytes, exactly as written.
    pub fn raw(&self) -> Option<String> {
        self.entries
            .lock()
            .ok()
            .and_then(|m| m.get(&self.key).cloned())
    }

    /// Overwrite the stored bytes without going through the encoder.
    pub fn put_raw(&self, raw: impl Into<String>) {
        if let Ok(mut m) = self.entries.lock() {
            m.insert(self.key.clone(), raw.into());
        }
    }
}

impl PersistenceAdapter for MemoryPersistence {
    fn save(&mut self, snapshot: &PersistedSnapshot) -> Result<()> {
        let encoded = snapshot.encode().context("snapshot encode failed")?;
        let mut m = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory persistence lock poisoned"))?;
        m.insert(self.key.clone(), encoded);
        Ok(())
    }

    fn load(&mut self) -> Result<Option<PersistedSnapshot>> {
        let raw = {
            let m = self
                .entries
                .lock()
                .map_err(|_| anyhow!("memory persistence lock poisoned"))?;
            m.get(&self.key).cloned()
        };
        match raw {
            None => Ok(None),
            Some(raw) => {
                let snap = PersistedSnapshot::decode(&raw)
                    .with_context(|| format!("snapshot decode failed for key {}", self.key))?;
                Ok(Some(snap))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// JsonFileStore
// ---------------------------------------------------------------------------

/// One JSON file per key: `<dir>/<key>.json`.
///
/// Writes go to `<key>.json.tmp`, are fsynced, and are renamed into place.
/// The directory is fsynced after the rename. A crash at any point leaves
/// either the previous snapshot or the new one.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    key: String,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            key: key.into(),
        }
    }

    /// `None` when the config has no `persistence.dir`.
    pub fn from_config(cfg: &PersistenceConfig) -> Option<Self> {
        cfg.dir.as_ref().map(|d| Self::new(d, cfg.key.clone()))
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.key))
    }

    fn tmp_path(&self) -> PathBuf {
        self.dir.join(format!("{}.json.tmp", self.key))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl PersistenceAdapter for JsonFileStore {
    fn save(&mut self, snapshot: &PersistedSnapshot) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("create snapshot dir failed: {}", self.dir.display()))?;

        let encoded = snapshot.encode().context("snapshot encode failed")?;
        let tmp = self.tmp_path();
        let dst = self.path();
        {
            let mut file = File::create(&tmp)
                .with_context(|| format!("create failed: {}", tmp.display()))?;
            file.write_all(encoded.as_bytes())
                .with_context(|| format!("write failed: {}", tmp.display()))?;
            file.sync_all()
                .with_context(|| format!("fsync failed: {}", tmp.display()))?;
        }
        fs::rename(&tmp, &dst)
            .with_context(|| format!("rename {} -> {} failed", tmp.display(), dst.display()))?;

        // Make the rename itself durable. Some platforms cannot open a
        // directory for sync; the data is already on disk there.
        if let Ok(dir) = File::open(&self.dir) {
            let _ = dir.sync_all();
        }
        Ok(())
    }

    fn load(&mut self) -> Result<Option<PersistedSnapshot>> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("read failed: {}", path.display()))?;
        let snap = PersistedSnapshot::decode(&raw)
            .with_context(|| format!("snapshot decode failed: {}", path.display()))?;
        Ok(Some(snap))
    }
}
