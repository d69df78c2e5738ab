use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{CatalogEntry, ListEntry};

/// Current on-disk format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Whole-library state as written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Format version, checked on load.
    pub version: u32,
    /// Next catalog id to hand out; ids are never reused.
    pub next_catalog_id: u64,
    /// Next list entry id to hand out; ids are never reused.
    pub next_entry_id: u64,
    /// Catalog in insertion order.
    #[serde(default)]
    pub catalog: Vec<CatalogEntry>,
    /// List entries of every user.
    #[serde(default)]
    pub entries: Vec<ListEntry>,
    /// Timestamp of the last successful write.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            next_catalog_id: 1,
            next_entry_id: 1,
            catalog: Vec::new(),
            entries: Vec::new(),
            updated_at: None,
        }
    }
}

impl Snapshot {
    /// Load a snapshot from the given path, returning `None` if it does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read library {}", path.display()))?;
        let mut snapshot: Snapshot = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse library {}", path.display()))?;
        if snapshot.version != SNAPSHOT_VERSION {
            bail!(
                "unsupported library version {} in {}",
                snapshot.version,
                path.display()
            );
        }
        snapshot.repair_next_ids(path);
        Ok(Some(snapshot))
    }

    /// Raise id counters that lag behind stored ids, so a hand-edited file
    /// cannot cause an id to be handed out twice.
    fn repair_next_ids(&mut self, path: &Path) {
        let catalog_floor = self.catalog.iter().map(|game| game.id.0 + 1).max().unwrap_or(1);
        if self.next_catalog_id < catalog_floor {
            warn!(
                path = %path.display(),
                stored = self.next_catalog_id,
                repaired = catalog_floor,
                "catalog id counter behind stored ids"
            );
            self.next_catalog_id = catalog_floor;
        }

        let entry_floor = self.entries.iter().map(|entry| entry.id.0 + 1).max().unwrap_or(1);
        if self.next_entry_id < entry_floor {
            warn!(
                path = %path.display(),
                stored = self.next_entry_id,
                repaired = entry_floor,
                "entry id counter behind stored ids"
            );
            self.next_entry_id = entry_floor;
        }
    }

    /// Persist the snapshot, creating parent directories if needed.
    ///
    /// The file is replaced through a sibling temporary file and a rename.
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create library directory {}", parent.display())
            })?;
        }

        let serialized =
            serde_json::to_vec_pretty(self).context("failed to serialize library snapshot")?;
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, serialized)
            .with_context(|| format!("failed to write {}", staging.display()))?;
        if let Err(err) = fs::rename(&staging, path) {
            let _ = fs::remove_file(&staging);
            return Err(err)
                .with_context(|| format!("failed to replace library {}", path.display()));
        }
        Ok(())
    }
}
