use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use parking_lot::RwLock;
use tracing::{debug, info};

use super::{snapshot::Snapshot, CatalogRepository, ListRepository};
use crate::models::{
    CatalogEntry, CatalogId, EntryId, ListEntry, NewCatalogEntry, NewListEntry,
};

/// Thread-safe library store, optionally backed by a JSON snapshot file.
///
/// Clones share the same state.
#[derive(Clone)]
pub struct LocalStore {
    inner: Arc<RwLock<Inner>>,
}

struct Inner {
    path: Option<PathBuf>,
    snapshot: Snapshot,
}

impl LocalStore {
    /// Store that lives only in memory.
    pub fn in_memory() -> Self {
        Self::from_parts(None, Snapshot::default())
    }

    /// Open (or lazily create) the library file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let snapshot = match Snapshot::load(&path)? {
            Some(snapshot) => {
                info!(
                    path = %path.display(),
                    games = snapshot.catalog.len(),
                    entries = snapshot.entries.len(),
                    "library loaded"
                );
                snapshot
            }
            None => {
                info!(path = %path.display(), "starting empty library");
                Snapshot::default()
            }
        };
        Ok(Self::from_parts(Some(path), snapshot))
    }

    fn from_parts(path: Option<PathBuf>, snapshot: Snapshot) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner { path, snapshot })),
        }
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<PathBuf> {
        self.inner.read().path.clone()
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> Snapshot {
        self.inner.read().snapshot.clone()
    }

    fn read<R>(&self, f: impl FnOnce(&Snapshot) -> R) -> R {
        f(&self.inner.read().snapshot)
    }

    /// Apply `f` to a copy of the state, persist the copy, then publish it.
    ///
    /// A failure in `f` or in the disk write leaves the visible state as it was.
    fn write<R>(&self, f: impl FnOnce(&mut Snapshot) -> Result<R>) -> Result<R> {
        let mut inner = self.inner.write();
        let mut next = inner.snapshot.clone();
        let result = f(&mut next)?;
        next.updated_at = Some(Utc::now());
        if let Some(path) = inner.path.as_deref() {
            persist(&next, path)?;
        }
        inner.snapshot = next;
        Ok(result)
    }
}

fn persist(snapshot: &Snapshot, path: &Path) -> Result<()> {
    snapshot.persist(path)?;
    debug!(path = %path.display(), "library persisted");
    Ok(())
}

impl CatalogRepository for LocalStore {
    fn games(&self) -> Result<Vec<CatalogEntry>> {
        Ok(self.read(|snapshot| snapshot.catalog.clone()))
    }

    fn game(&self, id: CatalogId) -> Result<Option<CatalogEntry>> {
        Ok(self.read(|snapshot| snapshot.catalog.iter().find(|game| game.id == id).cloned()))
    }

    fn game_by_title(&self, title: &str) -> Result<Option<CatalogEntry>> {
        let needle = title.to_lowercase();
        Ok(self.read(|snapshot| {
            snapshot
                .catalog
                .iter()
                .find(|game| game.title.to_lowercase() == needle)
                .cloned()
        }))
    }

    fn game_exists(&self, id: CatalogId) -> Result<bool> {
        Ok(self.read(|snapshot| snapshot.catalog.iter().any(|game| game.id == id)))
    }

    fn game_count(&self) -> Result<usize> {
        Ok(self.read(|snapshot| snapshot.catalog.len()))
    }

    fn insert_game(&self, entry: NewCatalogEntry) -> Result<CatalogEntry> {
        if entry.title.trim().is_empty() {
            bail!("catalog entry title must not be empty");
        }
        self.write(|snapshot| {
            let id = CatalogId(snapshot.next_catalog_id);
            snapshot.next_catalog_id += 1;
            let game = entry.into_entry(id);
            snapshot.catalog.push(game.clone());
            Ok(game)
        })
    }

    fn delete_game(&self, id: CatalogId) -> Result<bool> {
        if !self.game_exists(id)? {
            return Ok(false);
        }
        self.write(|snapshot| {
            snapshot.catalog.retain(|game| game.id != id);
            Ok(true)
        })
    }
}

impl ListRepository for LocalStore {
    fn entries(&self) -> Result<Vec<ListEntry>> {
        Ok(self.read(|snapshot| snapshot.entries.clone()))
    }

    fn entries_for(&self, user: &str) -> Result<Vec<ListEntry>> {
        Ok(self.read(|snapshot| {
            snapshot
                .entries
                .iter()
                .filter(|entry| entry.user == user)
                .cloned()
                .collect()
        }))
    }

    fn entry(&self, id: EntryId) -> Result<Option<ListEntry>> {
        Ok(self.read(|snapshot| snapshot.entries.iter().find(|entry| entry.id == id).cloned()))
    }

    fn entry_exists_for(&self, user: &str, catalog_id: CatalogId) -> Result<bool> {
        Ok(self.read(|snapshot| {
            snapshot
                .entries
                .iter()
                .any(|entry| entry.user == user && entry.catalog_id == catalog_id)
        }))
    }

    fn entry_count_for(&self, user: &str) -> Result<usize> {
        Ok(self.read(|snapshot| {
            snapshot
                .entries
                .iter()
                .filter(|entry| entry.user == user)
                .count()
        }))
    }

    fn insert_entry(&self, entry: NewListEntry) -> Result<ListEntry> {
        self.write(|snapshot| {
            let id = EntryId(snapshot.next_entry_id);
            snapshot.next_entry_id += 1;
            let entry = entry.into_entry(id);
            snapshot.entries.push(entry.clone());
            Ok(entry)
        })
    }

    fn update_entry(&self, entry: &ListEntry) -> Result<()> {
        self.write(|snapshot| {
            let slot = snapshot
                .entries
                .iter_mut()
                .find(|existing| existing.id == entry.id)
                .ok_or_else(|| anyhow!("list entry {} does not exist", entry.id))?;
            *slot = entry.clone();
            Ok(())
        })
    }

    fn delete_entry(&self, id: EntryId) -> Result<bool> {
        if self.entry(id)?.is_none() {
            return Ok(false);
        }
        self.write(|snapshot| {
            snapshot.entries.retain(|entry| entry.id != id);
            Ok(true)
        })
    }
}
