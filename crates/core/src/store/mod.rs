//! Persistence ports and the bundled local store.
//!
//! Each repository call is atomic on its own; callers that check and then
//! write (for example "exists, then insert") get no cross-call guarantee.

/// JSON snapshot file format.
pub mod snapshot;
/// Thread-safe store implementing both repositories.
pub mod local;

use anyhow::Result;

use crate::models::{CatalogEntry, CatalogId, EntryId, ListEntry, NewCatalogEntry, NewListEntry};

pub use local::LocalStore;
pub use snapshot::Snapshot;

/// Access to persisted catalog entries.
pub trait CatalogRepository {
    /// Every catalog entry, in insertion order.
    fn games(&self) -> Result<Vec<CatalogEntry>>;
    /// Look up one entry.
    fn game(&self, id: CatalogId) -> Result<Option<CatalogEntry>>;
    /// Look up an entry by title, ignoring case.
    fn game_by_title(&self, title: &str) -> Result<Option<CatalogEntry>>;
    /// Whether an entry with this id exists.
    fn game_exists(&self, id: CatalogId) -> Result<bool>;
    /// Number of catalog entries.
    fn game_count(&self) -> Result<usize>;
    /// Persist a new entry and return it with its assigned id.
    fn insert_game(&self, entry: NewCatalogEntry) -> Result<CatalogEntry>;
    /// Remove an entry, reporting whether it existed.
    fn delete_game(&self, id: CatalogId) -> Result<bool>;
}

/// Access to persisted list entries.
pub trait ListRepository {
    /// Every list entry of every user, in insertion order.
    fn entries(&self) -> Result<Vec<ListEntry>>;
    /// Entries owned by `user`, in insertion order.
    fn entries_for(&self, user: &str) -> Result<Vec<ListEntry>>;
    /// Look up one entry.
    fn entry(&self, id: EntryId) -> Result<Option<ListEntry>>;
    /// Whether `user` already has an entry for `catalog_id`.
    fn entry_exists_for(&self, user: &str, catalog_id: CatalogId) -> Result<bool>;
    /// Number of entries owned by `user`.
    fn entry_count_for(&self, user: &str) -> Result<usize>;
    /// Persist a new entry and return it with its assigned id.
    fn insert_entry(&self, entry: NewListEntry) -> Result<ListEntry>;
    /// Overwrite an existing entry; fails when it does not exist.
    fn update_entry(&self, entry: &ListEntry) -> Result<()>;
    /// Remove an entry, reporting whether it existed.
    fn delete_entry(&self, id: EntryId) -> Result<bool>;
}

impl<T: CatalogRepository + ?Sized> CatalogRepository for &T {
    fn games(&self) -> Result<Vec<CatalogEntry>> {
        (**self).games()
    }

    fn game(&self, id: CatalogId) -> Result<Option<CatalogEntry>> {
        (**self).game(id)
    }

    fn game_by_title(&self, title: &str) -> Result<Option<CatalogEntry>> {
        (**self).game_by_title(title)
    }

    fn game_exists(&self, id: CatalogId) -> Result<bool> {
        (**self).game_exists(id)
    }

    fn game_count(&self) -> Result<usize> {
        (**self).game_count()
    }

    fn insert_game(&self, entry: NewCatalogEntry) -> Result<CatalogEntry> {
        (**self).insert_game(entry)
    }

    fn delete_game(&self, id: CatalogId) -> Result<bool> {
        (**self).delete_game(id)
    }
}

impl<T: ListRepository + ?Sized> ListRepository for &T {
    fn entries(&self) -> Result<Vec<ListEntry>> {
        (**self).entries()
    }

    fn entries_for(&self, user: &str) -> Result<Vec<ListEntry>> {
        (**self).entries_for(user)
    }

    fn entry(&self, id: EntryId) -> Result<Option<ListEntry>> {
        (**self).entry(id)
    }

    fn entry_exists_for(&self, user: &str, catalog_id: CatalogId) -> Result<bool> {
        (**self).entry_exists_for(user, catalog_id)
    }

    fn entry_count_for(&self, user: &str) -> Result<usize> {
        (**self).entry_count_for(user)
    }

    fn insert_entry(&self, entry: NewListEntry) -> Result<ListEntry> {
        (**self).insert_entry(entry)
    }

    fn update_entry(&self, entry: &ListEntry) -> Result<()> {
        (**self).update_entry(entry)
    }

    fn delete_entry(&self, id: EntryId) -> Result<bool> {
        (**self).delete_entry(id)
    }
}
