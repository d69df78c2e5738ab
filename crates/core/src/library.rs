//! Personal list service: browsing plus add, update and remove.
//!
//! Writes validate input first, then resolve references (not found), then
//! check uniqueness (conflict). Each step is a separate store call, so the
//! "exists, then insert" sequence is not atomic across threads.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    error::LibraryError,
    filter::{self, RatingFilter, SortKey},
    models::{
        validate_note, CatalogEntry, CatalogId, EntryId, ListEntry, ListEntryView, NewListEntry,
        Rating,
    },
    paginate::{paginate, Page},
    query::{CatalogQuery, ListQuery},
    store::{CatalogRepository, ListRepository},
};

const GAME_NOT_FOUND: &str = "Game not found.";
const ALREADY_ON_LIST: &str = "Game is already in your list.";
const NOT_ON_LIST: &str = "Game is not in your list.";

/// Result alias for list operations.
pub type LibraryResult<T> = Result<T, LibraryError>;

/// Request to put a catalog entry on a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRequest {
    /// Catalog entry to add.
    pub catalog_id: CatalogId,
    /// Raw rating; must be within 1..=5.
    pub rating: i64,
    /// Optional note, at most 255 characters.
    pub note: Option<String>,
}

/// New rating and note for an existing list entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryUpdate {
    /// Raw rating; must be within 1..=5.
    pub rating: i64,
    /// Replacement note; `None` clears it.
    pub note: Option<String>,
}

/// Summary shown on a user's profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileStats {
    /// Number of games on the list.
    pub completed: usize,
    /// Mean rating across the list, `None` when the list is empty.
    pub average_rating: Option<f64>,
}

/// List operations over a catalog store and a list store.
pub struct Library<C, L> {
    catalog: C,
    list: L,
}

impl<C: CatalogRepository, L: ListRepository> Library<C, L> {
    /// Wrap the two stores. One [`crate::LocalStore`] can serve as both.
    pub fn new(catalog: C, list: L) -> Self {
        Self { catalog, list }
    }

    /// Catalog ids currently on `user`'s list.
    pub fn catalog_ids_on_list(&self, user: &str) -> LibraryResult<HashSet<CatalogId>> {
        Ok(self
            .list
            .entries_for(user)?
            .into_iter()
            .map(|entry| entry.catalog_id)
            .collect())
    }

    /// One page of the catalog, filtered and sorted per `query`.
    pub fn browse_catalog(
        &self,
        user: &str,
        query: &CatalogQuery,
    ) -> LibraryResult<Page<CatalogEntry>> {
        let games = self.catalog.games()?;
        let on_list = match query.membership {
            Some(_) => self.catalog_ids_on_list(user)?,
            None => HashSet::new(),
        };
        let filtered = filter::filter_catalog(
            &games,
            query.search.as_deref(),
            query.sort,
            query.membership,
            &on_list,
        );
        Ok(paginate(&filtered, query.page))
    }

    /// The whole list of `user`, joined with the catalog, filtered and sorted.
    pub fn list_entries(
        &self,
        user: &str,
        search: Option<&str>,
        sort: Option<SortKey>,
        rating: RatingFilter,
    ) -> LibraryResult<Vec<ListEntryView>> {
        let views = self.joined(user)?;
        Ok(filter::filter_list(&views, search, rating, sort))
    }

    /// One page of `user`'s list.
    pub fn browse_list(&self, user: &str, query: &ListQuery) -> LibraryResult<Page<ListEntryView>> {
        let views = self.list_entries(user, query.search.as_deref(), query.sort, query.rating)?;
        Ok(paginate(&views, query.page))
    }

    /// Put a catalog entry on `user`'s list.
    pub fn add_entry(&self, user: &str, request: EntryRequest) -> LibraryResult<ListEntry> {
        let rating = Rating::new(request.rating)?;
        let note = validate_note(request.note)?;

        if !self.catalog.game_exists(request.catalog_id)? {
            return Err(LibraryError::NotFound(GAME_NOT_FOUND.to_string()));
        }
        if self.list.entry_exists_for(user, request.catalog_id)? {
            return Err(LibraryError::Conflict(ALREADY_ON_LIST.to_string()));
        }

        let entry = self.list.insert_entry(NewListEntry {
            user: user.to_string(),
            catalog_id: request.catalog_id,
            rating,
            note,
        })?;
        info!(user, entry = %entry.id, game = %entry.catalog_id, "list entry added");
        Ok(entry)
    }

    /// Replace the rating and note of one of `user`'s entries.
    pub fn update_entry(
        &self,
        user: &str,
        id: EntryId,
        update: EntryUpdate,
    ) -> LibraryResult<ListEntry> {
        let rating = Rating::new(update.rating)?;
        let note = validate_note(update.note)?;

        let mut entry = self.owned_entry(user, id)?;
        entry.rating = rating;
        entry.note = note;
        entry.updated_at = Utc::now();
        self.list.update_entry(&entry)?;
        info!(user, entry = %id, "list entry updated");
        Ok(entry)
    }

    /// Remove one of `user`'s entries.
    pub fn remove_entry(&self, user: &str, id: EntryId) -> LibraryResult<()> {
        self.owned_entry(user, id)?;
        if !self.list.delete_entry(id)? {
            return Err(LibraryError::NotFound(NOT_ON_LIST.to_string()));
        }
        info!(user, entry = %id, "list entry removed");
        Ok(())
    }

    /// Count and average rating of `user`'s list.
    pub fn profile(&self, user: &str) -> LibraryResult<ProfileStats> {
        let entries = self.list.entries_for(user)?;
        let completed = entries.len();
        let average_rating = (completed > 0).then(|| {
            let total: u32 = entries
                .iter()
                .map(|entry| u32::from(entry.rating.value()))
                .sum();
            f64::from(total) / completed as f64
        });
        Ok(ProfileStats {
            completed,
            average_rating,
        })
    }

    fn owned_entry(&self, user: &str, id: EntryId) -> LibraryResult<ListEntry> {
        match self.list.entry(id)? {
            Some(entry) if entry.user == user => Ok(entry),
            _ => Err(LibraryError::NotFound(NOT_ON_LIST.to_string())),
        }
    }

    fn joined(&self, user: &str) -> LibraryResult<Vec<ListEntryView>> {
        let games: HashMap<CatalogId, CatalogEntry> = self
            .catalog
            .games()?
            .into_iter()
            .map(|game| (game.id, game))
            .collect();

        Ok(self
            .list
            .entries_for(user)?
            .iter()
            .filter_map(|entry| match games.get(&entry.catalog_id) {
                Some(game) => Some(ListEntryView::new(entry, game)),
                None => {
                    warn!(entry = %entry.id, game = %entry.catalog_id, "list entry references a missing game");
                    None
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::NaiveDate;

    use super::*;
    use crate::{
        error::ErrorKind,
        filter::Membership,
        models::NewCatalogEntry,
        paginate::PageRequest,
        store::LocalStore,
    };

    fn seeded() -> Result<(LocalStore, Vec<CatalogEntry>)> {
        let store = LocalStore::in_memory();
        let games = [
            ("The Witcher 3", "CD Projekt Red", (2015, 5, 19)),
            ("Elden Ring", "FromSoftware", (2022, 2, 25)),
            ("Valheim", "Iron Gate", (2021, 2, 2)),
        ]
        .into_iter()
        .map(|(title, developer, (y, m, d))| {
            let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
            store.insert_game(NewCatalogEntry::new(title, date).with_credits(developer, "Various"))
        })
        .collect::<Result<Vec<_>>>()?;
        Ok((store, games))
    }

    fn request(catalog_id: CatalogId, rating: i64) -> EntryRequest {
        EntryRequest {
            catalog_id,
            rating,
            note: None,
        }
    }

    #[test]
    fn adding_twice_conflicts() -> Result<()> {
        let (store, games) = seeded()?;
        let library = Library::new(&store, &store);

        library.add_entry("ana", request(games[0].id, 5))?;
        let err = library.add_entry("ana", request(games[0].id, 3)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.user_message(), "Game is already in your list.");
        assert_eq!(store.entry_count_for("ana")?, 1);

        // Uniqueness is per user.
        library.add_entry("ben", request(games[0].id, 2))?;
        assert_eq!(store.entry_count_for("ben")?, 1);
        Ok(())
    }

    #[test]
    fn add_validates_before_lookup() -> Result<()> {
        let (store, games) = seeded()?;
        let library = Library::new(&store, &store);

        for rating in [0, 6] {
            let err = library.add_entry("ana", request(games[0].id, rating)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
        // Validation wins over a missing game.
        let err = library.add_entry("ana", request(CatalogId(999), 9)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = library.add_entry("ana", request(CatalogId(999), 3)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.user_message(), "Game not found.");

        library.add_entry("ana", request(games[0].id, 1))?;
        library.add_entry("ana", request(games[1].id, 5))?;

        let too_long = EntryRequest {
            note: Some("n".repeat(256)),
            ..request(games[2].id, 3)
        };
        assert_eq!(
            library.add_entry("ana", too_long).unwrap_err().kind(),
            ErrorKind::Validation
        );
        let just_right = EntryRequest {
            note: Some("n".repeat(255)),
            ..request(games[2].id, 3)
        };
        assert_eq!(library.add_entry("ana", just_right)?.note.map(|n| n.len()), Some(255));
        Ok(())
    }

    #[test]
    fn update_and_remove_respect_ownership() -> Result<()> {
        let (store, games) = seeded()?;
        let library = Library::new(&store, &store);
        let entry = library.add_entry("ana", request(games[1].id, 3))?;

        let update = EntryUpdate {
            rating: 4,
            note: Some("second run".to_string()),
        };
        let err = library.update_entry("ben", entry.id, update.clone()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let bad = EntryUpdate {
            rating: 0,
            note: None,
        };
        assert_eq!(
            library.update_entry("ana", entry.id, bad).unwrap_err().kind(),
            ErrorKind::Validation
        );

        let updated = library.update_entry("ana", entry.id, update)?;
        assert_eq!(updated.rating.value(), 4);
        assert_eq!(store.entry(entry.id)?, Some(updated));

        assert_eq!(
            library.remove_entry("ben", entry.id).unwrap_err().kind(),
            ErrorKind::NotFound
        );
        library.remove_entry("ana", entry.id)?;
        let err = library.remove_entry("ana", entry.id).unwrap_err();
        assert_eq!(err.user_message(), "Game is not in your list.");
        Ok(())
    }

    #[test]
    fn browse_catalog_applies_membership_after_search() -> Result<()> {
        let (store, games) = seeded()?;
        let library = Library::new(&store, &store);
        library.add_entry("ana", request(games[0].id, 5))?;

        let query = CatalogQuery {
            search: Some("he".to_string()),
            sort: Some(SortKey::Title),
            membership: Some(Membership::NotIn),
            page: PageRequest::first(18),
        };
        let page = library.browse_catalog("ana", &query)?;
        let titles: Vec<_> = page.items.iter().map(|game| game.title.as_str()).collect();
        assert_eq!(titles, ["Valheim"]);
        assert!(!page.has_next);

        let query = CatalogQuery {
            membership: Some(Membership::In),
            ..CatalogQuery::default()
        };
        let page = library.browse_catalog("ana", &query)?;
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, games[0].id);

        let page = library.browse_catalog("ben", &query)?;
        assert!(page.items.is_empty());
        Ok(())
    }

    #[test]
    fn browse_list_filters_sorts_and_pages() -> Result<()> {
        let (store, games) = seeded()?;
        let library = Library::new(&store, &store);
        for (game, rating) in games.iter().zip([2, 5, 4]) {
            library.add_entry("ana", request(game.id, rating))?;
        }

        let sorted = library.list_entries("ana", None, Some(SortKey::Rating), RatingFilter::Any)?;
        let ratings: Vec<_> = sorted.iter().map(|view| view.rating.value()).collect();
        assert_eq!(ratings, [5, 4, 2]);

        let fives = library.list_entries("ana", None, None, RatingFilter::from_raw(Some(5)))?;
        assert_eq!(fives.len(), 1);
        assert_eq!(fives[0].title, "Elden Ring");

        let query = ListQuery {
            sort: Some(SortKey::ReleaseDate),
            page: PageRequest { index: 1, size: 2 },
            ..ListQuery::default()
        };
        let page = library.browse_list("ana", &query)?;
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].title, "Elden Ring");
        assert!(page.has_previous);
        assert!(!page.has_next);
        Ok(())
    }

    #[test]
    fn missing_games_are_left_out_of_the_list() -> Result<()> {
        let (store, games) = seeded()?;
        let library = Library::new(&store, &store);
        library.add_entry("ana", request(games[0].id, 3))?;
        library.add_entry("ana", request(games[1].id, 3))?;
        store.delete_game(games[0].id)?;

        let views = library.list_entries("ana", None, None, RatingFilter::Any)?;
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].catalog_id, games[1].id);
        Ok(())
    }

    #[test]
    fn profile_reports_count_and_average() -> Result<()> {
        let (store, games) = seeded()?;
        let library = Library::new(&store, &store);
        assert_eq!(
            library.profile("ana")?,
            ProfileStats {
                completed: 0,
                average_rating: None
            }
        );

        library.add_entry("ana", request(games[0].id, 5))?;
        library.add_entry("ana", request(games[1].id, 4))?;
        let stats = library.profile("ana")?;
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.average_rating, Some(4.5));
        Ok(())
    }
}
