//! In-memory search, filtering and ordering of catalog and list entries.
//!
//! Every function borrows its input and returns a fresh collection; entries
//! are cloned, never modified.

use std::{cmp::Ordering, collections::HashSet};

use crate::models::{CatalogEntry, CatalogId, GameView, Rating};

/// Ordering applied to a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Case-insensitive title, ascending.
    Title,
    /// Earliest release first.
    ReleaseDate,
    /// Highest rating first, unrated entries last.
    Rating,
}

impl SortKey {
    /// All keys in the order a UI cycles through them.
    pub const ALL: [SortKey; 3] = [SortKey::Title, SortKey::ReleaseDate, SortKey::Rating];

    /// Parse the query vocabulary; unknown values mean "keep input order".
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "title" => Some(Self::Title),
            "release-date" | "releaseDate" => Some(Self::ReleaseDate),
            "rating" => Some(Self::Rating),
            _ => None,
        }
    }

    /// Canonical query value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::ReleaseDate => "release-date",
            Self::Rating => "rating",
        }
    }
}

/// Restricts catalog results by presence on the user's list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    /// Only entries already on the list.
    In,
    /// Only entries not on the list.
    NotIn,
}

impl Membership {
    /// Parse the query vocabulary; unknown values mean "no filter".
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "in" | "inList" => Some(Self::In),
            "not-in" | "notInList" => Some(Self::NotIn),
            _ => None,
        }
    }

    /// Canonical query value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::NotIn => "not-in",
        }
    }
}

/// Exact-match rating filter; `RatingFilter::Any` keeps everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RatingFilter {
    /// No rating restriction.
    #[default]
    Any,
    /// Only entries rated exactly this.
    Exactly(Rating),
}

impl RatingFilter {
    /// Interpret a raw rating parameter.
    ///
    /// Absent values, the `-1` sentinel and anything outside 1..=5 disable
    /// the filter rather than failing.
    pub fn from_raw(raw: Option<i64>) -> Self {
        raw.and_then(|value| Rating::new(value).ok())
            .map(Self::Exactly)
            .unwrap_or(Self::Any)
    }

    /// The rating being matched, if any.
    pub fn rating(self) -> Option<Rating> {
        match self {
            Self::Any => None,
            Self::Exactly(rating) => Some(rating),
        }
    }
}

/// Keep entries whose title, developer or publisher contains `term`,
/// ignoring case. An absent or empty term returns the input unchanged.
pub fn search<T: GameView + Clone>(entries: &[T], term: Option<&str>) -> Vec<T> {
    let needle = match term {
        Some(term) if !term.is_empty() => term.to_lowercase(),
        _ => return entries.to_vec(),
    };

    entries
        .iter()
        .filter(|entry| {
            entry.title().to_lowercase().contains(&needle)
                || entry.developer().to_lowercase().contains(&needle)
                || entry.publisher().to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

/// Keep entries rated exactly as requested.
pub fn filter_rating<T: GameView + Clone>(entries: &[T], filter: RatingFilter) -> Vec<T> {
    let Some(rating) = filter.rating() else {
        return entries.to_vec();
    };

    entries
        .iter()
        .filter(|entry| entry.rating() == Some(rating.value()))
        .cloned()
        .collect()
}

/// Keep catalog entries that are (or are not) on the user's list.
pub fn filter_membership(
    entries: &[CatalogEntry],
    membership: Option<Membership>,
    on_list: &HashSet<CatalogId>,
) -> Vec<CatalogEntry> {
    let Some(membership) = membership else {
        return entries.to_vec();
    };

    let wanted = membership == Membership::In;
    entries
        .iter()
        .filter(|entry| on_list.contains(&entry.id) == wanted)
        .cloned()
        .collect()
}

/// Order entries by `key`; ties keep their input order.
pub fn sort<T: GameView + Clone>(entries: &[T], key: Option<SortKey>) -> Vec<T> {
    let mut sorted = entries.to_vec();
    match key {
        Some(SortKey::Title) => sorted.sort_by_cached_key(|entry| entry.title().to_lowercase()),
        Some(SortKey::ReleaseDate) => sorted.sort_by_key(|entry| entry.release_date()),
        Some(SortKey::Rating) => sorted.sort_by(|a, b| rating_desc_unrated_last(a.rating(), b.rating())),
        None => {}
    }
    sorted
}

fn rating_desc_unrated_last(a: Option<u8>, b: Option<u8>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Catalog pipeline: search, then sort, then membership.
pub fn filter_catalog(
    entries: &[CatalogEntry],
    term: Option<&str>,
    key: Option<SortKey>,
    membership: Option<Membership>,
    on_list: &HashSet<CatalogId>,
) -> Vec<CatalogEntry> {
    let found = search(entries, term);
    let sorted = sort(&found, key);
    filter_membership(&sorted, membership, on_list)
}

/// List pipeline: search, then rating, then sort.
pub fn filter_list<T: GameView + Clone>(
    entries: &[T],
    term: Option<&str>,
    rating: RatingFilter,
    key: Option<SortKey>,
) -> Vec<T> {
    let found = search(entries, term);
    let rated = filter_rating(&found, rating);
    sort(&rated, key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    #[derive(Debug, Clone, PartialEq)]
    struct Rated {
        title: &'static str,
        rating: u8,
    }

    impl GameView for Rated {
        fn title(&self) -> &str {
            self.title
        }

        fn developer(&self) -> &str {
            "Dev"
        }

        fn publisher(&self) -> &str {
            "Pub"
        }

        fn release_date(&self) -> NaiveDate {
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
        }

        fn rating(&self) -> Option<u8> {
            Some(self.rating)
        }
    }

    fn game(id: u64, title: &str, developer: &str, publisher: &str, date: (i32, u32, u32)) -> CatalogEntry {
        CatalogEntry {
            id: CatalogId(id),
            title: title.to_string(),
            developer: developer.to_string(),
            publisher: publisher.to_string(),
            release_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            cover_url: None,
            slug: None,
            added_at: Utc::now(),
        }
    }

    fn sample() -> Vec<CatalogEntry> {
        vec![
            game(1, "The Witcher 3", "CD Projekt Red", "CD Projekt", (2015, 5, 19)),
            game(2, "Elden Ring", "FromSoftware", "Bandai Namco", (2022, 2, 25)),
            game(3, "Valheim", "Iron Gate", "Coffee Stain", (2021, 2, 2)),
        ]
    }

    fn titles<T: GameView>(entries: &[T]) -> Vec<&str> {
        entries.iter().map(GameView::title).collect()
    }

    fn rated(ratings: &[u8]) -> Vec<Rated> {
        const TITLES: [&str; 6] = ["a", "b", "c", "d", "e", "f"];
        ratings
            .iter()
            .enumerate()
            .map(|(idx, rating)| Rated {
                title: TITLES[idx],
                rating: *rating,
            })
            .collect()
    }

    #[test]
    fn search_matches_substring_ignoring_case() {
        let games = sample();
        assert_eq!(titles(&search(&games, Some("he"))), vec!["The Witcher 3", "Valheim"]);
        assert_eq!(titles(&search(&games, Some("FROMSOFT"))), vec!["Elden Ring"]);
        assert_eq!(titles(&search(&games, Some("coffee"))), vec!["Valheim"]);
        assert!(search(&games, Some("zelda")).is_empty());
    }

    #[test]
    fn empty_search_is_identity() {
        let games = sample();
        assert_eq!(search(&games, None), games);
        assert_eq!(search(&games, Some("")), games);
    }

    #[test]
    fn rating_filter_matches_exactly() {
        let entries = rated(&[5, 4, 3, 1, 1]);
        let five = filter_rating(&entries, RatingFilter::from_raw(Some(5)));
        assert_eq!(five.len(), 1);
        let ones = filter_rating(&entries, RatingFilter::from_raw(Some(1)));
        assert_eq!(titles(&ones), vec!["d", "e"]);
    }

    #[test]
    fn out_of_range_rating_filter_is_identity() {
        let entries = rated(&[5, 4, 3, 1, 1]);
        for raw in [None, Some(-1), Some(0), Some(6), Some(55)] {
            assert_eq!(filter_rating(&entries, RatingFilter::from_raw(raw)), entries);
        }
    }

    #[test]
    fn sort_by_title_ignores_case() {
        let mut games = sample();
        games.push(game(4, "alan wake", "Remedy", "Epic", (2010, 5, 14)));
        let sorted = sort(&games, SortKey::parse("title"));
        assert_eq!(
            titles(&sorted),
            vec!["alan wake", "Elden Ring", "The Witcher 3", "Valheim"]
        );
    }

    #[test]
    fn unknown_sort_key_keeps_order() {
        let games = sample();
        assert_eq!(SortKey::parse("bogus"), None);
        assert_eq!(sort(&games, SortKey::parse("bogus")), games);
    }

    #[test]
    fn sort_by_release_date_is_ascending() {
        let sorted = sort(&sample(), Some(SortKey::ReleaseDate));
        assert_eq!(titles(&sorted), vec!["The Witcher 3", "Valheim", "Elden Ring"]);
        assert_eq!(SortKey::parse("releaseDate"), Some(SortKey::ReleaseDate));
    }

    #[test]
    fn sort_by_rating_is_descending_and_stable() {
        let entries = rated(&[2, 5, 1, 4, 3]);
        let sorted = sort(&entries, Some(SortKey::Rating));
        let ratings: Vec<_> = sorted.iter().map(|entry| entry.rating).collect();
        assert_eq!(ratings, vec![5, 4, 3, 2, 1]);

        let ties = rated(&[3, 5, 3, 5, 3]);
        let sorted = sort(&ties, Some(SortKey::Rating));
        assert_eq!(titles(&sorted), vec!["b", "d", "a", "c", "e"]);
    }

    #[test]
    fn title_sort_is_stable_for_equal_keys() {
        let games = vec![
            game(1, "Doom", "id", "Bethesda", (2016, 5, 13)),
            game(2, "DOOM", "id", "Bethesda", (1993, 12, 10)),
            game(3, "doom", "id", "Bethesda", (2020, 3, 20)),
        ];
        let sorted = sort(&games, Some(SortKey::Title));
        let ids: Vec<_> = sorted.iter().map(|entry| entry.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn unrated_entries_keep_order_under_rating_sort() {
        let games = sample();
        assert_eq!(sort(&games, Some(SortKey::Rating)), games);
        assert_eq!(rating_desc_unrated_last(Some(1), None), Ordering::Less);
        assert_eq!(rating_desc_unrated_last(None, Some(1)), Ordering::Greater);
    }

    #[test]
    fn membership_partitions_catalog() {
        let games = sample();
        let on_list: HashSet<_> = [CatalogId(2), CatalogId(99)].into_iter().collect();

        let inside = filter_membership(&games, Membership::parse("in"), &on_list);
        let outside = filter_membership(&games, Membership::parse("not-in"), &on_list);
        assert_eq!(titles(&inside), vec!["Elden Ring"]);
        assert_eq!(titles(&outside), vec!["The Witcher 3", "Valheim"]);
        assert_eq!(inside.len() + outside.len(), games.len());
        assert!(inside.iter().all(|entry| !outside.contains(entry)));

        assert_eq!(filter_membership(&games, Membership::parse("maybe"), &on_list), games);
        assert_eq!(filter_membership(&games, None, &on_list), games);
        assert_eq!(Membership::parse("notInList"), Some(Membership::NotIn));
    }

    #[test]
    fn catalog_pipeline_searches_before_membership() {
        let games = sample();
        let on_list: HashSet<_> = [CatalogId(1), CatalogId(2)].into_iter().collect();
        let result = filter_catalog(
            &games,
            Some("e"),
            Some(SortKey::Title),
            Some(Membership::In),
            &on_list,
        );
        assert_eq!(titles(&result), vec!["Elden Ring", "The Witcher 3"]);
    }

    #[test]
    fn list_pipeline_applies_rating_then_sort() {
        let entries = rated(&[3, 5, 3, 1]);
        let result = filter_list(&entries, None, RatingFilter::from_raw(Some(3)), Some(SortKey::Title));
        assert_eq!(titles(&result), vec!["a", "c"]);
    }

    #[test]
    fn inputs_are_left_untouched() {
        let games = sample();
        let before = games.clone();
        let _ = filter_catalog(&games, Some("x"), Some(SortKey::Title), Some(Membership::NotIn), &HashSet::new());
        assert_eq!(games, before);
    }
}
