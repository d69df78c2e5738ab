#![allow(missing_docs)]

//! Shared domain models.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LibraryError;

/// Placeholder used when the provider does not credit a developer or publisher.
pub const UNKNOWN_CREDIT: &str = "Unknown";

/// Longest note accepted on a list entry, counted in characters.
pub const MAX_NOTE_CHARS: usize = 255;

/// Identifier of a catalog entry, assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogId(pub u64);

/// Identifier of a list entry, independent of [`CatalogId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl fmt::Display for CatalogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Read-only view over anything that looks like a game.
///
/// Catalog entries have no rating, so the default accessor reports none.
pub trait GameView {
    /// Game title.
    fn title(&self) -> &str;
    /// Credited developer, or [`UNKNOWN_CREDIT`].
    fn developer(&self) -> &str;
    /// Credited publisher, or [`UNKNOWN_CREDIT`].
    fn publisher(&self) -> &str;
    /// First release date.
    fn release_date(&self) -> NaiveDate;
    /// User rating, when the view carries one.
    fn rating(&self) -> Option<u8> {
        None
    }
}

/// One game known to the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Store-assigned identifier.
    pub id: CatalogId,
    /// Game title; case-insensitive de-duplication key for ingestion.
    pub title: String,
    /// First credited developer.
    pub developer: String,
    /// First credited publisher.
    pub publisher: String,
    /// Release date.
    pub release_date: NaiveDate,
    /// Cover art URL.
    #[serde(default)]
    pub cover_url: Option<String>,
    /// Provider key the entry was ingested from.
    #[serde(default)]
    pub slug: Option<String>,
    /// When the entry entered the catalog.
    pub added_at: DateTime<Utc>,
}

impl GameView for CatalogEntry {
    fn title(&self) -> &str {
        &self.title
    }

    fn developer(&self) -> &str {
        &self.developer
    }

    fn publisher(&self) -> &str {
        &self.publisher
    }

    fn release_date(&self) -> NaiveDate {
        self.release_date
    }
}

/// Catalog entry data before the store assigns an identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCatalogEntry {
    pub title: String,
    pub developer: String,
    pub publisher: String,
    pub release_date: NaiveDate,
    pub cover_url: Option<String>,
    pub slug: Option<String>,
}

impl NewCatalogEntry {
    /// Minimal constructor with unknown credits and no artwork.
    pub fn new(title: impl Into<String>, release_date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            developer: UNKNOWN_CREDIT.to_string(),
            publisher: UNKNOWN_CREDIT.to_string(),
            release_date,
            cover_url: None,
            slug: None,
        }
    }

    pub fn with_credits(mut self, developer: impl Into<String>, publisher: impl Into<String>) -> Self {
        self.developer = developer.into();
        self.publisher = publisher.into();
        self
    }

    pub(crate) fn into_entry(self, id: CatalogId) -> CatalogEntry {
        CatalogEntry {
            id,
            title: self.title,
            developer: self.developer,
            publisher: self.publisher,
            release_date: self.release_date,
            cover_url: self.cover_url,
            slug: self.slug,
            added_at: Utc::now(),
        }
    }
}

/// A rating in the closed range 1..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Validate a raw rating.
    pub fn new(raw: i64) -> Result<Self, LibraryError> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&raw) {
            Ok(Self(raw as u8))
        } else {
            Err(LibraryError::Validation(format!(
                "rating must be between {} and {}, got {raw}",
                Self::MIN,
                Self::MAX
            )))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = LibraryError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(i64::from(value))
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validate a free-text note, folding empty input into `None`.
pub fn validate_note(note: Option<String>) -> Result<Option<String>, LibraryError> {
    match note {
        None => Ok(None),
        Some(text) if text.is_empty() => Ok(None),
        Some(text) => {
            let chars = text.chars().count();
            if chars > MAX_NOTE_CHARS {
                Err(LibraryError::Validation(format!(
                    "note must be at most {MAX_NOTE_CHARS} characters, got {chars}"
                )))
            } else {
                Ok(Some(text))
            }
        }
    }
}

/// A user's personal record for one catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListEntry {
    /// Store-assigned identifier.
    pub id: EntryId,
    /// Owner of the entry.
    pub user: String,
    /// Referenced catalog entry.
    pub catalog_id: CatalogId,
    pub rating: Rating,
    #[serde(default)]
    pub note: Option<String>,
    pub added_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// List entry data before the store assigns an identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct NewListEntry {
    pub user: String,
    pub catalog_id: CatalogId,
    pub rating: Rating,
    pub note: Option<String>,
}

impl NewListEntry {
    pub(crate) fn into_entry(self, id: EntryId) -> ListEntry {
        let now = Utc::now();
        ListEntry {
            id,
            user: self.user,
            catalog_id: self.catalog_id,
            rating: self.rating,
            note: self.note,
            added_at: now,
            updated_at: now,
        }
    }
}

/// A list entry joined with the catalog entry it references.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListEntryView {
    pub id: EntryId,
    pub catalog_id: CatalogId,
    pub cover_url: Option<String>,
    pub title: String,
    pub developer: String,
    pub publisher: String,
    pub release_date: NaiveDate,
    pub rating: Rating,
    pub note: Option<String>,
}

impl ListEntryView {
    pub fn new(entry: &ListEntry, game: &CatalogEntry) -> Self {
        Self {
            id: entry.id,
            catalog_id: game.id,
            cover_url: game.cover_url.clone(),
            title: game.title.clone(),
            developer: game.developer.clone(),
            publisher: game.publisher.clone(),
            release_date: game.release_date,
            rating: entry.rating,
            note: entry.note.clone(),
        }
    }
}

impl GameView for ListEntryView {
    fn title(&self) -> &str {
        &self.title
    }

    fn developer(&self) -> &str {
        &self.developer
    }

    fn publisher(&self) -> &str {
        &self.publisher
    }

    fn release_date(&self) -> NaiveDate {
        self.release_date
    }

    fn rating(&self) -> Option<u8> {
        Some(self.rating.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_bounds() {
        assert!(Rating::new(0).is_err());
        assert!(Rating::new(6).is_err());
        assert_eq!(Rating::new(1).map(Rating::value).ok(), Some(1));
        assert_eq!(Rating::new(5).map(Rating::value).ok(), Some(5));
    }

    #[test]
    fn rating_rejects_out_of_range_on_deserialize() {
        assert!(serde_json::from_str::<Rating>("4").is_ok());
        assert!(serde_json::from_str::<Rating>("9").is_err());
    }

    #[test]
    fn note_length_boundary() {
        let exact = "x".repeat(MAX_NOTE_CHARS);
        assert_eq!(validate_note(Some(exact.clone())).ok(), Some(Some(exact)));
        assert!(validate_note(Some("x".repeat(MAX_NOTE_CHARS + 1))).is_err());
        // Multi-byte characters count once each.
        assert!(validate_note(Some("é".repeat(MAX_NOTE_CHARS))).is_ok());
        assert_eq!(validate_note(Some(String::new())).ok(), Some(None));
    }
}
