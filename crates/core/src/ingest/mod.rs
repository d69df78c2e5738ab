//! Catalog ingestion from an external metadata provider.
//!
//! [`CatalogSource`] abstracts the provider so the ingestion routine can be
//! driven by [`RawgClient`] in production and by in-memory fakes in tests.

mod rawg;
mod routine;

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub use rawg::RawgClient;
pub use routine::{IngestReport, IngestSettings, Ingestor};

/// External provider of catalog listings and per-game detail.
pub trait CatalogSource {
    /// Fetch one listing page (1-based). `Ok(None)` means the provider sent no body.
    fn listing(&self, page: u32, page_size: u32) -> Result<Option<ListingPage>>;
    /// Fetch detail for one game. `Ok(None)` means the provider has no such game.
    fn detail(&self, slug: &str) -> Result<Option<GameDetail>>;
}

/// One page of the provider's game listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingPage {
    /// Total number of games the provider knows about.
    #[serde(default)]
    pub count: Option<u64>,
    /// Listed games, absent on malformed responses. Items stay raw so that
    /// one badly typed item cannot fail the decode of the whole page.
    #[serde(default)]
    pub results: Option<Vec<serde_json::Value>>,
}

/// A game as it appears in a listing page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingItem {
    /// Display title.
    #[serde(default)]
    pub name: Option<String>,
    /// Release date as `YYYY-MM-DD`.
    #[serde(default)]
    pub released: Option<String>,
    /// Cover image URL.
    #[serde(default)]
    pub background_image: Option<String>,
    /// Key for the detail endpoint.
    #[serde(default)]
    pub slug: Option<String>,
}

/// Detail record; credits are only available here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameDetail {
    /// Developer studios, first one is used.
    #[serde(default)]
    pub developers: Option<Vec<Credit>>,
    /// Publishers, first one is used.
    #[serde(default)]
    pub publishers: Option<Vec<Credit>>,
}

/// A named developer or publisher.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credit {
    /// Studio or publisher name.
    #[serde(default)]
    pub name: Option<String>,
}

impl Credit {
    /// Credit with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

impl GameDetail {
    /// Name of the first credited developer.
    pub fn first_developer(&self) -> Option<&str> {
        first_name(self.developers.as_deref())
    }

    /// Name of the first credited publisher.
    pub fn first_publisher(&self) -> Option<&str> {
        first_name(self.publishers.as_deref())
    }
}

fn first_name(credits: Option<&[Credit]>) -> Option<&str> {
    credits?
        .first()?
        .name
        .as_deref()
        .filter(|name| !name.trim().is_empty())
}
