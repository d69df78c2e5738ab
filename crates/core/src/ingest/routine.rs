use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::{CatalogSource, ListingItem};
use crate::{
    config::RawgConfig,
    models::{NewCatalogEntry, UNKNOWN_CREDIT},
    store::CatalogRepository,
};

const RELEASE_DATE_FORMAT: &str = "%Y-%m-%d";

/// How much of the provider's listing to walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestSettings {
    /// Listing pages requested, starting at page 1.
    pub pages: u32,
    /// Items per listing page.
    pub page_size: u32,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self::from(&RawgConfig::default())
    }
}

impl From<&RawgConfig> for IngestSettings {
    fn from(config: &RawgConfig) -> Self {
        Self {
            pages: config.pages,
            page_size: config.page_size,
        }
    }
}

/// Tally of one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Listing pages that decoded.
    pub pages_fetched: usize,
    /// Listing pages that failed or came back empty.
    pub pages_skipped: usize,
    /// New catalog entries written.
    pub inserted: usize,
    /// Items whose title was already in the catalog.
    pub duplicates: usize,
    /// Items missing a name, slug, detail record or valid date.
    pub incomplete: usize,
    /// Items dropped because a request or the store failed.
    pub failed: usize,
}

enum Outcome {
    Inserted,
    Duplicate,
    Incomplete,
    Failed,
}

/// Populates the catalog from a [`CatalogSource`].
///
/// Not safe to run concurrently with itself; sequential re-runs are
/// idempotent because titles already in the catalog are skipped.
pub struct Ingestor<S, C> {
    settings: IngestSettings,
    source: S,
    catalog: C,
}

impl<S: CatalogSource, C: CatalogRepository> Ingestor<S, C> {
    /// Ingestor writing into `catalog`.
    pub fn new(settings: IngestSettings, source: S, catalog: C) -> Self {
        Self {
            settings,
            source,
            catalog,
        }
    }

    /// Run only when the catalog is empty. Returns `None` when skipped.
    pub fn run_if_empty(&self) -> Result<Option<IngestReport>> {
        let count = self.catalog.game_count()?;
        if count > 0 {
            debug!(count, "catalog already populated, skipping ingestion");
            return Ok(None);
        }
        Ok(Some(self.run()))
    }

    /// Walk every configured listing page and insert unseen games.
    ///
    /// Failures only skip the affected page or item.
    pub fn run(&self) -> IngestReport {
        let mut report = IngestReport::default();
        info!(
            pages = self.settings.pages,
            page_size = self.settings.page_size,
            "catalog ingestion started"
        );

        for page in 1..=self.settings.pages {
            let items = match self.source.listing(page, self.settings.page_size) {
                Ok(Some(listing)) => match listing.results {
                    Some(items) => items,
                    None => {
                        warn!(page, "listing page has no results, skipping");
                        report.pages_skipped += 1;
                        continue;
                    }
                },
                Ok(None) => {
                    warn!(page, "listing page is empty, skipping");
                    report.pages_skipped += 1;
                    continue;
                }
                Err(err) => {
                    warn!(page, error = %format!("{err:#}"), "listing request failed, skipping page");
                    report.pages_skipped += 1;
                    continue;
                }
            };

            report.pages_fetched += 1;
            for raw in items {
                let outcome = match serde_json::from_value::<ListingItem>(raw) {
                    Ok(item) => self.ingest_item(&item),
                    Err(err) => {
                        debug!(page, error = %err, "malformed listing item");
                        Outcome::Incomplete
                    }
                };
                match outcome {
                    Outcome::Inserted => report.inserted += 1,
                    Outcome::Duplicate => report.duplicates += 1,
                    Outcome::Incomplete => report.incomplete += 1,
                    Outcome::Failed => report.failed += 1,
                }
            }
        }

        info!(
            inserted = report.inserted,
            duplicates = report.duplicates,
            incomplete = report.incomplete,
            failed = report.failed,
            pages_skipped = report.pages_skipped,
            "catalog ingestion finished"
        );
        report
    }

    fn ingest_item(&self, item: &ListingItem) -> Outcome {
        let (Some(title), Some(slug)) = (non_blank(&item.name), non_blank(&item.slug)) else {
            debug!(?item, "listing item lacks a name or slug");
            return Outcome::Incomplete;
        };

        match self.catalog.game_by_title(title) {
            Ok(Some(_)) => {
                debug!(title, "already in catalog");
                return Outcome::Duplicate;
            }
            Ok(None) => {}
            Err(err) => {
                warn!(title, error = %format!("{err:#}"), "title lookup failed");
                return Outcome::Failed;
            }
        }

        let detail = match self.source.detail(slug) {
            Ok(Some(detail)) => detail,
            Ok(None) => {
                debug!(slug, "no detail record");
                return Outcome::Incomplete;
            }
            Err(err) => {
                warn!(slug, error = %format!("{err:#}"), "detail request failed");
                return Outcome::Failed;
            }
        };

        let Some(release_date) = item.released.as_deref().and_then(parse_release_date) else {
            debug!(title, released = ?item.released, "unparseable release date");
            return Outcome::Incomplete;
        };

        let entry = NewCatalogEntry {
            title: title.to_string(),
            developer: detail.first_developer().unwrap_or(UNKNOWN_CREDIT).to_string(),
            publisher: detail.first_publisher().unwrap_or(UNKNOWN_CREDIT).to_string(),
            release_date,
            cover_url: non_blank(&item.background_image).map(str::to_string),
            slug: Some(slug.to_string()),
        };

        match self.catalog.insert_game(entry) {
            Ok(game) => {
                debug!(id = %game.id, title = %game.title, "catalog entry added");
                Outcome::Inserted
            }
            Err(err) => {
                warn!(title, error = %format!("{err:#}"), "failed to store catalog entry");
                Outcome::Failed
            }
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|text| !text.trim().is_empty())
}

fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), RELEASE_DATE_FORMAT).ok()
}
