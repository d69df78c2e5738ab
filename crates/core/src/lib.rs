#![warn(clippy::all, missing_docs)]

//! Core domain logic for gametrack.
//!
//! This crate hosts the data models, configuration handling, the
//! filter/sort/paginate pipeline, catalog ingestion and the persistence
//! layer used by the terminal UI and any future frontends.

pub mod config;
pub mod error;
pub mod filter;
pub mod ingest;
pub mod library;
pub mod models;
pub mod paginate;
pub mod query;
pub mod store;

pub use crate::config::AppConfig;
pub use crate::error::{ErrorKind, LibraryError};
pub use crate::library::{EntryRequest, EntryUpdate, Library, ProfileStats};
pub use crate::models::{CatalogEntry, CatalogId, EntryId, GameView, ListEntry, ListEntryView, Rating};
pub use crate::paginate::{Page, PageRequest};
pub use crate::query::{CatalogQuery, ListQuery};
pub use crate::store::LocalStore;
