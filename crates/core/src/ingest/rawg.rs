use anyhow::{Context, Result};
use reqwest::{
    blocking::{Client, Response},
    StatusCode,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{CatalogSource, GameDetail, ListingPage};
use crate::config::RawgConfig;

/// Blocking client for the RAWG games API.
///
/// Uses the HTTP client's defaults: no retry, backoff or rate limiting.
pub struct RawgClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl RawgClient {
    /// Build a client from provider settings.
    pub fn new(config: &RawgConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("gametrack/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn detail_url(&self, slug: &str) -> String {
        format!("{}/{}", self.base_url, slug)
    }
}

impl CatalogSource for RawgClient {
    fn listing(&self, page: u32, page_size: u32) -> Result<Option<ListingPage>> {
        debug!(page, page_size, "requesting listing page");
        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("key", self.api_key.clone()),
                ("page", page.to_string()),
                ("page_size", page_size.to_string()),
            ])
            .send()
            .with_context(|| format!("listing request for page {page} failed"))?;
        decode(response, &format!("listing page {page}"))
    }

    fn detail(&self, slug: &str) -> Result<Option<GameDetail>> {
        debug!(slug, "requesting game detail");
        let response = self
            .http
            .get(self.detail_url(slug))
            .query(&[("key", self.api_key.as_str())])
            .send()
            .with_context(|| format!("detail request for {slug} failed"))?;
        decode(response, &format!("detail for {slug}"))
    }
}

/// 404 and empty bodies become `None`; other error statuses fail.
fn decode<T: DeserializeOwned>(response: Response, what: &str) -> Result<Option<T>> {
    if response.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    let response = response
        .error_for_status()
        .with_context(|| format!("provider rejected {what}"))?;
    let body = response
        .text()
        .with_context(|| format!("failed to read {what}"))?;
    if body.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&body)
        .map(Some)
        .with_context(|| format!("failed to decode {what}"))
}
