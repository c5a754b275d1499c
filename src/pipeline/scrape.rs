// src/pipeline/scrape.rs

//! Wiring and one-shot scrape runs.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::Config;
use crate::services::{EventExtractor, EventProvider, HttpListing, MapboxGeocoder};
use crate::storage::EventStore;
use crate::utils::http::create_async_client;

/// Outcome of a forced scrape.
#[derive(Debug, Clone)]
pub struct ScrapeSummary {
    pub event_count: usize,
    pub unmapped_count: usize,
    pub location: String,
    pub finished_at: DateTime<Utc>,
}

/// Build the provider for `config`, persisting to `store`.
///
/// The configuration must carry the map credential.
pub fn build_provider(config: &Config, store: Arc<dyn EventStore>) -> Result<EventProvider> {
    config.validate()?;

    let client = create_async_client(&config.http)?;
    let geocoder = Arc::new(MapboxGeocoder::new(client.clone(), &config.geocoder));
    let listing = Arc::new(HttpListing::new(client, config.listing.url.clone()));
    let extractor = EventExtractor::new(
        config.listing.selectors.clone(),
        geocoder,
        config.geocoder.min_interval(),
    )?;

    Ok(EventProvider::new(store, listing, extractor))
}

/// Scrape the listing now and overwrite `store` with the result.
///
/// Unlike [`EventProvider::get_events`] this ignores any stored collection
/// and treats a failed write as an error.
pub async fn run_scrape(config: &Config, store: Arc<dyn EventStore>) -> Result<ScrapeSummary> {
    log::info!("Scraping events from {}", config.listing.url);

    let provider = build_provider(config, Arc::clone(&store))?;
    let events = provider.scrape().await?;
    store.save(&events).await?;

    let summary = ScrapeSummary {
        event_count: events.len(),
        unmapped_count: events.iter().filter(|e| !e.is_mapped()).count(),
        location: store.location(),
        finished_at: Utc::now(),
    };
    log::info!(
        "Stored {} events ({} unmapped) at {}",
        summary.event_count,
        summary.unmapped_count,
        summary.location
    );
    Ok(summary)
}
