// src/services/provider.rs

//! Event provider.
//!
//! Owns the in-memory collection. The first successful call populates it
//! from the cache store or, failing that, from a fresh scrape; every later
//! call returns the same collection. Population happens under one write
//! lock so concurrent first callers trigger a single load or scrape.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tokio::sync::RwLock;

use crate::error::Result;
use crate::models::Event;
use crate::services::{EventExtractor, ListingSource};
use crate::storage::EventStore;

/// Shared, lazily populated event collection.
pub struct EventProvider {
    events: RwLock<Arc<Vec<Event>>>,
    store: Arc<dyn EventStore>,
    listing: Arc<dyn ListingSource>,
    extractor: EventExtractor,
    today: fn() -> NaiveDate,
}

impl EventProvider {
    pub fn new(
        store: Arc<dyn EventStore>,
        listing: Arc<dyn ListingSource>,
        extractor: EventExtractor,
    ) -> Self {
        Self {
            events: RwLock::new(Arc::new(Vec::new())),
            store,
            listing,
            extractor,
            today: local_today,
        }
    }

    /// Override the calendar used for the same-day filter.
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Return the current collection, loading or scraping it on first use.
    pub async fn get_events(&self) -> Result<Arc<Vec<Event>>> {
        {
            let events = self.events.read().await;
            if !events.is_empty() {
                return Ok(Arc::clone(&events));
            }
        }

        let mut events = self.events.write().await;
        if !events.is_empty() {
            return Ok(Arc::clone(&events));
        }

        match self.store.load().await {
            Ok(loaded) if !loaded.is_empty() => {
                log::info!(
                    "Loaded {} events from {}",
                    loaded.len(),
                    self.store.location()
                );
                *events = Arc::new(loaded);
                return Ok(Arc::clone(&events));
            }
            Ok(_) => log::info!("Cache at {} is empty", self.store.location()),
            Err(e) if e.is_not_found() => log::info!("No cached events: {}", e),
            Err(e) => log::warn!("Ignoring unreadable cache: {}", e),
        }

        let scraped = Arc::new(self.scrape().await?);
        if let Err(e) = self.store.save(&scraped).await {
            log::warn!("Failed to save events to {}: {}", self.store.location(), e);
        }
        *events = Arc::clone(&scraped);
        Ok(scraped)
    }

    /// Fetch the listing and extract today's events, bypassing all caches.
    pub async fn scrape(&self) -> Result<Vec<Event>> {
        let html = self.listing.fetch().await?;
        let extraction = self
            .extractor
            .extract(&html, self.listing.base_url(), (self.today)())
            .await?;

        log::info!(
            "Scraped {} events ({} rows, {} not today, {} unmapped)",
            extraction.events.len(),
            extraction.stats.rows,
            extraction.stats.skipped_date,
            extraction.stats.geocode_failures
        );
        Ok(extraction.events)
    }
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use futures::future::join_all;
    use tempfile::TempDir;

    use super::*;
    use crate::error::AppError;
    use crate::models::{Coordinates, ListingSelectors};
    use crate::services::extractor::tests::{TableGeocoder, page, row, today};
    use crate::storage::LocalCache;

    /// Listing that serves fixed HTML and counts fetches.
    pub(crate) struct StaticListing {
        pub html: Mutex<std::result::Result<String, u16>>,
        pub fetches: AtomicUsize,
        pub delay: Duration,
    }

    impl StaticListing {
        pub fn ok(html: String) -> Self {
            Self {
                html: Mutex::new(Ok(html)),
                fetches: AtomicUsize::new(0),
                delay: Duration::ZERO,
            }
        }

        pub fn failing(status: u16) -> Self {
            Self {
                html: Mutex::new(Err(status)),
                fetches: AtomicUsize::new(0),
                delay: Duration::ZERO,
            }
        }

        pub fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ListingSource for StaticListing {
        fn base_url(&self) -> &str {
            "https://flagpole.com/events/"
        }

        async fn fetch(&self) -> Result<String> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let html = self.html.lock().unwrap().clone();
            html.map_err(|status| AppError::upstream("listing", status))
        }
    }

    /// Store whose writes always fail.
    struct ReadOnlyStore;

    #[async_trait]
    impl EventStore for ReadOnlyStore {
        async fn load(&self) -> Result<Vec<Event>> {
            Err(AppError::not_found("read-only store is empty"))
        }

        async fn save(&self, _events: &[Event]) -> Result<()> {
            Err(AppError::Io(std::io::Error::other("disk full")))
        }

        fn location(&self) -> String {
            "read-only".to_string()
        }
    }

    pub(crate) fn two_event_page() -> String {
        page(&[
            row("2026-10-19", "Show A", "Venue A", "123 Main St"),
            row("2026-10-19", "Show B", "Venue B", ""),
        ])
    }

    pub(crate) fn provider_with(
        store: Arc<dyn EventStore>,
        listing: Arc<dyn ListingSource>,
    ) -> EventProvider {
        let geocoder = Arc::new(TableGeocoder::with(&[(
            "123 Main St",
            Coordinates::new(-83.37, 33.95),
        )]));
        let extractor =
            EventExtractor::new(ListingSelectors::default(), geocoder, Duration::ZERO).unwrap();
        EventProvider::new(store, listing, extractor).with_clock(today)
    }

    #[tokio::test]
    async fn test_missing_cache_scrapes_once_and_persists() {
        let tmp = TempDir::new().unwrap();
        let cache = Arc::new(LocalCache::new(tmp.path().join("events.json")));
        let listing = Arc::new(StaticListing::ok(two_event_page()));
        let provider = provider_with(cache.clone(), listing.clone());

        let events = provider.get_events().await.unwrap();

        assert_eq!(listing.fetch_count(), 1);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].coordinates(), Coordinates::new(-83.37, 33.95));
        assert_eq!(events[1].coordinates(), Coordinates::UNRESOLVED);
        assert_eq!(cache.load().await.unwrap(), *events);
    }

    #[tokio::test]
    async fn test_second_call_returns_held_collection() {
        let tmp = TempDir::new().unwrap();
        let cache = Arc::new(LocalCache::new(tmp.path().join("events.json")));
        let listing = Arc::new(StaticListing::ok(two_event_page()));
        let provider = provider_with(cache.clone(), listing.clone());

        let first = provider.get_events().await.unwrap();
        std::fs::remove_file(cache.path()).unwrap();
        let second = provider.get_events().await.unwrap();

        assert_eq!(first, second);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(listing.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_existing_cache_skips_scrape() {
        let tmp = TempDir::new().unwrap();
        let cache = Arc::new(LocalCache::new(tmp.path().join("events.json")));
        let seeded = provider_with(
            Arc::new(ReadOnlyStore),
            Arc::new(StaticListing::ok(two_event_page())),
        )
        .scrape()
        .await
        .unwrap();
        cache.save(&seeded).await.unwrap();

        let listing = Arc::new(StaticListing::failing(500));
        let provider = provider_with(cache, listing.clone());
        let events = provider.get_events().await.unwrap();

        assert_eq!(*events, seeded);
        assert_eq!(listing.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_cache_falls_back_to_scrape() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("events.json");
        std::fs::write(&path, "{ not an array").unwrap();
        let listing = Arc::new(StaticListing::ok(two_event_page()));
        let provider = provider_with(Arc::new(LocalCache::new(&path)), listing.clone());

        let events = provider.get_events().await.unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(listing.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_scrape_is_retried_on_next_call() {
        let tmp = TempDir::new().unwrap();
        let cache = Arc::new(LocalCache::new(tmp.path().join("events.json")));
        let listing = Arc::new(StaticListing::failing(503));
        let provider = provider_with(cache.clone(), listing.clone());

        let err = provider.get_events().await.unwrap_err();
        assert!(matches!(err, AppError::Upstream { status: 503, .. }));
        assert!(cache.load().await.unwrap_err().is_not_found());

        *listing.html.lock().unwrap() = Ok(two_event_page());
        let events = provider.get_events().await.unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(listing.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_save_failure_keeps_scraped_events() {
        let listing = Arc::new(StaticListing::ok(two_event_page()));
        let provider = provider_with(Arc::new(ReadOnlyStore), listing.clone());

        let first = provider.get_events().await.unwrap();
        let second = provider.get_events().await.unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
        assert_eq!(listing.fetch_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_calls_scrape_once() {
        let tmp = TempDir::new().unwrap();
        let cache = Arc::new(LocalCache::new(tmp.path().join("events.json")));
        let listing = Arc::new(StaticListing {
            delay: Duration::from_millis(50),
            ..StaticListing::ok(two_event_page())
        });
        let provider = Arc::new(provider_with(cache, listing.clone()));

        let handles = (0..8).map(|_| {
            let provider = Arc::clone(&provider);
            tokio::spawn(async move { provider.get_events().await })
        });
        let results = join_all(handles).await;

        let collections: Vec<Arc<Vec<Event>>> = results
            .into_iter()
            .map(|joined| joined.unwrap().unwrap())
            .collect();

        assert_eq!(listing.fetch_count(), 1);
        assert!(collections.iter().all(|c| Arc::ptr_eq(c, &collections[0])));
        assert_eq!(collections[0].len(), 2);
    }
}
