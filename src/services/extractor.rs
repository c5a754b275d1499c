// src/services/extractor.rs

//! Event extraction from the listing document.
//!
//! Rows are selected with the configured CSS selectors and kept only when
//! their machine-readable date starts with today's `YYYY-MM-DD`. Each kept
//! row is geocoded in document order, one lookup at a time. A failed
//! lookup stores [`Coordinates::UNRESOLVED`] on the event and extraction
//! moves on.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use tokio::time::Instant;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Coordinates, Event, ListingSelectors};
use crate::services::Geocoder;
use crate::utils::resolve_link;

/// Counters collected while extracting one listing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionStats {
    /// Rows matching the row selector
    pub rows: usize,
    /// Rows without a date attribute for today
    pub skipped_date: usize,
    /// Rows dated today but without a title
    pub skipped_untitled: usize,
    /// Events stored with sentinel coordinates
    pub geocode_failures: usize,
}

/// Events extracted from one listing plus their counters.
#[derive(Debug, Default)]
pub struct Extraction {
    pub events: Vec<Event>,
    pub stats: ExtractionStats,
}

/// Turns a listing document into geocoded events.
pub struct EventExtractor {
    selectors: RowSelectors,
    geocoder: Arc<dyn Geocoder>,
    min_interval: Duration,
}

/// Parsed selectors plus the attribute names read from matched elements.
#[derive(Clone)]
struct RowSelectors {
    row: Selector,
    date: Selector,
    date_attr: String,
    datetime: Selector,
    category: Selector,
    title: Selector,
    link: Selector,
    venue: Selector,
    address: Selector,
    description: Selector,
    link_attr: String,
}

impl RowSelectors {
    fn parse(s: &ListingSelectors) -> Result<Self> {
        Ok(Self {
            row: parse_selector(&s.row)?,
            date: parse_selector(&s.date)?,
            date_attr: s.date_attr.clone(),
            datetime: parse_selector(&s.datetime)?,
            category: parse_selector(&s.category)?,
            title: parse_selector(&s.title)?,
            link: parse_selector(&s.link)?,
            venue: parse_selector(&s.venue)?,
            address: parse_selector(&s.address)?,
            description: parse_selector(&s.description)?,
            link_attr: s.link_attr.clone(),
        })
    }
}

impl EventExtractor {
    /// Create an extractor, rejecting selectors that do not parse.
    ///
    /// `min_interval` is the minimum time between the starts of two
    /// consecutive geocoding lookups.
    pub fn new(
        selectors: ListingSelectors,
        geocoder: Arc<dyn Geocoder>,
        min_interval: Duration,
    ) -> Result<Self> {
        Ok(Self {
            selectors: RowSelectors::parse(&selectors)?,
            geocoder,
            min_interval,
        })
    }

    /// Extract and geocode today's events from `html`.
    pub async fn extract(&self, html: &str, base_url: &str, today: NaiveDate) -> Result<Extraction> {
        let base = Url::parse(base_url).ok();
        let mut extraction = self.parse_rows(html, base.as_ref(), today)?;
        self.geocode_all(&mut extraction).await;
        Ok(extraction)
    }

    /// Parse today's rows without geocoding them.
    ///
    /// Events come back carrying [`Coordinates::UNRESOLVED`].
    pub fn parse_rows(
        &self,
        html: &str,
        base_url: Option<&Url>,
        today: NaiveDate,
    ) -> Result<Extraction> {
        if html.trim().is_empty() {
            return Err(AppError::parse("listing document is empty"));
        }

        let sel = &self.selectors;
        let document = Html::parse_document(html);
        let today_prefix = today.format("%Y-%m-%d").to_string();
        let mut extraction = Extraction::default();

        for row in document.select(&sel.row) {
            extraction.stats.rows += 1;

            let dated_today = row
                .select(&sel.date)
                .next()
                .and_then(|el| el.value().attr(&sel.date_attr))
                .is_some_and(|value| value.trim().starts_with(&today_prefix));
            if !dated_today {
                extraction.stats.skipped_date += 1;
                continue;
            }

            let title = select_text(&row, &sel.title);
            if title.is_empty() {
                log::debug!("Skipping row {} without a title", extraction.stats.rows);
                extraction.stats.skipped_untitled += 1;
                continue;
            }

            let href = row
                .select(&sel.link)
                .next()
                .and_then(|el| el.value().attr(&sel.link_attr))
                .unwrap_or("");

            extraction.events.push(Event {
                date: today,
                datetime: select_text(&row, &sel.datetime),
                category: select_text(&row, &sel.category),
                title,
                event_link: resolve_link(base_url, href),
                venue: select_text(&row, &sel.venue),
                address: select_text(&row, &sel.address),
                description: select_text(&row, &sel.description),
                latitude: Coordinates::UNRESOLVED.latitude,
                longitude: Coordinates::UNRESOLVED.longitude,
            });
        }

        log::debug!(
            "Listing rows: {} total, {} not today, {} untitled",
            extraction.stats.rows,
            extraction.stats.skipped_date,
            extraction.stats.skipped_untitled
        );
        Ok(extraction)
    }

    async fn geocode_all(&self, extraction: &mut Extraction) {
        let mut last_lookup: Option<Instant> = None;

        for event in extraction.events.iter_mut() {
            if let Some(last) = last_lookup {
                let elapsed = last.elapsed();
                if elapsed < self.min_interval {
                    tokio::time::sleep(self.min_interval - elapsed).await;
                }
            }
            last_lookup = Some(Instant::now());

            match self.geocoder.resolve(&event.address).await {
                Ok(coordinates) => event.set_coordinates(coordinates),
                Err(e) => {
                    log::warn!("Error geocoding address '{}': {}", event.address, e);
                    extraction.stats.geocode_failures += 1;
                    event.set_coordinates(Coordinates::UNRESOLVED);
                }
            }
        }
    }
}

/// Trimmed text of every element matching `selector` inside `row`.
fn select_text(row: &ElementRef, selector: &Selector) -> String {
    row.select(selector)
        .flat_map(|el| el.text())
        .collect::<String>()
        .trim()
        .to_string()
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
