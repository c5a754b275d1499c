//! Service layer for the events pipeline.
//!
//! This module contains the business logic for:
//! - Address geocoding (`Geocoder`, `MapboxGeocoder`)
//! - Listing retrieval (`ListingSource`, `HttpListing`)
//! - Event extraction (`EventExtractor`)
//! - The shared, lazily populated collection (`EventProvider`)

pub(crate) mod extractor;
mod geocoder;
mod listing;
pub(crate) mod provider;

pub use extractor::{EventExtractor, Extraction, ExtractionStats};
pub use geocoder::{Geocoder, MapboxGeocoder};
pub use listing::{HttpListing, ListingSource};
pub use provider::EventProvider;
