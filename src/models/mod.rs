// src/models/mod.rs

//! Domain models for the events pipeline.

mod config;
mod event;

// Re-export all public types
pub use config::{
    ACCESS_TOKEN_ENV, BatchConfig, CacheConfig, Config, GeocoderConfig, HttpConfig,
    ListingConfig, ListingSelectors, ServerConfig,
};
pub use event::{Coordinates, Event, EventsResponse};
