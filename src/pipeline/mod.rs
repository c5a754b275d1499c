//! Pipeline entry points.
//!
//! - `build_provider`: wire geocoder, listing, extractor and store from config
//! - `run_scrape`: force a fresh scrape and persist it

pub mod scrape;

pub use scrape::{ScrapeSummary, build_provider, run_scrape};
