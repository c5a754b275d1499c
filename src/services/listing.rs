// src/services/listing.rs

//! Listing document retrieval.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::Result;
use crate::utils::http::ensure_success;

/// Source of the raw listing HTML.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// URL the document is fetched from; relative links resolve against it.
    fn base_url(&self) -> &str;

    async fn fetch(&self) -> Result<String>;
}

/// Fetches the listing with an unauthenticated GET.
pub struct HttpListing {
    client: Client,
    url: String,
}

impl HttpListing {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl ListingSource for HttpListing {
    fn base_url(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<String> {
        log::info!("Fetching listing from {}", self.url);
        let response = self.client.get(&self.url).send().await?;
        let html = ensure_success(response, "listing")?.text().await?;
        log::debug!("Listing document: {} bytes", html.len());
        Ok(html)
    }
}
