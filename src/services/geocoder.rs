// src/services/geocoder.rs

//! Address geocoding.
//!
//! [`MapboxGeocoder`] issues one forward-geocoding request per address and
//! returns the first candidate. There is no retry and no address cache.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{Coordinates, GeocoderConfig};
use crate::utils::http::ensure_success;

/// Resolves a free-text address to coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(&self, address: &str) -> Result<Coordinates>;
}

/// Geocoder backed by the Mapbox forward geocoding API.
#[derive(Clone)]
pub struct MapboxGeocoder {
    client: Client,
    endpoint: String,
    access_token: Option<String>,
}

impl MapboxGeocoder {
    pub fn new(client: Client, config: &GeocoderConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            access_token: config.token().ok().map(str::to_string),
        }
    }

    /// Decode a geocoding response body into the first candidate's coordinates.
    pub fn parse_response(body: &str) -> Result<Coordinates> {
        let response: GeocodeResponse =
            serde_json::from_str(body).map_err(|e| AppError::decode("geocoding response", e))?;

        response
            .features
            .first()
            .map(|feature| {
                let [longitude, latitude] = feature.geometry.coordinates;
                Coordinates::new(longitude, latitude)
            })
            .ok_or_else(|| AppError::not_found("geocoding returned zero features"))
    }
}

#[async_trait]
impl Geocoder for MapboxGeocoder {
    async fn resolve(&self, address: &str) -> Result<Coordinates> {
        let token = self
            .access_token
            .as_deref()
            .ok_or_else(|| AppError::config("geocoder access token not set"))?;

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", address), ("access_token", token)])
            .send()
            .await?;
        let body = ensure_success(response, "geocoding")?.text().await?;

        Self::parse_response(&body)
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    coordinates: [f64; 2],
}
