//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Environment variable holding the map service credential.
pub const ACCESS_TOKEN_ENV: &str = "MAPBOX_ACCESS_TOKEN";

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Listing page location and markup
    #[serde(default)]
    pub listing: ListingConfig,

    /// Geocoding service settings
    #[serde(default)]
    pub geocoder: GeocoderConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// On-disk cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Delivery endpoint settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Object store sink for batch runs
    #[serde(default)]
    pub batch: BatchConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_vars(|name| std::env::var(name).ok());
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(token) = var(ACCESS_TOKEN_ENV) {
            self.geocoder.access_token = Some(token);
        }
        if let Some(port) = var("PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Some(url) = var("LISTING_URL") {
            self.listing.url = url;
        }
        if let Some(path) = var("EVENTS_CACHE_PATH") {
            self.cache.path = PathBuf::from(path);
        }
        if let Some(bucket) = var("S3_BUCKET") {
            self.batch.bucket = bucket;
        }
        if let Some(key) = var("S3_OBJECT_KEY") {
            self.batch.object_key = key;
        }
    }

    /// The map service credential, or a configuration error if unset.
    pub fn access_token(&self) -> Result<&str> {
        self.geocoder.token()
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        self.access_token()?;
        if self.listing.url.trim().is_empty() {
            return Err(AppError::config("listing.url is empty"));
        }
        if self.geocoder.endpoint.trim().is_empty() {
            return Err(AppError::config("geocoder.endpoint is empty"));
        }
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::config("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::config("http.timeout_secs must be > 0"));
        }
        self.listing.selectors.validate()
    }
}

/// Where the listing lives and how its rows are marked up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    #[serde(default = "defaults::listing_url")]
    pub url: String,

    #[serde(default)]
    pub selectors: ListingSelectors,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            url: defaults::listing_url(),
            selectors: ListingSelectors::default(),
        }
    }
}

/// CSS selectors locating each field inside an event row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingSelectors {
    /// One repeated event row
    pub row: String,
    /// Element carrying the machine-readable date
    pub date: String,
    /// Attribute of `date` holding the `YYYY-MM-DD...` value
    pub date_attr: String,
    pub datetime: String,
    pub category: String,
    pub title: String,
    pub link: String,
    pub link_attr: String,
    pub venue: String,
    pub address: String,
    pub description: String,
}

impl ListingSelectors {
    fn validate(&self) -> Result<()> {
        let fields = [
            ("row", &self.row),
            ("date", &self.date),
            ("date_attr", &self.date_attr),
            ("datetime", &self.datetime),
            ("category", &self.category),
            ("title", &self.title),
            ("link", &self.link),
            ("link_attr", &self.link_attr),
            ("venue", &self.venue),
            ("address", &self.address),
            ("description", &self.description),
        ];
        match fields.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((name, _)) => Err(AppError::config(format!(
                "listing.selectors.{name} is empty"
            ))),
            None => Ok(()),
        }
    }
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            row: ".tribe-common-g-row.tribe-events-calendar-list__event-row".into(),
            date: "time.tribe-events-calendar-list__event-datetime".into(),
            date_attr: "datetime".into(),
            datetime: ".tribe-events-calendar-list__event-datetime".into(),
            category: ".tribe-events-event-categories a".into(),
            title: ".tribe-events-calendar-list__event-title".into(),
            link: ".tribe-events-calendar-list__event-title-link".into(),
            link_attr: "href".into(),
            venue: ".tribe-events-calendar-list__event-venue-title".into(),
            address: ".tribe-events-calendar-list__event-venue-address".into(),
            description: ".tribe-events-calendar-list__event-description p".into(),
        }
    }
}

/// Geocoding service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocoderConfig {
    /// Forward geocoding endpoint
    #[serde(default = "defaults::geocoder_endpoint")]
    pub endpoint: String,

    /// Map service credential, usually supplied via `MAPBOX_ACCESS_TOKEN`
    #[serde(default)]
    pub access_token: Option<String>,

    /// Minimum interval between consecutive lookups in milliseconds
    #[serde(default = "defaults::min_interval")]
    pub min_interval_ms: u64,
}

impl GeocoderConfig {
    pub fn token(&self) -> Result<&str> {
        self.access_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::config(format!("{ACCESS_TOKEN_ENV} not set")))
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::geocoder_endpoint(),
            access_token: None,
            min_interval_ms: defaults::min_interval(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "defaults::cache_path")]
    pub path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: defaults::cache_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "defaults::host")]
    pub host: String,

    #[serde(default = "defaults::port")]
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::host(),
            port: defaults::port(),
        }
    }
}

/// Object store destination for batch snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default)]
    pub bucket: String,

    /// Suffix of the object key; the full key is `{YYYY-MM-DD}_{object_key}`
    #[serde(default = "defaults::object_key")]
    pub object_key: String,

    #[serde(default = "defaults::region")]
    pub region: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            object_key: defaults::object_key(),
            region: defaults::region(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn listing_url() -> String {
        "https://flagpole.com/events/".into()
    }
    pub fn geocoder_endpoint() -> String {
        "https://api.mapbox.com/search/geocode/v6/forward".into()
    }
    pub fn min_interval() -> u64 {
        100
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; mapthens/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn cache_path() -> PathBuf {
        PathBuf::from("events.json")
    }
    pub fn host() -> String {
        "0.0.0.0".into()
    }
    pub fn port() -> u16 {
        8080
    }
    pub fn object_key() -> String {
        "events.json".into()
    }
    pub fn region() -> String {
        "us-east-1".into()
    }
}
