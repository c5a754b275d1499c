// src/lambda/mod.rs

//! AWS Lambda handler for batch runs.
//!
//! Two actions share one function:
//! 1. `scrape` - scrape today's listing and upload it to the dated S3 key
//! 2. `retrieve` - read today's snapshot back and return it to the client
//!    together with the map credential

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use lambda_runtime::{Error as LambdaError, LambdaEvent};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, instrument};

use crate::error::Result;
use crate::models::{Config, EventsResponse};
use crate::pipeline::run_scrape;
use crate::storage::{EventStore, S3Store};

/// Lambda invocation payload.
#[derive(Debug, Default, Deserialize)]
pub struct BatchRequest {
    #[serde(default)]
    pub action: BatchAction,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchAction {
    #[default]
    Scrape,
    Retrieve,
}

/// Lambda response payload for `scrape`.
#[derive(Debug, Serialize)]
pub struct ScrapeResponse {
    /// Number of events uploaded
    pub event_count: usize,

    /// Events stored with sentinel coordinates
    pub unmapped_count: usize,

    /// Where the snapshot was written
    pub location: String,

    /// Execution time in milliseconds
    pub execution_time_ms: u64,
}

/// Main Lambda handler function.
///
/// A failed action is returned as an error so the invocation is marked
/// failed and the runtime's retry and alarm handling applies.
#[instrument(skip(event))]
pub async fn handler(event: LambdaEvent<Value>) -> std::result::Result<Value, LambdaError> {
    let (payload, _context) = event.into_parts();
    let request: BatchRequest = if payload.is_null() {
        BatchRequest::default()
    } else {
        serde_json::from_value(payload)?
    };

    info!("Starting batch action {:?}", request.action);

    let config = load_lambda_config()?;
    let today = Local::now().date_naive();

    match run_action(request.action, &config, today).await {
        Ok(value) => Ok(value),
        Err(e) => {
            error!("Batch action {:?} failed: {}", request.action, e);
            Err(e.into())
        }
    }
}

async fn run_action(action: BatchAction, config: &Config, today: NaiveDate) -> Result<Value> {
    let value = match action {
        BatchAction::Scrape => serde_json::to_value(scrape(config, today).await?)?,
        BatchAction::Retrieve => serde_json::to_value(retrieve(config, today).await?)?,
    };
    Ok(value)
}

async fn scrape(config: &Config, today: NaiveDate) -> Result<ScrapeResponse> {
    let start = std::time::Instant::now();
    let store = Arc::new(S3Store::from_env(&config.batch, today).await?);
    let summary = run_scrape(config, store).await?;

    let response = ScrapeResponse {
        event_count: summary.event_count,
        unmapped_count: summary.unmapped_count,
        location: summary.location,
        execution_time_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        "Uploaded {} events in {}ms",
        response.event_count, response.execution_time_ms
    );
    Ok(response)
}

async fn retrieve(config: &Config, today: NaiveDate) -> Result<EventsResponse> {
    let token = config.access_token()?;
    let store = S3Store::from_env(&config.batch, today).await?;
    let events = store.load().await?;
    info!("Read {} events from {}", events.len(), store.location());

    Ok(EventsResponse {
        events: Arc::new(events),
        mapbox_token: token.into(),
    })
}

/// Load configuration suitable for Lambda environment.
fn load_lambda_config() -> Result<Config> {
    let mut config = match std::env::var("MAPTHENS_CONFIG") {
        Ok(path) => Config::load(path)?,
        Err(_) => Config::default(),
    };
    config.apply_env();
    Ok(config)
}
