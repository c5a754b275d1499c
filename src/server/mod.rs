// src/server/mod.rs

//! Delivery endpoint.
//!
//! `GET /api/events` answers `{ "events": [...], "mapbox_token": "..." }`.
//! Other methods get `405 Method Not Allowed`; a provider failure becomes
//! a `500` with a plain-text message.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::cors::{Any, CorsLayer};

use crate::error::{AppError, Result};
use crate::models::{Config, EventsResponse};
use crate::services::EventProvider;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    provider: Arc<EventProvider>,
    mapbox_token: Arc<str>,
}

impl AppState {
    pub fn new(provider: Arc<EventProvider>, mapbox_token: impl Into<Arc<str>>) -> Self {
        Self {
            provider,
            mapbox_token: mapbox_token.into(),
        }
    }
}

/// Provider failure rendered as a server error.
pub struct ApiError(AppError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        log::error!("Error fetching events: {}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error fetching events: {}", self.0),
        )
            .into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    Router::new()
        .route("/api/events", get(list_events))
        .with_state(state)
        .layer(cors)
}

/// GET /api/events - Current event collection plus the map credential
async fn list_events(
    State(state): State<AppState>,
) -> std::result::Result<Json<EventsResponse>, ApiError> {
    let events = state.provider.get_events().await?;

    Ok(Json(EventsResponse {
        events,
        mapbox_token: Arc::clone(&state.mapbox_token),
    }))
}

/// Serve the endpoint until Ctrl-C.
pub async fn serve(config: &Config, provider: Arc<EventProvider>) -> Result<()> {
    let token = config.access_token()?;
    let app = router(AppState::new(provider, token));

    let listener = tokio::net::TcpListener::bind(config.server.bind_address()).await?;
    log::info!("mapthens listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for shutdown signal: {}", e);
            }
            log::info!("Shutting down");
        })
        .await?;

    Ok(())
}
