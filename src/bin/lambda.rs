//! AWS Lambda entry point for mapthens batch runs
//!
//! Deploy with `cargo lambda build --release --features lambda`.
//! Invoke with `{"action": "scrape"}` on a schedule and
//! `{"action": "retrieve"}` from the client.

use lambda_runtime::{Error as LambdaError, service_fn};

use mapthens::lambda::handler;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the AWS Lambda function.
#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("mapthens batch function starting...");
    lambda_runtime::run(service_fn(handler)).await
}
