//! AWS S3 snapshot storage.
//!
//! Batch runs write each day's collection to
//! `s3://{bucket}/{YYYY-MM-DD}_{object_key}` and read it back from the
//! same key.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use chrono::NaiveDate;

use crate::error::{AppError, Result};
use crate::models::{BatchConfig, Event};
use crate::storage::EventStore;

/// Dated event snapshot in an S3 bucket.
pub struct S3Store {
    client: Client,
    bucket: String,
    key: String,
}

impl S3Store {
    /// Create a store for the snapshot of `day`.
    pub fn new(client: Client, config: &BatchConfig, day: NaiveDate) -> Self {
        Self {
            client,
            bucket: config.bucket.clone(),
            key: Self::object_key(day, &config.object_key),
        }
    }

    /// Create an S3 store from the ambient AWS configuration.
    pub async fn from_env(config: &BatchConfig, day: NaiveDate) -> Result<Self> {
        if config.bucket.trim().is_empty() || config.object_key.trim().is_empty() {
            return Err(AppError::config(
                "missing S3_BUCKET or S3_OBJECT_KEY environment variables",
            ));
        }

        let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .load()
            .await;
        Ok(Self::new(Client::new(&aws_config), config, day))
    }

    /// Key of the snapshot for `day`.
    pub fn object_key(day: NaiveDate, suffix: &str) -> String {
        format!("{}_{}", day.format("%Y-%m-%d"), suffix)
    }
}

#[async_trait]
impl EventStore for S3Store {
    async fn load(&self) -> Result<Vec<Event>> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let bytes = output
                    .body
                    .collect()
                    .await
                    .map_err(AppError::storage)?
                    .into_bytes();
                serde_json::from_slice(&bytes).map_err(|e| AppError::decode(self.location(), e))
            }
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    Err(AppError::not_found(format!("no snapshot at {}", self.location())))
                } else {
                    Err(AppError::storage(service_err))
                }
            }
        }
    }

    async fn save(&self, events: &[Event]) -> Result<()> {
        let json = serde_json::to_vec_pretty(events)?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .body(ByteStream::from(json))
            .content_type("application/json")
            .send()
            .await
            .map_err(AppError::storage)?;

        log::info!("Wrote {} events to {}", events.len(), self.location());
        Ok(())
    }

    fn location(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }
}
