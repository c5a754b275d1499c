//! Storage abstractions for event collection persistence.
//!
//! - [`LocalCache`]: the on-disk cache read at startup and rewritten after
//!   every fresh scrape (`events.json`, one pretty-printed JSON array)
//! - `S3Store` (feature `s3`): dated snapshots for batch runs, keyed
//!   `{YYYY-MM-DD}_{object_key}`

pub mod local;
#[cfg(feature = "s3")]
pub mod s3;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Event;

// Re-export for convenience
pub use local::LocalCache;
#[cfg(feature = "s3")]
pub use s3::S3Store;

/// Durable home of the most recently computed event collection.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Load the stored collection.
    ///
    /// Fails with `AppError::NotFound` when nothing has been stored and
    /// with `AppError::Decode` when the stored bytes are not a collection.
    async fn load(&self) -> Result<Vec<Event>>;

    /// Replace the stored collection.
    async fn save(&self, events: &[Event]) -> Result<()>;

    /// Human-readable location for log lines.
    fn location(&self) -> String;
}
