//! Local filesystem cache.
//!
//! The whole collection lives in one JSON file. Writes go to a sibling
//! `.tmp` file that is then renamed over the target, so a reader never
//! sees a half-written cache.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::Event;
use crate::storage::EventStore;

/// Event cache backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct LocalCache {
    path: PathBuf,
}

impl LocalCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.ensure_dir().await?;

        let mut tmp_name = self.path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp = self.path.with_file_name(tmp_name);
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl EventStore for LocalCache {
    async fn load(&self) -> Result<Vec<Event>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::not_found(format!(
                    "no cache file at {}",
                    self.path.display()
                )));
            }
            Err(e) => return Err(AppError::Io(e)),
        };

        serde_json::from_slice(&bytes)
            .map_err(|e| AppError::decode(self.path.display().to_string(), e))
    }

    async fn save(&self, events: &[Event]) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(events)?;
        self.write_bytes(&bytes).await?;
        log::info!("Saved {} events to {}", events.len(), self.path.display());
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use tempfile::TempDir;

    use super::*;

    fn sample_events() -> Vec<Event> {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        vec![
            Event {
                date,
                datetime: "October 19 @ 7:00 pm".to_string(),
                category: "Theater".to_string(),
                title: "Hamlet".to_string(),
                event_link: "https://flagpole.com/events/hamlet/".to_string(),
                venue: "Town & Gown".to_string(),
                address: "115 S Pope St, Athens, GA".to_string(),
                description: "Shakespeare in the round.".to_string(),
                latitude: 33.955,
                longitude: -83.386,
            },
            Event {
                date,
                datetime: "October 19 @ 9:00 pm".to_string(),
                category: String::new(),
                title: "Late Show".to_string(),
                event_link: String::new(),
                venue: "Unknown".to_string(),
                address: String::new(),
                description: String::new(),
                latitude: 0.0,
                longitude: 0.0,
            },
        ]
    }

    #[tokio::test]
    async fn test_save_then_load_preserves_order_and_fields() {
        let tmp = TempDir::new().unwrap();
        let cache = LocalCache::new(tmp.path().join("events.json"));
        let events = sample_events();

        cache.save(&events).await.unwrap();
        let loaded = cache.load().await.unwrap();

        assert_eq!(loaded, events);
    }

    #[tokio::test]
    async fn test_load_missing_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let cache = LocalCache::new(tmp.path().join("events.json"));

        let err = cache.load().await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_load_malformed_is_decode_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("events.json");
        std::fs::write(&path, r#"[{"title": "missing everything else"}]"#).unwrap();

        let err = LocalCache::new(&path).load().await.unwrap_err();
        assert!(matches!(err, AppError::Decode { .. }));

        std::fs::write(&path, "not json").unwrap();
        let err = LocalCache::new(&path).load().await.unwrap_err();
        assert!(matches!(err, AppError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_save_overwrites_and_is_pretty_printed() {
        let tmp = TempDir::new().unwrap();
        let cache = LocalCache::new(tmp.path().join("nested/events.json"));
        let events = sample_events();

        cache.save(&events).await.unwrap();
        cache.save(&events[..1]).await.unwrap();

        let text = std::fs::read_to_string(cache.path()).unwrap();
        assert!(text.starts_with("[\n  {"));
        assert!(text.contains("\"event_link\": \"https://flagpole.com/events/hamlet/\""));
        assert_eq!(cache.load().await.unwrap().len(), 1);
        assert!(!tmp.path().join("nested/events.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_save_to_tmp_named_cache_renames_into_place() {
        let tmp = TempDir::new().unwrap();
        let cache = LocalCache::new(tmp.path().join("events.tmp"));

        cache.save(&sample_events()).await.unwrap();

        assert!(!tmp.path().join("events.tmp.tmp").exists());
        assert_eq!(cache.load().await.unwrap(), sample_events());
    }
}
