//! Event data structure.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A (longitude, latitude) pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinates {
    /// Sentinel stored on events whose address could not be geocoded.
    ///
    /// Clients treat an event carrying this pair as unmappable.
    pub const UNRESOLVED: Coordinates = Coordinates {
        longitude: 0.0,
        latitude: 0.0,
    };

    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    pub fn is_unresolved(&self) -> bool {
        *self == Self::UNRESOLVED
    }
}

/// One listed occurrence at a venue on a given day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    /// Day of the event (`YYYY-MM-DD`)
    pub date: NaiveDate,

    /// Human-readable date and time as displayed on the listing
    pub datetime: String,

    /// Category label (may be empty)
    pub category: String,

    /// Display name, never empty
    pub title: String,

    /// Absolute URL of the detail page (may be empty)
    pub event_link: String,

    /// Venue display name
    pub venue: String,

    /// Free-text postal address used for geocoding
    pub address: String,

    /// Short description (may be empty)
    pub description: String,

    pub latitude: f64,
    pub longitude: f64,
}

impl Event {
    /// Coordinates of the event.
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.longitude, self.latitude)
    }

    /// Set both coordinates at once.
    pub fn set_coordinates(&mut self, coordinates: Coordinates) {
        self.longitude = coordinates.longitude;
        self.latitude = coordinates.latitude;
    }

    /// Whether the event carries real coordinates.
    pub fn is_mapped(&self) -> bool {
        !self.coordinates().is_unresolved()
    }
}

/// Payload handed to map clients: the collection plus the map credential.
#[derive(Debug, Clone, Serialize)]
pub struct EventsResponse {
    pub events: Arc<Vec<Event>>,
    pub mapbox_token: Arc<str>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> Event {
        Event {
            date: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            datetime: "October 19 @ 8:00 pm".to_string(),
            category: "Live Music".to_string(),
            title: "Open Mic".to_string(),
            event_link: "https://flagpole.com/events/open-mic/".to_string(),
            venue: "The Globe".to_string(),
            address: "199 N Lumpkin St, Athens, GA".to_string(),
            description: String::new(),
            latitude: 33.958,
            longitude: -83.376,
        }
    }

    #[test]
    fn test_serialized_field_names() {
        let value = serde_json::to_value(sample_event()).unwrap();
        let object = value.as_object().unwrap();

        for field in [
            "date",
            "datetime",
            "category",
            "title",
            "event_link",
            "venue",
            "address",
            "description",
            "latitude",
            "longitude",
        ] {
            assert!(object.contains_key(field), "missing field {field}");
        }
        assert_eq!(object["date"], "2026-10-19");
    }

    #[test]
    fn test_sentinel_marks_event_unmapped() {
        let mut event = sample_event();
        assert!(event.is_mapped());

        event.set_coordinates(Coordinates::UNRESOLVED);
        assert!(!event.is_mapped());
        assert_eq!(event.latitude, 0.0);
        assert_eq!(event.longitude, 0.0);
    }
}
