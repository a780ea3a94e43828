// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Event model and the admin form input.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Event document (`events/{id}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Event {
    /// Firestore document ID
    #[serde(alias = "_firestore_id", default)]
    pub id: String,
    pub name: String,
    /// Calendar date (YYYY-MM-DD)
    pub date: String,
    /// Image URL
    pub image: String,
    pub description: String,
}

impl Event {
    pub fn from_input(id: impl Into<String>, input: &EventInput) -> Self {
        Self {
            id: id.into(),
            name: input.name.clone(),
            date: input.date.clone(),
            image: input.image.clone(),
            description: input.description.clone(),
        }
    }
}

/// The four fields written on create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct EventInput {
    #[validate(length(min = 1, message = "Event name is required"))]
    pub name: String,
    #[validate(custom(function = "validate_event_date"))]
    pub date: String,
    #[validate(url(message = "Image must be a valid URL"))]
    pub image: String,
    #[validate(length(min = 1, message = "Event description is required"))]
    pub description: String,
}

impl From<&Event> for EventInput {
    fn from(event: &Event) -> Self {
        Self {
            name: event.name.clone(),
            date: event.date.clone(),
            image: event.image.clone(),
            description: event.description.clone(),
        }
    }
}

fn validate_event_date(date: &str) -> Result<(), ValidationError> {
    chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| ValidationError::new("date").with_message("Event date must be YYYY-MM-DD".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jazz_night() -> EventInput {
        EventInput {
            name: "Jazz Night".to_string(),
            date: "2024-06-01".to_string(),
            image: "http://x/y.png".to_string(),
            description: "...".to_string(),
        }
    }

    #[test]
    fn test_valid_input() {
        assert!(jazz_night().validate().is_ok());
    }

    #[test]
    fn test_missing_fields_rejected() {
        let errors = EventInput::default().validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("date"));
        assert!(fields.contains_key("image"));
        assert!(fields.contains_key("description"));
    }

    #[test]
    fn test_bad_date_and_url() {
        let input = EventInput {
            date: "June 1st".to_string(),
            image: "not a url".to_string(),
            ..jazz_night()
        };
        let errors = input.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("date"));
        assert!(fields.contains_key("image"));
        assert!(!fields.contains_key("name"));
    }

    #[test]
    fn test_firestore_id_alias() {
        let event: Event = serde_json::from_value(serde_json::json!({
            "_firestore_id": "e1",
            "name": "Jazz Night",
            "date": "2024-06-01",
            "image": "http://x/y.png",
            "description": "...",
        }))
        .unwrap();
        assert_eq!(event.id, "e1");
        assert_eq!(EventInput::from(&event), jazz_night());
    }
}
