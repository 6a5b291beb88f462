// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava webhook event payload.

use serde::Deserialize;
use std::collections::HashMap;

/// Event pushed by Strava for every create/update/delete of an activity or athlete.
///
/// Every field is optional on the wire so that minimal payloads still parse
/// and get acknowledged.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    #[serde(default = "default_object_type")]
    pub object_type: String, // "activity" or "athlete"
    #[serde(default)]
    pub object_id: u64,
    #[serde(default)]
    pub aspect_type: String, // "create", "update", "delete"
    #[serde(default)]
    pub owner_id: u64,
    #[serde(default)]
    pub subscription_id: u64,
    #[serde(default)]
    pub event_time: i64,
    /// Changed fields for update events (title, type, private, authorized)
    #[serde(default)]
    pub updates: Option<HashMap<String, serde_json::Value>>,
}

fn default_object_type() -> String {
    "activity".to_string()
}

impl WebhookEvent {
    pub fn is_activity_create(&self) -> bool {
        self.object_type == "activity" && self.aspect_type == "create"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_payload() {
        let event: WebhookEvent = serde_json::from_str(
            r#"{"aspect_type":"update","event_time":1516126040,"object_id":1360128428,
                "object_type":"activity","owner_id":134815,"subscription_id":120475,
                "updates":{"title":"Messy"}}"#,
        )
        .unwrap();

        assert_eq!(event.object_id, 1360128428);
        assert_eq!(event.owner_id, 134815);
        assert!(!event.is_activity_create());
        assert_eq!(event.updates.unwrap()["title"], "Messy");
    }

    #[test]
    fn test_minimal_create_payload() {
        let event: WebhookEvent =
            serde_json::from_str(r#"{"aspect_type": "create", "object_id": 123}"#).unwrap();
        assert!(event.is_activity_create());
    }

    #[test]
    fn test_athlete_events_are_not_activity_creates() {
        let event: WebhookEvent =
            serde_json::from_str(r#"{"aspect_type": "create", "object_type": "athlete"}"#)
                .unwrap();
        assert!(!event.is_activity_create());
    }
}
